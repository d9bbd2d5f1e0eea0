use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One validated row of the signup log. Built once by the loader and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRecord {
    pub id: String,
    pub status: String,
    pub organization: String,
    pub language: String,
    pub zipcode: String,
    pub signed_up_at: NaiveDateTime,
    pub month: MonthBucket,
}

impl SignupRecord {
    pub fn new(
        id: String,
        status: String,
        organization: String,
        language: String,
        zipcode: String,
        signed_up_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            status,
            organization,
            language,
            zipcode,
            month: MonthBucket::of(&signed_up_at),
            signed_up_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: MonthBucket,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub total_signups: usize,
    pub unique_organizations: usize,
    pub languages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    MissingDate,
    InvalidDate { value: String },
    ExtraColumns { found: usize },
    InvalidUtf8,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::MissingDate => write!(f, "missing signup date"),
            ExclusionReason::InvalidDate { value } => {
                write!(f, "unparseable signup date {value:?}")
            }
            ExclusionReason::ExtraColumns { found } => {
                write!(f, "expected 6 columns, found {found}")
            }
            ExclusionReason::InvalidUtf8 => write!(f, "row is not valid UTF-8"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedRow {
    /// 1-based line number in the source.
    pub line: u64,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub records: Vec<SignupRecord>,
    pub excluded: Vec<ExcludedRow>,
}

impl LoadOutcome {
    pub fn rows_seen(&self) -> usize {
        self.records.len() + self.excluded.len()
    }
}
