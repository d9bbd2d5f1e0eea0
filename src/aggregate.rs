use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::models::{Metrics, MonthBucket, MonthlyCount, SignupRecord, StatusCount};

pub const ALL_ORGANIZATIONS: &str = "All Organizations";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrganizationFilter {
    #[default]
    All,
    Only(String),
}

impl OrganizationFilter {
    pub fn from_selection(selection: &str) -> Self {
        if selection == ALL_ORGANIZATIONS {
            OrganizationFilter::All
        } else {
            OrganizationFilter::Only(selection.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OrganizationFilter::All => ALL_ORGANIZATIONS,
            OrganizationFilter::Only(name) => name,
        }
    }

    pub fn matches(&self, record: &SignupRecord) -> bool {
        match self {
            OrganizationFilter::All => true,
            OrganizationFilter::Only(name) => record.organization == *name,
        }
    }

    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a SignupRecord>
    where
        I: IntoIterator<Item = &'a SignupRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Regular,
    Cumulative,
}

impl ViewMode {
    pub fn apply<T: Counted>(self, rows: Vec<T>) -> Vec<T> {
        match self {
            ViewMode::Regular => rows,
            ViewMode::Cumulative => cumulative(rows),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Regular => write!(f, "Regular"),
            ViewMode::Cumulative => write!(f, "Cumulative"),
        }
    }
}

pub trait Counted {
    fn count_mut(&mut self) -> &mut usize;
}

impl Counted for MonthlyCount {
    fn count_mut(&mut self) -> &mut usize {
        &mut self.count
    }
}

impl Counted for StatusCount {
    fn count_mut(&mut self) -> &mut usize {
        &mut self.count
    }
}

/// Distinct organizations, ascending.
pub fn organizations<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a SignupRecord>,
{
    records
        .into_iter()
        .map(|record| record.organization.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn selector_options(records: &[SignupRecord]) -> Vec<String> {
    let mut options = vec![ALL_ORGANIZATIONS.to_string()];
    options.extend(organizations(records));
    options
}

pub fn aggregate_by_month<'a, I>(records: I) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = &'a SignupRecord>,
{
    let mut counts: BTreeMap<MonthBucket, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.month).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

/// Status counts, most frequent first. Equal counts keep the order in which
/// each status first appeared.
pub fn aggregate_by_status<'a, I>(records: I) -> Vec<StatusCount>
where
    I: IntoIterator<Item = &'a SignupRecord>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<StatusCount> = Vec::new();

    for record in records {
        let slot = *index.entry(record.status.as_str()).or_insert_with(|| {
            summaries.push(StatusCount {
                status: record.status.clone(),
                count: 0,
            });
            summaries.len() - 1
        });
        summaries[slot].count += 1;
    }

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

/// Running sum over the rows in their current order.
pub fn cumulative<T: Counted>(mut rows: Vec<T>) -> Vec<T> {
    let mut running = 0usize;
    for row in rows.iter_mut() {
        let count = row.count_mut();
        running += *count;
        *count = running;
    }
    rows
}

pub fn metrics<'a, I>(records: I) -> Metrics
where
    I: IntoIterator<Item = &'a SignupRecord>,
{
    let mut total_signups = 0;
    let mut organizations = BTreeSet::new();
    let mut languages = BTreeSet::new();

    for record in records {
        total_signups += 1;
        organizations.insert(record.organization.as_str());
        languages.insert(record.language.as_str());
    }

    Metrics {
        total_signups,
        unique_organizations: organizations.len(),
        languages: languages.len(),
    }
}
