//! Loading and validation of the raw signup log.
//!
//! The source is headerless CSV with the columns
//! `id, status, organization, language, zipcode, signup_date`. Each row goes
//! through one parse-or-reject step; rejected rows are kept aside as
//! [`ExcludedRow`]s and never reach any aggregate.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{ExcludedRow, ExclusionReason, LoadOutcome, SignupRecord};

pub const SIGNUP_DATE_FORMAT: &str = "%m/%d/%Y %H:%M";
pub const COLUMN_COUNT: usize = 6;

pub fn load(path: &Path) -> Result<LoadOutcome> {
    let bytes = std::fs::read(path).map_err(|source| Error::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(bytes.as_slice())
}

pub fn parse_reader<R: Read>(reader: R) -> Result<LoadOutcome> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut outcome = LoadOutcome::default();

    for result in reader.byte_records() {
        let raw = result.map_err(Error::Read)?;
        let line = raw.position().map(|position| position.line()).unwrap_or(0);

        let parsed = StringRecord::from_byte_record(raw)
            .map_err(|_| ExclusionReason::InvalidUtf8)
            .and_then(|row| parse_row(&row));

        match parsed {
            Ok(record) => outcome.records.push(record),
            Err(reason) => {
                debug!(line, %reason, "excluding signup row");
                outcome.excluded.push(ExcludedRow { line, reason });
            }
        }
    }

    info!(
        valid = outcome.records.len(),
        excluded = outcome.excluded.len(),
        "loaded signup log"
    );
    Ok(outcome)
}

/// Parses `MM/DD/YYYY HH:MM`. chrono alone accepts signed or short years and
/// leading blanks, so the digit layout is checked first.
pub fn parse_signup_date(value: &str) -> Option<NaiveDateTime> {
    if !has_signup_date_shape(value) {
        return None;
    }
    NaiveDateTime::parse_from_str(value, SIGNUP_DATE_FORMAT).ok()
}

fn has_signup_date_shape(value: &str) -> bool {
    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };

    let Some((date, time)) = value.split_once(' ') else {
        return false;
    };
    let date: Vec<&str> = date.split('/').collect();
    let time: Vec<&str> = time.split(':').collect();

    match (date.as_slice(), time.as_slice()) {
        ([month, day, year], [hour, minute]) => {
            digits(month, 1, 2)
                && digits(day, 1, 2)
                && digits(year, 4, 4)
                && digits(hour, 1, 2)
                && digits(minute, 2, 2)
        }
        _ => false,
    }
}

fn parse_row(row: &StringRecord) -> std::result::Result<SignupRecord, ExclusionReason> {
    if row.len() > COLUMN_COUNT {
        return Err(ExclusionReason::ExtraColumns { found: row.len() });
    }

    let raw_date = row
        .get(5)
        .filter(|value| !value.is_empty())
        .ok_or(ExclusionReason::MissingDate)?;
    let signed_up_at = parse_signup_date(raw_date).ok_or_else(|| ExclusionReason::InvalidDate {
        value: raw_date.to_string(),
    })?;

    let field = |index: usize| row.get(index).unwrap_or_default().to_string();
    Ok(SignupRecord::new(
        field(0),
        field(1),
        field(2),
        field(3),
        field(4),
        signed_up_at,
    ))
}
