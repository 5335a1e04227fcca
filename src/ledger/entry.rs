use chrono::NaiveDate;
use thiserror::Error;

use crate::utils::calendar::is_business_day;

use super::entities::{date_keys, DayRecord, Ledger};

/// Reasons a manual entry can be refused. All of these are reported to the
/// user and leave the ledger untouched.
#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("hours can only be recorded on a business day (Monday to Friday)")]
    NotBusinessDay,
    #[error("{0} hours are already recorded for this day")]
    DuplicateEntry(f64),
    #[error("expected a number of hours between 0 and 24")]
    InvalidHours,
}

/// Parses raw user input into a number of hours. Blank input, anything that
/// isn't a number and anything outside `[0, 24]` is rejected.
pub fn parse_hours(raw: &str) -> Result<f64, EntryError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(EntryError::InvalidHours);
    }
    let hours = raw.parse::<f64>().map_err(|_| EntryError::InvalidHours)?;
    if !(0.0..=24.0).contains(&hours) {
        return Err(EntryError::InvalidHours);
    }
    Ok(hours)
}

/// Records hours for a single day. A day can only be recorded once; an
/// existing entry is reported back instead of being overwritten, unlike the
/// plain upsert rule of [Ledger::upsert].
pub fn record_day(
    ledger: &mut Ledger,
    today: NaiveDate,
    raw_hours: &str,
) -> Result<f64, EntryError> {
    if !is_business_day(today) {
        return Err(EntryError::NotBusinessDay);
    }

    let (period, day) = date_keys(today);
    if let Some(existing) = ledger.get(&period, &day) {
        return Err(EntryError::DuplicateEntry(existing));
    }

    let hours = parse_hours(raw_hours)?;
    ledger.upsert(DayRecord { period, day, hours });
    Ok(hours)
}
