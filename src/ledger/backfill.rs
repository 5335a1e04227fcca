use tracing::debug;

use crate::utils::calendar::{business_days_in_range, last_day_of_month};

use super::entities::{DayRecord, Ledger};

/// Day of month the automatic block load starts from.
pub const DEFAULT_BACKFILL_START_DAY: u32 = 24;
/// Hours credited to each business day the block load inserts.
pub const DEFAULT_BACKFILL_HOURS: f64 = 6.0;

/// Inserts `hours_per_day` for every business day between `start_day` and the
/// end of the month that has no record yet. Days that already carry an entry
/// are left alone, so running this twice for the same month inserts nothing
/// the second time. Returns how many records were inserted.
pub fn backfill(
    ledger: &mut Ledger,
    year: i32,
    month: u32,
    start_day: u32,
    hours_per_day: f64,
) -> usize {
    let last_day = last_day_of_month(year, month);

    let mut inserted = 0;
    for date in business_days_in_range(year, month, start_day, last_day) {
        let candidate = DayRecord::for_date(date, hours_per_day);
        if ledger.exists(&candidate.period, &candidate.day) {
            continue;
        }
        debug!("Backfilling {}-{}", candidate.period, candidate.day);
        ledger.upsert(candidate);
        inserted += 1;
    }
    inserted
}
