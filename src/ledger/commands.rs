use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::Serialize;

use crate::utils::{calendar::last_day_of_month, clock::Clock};

use super::{
    backfill::backfill,
    entities::date_keys,
    entry::record_day,
    store::LedgerStorage,
    summary::{monthly_summary, MonthlySummary},
};

#[derive(Debug, Clone, Serialize)]
pub struct TodayStatus {
    pub date: NaiveDate,
    pub already_recorded: bool,
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedEntry {
    pub date: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackfillOutcome {
    pub period: String,
    pub start_day: u32,
    pub last_day: u32,
    pub hours_per_day: f64,
    pub inserted: usize,
}

/// The command surface the terminal shell talks to. Every operation re-reads
/// the persisted ledger, applies its change and writes the result back, so
/// two invocations never depend on shared in-memory state.
pub struct LedgerCommands<S: LedgerStorage> {
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: LedgerStorage> LedgerCommands<S> {
    pub fn new(storage: S, clock: Box<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Current wall-clock moment and the date records are keyed under.
    pub fn clock_and_today(&self) -> (DateTime<Local>, NaiveDate) {
        (self.clock.time().with_timezone(&Local), self.clock.today())
    }

    pub async fn today_status(&self) -> Result<TodayStatus> {
        let today = self.clock.today();
        let ledger = self.storage.load().await?;
        let (period, day) = date_keys(today);
        let hours = ledger.get(&period, &day);
        Ok(TodayStatus {
            date: today,
            already_recorded: hours.is_some(),
            hours,
        })
    }

    /// Records hours for today. Weekends, duplicates and unparseable input
    /// are refused with an [EntryError](super::entry::EntryError).
    pub async fn submit_hours(&self, raw_hours: &str) -> Result<RecordedEntry> {
        self.submit_hours_for(self.clock.today(), raw_hours).await
    }

    pub async fn submit_hours_for(
        &self,
        date: NaiveDate,
        raw_hours: &str,
    ) -> Result<RecordedEntry> {
        let mut ledger = self.storage.load().await?;
        let hours = record_day(&mut ledger, date, raw_hours)?;
        self.storage.save(&ledger).await?;
        Ok(RecordedEntry { date, hours })
    }

    /// Fills the business days of a month (the current month when `month` is
    /// absent) from `start_day` onwards. Nothing is written back when every
    /// candidate day is already recorded.
    pub async fn run_backfill(
        &self,
        month: Option<(i32, u32)>,
        start_day: u32,
        hours_per_day: f64,
    ) -> Result<BackfillOutcome> {
        let (year, month) = month.unwrap_or_else(|| {
            let today = self.clock.today();
            (today.year(), today.month())
        });

        let mut ledger = self.storage.load().await?;
        let inserted = backfill(&mut ledger, year, month, start_day, hours_per_day);
        if inserted > 0 {
            self.storage.save(&ledger).await?;
        }

        Ok(BackfillOutcome {
            period: format!("{year:04}-{month:02}"),
            start_day,
            last_day: last_day_of_month(year, month),
            hours_per_day,
            inserted,
        })
    }

    pub async fn summary(&self) -> Result<MonthlySummary> {
        let ledger = self.storage.load().await?;
        Ok(monthly_summary(&ledger))
    }
}
