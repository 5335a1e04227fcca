use chrono::NaiveDate;

/// Rate used whenever the persisted file carries none, or carries one that
/// can't be parsed.
pub const DEFAULT_RATE_PER_HOUR: f64 = 3500.0;

/// Canonical `(period, day)` keys for a calendar date. Periods are ISO
/// year-month strings (`2025-06`), days are zero-padded day-of-month strings
/// (`08`).
pub fn date_keys(date: NaiveDate) -> (String, String) {
    (
        date.format("%Y-%m").to_string(),
        date.format("%d").to_string(),
    )
}

fn normalize_period(period: &str) -> String {
    period.trim().to_string()
}

fn normalize_day(day: &str) -> String {
    format!("{:0>2}", day.trim())
}

/// Hours worked on a single day. At most one record exists per
/// `(period, day)` pair inside a [Ledger].
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub period: String,
    pub day: String,
    pub hours: f64,
}

impl DayRecord {
    pub fn new(period: &str, day: &str, hours: f64) -> Self {
        Self {
            period: normalize_period(period),
            day: normalize_day(day),
            hours,
        }
    }

    pub fn for_date(date: NaiveDate, hours: f64) -> Self {
        let (period, day) = date_keys(date);
        Self { period, day, hours }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.period, &self.day)
    }

    fn normalized(self) -> Self {
        Self::new(&self.period, &self.day, self.hours)
    }
}

/// In-memory image of the persisted store: the hourly rate plus every daily
/// record, kept sorted by `(period, day)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub rate: f64,
    records: Vec<DayRecord>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE_PER_HOUR,
            records: vec![],
        }
    }
}

impl Ledger {
    /// Builds a ledger from raw records. Keys are normalized, duplicate keys
    /// collapse to the record seen last, and the result is sorted.
    pub fn new(rate: f64, records: Vec<DayRecord>) -> Self {
        let mut ledger = Self {
            rate,
            records: Vec::with_capacity(records.len()),
        };
        for record in records {
            ledger.upsert(record);
        }
        ledger
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    /// Inserts a record, replacing any existing record with the same key.
    pub fn upsert(&mut self, record: DayRecord) {
        let record = record.normalized();
        self.records.retain(|existing| existing.key() != record.key());
        self.records.push(record);
        self.records.sort_by(|a, b| a.key().cmp(&b.key()));
    }

    pub fn get(&self, period: &str, day: &str) -> Option<f64> {
        let period = normalize_period(period);
        let day = normalize_day(day);
        self.records
            .iter()
            .find(|record| record.period == period && record.day == day)
            .map(|record| record.hours)
    }

    pub fn exists(&self, period: &str, day: &str) -> bool {
        self.get(period, day).is_some()
    }
}
