use std::collections::BTreeMap;

use serde::Serialize;

use super::entities::Ledger;

/// Hours and derived charge for a single period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodLine {
    pub period: String,
    pub hours: f64,
    pub charge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub lines: Vec<PeriodLine>,
    pub total_hours: f64,
    pub total_charge: f64,
    pub rate: f64,
}

impl MonthlySummary {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Groups the ledger by period, sums the hours and derives each charge from
/// the hourly rate. Periods come out sorted by key.
pub fn monthly_summary(ledger: &Ledger) -> MonthlySummary {
    let mut by_period = BTreeMap::<&str, f64>::new();
    for record in ledger.records() {
        *by_period.entry(&record.period).or_default() += record.hours;
    }

    let mut total_hours = 0.0;
    let lines = by_period
        .into_iter()
        .map(|(period, hours)| {
            total_hours += hours;
            PeriodLine {
                period: period.to_string(),
                hours,
                charge: hours * ledger.rate,
            }
        })
        .collect();

    MonthlySummary {
        lines,
        total_hours,
        total_charge: total_hours * ledger.rate,
        rate: ledger.rate,
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::entities::{DayRecord, Ledger};

    use super::monthly_summary;

    #[test]
    fn groups_by_period_and_derives_the_charge() {
        let ledger = Ledger::new(
            100.0,
            vec![
                DayRecord::new("2025-07", "01", 4.0),
                DayRecord::new("2025-06", "05", 8.0),
                DayRecord::new("2025-06", "06", 6.0),
            ],
        );

        let summary = monthly_summary(&ledger);

        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0].period, "2025-06");
        assert_eq!(summary.lines[0].hours, 14.0);
        assert_eq!(summary.lines[0].charge, 1400.0);
        assert_eq!(summary.lines[1].period, "2025-07");
        assert_eq!(summary.lines[1].hours, 4.0);
        assert_eq!(summary.total_hours, 18.0);
        assert_eq!(summary.total_charge, 1800.0);
        assert_eq!(summary.rate, 100.0);
    }

    #[test]
    fn empty_ledger_yields_an_empty_summary_with_zero_charge() {
        let summary = monthly_summary(&Ledger::default());
        assert!(summary.is_empty());
        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.total_charge, 0.0);
    }

    #[test]
    fn total_charge_is_total_hours_times_rate() {
        let ledger = Ledger::new(
            3500.0,
            vec![
                DayRecord::new("2025-05", "12", 6.0),
                DayRecord::new("2025-06", "02", 6.0),
                DayRecord::new("2025-06", "03", 7.0),
            ],
        );
        let summary = monthly_summary(&ledger);
        assert_eq!(summary.total_charge, summary.total_hours * 3500.0);
        assert_eq!(summary.total_hours, 19.0);
    }
}
