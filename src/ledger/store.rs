use std::{
    fmt::Write as _,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use super::entities::{DayRecord, Ledger, DEFAULT_RATE_PER_HOUR};

/// Tag of the reserved first line holding the hourly rate.
pub const RATE_LINE_TAG: &str = "RATE_PER_HOUR";
/// Column header written on the second line.
pub const COLUMN_HEADER: &str = "PERIOD;DAY;HOURS";

/// Interface for abstracting persistence of the hours ledger.
///
/// Implementations re-read the whole file on every operation instead of
/// caching across calls. The file on disk stays the source of truth, which
/// keeps edits made by external tools between two invocations intact.
pub trait LedgerStorage {
    /// Reads the rate and all records from the persisted file. A missing
    /// file yields a default ledger rather than an error.
    fn load(&self) -> impl Future<Output = Result<Ledger>> + Send;

    /// Writes rate, header and all records as a full overwrite. The rate
    /// written is the one currently on disk, not the in-memory one: the rate
    /// is shared state owned by the file, and a save of records must not
    /// downgrade a rate changed by another writer in the meantime.
    fn save(&self, ledger: &Ledger) -> impl Future<Output = Result<()>> + Send;
}

/// The main realization of [LedgerStorage], backed by a single
/// semicolon-delimited text file.
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads only the rate line of the on-disk file. Used by [save] so that a
    /// rate edited externally between load and save survives the overwrite.
    async fn read_persisted_rate(&self) -> Result<f64> {
        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DEFAULT_RATE_PER_HOUR),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let mut lines = BufReader::new(file).lines();
        let rate = match lines.next_line().await? {
            Some(first) => parse_rate_line(&first).unwrap_or(DEFAULT_RATE_PER_HOUR),
            None => DEFAULT_RATE_PER_HOUR,
        };
        lines.into_inner().into_inner().unlock_async().await?;
        Ok(rate)
    }

    async fn write_full(file: &mut File, rate: f64, ledger: &Ledger) -> Result<()> {
        let mut buffer = String::new();
        writeln!(buffer, "{RATE_LINE_TAG};{rate}")?;
        writeln!(buffer, "{COLUMN_HEADER}")?;
        for record in ledger.records() {
            writeln!(buffer, "{};{};{}", record.period, record.day, record.hours)?;
        }

        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

impl LedgerStorage for FileLedgerStore {
    async fn load(&self) -> Result<Ledger> {
        debug!("Loading ledger from {:?}", self.path);
        let file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Ledger::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {:?}", self.path))
            }
        };
        file.lock_shared()?;
        let mut lines = BufReader::new(file).lines();

        let rate = match lines.next_line().await? {
            Some(first) => parse_rate_line(&first).unwrap_or_else(|| {
                warn!("Malformed rate line {first:?}, falling back to default rate");
                DEFAULT_RATE_PER_HOUR
            }),
            None => DEFAULT_RATE_PER_HOUR,
        };

        let mut records = vec![];
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line == COLUMN_HEADER {
                continue;
            }
            match parse_record_line(line) {
                Some(record) => records.push(record),
                // ignore illegal rows. Might happen after manual edits
                None => warn!("Skipping malformed record line {line:?}"),
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(Ledger::new(rate, records))
    }

    async fn save(&self, ledger: &Ledger) -> Result<()> {
        let rate = self.read_persisted_rate().await?;

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {:?} for writing", self.path))?;

        file.lock_exclusive()?;
        let result = Self::write_full(&mut file, rate, ledger).await;
        file.unlock_async().await?;
        result
    }
}

fn parse_rate_line(line: &str) -> Option<f64> {
    let mut parts = line.splitn(2, ';');
    if parts.next()?.trim() != RATE_LINE_TAG {
        return None;
    }
    parts.next()?.trim().parse().ok()
}

fn parse_record_line(line: &str) -> Option<DayRecord> {
    let mut parts = line.split(';');
    let period = parts.next()?;
    let day = parts.next()?;
    let hours = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(DayRecord::new(period, day, hours))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        ledger::entities::{DayRecord, Ledger, DEFAULT_RATE_PER_HOUR},
        utils::logging::TEST_LOGGING,
    };

    use super::{FileLedgerStore, LedgerStorage};

    fn store_in(dir: &tempfile::TempDir) -> FileLedgerStore {
        FileLedgerStore::new(dir.path().join("hours.csv")).unwrap()
    }

    #[tokio::test]
    async fn load_missing_file_returns_defaults() -> Result<()> {
        let dir = tempdir()?;
        let store = store_in(&dir);

        let ledger = store.load().await?;

        assert_eq!(ledger.rate, DEFAULT_RATE_PER_HOUR);
        assert!(ledger.records().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn save_then_load_round_trips_records() -> Result<()> {
        let dir = tempdir()?;
        let store = store_in(&dir);

        let ledger = Ledger::new(
            DEFAULT_RATE_PER_HOUR,
            vec![
                DayRecord::new("2025-06", "30", 6.0),
                DayRecord::new("2025-06", "05", 7.5),
                DayRecord::new("2025-07", "01", 6.0),
            ],
        );
        store.save(&ledger).await?;

        let loaded = store.load().await?;
        assert_eq!(loaded, ledger);
        Ok(())
    }

    #[tokio::test]
    async fn written_file_matches_the_documented_format() -> Result<()> {
        let dir = tempdir()?;
        let store = store_in(&dir);

        let ledger = Ledger::new(
            DEFAULT_RATE_PER_HOUR,
            vec![DayRecord::new("2025-06", "05", 8.0)],
        );
        store.save(&ledger).await?;

        let contents = std::fs::read_to_string(store.path())?;
        assert_eq!(contents, "RATE_PER_HOUR;3500\nPERIOD;DAY;HOURS\n2025-06;05;8\n");
        Ok(())
    }

    #[tokio::test]
    async fn save_writes_the_persisted_rate_not_the_in_memory_one() -> Result<()> {
        let dir = tempdir()?;
        let store = store_in(&dir);

        let mut ledger = Ledger::default();
        ledger.rate = 9999.0;
        store.save(&ledger).await?;

        let loaded = store.load().await?;
        assert_eq!(loaded.rate, DEFAULT_RATE_PER_HOUR);
        Ok(())
    }

    #[tokio::test]
    async fn save_preserves_a_rate_edited_externally() -> Result<()> {
        let dir = tempdir()?;
        let store = store_in(&dir);

        std::fs::write(
            store.path(),
            "RATE_PER_HOUR;1234.5\nPERIOD;DAY;HOURS\n2025-06;05;8\n",
        )?;

        let mut ledger = store.load().await?;
        assert_eq!(ledger.rate, 1234.5);

        ledger.rate = 2.0;
        ledger.upsert(DayRecord::new("2025-06", "06", 4.0));
        store.save(&ledger).await?;

        let reloaded = store.load().await?;
        assert_eq!(reloaded.rate, 1234.5);
        assert_eq!(reloaded.get("2025-06", "06"), Some(4.0));
        assert_eq!(reloaded.get("2025-06", "05"), Some(8.0));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_rate_line_falls_back_to_default() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store_in(&dir);

        std::fs::write(
            store.path(),
            "RATE_PER_HOUR;not a number\nPERIOD;DAY;HOURS\n2025-06;05;8\n",
        )?;

        let ledger = store.load().await?;
        assert_eq!(ledger.rate, DEFAULT_RATE_PER_HOUR);
        assert_eq!(ledger.get("2025-06", "05"), Some(8.0));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store_in(&dir);

        std::fs::write(
            store.path(),
            "RATE_PER_HOUR;3500\n\
             PERIOD;DAY;HOURS\n\
             2025-06;05;8\n\
             not a record\n\
             2025-06;06;whoops\n\
             2025-06;09;6\n",
        )?;

        let ledger = store.load().await?;
        assert_eq!(ledger.records().len(), 2);
        assert_eq!(ledger.get("2025-06", "05"), Some(8.0));
        assert_eq!(ledger.get("2025-06", "09"), Some(6.0));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_rows_in_the_file_collapse_last_wins() -> Result<()> {
        let dir = tempdir()?;
        let store = store_in(&dir);

        std::fs::write(
            store.path(),
            "RATE_PER_HOUR;3500\nPERIOD;DAY;HOURS\n2025-06;05;8\n2025-06;5;3\n",
        )?;

        let ledger = store.load().await?;
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(ledger.get("2025-06", "05"), Some(3.0));
        Ok(())
    }

    #[tokio::test]
    async fn unpadded_days_are_normalized_on_load() -> Result<()> {
        let dir = tempdir()?;
        let store = store_in(&dir);

        std::fs::write(
            store.path(),
            "RATE_PER_HOUR;3500\nPERIOD;DAY;HOURS\n 2025-06 ;5;8\n",
        )?;

        let ledger = store.load().await?;
        assert_eq!(ledger.records()[0].period, "2025-06");
        assert_eq!(ledger.records()[0].day, "05");
        Ok(())
    }
}
