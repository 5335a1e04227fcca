use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    ledger::{commands::LedgerCommands, store::LedgerStorage},
    utils::clock::Clock,
};

use super::print_summary;

/// Periodically reloads the ledger and reprints the monthly summary. Each
/// tick is an independent read-only poll and ticks never overlap; a reload
/// slower than the refresh period pushes the next tick back instead of
/// piling up.
pub struct WatchLoop<S: LedgerStorage> {
    commands: LedgerCommands<S>,
    clock: Box<dyn Clock>,
    shutdown: CancellationToken,
    refresh_period: Duration,
}

impl<S: LedgerStorage> WatchLoop<S> {
    pub fn new(
        commands: LedgerCommands<S>,
        clock: Box<dyn Clock>,
        shutdown: CancellationToken,
        refresh_period: Duration,
    ) -> Self {
        Self {
            commands,
            clock,
            shutdown,
            refresh_period,
        }
    }

    /// Executes the refresh loop until the token is cancelled.
    pub async fn run(self) -> Result<()> {
        let mut refresh_point = self.clock.instant();
        loop {
            refresh_point += self.refresh_period;

            match self.commands.summary().await {
                Ok(summary) => {
                    let (now, _) = self.commands.clock_and_today();
                    println!("{}", now.format("%A, %d %B %Y - %H:%M:%S"));
                    print_summary(&summary);
                    println!();
                }
                Err(e) => {
                    error!("Encountered an error during refresh {:?}", e)
                }
            }

            select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(refresh_point) => ()
            }
        }
    }
}

/// Detects signals sent to the process and cancels the refresh loop.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    use crate::{
        ledger::{commands::LedgerCommands, store::FileLedgerStore},
        utils::clock::DefaultClock,
    };

    use super::WatchLoop;

    fn watcher_in(
        dir: &tempfile::TempDir,
        shutdown: CancellationToken,
    ) -> WatchLoop<FileLedgerStore> {
        let storage = FileLedgerStore::new(dir.path().join("hours.csv")).unwrap();
        let commands = LedgerCommands::new(storage, Box::new(DefaultClock));
        WatchLoop::new(
            commands,
            Box::new(DefaultClock),
            shutdown,
            Duration::from_secs(60),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_cancellation() -> Result<()> {
        let dir = tempdir()?;
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        watcher_in(&dir, shutdown).run().await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_refreshing_until_cancelled() -> Result<()> {
        let dir = tempdir()?;
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(watcher_in(&dir, shutdown.clone()).run());

        tokio::time::sleep(Duration::from_secs(130)).await;
        shutdown.cancel();

        handle.await??;
        Ok(())
    }
}
