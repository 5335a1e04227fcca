pub mod viewer;
pub mod watch;

use std::{fmt::Display, path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;

use crate::{
    ledger::{
        backfill::{DEFAULT_BACKFILL_HOURS, DEFAULT_BACKFILL_START_DAY},
        commands::{BackfillOutcome, LedgerCommands, TodayStatus},
        entry::parse_hours,
        store::{FileLedgerStore, LedgerStorage},
        summary::MonthlySummary,
    },
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, LEDGER_FILE_NAME},
        logging::enable_logging,
    },
};

use watch::{detect_shutdown, WatchLoop};

#[derive(Parser, Debug)]
#[command(name = "Timecard", version, long_about = None)]
#[command(about = "Track daily work hours and monthly pay from your terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
    #[arg(
        long,
        help = "Data directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Record hours worked for today, or for an explicit date")]
    Record {
        #[arg(help = "Hours worked, between 0 and 24")]
        hours: String,
        #[arg(
            long,
            help = "Record for another day instead of today. Examples are \"yesterday\", \"15/03/2025\""
        )]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(
        about = "Fill every free business day from a start day to the end of the month with a fixed number of hours"
    )]
    Backfill {
        #[arg(
            long,
            help = "Month to fill. Examples are \"last month\", \"15/03/2025\". Defaults to the current month"
        )]
        month: Option<String>,
        #[arg(long = "from-day", default_value_t = DEFAULT_BACKFILL_START_DAY, help = "First day of the month to consider")]
        from_day: u32,
        #[arg(long, default_value_t = DEFAULT_BACKFILL_HOURS, value_parser = parse_backfill_hours, help = "Hours credited to each filled day")]
        hours: f64,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "Show whether hours are already recorded for today")]
    Status {
        #[arg(long, help = "Print the status as JSON")]
        json: bool,
    },
    #[command(about = "Show recorded hours and the derived charge per month")]
    Summary {
        #[arg(long, help = "Print the summary as JSON")]
        json: bool,
    },
    #[command(about = "Open the ledger file with the system default application")]
    Open {},
    #[command(about = "Reprint the monthly summary on a fixed period")]
    Watch {
        #[arg(long, default_value_t = 60, help = "Refresh period in seconds")]
        every: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&dir, logging_level, args.log)?;

    let ledger_path = dir.join(LEDGER_FILE_NAME);
    let storage = FileLedgerStore::new(ledger_path.clone())?;
    let commands = LedgerCommands::new(storage, Box::new(DefaultClock));

    match args.command {
        Commands::Record {
            hours,
            date,
            date_style,
        } => {
            let entry = match date {
                Some(expr) => {
                    let date = parse_cli_date(&expr, date_style)?;
                    commands.submit_hours_for(date, &hours).await?
                }
                None => commands.submit_hours(&hours).await?,
            };
            println!("Recorded {} hours for {}", entry.hours, entry.date);
            Ok(())
        }
        Commands::Backfill {
            month,
            from_day,
            hours,
            date_style,
        } => {
            let month = match month {
                Some(expr) => {
                    let date = parse_cli_date(&expr, date_style)?;
                    Some((date.year(), date.month()))
                }
                None => None,
            };
            let outcome = commands.run_backfill(month, from_day, hours).await?;
            print_backfill_outcome(&outcome);
            Ok(())
        }
        Commands::Status { json } => {
            let status = commands.today_status().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&commands, &status);
            }
            Ok(())
        }
        Commands::Summary { json } => {
            let summary = commands.summary().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }
        Commands::Open {} => viewer::open_store_file(&ledger_path),
        Commands::Watch { every } => {
            let shutdown_token = CancellationToken::new();
            let watcher = WatchLoop::new(
                commands,
                Box::new(DefaultClock),
                shutdown_token.clone(),
                Duration::from_secs(every),
            );

            let (_, watch_result) = tokio::join!(detect_shutdown(shutdown_token), watcher.run());
            watch_result
        }
    }
}

fn parse_cli_date(expr: &str, style: DateStyle) -> Result<NaiveDate> {
    match parse_date_string(expr, Local::now(), style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to parse date {expr:?}: {e}"),
            )
            .into()),
    }
}

fn parse_backfill_hours(raw: &str) -> Result<f64, String> {
    parse_hours(raw).map_err(|e| e.to_string())
}

fn print_status<S: LedgerStorage>(commands: &LedgerCommands<S>, status: &TodayStatus) {
    let (now, _) = commands.clock_and_today();
    println!("{}", now.format("%A, %d %B %Y - %H:%M:%S"));
    match status.hours {
        Some(hours) => println!("Already recorded {hours} hours today."),
        None => println!("No hours recorded for today yet."),
    }
}

fn print_backfill_outcome(outcome: &BackfillOutcome) {
    if outcome.inserted > 0 {
        println!(
            "Loaded {} hours into {} new business days of {} (days {} to {})",
            outcome.hours_per_day,
            outcome.inserted,
            outcome.period,
            outcome.start_day,
            outcome.last_day,
        );
    } else {
        println!(
            "No new business days to fill in {} from day {} onwards",
            outcome.period, outcome.start_day,
        );
    }
}

pub(crate) fn print_summary(summary: &MonthlySummary) {
    if summary.is_empty() {
        println!("No hours recorded yet.");
        return;
    }
    for line in &summary.lines {
        println!("{}\t{:.1}h\t{:.2}", line.period, line.hours, line.charge);
    }
    println!();
    println!(
        "Total\t{:.1}h\t{:.2} (at {}/h)",
        summary.total_hours, summary.total_charge, summary.rate
    );
}
