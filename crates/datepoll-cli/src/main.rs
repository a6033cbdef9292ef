//! `datepoll` CLI: turn an event description into candidate poll dates.
//!
//! ## Usage
//!
//! ```sh
//! # Offline grammar only, one ISO date per line
//! datepoll parse "Dinner on Jan 10, 17, 24 at 7:30pm"
//!
//! # Same, as a JSON array, with a pinned reference date
//! datepoll parse --json --reference-date 2025-01-08 "BBQ this weekend"
//!
//! # Full pipeline (grammar, then LLM when configured), canonical JSON result
//! echo "picnic when the weather turns" | datepoll smart --config datepoll.toml
//!
//! # Weekend presets
//! datepoll preset next-weekends --count 4 --upcoming-only
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use datepoll_core::presets::MAX_WEEKEND_COUNT;
use datepoll_core::{
    validate_input, CanonicalParseResult, Config, LlmParser, OpenAiCompatibleGenerator,
    ParseContext, Reconciler, RecurrencePreset,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "datepoll",
    version,
    about = "Extract candidate dates for event polls"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log tier decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse with the offline grammar only
    Parse {
        /// Event description (reads from stdin if omitted)
        text: Option<String>,
        /// Resolve relative expressions against this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        /// Print a JSON array instead of one date per line
        #[arg(long)]
        json: bool,
    },
    /// Parse with the grammar, falling back to the LLM tier when configured
    Smart {
        /// Event description (reads from stdin if omitted)
        text: Option<String>,
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Generate a weekend preset
    Preset {
        #[arg(value_enum)]
        kind: PresetKind,
        /// Number of weekends for next-weekends
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(0..=MAX_WEEKEND_COUNT as i64))]
        count: u32,
        /// Skip the weekend currently in progress
        #[arg(long)]
        upcoming_only: bool,
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetKind {
    ThisWeekend,
    NextWeekends,
    QuarterlyWeekends,
}

impl PresetKind {
    fn preset(self, count: u32, upcoming_only: bool) -> RecurrencePreset {
        match self {
            Self::ThisWeekend => RecurrencePreset::ThisWeekend { upcoming_only },
            Self::NextWeekends => RecurrencePreset::NextWeekends {
                count,
                upcoming_only,
            },
            Self::QuarterlyWeekends => RecurrencePreset::QuarterlyWeekends,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            text,
            reference_date,
            json,
        } => {
            let input = read_input(text)?;
            let input = validate_input(&input).context("Invalid event description")?;
            let context = context_for(reference_date);

            let result = datepoll_core::parse_deterministic(input, &context);
            print_dates(&result.iso_dates(), json)?;
        }
        Commands::Smart {
            text,
            reference_date,
            config,
        } => {
            let input = read_input(text)?;
            let input = validate_input(&input).context("Invalid event description")?;
            let config = load_config(config.as_deref())?;
            let reconciler = build_reconciler(&config)?;
            debug!(llm = reconciler.has_llm(), "reconciler ready");

            let outcome = reconciler
                .reconcile(input, Some(&context_for(reference_date)))
                .await;
            debug!(source = ?outcome.source, "reconciled");
            print_result(&outcome.result)?;
        }
        Commands::Preset {
            kind,
            count,
            upcoming_only,
            reference_date,
            json,
        } => {
            let context = context_for(reference_date);
            let dates: Vec<String> = kind
                .preset(count, upcoming_only)
                .generate(context.reference_date)
                .iter()
                .map(NaiveDate::to_string)
                .collect();
            print_dates(&dates, json)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn context_for(reference_date: Option<NaiveDate>) -> ParseContext {
    reference_date.map_or_else(ParseContext::today, ParseContext::new)
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// The LLM tier is wired in only when enabled and a key is available.
fn build_reconciler(config: &Config) -> Result<Reconciler> {
    if !config.llm.enabled {
        return Ok(Reconciler::deterministic_only());
    }
    if config.llm.resolved_api_key().is_none() {
        warn!("LLM tier enabled but no API key configured; using the grammar only");
        return Ok(Reconciler::deterministic_only());
    }

    let generator = OpenAiCompatibleGenerator::from_config(&config.llm)
        .context("Failed to set up text generation")?;
    let parser = LlmParser::from_config(Arc::new(generator), &config.llm);
    Ok(Reconciler::new(Some(parser)))
}

fn read_input(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn print_dates(dates: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(dates)?);
    } else {
        for date in dates {
            println!("{}", date);
        }
    }
    Ok(())
}

fn print_result(result: &CanonicalParseResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
