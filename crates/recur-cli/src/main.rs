//! `recur` CLI: expand and validate recurring calendar entries from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Expand an entry document (stdin → stdout), first 100 instances
//! recur expand < standup.json
//!
//! # Expand from file to file, capped at 10 instances
//! recur expand -i standup.json -o instances.json --limit 10
//!
//! # Only instances overlapping a window
//! recur expand -i standup.json --from 2024-01-01 --to 2024-02-01
//!
//! # Resolve wall-clock times to UTC in a zone, dropping DST-gap instances
//! recur expand -i standup.json --tz America/New_York --dst skip
//!
//! # Validate a document and show the (possibly recomputed) start and end
//! recur check -i standup.json
//! ```
//!
//! Logging goes to stderr. `RUST_LOG` selects the filter; `-v` raises the
//! default from `warn` to `debug`.

mod document;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use recurrence_engine::event::sort_by_start;
use recurrence_engine::{CalendarDate, DstPolicy, EventInstance, ZoneResolver};
use std::io::{self, Read};
use std::process;
use tracing_subscriber::EnvFilter;

use document::EventDocument;

#[derive(Parser)]
#[command(
    name = "recur",
    version,
    about = "Recurring calendar entry expansion CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log engine decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// How to treat wall-clock times that fall in a DST gap.
#[derive(Clone, Copy, ValueEnum)]
enum DstArg {
    /// Drop the instance
    Skip,
    /// Move the instance forward by the gap length
    Shift,
}

impl From<DstArg> for DstPolicy {
    fn from(arg: DstArg) -> Self {
        match arg {
            DstArg::Skip => DstPolicy::Skip,
            DstArg::Shift => DstPolicy::ShiftForward,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Expand an entry document into its instances
    Expand {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Maximum number of instances to emit
        #[arg(long, default_value_t = 100)]
        limit: usize,
        /// Window start, inclusive (e.g. 2024-01-01 or 2024-01-01T09:00:00)
        #[arg(long)]
        from: Option<CalendarDate>,
        /// Window end, exclusive
        #[arg(long)]
        to: Option<CalendarDate>,
        /// IANA zone of the entry's wall-clock times; instances are emitted in UTC
        #[arg(long)]
        tz: Option<String>,
        /// DST gap policy used with --tz
        #[arg(long, value_enum, default_value_t = DstArg::Shift)]
        dst: DstArg,
    },
    /// Validate an entry document and print its start and end
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Expand {
            input,
            output,
            limit,
            from,
            to,
            tz,
            dst,
        } => {
            let document = parse_document(&read_input(input.as_deref())?)?;
            let event = document
                .into_event()
                .context("Invalid recurring entry")?;

            let instances: Vec<EventInstance> = if from.is_some() || to.is_some() {
                event
                    .window(
                        from.unwrap_or(CalendarDate::MIN),
                        to.unwrap_or(CalendarDate::MAX),
                    )
                    .context("Failed to expand window")?
                    .take(limit)
                    .collect::<recurrence_engine::error::Result<_>>()
                    .context("Failed to expand window")?
            } else {
                let mut first = event
                    .instances()
                    .context("Failed to expand entry")?
                    .take(limit)
                    .collect::<recurrence_engine::error::Result<Vec<_>>>()
                    .context("Failed to expand entry")?;
                sort_by_start(&mut first);
                first
            };
            tracing::debug!(count = instances.len(), "expanded instances");

            let rendered = match tz {
                Some(name) => {
                    let zone = ZoneResolver::new(&name, dst.into())?;
                    let resolved = zone
                        .resolve_instances(&instances)
                        .with_context(|| format!("Failed to resolve instances in {}", name))?;
                    serde_json::to_string_pretty(&resolved)?
                }
                None => serde_json::to_string_pretty(&instances)?,
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Check { input } => {
            let document = parse_document(&read_input(input.as_deref())?)?;
            match document.into_event() {
                Ok(event) => {
                    let summary = serde_json::json!({
                        "subject": event.details().subject,
                        "start": event.start(),
                        "end": event.end(),
                        "recurring": event.is_recurring(),
                    });
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                Err(err) => {
                    eprintln!("error[{:?}]: {}", err.kind(), err);
                    process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_document(text: &str) -> Result<EventDocument> {
    serde_json::from_str(text).context("Failed to parse entry document")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
