// fmu: CLI frontend for fmu-core
// Argument parsing, JSON record I/O, logging setup

mod cli;
mod demo;

use clap::Parser;
use cli::{Cli, Command, category_arg};
use fmu_core::{Record, Store, StoreError, StoreResult};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Default level is `warn` (`debug` with -v); `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> StoreResult<()> {
    let config = cli.global.resolve_config()?;
    log::debug!("store root {} ({:?})", config.root.display(), config.mode);
    let store = Store::open(&config);

    match cli.command {
        Command::Write { category, input } => {
            let records = read_records(input.as_deref())?;
            match &store {
                Store::SingleFile(s) => s.write(&records)?,
                Store::Partitioned(p) => p.write(category_arg(category.as_deref()), &records)?,
            }
            eprintln!("[wrote {} record(s)]", records.len());
        }
        Command::Prune {
            before_ms,
            category,
            days,
        } => match &store {
            Store::SingleFile(s) => {
                let before_ms = before_ms.ok_or_else(|| {
                    StoreError::invalid_argument("--before-ms is required in single-file mode")
                })?;
                let report = s.prune_older_than(before_ms)?;
                eprintln!(
                    "[kept {}, removed {}, dropped {} malformed]",
                    report.kept, report.removed, report.dropped_malformed
                );
            }
            Store::Partitioned(p) => {
                let days = days.ok_or_else(|| {
                    StoreError::invalid_argument("--days is required in partitioned mode")
                })?;
                let report = p.prune_older_than(category_arg(category.as_deref()), days)?;
                eprintln!("[deleted {} partition(s)]", report.deleted.len());
                if let Some(advisory) = report.advisory() {
                    eprintln!("[WARN] {}", advisory);
                }
            }
        },
        Command::Query { from, to, category } => {
            let records = match &store {
                Store::SingleFile(s) => s.query(from, to)?,
                Store::Partitioned(p) => p.query(category_arg(category.as_deref()), from, to)?,
            };
            print_records(&records)?;
        }
        Command::Demo => demo::run(&store)?,
    }

    Ok(())
}

/// Parse records from a JSON array or JSON lines, from `input` or stdin.
fn read_records(input: Option<&Path>) -> StoreResult<Vec<Record>> {
    let text = match input {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|e| StoreError::io("read input", path, e))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| StoreError::io("read input", "<stdin>", e))?;
            buf
        }
    };
    parse_records(&text)
}

fn parse_records(text: &str) -> StoreResult<Vec<Record>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| StoreError::invalid_argument(format!("invalid JSON input: {}", e)));
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                StoreError::invalid_argument(format!("invalid JSON on line {}: {}", i + 1, e))
            })
        })
        .collect()
}

fn print_records(records: &[Record]) -> StoreResult<()> {
    let stdout = io::stdout();
    write_records(BufWriter::new(stdout.lock()), records)
        .map_err(|e| StoreError::io("write", "<stdout>", e))
}

/// Write `records` as JSON lines.
fn write_records(mut out: impl Write, records: &[Record]) -> io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
