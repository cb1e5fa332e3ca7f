//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use fmu_core::{Category, StorageMode, StoreConfig, StoreResult};
use std::path::PathBuf;

/// fmu - local telemetry record store
#[derive(Parser, Debug)]
#[command(name = "fmu", version, about = "Write, prune and query stored telemetry records")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Storage root directory (overrides config file and FMU_STORAGE_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Storage layout
    #[arg(long, global = true, value_enum)]
    pub mode: Option<ModeArg>,

    /// TOML config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    SingleFile,
    Partitioned,
}

impl From<ModeArg> for StorageMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::SingleFile => StorageMode::SingleFile,
            ModeArg::Partitioned => StorageMode::Partitioned,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store records read as JSON (an array, or one object per line)
    Write {
        /// Category (partitioned mode only)
        #[arg(long)]
        category: Option<String>,

        /// Read records from FILE instead of stdin
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Remove old records or partitions
    Prune {
        /// Drop records with timestamp below this (single-file mode)
        #[arg(long, value_name = "MS", allow_hyphen_values = true)]
        before_ms: Option<i64>,

        /// Category (partitioned mode only)
        #[arg(long)]
        category: Option<String>,

        /// Delete partitions more than this many days old (partitioned mode)
        #[arg(long, allow_hyphen_values = true)]
        days: Option<i64>,
    },

    /// Print records as JSON lines
    Query {
        /// Range start, inclusive (ignored in partitioned mode)
        #[arg(long, value_name = "MS", default_value_t = i64::MIN, allow_hyphen_values = true)]
        from: i64,

        /// Range end, inclusive (ignored in partitioned mode)
        #[arg(long, value_name = "MS", default_value_t = i64::MAX, allow_hyphen_values = true)]
        to: i64,

        /// Category (partitioned mode only)
        #[arg(long)]
        category: Option<String>,
    },

    /// Write, prune and read back a sample record
    Demo,
}

impl GlobalArgs {
    /// Resolve the store configuration: config file < env < flags.
    pub fn resolve_config(&self) -> StoreResult<StoreConfig> {
        let mut config = StoreConfig::load(self.config.as_deref())?;
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Resolve an optional category flag; unrecognised names fall back to Unknown.
pub fn category_arg(category: Option<&str>) -> Category {
    category.map(Category::from_name).unwrap_or(Category::Gps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("fmu").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_query_defaults() {
        let cli = parse(&["query"]);
        match cli.command {
            Command::Query { from, to, category } => {
                assert_eq!(from, i64::MIN);
                assert_eq!(to, i64::MAX);
                assert!(category.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = parse(&["prune", "--days", "30", "--mode", "partitioned", "--root", "/tmp/x"]);
        assert_eq!(cli.global.mode, Some(ModeArg::Partitioned));
        assert_eq!(cli.global.root, Some(PathBuf::from("/tmp/x")));
        match cli.command {
            Command::Prune { days, before_ms, .. } => {
                assert_eq!(days, Some(30));
                assert_eq!(before_ms, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_negative_days() {
        let cli = parse(&["prune", "--days", "-1"]);
        assert!(matches!(cli.command, Command::Prune { days: Some(-1), .. }));
    }

    #[test]
    fn test_category_arg() {
        assert_eq!(category_arg(None), Category::Gps);
        assert_eq!(category_arg(Some("DriverInformation")), Category::DriverInformation);
        assert_eq!(category_arg(Some("bogus")), Category::Unknown);
    }
}
