//! # Date-Partitioned Storage Layout
//!
//! In partitioned mode records are grouped by category and local calendar
//! day, one file per pair:
//!
//! ```text
//! <root>/
//! ├── GPS_2024_10_27.txt
//! ├── GPS_2024_10_28.txt                   # newest GPS partition
//! ├── DriverInformation_2024_10_28.txt
//! └── store.ndjson                         # single-file mode, disjoint namespace
//! ```
//!
//! A partition is created by the first append for its day, never renamed,
//! and only removed by retention (see [`crate::retention`]).
//!
//! ## Ordering
//!
//! [`PartitionResolver::list_partitions`] sorts by the parsed
//! [`NaiveDate`], newest first, with a stable sort: two files that parse to
//! the same date keep directory enumeration order, which is unspecified.
//!
//! ## Unknown Categories
//!
//! Category names and codes coming from outside resolve to
//! [`Category::Unknown`] instead of failing, which still yields a usable
//! file name (`Unknown_YYYY_MM_DD.txt`). Every unrecognised input therefore
//! shares one set of partitions.

use crate::error::{StoreError, StoreResult};
use chrono::{Datelike, Days, NaiveDate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum::{AsRefStr, EnumIter, EnumString};

/// Extension of partition files.
pub const PARTITION_EXTENSION: &str = "txt";

/// Record category; selects the partition file prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    #[strum(serialize = "GPS")]
    Gps,
    #[strum(serialize = "DriverInformation")]
    DriverInformation,
    #[strum(serialize = "DriverViolationBehavior")]
    DriverViolationBehavior,
    #[strum(serialize = "Unknown")]
    Unknown,
}

impl Category {
    /// File name prefix for this category.
    pub fn prefix(&self) -> &str {
        self.as_ref()
    }

    /// Resolve a category name, falling back to [`Category::Unknown`].
    ///
    /// Never fails. Unrecognised names are logged and mapped to the shared
    /// `Unknown` prefix.
    pub fn from_name(name: &str) -> Self {
        Self::from_str(name.trim()).unwrap_or_else(|_| {
            log::warn!("unrecognised category {:?}, using \"Unknown\"", name);
            Self::Unknown
        })
    }

    /// Resolve a numeric category code (0 GPS, 1 driver information,
    /// 2 driver violation behavior), falling back to [`Category::Unknown`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Gps,
            1 => Self::DriverInformation,
            2 => Self::DriverViolationBehavior,
            other => {
                log::warn!("unrecognised category code {}, using \"Unknown\"", other);
                Self::Unknown
            }
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One partition file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRef {
    pub category: Category,
    pub date: NaiveDate,
    pub path: PathBuf,
}

/// `today - days_older`, normalised across month and year boundaries.
///
/// A window reaching past the earliest representable date saturates there,
/// so nothing counts as older.
pub fn cutoff_date(today: NaiveDate, days_older: u64) -> NaiveDate {
    today
        .checked_sub_days(Days::new(days_older))
        .unwrap_or(NaiveDate::MIN)
}

/// Partition name for a category and day: `{prefix}_{YYYY}_{MM}_{DD}.txt`.
pub fn file_name(category: Category, date: NaiveDate) -> String {
    format!(
        "{}_{:04}_{:02}_{:02}.{}",
        category.prefix(),
        date.year(),
        date.month(),
        date.day(),
        PARTITION_EXTENSION
    )
}

/// Parse the date out of a partition name belonging to `category`.
///
/// Returns `None` for other categories, other extensions, and date segments
/// that are not exactly `YYYY_MM_DD` (zero-padded digits) naming a real day.
pub fn parse_file_name(category: Category, name: &str) -> Option<NaiveDate> {
    let rest = name.strip_prefix(category.prefix())?.strip_prefix('_')?;
    let stem = rest
        .strip_suffix(PARTITION_EXTENSION)?
        .strip_suffix('.')?;

    let mut parts = stem.split('_');
    let year = parse_digits(parts.next()?, 4)?;
    let month = parse_digits(parts.next()?, 2)?;
    let day = parse_digits(parts.next()?, 2)?;
    if parts.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn parse_digits(segment: &str, width: usize) -> Option<u32> {
    if segment.len() != width || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Maps categories and dates to partition files under a storage root.
#[derive(Debug, Clone)]
pub struct PartitionResolver {
    root: PathBuf,
}

impl PartitionResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the partition for `category` on `date`.
    pub fn path_for(&self, category: Category, date: NaiveDate) -> PathBuf {
        self.root.join(file_name(category, date))
    }

    /// All partitions of `category`, newest first.
    ///
    /// A missing root yields an empty list. Names that carry the category
    /// prefix but no valid date are skipped.
    pub fn list_partitions(&self, category: Category) -> StoreResult<Vec<PartitionRef>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("list partitions", &self.root, e)),
        };

        let mut partitions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io("list partitions", &self.root, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(date) = parse_file_name(category, name) else {
                continue;
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            partitions.push(PartitionRef {
                category,
                date,
                path: entry.path(),
            });
        }

        // Stable: equal dates keep enumeration order.
        partitions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(partitions)
    }

    /// The newest partition of `category`, if any.
    pub fn newest(&self, category: Category) -> StoreResult<Option<PartitionRef>> {
        Ok(self.list_partitions(category)?.into_iter().next())
    }
}
