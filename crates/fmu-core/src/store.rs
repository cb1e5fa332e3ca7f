//! Store facade over both storage modes.
//!
//! [`Store::open`] picks [`SingleFileStore`] or [`PartitionedStore`] from
//! [`StoreConfig::mode`]. The two modes use disjoint file names, so both can
//! be opened on the same root.
//!
//! # Concurrency
//!
//! There is no locking. At most one writer may use a given root at a time;
//! concurrent writers to the same file interleave unpredictably.

use crate::codec::encode_lines;
use crate::config::{StorageMode, StoreConfig};
use crate::error::StoreResult;
use crate::partition::{Category, PartitionRef, PartitionResolver};
use crate::query::{newest_record, scan_range};
use crate::record::Record;
use crate::retention::{CompactionReport, PruneReport, compact_file, prune_partitions};
use crate::safe_io::{atomic_append, atomic_replace};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

/// A store in either mode.
#[derive(Debug, Clone)]
pub enum Store {
    SingleFile(SingleFileStore),
    Partitioned(PartitionedStore),
}

impl Store {
    /// Open the store described by `config`. No I/O happens until the first
    /// operation.
    pub fn open(config: &StoreConfig) -> Self {
        match config.mode {
            StorageMode::SingleFile => Self::SingleFile(SingleFileStore::new(config)),
            StorageMode::Partitioned => Self::Partitioned(PartitionedStore::new(config)),
        }
    }

    pub fn mode(&self) -> StorageMode {
        match self {
            Self::SingleFile(_) => StorageMode::SingleFile,
            Self::Partitioned(_) => StorageMode::Partitioned,
        }
    }
}

/// All records in one file, replaced on every write.
#[derive(Debug, Clone)]
pub struct SingleFileStore {
    path: PathBuf,
}

impl SingleFileStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            path: config.single_file_path(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the whole store with `records`.
    ///
    /// All-or-nothing: on failure the previous content is untouched. Writing
    /// an empty slice leaves an empty file.
    pub fn write(&self, records: &[Record]) -> StoreResult<()> {
        log::debug!("replacing {} with {} records", self.path.display(), records.len());
        atomic_replace(&self.path, encode_lines(records).as_bytes())
    }

    /// Drop every record with `timestamp_ms < older_than_ms`.
    pub fn prune_older_than(&self, older_than_ms: i64) -> StoreResult<CompactionReport> {
        compact_file(&self.path, older_than_ms)
    }

    /// Records with `from_ms <= timestamp_ms <= to_ms`, in insertion order.
    pub fn query(&self, from_ms: i64, to_ms: i64) -> StoreResult<Vec<Record>> {
        scan_range(&self.path, from_ms, to_ms)
    }
}

/// Append-only files per category and local calendar day.
#[derive(Debug, Clone)]
pub struct PartitionedStore {
    resolver: PartitionResolver,
}

impl PartitionedStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            resolver: PartitionResolver::new(&config.root),
        }
    }

    pub fn resolver(&self) -> &PartitionResolver {
        &self.resolver
    }

    /// Append `records` to today's (local time) partition for `category`.
    pub fn write(&self, category: Category, records: &[Record]) -> StoreResult<()> {
        self.write_on(category, today(), records)
    }

    /// Append `records` to the partition for `category` on `date`.
    ///
    /// An empty slice is a no-op and does not create the partition.
    pub fn write_on(&self, category: Category, date: NaiveDate, records: &[Record]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let path = self.resolver.path_for(category, date);
        log::debug!("appending {} records to {}", records.len(), path.display());
        atomic_append(&path, &encode_lines(records))
    }

    /// Delete whole partitions of `category` dated more than `days_older`
    /// days before today (local time).
    ///
    /// Succeeds even when some partitions could not be removed; see
    /// [`PruneReport::advisory`].
    pub fn prune_older_than(&self, category: Category, days_older: i64) -> StoreResult<PruneReport> {
        self.prune_older_than_at(category, days_older, today())
    }

    /// [`Self::prune_older_than`] relative to an explicit `today`.
    pub fn prune_older_than_at(
        &self,
        category: Category,
        days_older: i64,
        today: NaiveDate,
    ) -> StoreResult<PruneReport> {
        prune_partitions(&self.resolver, category, days_older, today)
    }

    /// The most recent record of `category`, as a zero- or one-element list.
    ///
    /// `from_ms` and `to_ms` are accepted for symmetry with
    /// [`SingleFileStore::query`] but are ignored: the result is always the
    /// last record of the newest partition, whatever its timestamp.
    pub fn query(&self, category: Category, from_ms: i64, to_ms: i64) -> StoreResult<Vec<Record>> {
        let _ = (from_ms, to_ms);
        Ok(newest_record(&self.resolver, category)?.into_iter().collect())
    }

    /// Partitions of `category`, newest first.
    pub fn partitions(&self, category: Category) -> StoreResult<Vec<PartitionRef>> {
        self.resolver.list_partitions(category)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
