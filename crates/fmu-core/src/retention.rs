//! Retention policies, one per storage mode.
//!
//! - [`compact_file()`] rewrites the single store file keeping only records
//!   at or after a timestamp.
//! - [`prune_partitions()`] unlinks whole partitions older than a day cutoff.
//!
//! # Lossy Compaction
//!
//! Compaction re-encodes what it could decode. Lines that fail to decode are
//! not carried over, so a compaction pass permanently removes them. The
//! count is reported in [`CompactionReport::dropped_malformed`].
//!
//! # Best-Effort Partition Deletion
//!
//! Partition deletion never aborts on a per-file failure: every candidate is
//! attempted and the call succeeds regardless. Failures are counted in the
//! returned [`PruneReport`] together with the first error message, which is
//! the only diagnostic kept. Callers relying on retention to relieve storage
//! pressure should check [`PruneReport::advisory`].

use crate::codec::{decode_lines, encode_lines};
use crate::error::{StoreError, StoreResult};
use crate::partition::{Category, PartitionRef, PartitionResolver, cutoff_date};
use crate::safe_io::{atomic_replace, read_if_exists};
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of a single-file compaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// Records written back.
    pub kept: usize,
    /// Records older than the threshold.
    pub removed: usize,
    /// Lines that failed to decode and were discarded.
    pub dropped_malformed: usize,
}

/// Keep only records with `timestamp_ms >= older_than_ms` in the file at `path`.
///
/// A missing file means there is nothing to delete and is not an error; the
/// file is not created in that case. The kept records are written back with
/// [`atomic_replace`], so a failure leaves the previous content intact.
pub fn compact_file(path: &Path, older_than_ms: i64) -> StoreResult<CompactionReport> {
    let Some(content) = read_if_exists(path)? else {
        log::debug!("{} does not exist, nothing to compact", path.display());
        return Ok(CompactionReport::default());
    };

    let decoded = decode_lines(&content, &path.display().to_string());
    let total = decoded.records.len();
    let kept: Vec<_> = decoded
        .records
        .into_iter()
        .filter(|r| r.timestamp_ms() >= older_than_ms)
        .collect();

    atomic_replace(path, encode_lines(&kept).as_bytes())?;

    let report = CompactionReport {
        kept: kept.len(),
        removed: total - kept.len(),
        dropped_malformed: decoded.malformed,
    };
    log::info!(
        "compacted {}: kept {}, removed {}, dropped {} malformed",
        path.display(),
        report.kept,
        report.removed,
        report.dropped_malformed
    );
    Ok(report)
}

/// Outcome of a partition prune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// The computed cutoff; partitions dated strictly before it were candidates.
    pub cutoff: Option<NaiveDate>,
    /// Partitions removed.
    pub deleted: Vec<PathBuf>,
    /// Candidates that could not be removed.
    pub failed: usize,
    /// Message of the first failure, if any.
    pub first_error: Option<String>,
}

impl PruneReport {
    /// True when every candidate was removed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Human-readable summary of failures, or `None` when there were none.
    pub fn advisory(&self) -> Option<String> {
        let first = self.first_error.as_deref()?;
        Some(if self.failed == 1 {
            format!("failed to delete 1 partition: {}", first)
        } else {
            format!(
                "failed to delete {} partitions (first error: {})",
                self.failed, first
            )
        })
    }

    fn record_failure(&mut self, message: String) {
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(message);
        }
    }
}

/// Delete every partition of `category` dated strictly before
/// `today - days_older`.
///
/// # Errors
///
/// [`StoreError::InvalidArgument`] when `days_older` is negative, and
/// [`StoreError::Io`] when the root cannot be listed. Individual unlink
/// failures are reported in the [`PruneReport`] instead.
pub fn prune_partitions(
    resolver: &PartitionResolver,
    category: Category,
    days_older: i64,
    today: NaiveDate,
) -> StoreResult<PruneReport> {
    prune_partitions_with(resolver, category, days_older, today, |path| {
        fs::remove_file(path)
    })
}

/// [`prune_partitions()`] with a pluggable unlink, so failure handling can be
/// exercised without filesystem tricks.
pub(crate) fn prune_partitions_with(
    resolver: &PartitionResolver,
    category: Category,
    days_older: i64,
    today: NaiveDate,
    mut remove: impl FnMut(&Path) -> io::Result<()>,
) -> StoreResult<PruneReport> {
    let days = u64::try_from(days_older).map_err(|_| {
        StoreError::invalid_argument(format!(
            "days_older must be non-negative, got {}",
            days_older
        ))
    })?;

    let cutoff = cutoff_date(today, days);
    let mut report = PruneReport {
        cutoff: Some(cutoff),
        ..PruneReport::default()
    };

    let candidates: Vec<PartitionRef> = resolver
        .list_partitions(category)?
        .into_iter()
        .filter(|p| p.date < cutoff)
        .collect();

    for partition in candidates {
        match remove(&partition.path) {
            Ok(()) => report.deleted.push(partition.path),
            // Already gone is as good as deleted.
            Err(e) if e.kind() == io::ErrorKind::NotFound => report.deleted.push(partition.path),
            Err(e) => {
                log::warn!("failed to delete {}: {}", partition.path.display(), e);
                report.record_failure(format!("{}: {}", partition.path.display(), e));
            }
        }
    }

    log::info!(
        "pruned {} partitions before {}: {} deleted, {} failed",
        category,
        cutoff,
        report.deleted.len(),
        report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::partition::file_name;
    use crate::record::Record;
    use tempfile::TempDir;

    fn record_at(ts: i64) -> Record {
        let mut r = Record::default();
        r.location.timestamp_ms = ts;
        r
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn touch_partition(root: &Path, category: Category, d: NaiveDate) -> PathBuf {
        let path = root.join(file_name(category, d));
        fs::write(&path, encode_lines([&record_at(1)])).unwrap();
        path
    }

    #[test]
    fn test_compact_missing_file_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.ndjson");

        let report = compact_file(&path, 100).unwrap();
        assert_eq!(report, CompactionReport::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_compact_keeps_boundary_and_newer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.ndjson");
        fs::write(&path, encode_lines([&record_at(99), &record_at(100), &record_at(101)])).unwrap();

        let report = compact_file(&path, 100).unwrap();
        assert_eq!(report.kept, 2);
        assert_eq!(report.removed, 1);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            encode_lines([&record_at(100), &record_at(101)])
        );
    }

    #[test]
    fn test_compact_drops_malformed_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.ndjson");
        let content = format!(
            "{}\nnot,a,record\n{}\n",
            encode(&record_at(200)),
            encode(&record_at(300))
        );
        fs::write(&path, content).unwrap();

        // Threshold below every record: only the malformed line goes.
        let report = compact_file(&path, 0).unwrap();
        assert_eq!(report.kept, 2);
        assert_eq!(report.removed, 0);
        assert_eq!(report.dropped_malformed, 1);
        assert!(!fs::read_to_string(&path).unwrap().contains("not,a,record"));
    }

    #[test]
    fn test_compact_drops_invalid_utf8_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.ndjson");
        let mut content = encode_lines([&record_at(10)]).into_bytes();
        content.extend_from_slice(b"\xff\xfe garbage\n");
        content.extend_from_slice(encode_lines([&record_at(20)]).as_bytes());
        fs::write(&path, content).unwrap();

        let report = compact_file(&path, 15).unwrap();
        assert_eq!(report.kept, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.dropped_malformed, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), encode_lines([&record_at(20)]));
    }

    #[test]
    fn test_compact_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.ndjson");
        fs::write(
            &path,
            encode_lines([&record_at(5), &record_at(50), &record_at(500)]),
        )
        .unwrap();

        compact_file(&path, 50).unwrap();
        let once = fs::read_to_string(&path).unwrap();
        let second = compact_file(&path, 50).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), once);
        assert_eq!(second.removed, 0);
    }

    #[test]
    fn test_prune_rejects_negative_window() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = PartitionResolver::new(temp_dir.path());
        let err = prune_partitions(&resolver, Category::Gps, -1, date(2024, 10, 28)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_prune_deletes_strictly_older_than_cutoff() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let today = date(2024, 10, 28);
        let old = touch_partition(root, Category::Gps, date(2024, 9, 27));
        let boundary = touch_partition(root, Category::Gps, date(2024, 9, 28));
        let recent = touch_partition(root, Category::Gps, date(2024, 10, 27));

        let resolver = PartitionResolver::new(root);
        let report = prune_partitions(&resolver, Category::Gps, 30, today).unwrap();

        assert_eq!(report.cutoff, Some(date(2024, 9, 28)));
        assert_eq!(report.deleted, vec![old.clone()]);
        assert!(report.is_clean());
        assert!(report.advisory().is_none());
        assert!(!old.exists());
        assert!(boundary.exists());
        assert!(recent.exists());
    }

    #[test]
    fn test_prune_leaves_other_categories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let gps = touch_partition(root, Category::Gps, date(2020, 1, 1));
        let driver = touch_partition(root, Category::DriverInformation, date(2020, 1, 1));

        let resolver = PartitionResolver::new(root);
        prune_partitions(&resolver, Category::Gps, 0, date(2024, 10, 28)).unwrap();

        assert!(!gps.exists());
        assert!(driver.exists());
    }

    #[test]
    fn test_prune_zero_days_keeps_today() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let today = date(2024, 10, 28);
        let current = touch_partition(root, Category::Gps, today);
        let yesterday = touch_partition(root, Category::Gps, date(2024, 10, 27));

        let resolver = PartitionResolver::new(root);
        let report = prune_partitions(&resolver, Category::Gps, 0, today).unwrap();

        assert_eq!(report.deleted, vec![yesterday]);
        assert!(current.exists());
    }

    #[test]
    fn test_prune_continues_after_failures() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for day in 1..=3 {
            touch_partition(root, Category::Gps, date(2024, 1, day));
        }

        let resolver = PartitionResolver::new(root);
        let mut attempts = 0;
        let report = prune_partitions_with(&resolver, Category::Gps, 0, date(2024, 10, 28), |path| {
            attempts += 1;
            if path.to_string_lossy().ends_with("_01.txt") {
                fs::remove_file(path)
            } else {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
            }
        })
        .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(report.deleted.len(), 1);
        assert_eq!(report.failed, 2);
        assert!(!report.is_clean());
        let advisory = report.advisory().unwrap();
        assert!(advisory.starts_with("failed to delete 2 partitions"));
        assert!(advisory.contains("read-only"));
    }

    #[test]
    fn test_prune_treats_vanished_file_as_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch_partition(root, Category::Gps, date(2024, 1, 1));

        let resolver = PartitionResolver::new(root);
        let report = prune_partitions_with(&resolver, Category::Gps, 0, date(2024, 10, 28), |_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        })
        .unwrap();

        assert_eq!(report.deleted.len(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_prune_missing_root_is_empty_success() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = PartitionResolver::new(temp_dir.path().join("missing"));
        let report = prune_partitions(&resolver, Category::Gps, 30, date(2024, 10, 28)).unwrap();
        assert!(report.deleted.is_empty());
        assert!(report.is_clean());
    }
}
