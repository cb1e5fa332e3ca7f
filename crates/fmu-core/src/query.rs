//! Read-back queries.
//!
//! Both queries are linear scans. Malformed lines are skipped with a
//! warning, never surfaced as errors.

use crate::codec::decode_lines;
use crate::error::StoreResult;
use crate::partition::{Category, PartitionResolver};
use crate::record::Record;
use crate::safe_io::read_if_exists;
use std::path::Path;

/// Records in `path` with `from_ms <= timestamp_ms <= to_ms`, in file order.
///
/// A missing file yields an empty result. An inverted range (`from_ms >
/// to_ms`) matches nothing.
pub fn scan_range(path: &Path, from_ms: i64, to_ms: i64) -> StoreResult<Vec<Record>> {
    let Some(content) = read_if_exists(path)? else {
        return Ok(Vec::new());
    };

    let decoded = decode_lines(&content, &path.display().to_string());
    Ok(decoded
        .records
        .into_iter()
        .filter(|r| (from_ms..=to_ms).contains(&r.timestamp_ms()))
        .collect())
}

/// The physically last decodable record in the newest partition of `category`.
///
/// Only the newest partition is read. When it holds no decodable record the
/// result is `None`; older partitions are not consulted.
pub fn newest_record(resolver: &PartitionResolver, category: Category) -> StoreResult<Option<Record>> {
    let Some(partition) = resolver.newest(category)? else {
        return Ok(None);
    };

    let Some(content) = read_if_exists(&partition.path)? else {
        // Deleted between listing and reading.
        return Ok(None);
    };

    let decoded = decode_lines(&content, &partition.path.display().to_string());
    Ok(decoded.records.last().copied())
}
