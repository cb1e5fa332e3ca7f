//! fmu-core: file-backed storage for vehicle telemetry records
//!
//! Records (location, device and vehicle state) are kept as delimited text
//! lines under a storage root, in one of two layouts:
//!
//! - **Single-file**: one file, replaced atomically on write, compacted by
//!   timestamp, queried by time range.
//! - **Partitioned**: one append-only file per category and local day,
//!   pruned by whole partitions, queried for the newest record only.
//!
//! # Quick Start
//!
//! ```no_run
//! use fmu_core::{Record, Store, StoreConfig};
//!
//! # fn main() -> fmu_core::StoreResult<()> {
//! let config = StoreConfig::from_env();
//! let Store::SingleFile(store) = Store::open(&config) else {
//!     unreachable!("default mode is single-file");
//! };
//!
//! let mut record = Record::default();
//! record.location.timestamp_ms = 1_730_000_000_000;
//! store.write(&[record])?;
//!
//! let found = store.query(1_729_999_999_000, 1_730_000_001_000)?;
//! assert_eq!(found, vec![record]);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod partition;
pub mod query;
pub mod record;
pub mod retention;
pub mod safe_io;
pub mod store;

pub use config::{StorageMode, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use partition::{Category, PartitionRef, PartitionResolver};
pub use record::{DeviceStatus, FixType, Location, PowerStage, Record, VehicleStatus};
pub use retention::{CompactionReport, PruneReport};
pub use store::{PartitionedStore, SingleFileStore, Store};
