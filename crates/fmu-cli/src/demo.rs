//! `fmu demo`: write one sample record, prune, and read it back.

use fmu_core::{Category, DeviceStatus, Location, Record, Store, StoreResult, VehicleStatus};

/// 2024-10-28, Ho Chi Minh City.
const SAMPLE_TIMESTAMP_MS: i64 = 1_730_000_000_000;
const PRUNE_BEFORE_MS: i64 = 1_729_999_999_000;
const QUERY_TO_MS: i64 = 1_730_000_001_000;
const PRUNE_DAYS: i64 = 30;

fn sample_record() -> Record {
    Record {
        location: Location {
            timestamp_ms: SAMPLE_TIMESTAMP_MS,
            latitude: 10.762622,
            longitude: 106.660172,
            accuracy_m: 5.0,
            valid: true,
            fix_type: 3,
        },
        device: DeviceStatus { power_stage: 2 },
        vehicle: VehicleStatus {
            speed_kmh: 12.3,
            acceleration_ms2: 0.4,
            fuel_level_pct: 55.0,
            cargo_weight_kg: 1000.0,
        },
    }
}

pub fn run(store: &Store) -> StoreResult<()> {
    let records = [sample_record()];

    println!("1. Writing 1 sample record");
    let found = match store {
        Store::SingleFile(s) => {
            s.write(&records)?;
            println!("2. Pruning records before {}", PRUNE_BEFORE_MS);
            let report = s.prune_older_than(PRUNE_BEFORE_MS)?;
            println!("   kept {}, removed {}", report.kept, report.removed);
            s.query(PRUNE_BEFORE_MS, QUERY_TO_MS)?
        }
        Store::Partitioned(p) => {
            p.write(Category::Gps, &records)?;
            println!("2. Pruning partitions older than {} days", PRUNE_DAYS);
            let report = p.prune_older_than(Category::Gps, PRUNE_DAYS)?;
            println!("   deleted {} partition(s)", report.deleted.len());
            if let Some(advisory) = report.advisory() {
                println!("   warning: {}", advisory);
            }
            p.query(Category::Gps, PRUNE_BEFORE_MS, QUERY_TO_MS)?
        }
    };

    println!("3. Retrieved {} record(s)", found.len());
    if let Some(first) = found.first() {
        println!(
            "   location: {:.6}, {:.6}",
            first.location.latitude, first.location.longitude
        );
        println!("   speed: {:.1} km/h", first.vehicle.speed_kmh);
        println!("   fuel: {:.1}%", first.vehicle.fuel_level_pct);
    }
    Ok(())
}
