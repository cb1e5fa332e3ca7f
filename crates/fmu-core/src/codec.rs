//! Line codec for records.
//!
//! Each record is one comma-separated line with exactly [`FIELD_COUNT`]
//! fields in fixed order:
//!
//! ```text
//! timestamp_ms,latitude,longitude,accuracy_m,valid,fix_type,power_stage,speed_kmh,acceleration_ms2,fuel_level_pct,cargo_weight_kg
//! ```
//!
//! Floats are written in fixed notation with [`FLOAT_PRECISION`] fractional
//! digits and `valid` as `0`/`1`, which keeps files readable by the legacy
//! tooling that produced the format. None of the textual forms can contain
//! the delimiter or a newline.
//!
//! # Precision
//!
//! Integer and boolean fields round-trip exactly. Float fields round-trip to
//! within `1e-9`: anything finer is rounded away by the fixed notation, so
//! `0.1 + 0.2` comes back as `0.3` and `1e-12` as `0.0`. Values that already
//! have at most nine fractional digits, such as coordinates from a receiver,
//! come back identical.

use crate::error::{StoreError, StoreResult};
use crate::record::{DeviceStatus, Location, Record, VehicleStatus};
use std::fmt::Write as _;
use std::str::FromStr;

/// Number of fields in an encoded record.
pub const FIELD_COUNT: usize = 11;

/// Field delimiter.
pub const DELIMITER: char = ',';

/// Fractional digits written for every float field.
pub const FLOAT_PRECISION: usize = 9;

/// Encode one record as a single line without the trailing newline.
pub fn encode(record: &Record) -> String {
    let Record {
        location,
        device,
        vehicle,
    } = record;
    let p = FLOAT_PRECISION;
    format!(
        "{},{:.p$},{:.p$},{:.p$},{},{},{},{:.p$},{:.p$},{:.p$},{:.p$}",
        location.timestamp_ms,
        location.latitude,
        location.longitude,
        location.accuracy_m,
        u8::from(location.valid),
        location.fix_type,
        device.power_stage,
        vehicle.speed_kmh,
        vehicle.acceleration_ms2,
        vehicle.fuel_level_pct,
        vehicle.cargo_weight_kg,
    )
}

/// Encode records as newline-terminated lines, ready to be written as-is.
pub fn encode_lines<'a>(records: impl IntoIterator<Item = &'a Record>) -> String {
    let mut out = String::new();
    for record in records {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}", encode(record));
    }
    out
}

/// Decode one line into a record.
///
/// Fails with [`StoreError::MalformedRecord`] when the line does not have
/// exactly [`FIELD_COUNT`] fields or any field fails to parse. Nothing is
/// returned on failure; there is no partially populated record.
pub fn decode(line: &str) -> StoreResult<Record> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(StoreError::malformed(format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    Ok(Record {
        location: Location {
            timestamp_ms: parse_field(&fields, 0, "timestamp_ms")?,
            latitude: parse_field(&fields, 1, "latitude")?,
            longitude: parse_field(&fields, 2, "longitude")?,
            accuracy_m: parse_field(&fields, 3, "accuracy_m")?,
            valid: parse_field::<i64>(&fields, 4, "valid")? != 0,
            fix_type: parse_field(&fields, 5, "fix_type")?,
        },
        device: DeviceStatus {
            power_stage: parse_field(&fields, 6, "power_stage")?,
        },
        vehicle: VehicleStatus {
            speed_kmh: parse_field(&fields, 7, "speed_kmh")?,
            acceleration_ms2: parse_field(&fields, 8, "acceleration_ms2")?,
            fuel_level_pct: parse_field(&fields, 9, "fuel_level_pct")?,
            cargo_weight_kg: parse_field(&fields, 10, "cargo_weight_kg")?,
        },
    })
}

fn parse_field<T: FromStr>(fields: &[&str], index: usize, name: &str) -> StoreResult<T>
where
    T::Err: std::fmt::Display,
{
    let raw = fields[index].trim();
    raw.parse::<T>()
        .map_err(|e| StoreError::malformed(format!("field {} ({}) {:?}: {}", index, name, raw, e)))
}

/// Records decoded from a block of text, plus how many lines were skipped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodedLines {
    pub records: Vec<Record>,
    /// Non-empty lines that failed to decode.
    pub malformed: usize,
}

/// Decode every non-empty line of `content`, skipping malformed lines with
/// warnings.
///
/// Lines are split on raw `\n` bytes, so a line that is not valid UTF-8 only
/// costs that line. Empty lines (including the artifact after a trailing
/// newline) are not records and are ignored silently. Warning messages
/// include `source` and the line number for easier debugging. A partially
/// written final line, left behind by an interrupted append, ends up here as
/// a malformed line.
pub fn decode_lines(content: &[u8], source: &str) -> DecodedLines {
    let mut decoded = DecodedLines::default();

    for (line_num, raw) in content.split(|&b| b == b'\n').enumerate() {
        if raw.is_empty() {
            continue;
        }
        let result = std::str::from_utf8(raw)
            .map_err(|e| StoreError::malformed(format!("not valid UTF-8: {}", e)))
            .and_then(decode);
        match result {
            Ok(record) => decoded.records.push(record),
            Err(e) => {
                log::warn!("{}:{}: skipping record: {}", source, line_num + 1, e);
                decoded.malformed += 1;
            }
        }
    }

    decoded
}
