//! Telemetry record types.
//!
//! A [`Record`] is the unit of storage: location, device and vehicle state
//! captured at one instant. The store only ever looks at
//! [`Location::timestamp_ms`]; every other field is carried through untouched.

use serde::{Deserialize, Serialize};

/// Location fix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Epoch milliseconds. The record's time key.
    pub timestamp_ms: i64,
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
    /// Receiver's estimated horizontal error radius in meters.
    pub accuracy_m: f64,
    pub valid: bool,
    /// Raw [`FixType`] code.
    pub fix_type: i32,
}

/// Device state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Raw [`PowerStage`] code.
    pub power_stage: i32,
}

/// Vehicle state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub speed_kmh: f64,
    pub acceleration_ms2: f64,
    pub fuel_level_pct: f64,
    pub cargo_weight_kg: f64,
}

/// One stored telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub location: Location,
    pub device: DeviceStatus,
    pub vehicle: VehicleStatus,
}

impl Record {
    /// The record's time key.
    #[inline]
    pub fn timestamp_ms(&self) -> i64 {
        self.location.timestamp_ms
    }

    /// Decoded fix type, or `None` for a code outside the known table.
    pub fn fix_type(&self) -> Option<FixType> {
        FixType::from_code(self.location.fix_type)
    }

    /// Decoded power stage, or `None` for a code outside the known table.
    pub fn power_stage(&self) -> Option<PowerStage> {
        PowerStage::from_code(self.device.power_stage)
    }
}

/// GPS fix type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FixType {
    NoFix = 0,
    DeadReckoning = 1,
    Fix2D = 2,
    Fix3D = 3,
    GpsDeadReckoning = 4,
    TimeOnly = 5,
}

impl FixType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::NoFix),
            1 => Some(Self::DeadReckoning),
            2 => Some(Self::Fix2D),
            3 => Some(Self::Fix3D),
            4 => Some(Self::GpsDeadReckoning),
            5 => Some(Self::TimeOnly),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Device power stage codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PowerStage {
    PowerOff = 0,
    PowerOn = 1,
    PowerActive = 2,
    PowerStandby = 3,
    PowerSleep = 4,
    PowerCritical = 5,
}

impl PowerStage {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::PowerOff),
            1 => Some(Self::PowerOn),
            2 => Some(Self::PowerActive),
            3 => Some(Self::PowerStandby),
            4 => Some(Self::PowerSleep),
            5 => Some(Self::PowerCritical),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_type_codes() {
        for code in 0..=5 {
            let fix = FixType::from_code(code).unwrap();
            assert_eq!(fix.code(), code);
        }
        assert_eq!(FixType::from_code(6), None);
        assert_eq!(FixType::from_code(-1), None);
    }

    #[test]
    fn test_power_stage_codes() {
        assert_eq!(PowerStage::from_code(2), Some(PowerStage::PowerActive));
        assert_eq!(PowerStage::PowerCritical.code(), 5);
        assert_eq!(PowerStage::from_code(42), None);
    }

    #[test]
    fn test_unknown_codes_are_kept_raw() {
        let mut record = Record::default();
        record.location.fix_type = 9;
        assert_eq!(record.fix_type(), None);
        assert_eq!(record.location.fix_type, 9);
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = Record::default();
        record.location.timestamp_ms = 1_730_000_000_000;
        record.vehicle.speed_kmh = 12.5;
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["location"]["timestamp_ms"], 1_730_000_000_000_i64);
        assert_eq!(json["vehicle"]["speed_kmh"], 12.5);
        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
