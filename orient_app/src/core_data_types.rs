use chrono::{DateTime, Utc};
use lsm9ds1::{Device, PlaneAngles, RawAxes};
use serde::Serialize;

use crate::averaged_sensor::AveragedSensor;

/// One telemetry line.
#[derive(Debug, Clone, Serialize)]
pub struct Telemetry {
    pub timestamp: DateTime<Utc>,
    /// Median acceleration (raw counts).
    pub acceleration: RawAxes,
    /// Median acceleration plane angles.
    pub accel_angles: PlaneAngles,
    pub deviation: PlaneAngles,
    pub compass: PlaneAngles,
    pub level_compass: f64,
    pub magnetic_field: RawAxes,
    pub samples: usize,
}

impl Telemetry {
    pub fn capture<D: Device>(
        sensor: &AveragedSensor<D>,
        timestamp: DateTime<Utc>,
        decimals: u32,
    ) -> Self {
        let (acceleration, accel_angles) = sensor.median_sample();
        let compass = sensor.compass();
        Self {
            timestamp,
            acceleration,
            accel_angles: round_angles(accel_angles, decimals),
            deviation: round_angles(sensor.deviation(), decimals),
            compass: round_angles(compass, decimals),
            level_compass: round(level_compass(acceleration, compass), decimals),
            magnetic_field: sensor.magnetic_field(),
            samples: sensor.len(),
        }
    }
}

pub fn round(v: f64, decimals: u32) -> f64 {
    let pow = 10f64.powi(decimals.min(15) as i32);
    (v * pow).round() / pow
}

pub fn round_angles(p: PlaneAngles, decimals: u32) -> PlaneAngles {
    PlaneAngles::new(round(p.a, decimals), round(p.b, decimals), round(p.c, decimals))
}

/// Heading in the compass plane perpendicular to gravity, taken as the axis
/// with the largest absolute acceleration. Zero when two axes tie.
pub fn level_compass(accel: RawAxes, compass: PlaneAngles) -> f64 {
    let (x, y, z) = (
        i32::from(accel.x).abs(),
        i32::from(accel.y).abs(),
        i32::from(accel.z).abs(),
    );
    if z > x && z > y {
        compass.a
    } else if y > x && y > z {
        compass.b
    } else if x > y && x > z {
        compass.c
    } else {
        0.0
    }
}
