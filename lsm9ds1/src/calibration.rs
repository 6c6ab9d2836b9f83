//! Running min/max calibration of the magnetometer.
//!
//! The window only ever widens. Rotating the sensor through all
//! orientations makes the midpoint of each axis converge on the hard-iron
//! bias; any snapshot is usable straight away.

use crate::types::RawAxes;

/// Per-axis extrema of the observed magnetic field.
///
/// A bound of `0` counts as "not yet observed", so the first non-zero
/// reading on an axis always replaces it. A genuine reading of exactly `0`
/// can therefore reset a bound to "unset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Calibration {
    pub min: RawAxes,
    pub max: RawAxes,
}

impl Calibration {
    /// Widens the window to include `sample`.
    pub fn observe(&mut self, sample: RawAxes) {
        widen(&mut self.min.x, &mut self.max.x, sample.x);
        widen(&mut self.min.y, &mut self.max.y, sample.y);
        widen(&mut self.min.z, &mut self.max.z, sample.z);
    }

    /// Midpoint of the observed window on each axis.
    pub fn bias(&self) -> [i32; 3] {
        [
            midpoint(self.min.x, self.max.x),
            midpoint(self.min.y, self.max.y),
            midpoint(self.min.z, self.max.z),
        ]
    }

    /// `sample` with the bias subtracted on each axis.
    pub fn recenter(&self, sample: RawAxes) -> [f64; 3] {
        let [bx, by, bz] = self.bias();
        [
            f64::from(i32::from(sample.x) - bx),
            f64::from(i32::from(sample.y) - by),
            f64::from(i32::from(sample.z) - bz),
        ]
    }
}

fn widen(min: &mut i16, max: &mut i16, v: i16) {
    if *max == 0 || v > *max {
        *max = v;
    }
    if *min == 0 || v < *min {
        *min = v;
    }
}

// Truncates toward zero like the integer division of the raw values would.
fn midpoint(min: i16, max: i16) -> i32 {
    (i32::from(max) + i32::from(min)) / 2
}
