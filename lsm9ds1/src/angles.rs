//! Plane angles and compass headings in degrees.
//!
//! Both functions take the two components of a vector in the order the
//! two-argument arctangent expects (`y` first) plus a fixed offset that
//! compensates for mounting misalignment.

use core::f64::consts::PI;

/// Heading of `(x, y)` plus `offset`, in `[0, 360)`.
pub fn compass(y: f64, x: f64, offset: f64) -> f64 {
    let v = (y.atan2(x) / PI * 180.0 + offset).rem_euclid(360.0);
    // rem_euclid rounds tiny negative values up to exactly 360.
    if v >= 360.0 {
        v - 360.0
    } else {
        v
    }
}

/// Angle of `(x, y)` plus `offset`, in `(-180, 180]`.
pub fn angle(y: f64, x: f64, offset: f64) -> f64 {
    let v = compass(y, x, offset);
    if v > 180.0 {
        v - 360.0
    } else {
        v
    }
}
