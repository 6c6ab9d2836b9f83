/// Raw three-axis register values, as decoded from the output registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawAxes {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawAxes {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

impl From<[i16; 3]> for RawAxes {
    fn from([x, y, z]: [i16; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Most recent decoded acceleration and magnetic-field vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub accel: RawAxes,
    pub magnetic: RawAxes,
}

/// Angles in degrees in three planes.
///
/// Which plane each field describes depends on the producer; see
/// [`crate::Lsm9ds1::compass`] and [`crate::Lsm9ds1::acceleration_angles`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlaneAngles {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl PlaneAngles {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }
}
