use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::averaged_sensor::AngleOffsets;

#[derive(Parser, Debug)]
#[command(name = "orient_app")]
#[command(about = "LSM9DS1 orientation and compass telemetry")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// I2C bus device
    #[arg(long, default_value = "/dev/i2c-1", global = true)]
    pub device: PathBuf,

    /// Calibration file
    #[arg(long, default_value = "calibration.lsm9ds1", global = true)]
    pub calibration_file: PathBuf,

    /// Magnetic compass offset (degrees)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, global = true)]
    pub mo: f64,

    // ── Averaging ─────────────────────────────────────────────
    /// Accel A offset (degrees)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub ao: f64,

    /// Accel B offset (degrees)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub bo: f64,

    /// Accel C offset (degrees)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub co: f64,

    /// Length of the averaging window
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub window_secs: u64,

    /// Interval between samples
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub sample_interval_ms: u64,

    // ── Output ────────────────────────────────────────────────
    /// Interval between telemetry lines
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub report_interval_secs: u64,

    /// Interval between calibration saves
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub save_interval_secs: u64,

    /// Decimal places of reported angles
    #[arg(long, default_value_t = 2)]
    pub decimals: u32,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Sample continuously and print JSON telemetry (default)
    Run,
    /// Rotate the sensor through all orientations to record magnetometer extrema
    Calibrate {
        /// How long to record
        #[arg(long, default_value_t = 60)]
        duration_secs: u64,
    },
}

impl Args {
    pub fn offsets(&self) -> AngleOffsets {
        AngleOffsets {
            a: self.ao,
            b: self.bo,
            c: self.co,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }
}
