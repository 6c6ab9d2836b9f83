//! LSM9DS1 orientation and compass telemetry.
//!
//! `run` keeps a sliding window of accelerometer samples and prints one JSON
//! telemetry line per report interval, saving the magnetometer calibration
//! whenever it changes. `calibrate` records magnetometer extrema for a while
//! and saves them.

mod averaged_sensor;
mod cli;
mod core_calibrate;
mod core_data_types;
mod core_filters;
mod simple_ring_buffer;

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use linux_embedded_hal::I2cdev;
use log::{info, warn};
use lsm9ds1::registers::{ACCEL_WHO_AM_I_VALUE, MAG_WHO_AM_I_VALUE};
use lsm9ds1::{AddressedI2c, Calibration, Device, Lsm9ds1};
use tracing_subscriber::EnvFilter;

use crate::averaged_sensor::AveragedSensor;
use crate::cli::{Args, Command};
use crate::core_calibrate::CalibrationSaver;
use crate::core_data_types::Telemetry;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let i2c = I2cdev::new(&args.device)
        .with_context(|| format!("open I2C device {}", args.device.display()))?;
    let bus = AddressedI2c::new(i2c);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&args, bus),
        Command::Calibrate { duration_secs } => {
            let sensor = Lsm9ds1::new(bus, args.mo, Calibration::default()).context("init LSM9DS1")?;
            log_identity(&sensor);
            let mut saver = CalibrationSaver::new(&args.calibration_file, Calibration::default());
            info!("calibrating for {}s, rotate the sensor in every direction", duration_secs);
            core_calibrate::calibrate(
                &sensor,
                &mut saver,
                Duration::from_secs(duration_secs),
                &mut io::stdout().lock(),
            )?;
            info!("calibration: {:?}", sensor.calibration());
            Ok(())
        }
    }
}

fn run<D>(args: &Args, bus: D) -> Result<()>
where
    D: Device + Send + 'static,
    D::Error: Send + Sync + 'static,
{
    let cal = core_calibrate::load(&args.calibration_file);
    let sensor = Arc::new(Lsm9ds1::new(bus, args.mo, cal).context("init LSM9DS1")?);
    log_identity(&sensor);

    let averaged = Arc::new(
        AveragedSensor::new(
            Arc::clone(&sensor),
            args.window(),
            args.sample_interval(),
            args.offsets(),
        )
        .context("configure averaging window")?,
    );
    averaged.spawn().context("start sampler thread")?;

    let mut saver = CalibrationSaver::new(&args.calibration_file, cal);
    let report = args.report_interval();
    let save = args.save_interval();
    let start = Instant::now();
    let mut next_report = start + report;
    let mut next_save = start + save;

    let stdout = io::stdout();
    loop {
        let now = Instant::now();
        if now >= next_report {
            let t = Telemetry::capture(&averaged, chrono::Utc::now(), args.decimals);
            let mut out = stdout.lock();
            serde_json::to_writer(&mut out, &t).context("encode telemetry")?;
            writeln!(out).context("write telemetry")?;
            out.flush().context("write telemetry")?;
            next_report = advance(next_report, report, now);
        }
        if now >= next_save {
            if let Err(e) = saver.poll(sensor.calibration()) {
                warn!("{e:#}");
            }
            next_save = advance(next_save, save, now);
        }
        thread::sleep(next_report.min(next_save).saturating_duration_since(Instant::now()));
    }
}

fn log_identity<D: Device>(sensor: &Lsm9ds1<D>) {
    match sensor.who_am_i() {
        Ok((ACCEL_WHO_AM_I_VALUE, MAG_WHO_AM_I_VALUE)) => info!("LSM9DS1 detected"),
        Ok((accel, mag)) => warn!("unexpected WHO_AM_I: accel {:#04x}, mag {:#04x}", accel, mag),
        Err(e) => warn!("read WHO_AM_I: {e}"),
    }
}

/// Next deadline after `now` on the `deadline + k * period` grid.
fn advance(mut deadline: Instant, period: Duration, now: Instant) -> Instant {
    while deadline <= now {
        deadline += period;
    }
    deadline
}
