use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use lsm9ds1::{Calibration, Device, Lsm9ds1};

/// Maximum sample age while calibrating.
pub const CALIBRATE_MAX_AGE: Duration = Duration::from_millis(50);
/// Pause between calibration samples.
pub const CALIBRATE_PAUSE: Duration = Duration::from_millis(150);
/// Minimum spacing of calibration saves while calibrating.
pub const CALIBRATE_SAVE_SPACING: Duration = Duration::from_secs(1);

/// Reads a calibration file, falling back to the zero calibration when the
/// file is missing or unreadable.
pub fn load(path: &Path) -> Calibration {
    if !path.exists() {
        info!("no calibration at {}, starting from zero", path.display());
        return Calibration::default();
    }
    match read(path) {
        Ok(cal) => {
            info!("loaded calibration from {}: {:?}", path.display(), cal);
            cal
        }
        Err(e) => {
            warn!("{e:#}; starting from zero calibration");
            Calibration::default()
        }
    }
}

fn read(path: &Path) -> Result<Calibration> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read calibration {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse calibration {}", path.display()))
}

pub fn save(path: &Path, cal: &Calibration) -> Result<()> {
    let mut text = serde_json::to_string_pretty(cal).context("encode calibration")?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("write calibration {}", path.display()))
}

/// Persists the calibration only when it differs from what was last written.
pub struct CalibrationSaver {
    path: PathBuf,
    last: Calibration,
}

impl CalibrationSaver {
    /// `last` is what the file currently holds.
    pub fn new(path: impl Into<PathBuf>, last: Calibration) -> Self {
        Self {
            path: path.into(),
            last,
        }
    }

    /// Returns whether `current` was written.
    pub fn poll(&mut self, current: Calibration) -> Result<bool> {
        if current == self.last {
            return Ok(false);
        }
        save(&self.path, &current)?;
        debug!("saved calibration to {}", self.path.display());
        self.last = current;
        Ok(true)
    }
}

/// Samples quickly for `duration` while the sensor is turned in every
/// direction, writing one CSV row per sample to `out`.
///
/// The calibration is saved at most once per second while it changes, and
/// once more at the end.
pub fn calibrate<D: Device, W: Write>(
    sensor: &Lsm9ds1<D>,
    saver: &mut CalibrationSaver,
    duration: Duration,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "mx,my,mz,xy,xz,yz,min_x,min_y,min_z,max_x,max_y,max_z")?;

    let start = Instant::now();
    let mut last_save = start;
    while start.elapsed() < duration {
        match sensor.refresh(CALIBRATE_MAX_AGE) {
            Ok(()) => {
                let m = sensor.magnetic_field();
                let c = sensor.compass();
                let cal = sensor.calibration();
                writeln!(
                    out,
                    "{},{},{},{:.1},{:.1},{:.1},{},{},{},{},{},{}",
                    m.x, m.y, m.z, c.a, c.b, c.c,
                    cal.min.x, cal.min.y, cal.min.z, cal.max.x, cal.max.y, cal.max.z
                )?;
                if last_save.elapsed() >= CALIBRATE_SAVE_SPACING && saver.poll(cal)? {
                    last_save = Instant::now();
                }
            }
            Err(e) => warn!("calibration sample: {e}"),
        }
        thread::sleep(CALIBRATE_PAUSE);
    }

    saver.poll(sensor.calibration())?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsm9ds1::mock::MockDevice;
    use lsm9ds1::registers::MAG_ADDRESS;
    use lsm9ds1::RawAxes;

    fn cal(min: [i16; 3], max: [i16; 3]) -> Calibration {
        Calibration {
            min: RawAxes::from(min),
            max: RawAxes::from(max),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.lsm9ds1");
        let c = cal([-512, -300, 7], [700, i16::MAX, 900]);
        save(&path, &c).unwrap();
        assert_eq!(load(&path), c);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"min\""));
        assert!(text.contains("\"x\": -512"));
    }

    #[test]
    fn missing_or_invalid_file_loads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        assert_eq!(load(&path), Calibration::default());

        fs::write(&path, b"\x00\x01 not json").unwrap();
        assert_eq!(load(&path), Calibration::default());

        fs::write(&path, r#"{"min": {"x": 1, "y": 2}}"#).unwrap();
        assert_eq!(load(&path), Calibration::default());
    }

    #[test]
    fn saver_writes_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cal.json");
        let mut saver = CalibrationSaver::new(&path, Calibration::default());

        assert!(!saver.poll(Calibration::default()).unwrap());
        assert!(!path.exists());

        let c = cal([-1, -2, -3], [4, 5, 6]);
        assert!(saver.poll(c).unwrap());
        assert_eq!(load(&path), c);

        fs::remove_file(&path).unwrap();
        assert!(!saver.poll(c).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn saver_reports_write_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut saver = CalibrationSaver::new(dir.path().join("no/such/dir/cal"), Calibration::default());
        let err = saver.poll(cal([1, 1, 1], [2, 2, 2])).unwrap_err();
        assert!(format!("{err:#}").starts_with("write calibration"));
    }

    #[test]
    fn calibrate_records_and_saves() {
        let dev = MockDevice::new();
        dev.set_axes(MAG_ADDRESS, 0x28, RawAxes::new(-300, 120, 45));
        let sensor = Lsm9ds1::new(dev, 0.0, Calibration::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cal.json");
        let mut saver = CalibrationSaver::new(&path, Calibration::default());
        let mut out = Vec::new();
        calibrate(&sensor, &mut saver, Duration::from_millis(200), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("mx,my,mz,xy,xz,yz,min_x,min_y,min_z,max_x,max_y,max_z"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("-300,120,45,"));
        assert!(row.ends_with(",-300,120,45,-300,120,45"));

        assert_eq!(load(&path), cal([-300, 120, 45], [-300, 120, 45]));
    }
}
