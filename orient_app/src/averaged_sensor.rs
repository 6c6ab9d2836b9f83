//! Sliding-window smoothing of LSM9DS1 acceleration.
//!
//! An [`AveragedSensor`] samples the shared driver on a fixed interval and
//! keeps the last `total / interval` acceleration vectors together with
//! their plane angles. Queries copy out of the window under a lock of its
//! own, so they never wait on bus I/O.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{ensure, Result};
use log::{debug, trace};
use lsm9ds1::{angle, Calibration, Device, Lsm9ds1, PlaneAngles, RawAxes};

use crate::core_filters::{peak_to_peak, positional_median};
use crate::simple_ring_buffer::RingBuffer;

const MIN_TICK: Duration = Duration::from_millis(1);

/// Mounting offsets, in degrees, added to the acceleration plane angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngleOffsets {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

struct Windows {
    accel: RingBuffer<RawAxes>,
    angles: RingBuffer<PlaneAngles>,
}

pub struct AveragedSensor<D> {
    sensor: Arc<Lsm9ds1<D>>,
    interval: Duration,
    offsets: AngleOffsets,
    windows: Mutex<Windows>,
    sampling: AtomicBool,
}

impl<D: Device> AveragedSensor<D> {
    /// Windows cover `total`, one sample per `interval`, and always hold at
    /// least one sample. `interval` must be non-zero.
    pub fn new(
        sensor: Arc<Lsm9ds1<D>>,
        total: Duration,
        interval: Duration,
        offsets: AngleOffsets,
    ) -> Result<Self> {
        ensure!(!interval.is_zero(), "sample interval must be non-zero");
        let samples = total.as_nanos() / interval.as_nanos();
        let capacity = usize::try_from(samples)?;
        debug!("averaging window {:?} / {:?}: {} samples", total, interval, capacity.max(1));
        Ok(Self::with_capacity(sensor, capacity, interval, offsets))
    }

    pub fn with_capacity(
        sensor: Arc<Lsm9ds1<D>>,
        capacity: usize,
        interval: Duration,
        offsets: AngleOffsets,
    ) -> Self {
        Self {
            sensor,
            interval,
            offsets,
            windows: Mutex::new(Windows {
                accel: RingBuffer::new(capacity),
                angles: RingBuffer::new(capacity),
            }),
            sampling: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sensor(&self) -> &Arc<Lsm9ds1<D>> {
        &self.sensor
    }

    pub fn capacity(&self) -> usize {
        self.lock().accel.capacity()
    }

    pub fn len(&self) -> usize {
        self.lock().accel.count()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().accel.is_empty()
    }

    /// One sampling step. Returns `false` when the refresh failed and
    /// nothing was recorded.
    pub fn tick(&self) -> bool {
        if let Err(e) = self.sensor.refresh(self.interval / 2) {
            debug!("skipping sample: {e}");
            return false;
        }
        let accel = self.sensor.acceleration();
        let angles = plane_angles(accel, &self.offsets);
        trace!("sample {:?} {:?}", accel, angles);

        let mut w = self.lock();
        w.accel.push_cyclic(accel);
        w.angles.push_cyclic(angles);
        true
    }

    /// Positional median of the acceleration window.
    pub fn acceleration(&self) -> RawAxes {
        positional_median(&self.lock().accel)
    }

    /// Positional median of the plane angle window.
    pub fn accel_angles(&self) -> PlaneAngles {
        positional_median(&self.lock().angles)
    }

    /// Acceleration and angles of the same window slot.
    pub fn median_sample(&self) -> (RawAxes, PlaneAngles) {
        let w = self.lock();
        (positional_median(&w.accel), positional_median(&w.angles))
    }

    /// Peak-to-peak spread of each plane angle across the window.
    pub fn deviation(&self) -> PlaneAngles {
        peak_to_peak(&self.lock().angles)
    }

    pub fn magnetic_field(&self) -> RawAxes {
        self.sensor.magnetic_field()
    }

    pub fn compass(&self) -> PlaneAngles {
        self.sensor.compass()
    }

    pub fn calibration(&self) -> Calibration {
        self.sensor.calibration()
    }
}

impl<D> AveragedSensor<D>
where
    D: Device + Send + 'static,
{
    /// Starts sampling every interval on a background thread.
    ///
    /// The thread holds only a weak reference and stops once the last
    /// `Arc` is dropped. Ticks it falls behind on are skipped, never run
    /// back to back. Only one sampler may run per window; a second call
    /// fails with `AlreadyExists`.
    pub fn spawn(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        if self.sampling.swap(true, Ordering::AcqRel) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "sampler already running",
            ));
        }
        let weak = Arc::downgrade(self);
        let interval = self.interval.max(MIN_TICK);
        let spawned = thread::Builder::new()
            .name("lsm9ds1-sampler".into())
            .spawn(move || {
                let mut next = Instant::now();
                loop {
                    match weak.upgrade() {
                        Some(sensor) => {
                            sensor.tick();
                        }
                        None => break,
                    }
                    next += interval;
                    let now = Instant::now();
                    while next <= now {
                        next += interval;
                    }
                    thread::sleep(next - now);
                }
                debug!("sampler stopped");
            });
        if spawned.is_err() {
            self.sampling.store(false, Ordering::Release);
        }
        spawned
    }
}

/// `a = yz`, `b = xz`, `c = xy`, each with its offset.
fn plane_angles(accel: RawAxes, offsets: &AngleOffsets) -> PlaneAngles {
    let (x, y, z) = (f64::from(accel.x), f64::from(accel.y), f64::from(accel.z));
    PlaneAngles::new(
        angle(z, y, offsets.a),
        angle(z, x, offsets.b),
        angle(y, x, offsets.c),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use lsm9ds1::mock::MockDevice;
    use lsm9ds1::registers::{AccelReg, Register, ACCEL_ADDRESS};

    fn set_accel(dev: &MockDevice, axes: RawAxes) {
        dev.set_axes(ACCEL_ADDRESS, AccelReg::OutXLXl.addr(), axes);
    }

    fn averaged(dev: &MockDevice, capacity: usize, offsets: AngleOffsets) -> AveragedSensor<MockDevice> {
        let sensor = Arc::new(Lsm9ds1::new(dev.clone(), 0.0, Calibration::default()).unwrap());
        // Zero interval so every tick reads the bus.
        AveragedSensor::with_capacity(sensor, capacity, Duration::ZERO, offsets)
    }

    #[test]
    fn capacity_from_window_and_interval() {
        let dev = MockDevice::new();
        let sensor = Arc::new(Lsm9ds1::new(dev, 0.0, Calibration::default()).unwrap());
        let avg = |total, intv| {
            AveragedSensor::new(Arc::clone(&sensor), total, intv, AngleOffsets::default())
        };
        assert_eq!(avg(Duration::from_secs(60), Duration::from_millis(500)).unwrap().capacity(), 120);
        assert_eq!(avg(Duration::from_millis(100), Duration::from_millis(500)).unwrap().capacity(), 1);
        assert_eq!(avg(Duration::ZERO, Duration::from_secs(1)).unwrap().capacity(), 1);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dev = MockDevice::new();
        let sensor = Arc::new(Lsm9ds1::new(dev, 0.0, Calibration::default()).unwrap());
        let err = AveragedSensor::new(sensor, Duration::from_secs(1), Duration::ZERO, AngleOffsets::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "sample interval must be non-zero");
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let dev = MockDevice::new();
        let avg = averaged(&dev, 7, AngleOffsets::default());
        for _ in 0..1000 {
            avg.tick();
        }
        assert_eq!(avg.len(), 7);
        assert_eq!(avg.capacity(), 7);
    }

    #[test]
    fn empty_window_reports_zero() {
        let dev = MockDevice::new();
        let avg = averaged(&dev, 4, AngleOffsets::default());
        assert!(avg.is_empty());
        assert_eq!(avg.acceleration(), RawAxes::default());
        assert_eq!(avg.accel_angles(), PlaneAngles::default());
        assert_eq!(avg.deviation(), PlaneAngles::default());
    }

    #[test]
    fn tick_records_angles_with_offsets() {
        let dev = MockDevice::new();
        set_accel(&dev, RawAxes::new(1000, 0, 1000));
        let offsets = AngleOffsets { a: 0.0, b: 10.0, c: -5.0 };
        let avg = averaged(&dev, 4, offsets);

        assert!(avg.tick());
        assert_eq!(avg.len(), 1);
        assert_eq!(avg.acceleration(), RawAxes::new(1000, 0, 1000));
        let a = avg.accel_angles();
        assert_abs_diff_eq!(a.a, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.b, 55.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.c, -5.0, epsilon = 1e-9);
    }

    #[test]
    fn failed_refresh_skips_tick() {
        let dev = MockDevice::new();
        let avg = averaged(&dev, 4, AngleOffsets::default());
        assert!(avg.tick());

        dev.fail_reads(true);
        assert!(!avg.tick());
        assert!(!avg.tick());
        assert_eq!(avg.len(), 1);

        dev.fail_reads(false);
        assert!(avg.tick());
        assert_eq!(avg.len(), 2);
    }

    #[test]
    fn window_keeps_latest_samples() {
        let dev = MockDevice::new();
        let avg = averaged(&dev, 3, AngleOffsets::default());
        for x in 1..=5 {
            set_accel(&dev, RawAxes::new(x * 100, 0, 0));
            assert!(avg.tick());
        }
        assert_eq!(avg.len(), 3);
        // window is 300, 400, 500
        assert_eq!(avg.acceleration(), RawAxes::new(400, 0, 0));
        let (accel, angles) = avg.median_sample();
        assert_eq!(accel, RawAxes::new(400, 0, 0));
        assert_eq!(angles, avg.accel_angles());
    }

    #[test]
    fn constant_samples_have_zero_deviation() {
        let dev = MockDevice::new();
        set_accel(&dev, RawAxes::new(-20, 35, 16000));
        let avg = averaged(&dev, 5, AngleOffsets::default());
        for _ in 0..5 {
            avg.tick();
        }
        assert_eq!(avg.deviation(), PlaneAngles::default());

        set_accel(&dev, RawAxes::new(0, 16000, 0));
        avg.tick();
        let d = avg.deviation();
        assert!(d.a > 0.0 && d.c > 0.0);
    }

    #[test]
    fn forwards_driver_queries() {
        let dev = MockDevice::new();
        dev.set_axes(lsm9ds1::registers::MAG_ADDRESS, 0x28, RawAxes::new(10, 20, 30));
        let avg = averaged(&dev, 2, AngleOffsets::default());
        avg.tick();
        assert_eq!(avg.magnetic_field(), RawAxes::new(10, 20, 30));
        assert_eq!(avg.calibration(), avg.sensor().calibration());
        assert_eq!(avg.compass(), avg.sensor().compass());
    }

    #[test]
    fn sampler_runs_until_dropped() {
        let dev = MockDevice::new();
        let sensor = Arc::new(Lsm9ds1::new(dev.clone(), 0.0, Calibration::default()).unwrap());
        let avg = Arc::new(
            AveragedSensor::new(
                sensor,
                Duration::from_secs(1),
                Duration::from_millis(10),
                AngleOffsets::default(),
            )
            .unwrap(),
        );
        let handle = avg.spawn().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while avg.len() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(avg.len() >= 3);

        drop(avg);
        handle.join().unwrap();
    }

    #[test]
    fn second_sampler_is_refused() {
        let dev = MockDevice::new();
        let sensor = Arc::new(Lsm9ds1::new(dev, 0.0, Calibration::default()).unwrap());
        let interval = Duration::from_millis(50);
        let avg = Arc::new(
            AveragedSensor::new(sensor, Duration::from_secs(10), interval, AngleOffsets::default()).unwrap(),
        );

        let start = Instant::now();
        let handle = avg.spawn().unwrap();
        let err = avg.spawn().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        thread::sleep(Duration::from_millis(300));
        let elapsed = start.elapsed();
        // A single fixed-rate sampler ticks at most once per started interval.
        let bound = (elapsed.as_millis() / interval.as_millis()) as usize + 1;
        let len = avg.len();
        assert!(len >= 1 && len <= bound, "{len} samples in {elapsed:?}");

        drop(avg);
        handle.join().unwrap();
    }
}
