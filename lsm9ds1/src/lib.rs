//! Driver for the accelerometer and magnetometer of the ST LSM9DS1 iNEMO
//! inertial module.
//!
//! [`Lsm9ds1`] owns the bus, caches the latest raw vectors and keeps a
//! running min/max [`Calibration`] of the magnetometer that recenters the
//! field before compass headings are computed. All state sits behind one
//! lock, so a driver can be shared between a sampling thread and any number
//! of readers.

pub mod angles;
pub mod bus;
pub mod calibration;
pub mod configs;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod reader;
pub mod registers;
pub mod types;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, warn};

pub use angles::{angle, compass};
pub use bus::{AddressedI2c, BusError, Device};
pub use calibration::Calibration;
pub use configs::*;
pub use reader::Reader;
pub use types::*;

use registers::*;

const ACCEL_OUT: [[u8; 2]; 3] = [
    [AccelReg::OutXHXl as u8, AccelReg::OutXLXl as u8],
    [AccelReg::OutYHXl as u8, AccelReg::OutYLXl as u8],
    [AccelReg::OutZHXl as u8, AccelReg::OutZLXl as u8],
];

const MAG_OUT: [[u8; 2]; 3] = [
    [MagReg::OutXHM as u8, MagReg::OutXLM as u8],
    [MagReg::OutYHM as u8, MagReg::OutYLM as u8],
    [MagReg::OutZHM as u8, MagReg::OutZLM as u8],
];

#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    #[error("set device address {address:#04x}: {cause:?}")]
    SetAddress { address: u8, cause: E },
    #[error("write control register {register:#04x}: {cause:?}")]
    WriteControl { register: u8, cause: E },
    #[error("read data: {0:?}")]
    ReadData(E),
}

struct State<D> {
    device: D,
    cal: Calibration,
    cached: Option<Instant>,
    sample: RawSample,
}

pub struct Lsm9ds1<D> {
    state: Mutex<State<D>>,
    magnetic_offset: f64,
}

impl<D: Device> Lsm9ds1<D> {
    /// Configures both dies and starts tracking calibration from
    /// `calibration` (use `Calibration::default()` to start fresh).
    ///
    /// Failing to address either die or to configure the accelerometer is
    /// fatal. A failed magnetometer control write is logged and skipped.
    pub fn new(
        mut device: D,
        magnetic_offset: f64,
        calibration: Calibration,
    ) -> Result<Self, Error<D::Error>> {
        select(&mut device, ACCEL_ADDRESS)?;
        for entry in CONFIG_ACCEL_INIT {
            let addr = entry.reg.addr();
            debug!("write_reg {:<21}({:#04X}) = {:#04x}", entry.reg.name(), addr, entry.value);
            device
                .write_byte_data(addr, entry.value)
                .map_err(|cause| Error::WriteControl { register: addr, cause })?;
        }

        select(&mut device, MAG_ADDRESS)?;
        for entry in CONFIG_MAG_INIT {
            let addr = entry.reg.addr();
            debug!("write_reg {:<21}({:#04X}) = {:#04x}", entry.reg.name(), addr, entry.value);
            if let Err(e) = device.write_byte_data(addr, entry.value) {
                warn!(
                    "write control register {}({:#04x}) = {:#04x}: {:?}",
                    entry.reg.name(),
                    addr,
                    entry.value,
                    e
                );
            }
        }

        Ok(Self {
            state: Mutex::new(State {
                device,
                cal: calibration,
                cached: None,
                sample: RawSample::default(),
            }),
            magnetic_offset,
        })
    }

    fn lock(&self) -> MutexGuard<'_, State<D>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads fresh acceleration and magnetic vectors unless the cached ones
    /// are younger than `max_age`.
    ///
    /// On error the cached vectors and calibration are left as they were.
    pub fn refresh(&self, max_age: Duration) -> Result<(), Error<D::Error>> {
        let mut guard = self.lock();
        if guard.cached.is_some_and(|t| t.elapsed() < max_age) {
            return Ok(());
        }
        let state = &mut *guard;

        select(&mut state.device, ACCEL_ADDRESS)?;
        let accel = read_axes(&mut state.device, ACCEL_OUT).map_err(Error::ReadData)?;

        select(&mut state.device, MAG_ADDRESS)?;
        let magnetic = read_axes(&mut state.device, MAG_OUT).map_err(Error::ReadData)?;

        state.cal.observe(magnetic);
        state.cached = Some(Instant::now());
        state.sample = RawSample { accel, magnetic };
        Ok(())
    }

    pub fn sample(&self) -> RawSample {
        self.lock().sample
    }

    pub fn acceleration(&self) -> RawAxes {
        self.lock().sample.accel
    }

    pub fn magnetic_field(&self) -> RawAxes {
        self.lock().sample.magnetic
    }

    pub fn calibration(&self) -> Calibration {
        self.lock().cal
    }

    pub fn magnetic_offset(&self) -> f64 {
        self.magnetic_offset
    }

    /// Compass headings of the recentered magnetic field in the xy (`a`),
    /// xz (`b`) and yz (`c`) planes, with the magnetic offset applied.
    pub fn compass(&self) -> PlaneAngles {
        let [x, y, z] = {
            let state = self.lock();
            state.cal.recenter(state.sample.magnetic)
        };
        let o = self.magnetic_offset;
        PlaneAngles::new(compass(y, x, o), compass(z, x, o), compass(z, y, o))
    }

    /// Signed angles of the cached acceleration in the xy (`a`), xz (`b`)
    /// and yz (`c`) planes.
    pub fn acceleration_angles(&self) -> PlaneAngles {
        let RawAxes { x, y, z } = self.acceleration();
        let (x, y, z) = (f64::from(x), f64::from(y), f64::from(z));
        PlaneAngles::new(angle(y, x, 0.0), angle(z, x, 0.0), angle(z, y, 0.0))
    }

    /// WHO_AM_I of the accelerometer and magnetometer dies.
    pub fn who_am_i(&self) -> Result<(u8, u8), Error<D::Error>> {
        let mut guard = self.lock();
        let device = &mut guard.device;

        select(device, ACCEL_ADDRESS)?;
        let mut r = Reader::new(&mut *device);
        let accel = r.byte(AccelReg::WhoAmI.addr());
        r.finish().map_err(Error::ReadData)?;

        select(device, MAG_ADDRESS)?;
        let mut r = Reader::new(&mut *device);
        let mag = r.byte(MagReg::WhoAmI.addr());
        r.finish().map_err(Error::ReadData)?;

        Ok((accel, mag))
    }
}

fn select<D: Device>(device: &mut D, address: u8) -> Result<(), Error<D::Error>> {
    device
        .set_address(address)
        .map_err(|cause| Error::SetAddress { address, cause })
}

fn read_axes<D: Device>(device: &mut D, regs: [[u8; 2]; 3]) -> Result<RawAxes, D::Error> {
    let mut r = Reader::new(device);
    let [x, y, z] = regs.map(|pair| r.signed(pair) as i16);
    r.finish()?;
    Ok(RawAxes::new(x, y, z))
}
