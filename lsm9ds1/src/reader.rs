//! Multi-register reads with a sticky error.
//!
//! A [`Reader`] lets a driver issue a batch of register reads and check the
//! outcome once at the end. The first failure is remembered; every later
//! [`Reader::signed`] or [`Reader::byte`] call returns `0` without touching
//! the bus until [`Reader::reset`] is called.

use crate::bus::Device;

pub struct Reader<D: Device> {
    dev: D,
    error: Option<D::Error>,
}

impl<D: Device> Reader<D> {
    pub fn new(dev: D) -> Self {
        Self { dev, error: None }
    }

    pub fn error(&self) -> Option<&D::Error> {
        self.error.as_ref()
    }

    pub fn reset(&mut self) {
        self.error = None;
    }

    /// Consumes the reader, returning the first error it ran into.
    pub fn finish(self) -> Result<(), D::Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Reads each register in `regs`, last to first.
    ///
    /// Callers list registers most significant byte first, so the final bus
    /// access is for the highest-order byte.
    pub fn read<const N: usize>(&mut self, regs: [u8; N]) -> Result<[u8; N], D::Error> {
        let mut res = [0u8; N];
        for (slot, &reg) in res.iter_mut().zip(regs.iter()).rev() {
            *slot = self.dev.read_byte_data(reg)?;
        }
        Ok(res)
    }

    /// Two's-complement value of up to four registers, high byte first.
    pub fn signed<const N: usize>(&mut self, regs: [u8; N]) -> i32 {
        if self.error.is_some() {
            return 0;
        }
        match self.read(regs) {
            Ok(data) => decode_signed(&data),
            Err(err) => {
                self.error = Some(err);
                0
            }
        }
    }

    pub fn byte(&mut self, reg: u8) -> u8 {
        if self.error.is_some() {
            return 0;
        }
        match self.dev.read_byte_data(reg) {
            Ok(val) => val,
            Err(err) => {
                self.error = Some(err);
                0
            }
        }
    }
}

/// Assembles big-endian bytes into a signed integer, sign-extending the
/// first byte.
pub fn decode_signed(data: &[u8]) -> i32 {
    let Some((&first, rest)) = data.split_first() else {
        return 0;
    };
    rest.iter()
        .fold(i32::from(first as i8), |acc, &b| (acc << 8) | i32::from(b))
}
