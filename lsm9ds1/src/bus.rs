//! Register-addressed bus access.
//!
//! The driver talks to the sensor through [`Device`]: select a device
//! address, then read or write single registers on it. Address selection is
//! stateful and shared by every device on the bus, so callers must hold the
//! bus exclusively between selecting an address and the register accesses
//! that follow.

use core::fmt::Debug;
use embedded_hal::i2c::{I2c, SevenBitAddress};

/// Byte-wide register bus with a stateful current address.
pub trait Device {
    type Error: Debug;

    fn set_address(&mut self, address: u8) -> Result<(), Self::Error>;
    fn read_byte_data(&mut self, reg: u8) -> Result<u8, Self::Error>;
    fn write_byte_data(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;
}

impl<D: Device + ?Sized> Device for &mut D {
    type Error = D::Error;

    fn set_address(&mut self, address: u8) -> Result<(), Self::Error> {
        (**self).set_address(address)
    }

    fn read_byte_data(&mut self, reg: u8) -> Result<u8, Self::Error> {
        (**self).read_byte_data(reg)
    }

    fn write_byte_data(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        (**self).write_byte_data(reg, value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError<E> {
    #[error("i2c transfer: {0:?}")]
    I2c(E),
    #[error("invalid 7-bit address {0:#04x}")]
    InvalidAddress(u8),
    #[error("no device address selected")]
    NoAddress,
}

/// [`Device`] on top of an embedded-hal I2C bus.
///
/// The selected address is remembered and used for every following
/// register access, one `write_read` per register read and one two-byte
/// `write` per register write.
pub struct AddressedI2c<I2C> {
    i2c: I2C,
    address: Option<u8>,
}

impl<I2C> AddressedI2c<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, address: None }
    }

    pub fn address(&self) -> Option<u8> {
        self.address
    }

    pub fn destroy(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c<SevenBitAddress>> Device for AddressedI2c<I2C> {
    type Error = BusError<I2C::Error>;

    fn set_address(&mut self, address: u8) -> Result<(), Self::Error> {
        if address > 0x7F {
            return Err(BusError::InvalidAddress(address));
        }
        self.address = Some(address);
        Ok(())
    }

    fn read_byte_data(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let address = self.address.ok_or(BusError::NoAddress)?;
        let mut buf = [0u8];
        self.i2c
            .write_read(address, &[reg], &mut buf)
            .map_err(BusError::I2c)?;
        Ok(buf[0])
    }

    fn write_byte_data(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        let address = self.address.ok_or(BusError::NoAddress)?;
        self.i2c
            .write(address, &[reg, value])
            .map_err(BusError::I2c)
    }
}
