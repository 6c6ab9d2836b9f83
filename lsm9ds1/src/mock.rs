//! In-memory register bus for tests.
//!
//! [`MockDevice`] is cheap to clone and every clone shares the same bus, so a
//! test can hand one clone to a driver and keep another to script registers
//! and inspect the transaction log.

use crate::bus::Device;
use crate::types::RawAxes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    SetAddress(u8),
    Read { address: u8, reg: u8 },
    Write { address: u8, reg: u8, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    #[error("no device at address {0:#04x}")]
    Nack(u8),
    #[error("no device address selected")]
    NoAddress,
    #[error("read of register {reg:#04x} at {address:#04x} failed")]
    ReadFailed { address: u8, reg: u8 },
    #[error("write of register {reg:#04x} at {address:#04x} failed")]
    WriteFailed { address: u8, reg: u8 },
}

#[derive(Debug, Default)]
struct Bus {
    address: Option<u8>,
    registers: HashMap<(u8, u8), u8>,
    transactions: Vec<Transaction>,
    absent: HashSet<u8>,
    failing_reads: HashSet<(u8, u8)>,
    fail_all_reads: bool,
    failing_writes: HashSet<(u8, u8)>,
}

#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    bus: Arc<Mutex<Bus>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn bus(&self) -> MutexGuard<'_, Bus> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_register(&self, address: u8, reg: u8, value: u8) {
        self.bus().registers.insert((address, reg), value);
    }

    pub fn register(&self, address: u8, reg: u8) -> Option<u8> {
        self.bus().registers.get(&(address, reg)).copied()
    }

    /// Stores three little-endian 16-bit values starting at `first_reg`.
    pub fn set_axes(&self, address: u8, first_reg: u8, axes: RawAxes) {
        let mut bus = self.bus();
        for (i, v) in [axes.x, axes.y, axes.z].into_iter().enumerate() {
            let [lo, hi] = v.to_le_bytes();
            let reg = first_reg + 2 * i as u8;
            bus.registers.insert((address, reg), lo);
            bus.registers.insert((address, reg + 1), hi);
        }
    }

    /// Makes `set_address` fail for `address`.
    pub fn remove_device(&self, address: u8) {
        self.bus().absent.insert(address);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.bus().fail_all_reads = fail;
    }

    pub fn fail_read(&self, address: u8, reg: u8) {
        self.bus().failing_reads.insert((address, reg));
    }

    pub fn fail_write(&self, address: u8, reg: u8) {
        self.bus().failing_writes.insert((address, reg));
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.bus().transactions.clone()
    }

    pub fn clear_transactions(&self) {
        self.bus().transactions.clear();
    }

    /// Number of register reads attempted so far.
    pub fn reads(&self) -> usize {
        self.bus()
            .transactions
            .iter()
            .filter(|t| matches!(t, Transaction::Read { .. }))
            .count()
    }
}

impl Device for MockDevice {
    type Error = MockError;

    fn set_address(&mut self, address: u8) -> Result<(), Self::Error> {
        let mut bus = self.bus();
        bus.transactions.push(Transaction::SetAddress(address));
        if bus.absent.contains(&address) {
            bus.address = None;
            return Err(MockError::Nack(address));
        }
        bus.address = Some(address);
        Ok(())
    }

    fn read_byte_data(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut bus = self.bus();
        let address = bus.address.ok_or(MockError::NoAddress)?;
        bus.transactions.push(Transaction::Read { address, reg });
        if bus.fail_all_reads || bus.failing_reads.contains(&(address, reg)) {
            return Err(MockError::ReadFailed { address, reg });
        }
        Ok(bus.registers.get(&(address, reg)).copied().unwrap_or(0))
    }

    fn write_byte_data(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        let mut bus = self.bus();
        let address = bus.address.ok_or(MockError::NoAddress)?;
        bus.transactions.push(Transaction::Write { address, reg, value });
        if bus.failing_writes.contains(&(address, reg)) {
            return Err(MockError::WriteFailed { address, reg });
        }
        bus.registers.insert((address, reg), value);
        Ok(())
    }
}
