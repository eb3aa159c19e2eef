use std::sync::RwLock;

use super::observer::{ChangeEvent, Observable, Observers};
use super::{read_lock, write_lock};
use crate::fault::{MemorySpace, SimError};

/// Default EEPROM size in bytes.
pub const DEFAULT_EEPROM_BYTES: usize = 64;

/// Flat byte array with its own address space. Contents live only in memory.
#[derive(Debug)]
pub struct Eeprom {
    cells: RwLock<Vec<u8>>,
    observers: Observers<usize, u8>,
}

impl Default for Eeprom {
    fn default() -> Self {
        Self::new(DEFAULT_EEPROM_BYTES)
    }
}

impl Eeprom {
    /// Creates zeroed EEPROM of `bytes` cells.
    #[must_use]
    pub fn new(bytes: usize) -> Self {
        Self {
            cells: RwLock::new(vec![0; bytes]),
            observers: Observers::default(),
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.cells).len()
    }

    /// `true` for a zero-sized EEPROM.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a byte.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] past the end.
    pub fn get(&self, address: usize) -> Result<u8, SimError> {
        read_lock(&self.cells)
            .get(address)
            .copied()
            .ok_or(SimError::out_of_bounds(MemorySpace::Eeprom, address))
    }

    /// Writes a byte.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] past the end.
    pub fn set(&self, address: usize, value: u8) -> Result<(), SimError> {
        let old = {
            let mut cells = write_lock(&self.cells);
            let cell = cells
                .get_mut(address)
                .ok_or(SimError::out_of_bounds(MemorySpace::Eeprom, address))?;
            std::mem::replace(cell, value)
        };
        self.observers.notify(ChangeEvent::new(address, old, value));
        Ok(())
    }

    /// Independent copy of the contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        read_lock(&self.cells).clone()
    }
}

impl Observable for Eeprom {
    type Location = usize;
    type Value = u8;

    fn observers(&self) -> &Observers<usize, u8> {
        &self.observers
    }
}

#[cfg(test)]
mod tests {
    use super::{Eeprom, DEFAULT_EEPROM_BYTES};
    use crate::fault::{MemorySpace, SimError};

    #[test]
    fn default_size_and_bounds() {
        let eeprom = Eeprom::default();
        assert_eq!(eeprom.len(), DEFAULT_EEPROM_BYTES);
        eeprom.set(63, 0xA5).unwrap();
        assert_eq!(eeprom.get(63), Ok(0xA5));
        assert_eq!(
            eeprom.set(64, 1),
            Err(SimError::AddressOutOfBounds {
                space: MemorySpace::Eeprom,
                address: 64
            })
        );
    }

    #[test]
    fn snapshot_does_not_alias_storage() {
        let eeprom = Eeprom::new(4);
        let before = eeprom.snapshot();
        eeprom.set(0, 9).unwrap();
        assert_eq!(before, vec![0; 4]);
        assert_eq!(eeprom.snapshot()[0], 9);
    }
}
