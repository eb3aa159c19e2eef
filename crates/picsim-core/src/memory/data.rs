use std::sync::RwLock;

use super::observer::{ChangeEvent, Observable, Observers};
use super::sfr::{is_mapped_address, Sfr};
use super::{read_lock, write_lock};
use crate::fault::{MemorySpace, SimError};

/// Bytes per bank.
pub const BANK_SIZE: usize = 128;
/// Number of banks.
pub const BANK_COUNT: usize = 2;
/// First general-purpose register address; GPRs are mirrored across banks.
pub const GPR_START: u8 = 0x0C;

/// One of the two 128-byte views of data memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Bank {
    /// Bank 0 (`RP0 = 0`).
    Bank0,
    /// Bank 1 (`RP0 = 1`).
    Bank1,
}

impl Bank {
    /// Selects a bank from a select bit (`RP0` or `IRP`).
    #[must_use]
    pub const fn from_select_bit(bit: bool) -> Self {
        if bit {
            Self::Bank1
        } else {
            Self::Bank0
        }
    }

    /// Storage index of the bank.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Bank0 => 0,
            Self::Bank1 => 1,
        }
    }

    /// The other bank.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Bank0 => Self::Bank1,
            Self::Bank1 => Self::Bank0,
        }
    }
}

/// Bank-qualified data memory cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataLocation {
    /// Bank of the physical cell.
    pub bank: Bank,
    /// Address within the bank (`0..128`).
    pub address: u8,
}

impl DataLocation {
    /// Builds a location.
    #[must_use]
    pub const fn new(bank: Bank, address: u8) -> Self {
        Self { bank, address }
    }

    /// Location of an SFR through its static bank.
    #[must_use]
    pub const fn of_sfr(sfr: Sfr) -> Self {
        Self::new(sfr.bank(), sfr.address())
    }
}

/// Independent copy of both banks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DataSnapshot {
    /// Bank contents, indexed by [`Bank::index`].
    pub banks: [Vec<u8>; BANK_COUNT],
}

impl DataSnapshot {
    /// Reads a byte from the snapshot. Out-of-range addresses read as `None`.
    #[must_use]
    pub fn get(&self, bank: Bank, address: u8) -> Option<u8> {
        self.banks[bank.index()].get(usize::from(address)).copied()
    }
}

/// Two banks of 128 bytes with SFR mapping and GPR mirroring.
///
/// Every write routes through one resolution rule: mapped SFRs and GPRs
/// (`0x0C..=0x7F`) update the cell in both banks, bank-private SFRs update
/// only the addressed bank.
#[derive(Debug)]
pub struct DataMemory {
    banks: RwLock<[[u8; BANK_SIZE]; BANK_COUNT]>,
    observers: Observers<DataLocation, u8>,
}

impl Default for DataMemory {
    fn default() -> Self {
        Self {
            banks: RwLock::new([[0; BANK_SIZE]; BANK_COUNT]),
            observers: Observers::default(),
        }
    }
}

const fn is_shared_address(address: u8) -> bool {
    address >= GPR_START || is_mapped_address(address)
}

const fn check_address(address: u8) -> Result<usize, SimError> {
    if (address as usize) < BANK_SIZE {
        Ok(address as usize)
    } else {
        Err(SimError::out_of_bounds(MemorySpace::Data, address as usize))
    }
}

impl DataMemory {
    /// Creates zeroed data memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a bank-qualified byte.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] when `address >= 128`.
    pub fn get(&self, bank: Bank, address: u8) -> Result<u8, SimError> {
        let index = check_address(address)?;
        Ok(read_lock(&self.banks)[bank.index()][index])
    }

    /// Writes a bank-qualified byte, applying the mirroring rules.
    ///
    /// Emits one event per physical cell touched: two for shared addresses,
    /// one for bank-private SFRs.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] when `address >= 128`.
    pub fn set(&self, bank: Bank, address: u8, value: u8) -> Result<(), SimError> {
        check_address(address)?;
        self.write_cell(bank, address, value);
        Ok(())
    }

    /// Write path shared by every setter; `address` must be below [`BANK_SIZE`].
    fn write_cell(&self, bank: Bank, address: u8, value: u8) {
        let index = usize::from(address);
        let touched: &[Bank] = if is_shared_address(address) {
            &[Bank::Bank0, Bank::Bank1]
        } else {
            match bank {
                Bank::Bank0 => &[Bank::Bank0],
                Bank::Bank1 => &[Bank::Bank1],
            }
        };

        let mut events = Vec::with_capacity(touched.len());
        {
            let mut banks = write_lock(&self.banks);
            for cell_bank in touched {
                let cell = &mut banks[cell_bank.index()][index];
                events.push(ChangeEvent::new(
                    DataLocation::new(*cell_bank, address),
                    *cell,
                    value,
                ));
                *cell = value;
            }
        }
        self.observers.notify_all(&events);
    }

    /// Reads an SFR through its static bank.
    #[must_use]
    pub fn sfr(&self, sfr: Sfr) -> u8 {
        read_lock(&self.banks)[sfr.bank().index()][usize::from(sfr.address())]
    }

    /// Writes an SFR through its static bank.
    pub fn set_sfr(&self, sfr: Sfr, value: u8) {
        self.write_cell(sfr.bank(), sfr.address(), value);
    }

    /// Reads a location.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] when the address is out of range.
    pub fn get_at(&self, location: DataLocation) -> Result<u8, SimError> {
        self.get(location.bank, location.address)
    }

    /// Writes a location.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] when the address is out of range.
    pub fn set_at(&self, location: DataLocation, value: u8) -> Result<(), SimError> {
        self.set(location.bank, location.address, value)
    }

    /// Zeroes both banks, emitting events only for cells that change.
    pub fn clear(&self) {
        let mut events = Vec::new();
        {
            let mut banks = write_lock(&self.banks);
            for bank in [Bank::Bank0, Bank::Bank1] {
                for (address, cell) in (0_u8..).zip(banks[bank.index()].iter_mut()) {
                    if *cell != 0 {
                        events.push(ChangeEvent::new(DataLocation::new(bank, address), *cell, 0));
                        *cell = 0;
                    }
                }
            }
        }
        self.observers.notify_all(&events);
    }

    /// Independent copy of both banks.
    #[must_use]
    pub fn snapshot(&self) -> DataSnapshot {
        let banks = read_lock(&self.banks);
        DataSnapshot {
            banks: [banks[0].to_vec(), banks[1].to_vec()],
        }
    }
}

impl Observable for DataMemory {
    type Location = DataLocation;
    type Value = u8;

    fn observers(&self) -> &Observers<DataLocation, u8> {
        &self.observers
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{Bank, DataLocation, DataMemory, BANK_SIZE};
    use crate::fault::{MemorySpace, SimError};
    use crate::memory::{ChangeEvent, Observable, Sfr};

    #[test]
    fn gpr_writes_are_mirrored_in_both_directions() {
        let data = DataMemory::new();
        data.set(Bank::Bank0, 0x20, 0xAB).unwrap();
        assert_eq!(data.get(Bank::Bank1, 0x20), Ok(0xAB));

        data.set(Bank::Bank1, 0x7F, 0x11).unwrap();
        assert_eq!(data.get(Bank::Bank0, 0x7F), Ok(0x11));
    }

    #[test]
    fn mapped_sfr_is_shared_and_private_sfr_is_not() {
        let data = DataMemory::new();
        data.set(Bank::Bank0, Sfr::Status.address(), 0x18).unwrap();
        assert_eq!(data.get(Bank::Bank1, Sfr::Status.address()), Ok(0x18));

        data.set_sfr(Sfr::Trisb, 0xF0);
        data.set_sfr(Sfr::Portb, 0x0F);
        assert_eq!(data.sfr(Sfr::Trisb), 0xF0);
        assert_eq!(data.sfr(Sfr::Portb), 0x0F);
        assert_eq!(data.get(Bank::Bank1, 0x06), Ok(0xF0));
        assert_eq!(data.get(Bank::Bank0, 0x06), Ok(0x0F));
    }

    #[test]
    fn sfr_writes_follow_the_bank_rules() {
        for (value, sfr) in (1_u8..).zip(Sfr::ALL) {
            let data = DataMemory::new();
            data.set_sfr(sfr, value);
            assert_eq!(data.get(sfr.bank(), sfr.address()), Ok(value), "{sfr:?}");
            let mirrored = if sfr.is_mapped() { value } else { 0 };
            assert_eq!(
                data.get(sfr.bank().other(), sfr.address()),
                Ok(mirrored),
                "{sfr:?}"
            );
        }
    }

    #[test]
    fn out_of_range_address_is_rejected() {
        let data = DataMemory::new();
        let err = SimError::AddressOutOfBounds {
            space: MemorySpace::Data,
            address: BANK_SIZE,
        };
        assert_eq!(data.get(Bank::Bank0, 0x80), Err(err));
        assert_eq!(data.set(Bank::Bank1, 0x80, 1), Err(err));
    }

    #[test]
    fn shared_write_emits_one_event_per_bank() {
        let data = DataMemory::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        data.subscribe(move |event| sink.lock().unwrap().push(*event));

        data.set(Bank::Bank1, 0x30, 7).unwrap();
        data.set_sfr(Sfr::Option, 0x80);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ChangeEvent::new(DataLocation::new(Bank::Bank0, 0x30), 0, 7),
                ChangeEvent::new(DataLocation::new(Bank::Bank1, 0x30), 0, 7),
                ChangeEvent::new(DataLocation::new(Bank::Bank1, 0x01), 0, 0x80),
            ]
        );
    }

    #[test]
    fn listener_can_read_back_the_written_value() {
        let data = Arc::new(DataMemory::new());
        let reader = Arc::clone(&data);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        data.subscribe(move |event| {
            let value = reader.get_at(event.location).unwrap();
            sink.lock().unwrap().push(value);
        });

        data.set(Bank::Bank0, 0x40, 0x5A).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0x5A, 0x5A]);
    }

    #[test]
    fn snapshot_is_detached_from_storage() {
        let data = DataMemory::new();
        data.set(Bank::Bank0, 0x0C, 1).unwrap();
        let snapshot = data.snapshot();
        data.set(Bank::Bank0, 0x0C, 2).unwrap();

        assert_eq!(snapshot.get(Bank::Bank1, 0x0C), Some(1));
        assert_eq!(data.get(Bank::Bank1, 0x0C), Ok(2));
    }

    #[test]
    fn clear_reports_only_changed_cells() {
        let data = DataMemory::new();
        data.set_sfr(Sfr::Tmr0, 3);
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        data.subscribe(move |_| *sink.lock().unwrap() += 1);

        data.clear();
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(data.sfr(Sfr::Tmr0), 0);
    }
}
