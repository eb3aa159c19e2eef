//! Memory blocks of the simulated machine.
//!
//! Each block guards its storage with its own reader/writer lock and
//! publishes a [`ChangeEvent`] for every cell it writes. Events are emitted
//! after the storage lock is released, so listeners may read the block.

/// Call stack of return addresses.
pub mod call_stack;
/// Banked data memory with SFR mapping and GPR mirroring.
pub mod data;
/// Data EEPROM.
pub mod eeprom;
/// Change-event registry shared by all blocks.
pub mod observer;
/// Program memory.
pub mod program;
/// Special-function register map and STATUS bit layout.
pub mod sfr;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use call_stack::{CallStack, CALL_STACK_DEPTH};
pub use data::{Bank, DataLocation, DataMemory, DataSnapshot, BANK_COUNT, BANK_SIZE, GPR_START};
pub use eeprom::{Eeprom, DEFAULT_EEPROM_BYTES};
pub use observer::{ChangeEvent, Listener, Observable, Observers, SubscriptionId};
pub use program::{ProgramMemory, PROGRAM_MEMORY_WORDS};
pub use sfr::Sfr;

// Poisoned locks are recovered: every write completes before any listener runs.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
