use std::sync::RwLock;

use super::observer::{ChangeEvent, Observable, Observers};
use super::{read_lock, write_lock};
use crate::fault::{MemorySpace, SimError};
use crate::state::registers::PC_MASK;

/// Hardware call stack depth.
pub const CALL_STACK_DEPTH: usize = 8;

/// Fixed-depth LIFO of 13-bit return addresses.
///
/// Events are keyed by slot index; a push reports `None -> Some(addr)` and a
/// pop reports `Some(addr) -> None`.
#[derive(Debug, Default)]
pub struct CallStack {
    slots: RwLock<Vec<u16>>,
    observers: Observers<usize, Option<u16>>,
}

impl CallStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a return address, masked to 13 bits.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StackOverflow`] when eight addresses are stored.
    pub fn push(&self, address: u16) -> Result<(), SimError> {
        let address = address & PC_MASK;
        let slot = {
            let mut slots = write_lock(&self.slots);
            if slots.len() >= CALL_STACK_DEPTH {
                return Err(SimError::StackOverflow);
            }
            slots.push(address);
            slots.len() - 1
        };
        self.observers
            .notify(ChangeEvent::new(slot, None, Some(address)));
        Ok(())
    }

    /// Pops the most recent return address.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StackUnderflow`] when empty.
    pub fn pop(&self) -> Result<u16, SimError> {
        let (slot, address) = {
            let mut slots = write_lock(&self.slots);
            let address = slots.pop().ok_or(SimError::StackUnderflow)?;
            (slots.len(), address)
        };
        self.observers
            .notify(ChangeEvent::new(slot, Some(address), None));
        Ok(address)
    }

    /// Reads the most recent return address without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StackUnderflow`] when empty.
    pub fn top(&self) -> Result<u16, SimError> {
        read_lock(&self.slots)
            .last()
            .copied()
            .ok_or(SimError::StackUnderflow)
    }

    /// Reads an occupied slot (0 is the oldest entry).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] for an unoccupied slot.
    pub fn get(&self, slot: usize) -> Result<u16, SimError> {
        read_lock(&self.slots)
            .get(slot)
            .copied()
            .ok_or(SimError::out_of_bounds(MemorySpace::CallStack, slot))
    }

    /// Overwrites an occupied slot.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] for an unoccupied slot.
    pub fn set(&self, slot: usize, address: u16) -> Result<(), SimError> {
        let address = address & PC_MASK;
        let old = {
            let mut slots = write_lock(&self.slots);
            let cell = slots
                .get_mut(slot)
                .ok_or(SimError::out_of_bounds(MemorySpace::CallStack, slot))?;
            std::mem::replace(cell, address)
        };
        self.observers
            .notify(ChangeEvent::new(slot, Some(old), Some(address)));
        Ok(())
    }

    /// Number of stored addresses.
    #[must_use]
    pub fn depth(&self) -> usize {
        read_lock(&self.slots).len()
    }

    /// `true` when another push would overflow.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.depth() >= CALL_STACK_DEPTH
    }

    /// `true` when a pop would underflow.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    /// Drops every entry, reporting each slot as emptied.
    pub fn clear(&self) {
        let drained: Vec<u16> = write_lock(&self.slots).drain(..).collect();
        let events: Vec<_> = drained
            .into_iter()
            .enumerate()
            .rev()
            .map(|(slot, address)| ChangeEvent::new(slot, Some(address), None))
            .collect();
        self.observers.notify_all(&events);
    }

    /// Independent copy, oldest entry first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u16> {
        read_lock(&self.slots).clone()
    }
}

impl Observable for CallStack {
    type Location = usize;
    type Value = Option<u16>;

    fn observers(&self) -> &Observers<usize, Option<u16>> {
        &self.observers
    }
}
