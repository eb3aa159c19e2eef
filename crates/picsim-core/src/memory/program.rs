use std::sync::RwLock;

use super::observer::{ChangeEvent, Observable, Observers};
use super::{read_lock, write_lock};
use crate::encoding::WORD_MASK;
use crate::fault::{MemorySpace, SimError};

/// Program memory size reachable by the 13-bit program counter.
pub const PROGRAM_MEMORY_WORDS: usize = 8192;

/// Fixed-size array of 14-bit instruction words.
#[derive(Debug)]
pub struct ProgramMemory {
    cells: RwLock<Vec<u16>>,
    observers: Observers<u16, u16>,
}

impl Default for ProgramMemory {
    fn default() -> Self {
        Self::new(PROGRAM_MEMORY_WORDS)
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn cell_address(index: usize) -> u16 {
    index as u16
}

impl ProgramMemory {
    /// Creates zeroed program memory of `words` cells, clamped to `1..=8192`.
    #[must_use]
    pub fn new(words: usize) -> Self {
        Self {
            cells: RwLock::new(vec![0; words.clamp(1, PROGRAM_MEMORY_WORDS)]),
            observers: Observers::default(),
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.cells).len()
    }

    /// Always `false`; program memory has at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the word at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] past the end of memory.
    pub fn get(&self, address: u16) -> Result<u16, SimError> {
        read_lock(&self.cells)
            .get(usize::from(address))
            .copied()
            .ok_or(SimError::out_of_bounds(
                MemorySpace::Program,
                usize::from(address),
            ))
    }

    /// Instruction fetch: cells past the end read as `0` (`NOP`).
    #[must_use]
    pub fn fetch(&self, address: u16) -> u16 {
        read_lock(&self.cells)
            .get(usize::from(address))
            .copied()
            .unwrap_or(0)
    }

    /// Writes the word at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfBounds`] past the end of memory and
    /// [`SimError::InvalidWord`] for values wider than 14 bits.
    pub fn set(&self, address: u16, word: u16) -> Result<(), SimError> {
        let index = usize::from(address);
        if word & !WORD_MASK != 0 {
            return Err(SimError::InvalidWord {
                address: index,
                word,
            });
        }
        let old = {
            let mut cells = write_lock(&self.cells);
            let cell = cells
                .get_mut(index)
                .ok_or(SimError::out_of_bounds(MemorySpace::Program, index))?;
            std::mem::replace(cell, word)
        };
        self.observers.notify(ChangeEvent::new(address, old, word));
        Ok(())
    }

    /// Replaces the whole image: `words` land at address 0, the rest is zeroed.
    ///
    /// The image is validated before anything is written. Events are emitted
    /// for cells whose content changes.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ImageTooLarge`] or [`SimError::InvalidWord`];
    /// memory is untouched on error.
    pub fn load(&self, words: &[u16]) -> Result<usize, SimError> {
        let capacity = self.len();
        if words.len() > capacity {
            return Err(SimError::ImageTooLarge {
                len: words.len(),
                capacity,
            });
        }
        if let Some((address, word)) = words
            .iter()
            .enumerate()
            .find(|(_, word)| **word & !WORD_MASK != 0)
        {
            return Err(SimError::InvalidWord {
                address,
                word: *word,
            });
        }

        let mut events = Vec::new();
        {
            let mut cells = write_lock(&self.cells);
            for (index, cell) in cells.iter_mut().enumerate() {
                let word = words.get(index).copied().unwrap_or(0);
                if *cell != word {
                    events.push(ChangeEvent::new(cell_address(index), *cell, word));
                    *cell = word;
                }
            }
        }
        self.observers.notify_all(&events);
        Ok(words.len())
    }

    /// Independent copy of the contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u16> {
        read_lock(&self.cells).clone()
    }
}

impl Observable for ProgramMemory {
    type Location = u16;
    type Value = u16;

    fn observers(&self) -> &Observers<u16, u16> {
        &self.observers
    }
}
