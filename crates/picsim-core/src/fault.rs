use std::fmt;

use thiserror::Error;

/// Address spaces that can report an out-of-bounds access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemorySpace {
    /// Program memory (14-bit instruction words).
    Program,
    /// Banked data memory (SFRs and GPRs).
    Data,
    /// Hardware call stack slots.
    CallStack,
    /// Data EEPROM.
    Eeprom,
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Program => "program memory",
            Self::Data => "data memory",
            Self::CallStack => "call stack",
            Self::Eeprom => "eeprom",
        };
        f.write_str(name)
    }
}

/// Fault classes used for log fields and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder rejected an instruction word.
    Decode,
    /// Memory bounds violation.
    Memory,
    /// Call stack capacity violation.
    Stack,
    /// Control operation used in the wrong engine state.
    Control,
    /// Program image rejected by the loader boundary.
    Image,
}

/// Every error condition the simulator core can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SimError {
    /// No entry of the opcode table matches the fetched word.
    #[error("no instruction matches word {word:#06x}")]
    Decode {
        /// Raw fetched word.
        word: u16,
    },
    /// An index fell outside the valid range of a memory block.
    #[error("{space} address {address:#06x} is out of bounds")]
    AddressOutOfBounds {
        /// Block that rejected the access.
        space: MemorySpace,
        /// Offending address.
        address: usize,
    },
    /// `push` on a full call stack.
    #[error("call stack overflow")]
    StackOverflow,
    /// `pop` or `top` on an empty call stack.
    #[error("call stack underflow")]
    StackUnderflow,
    /// Control operation invoked before the first reset.
    #[error("engine has not been reset")]
    NotReady,
    /// Program word wider than 14 bits.
    #[error("word {word:#06x} at {address:#06x} does not fit in 14 bits")]
    InvalidWord {
        /// Program address of the word.
        address: usize,
        /// Rejected word.
        word: u16,
    },
    /// Program image longer than program memory.
    #[error("program image of {len} words exceeds capacity of {capacity} words")]
    ImageTooLarge {
        /// Number of words supplied.
        len: usize,
        /// Program memory size in words.
        capacity: usize,
    },
}

impl SimError {
    /// Returns the fault class for this error.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::Decode { .. } => FaultClass::Decode,
            Self::AddressOutOfBounds { .. } => FaultClass::Memory,
            Self::StackOverflow | Self::StackUnderflow => FaultClass::Stack,
            Self::NotReady => FaultClass::Control,
            Self::InvalidWord { .. } | Self::ImageTooLarge { .. } => FaultClass::Image,
        }
    }

    /// Errors a step absorbs: the cycle ends, the engine keeps running.
    #[must_use]
    pub const fn is_step_recoverable(self) -> bool {
        matches!(
            self.class(),
            FaultClass::Decode | FaultClass::Memory | FaultClass::Stack
        )
    }

    pub(crate) const fn out_of_bounds(space: MemorySpace, address: usize) -> Self {
        Self::AddressOutOfBounds { space, address }
    }
}
