//! Host-facing configuration and outcome types.

use crate::decoder::Instruction;
use crate::execute::CarryPolarity;
use crate::fault::SimError;
use crate::memory::{DataSnapshot, DEFAULT_EEPROM_BYTES, PROGRAM_MEMORY_WORDS};
use crate::state::{RegisterSnapshot, RunState};
use crate::timing::{cycle_cost, CycleCostKind};

/// Configuration fixed at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    /// Program memory size in words, clamped to `1..=8192`.
    pub program_memory_words: usize,
    /// Data EEPROM size in bytes.
    pub eeprom_bytes: usize,
    /// Carry meaning for `ADDWF`/`ADDLW`.
    pub carry_polarity: CarryPolarity,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            program_memory_words: PROGRAM_MEMORY_WORDS,
            eeprom_bytes: DEFAULT_EEPROM_BYTES,
            carry_polarity: CarryPolarity::CarryOnOverflow,
        }
    }
}

/// Result of one `step()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction retired.
    Retired {
        /// PC after the instruction.
        pc: u16,
        /// Cycles consumed.
        cycles: u8,
        /// Decoded instruction.
        instruction: Instruction,
    },
    /// Instruction aborted; PC has already moved past the faulting word.
    Fault {
        /// What went wrong.
        cause: SimError,
        /// PC after the aborted step.
        pc: u16,
    },
}

impl StepOutcome {
    /// PC after the step.
    #[must_use]
    pub const fn next_pc(&self) -> u16 {
        match self {
            Self::Retired { pc, .. } | Self::Fault { pc, .. } => *pc,
        }
    }

    /// Cause of an aborted step.
    #[must_use]
    pub const fn fault(&self) -> Option<SimError> {
        match self {
            Self::Retired { .. } => None,
            Self::Fault { cause, .. } => Some(*cause),
        }
    }

    /// Cycles charged for the step. An aborted step costs one cycle.
    #[must_use]
    pub fn cycles(&self) -> u8 {
        match self {
            Self::Retired { cycles, .. } => *cycles,
            Self::Fault { .. } => cycle_cost(CycleCostKind::Sequential).unwrap_or(1),
        }
    }
}

/// Why `run()` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunBoundary {
    /// The step budget was used up.
    StepLimit,
    /// The stop predicate matched the PC after a step.
    StopCondition,
    /// `request_stop()` or `load()` was called during the run.
    StopRequested,
}

/// Aggregated result of `run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Steps executed, including aborted ones.
    pub steps: usize,
    /// Steps that faulted.
    pub faults: usize,
    /// Why the run ended.
    pub boundary: RunBoundary,
    /// PC when the run ended.
    pub pc: u16,
}

/// Consistent copy of the whole machine, taken between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineSnapshot {
    /// Lifecycle state.
    pub run_state: RunState,
    /// Total cycles since the last reset.
    pub cycles: u64,
    /// W, IR and PC.
    pub registers: RegisterSnapshot,
    /// Both data memory banks.
    pub data: DataSnapshot,
    /// Call stack, oldest entry first.
    pub call_stack: Vec<u16>,
    /// Program memory words.
    pub program: Vec<u16>,
    /// EEPROM bytes.
    pub eeprom: Vec<u8>,
}
