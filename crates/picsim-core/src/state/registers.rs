use std::sync::RwLock;

use crate::memory::observer::{ChangeEvent, Observable, Observers};
use crate::memory::{read_lock, write_lock};

/// Program counter width mask (13 bits).
pub const PC_MASK: u16 = 0x1FFF;

/// Registers held outside data memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Register {
    /// Working register.
    W,
    /// Last fetched raw word.
    InstructionRegister,
    /// Program counter.
    ProgramCounter,
}

/// Point-in-time copy of the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterSnapshot {
    /// Working register.
    pub w: u8,
    /// Instruction register.
    pub ir: u16,
    /// Program counter.
    pub pc: u16,
}

/// W, instruction register and program counter with change notification.
///
/// Events carry values widened to `u16`.
#[derive(Debug, Default)]
pub struct RegisterFile {
    state: RwLock<RegisterSnapshot>,
    observers: Observers<Register, u16>,
}

impl RegisterFile {
    /// Creates a register file at power-on values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads W.
    #[must_use]
    pub fn w(&self) -> u8 {
        read_lock(&self.state).w
    }

    /// Writes W.
    pub fn set_w(&self, value: u8) {
        let old = std::mem::replace(&mut write_lock(&self.state).w, value);
        self.observers.notify(ChangeEvent::new(
            Register::W,
            u16::from(old),
            u16::from(value),
        ));
    }

    /// Reads the instruction register.
    #[must_use]
    pub fn ir(&self) -> u16 {
        read_lock(&self.state).ir
    }

    /// Writes the instruction register.
    pub fn set_ir(&self, word: u16) {
        let old = std::mem::replace(&mut write_lock(&self.state).ir, word);
        self.observers
            .notify(ChangeEvent::new(Register::InstructionRegister, old, word));
    }

    /// Reads the program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        read_lock(&self.state).pc
    }

    /// Writes the program counter, masked to 13 bits.
    pub fn set_pc(&self, value: u16) {
        let value = value & PC_MASK;
        let old = std::mem::replace(&mut write_lock(&self.state).pc, value);
        self.observers
            .notify(ChangeEvent::new(Register::ProgramCounter, old, value));
    }

    /// Restores power-on values (all zero).
    pub fn reset(&self) {
        self.set_w(0);
        self.set_ir(0);
        self.set_pc(0);
    }

    /// Independent copy of all three registers.
    #[must_use]
    pub fn snapshot(&self) -> RegisterSnapshot {
        *read_lock(&self.state)
    }
}

impl Observable for RegisterFile {
    type Location = Register;
    type Value = u16;

    fn observers(&self) -> &Observers<Register, u16> {
        &self.observers
    }
}
