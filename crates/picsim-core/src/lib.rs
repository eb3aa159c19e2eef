//! Core simulator crate for a PIC16-class 8-bit microcontroller.

/// Fault taxonomy and the crate error type.
pub mod fault;
pub use fault::{FaultClass, MemorySpace, SimError};

/// Opcode table and family classification of 14-bit words.
pub mod encoding;
pub use encoding::{classify_word, Opcode, OpcodeFamily, OperandLayout, OPCODE_TABLE, WORD_MASK};

/// Instruction decode pipeline with operand extraction.
pub mod decoder;
pub use decoder::{Decoder, Destination, Instruction, Operands};

/// Assembler-style rendering of instructions.
pub mod disasm;
pub use disasm::disassemble_word;

/// Deterministic instruction cycle-cost table and lookup helpers.
pub mod timing;
pub use timing::{cycle_cost, CycleCostKind, CYCLE_COST_TABLE};

/// Observable memory blocks.
pub mod memory;
pub use memory::{
    Bank, CallStack, ChangeEvent, DataLocation, DataMemory, DataSnapshot, Eeprom, Observable,
    ProgramMemory, Sfr, SubscriptionId, CALL_STACK_DEPTH, PROGRAM_MEMORY_WORDS,
};

/// Register file and lifecycle state.
pub mod state;
pub use state::{Register, RegisterFile, RegisterSnapshot, RunState, PC_MASK};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, step_one, CarryPolarity, ExecContext, ExecuteState,
    FlagsUpdate,
};

/// Host-facing configuration and outcome types.
pub mod api;
pub use api::{CoreConfig, MachineSnapshot, RunBoundary, RunOutcome, StepOutcome};

/// Engine that owns the machine and drives execution.
pub mod engine;
pub use engine::Engine;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
