//! Register file and engine run-state primitives.

/// Register file (W, instruction register, program counter).
pub mod registers;
/// Engine lifecycle state machine.
pub mod run_state;

pub use registers::{Register, RegisterFile, RegisterSnapshot, PC_MASK};
pub use run_state::RunState;
