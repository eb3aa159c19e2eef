//! Instruction execution pipeline.
//!
//! Each step runs in two phases. The compute phase reads the machine through
//! an [`ExecContext`] and records every effect in an [`ExecuteState`]; the
//! commit phase applies those effects in a fixed order:
//! 1. Call stack push or pop
//! 2. File register write, then PCL and EECON1 side effects
//! 3. STATUS flags
//! 4. W
//! 5. PC
//!
//! A fault raised while computing leaves every block untouched apart from
//! the fetch (IR and PC already advanced).

mod bit;
mod byte;
mod flags;
mod helpers;
mod jump;
mod literal;

pub use flags::{add, subtract, CarryPolarity, FlagsUpdate};
pub use helpers::{computed_pc, jump_target, resolve_file, service_eeprom_request, status_bit};

use tracing::{trace, warn};

use crate::decoder::{Destination, Instruction};
use crate::encoding::Opcode;
use crate::fault::SimError;
use crate::memory::{CallStack, DataLocation, DataMemory, Eeprom, ProgramMemory, Sfr};
use crate::state::{RegisterFile, PC_MASK};
use crate::timing::{base_cost_kind, cycle_cost, CycleCostKind};
use crate::StepOutcome;

use bit::BitOp;
use byte::ByteOp;
use jump::JumpOp;
use literal::LiteralOp;

/// Borrowed view of every block an instruction may touch.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext<'a> {
    /// W, IR and PC.
    pub registers: &'a RegisterFile,
    /// Program memory.
    pub program: &'a ProgramMemory,
    /// Banked data memory.
    pub data: &'a DataMemory,
    /// Return-address stack.
    pub stack: &'a CallStack,
    /// Data EEPROM.
    pub eeprom: &'a Eeprom,
    /// Carry meaning for additions.
    pub carry_polarity: CarryPolarity,
}

/// Call stack effect of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackEffect {
    /// Stack untouched.
    #[default]
    None,
    /// Push the return address.
    Push(u16),
    /// Pop the top entry.
    Pop,
}

/// Effects accumulated by the compute phase, applied by [`commit_execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteState {
    /// PC after the instruction (before any PCL computed goto).
    pub next_pc: u16,
    /// New W value.
    pub w: Option<u8>,
    /// File register write.
    pub file_write: Option<(DataLocation, u8)>,
    /// STATUS flag changes.
    pub flags: FlagsUpdate,
    /// Call stack effect.
    pub stack: StackEffect,
    /// Cycle cost.
    pub cycles: u8,
}

impl ExecuteState {
    /// Creates a state that falls through to `next_pc` with the base cost of `opcode`.
    #[must_use]
    pub fn new(next_pc: u16, opcode: Opcode) -> Self {
        Self {
            next_pc,
            w: None,
            file_write: None,
            flags: FlagsUpdate::NONE,
            stack: StackEffect::None,
            cycles: cycle_cost(base_cost_kind(opcode)).unwrap_or(1),
        }
    }

    /// Routes a byte-oriented result to W or back to the file register.
    pub fn store(&mut self, dest: Destination, location: DataLocation, value: u8) {
        match dest {
            Destination::W => self.w = Some(value),
            Destination::File => self.file_write = Some((location, value)),
        }
    }

    /// Skips the following instruction word.
    pub fn skip_next(&mut self) {
        self.next_pc = self.next_pc.wrapping_add(1) & PC_MASK;
        self.cycles = cycle_cost(CycleCostKind::SkipTaken).unwrap_or(2);
    }
}

/// Error for an instruction whose operands do not fit its opcode's layout.
fn operand_mismatch(instr: &Instruction) -> SimError {
    SimError::Decode {
        word: instr.encode(),
    }
}

/// Computes the effects of `instr` without mutating any block.
///
/// # Errors
///
/// Returns [`SimError::StackOverflow`] for `CALL` on a full stack,
/// [`SimError::StackUnderflow`] for a return on an empty stack, and
/// [`SimError::Decode`] when the operands do not match the opcode.
pub fn execute_instruction(
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    next_pc: u16,
) -> Result<ExecuteState, SimError> {
    let mut exec = ExecuteState::new(next_pc, instr.opcode);

    match instr.opcode {
        Opcode::Addwf => byte::execute_file_op(ByteOp::Add, instr, ctx, &mut exec),
        Opcode::Andwf => byte::execute_file_op(ByteOp::And, instr, ctx, &mut exec),
        Opcode::Comf => byte::execute_file_op(ByteOp::Complement, instr, ctx, &mut exec),
        Opcode::Decf => byte::execute_file_op(ByteOp::Decrement, instr, ctx, &mut exec),
        Opcode::Decfsz => {
            byte::execute_file_op(ByteOp::DecrementSkipZero, instr, ctx, &mut exec)
        }
        Opcode::Incf => byte::execute_file_op(ByteOp::Increment, instr, ctx, &mut exec),
        Opcode::Incfsz => {
            byte::execute_file_op(ByteOp::IncrementSkipZero, instr, ctx, &mut exec)
        }
        Opcode::Iorwf => byte::execute_file_op(ByteOp::InclusiveOr, instr, ctx, &mut exec),
        Opcode::Movf => byte::execute_file_op(ByteOp::Move, instr, ctx, &mut exec),
        Opcode::Rlf => byte::execute_file_op(ByteOp::RotateLeft, instr, ctx, &mut exec),
        Opcode::Rrf => byte::execute_file_op(ByteOp::RotateRight, instr, ctx, &mut exec),
        Opcode::Subwf => byte::execute_file_op(ByteOp::Subtract, instr, ctx, &mut exec),
        Opcode::Swapf => byte::execute_file_op(ByteOp::SwapNibbles, instr, ctx, &mut exec),
        Opcode::Xorwf => byte::execute_file_op(ByteOp::ExclusiveOr, instr, ctx, &mut exec),
        Opcode::Movwf => byte::execute_movwf(instr, ctx, &mut exec),
        Opcode::Clrf => byte::execute_clrf(instr, ctx, &mut exec),
        Opcode::Clrw => {
            byte::execute_clrw(&mut exec);
            Ok(())
        }
        Opcode::Nop | Opcode::Clrwdt | Opcode::Sleep => Ok(()),
        Opcode::Return | Opcode::Retfie => byte::execute_return(ctx, &mut exec),
        Opcode::Bcf => bit::execute(BitOp::Clear, instr, ctx, &mut exec),
        Opcode::Bsf => bit::execute(BitOp::Set, instr, ctx, &mut exec),
        Opcode::Btfsc => bit::execute(BitOp::SkipIfClear, instr, ctx, &mut exec),
        Opcode::Btfss => bit::execute(BitOp::SkipIfSet, instr, ctx, &mut exec),
        Opcode::Call => jump::execute(JumpOp::Call, instr, ctx, &mut exec),
        Opcode::Goto => jump::execute(JumpOp::Goto, instr, ctx, &mut exec),
        Opcode::Addlw => literal::execute(LiteralOp::Add, instr, ctx, &mut exec),
        Opcode::Andlw => literal::execute(LiteralOp::And, instr, ctx, &mut exec),
        Opcode::Iorlw => literal::execute(LiteralOp::InclusiveOr, instr, ctx, &mut exec),
        Opcode::Movlw => literal::execute(LiteralOp::Move, instr, ctx, &mut exec),
        Opcode::Sublw => literal::execute(LiteralOp::Subtract, instr, ctx, &mut exec),
        Opcode::Xorlw => literal::execute(LiteralOp::ExclusiveOr, instr, ctx, &mut exec),
        Opcode::Retlw => literal::execute_retlw(instr, ctx, &mut exec),
    }?;

    Ok(exec)
}

/// Applies the effects recorded in `exec` and returns the final PC.
///
/// # Errors
///
/// Propagates stack faults and EEPROM address faults raised while
/// committing; effects applied before the fault remain.
pub fn commit_execution(ctx: &ExecContext<'_>, exec: &ExecuteState) -> Result<u16, SimError> {
    match exec.stack {
        StackEffect::None => {}
        StackEffect::Push(address) => ctx.stack.push(address)?,
        StackEffect::Pop => {
            ctx.stack.pop()?;
        }
    }

    let mut next_pc = exec.next_pc;
    if let Some((location, value)) = exec.file_write {
        ctx.data.set_at(location, value)?;
        match Sfr::from_location(location.bank, location.address) {
            Some(Sfr::Pcl) => next_pc = computed_pc(ctx.data, value),
            Some(Sfr::Eecon1) => service_eeprom_request(ctx)?,
            _ => {}
        }
    }

    if !exec.flags.is_empty() {
        let status = ctx.data.sfr(Sfr::Status);
        ctx.data.set_sfr(Sfr::Status, exec.flags.apply(status));
    }

    if let Some(w) = exec.w {
        ctx.registers.set_w(w);
    }

    let next_pc = next_pc & PC_MASK;
    ctx.registers.set_pc(next_pc);
    Ok(next_pc)
}

/// Mirrors the low byte of PC into PCL.
#[allow(clippy::cast_possible_truncation)]
pub fn sync_pcl(ctx: &ExecContext<'_>) {
    let low = (ctx.registers.pc() & 0xFF) as u8;
    if ctx.data.sfr(Sfr::Pcl) != low {
        ctx.data.set_sfr(Sfr::Pcl, low);
    }
}

/// Fetches, decodes and executes one instruction.
///
/// IR and PC are updated by the fetch before decoding, so a faulting word
/// still advances PC by one.
pub fn step_one(ctx: &ExecContext<'_>) -> StepOutcome {
    let pc = ctx.registers.pc();
    let word = ctx.program.fetch(pc);
    ctx.registers.set_ir(word);
    let fall_through = pc.wrapping_add(1) & PC_MASK;
    ctx.registers.set_pc(fall_through);

    let result = crate::Decoder::decode(word).and_then(|instr| {
        let exec = execute_instruction(&instr, ctx, fall_through)?;
        let next_pc = commit_execution(ctx, &exec)?;
        Ok((instr, exec.cycles, next_pc))
    });
    sync_pcl(ctx);

    match result {
        Ok((instruction, cycles, next_pc)) => {
            trace!(
                pc = format_args!("{pc:#06x}"),
                word = format_args!("{word:#06x}"),
                %instruction,
                cycles,
                "retired"
            );
            StepOutcome::Retired {
                pc: next_pc,
                cycles,
                instruction,
            }
        }
        Err(cause) => {
            warn!(
                pc = format_args!("{pc:#06x}"),
                word = format_args!("{word:#06x}"),
                class = ?cause.class(),
                %cause,
                "step faulted"
            );
            StepOutcome::Fault {
                cause,
                pc: ctx.registers.pc(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{execute_instruction, step_one, CarryPolarity, ExecContext, StackEffect};
    use crate::decoder::Decoder;
    use crate::fault::SimError;
    use crate::memory::sfr::{STATUS_C, STATUS_Z};
    use crate::memory::{Bank, CallStack, DataMemory, Eeprom, ProgramMemory, Sfr};
    use crate::state::RegisterFile;
    use crate::StepOutcome;

    struct Machine {
        registers: RegisterFile,
        program: ProgramMemory,
        data: DataMemory,
        stack: CallStack,
        eeprom: Eeprom,
    }

    impl Machine {
        fn with_program(words: &[u16]) -> Self {
            let machine = Self {
                registers: RegisterFile::new(),
                program: ProgramMemory::default(),
                data: DataMemory::new(),
                stack: CallStack::new(),
                eeprom: Eeprom::new(16),
            };
            machine.program.load(words).unwrap();
            machine
        }

        fn ctx(&self) -> ExecContext<'_> {
            ExecContext {
                registers: &self.registers,
                program: &self.program,
                data: &self.data,
                stack: &self.stack,
                eeprom: &self.eeprom,
                carry_polarity: CarryPolarity::CarryOnOverflow,
            }
        }

        fn status(&self, bit: u8) -> bool {
            crate::memory::sfr::bit_is_set(self.data.sfr(Sfr::Status), bit)
        }
    }

    #[test]
    fn compute_phase_does_not_touch_memory() {
        let machine = Machine::with_program(&[]);
        machine.data.set(Bank::Bank0, 0x20, 0x01).unwrap();
        let instr = Decoder::decode(0x0AA0).unwrap(); // INCF 0x20,F
        let exec = execute_instruction(&instr, &machine.ctx(), 1).unwrap();

        assert_eq!(machine.data.get(Bank::Bank0, 0x20), Ok(0x01));
        assert_eq!(exec.file_write.map(|(_, value)| value), Some(0x02));
        assert_eq!(exec.flags.zero, Some(false));
    }

    #[test]
    fn call_on_full_stack_is_rejected_before_commit() {
        let machine = Machine::with_program(&[]);
        for address in 0..8 {
            machine.stack.push(address).unwrap();
        }
        let instr = Decoder::decode(0x2010).unwrap();
        assert_eq!(
            execute_instruction(&instr, &machine.ctx(), 1),
            Err(SimError::StackOverflow)
        );
        assert_eq!(machine.stack.depth(), 8);
    }

    #[test]
    fn call_records_push_of_return_address() {
        let machine = Machine::with_program(&[]);
        let instr = Decoder::decode(0x2010).unwrap();
        let exec = execute_instruction(&instr, &machine.ctx(), 5).unwrap();
        assert_eq!(exec.stack, StackEffect::Push(5));
        assert_eq!(exec.next_pc, 0x10);
        assert_eq!(exec.cycles, 2);
    }

    #[test]
    fn faulting_word_advances_pc_and_reports_decode() {
        let machine = Machine::with_program(&[0x0001]);
        let outcome = step_one(&machine.ctx());
        assert_eq!(
            outcome,
            StepOutcome::Fault {
                cause: SimError::Decode { word: 0x0001 },
                pc: 1
            }
        );
        assert_eq!(machine.registers.ir(), 0x0001);
        assert_eq!(machine.data.sfr(Sfr::Pcl), 1);
    }

    #[test]
    fn return_on_empty_stack_underflows_without_side_effects() {
        let machine = Machine::with_program(&[0x0008]);
        let outcome = step_one(&machine.ctx());
        assert_eq!(outcome.fault(), Some(SimError::StackUnderflow));
        assert_eq!(machine.registers.pc(), 1);
        assert!(machine.stack.is_empty());
    }

    #[test]
    fn clrf_status_leaves_only_zero_set() {
        let machine = Machine::with_program(&[0x0183]);
        machine.data.set_sfr(Sfr::Status, 0x1F);
        step_one(&machine.ctx());
        assert_eq!(machine.data.sfr(Sfr::Status), 0x04);
        assert!(machine.status(STATUS_Z));
        assert!(!machine.status(STATUS_C));
    }

    #[test]
    fn writing_pcl_performs_a_computed_goto() {
        // MOVLW 0x01; MOVWF PCLATH; MOVLW 0x40; MOVWF PCL
        let machine = Machine::with_program(&[0x3001, 0x008A, 0x3040, 0x0082]);
        for _ in 0..4 {
            step_one(&machine.ctx());
        }
        assert_eq!(machine.registers.pc(), 0x0140);
        assert_eq!(machine.data.sfr(Sfr::Pcl), 0x40);
    }

    #[test]
    fn pcl_tracks_program_counter_low_byte() {
        let machine = Machine::with_program(&[0x0000, 0x2880]);
        step_one(&machine.ctx());
        assert_eq!(machine.data.sfr(Sfr::Pcl), 0x01);
        step_one(&machine.ctx());
        assert_eq!(machine.data.sfr(Sfr::Pcl), 0x80);
    }
}
