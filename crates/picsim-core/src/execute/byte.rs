//! Byte-oriented file register operations and the no-operand control group.

use super::flags::{self, FlagsUpdate};
use super::helpers::{resolve_file, status_bit};
use super::{operand_mismatch, ExecContext, ExecuteState, StackEffect};
use crate::decoder::{Destination, Instruction, Operands};
use crate::fault::SimError;
use crate::memory::sfr::STATUS_C;

/// ALU operation of a `f,d` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ByteOp {
    Add,
    And,
    Complement,
    Decrement,
    DecrementSkipZero,
    Increment,
    IncrementSkipZero,
    InclusiveOr,
    Move,
    RotateLeft,
    RotateRight,
    Subtract,
    SwapNibbles,
    ExclusiveOr,
}

pub(super) fn execute_file_op(
    op: ByteOp,
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    let Operands::FileDest { file, dest } = instr.operands else {
        return Err(operand_mismatch(instr));
    };
    let location = resolve_file(ctx.data, file);
    let value = ctx.data.get_at(location)?;
    let w = ctx.registers.w();

    let (result, flags) = match op {
        ByteOp::Add => flags::add(w, value, ctx.carry_polarity),
        ByteOp::And => with_zero(w & value),
        ByteOp::Complement => with_zero(!value),
        ByteOp::Decrement | ByteOp::DecrementSkipZero => with_zero(value.wrapping_sub(1)),
        ByteOp::Increment | ByteOp::IncrementSkipZero => with_zero(value.wrapping_add(1)),
        ByteOp::InclusiveOr => with_zero(w | value),
        ByteOp::Move => with_zero(value),
        ByteOp::RotateLeft => {
            let carry_in = u8::from(status_bit(ctx.data, STATUS_C));
            ((value << 1) | carry_in, FlagsUpdate::carry(value & 0x80 != 0))
        }
        ByteOp::RotateRight => {
            let carry_in = u8::from(status_bit(ctx.data, STATUS_C));
            ((value >> 1) | (carry_in << 7), FlagsUpdate::carry(value & 0x01 != 0))
        }
        ByteOp::Subtract => flags::subtract(value, w),
        ByteOp::SwapNibbles => (value.rotate_left(4), FlagsUpdate::NONE),
        ByteOp::ExclusiveOr => with_zero(w ^ value),
    };

    exec.flags = flags;
    exec.store(dest, location, result);
    if matches!(op, ByteOp::DecrementSkipZero | ByteOp::IncrementSkipZero) && result == 0 {
        exec.skip_next();
    }
    Ok(())
}

const fn with_zero(result: u8) -> (u8, FlagsUpdate) {
    (result, FlagsUpdate::zero(result))
}

pub(super) fn execute_movwf(
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    let Operands::File { file } = instr.operands else {
        return Err(operand_mismatch(instr));
    };
    exec.store(Destination::File, resolve_file(ctx.data, file), ctx.registers.w());
    Ok(())
}

pub(super) fn execute_clrf(
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    let Operands::File { file } = instr.operands else {
        return Err(operand_mismatch(instr));
    };
    exec.store(Destination::File, resolve_file(ctx.data, file), 0);
    exec.flags = FlagsUpdate::zero(0);
    Ok(())
}

pub(super) fn execute_clrw(exec: &mut ExecuteState) {
    exec.w = Some(0);
    exec.flags = FlagsUpdate::zero(0);
}

/// `RETURN` and `RETFIE`: resume at the popped return address.
pub(super) fn execute_return(
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    exec.next_pc = ctx.stack.top()?;
    exec.stack = StackEffect::Pop;
    Ok(())
}
