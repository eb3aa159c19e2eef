//! Bit-oriented file register operations.

use super::helpers::resolve_file;
use super::{operand_mismatch, ExecContext, ExecuteState};
use crate::decoder::{Destination, Instruction, Operands};
use crate::fault::SimError;
use crate::memory::sfr::{bit_is_set, with_bit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BitOp {
    Clear,
    Set,
    SkipIfClear,
    SkipIfSet,
}

pub(super) fn execute(
    op: BitOp,
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    let Operands::FileBit { file, bit } = instr.operands else {
        return Err(operand_mismatch(instr));
    };
    let location = resolve_file(ctx.data, file);
    let value = ctx.data.get_at(location)?;

    match op {
        BitOp::Clear => exec.store(Destination::File, location, with_bit(value, bit, false)),
        BitOp::Set => exec.store(Destination::File, location, with_bit(value, bit, true)),
        BitOp::SkipIfClear => {
            if !bit_is_set(value, bit) {
                exec.skip_next();
            }
        }
        BitOp::SkipIfSet => {
            if bit_is_set(value, bit) {
                exec.skip_next();
            }
        }
    }
    Ok(())
}
