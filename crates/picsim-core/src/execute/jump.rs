//! `CALL` and `GOTO`.

use super::helpers::jump_target;
use super::{operand_mismatch, ExecContext, ExecuteState, StackEffect};
use crate::decoder::{Instruction, Operands};
use crate::fault::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum JumpOp {
    Call,
    Goto,
}

pub(super) fn execute(
    op: JumpOp,
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    let Operands::Target(immediate) = instr.operands else {
        return Err(operand_mismatch(instr));
    };

    if op == JumpOp::Call {
        if ctx.stack.is_full() {
            return Err(SimError::StackOverflow);
        }
        exec.stack = StackEffect::Push(exec.next_pc);
    }
    exec.next_pc = jump_target(ctx.data, immediate);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::super::{execute_instruction, CarryPolarity, ExecContext, StackEffect};
    use crate::decoder::Decoder;
    use crate::fault::SimError;
    use crate::memory::{CallStack, DataMemory, Eeprom, ProgramMemory, Sfr, CALL_STACK_DEPTH};
    use crate::state::RegisterFile;

    fn run(word: u16, pclath: u8, stacked: u16) -> Result<(u16, StackEffect, u8), SimError> {
        let registers = RegisterFile::new();
        let program = ProgramMemory::new(4);
        let data = DataMemory::new();
        let stack = CallStack::new();
        let eeprom = Eeprom::new(4);
        data.set_sfr(Sfr::Pclath, pclath);
        for address in 0..stacked {
            stack.push(address).unwrap();
        }
        let ctx = ExecContext {
            registers: &registers,
            program: &program,
            data: &data,
            stack: &stack,
            eeprom: &eeprom,
            carry_polarity: CarryPolarity::default(),
        };
        let exec = execute_instruction(&Decoder::decode(word).unwrap(), &ctx, 0x0101)?;
        assert_eq!(stack.depth(), usize::from(stacked));
        Ok((exec.next_pc, exec.stack, exec.cycles))
    }

    #[rstest]
    #[case::goto_page_zero(0x2806, 0x00, 0x0006)]
    #[case::goto_page_one(0x2806, 0x08, 0x0806)]
    #[case::goto_page_three(0x2FFF, 0x18, 0x1FFF)]
    #[case::goto_ignores_low_pclath_bits(0x2806, 0x07, 0x0006)]
    fn goto_combines_pclath_page_bits(#[case] word: u16, #[case] pclath: u8, #[case] target: u16) {
        assert_eq!(run(word, pclath, 0), Ok((target, StackEffect::None, 2)));
    }

    #[rstest]
    #[case::empty_stack(0)]
    #[case::one_slot_left(7)]
    fn call_pushes_the_fall_through_address(#[case] stacked: u16) {
        assert_eq!(
            run(0x2123, 0x10, stacked),
            Ok((0x1123, StackEffect::Push(0x0101), 2))
        );
    }

    #[test]
    fn call_on_full_stack_overflows() {
        let full = u16::try_from(CALL_STACK_DEPTH).unwrap();
        assert_eq!(run(0x2123, 0x00, full), Err(SimError::StackOverflow));
    }
}
