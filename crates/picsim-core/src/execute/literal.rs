//! Literal operations on W, including `RETLW`.

use super::flags::{self, FlagsUpdate};
use super::{operand_mismatch, ExecContext, ExecuteState, StackEffect};
use crate::decoder::{Instruction, Operands};
use crate::fault::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LiteralOp {
    Add,
    And,
    InclusiveOr,
    Move,
    Subtract,
    ExclusiveOr,
}

const fn literal(instr: &Instruction) -> Option<u8> {
    match instr.operands {
        Operands::Literal(k) => Some(k),
        _ => None,
    }
}

pub(super) fn execute(
    op: LiteralOp,
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    let k = literal(instr).ok_or_else(|| operand_mismatch(instr))?;
    let w = ctx.registers.w();

    let (result, flags) = match op {
        LiteralOp::Add => flags::add(w, k, ctx.carry_polarity),
        LiteralOp::And => (w & k, FlagsUpdate::zero(w & k)),
        LiteralOp::InclusiveOr => (w | k, FlagsUpdate::zero(w | k)),
        LiteralOp::Move => (k, FlagsUpdate::NONE),
        LiteralOp::Subtract => flags::subtract(k, w),
        LiteralOp::ExclusiveOr => (w ^ k, FlagsUpdate::zero(w ^ k)),
    };

    exec.w = Some(result);
    exec.flags = flags;
    Ok(())
}

/// Loads W with the literal and returns through the call stack.
pub(super) fn execute_retlw(
    instr: &Instruction,
    ctx: &ExecContext<'_>,
    exec: &mut ExecuteState,
) -> Result<(), SimError> {
    let k = literal(instr).ok_or_else(|| operand_mismatch(instr))?;
    exec.next_pc = ctx.stack.top()?;
    exec.stack = StackEffect::Pop;
    exec.w = Some(k);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{execute_instruction, CarryPolarity, ExecContext, FlagsUpdate};
    use crate::decoder::{Decoder, Instruction, Operands};
    use crate::encoding::Opcode;
    use crate::fault::SimError;
    use crate::memory::{CallStack, DataMemory, Eeprom, ProgramMemory};
    use crate::state::RegisterFile;

    struct Fixture {
        registers: RegisterFile,
        program: ProgramMemory,
        data: DataMemory,
        stack: CallStack,
        eeprom: Eeprom,
    }

    impl Fixture {
        fn new(w: u8) -> Self {
            let fixture = Self {
                registers: RegisterFile::new(),
                program: ProgramMemory::new(4),
                data: DataMemory::new(),
                stack: CallStack::new(),
                eeprom: Eeprom::new(4),
            };
            fixture.registers.set_w(w);
            fixture
        }

        fn ctx(&self, carry_polarity: CarryPolarity) -> ExecContext<'_> {
            ExecContext {
                registers: &self.registers,
                program: &self.program,
                data: &self.data,
                stack: &self.stack,
                eeprom: &self.eeprom,
                carry_polarity,
            }
        }
    }

    #[test]
    fn sublw_computes_literal_minus_w() {
        let fixture = Fixture::new(0x1D);
        let instr = Decoder::decode(0x3C3D).unwrap();
        let exec =
            execute_instruction(&instr, &fixture.ctx(CarryPolarity::default()), 1).unwrap();
        assert_eq!(exec.w, Some(0x20));
        assert_eq!(
            exec.flags,
            FlagsUpdate {
                zero: Some(false),
                carry: Some(true),
                digit_carry: Some(true),
            }
        );
    }

    #[test]
    fn addlw_carry_depends_on_polarity() {
        let fixture = Fixture::new(0x00);
        let instr = Decoder::decode(0x3E25).unwrap();
        let standard =
            execute_instruction(&instr, &fixture.ctx(CarryPolarity::CarryOnOverflow), 1).unwrap();
        let inverted =
            execute_instruction(&instr, &fixture.ctx(CarryPolarity::CarryOnNoOverflow), 1)
                .unwrap();
        assert_eq!(standard.w, Some(0x25));
        assert_eq!(standard.flags.carry, Some(false));
        assert_eq!(inverted.flags.carry, Some(true));
    }

    #[test]
    fn movlw_leaves_flags_alone() {
        let fixture = Fixture::new(0x00);
        let instr = Decoder::decode(0x3000).unwrap();
        let exec =
            execute_instruction(&instr, &fixture.ctx(CarryPolarity::default()), 1).unwrap();
        assert_eq!(exec.w, Some(0x00));
        assert!(exec.flags.is_empty());
    }

    #[test]
    fn retlw_needs_a_return_address() {
        let fixture = Fixture::new(0x00);
        let instr = Decoder::decode(0x3442).unwrap();
        assert_eq!(
            execute_instruction(&instr, &fixture.ctx(CarryPolarity::default()), 1),
            Err(SimError::StackUnderflow)
        );

        fixture.stack.push(0x0123).unwrap();
        let exec =
            execute_instruction(&instr, &fixture.ctx(CarryPolarity::default()), 1).unwrap();
        assert_eq!((exec.next_pc, exec.w, exec.cycles), (0x0123, Some(0x42), 2));
    }

    #[test]
    fn mismatched_operands_are_rejected() {
        let fixture = Fixture::new(0x00);
        let instr = Instruction::new(Opcode::Movlw, Operands::Target(0x12));
        assert!(matches!(
            execute_instruction(&instr, &fixture.ctx(CarryPolarity::default()), 1),
            Err(SimError::Decode { .. })
        ));
    }
}
