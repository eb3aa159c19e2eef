use crate::encoding::Opcode;

/// Cycle-cost categories used by the deterministic timing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// Any instruction that falls through to the next word.
    Sequential,
    /// Instruction that loads PC from an immediate or the call stack.
    ProgramBranch,
    /// Conditional-skip instruction whose skip was taken.
    SkipTaken,
}

/// Instruction cycle costs for each category.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u8)] = &[
    (CycleCostKind::Sequential, 1),
    (CycleCostKind::ProgramBranch, 2),
    (CycleCostKind::SkipTaken, 2),
];

/// Looks up the fixed cycle cost for a category.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u8> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}

/// Category of an instruction before any skip is evaluated.
#[must_use]
pub const fn base_cost_kind(opcode: Opcode) -> CycleCostKind {
    match opcode {
        Opcode::Call | Opcode::Goto | Opcode::Return | Opcode::Retlw | Opcode::Retfie => {
            CycleCostKind::ProgramBranch
        }
        _ => CycleCostKind::Sequential,
    }
}
