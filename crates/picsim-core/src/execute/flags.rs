//! STATUS flag computation for arithmetic and logic results.

use crate::memory::sfr::{with_bit, STATUS_C, STATUS_DC, STATUS_Z};

/// Meaning of the carry flag after an addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CarryPolarity {
    /// `C` is set when the unsigned sum exceeds `0xFF` (carry out).
    #[default]
    CarryOnOverflow,
    /// `C` is set when the unsigned sum stays within `0xFF`.
    CarryOnNoOverflow,
}

/// Describes how STATUS flags change after an instruction.
///
/// `None` leaves a flag untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagsUpdate {
    /// Zero flag.
    pub zero: Option<bool>,
    /// Carry flag.
    pub carry: Option<bool>,
    /// Digit carry flag.
    pub digit_carry: Option<bool>,
}

impl FlagsUpdate {
    /// No flag changes.
    pub const NONE: Self = Self {
        zero: None,
        carry: None,
        digit_carry: None,
    };

    /// Updates Z from `result` only.
    #[must_use]
    pub const fn zero(result: u8) -> Self {
        Self {
            zero: Some(result == 0),
            carry: None,
            digit_carry: None,
        }
    }

    /// Updates C only.
    #[must_use]
    pub const fn carry(carry: bool) -> Self {
        Self {
            zero: None,
            carry: Some(carry),
            digit_carry: None,
        }
    }

    /// Returns `true` when no flag changes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.zero.is_none() && self.carry.is_none() && self.digit_carry.is_none()
    }

    /// Applies the update to a STATUS value.
    #[must_use]
    pub const fn apply(self, status: u8) -> u8 {
        let mut status = status;
        if let Some(zero) = self.zero {
            status = with_bit(status, STATUS_Z, zero);
        }
        if let Some(carry) = self.carry {
            status = with_bit(status, STATUS_C, carry);
        }
        if let Some(digit_carry) = self.digit_carry {
            status = with_bit(status, STATUS_DC, digit_carry);
        }
        status
    }
}

/// 8-bit addition with Z, C and DC.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn add(a: u8, b: u8, polarity: CarryPolarity) -> (u8, FlagsUpdate) {
    let sum = a as u16 + b as u16;
    let overflow = sum > 0xFF;
    let result = sum as u8;
    let carry = match polarity {
        CarryPolarity::CarryOnOverflow => overflow,
        CarryPolarity::CarryOnNoOverflow => !overflow,
    };
    (
        result,
        FlagsUpdate {
            zero: Some(result == 0),
            carry: Some(carry),
            digit_carry: Some((a & 0x0F) + (b & 0x0F) > 0x0F),
        },
    )
}

/// 8-bit `minuend - subtrahend` with Z, C (no borrow) and DC (no nibble borrow).
#[must_use]
pub const fn subtract(minuend: u8, subtrahend: u8) -> (u8, FlagsUpdate) {
    let result = minuend.wrapping_sub(subtrahend);
    (
        result,
        FlagsUpdate {
            zero: Some(result == 0),
            carry: Some(minuend >= subtrahend),
            digit_carry: Some((minuend & 0x0F) >= (subtrahend & 0x0F)),
        },
    )
}
