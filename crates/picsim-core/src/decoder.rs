//! Instruction decoder for the 14-bit instruction set.
//!
//! Decoding selects a family from the top two bits, finds the opcode by
//! progressively narrower masks, then extracts operands at fixed offsets.

use crate::encoding::{classify_word, Opcode, OpcodeFamily, OperandLayout};
use crate::fault::SimError;

const FILE_MASK: u16 = 0x007F;
const DEST_BIT: u16 = 7;
const BIT_INDEX_SHIFT: u16 = 7;
const LITERAL_MASK: u16 = 0x00FF;
/// Mask of the 11-bit immediate carried by `CALL`/`GOTO`.
pub const JUMP_TARGET_MASK: u16 = 0x07FF;

/// Where a byte-oriented result is stored (the `d` bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Destination {
    /// `d = 0`: result goes to the working register.
    W,
    /// `d = 1`: result goes back to the file register.
    File,
}

impl Destination {
    /// Decodes the `d` bit.
    #[must_use]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Self::File
        } else {
            Self::W
        }
    }

    /// Encodes back to the `d` bit.
    #[must_use]
    pub const fn bit(self) -> u16 {
        match self {
            Self::W => 0,
            Self::File => 1,
        }
    }
}

/// Operands extracted from an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operands {
    /// No operands.
    None,
    /// File register address and destination select.
    FileDest {
        /// 7-bit file address; 0 selects indirect addressing.
        file: u8,
        /// Destination select.
        dest: Destination,
    },
    /// File register address only.
    File {
        /// 7-bit file address; 0 selects indirect addressing.
        file: u8,
    },
    /// File register address and bit index.
    FileBit {
        /// 7-bit file address; 0 selects indirect addressing.
        file: u8,
        /// Bit index `0..=7`.
        bit: u8,
    },
    /// 8-bit literal.
    Literal(u8),
    /// 11-bit jump target.
    Target(u16),
}

/// Decoded instruction: opcode tag plus its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    /// Opcode tag.
    pub opcode: Opcode,
    /// Operands in the opcode's layout.
    pub operands: Operands,
}

impl Instruction {
    /// Builds an instruction from its parts.
    #[must_use]
    pub const fn new(opcode: Opcode, operands: Operands) -> Self {
        Self { opcode, operands }
    }

    /// Family of the opcode.
    #[must_use]
    pub const fn family(&self) -> OpcodeFamily {
        self.opcode.family()
    }

    /// Re-encodes this instruction to a 14-bit word.
    ///
    /// Operand values are masked to their field widths.
    #[must_use]
    pub fn encode(&self) -> u16 {
        let base = self.opcode.base_word();
        let operand_bits = match self.operands {
            Operands::None => 0,
            Operands::FileDest { file, dest } => {
                (dest.bit() << DEST_BIT) | (u16::from(file) & FILE_MASK)
            }
            Operands::File { file } => u16::from(file) & FILE_MASK,
            Operands::FileBit { file, bit } => {
                ((u16::from(bit) & 0x7) << BIT_INDEX_SHIFT) | (u16::from(file) & FILE_MASK)
            }
            Operands::Literal(literal) => u16::from(literal),
            Operands::Target(target) => target & JUMP_TARGET_MASK,
        };
        base | operand_bits
    }
}

/// Instruction decoder. Stateless; every call produces a fresh [`Instruction`].
pub struct Decoder;

impl Decoder {
    /// Decodes a raw 14-bit word.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Decode`] when no opcode matches the word, including
    /// any word with bits above bit 13 set.
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(word: u16) -> Result<Instruction, SimError> {
        let opcode = classify_word(word).ok_or(SimError::Decode { word })?;

        let file = (word & FILE_MASK) as u8;
        let operands = match opcode.layout() {
            OperandLayout::None => Operands::None,
            OperandLayout::FileDest => Operands::FileDest {
                file,
                dest: Destination::from_bit((word >> DEST_BIT) & 1 == 1),
            },
            OperandLayout::File => Operands::File { file },
            OperandLayout::FileBit => Operands::FileBit {
                file,
                bit: ((word >> BIT_INDEX_SHIFT) & 0x7) as u8,
            },
            OperandLayout::Literal => Operands::Literal((word & LITERAL_MASK) as u8),
            OperandLayout::Target => Operands::Target(word & JUMP_TARGET_MASK),
        };

        Ok(Instruction { opcode, operands })
    }
}
