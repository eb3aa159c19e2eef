//! Assembler-style text for decoded instructions.

use std::fmt;

use crate::decoder::{Destination, Instruction, Operands};

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::W => f.write_str("W"),
            Self::File => f.write_str("F"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode.mnemonic();
        match self.operands {
            Operands::None => f.write_str(mnemonic),
            Operands::FileDest { file, dest } => write!(f, "{mnemonic} {file:#04x}, {dest}"),
            Operands::File { file } => write!(f, "{mnemonic} {file:#04x}"),
            Operands::FileBit { file, bit } => write!(f, "{mnemonic} {file:#04x}, {bit}"),
            Operands::Literal(literal) => write!(f, "{mnemonic} {literal:#04x}"),
            Operands::Target(target) => write!(f, "{mnemonic} {target:#05x}"),
        }
    }
}

/// Disassembles a raw word, falling back to a data directive for illegal encodings.
#[must_use]
pub fn disassemble_word(word: u16) -> String {
    crate::Decoder::decode(word).map_or_else(|_| format!("DW {word:#06x}"), |i| i.to_string())
}
