/// Mask of the 14 architecturally meaningful bits of an instruction word.
pub const WORD_MASK: u16 = 0x3FFF;

/// Instruction families selected by the top two bits of a word (bits 13..12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpcodeFamily {
    /// `00`: byte-oriented file register operations and control operations.
    ByteOriented = 0b00,
    /// `01`: bit-oriented file register operations.
    BitOriented = 0b01,
    /// `10`: `CALL` and `GOTO`.
    Jump = 0b10,
    /// `11`: literal operations.
    Literal = 0b11,
}

impl OpcodeFamily {
    /// Returns the family encoded in bits 13..12 of `word`.
    #[must_use]
    pub const fn of_word(word: u16) -> Self {
        match (word >> 12) & 0b11 {
            0b00 => Self::ByteOriented,
            0b01 => Self::BitOriented,
            0b10 => Self::Jump,
            _ => Self::Literal,
        }
    }
}

/// Closed set of mnemonics of the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Opcode {
    Addwf,
    Andwf,
    Clrf,
    Clrw,
    Comf,
    Decf,
    Decfsz,
    Incf,
    Incfsz,
    Iorwf,
    Movf,
    Movwf,
    Nop,
    Rlf,
    Rrf,
    Subwf,
    Swapf,
    Xorwf,
    Bcf,
    Bsf,
    Btfsc,
    Btfss,
    Addlw,
    Andlw,
    Call,
    Clrwdt,
    Goto,
    Iorlw,
    Movlw,
    Retfie,
    Retlw,
    Return,
    Sleep,
    Sublw,
    Xorlw,
}

/// Operand layout of an opcode within the 14-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandLayout {
    /// No operand bits are significant.
    None,
    /// 7-bit file address (bits 6..0) and destination select (bit 7).
    FileDest,
    /// 7-bit file address only.
    File,
    /// 7-bit file address and 3-bit bit index (bits 9..7).
    FileBit,
    /// 8-bit literal (bits 7..0).
    Literal,
    /// 11-bit jump target (bits 10..0).
    Target,
}

impl Opcode {
    /// Upper-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Addwf => "ADDWF",
            Self::Andwf => "ANDWF",
            Self::Clrf => "CLRF",
            Self::Clrw => "CLRW",
            Self::Comf => "COMF",
            Self::Decf => "DECF",
            Self::Decfsz => "DECFSZ",
            Self::Incf => "INCF",
            Self::Incfsz => "INCFSZ",
            Self::Iorwf => "IORWF",
            Self::Movf => "MOVF",
            Self::Movwf => "MOVWF",
            Self::Nop => "NOP",
            Self::Rlf => "RLF",
            Self::Rrf => "RRF",
            Self::Subwf => "SUBWF",
            Self::Swapf => "SWAPF",
            Self::Xorwf => "XORWF",
            Self::Bcf => "BCF",
            Self::Bsf => "BSF",
            Self::Btfsc => "BTFSC",
            Self::Btfss => "BTFSS",
            Self::Addlw => "ADDLW",
            Self::Andlw => "ANDLW",
            Self::Call => "CALL",
            Self::Clrwdt => "CLRWDT",
            Self::Goto => "GOTO",
            Self::Iorlw => "IORLW",
            Self::Movlw => "MOVLW",
            Self::Retfie => "RETFIE",
            Self::Retlw => "RETLW",
            Self::Return => "RETURN",
            Self::Sleep => "SLEEP",
            Self::Sublw => "SUBLW",
            Self::Xorlw => "XORLW",
        }
    }

    /// Family the opcode is encoded in.
    #[must_use]
    pub const fn family(self) -> OpcodeFamily {
        match self {
            Self::Bcf | Self::Bsf | Self::Btfsc | Self::Btfss => OpcodeFamily::BitOriented,
            Self::Call | Self::Goto => OpcodeFamily::Jump,
            Self::Addlw
            | Self::Andlw
            | Self::Iorlw
            | Self::Movlw
            | Self::Retlw
            | Self::Sublw
            | Self::Xorlw => OpcodeFamily::Literal,
            _ => OpcodeFamily::ByteOriented,
        }
    }

    /// Operand layout for this opcode.
    #[must_use]
    pub const fn layout(self) -> OperandLayout {
        match self {
            Self::Addwf
            | Self::Andwf
            | Self::Comf
            | Self::Decf
            | Self::Decfsz
            | Self::Incf
            | Self::Incfsz
            | Self::Iorwf
            | Self::Movf
            | Self::Rlf
            | Self::Rrf
            | Self::Subwf
            | Self::Swapf
            | Self::Xorwf => OperandLayout::FileDest,
            Self::Clrf | Self::Movwf => OperandLayout::File,
            Self::Bcf | Self::Bsf | Self::Btfsc | Self::Btfss => OperandLayout::FileBit,
            Self::Addlw
            | Self::Andlw
            | Self::Iorlw
            | Self::Movlw
            | Self::Retlw
            | Self::Sublw
            | Self::Xorlw => OperandLayout::Literal,
            Self::Call | Self::Goto => OperandLayout::Target,
            Self::Clrw
            | Self::Nop
            | Self::Clrwdt
            | Self::Retfie
            | Self::Return
            | Self::Sleep => OperandLayout::None,
        }
    }

    /// Canonical encoding with every operand bit cleared.
    #[must_use]
    pub fn base_word(self) -> u16 {
        EXACT_CONTROL_WORDS
            .iter()
            .find_map(|(word, opcode)| (*opcode == self).then_some(*word))
            .or_else(|| {
                OPCODE_TABLE
                    .iter()
                    .find_map(|entry| (entry.opcode == self).then_some(entry.pattern))
            })
            .unwrap_or(0)
    }
}

/// One `(mask, pattern)` row of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    /// Bits of the word that identify the opcode.
    pub mask: u16,
    /// Value of the masked bits.
    pub pattern: u16,
    /// Opcode selected when `word & mask == pattern`.
    pub opcode: Opcode,
}

const fn entry(mask: u16, pattern: u16, opcode: Opcode) -> OpcodeEntry {
    OpcodeEntry {
        mask,
        pattern,
        opcode,
    }
}

/// Full-word control encodings matched before any masked row.
pub const EXACT_CONTROL_WORDS: &[(u16, Opcode)] = &[
    (0x0064, Opcode::Clrwdt),
    (0x0009, Opcode::Retfie),
    (0x0008, Opcode::Return),
    (0x0063, Opcode::Sleep),
];

/// `NOP` is `00 0000 0xx0 0000`.
pub const NOP_MASK: u16 = 0x3F9F;

/// Single source-of-truth opcode table, ordered narrowest mask first per family.
///
/// Any word that matches no row (and no exact control word) is illegal.
pub const OPCODE_TABLE: &[OpcodeEntry] = &[
    // 00: byte-oriented
    entry(NOP_MASK, 0x0000, Opcode::Nop),
    entry(0x3F80, 0x0080, Opcode::Movwf),
    entry(0x3F80, 0x0100, Opcode::Clrw),
    entry(0x3F80, 0x0180, Opcode::Clrf),
    entry(0x3F00, 0x0200, Opcode::Subwf),
    entry(0x3F00, 0x0300, Opcode::Decf),
    entry(0x3F00, 0x0400, Opcode::Iorwf),
    entry(0x3F00, 0x0500, Opcode::Andwf),
    entry(0x3F00, 0x0600, Opcode::Xorwf),
    entry(0x3F00, 0x0700, Opcode::Addwf),
    entry(0x3F00, 0x0800, Opcode::Movf),
    entry(0x3F00, 0x0900, Opcode::Comf),
    entry(0x3F00, 0x0A00, Opcode::Incf),
    entry(0x3F00, 0x0B00, Opcode::Decfsz),
    entry(0x3F00, 0x0C00, Opcode::Rrf),
    entry(0x3F00, 0x0D00, Opcode::Rlf),
    entry(0x3F00, 0x0E00, Opcode::Swapf),
    entry(0x3F00, 0x0F00, Opcode::Incfsz),
    // 01: bit-oriented
    entry(0x3C00, 0x1000, Opcode::Bcf),
    entry(0x3C00, 0x1400, Opcode::Bsf),
    entry(0x3C00, 0x1800, Opcode::Btfsc),
    entry(0x3C00, 0x1C00, Opcode::Btfss),
    // 10: jumps
    entry(0x3800, 0x2000, Opcode::Call),
    entry(0x3800, 0x2800, Opcode::Goto),
    // 11: literal
    entry(0x3F00, 0x3800, Opcode::Iorlw),
    entry(0x3F00, 0x3900, Opcode::Andlw),
    entry(0x3F00, 0x3A00, Opcode::Xorlw),
    entry(0x3E00, 0x3C00, Opcode::Sublw),
    entry(0x3E00, 0x3E00, Opcode::Addlw),
    entry(0x3C00, 0x3000, Opcode::Movlw),
    entry(0x3C00, 0x3400, Opcode::Retlw),
];

/// Returns the opcode for a raw word, or `None` for an illegal encoding.
#[must_use]
pub fn classify_word(word: u16) -> Option<Opcode> {
    if word & !WORD_MASK != 0 {
        return None;
    }

    let family = OpcodeFamily::of_word(word);
    if family == OpcodeFamily::ByteOriented {
        if let Some((_, opcode)) = EXACT_CONTROL_WORDS.iter().find(|(exact, _)| *exact == word) {
            return Some(*opcode);
        }
    }

    OPCODE_TABLE
        .iter()
        .filter(|row| row.opcode.family() == family)
        .find_map(|row| (word & row.mask == row.pattern).then_some(row.opcode))
}
