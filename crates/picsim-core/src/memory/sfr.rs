//! Special-function register addresses and bit layouts.

use super::data::Bank;

/// STATUS carry / not-borrow bit.
pub const STATUS_C: u8 = 0;
/// STATUS digit carry / not-digit-borrow bit.
pub const STATUS_DC: u8 = 1;
/// STATUS zero bit.
pub const STATUS_Z: u8 = 2;
/// STATUS power-down bit.
pub const STATUS_PD: u8 = 3;
/// STATUS time-out bit.
pub const STATUS_TO: u8 = 4;
/// STATUS direct-addressing bank select bit.
pub const STATUS_RP0: u8 = 5;
/// STATUS indirect-addressing bank select bit.
pub const STATUS_IRP: u8 = 7;

/// EECON1 read control bit.
pub const EECON1_RD: u8 = 0;
/// EECON1 write control bit.
pub const EECON1_WR: u8 = 1;
/// EECON1 write enable bit.
pub const EECON1_WREN: u8 = 2;
/// EECON1 write-complete interrupt flag.
pub const EECON1_EEIF: u8 = 4;

/// Power-on STATUS value (`TO`, `PD` and `Z` set).
pub const STATUS_POWER_ON: u8 = 0b0001_1100;
/// Power-on OPTION value.
pub const OPTION_POWER_ON: u8 = 0xFF;
/// Power-on TRISA value (five implemented port A pins, all inputs).
pub const TRISA_POWER_ON: u8 = 0b0001_1111;
/// Power-on TRISB value.
pub const TRISB_POWER_ON: u8 = 0xFF;

/// Highest SFR address; everything above is general purpose.
pub const SFR_LAST_ADDRESS: u8 = 0x0B;

/// Special-function registers with their static bank assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Sfr {
    /// Indirect data register (mapped, 0x00).
    Indf,
    /// Timer 0 counter (bank 0, 0x01).
    Tmr0,
    /// Program counter low byte (mapped, 0x02).
    Pcl,
    /// Status register (mapped, 0x03).
    Status,
    /// Indirect address pointer (mapped, 0x04).
    Fsr,
    /// Port A latch (bank 0, 0x05).
    Porta,
    /// Port B latch (bank 0, 0x06).
    Portb,
    /// EEPROM data register (bank 0, 0x08).
    Eedata,
    /// EEPROM address register (bank 0, 0x09).
    Eeadr,
    /// Program counter latch for bits 12..8 (mapped, 0x0A).
    Pclath,
    /// Interrupt control (mapped, 0x0B).
    Intcon,
    /// Option register (bank 1, 0x01).
    Option,
    /// Port A direction (bank 1, 0x05).
    Trisa,
    /// Port B direction (bank 1, 0x06).
    Trisb,
    /// EEPROM control 1 (bank 1, 0x08).
    Eecon1,
    /// EEPROM control 2 (bank 1, 0x09).
    Eecon2,
}

impl Sfr {
    /// Every SFR, bank 0 view first.
    pub const ALL: [Self; 16] = [
        Self::Indf,
        Self::Tmr0,
        Self::Pcl,
        Self::Status,
        Self::Fsr,
        Self::Porta,
        Self::Portb,
        Self::Eedata,
        Self::Eeadr,
        Self::Pclath,
        Self::Intcon,
        Self::Option,
        Self::Trisa,
        Self::Trisb,
        Self::Eecon1,
        Self::Eecon2,
    ];

    /// Address within its bank.
    #[must_use]
    pub const fn address(self) -> u8 {
        match self {
            Self::Indf => 0x00,
            Self::Tmr0 | Self::Option => 0x01,
            Self::Pcl => 0x02,
            Self::Status => 0x03,
            Self::Fsr => 0x04,
            Self::Porta | Self::Trisa => 0x05,
            Self::Portb | Self::Trisb => 0x06,
            Self::Eedata | Self::Eecon1 => 0x08,
            Self::Eeadr | Self::Eecon2 => 0x09,
            Self::Pclath => 0x0A,
            Self::Intcon => 0x0B,
        }
    }

    /// Bank the register is reached through. Mapped registers report bank 0.
    #[must_use]
    pub const fn bank(self) -> Bank {
        match self {
            Self::Option | Self::Trisa | Self::Trisb | Self::Eecon1 | Self::Eecon2 => Bank::Bank1,
            _ => Bank::Bank0,
        }
    }

    /// `true` when both banks share one storage cell for this register.
    #[must_use]
    pub const fn is_mapped(self) -> bool {
        is_mapped_address(self.address())
    }

    /// Resolves a bank-qualified address back to its SFR.
    #[must_use]
    pub const fn from_location(bank: Bank, address: u8) -> Option<Self> {
        match (bank, address) {
            (_, 0x00) => Some(Self::Indf),
            (Bank::Bank0, 0x01) => Some(Self::Tmr0),
            (Bank::Bank1, 0x01) => Some(Self::Option),
            (_, 0x02) => Some(Self::Pcl),
            (_, 0x03) => Some(Self::Status),
            (_, 0x04) => Some(Self::Fsr),
            (Bank::Bank0, 0x05) => Some(Self::Porta),
            (Bank::Bank1, 0x05) => Some(Self::Trisa),
            (Bank::Bank0, 0x06) => Some(Self::Portb),
            (Bank::Bank1, 0x06) => Some(Self::Trisb),
            (Bank::Bank0, 0x08) => Some(Self::Eedata),
            (Bank::Bank1, 0x08) => Some(Self::Eecon1),
            (Bank::Bank0, 0x09) => Some(Self::Eeadr),
            (Bank::Bank1, 0x09) => Some(Self::Eecon2),
            (_, 0x0A) => Some(Self::Pclath),
            (_, 0x0B) => Some(Self::Intcon),
            _ => None,
        }
    }

    /// Value loaded by a power-on reset.
    #[must_use]
    pub const fn power_on_value(self) -> u8 {
        match self {
            Self::Status => STATUS_POWER_ON,
            Self::Option => OPTION_POWER_ON,
            Self::Trisa => TRISA_POWER_ON,
            Self::Trisb => TRISB_POWER_ON,
            _ => 0,
        }
    }
}

/// `true` for SFR addresses whose storage is shared between banks.
#[must_use]
pub const fn is_mapped_address(address: u8) -> bool {
    matches!(address, 0x00 | 0x02 | 0x03 | 0x04 | 0x0A | 0x0B)
}

/// Tests bit `bit` of `value`.
#[must_use]
pub const fn bit_is_set(value: u8, bit: u8) -> bool {
    (value >> (bit & 0x7)) & 1 == 1
}

/// Returns `value` with bit `bit` set or cleared.
#[must_use]
pub const fn with_bit(value: u8, bit: u8, enabled: bool) -> u8 {
    let mask = 1 << (bit & 0x7);
    if enabled {
        value | mask
    } else {
        value & !mask
    }
}
