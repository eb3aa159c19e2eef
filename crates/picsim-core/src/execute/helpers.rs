//! Operand resolution and SFR side effects shared by the execution units.

use tracing::debug;

use super::ExecContext;
use crate::decoder::JUMP_TARGET_MASK;
use crate::fault::SimError;
use crate::memory::sfr::{
    bit_is_set, with_bit, EECON1_EEIF, EECON1_RD, EECON1_WR, EECON1_WREN, STATUS_IRP, STATUS_RP0,
};
use crate::memory::{Bank, DataLocation, DataMemory, Sfr};

/// Reads one STATUS bit.
#[must_use]
pub fn status_bit(data: &DataMemory, bit: u8) -> bool {
    bit_is_set(data.sfr(Sfr::Status), bit)
}

/// Resolves a 7-bit file operand to a bank-qualified cell.
///
/// Operand 0 is indirect: the address is `FSR[6:0]` in the bank chosen by
/// `IRP`. Any other operand is direct in the bank chosen by `RP0`.
#[must_use]
pub fn resolve_file(data: &DataMemory, file: u8) -> DataLocation {
    if file & 0x7F == 0 {
        let address = data.sfr(Sfr::Fsr) & 0x7F;
        DataLocation::new(Bank::from_select_bit(status_bit(data, STATUS_IRP)), address)
    } else {
        DataLocation::new(
            Bank::from_select_bit(status_bit(data, STATUS_RP0)),
            file & 0x7F,
        )
    }
}

/// `CALL`/`GOTO` destination: `PCLATH[4:3]` as address bits 12..11 over the
/// 11-bit immediate.
#[must_use]
pub fn jump_target(data: &DataMemory, immediate: u16) -> u16 {
    let page = u16::from(data.sfr(Sfr::Pclath) & 0x18) << 8;
    page | (immediate & JUMP_TARGET_MASK)
}

/// PC after an instruction writes PCL: `PCLATH[4:0]` over the written byte.
#[must_use]
pub fn computed_pc(data: &DataMemory, pcl: u8) -> u16 {
    (u16::from(data.sfr(Sfr::Pclath) & 0x1F) << 8) | u16::from(pcl)
}

/// Runs the EEPROM transfer requested by the control bits in EECON1.
///
/// # Errors
///
/// Returns [`SimError::AddressOutOfBounds`] when EEADR is past the end of the
/// EEPROM; the request bit stays set in that case.
pub fn service_eeprom_request(ctx: &ExecContext<'_>) -> Result<(), SimError> {
    let address = usize::from(ctx.data.sfr(Sfr::Eeadr));

    let control = ctx.data.sfr(Sfr::Eecon1);
    if bit_is_set(control, EECON1_RD) {
        let value = ctx.eeprom.get(address)?;
        ctx.data.set_sfr(Sfr::Eedata, value);
        ctx.data
            .set_sfr(Sfr::Eecon1, with_bit(control, EECON1_RD, false));
        debug!(address, value, "eeprom read");
    }

    let control = ctx.data.sfr(Sfr::Eecon1);
    if bit_is_set(control, EECON1_WR) {
        let mut next = with_bit(control, EECON1_WR, false);
        if bit_is_set(control, EECON1_WREN) {
            let value = ctx.data.sfr(Sfr::Eedata);
            ctx.eeprom.set(address, value)?;
            next = with_bit(next, EECON1_EEIF, true);
            debug!(address, value, "eeprom write");
        } else {
            debug!(address, "eeprom write ignored without WREN");
        }
        ctx.data.set_sfr(Sfr::Eecon1, next);
    }

    Ok(())
}
