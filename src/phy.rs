//! PHY transceiver selection.
//!
//! Two invariants hold for both entry points: the PHY type is selected in
//! GUSBCFG before the core soft reset, and the turnaround field is
//! reprogrammed after it, because the reset pulse clears it.

use log::debug;
use num_enum::FromPrimitive;
use tock_registers::fields::FieldValue;
use tock_registers::interfaces::{ReadWriteable, Readable};

use crate::consts::{TRDT_FULLSPEED, TRDT_HS_8BIT, TRDT_HS_16BIT};
use crate::err::Result;
use crate::otg::PlatformOp;
use crate::reg::{Dwc2Regs, GHWCFG2, GUSBCFG};

/// Highspeed transceiver wired to the core, per GHWCFG2.
///
/// Decoded once at bring-up; fixed for the lifetime of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum PhyCapability {
    /// Fullspeed dedicated transceiver only.
    #[num_enum(default)]
    NotSupported = 0,
    /// On-die UTMI+ transceiver.
    Utmi = 1,
    /// External ULPI transceiver.
    Ulpi = 2,
    /// Both UTMI+ and ULPI wired up.
    UtmiUlpi = 3,
}

impl PhyCapability {
    pub(crate) fn read(regs: &Dwc2Regs) -> Self {
        Self::from(regs.global().ghwcfg2.read(GHWCFG2::HSPHY_TYPE) as u8)
    }
}

/// GUSBCFG changes selecting the highspeed transceiver path.
fn highspeed_phy_fields(cap: PhyCapability, sixteen_bit: bool) -> FieldValue<u32, GUSBCFG::Register> {
    match cap {
        PhyCapability::Ulpi => {
            // External ULPI is always 8-bit, single data rate, with the
            // internal VBUS indicator/drive defaults and neither FS/LS
            // serial mode nor clock suspend.
            GUSBCFG::PHYSEL::CLEAR
                + GUSBCFG::ULPI_UTMI_SEL::SET
                + GUSBCFG::PHYIF16::CLEAR
                + GUSBCFG::DDRSEL::CLEAR
                + GUSBCFG::ULPIEVBUSD::CLEAR
                + GUSBCFG::ULPIEVBUSI::CLEAR
                + GUSBCFG::ULPIFSLS::CLEAR
                + GUSBCFG::ULPICSM::CLEAR
        }
        _ if sixteen_bit => {
            GUSBCFG::PHYSEL::CLEAR + GUSBCFG::ULPI_UTMI_SEL::CLEAR + GUSBCFG::PHYIF16::SET
        }
        _ => GUSBCFG::PHYSEL::CLEAR + GUSBCFG::ULPI_UTMI_SEL::CLEAR + GUSBCFG::PHYIF16::CLEAR,
    }
}

/// Fullspeed bring-up through the dedicated FS transceiver.
pub(crate) fn configure_fullspeed(
    regs: &mut Dwc2Regs,
    rhport: u8,
    platform: &dyn PlatformOp,
) -> Result {
    debug!("DWC2: fullspeed PHY init");

    regs.global().gusbcfg.modify(GUSBCFG::PHYSEL::SET);
    let selected = regs.read_gusbcfg();

    platform.phy_pre_reset(rhport, PhyCapability::NotSupported);

    regs.core_soft_reset()?;

    // Reset cleared GUSBCFG; restore the selection, then the turnaround.
    regs.write_gusbcfg(selected);
    regs.global()
        .gusbcfg
        .modify(GUSBCFG::TRDT.val(TRDT_FULLSPEED));

    platform.phy_post_reset(rhport, PhyCapability::NotSupported);
    Ok(())
}

/// Highspeed bring-up through whichever transceiver GHWCFG2 reports.
pub(crate) fn configure_highspeed(
    regs: &mut Dwc2Regs,
    rhport: u8,
    platform: &dyn PlatformOp,
) -> Result {
    let cap = PhyCapability::read(regs);
    let sixteen_bit = regs.supports_16bit_phy();

    match cap {
        PhyCapability::Ulpi => debug!("DWC2: highspeed ULPI PHY init"),
        _ => debug!("DWC2: highspeed UTMI+ PHY init"),
    }

    regs.global()
        .gusbcfg
        .modify(highspeed_phy_fields(cap, sixteen_bit));
    let selected = regs.read_gusbcfg();

    platform.phy_pre_reset(rhport, cap);

    regs.core_soft_reset()?;

    let trdt = if sixteen_bit {
        TRDT_HS_16BIT
    } else {
        TRDT_HS_8BIT
    };
    regs.write_gusbcfg(selected);
    regs.global().gusbcfg.modify(GUSBCFG::TRDT.val(trdt));

    platform.phy_post_reset(rhport, cap);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tock_registers::registers::InMemoryRegister;

    const PHYIF16: u32 = 1 << 3;
    const ULPI_UTMI_SEL: u32 = 1 << 4;
    const PHYSEL: u32 = 1 << 6;
    const DDRSEL: u32 = 1 << 7;
    const ULPIFSLS: u32 = 1 << 17;
    const ULPICSM: u32 = 1 << 19;
    const ULPIEVBUSD: u32 = 1 << 20;
    const ULPIEVBUSI: u32 = 1 << 21;

    #[test]
    fn capability_decode_is_total() {
        assert_eq!(PhyCapability::from(0u8), PhyCapability::NotSupported);
        assert_eq!(PhyCapability::from(1u8), PhyCapability::Utmi);
        assert_eq!(PhyCapability::from(2u8), PhyCapability::Ulpi);
        assert_eq!(PhyCapability::from(3u8), PhyCapability::UtmiUlpi);
        // Out-of-range raw values degrade to the fullspeed-only path.
        assert_eq!(PhyCapability::from(7u8), PhyCapability::NotSupported);
    }

    #[test]
    fn ulpi_forces_8bit_single_data_rate() {
        let start =
            PHYSEL | PHYIF16 | DDRSEL | ULPIFSLS | ULPICSM | ULPIEVBUSD | ULPIEVBUSI;
        let reg: InMemoryRegister<u32, GUSBCFG::Register> = InMemoryRegister::new(start);

        reg.modify(highspeed_phy_fields(PhyCapability::Ulpi, false));

        assert_eq!(reg.get() & ULPI_UTMI_SEL, ULPI_UTMI_SEL);
        assert_eq!(
            reg.get() & (PHYSEL | PHYIF16 | DDRSEL | ULPIFSLS | ULPICSM | ULPIEVBUSD | ULPIEVBUSI),
            0
        );
    }

    #[test]
    fn utmi_width_follows_capability_word() {
        let reg: InMemoryRegister<u32, GUSBCFG::Register> =
            InMemoryRegister::new(PHYSEL | ULPI_UTMI_SEL);

        reg.modify(highspeed_phy_fields(PhyCapability::Utmi, true));
        assert_eq!(reg.get(), PHYIF16);

        reg.modify(highspeed_phy_fields(PhyCapability::Utmi, false));
        assert_eq!(reg.get(), 0);
    }

    #[test]
    fn utmi_ulpi_combo_takes_internal_path() {
        let reg: InMemoryRegister<u32, GUSBCFG::Register> =
            InMemoryRegister::new(ULPI_UTMI_SEL);

        reg.modify(highspeed_phy_fields(PhyCapability::UtmiUlpi, true));
        assert_eq!(reg.get(), PHYIF16);
    }

    #[test]
    fn turnaround_values_are_fixed() {
        // Certification-driven; not tunable.
        assert_eq!(TRDT_FULLSPEED, 5);
        assert_eq!(TRDT_HS_16BIT, 5);
        assert_eq!(TRDT_HS_8BIT, 9);
    }
}
