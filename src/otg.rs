//! Controller handle and bring-up orchestration.

use alloc::sync::Arc;
use core::ptr::NonNull;

use bitflags::bitflags;
use log::{debug, info};

use crate::consts::FLUSH_ALL_TX_FIFOS;
use crate::err::Result;
use crate::phy::{self, PhyCapability};
use crate::reg::Dwc2Regs;

/// Platform glue around one controller, implemented per MCU/board.
///
/// Covers what the bring-up sequence cannot know by itself: transceiver
/// strap/clock wiring before the core reset, PHY tuning after it, and where
/// the endpoint-info area of the shared FIFO RAM starts.
pub trait PlatformOp: Send + Sync + 'static {
    /// Board wiring/strap/clock setup that must precede the core reset.
    fn phy_pre_reset(&self, rhport: u8, cap: PhyCapability);

    /// PHY tuning (drive strength, squelch) once the reset pulse completed.
    fn phy_post_reset(&self, rhport: u8, cap: PhyCapability);

    /// First FIFO word reserved for endpoint info. DMA mode only.
    fn dma_fifo_base(&self, rhport: u8) -> u16;
}

/// Link speed requested for a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Full,
    High,
}

/// Which side of the bus the port plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Device,
    Host,
}

bitflags! {
    /// Erratum exemptions for specific silicon.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Quirks: u32 {
        /// GSNPSID and the GHWCFG words read all-zero (seen on GD32VF103);
        /// the identity check is skipped on such parts.
        const ZERO_SNPSID = 1 << 0;
    }
}

/// One DWC2 OTG controller port.
pub struct Dwc2 {
    regs: Dwc2Regs,
    rhport: u8,
    quirks: Quirks,
    platform: Arc<dyn PlatformOp>,
}

impl Dwc2 {
    /// `ctrl` is the mapped base of the port's global CSR block; aliasing it
    /// with another handle breaks the exclusivity the `&mut` methods rely on.
    pub fn new(ctrl: NonNull<u8>, rhport: u8, quirks: Quirks, platform: impl PlatformOp) -> Self {
        Self {
            regs: unsafe { Dwc2Regs::new(ctrl) },
            rhport,
            quirks,
            platform: Arc::new(platform),
        }
    }

    /// Registers of this port, for the transfer layer stacked on top.
    pub fn regs_mut(&mut self) -> &mut Dwc2Regs {
        &mut self.regs
    }

    /// Whether high speed should be requested for `role` on this port.
    ///
    /// Couples the role-specific `high-speed-*` crate features with the
    /// transceiver the capability word reports.
    pub fn is_highspeed_requested(&self, role: Role) -> bool {
        match role {
            Role::Device if !cfg!(feature = "high-speed-device") => false,
            Role::Host if !cfg!(feature = "high-speed-host") => false,
            _ => PhyCapability::read(&self.regs) != PhyCapability::NotSupported,
        }
    }

    /// Bring the core to a configured, quiescent state.
    ///
    /// Identity check, PHY configuration (which soft-resets the core), FIFO
    /// flush, interrupt clearing and DMA-or-slave selection, in that order.
    ///
    /// On [`UnknownCoreId`](crate::Dwc2Error::UnknownCoreId) nothing has been
    /// written yet and the call may be retried once the controller clock is
    /// up. DMA mode latches at reset time only; switching it afterwards
    /// means running the whole sequence again.
    pub fn core_init(&mut self, speed: Speed, dma: bool) -> Result {
        self.regs.check_core_id(self.quirks)?;

        info!(
            "DWC2: init port {} rev {:#06x} {:?} dma={}",
            self.rhport,
            self.regs.core_revision(),
            speed,
            dma
        );

        match speed {
            Speed::High => {
                phy::configure_highspeed(&mut self.regs, self.rhport, self.platform.as_ref())?
            }
            Speed::Full => {
                phy::configure_fullspeed(&mut self.regs, self.rhport, self.platform.as_ref())?
            }
        }

        self.regs.max_timeout_calibration();
        self.regs.ungate_phy_clock();

        self.regs.flush_tx_fifo(FLUSH_ALL_TX_FIFOS)?;
        self.regs.flush_rx_fifo()?;

        self.regs.clear_pending_interrupts();

        if dma {
            let epinfo_base = self.platform.dma_fifo_base(self.rhport);
            debug!("DWC2: dma on, epinfo base {epinfo_base:#06x}");
            self.regs.enable_dma(epinfo_base);
        } else {
            self.regs.unmask_rx_fifo_level();
        }

        self.regs.set_tx_fifo_empty_level();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quirks_default_empty() {
        assert_eq!(Quirks::default(), Quirks::empty());
        assert!(!Quirks::empty().contains(Quirks::ZERO_SNPSID));
        assert!(Quirks::ZERO_SNPSID.contains(Quirks::ZERO_SNPSID));
    }
}
