//! DWC2 global register block.
//!
//! Layout follows the Synopsys global CSR map (GOTGCTL at 0x000 through
//! PCGCCTL at 0xE00). Only the registers the bring-up sequence touches carry
//! bitfield definitions; the rest are plain words kept for layout.

use core::hint::spin_loop;
use core::ptr::NonNull;
use core::sync::atomic::{Ordering, fence};

use log::{debug, warn};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::consts::*;
use crate::err::{Dwc2Error, Result};
use crate::otg::Quirks;

register_bitfields![u32,
    pub GAHBCFG [
        /// Global interrupt enable
        GINT OFFSET(0) NUMBITS(1) [],
        /// AHB burst length
        HBSTLEN OFFSET(1) NUMBITS(4) [
            Single = 0,
            Incr = 1,
            Incr4 = 3,
            Incr8 = 5,
            Incr16 = 7
        ],
        /// Internal DMA enable
        DMAEN OFFSET(5) NUMBITS(1) [],
        /// Tx FIFO empty interrupt trigger level
        TXFELVL OFFSET(7) NUMBITS(1) [
            HalfEmpty = 0,
            Empty = 1
        ],
    ],

    pub GUSBCFG [
        /// HS/FS timeout calibration
        TOCAL OFFSET(0) NUMBITS(3) [],
        /// 16-bit UTMI+ interface
        PHYIF16 OFFSET(3) NUMBITS(1) [],
        /// ULPI (1) or UTMI+ (0) interface select
        ULPI_UTMI_SEL OFFSET(4) NUMBITS(1) [],
        /// Dedicated fullspeed transceiver select
        PHYSEL OFFSET(6) NUMBITS(1) [],
        /// ULPI double data rate select
        DDRSEL OFFSET(7) NUMBITS(1) [],
        /// USB turnaround time, in PHY clocks
        TRDT OFFSET(10) NUMBITS(4) [],
        /// ULPI FS/LS serial mode select
        ULPIFSLS OFFSET(17) NUMBITS(1) [],
        /// ULPI clock suspend mode
        ULPICSM OFFSET(19) NUMBITS(1) [],
        /// ULPI external VBUS drive
        ULPIEVBUSD OFFSET(20) NUMBITS(1) [],
        /// ULPI external VBUS indicator
        ULPIEVBUSI OFFSET(21) NUMBITS(1) [],
    ],

    pub GRSTCTL [
        /// Core soft reset. Self-clearing before 4.20a, write-only after.
        CSRST OFFSET(0) NUMBITS(1) [],
        /// Rx FIFO flush, self-clearing
        RXFFLSH OFFSET(4) NUMBITS(1) [],
        /// Tx FIFO flush, self-clearing
        TXFFLSH OFFSET(5) NUMBITS(1) [],
        /// Tx FIFO number to flush; 0x10 flushes all
        TXFNUM OFFSET(6) NUMBITS(5) [],
        /// Reset-done handshake, write-1-to-clear. 4.20a and later only.
        CSRST_DONE OFFSET(29) NUMBITS(1) [],
        /// AHB master idle
        AHBIDL OFFSET(31) NUMBITS(1) [],
    ],

    pub GINTMSK [
        /// Rx FIFO non-empty
        RXFLVLM OFFSET(4) NUMBITS(1) [],
    ],

    pub GSNPSID [
        /// Core revision, BCD coded
        REVISION OFFSET(0) NUMBITS(16) [],
        /// Core family identity
        ID OFFSET(16) NUMBITS(16) [],
    ],

    pub GHWCFG2 [
        /// Highspeed transceiver wired to the core
        HSPHY_TYPE OFFSET(6) NUMBITS(2) [],
    ],

    pub GHWCFG4 [
        /// UTMI+ data width support; non-zero means 16-bit capable
        PHY_DATA_WIDTH OFFSET(14) NUMBITS(2) [],
    ],

    pub GDFIFOCFG [
        /// Total FIFO RAM depth in words
        GDFIFOCFG OFFSET(0) NUMBITS(16) [],
        /// First FIFO word holding endpoint info (DMA mode)
        EPINFOBASE OFFSET(16) NUMBITS(16) [],
    ],

    pub PCGCCTL [
        /// Stop the PHY clock
        STOPPCLK OFFSET(0) NUMBITS(1) [],
        /// Gate the AHB clock to the core
        GATEHCLK OFFSET(1) NUMBITS(1) [],
        /// Power clamp
        PWRCLMP OFFSET(2) NUMBITS(1) [],
        /// Reset the power-down module
        RSTPDWNMODULE OFFSET(3) NUMBITS(1) [],
    ],
];

register_structs! {
    /// Global CSR map of one DWC2 port.
    pub CoreGlobalRegs {
        (0x000 => pub gotgctl: ReadWrite<u32>),
        (0x004 => pub gotgint: ReadWrite<u32>),
        (0x008 => pub gahbcfg: ReadWrite<u32, GAHBCFG::Register>),
        (0x00C => pub gusbcfg: ReadWrite<u32, GUSBCFG::Register>),
        (0x010 => pub grstctl: ReadWrite<u32, GRSTCTL::Register>),
        (0x014 => pub gintsts: ReadWrite<u32>),
        (0x018 => pub gintmsk: ReadWrite<u32, GINTMSK::Register>),
        (0x01C => pub grxstsr: ReadOnly<u32>),
        (0x020 => pub grxstsp: ReadOnly<u32>),
        (0x024 => pub grxfsiz: ReadWrite<u32>),
        (0x028 => pub gnptxfsiz: ReadWrite<u32>),
        (0x02C => pub gnptxsts: ReadOnly<u32>),
        (0x030 => _reserved0),
        (0x038 => pub ggpio: ReadWrite<u32>),
        (0x03C => pub guid: ReadWrite<u32>),
        (0x040 => pub gsnpsid: ReadOnly<u32, GSNPSID::Register>),
        (0x044 => pub ghwcfg1: ReadOnly<u32>),
        (0x048 => pub ghwcfg2: ReadOnly<u32, GHWCFG2::Register>),
        (0x04C => pub ghwcfg3: ReadOnly<u32>),
        (0x050 => pub ghwcfg4: ReadOnly<u32, GHWCFG4::Register>),
        (0x054 => _reserved1),
        (0x05C => pub gdfifocfg: ReadWrite<u32, GDFIFOCFG::Register>),
        (0x060 => _reserved2),
        (0xE00 => pub pcgcctl: ReadWrite<u32, PCGCCTL::Register>),
        (0xE04 => @END),
    }
}

/// How core soft reset completion is reported, by core generation.
///
/// Decided once per reset from the GSNPSID revision field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetProtocol {
    /// CSRST self-clears once the reset pulse finishes.
    SelfClearing,
    /// CSRST reads back undefined; completion is reported through the
    /// CSRST_DONE bit and CSRST must be cleared by software.
    DoneHandshake,
}

impl ResetProtocol {
    /// 4.20a made CSRST write-only and introduced CSRST_DONE.
    pub fn for_revision(rev: u16) -> Self {
        if rev < CORE_REV_4_20A {
            Self::SelfClearing
        } else {
            Self::DoneHandshake
        }
    }
}

/// Owned accessor for one port's global register block.
///
/// One handle exists per port; everything that writes takes `&mut self`,
/// which is what serializes bring-up against any other use of the port.
pub struct Dwc2Regs {
    base: usize,
}

impl Dwc2Regs {
    /// # Safety
    ///
    /// `base` must point at the global CSR block of a DWC2 core that stays
    /// mapped for the lifetime of the handle, and no other handle may alias
    /// the same port.
    pub unsafe fn new(base: NonNull<u8>) -> Self {
        Self {
            base: base.as_ptr() as usize,
        }
    }

    pub(crate) fn global(&self) -> &'static CoreGlobalRegs {
        unsafe { &*(self.base as *const CoreGlobalRegs) }
    }

    /// Raw GSNPSID word.
    pub fn snpsid(&self) -> u32 {
        self.global().gsnpsid.get()
    }

    /// Core revision, BCD coded (0x430A reads as 4.30a).
    pub fn core_revision(&self) -> u16 {
        self.global().gsnpsid.read(GSNPSID::REVISION) as u16
    }

    /// Whether GHWCFG4 advertises a 16-bit UTMI+ data path.
    pub fn supports_16bit_phy(&self) -> bool {
        self.global().ghwcfg4.read(GHWCFG4::PHY_DATA_WIDTH) != 0
    }

    pub(crate) fn read_gusbcfg(&self) -> u32 {
        self.global().gusbcfg.get()
    }

    pub(crate) fn write_gusbcfg(&mut self, value: u32) {
        self.global().gusbcfg.set(value);
        fence(Ordering::SeqCst);
    }

    /// Check the Synopsys identification register.
    ///
    /// Fails when the id matches no known core family, which on real boards
    /// means the controller clock or power domain is not enabled. Parts
    /// carrying [`Quirks::ZERO_SNPSID`] skip the check: their id and hwcfg
    /// registers read all-zero by erratum.
    pub fn check_core_id(&self, quirks: Quirks) -> Result {
        let g = self.global();
        debug!(
            "DWC2 guid={:#010x} gsnpsid={:#010x} ghwcfg1={:#010x} ghwcfg2={:#010x} ghwcfg3={:#010x} ghwcfg4={:#010x}",
            g.guid.get(),
            g.gsnpsid.get(),
            g.ghwcfg1.get(),
            g.ghwcfg2.get(),
            g.ghwcfg3.get(),
            g.ghwcfg4.get(),
        );

        if quirks.contains(Quirks::ZERO_SNPSID) {
            debug!("DWC2: GSNPSID check skipped on this part");
            return Ok(());
        }

        let found = self.snpsid();
        match found & GSNPSID_ID_MASK {
            DWC2_OTG_ID | DWC2_FS_IOT_ID | DWC2_HS_IOT_ID => Ok(()),
            _ => {
                warn!("DWC2: unrecognized GSNPSID {found:#010x}, is the core clocked?");
                Err(Dwc2Error::UnknownCoreId { found })
            }
        }
    }

    /// Soft-reset the core and wait for the AHB master to go idle.
    ///
    /// The PHY selection in GUSBCFG must already be programmed. The reset
    /// pulse clears the turnaround field, so callers reprogram it afterwards.
    pub fn core_soft_reset(&mut self) -> Result {
        let g = self.global();

        g.grstctl.modify(GRSTCTL::CSRST::SET);

        match ResetProtocol::for_revision(self.core_revision()) {
            ResetProtocol::SelfClearing => {
                poll_until(RESET_POLL_LIMIT, "core soft reset", || {
                    !g.grstctl.is_set(GRSTCTL::CSRST)
                })?;
            }
            ResetProtocol::DoneHandshake => {
                poll_until(RESET_POLL_LIMIT, "core soft reset done", || {
                    g.grstctl.is_set(GRSTCTL::CSRST_DONE)
                })?;
                // One write: drop CSRST and acknowledge CSRST_DONE (w1c).
                g.grstctl
                    .modify(GRSTCTL::CSRST::CLEAR + GRSTCTL::CSRST_DONE::SET);
            }
        }

        poll_until(RESET_POLL_LIMIT, "ahb master idle", || {
            g.grstctl.is_set(GRSTCTL::AHBIDL)
        })
    }

    /// Flush one Tx FIFO, or all of them with [`FLUSH_ALL_TX_FIFOS`].
    pub fn flush_tx_fifo(&mut self, fnum: u8) -> Result {
        let g = self.global();
        g.grstctl
            .write(GRSTCTL::TXFFLSH::SET + GRSTCTL::TXFNUM.val(fnum as u32));
        poll_until(FLUSH_POLL_LIMIT, "tx fifo flush", || {
            !g.grstctl.is_set(GRSTCTL::TXFFLSH)
        })
    }

    /// Flush the shared Rx FIFO.
    pub fn flush_rx_fifo(&mut self) -> Result {
        let g = self.global();
        g.grstctl.write(GRSTCTL::RXFFLSH::SET);
        poll_until(FLUSH_POLL_LIMIT, "rx fifo flush", || {
            !g.grstctl.is_set(GRSTCTL::RXFFLSH)
        })
    }

    /// Max out the HS/FS interpacket timeout calibration. The linestate
    /// delay varies from one PHY to another and adds to the interpacket
    /// time the core has to tolerate.
    pub(crate) fn max_timeout_calibration(&mut self) {
        self.global().gusbcfg.modify(GUSBCFG::TOCAL.val(7));
    }

    /// Stop gating the PHY and AHB clocks.
    pub(crate) fn ungate_phy_clock(&mut self) {
        self.global().pcgcctl.modify(
            PCGCCTL::STOPPCLK::CLEAR
                + PCGCCTL::GATEHCLK::CLEAR
                + PCGCCTL::PWRCLMP::CLEAR
                + PCGCCTL::RSTPDWNMODULE::CLEAR,
        );
    }

    /// Acknowledge everything pending in GINTSTS and GOTGINT (both are
    /// write-1-to-clear) and mask all interrupt sources.
    pub(crate) fn clear_pending_interrupts(&mut self) {
        let g = self.global();

        let pending = g.gintsts.get();
        g.gintsts.set(pending);

        let pending = g.gotgint.get();
        g.gotgint.set(pending);

        g.gintmsk.set(0);
    }

    /// Program the endpoint-info FIFO base and turn on internal DMA with an
    /// 8-beat burst. Only takes effect directly after a core soft reset.
    pub(crate) fn enable_dma(&mut self, epinfo_base: u16) {
        let g = self.global();
        g.gdfifocfg.write(
            GDFIFOCFG::EPINFOBASE.val(epinfo_base as u32)
                + GDFIFOCFG::GDFIFOCFG.val(epinfo_base as u32),
        );
        g.gahbcfg
            .modify(GAHBCFG::DMAEN::SET + GAHBCFG::HBSTLEN::Incr8);
    }

    /// Unmask the Rx FIFO non-empty interrupt (slave mode transfers).
    pub(crate) fn unmask_rx_fifo_level(&mut self) {
        self.global().gintmsk.modify(GINTMSK::RXFLVLM::SET);
    }

    /// Trigger the Tx FIFO empty interrupt only on a completely empty FIFO.
    pub(crate) fn set_tx_fifo_empty_level(&mut self) {
        self.global().gahbcfg.modify(GAHBCFG::TXFELVL::Empty);
    }
}

fn poll_until(limit: u32, condition: &'static str, mut done: impl FnMut() -> bool) -> Result {
    for _ in 0..limit {
        if done() {
            return Ok(());
        }
        spin_loop();
    }
    warn!("DWC2: timed out waiting for {condition}");
    Err(Dwc2Error::Timeout { condition })
}
