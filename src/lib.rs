//! DWC2 (DesignWare USB 2.0 OTG) controller core bring-up.
//!
//! This crate covers the part of a DWC2 driver that has to run before any
//! data moves: checking the Synopsys identification register, selecting and
//! configuring the PHY transceiver, the version-dependent core soft reset,
//! flushing the packet FIFOs and priming the interrupt/DMA configuration.
//! Transfer scheduling, interrupt dispatch and the USB protocol state
//! machine are layered on top; MCU clock/power/strap glue is reached through
//! [`PlatformOp`].
//!
//! Every hardware wait is bounded and reports [`Dwc2Error::Timeout`] instead
//! of spinning forever on a wedged core.

#![no_std]

extern crate alloc;

pub mod consts;
pub mod err;
pub mod otg;
pub mod phy;
mod reg;

pub use err::{Dwc2Error, Result};
pub use otg::{Dwc2, PlatformOp, Quirks, Role, Speed};
pub use phy::PhyCapability;
pub use reg::{Dwc2Regs, ResetProtocol};
