//! Identity codes, core revisions and timing constants.

/// Identity field of GSNPSID (bits [31:16]).
pub const GSNPSID_ID_MASK: u32 = 0xFFFF_0000;

/// DWC OTG core.
pub const DWC2_OTG_ID: u32 = 0x4F54_0000;
/// Fullspeed IoT subset core.
pub const DWC2_FS_IOT_ID: u32 = 0x5531_0000;
/// Highspeed IoT subset core.
pub const DWC2_HS_IOT_ID: u32 = 0x5532_0000;

/// Revision field of GSNPSID (bits [15:0]).
pub const CORE_REV_MASK: u32 = 0x0000_FFFF;

// Core revisions, BCD coded in GSNPSID[15:0] (0x430A reads as 4.30a).
pub const CORE_REV_2_71A: u16 = 0x271A;
pub const CORE_REV_3_00A: u16 = 0x300A;
pub const CORE_REV_3_10A: u16 = 0x310A;
pub const CORE_REV_4_11A: u16 = 0x411A;
pub const CORE_REV_4_20A: u16 = 0x420A;
pub const CORE_REV_4_30A: u16 = 0x430A;

/// GRSTCTL.TXFNUM selector that flushes every Tx FIFO at once.
pub const FLUSH_ALL_TX_FIFOS: u8 = 0x10;

/// Turnaround time for the dedicated fullspeed transceiver.
pub const TRDT_FULLSPEED: u32 = 5;
/// Turnaround time for a 16-bit UTMI+ data path.
pub const TRDT_HS_16BIT: u32 = 5;
/// Turnaround time for an 8-bit UTMI+/ULPI data path.
pub const TRDT_HS_8BIT: u32 = 9;

/// Poll bound for the reset handshake and AHB idle waits. The databook puts
/// these at tens of PHY clocks; ten million polls is several orders of
/// magnitude above that on any bus the core ships on.
pub const RESET_POLL_LIMIT: u32 = 10_000_000;

/// Poll bound for the Tx/Rx FIFO flush waits.
pub const FLUSH_POLL_LIMIT: u32 = 10_000_000;
