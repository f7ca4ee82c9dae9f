use thiserror::Error;

/// Failures the bring-up sequence can report.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dwc2Error {
    /// GSNPSID did not match any known core family. Usually means the
    /// controller clock or power domain is not enabled yet; nothing has been
    /// written when this is returned, so the call may be retried.
    #[error("unrecognized GSNPSID {found:#010x}")]
    UnknownCoreId { found: u32 },

    /// A hardware status bit did not come true within the poll bound. The
    /// core state is undefined afterwards; bring-up for the port failed.
    #[error("timed out waiting for {condition}")]
    Timeout { condition: &'static str },
}

pub type Result<T = ()> = core::result::Result<T, Dwc2Error>;
