//! Configuration and dispatch errors.
//!
//! Architectural traps are not errors in this sense: they travel as
//! [`CpuExit`](super::trap::CpuExit) and are handled by the guest.

use thiserror::Error;

use super::cfg::SparcArch;

/// A CPU model that cannot be built or used as requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window count {0} outside 3..=32")]
    InvalidWindowCount(u32),
    #[error("MAXTL {0} not valid for this architecture")]
    InvalidMaxTl(u32),
    #[error("features {features:#x} not available on {arch:?}")]
    FeatureMismatch { arch: SparcArch, features: u32 },
    #[error("helper `{name}` unavailable: {reason}")]
    HelperUnavailable {
        name: &'static str,
        reason: &'static str,
    },
    #[error("unknown helper `{0}`")]
    UnknownHelper(String),
}

/// Failure while delivering a trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    /// Trap taken with traps disabled (V8 `ET = 0`) or at
    /// `TL = MAXTL` (V9). The processor halts.
    #[error("trap {tt:#x} in error state")]
    ErrorState { tt: u32 },
    /// `ta 0` with traps disabled on CPUs that treat it as a
    /// shutdown request.
    #[error("guest requested shutdown")]
    Shutdown,
}
