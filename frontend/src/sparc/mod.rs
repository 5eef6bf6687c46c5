//! SPARC target helpers for V8 (sparc32) and V9 (sparc64).
//!
//! Everything generated code calls out to: register windows, traps
//! and privileged registers, alternate-space memory, floating point,
//! VIS, and the tick/softint interrupt sources.

pub mod cfg;
pub mod cpu;
pub mod error;
pub mod fpu;
pub mod helper;
pub mod int64_helper;
pub mod int_helper;
pub mod ldst;
pub mod privileged;
pub mod softfloat;
pub mod timer;
pub mod trap;
pub mod vis;
pub mod win;

pub use cfg::{CpuFeatures, FpTrapPolicy, SparcArch, SparcCfg};
pub use cpu::{MmuIdx, SparcCpu};
pub use error::{ConfigError, CpuError};
pub use helper::{HelperTable, SparcHelper, HELPERS};
pub use timer::CpuTimer;
pub use trap::{raise_exception, CpuExit, HelperResult, Trap, TrapKind};
