pub mod clock;
pub mod guest_mem;
pub mod halt;
pub mod helper;
pub mod types;

pub use clock::{ClockSource, HostClock, ManualClock};
pub use guest_mem::{
    AccessCtx, AccessType, GuestMemory, GuestRam, MemFault, PageProt,
};
pub use halt::{HaltSignal, WakeReason};
pub use helper::{CallFlags, HelperDef, HelperType, SideEffectClass};
pub use types::{Cond, MemOp, MemOpIdx, Type};
