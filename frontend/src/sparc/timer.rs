//! Tick/stick counter devices.
//!
//! A `CpuTimer` counts at a fixed frequency against an injected
//! [`ClockSource`]. The count is derived from the clock on every read,
//! so nothing advances it in the background. A compare limit arms an
//! expiry instant which the owning CPU polls.
//!
//! Maps to QEMU's `CPUTimer` and the `cpu_tick_*` functions.

use std::sync::Arc;

use parking_lot::Mutex;
use tcg_core::ClockSource;

use super::cpu::{MmuIdx, SparcCpu};
use super::trap::{v9, HelperResult};

const NANOSECONDS_PER_SECOND: u64 = 1_000_000_000;

/// `NPT` bit of `%tick`/`%stick`.
pub const TICK_NPT_MASK: u64 = 1 << 63;
/// `INT_DIS` bit of `%tick_cmpr`/`%stick_cmpr`.
pub const TICK_INT_DIS: u64 = 1 << 63;

/// `a * b / c`, saturating at `u64::MAX`.
#[inline]
fn muldiv(a: u64, b: u64, c: u64) -> u64 {
    u64::try_from(a as u128 * b as u128 / c as u128).unwrap_or(u64::MAX)
}

#[derive(Debug, Default)]
struct TimerState {
    npt: bool,
    disabled: bool,
    /// Count loaded by the last `set_count`.
    base_count: u64,
    /// Clock instant of the last `set_count`.
    base_ns: i64,
    expires: Option<i64>,
}

/// A free-running counter shared by the CPUs that read it.
pub struct CpuTimer {
    name: &'static str,
    frequency: u64,
    npt_mask: u64,
    disabled_mask: u64,
    clock: Arc<dyn ClockSource>,
    state: Mutex<TimerState>,
}

impl std::fmt::Debug for CpuTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuTimer")
            .field("name", &self.name)
            .field("frequency", &self.frequency)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl CpuTimer {
    /// Create a counter running at `frequency` Hz. A zero frequency
    /// counts as 1 Hz.
    pub fn new(
        name: &'static str,
        frequency: u64,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        let state = TimerState {
            base_ns: clock.now_ns(),
            ..TimerState::default()
        };
        Self {
            name,
            frequency: frequency.max(1),
            npt_mask: TICK_NPT_MASK,
            disabled_mask: TICK_INT_DIS,
            clock,
            state: Mutex::new(state),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    fn to_ns(&self, ticks: u64) -> u64 {
        muldiv(ticks, NANOSECONDS_PER_SECOND, self.frequency)
    }

    fn to_ticks(&self, ns: u64) -> u64 {
        muldiv(ns, self.frequency, NANOSECONDS_PER_SECOND)
    }

    /// Count without `NPT` at clock instant `now`.
    fn count_at(&self, st: &TimerState, now: i64) -> u64 {
        let elapsed = now.saturating_sub(st.base_ns).max(0) as u64;
        st.base_count.wrapping_add(self.to_ticks(elapsed))
    }

    /// Load the counter. Bit 63 sets `NPT`, the rest is the count.
    pub fn set_count(&self, count: u64) {
        let real = count & !self.npt_mask;
        let now = self.clock.now_ns();
        let mut st = self.state.lock();
        st.npt = count & self.npt_mask != 0;
        st.base_count = real;
        st.base_ns = now;
        log::trace!("{}: set count {:#x} npt={}", self.name, real, st.npt);
    }

    /// Current counter value with `NPT` in bit 63.
    pub fn get_count(&self) -> u64 {
        let now = self.clock.now_ns();
        let st = self.state.lock();
        let count = self.count_at(&st, now) & !self.npt_mask;
        if st.npt {
            count | self.npt_mask
        } else {
            count
        }
    }

    /// Counter value as seen by a reader that is `privileged` or not.
    /// `None` when `NPT` hides the counter from the reader. `NPT` and
    /// the count are sampled together.
    pub fn get_count_checked(&self, privileged: bool) -> Option<u64> {
        let now = self.clock.now_ns();
        let st = self.state.lock();
        if st.npt && !privileged {
            return None;
        }
        let count = self.count_at(&st, now) & !self.npt_mask;
        Some(if st.npt { count | self.npt_mask } else { count })
    }

    /// The counter is readable only by privileged code.
    pub fn npt(&self) -> bool {
        self.state.lock().npt
    }

    /// Program the compare register. Bit 63 disables the interrupt;
    /// a zero limit disarms. A limit already passed fires on the next
    /// clock tick.
    pub fn set_limit(&self, limit: u64) {
        let real = limit & !self.disabled_mask;
        let now = self.clock.now_ns();
        let mut st = self.state.lock();
        st.disabled = limit & self.disabled_mask != 0;
        let ahead = real.saturating_sub(self.count_at(&st, now));
        let ahead_ns = i64::try_from(self.to_ns(ahead)).unwrap_or(i64::MAX);
        let expires = now.saturating_add(ahead_ns).max(now + 1);
        st.expires = if real == 0 || st.disabled {
            None
        } else {
            Some(expires)
        };
        log::trace!(
            "{}: set limit {:#x} disabled={} expires={:?}",
            self.name,
            real,
            st.disabled,
            st.expires
        );
    }

    pub fn disabled(&self) -> bool {
        self.state.lock().disabled
    }

    /// Armed expiry instant in clock nanoseconds.
    pub fn deadline(&self) -> Option<i64> {
        self.state.lock().expires
    }

    /// Consume an expiry that has been reached. Fires once per limit.
    pub fn take_expired(&self) -> bool {
        let now = self.clock.now_ns();
        let mut st = self.state.lock();
        match st.expires {
            Some(at) if at <= now => {
                st.expires = None;
                log::trace!("{}: expired at {}", self.name, now);
                !st.disabled
            }
            _ => false,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// `WRPR %tick` / `WR %stick`.
pub fn tick_set_count(timer: &CpuTimer, count: u64) {
    timer.set_count(count);
}

/// `RDPR %tick` / `RD %stick`.
///
/// With `NPT` set only kernel and above may read the counter.
pub fn tick_get_count(
    env: &SparcCpu,
    timer: &CpuTimer,
    mem_idx: MmuIdx,
) -> HelperResult<u64> {
    timer
        .get_count_checked(mem_idx >= MmuIdx::Kernel)
        .ok_or_else(|| env.trap_tt(v9::TT_PRIV_ACT))
}

/// `WR %tick_cmpr` / `WR %stick_cmpr`.
pub fn tick_set_limit(timer: &CpuTimer, limit: u64) {
    timer.set_limit(limit);
}
