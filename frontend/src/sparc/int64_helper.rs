//! SOFTINT register helpers.

use super::cpu::{SparcCpu, SOFTINT_STIMER, SOFTINT_TIMER};

impl SparcCpu {
    /// Install a new SOFTINT value. Returns whether it changed.
    fn modify_softint(&mut self, value: u32) -> bool {
        if self.softint == value {
            return false;
        }
        self.softint = value;
        if self.interrupts_enabled() {
            self.check_irqs();
        }
        true
    }

    /// Latch expired tick/stick compares into SOFTINT.
    pub fn poll_timers(&mut self) {
        let mut bits = 0;
        if self.tick.as_ref().is_some_and(|t| t.take_expired()) {
            bits |= SOFTINT_TIMER;
        }
        if self.stick.as_ref().is_some_and(|t| t.take_expired()) {
            bits |= SOFTINT_STIMER;
        }
        if bits != 0 && self.modify_softint(self.softint | bits) {
            log::trace!("cpu{} timer softint {:#x}", self.cpu_index, bits);
        }
    }
}

/// `WR %set_softint`.
pub fn set_softint(env: &mut SparcCpu, value: u64) {
    if env.modify_softint(env.softint | value as u32) {
        log::trace!(
            "cpu{} set_softint -> {:#x}",
            env.cpu_index,
            env.softint
        );
    }
}

/// `WR %clear_softint`.
pub fn clear_softint(env: &mut SparcCpu, value: u64) {
    if env.modify_softint(env.softint & !(value as u32)) {
        log::trace!(
            "cpu{} clear_softint -> {:#x}",
            env.cpu_index,
            env.softint
        );
    }
}

/// `WR %softint`.
pub fn write_softint(env: &mut SparcCpu, value: u64) {
    if env.modify_softint(value as u32) {
        log::trace!(
            "cpu{} write_softint -> {:#x}",
            env.cpu_index,
            env.softint
        );
    }
}
