//! Halt/wake signalling for powered-down CPUs.
//!
//! A CPU executing a power-down instruction blocks on its
//! [`HaltSignal`] until another thread delivers a wake reason.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Why a halted CPU was woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WakeReason {
    /// An interrupt line became pending.
    Interrupt,
    /// Explicit kick from the execution loop (e.g. exit request).
    Kick,
    /// The CPU is being reset.
    Reset,
}

impl WakeReason {
    const fn rank(self) -> u8 {
        match self {
            WakeReason::Kick => 0,
            WakeReason::Interrupt => 1,
            WakeReason::Reset => 2,
        }
    }
}

/// One-slot wake mailbox plus condition variable.
///
/// Shared between the owning CPU thread and whoever raises its
/// interrupt lines, via `Arc<HaltSignal>`.
#[derive(Debug, Default)]
pub struct HaltSignal {
    pending: Mutex<Option<WakeReason>>,
    cond: Condvar,
}

impl HaltSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a wake reason. A reset is never downgraded by a later
    /// interrupt or kick.
    pub fn kick(&self, reason: WakeReason) {
        let mut pending = self.pending.lock();
        let merged = match *pending {
            Some(prev) if prev.rank() >= reason.rank() => prev,
            _ => reason,
        };
        *pending = Some(merged);
        log::trace!("halt kick: {:?}", merged);
        self.cond.notify_all();
    }

    /// Consume a pending wake reason without blocking.
    pub fn take_pending(&self) -> Option<WakeReason> {
        self.pending.lock().take()
    }

    /// Block until a wake reason is posted and consume it.
    pub fn wait(&self) -> WakeReason {
        let mut pending = self.pending.lock();
        loop {
            if let Some(reason) = pending.take() {
                return reason;
            }
            self.cond.wait(&mut pending);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_for(&self, timeout: Duration) -> Option<WakeReason> {
        let mut pending = self.pending.lock();
        if pending.is_none() {
            self.cond.wait_for(&mut pending, timeout);
        }
        pending.take()
    }
}
