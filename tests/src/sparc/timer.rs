use std::sync::Arc;

use tcg_core::ManualClock;
use tcg_frontend::sparc::cpu::{
    PS_IE, PS_PEF, PS_PRIV, SOFTINT_STIMER, SOFTINT_TIMER,
};
use tcg_frontend::sparc::timer::*;
use tcg_frontend::sparc::trap::v9;
use tcg_frontend::sparc::MmuIdx;

use super::{init_logging, trap_tt, v9_cpu};

const GHZ: u64 = 1_000_000_000;

fn timer(freq: u64, start_ns: i64) -> (Arc<ManualClock>, Arc<CpuTimer>) {
    init_logging();
    let clock = Arc::new(ManualClock::new(start_ns));
    let timer = Arc::new(CpuTimer::new("tick", freq, clock.clone()));
    (clock, timer)
}

#[test]
fn count_follows_clock() {
    let (clock, t) = timer(GHZ, 1000);
    assert_eq!(t.get_count(), 0);
    clock.advance(500);
    assert_eq!(t.get_count(), 500);

    let (clock, t) = timer(100_000_000, 0);
    clock.advance(1000);
    assert_eq!(t.get_count(), 100);
    assert_eq!(t.frequency(), 100_000_000);
    assert_eq!(t.name(), "tick");
}

#[test]
fn zero_frequency_counts_at_one_hz() {
    let (clock, t) = timer(0, 0);
    assert_eq!(t.frequency(), 1);
    clock.advance(3 * GHZ as i64);
    assert_eq!(t.get_count(), 3);
}

#[test]
fn set_count_rebases() {
    let (clock, t) = timer(GHZ, 5000);
    tick_set_count(&t, 1000);
    assert_eq!(t.get_count(), 1000);
    clock.advance(10);
    assert_eq!(t.get_count(), 1010);
    assert!(!t.npt());
}

#[test]
fn npt_bit() {
    let (_clock, t) = timer(GHZ, 0);
    tick_set_count(&t, TICK_NPT_MASK | 5);
    assert!(t.npt());
    let count = t.get_count();
    assert_ne!(count & TICK_NPT_MASK, 0);
    assert_eq!(count & !TICK_NPT_MASK, 5);

    tick_set_count(&t, 5);
    assert!(!t.npt());
}

#[test]
fn npt_blocks_user_reads() {
    let env = v9_cpu();
    let (_clock, t) = timer(GHZ, 0);
    tick_set_count(&t, 42);
    assert_eq!(tick_get_count(&env, &t, MmuIdx::User).unwrap(), 42);

    tick_set_count(&t, TICK_NPT_MASK | 42);
    let user = tick_get_count(&env, &t, MmuIdx::User);
    assert_eq!(trap_tt(user), v9::TT_PRIV_ACT);
    let secondary = tick_get_count(&env, &t, MmuIdx::UserSecondary);
    assert_eq!(trap_tt(secondary), v9::TT_PRIV_ACT);
    let kernel = tick_get_count(&env, &t, MmuIdx::Kernel).unwrap();
    assert_eq!(kernel, TICK_NPT_MASK | 42);
}

#[test]
fn checked_read_samples_npt_with_count() {
    let (clock, t) = timer(GHZ, 0);
    tick_set_count(&t, 7);
    clock.advance(3);
    assert_eq!(t.get_count_checked(false), Some(10));
    assert_eq!(t.get_count_checked(true), Some(10));

    tick_set_count(&t, TICK_NPT_MASK | 7);
    assert_eq!(t.get_count_checked(false), None);
    assert_eq!(t.get_count_checked(true), Some(TICK_NPT_MASK | 7));
}

#[test]
fn large_count_survives_slow_clock() {
    let (clock, t) = timer(1_000_000, 0);
    tick_set_count(&t, 1 << 62);
    assert_eq!(t.get_count(), 1 << 62);
    clock.advance(1000);
    assert_eq!(t.get_count(), (1 << 62) + 1);

    let top = !TICK_NPT_MASK;
    tick_set_count(&t, top);
    assert_eq!(t.get_count(), top);
    clock.advance(1000);
    assert_eq!(t.get_count(), 0);
}

#[test]
fn far_limit_saturates_deadline() {
    let (_clock, t) = timer(1, 0);
    tick_set_limit(&t, 1 << 62);
    assert_eq!(t.deadline(), Some(i64::MAX));
    assert!(!t.take_expired());
}

#[test]
fn limit_fires_once() {
    let (clock, t) = timer(GHZ, 0);
    tick_set_limit(&t, 100);
    assert_eq!(t.deadline(), Some(100));
    assert!(!t.disabled());
    assert!(!t.take_expired());

    clock.advance(99);
    assert!(!t.take_expired());
    clock.advance(1);
    assert!(t.take_expired());
    assert!(!t.take_expired());
    assert_eq!(t.deadline(), None);
}

#[test]
fn limit_tracks_count_base() {
    let (clock, t) = timer(GHZ, 0);
    clock.set(1000);
    tick_set_count(&t, 0);
    tick_set_limit(&t, 50);
    assert_eq!(t.deadline(), Some(1050));
}

#[test]
fn past_limit_expires_next_instant() {
    let (clock, t) = timer(GHZ, 0);
    clock.set(1000);
    tick_set_limit(&t, 10);
    assert_eq!(t.deadline(), Some(1001));
    assert!(!t.take_expired());
    clock.advance(1);
    assert!(t.take_expired());
}

#[test]
fn disabled_or_zero_limit_does_not_arm() {
    let (clock, t) = timer(GHZ, 0);
    tick_set_limit(&t, TICK_INT_DIS | 100);
    assert!(t.disabled());
    assert_eq!(t.deadline(), None);
    clock.advance(1000);
    assert!(!t.take_expired());

    tick_set_limit(&t, 0);
    assert!(!t.disabled());
    assert_eq!(t.deadline(), None);
}

#[test]
fn poll_latches_softint() {
    let mut env = v9_cpu();
    env.tl = 0;
    env.pstate = PS_PRIV | PS_PEF | PS_IE;
    let (clock, tick) = timer(GHZ, 0);
    let stick = Arc::new(CpuTimer::new("stick", GHZ, clock.clone()));
    env.tick = Some(tick.clone());
    env.stick = Some(stick.clone());

    tick_set_limit(&tick, 10);
    tick_set_limit(&stick, 20);
    env.poll_timers();
    assert_eq!(env.softint, 0);

    clock.advance(10);
    env.poll_timers();
    assert_eq!(env.softint, SOFTINT_TIMER);
    assert_eq!(env.interrupt_index, 0x4e);
    assert!(env.interrupt_pending());

    clock.advance(10);
    env.poll_timers();
    assert_eq!(env.softint, SOFTINT_TIMER | SOFTINT_STIMER);
}

#[test]
fn shared_timer_across_threads() {
    let (clock, t) = timer(GHZ, 0);
    let writer = {
        let t = t.clone();
        std::thread::spawn(move || tick_set_count(&t, 7))
    };
    writer.join().unwrap();
    assert_eq!(t.get_count(), 7);
    clock.advance(3);
    assert_eq!(t.get_count(), 10);
}
