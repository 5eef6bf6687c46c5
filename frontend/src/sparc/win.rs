//! Register window helpers.
//!
//! V8 tracks invalid windows with the `WIM` bitmask; V9 keeps the
//! `CANSAVE`/`CANRESTORE`/`OTHERWIN`/`CLEANWIN` counters. In both
//! cases a helper that traps leaves the window pointer and every
//! counter untouched.

use super::cfg::SparcArch;
use super::cpu::SparcCpu;
use super::trap::{v8, v9, HelperResult, TrapKind};

impl SparcCpu {
    /// Spill or fill trap type for the current `WSTATE`/`OTHERWIN`.
    fn window_trap_tt(&self, base: u32) -> u32 {
        if self.otherwin != 0 {
            base | v9::TT_WOTHER | ((self.wstate & 0x38) >> 1)
        } else {
            base | ((self.wstate & 0x7) << 2)
        }
    }

    fn require_priv(&self) -> HelperResult<()> {
        if self.is_supervisor() {
            Ok(())
        } else {
            Err(self.trap(TrapKind::PrivilegedInstruction))
        }
    }
}

/// SAVE: allocate a new window.
pub fn save(env: &mut SparcCpu) -> HelperResult<()> {
    let cwp = env.cwp_offset(-1);
    match env.cfg.arch {
        SparcArch::V8 => {
            if env.wim & (1 << cwp) != 0 {
                return Err(env.trap_tt(v8::TT_WIN_OVF));
            }
        }
        SparcArch::V9 => {
            if env.cansave == 0 {
                return Err(env.trap_tt(env.window_trap_tt(v9::TT_SPILL)));
            }
            if env.cleanwin == env.canrestore {
                return Err(env.trap_tt(v9::TT_CLRWIN));
            }
            env.cansave -= 1;
            env.canrestore += 1;
        }
    }
    env.set_cwp(cwp);
    Ok(())
}

/// RESTORE: return to the caller's window.
pub fn restore(env: &mut SparcCpu) -> HelperResult<()> {
    let cwp = env.cwp_offset(1);
    match env.cfg.arch {
        SparcArch::V8 => {
            if env.wim & (1 << cwp) != 0 {
                return Err(env.trap_tt(v8::TT_WIN_UNF));
            }
        }
        SparcArch::V9 => {
            if env.canrestore == 0 {
                return Err(env.trap_tt(env.window_trap_tt(v9::TT_FILL)));
            }
            env.cansave += 1;
            env.canrestore -= 1;
        }
    }
    env.set_cwp(cwp);
    Ok(())
}

/// FLUSHW: trap until every window but the current one is spilled.
pub fn flushw(env: &mut SparcCpu) -> HelperResult<()> {
    if env.cansave != env.nwindows() - 2 {
        return Err(env.trap_tt(env.window_trap_tt(v9::TT_SPILL)));
    }
    Ok(())
}

/// SAVED: a spill handler finished storing one window.
pub fn saved(env: &mut SparcCpu) -> HelperResult<()> {
    env.require_priv()?;
    env.cansave += 1;
    if env.otherwin == 0 {
        env.canrestore = env.canrestore.wrapping_sub(1);
    } else {
        env.otherwin -= 1;
    }
    log::trace!(
        "saved: cansave={} canrestore={} otherwin={}",
        env.cansave,
        env.canrestore,
        env.otherwin
    );
    Ok(())
}

/// RESTORED: a fill handler finished loading one window.
pub fn restored(env: &mut SparcCpu) -> HelperResult<()> {
    env.require_priv()?;
    env.canrestore += 1;
    if env.cleanwin < env.nwindows() - 1 {
        env.cleanwin += 1;
    }
    if env.otherwin == 0 {
        env.cansave = env.cansave.wrapping_sub(1);
    } else {
        env.otherwin -= 1;
    }
    log::trace!(
        "restored: cansave={} canrestore={} cleanwin={}",
        env.cansave,
        env.canrestore,
        env.cleanwin
    );
    Ok(())
}

/// RDPR %cwp.
pub fn rdcwp(env: &SparcCpu) -> HelperResult<u64> {
    env.require_priv()?;
    Ok(env.get_cwp64() as u64)
}

/// WRPR %cwp. Out-of-range values wrap modulo the window count.
pub fn wrcwp(env: &mut SparcCpu, new_cwp: u64) -> HelperResult<()> {
    env.require_priv()?;
    env.put_cwp64((new_cwp % env.nwindows() as u64) as u32);
    Ok(())
}
