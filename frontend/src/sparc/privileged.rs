//! Privileged register and trap-return helpers.
//!
//! Every helper here checks the privilege level itself. When more
//! than one condition holds, the trap with the best architectural
//! priority wins, and nothing is modified.

use tcg_core::WakeReason;

use super::cpu::*;
use super::trap::{v8, CpuExit, HelperResult, Trap, TrapKind};

fn priv_check(env: &SparcCpu) -> Option<Trap> {
    if env.is_supervisor() {
        None
    } else {
        Some(Trap::of(env.cfg.arch, TrapKind::PrivilegedInstruction))
    }
}

/// Raise the most urgent of `conds`, if any.
fn first_trap<const N: usize>(
    env: &SparcCpu,
    conds: [Option<Trap>; N],
) -> HelperResult<()> {
    match Trap::highest(conds.into_iter().flatten()) {
        Some(trap) => Err(env.trap_tt(trap.tt)),
        None => Ok(()),
    }
}

fn ill(env: &SparcCpu) -> Trap {
    Trap::of(env.cfg.arch, TrapKind::IllegalInstruction)
}

// -- V8 --

/// RDPSR.
pub fn rdpsr(env: &SparcCpu) -> HelperResult<u64> {
    first_trap(env, [priv_check(env)])?;
    Ok(env.get_psr() as u64)
}

/// WRPSR. A `CWP` field naming a nonexistent window is illegal.
pub fn wrpsr(env: &mut SparcCpu, new_psr: u64) -> HelperResult<()> {
    let new_psr = new_psr as u32;
    let bad_cwp = (new_psr & PSR_CWP) >= env.nwindows();
    first_trap(env, [priv_check(env), bad_cwp.then(|| ill(env))])?;
    env.put_psr(new_psr);
    Ok(())
}

/// RETT: return from a V8 trap handler.
///
/// The underflow check happens before `ET` is set, so an underflow
/// with traps disabled reaches trap entry with `ET = 0` and puts the
/// processor in error state.
pub fn rett(env: &mut SparcCpu) -> HelperResult<()> {
    if env.psret {
        let trap = priv_check(env).unwrap_or_else(|| ill(env));
        return Err(env.trap_tt(trap.tt));
    }
    if !env.psrs {
        return Err(env.trap(TrapKind::PrivilegedInstruction));
    }
    let cwp = env.cwp_offset(1);
    if env.wim & (1 << cwp) != 0 {
        return Err(env.trap_tt(v8::TT_WIN_UNF));
    }
    env.psret = true;
    env.set_cwp(cwp);
    env.psrs = env.psrps;
    log::trace!("cpu{} rett to cwp {cwp}", env.cpu_index);
    Ok(())
}

/// RDASR17: LEON processor configuration register.
pub fn rdasr17(env: &SparcCpu) -> u64 {
    let mut val = (env.nwindows() - 1) as u64;
    val |= 1 << 8;
    val |= ((env.cpu_index & 0xf) as u64) << 28;
    val
}

/// LEON power-down: halt until an interrupt arrives.
///
/// Returns once woken; `pc`/`npc` already point past the
/// instruction. A reset while halted exits with [`CpuExit::Reset`].
pub fn power_down(env: &mut SparcCpu) -> HelperResult<()> {
    env.halted = true;
    env.pc = env.npc;
    env.npc = env.pc.wrapping_add(4);
    env.poll_timers();
    if env.interrupt_pending() {
        env.halted = false;
        return Ok(());
    }
    log::debug!("cpu{} power down at pc={:#x}", env.cpu_index, env.pc);
    let reason = env.halt.wait();
    log::debug!("cpu{} woken: {:?}", env.cpu_index, reason);
    env.halted = false;
    match reason {
        WakeReason::Reset => Err(CpuExit::Reset),
        WakeReason::Interrupt | WakeReason::Kick => {
            env.poll_timers();
            env.check_irqs();
            Ok(())
        }
    }
}

// -- V9 --

/// WRPR %pil.
pub fn wrpil(env: &mut SparcCpu, new_pil: u64) -> HelperResult<()> {
    first_trap(env, [priv_check(env)])?;
    env.psrpil = (new_pil & 0xf) as u32;
    if env.interrupts_enabled() {
        env.check_irqs();
    }
    Ok(())
}

/// WRPR %gl.
pub fn wrgl(env: &mut SparcCpu, new_gl: u64) -> HelperResult<()> {
    first_trap(env, [priv_check(env)])?;
    env.gl_switch((new_gl & 7) as u32);
    log::trace!("cpu{} gl = {}", env.cpu_index, env.gl);
    Ok(())
}

/// WRPR %pstate.
pub fn wrpstate(env: &mut SparcCpu, new_state: u64) -> HelperResult<()> {
    first_trap(env, [priv_check(env)])?;
    env.change_pstate(new_state as u32 & PSTATE_MASK);
    if env.interrupts_enabled() {
        env.check_irqs();
    }
    Ok(())
}

/// Restore the state saved in `TSTATE[TL]` and pop one trap level.
fn trap_return(env: &mut SparcCpu) {
    let tsptr = env.ts[env.tl as usize];
    env.put_ccr((tsptr.tstate >> 32) as u32 & 0xff);
    env.asi = (tsptr.tstate >> 24) as u32 & 0xff;
    env.change_pstate((tsptr.tstate >> 8) as u32 & PSTATE_MASK);
    env.put_cwp64(tsptr.tstate as u32 & 0xff);
    if env.cfg.has_hypervisor() {
        env.hpstate = env.htstate[env.tl as usize];
        env.gl_switch((tsptr.tstate >> 40) as u32 & 7);
    }
    env.tl -= 1;
    if env.interrupts_enabled() {
        env.check_irqs();
    }
}

fn trap_return_check(env: &SparcCpu) -> HelperResult<()> {
    let no_trap = env.tl == 0;
    first_trap(env, [priv_check(env), no_trap.then(|| ill(env))])
}

/// DONE: return from a trap, skipping the trapping instruction.
pub fn done(env: &mut SparcCpu) -> HelperResult<()> {
    trap_return_check(env)?;
    let tnpc = env.ts[env.tl as usize].tnpc;
    env.pc = tnpc;
    env.npc = tnpc.wrapping_add(4);
    trap_return(env);
    log::trace!("cpu{} done: tl={}", env.cpu_index, env.tl);
    Ok(())
}

/// RETRY: return from a trap and re-execute the trapping instruction.
pub fn retry(env: &mut SparcCpu) -> HelperResult<()> {
    trap_return_check(env)?;
    let tsptr = env.ts[env.tl as usize];
    env.pc = tsptr.tpc;
    env.npc = tsptr.tnpc;
    trap_return(env);
    log::trace!("cpu{} retry: tl={}", env.cpu_index, env.tl);
    Ok(())
}

/// RD %ccr.
pub fn rdccr(env: &SparcCpu) -> u64 {
    env.get_ccr() as u64
}

/// WR %ccr.
pub fn wrccr(env: &mut SparcCpu, new_ccr: u64) {
    env.put_ccr(new_ccr as u32 & 0xff);
}

// -- Both --

/// Breakpoint: exit to the debugger.
pub fn debug(env: &SparcCpu) -> HelperResult<()> {
    log::debug!("cpu{} debug exception at pc={:#x}", env.cpu_index, env.pc);
    Err(CpuExit::Debug)
}
