//! SPARC helper tests.

use std::fmt::Debug;

use tcg_frontend::sparc::{CpuExit, HelperResult, SparcCfg, SparcCpu};

mod fpu;
mod helper_table;
mod timer;
mod trap;
mod vis;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cpu(cfg: SparcCfg) -> SparcCpu {
    init_logging();
    SparcCpu::new(cfg, 0).expect("predefined profile is valid")
}

/// LEON3 in supervisor mode, traps disabled.
fn v8_cpu() -> SparcCpu {
    cpu(SparcCfg::SPARC32_LEON3)
}

/// sun4u after power-on reset: privileged, TL = MAXTL.
fn v9_cpu() -> SparcCpu {
    cpu(SparcCfg::SPARC64_SUN4U)
}

/// sun4v after power-on reset: hyperprivileged.
fn sun4v_cpu() -> SparcCpu {
    cpu(SparcCfg::SPARC64_SUN4V)
}

/// sun4u under user-mode emulation.
fn v9_user_cpu() -> SparcCpu {
    cpu(SparcCfg::SPARC64_SUN4U.user_mode())
}

/// Trap type carried by a helper failure.
#[track_caller]
fn trap_tt<T: Debug>(result: HelperResult<T>) -> u32 {
    match result {
        Err(CpuExit::Trap(trap)) => trap.tt,
        other => panic!("expected a trap, got {other:?}"),
    }
}
