use tcg_frontend::sparc::cpu::{PS_AG, PS_IE, PS_PEF, PS_PRIV, PS_RED};
use tcg_frontend::sparc::trap::{priority, v8, v9};
use tcg_frontend::sparc::{
    raise_exception, CpuError, CpuExit, SparcArch, SparcCfg, SparcCpu, Trap,
    TrapKind,
};

use super::{trap_tt, v8_cpu, v9_cpu};

// ── Priority ─────────────────────────────────────────────────────

#[test]
fn trap_kind_numbers() {
    use TrapKind::*;
    assert_eq!(PrivilegedInstruction.tt(SparcArch::V8), 0x03);
    assert_eq!(PrivilegedInstruction.tt(SparcArch::V9), 0x11);
    assert_eq!(DivisionByZero.tt(SparcArch::V8), 0x2a);
    assert_eq!(DivisionByZero.tt(SparcArch::V9), 0x28);
    assert_eq!(DataAccessException.tt(SparcArch::V9), 0x30);
    assert_eq!(MemAddressNotAligned.tt(SparcArch::V8), 0x07);
}

#[test]
fn highest_priority_wins() {
    let arch = SparcArch::V9;
    let traps = [
        Trap::new(arch, v9::TT_CLRWIN),
        Trap::new(arch, v9::TT_PRIV_INSN),
        Trap::new(arch, v9::TT_DFAULT),
    ];
    assert_eq!(Trap::highest(traps).map(|t| t.tt), Some(v9::TT_PRIV_INSN));
    assert_eq!(Trap::highest(Vec::new()), None);

    let v8 = SparcArch::V8;
    let both = [
        Trap::new(v8, v8::TT_ILL_INSN),
        Trap::new(v8, v8::TT_PRIV_INSN),
    ];
    assert_eq!(Trap::highest(both).map(|t| t.tt), Some(v8::TT_PRIV_INSN));
}

#[test]
fn highest_keeps_first_on_tie() {
    let arch = SparcArch::V9;
    let spills = [Trap::new(arch, 0x88), Trap::new(arch, 0x84)];
    assert_eq!(Trap::highest(spills).map(|t| t.tt), Some(0x88));
}

#[test]
fn interrupt_levels_order() {
    let v8 = SparcArch::V8;
    assert!(priority(v8, 0x1f) < priority(v8, 0x11));
    let v9 = SparcArch::V9;
    assert!(priority(v9, 0x4f) < priority(v9, 0x41));
    assert!(priority(v9, v9::TT_POWER_ON_RESET) < priority(v9, 0x4f));
}

#[test]
fn raise_exception_always_traps() {
    let env = v9_cpu();
    assert_eq!(trap_tt(raise_exception(&env, 0x42)), 0x42);
    assert_eq!(
        raise_exception(&env, v9::TT_TRAP).unwrap_err(),
        CpuExit::Trap(Trap::new(SparcArch::V9, v9::TT_TRAP))
    );
}

#[test]
fn trap_display() {
    let trap = Trap::new(SparcArch::V8, v8::TT_WIN_OVF);
    assert_eq!(trap.to_string(), "tt=0x005 (priority 9)");
}

// ── V8 trap entry ────────────────────────────────────────────────

fn v8_running() -> SparcCpu {
    let mut env = v8_cpu();
    env.wim = 0;
    env.psret = true;
    env.tbr = 0x4000_0000;
    env.pc = 0x1000;
    env.npc = 0x1004;
    env
}

#[test]
fn v8_trap_entry() {
    let mut env = v8_running();
    env.psrs = false;
    env.do_interrupt(Trap::new(SparcArch::V8, v8::TT_WIN_OVF))
        .unwrap();
    assert_eq!(env.cwp, 7);
    assert_eq!(env.reg(17), 0x1000);
    assert_eq!(env.reg(18), 0x1004);
    assert!(env.psrs);
    assert!(!env.psrps);
    assert!(!env.psret);
    assert_eq!(env.tbr, 0x4000_0050);
    assert_eq!((env.pc, env.npc), (0x4000_0050, 0x4000_0054));
}

#[test]
fn v8_trap_with_traps_disabled() {
    let mut env = v8_running();
    env.psret = false;
    assert_eq!(
        env.do_interrupt(Trap::new(SparcArch::V8, v8::TT_ILL_INSN)),
        Err(CpuError::ErrorState { tt: v8::TT_ILL_INSN })
    );
    assert_eq!(env.pc, 0x1000);
    assert_eq!(env.cwp, 0);
}

#[test]
fn v8_ta0_shutdown() {
    let mut env = v8_running();
    env.psret = false;
    assert_eq!(
        env.do_interrupt(Trap::new(SparcArch::V8, v8::TT_TRAP)),
        Err(CpuError::Shutdown)
    );

    let mut cfg = SparcCfg::SPARC32_LEON3;
    cfg.features = cfg
        .features
        .difference(tcg_frontend::sparc::CpuFeatures::TA0_SHUTDOWN);
    let mut plain = super::cpu(cfg);
    assert_eq!(
        plain.do_interrupt(Trap::new(SparcArch::V8, v8::TT_TRAP)),
        Err(CpuError::ErrorState { tt: v8::TT_TRAP })
    );
}

#[test]
fn v8_interrupt_acknowledged_on_entry() {
    let mut env = v8_running();
    env.set_pil_in(1 << 10);
    assert!(env.interrupt_pending());
    assert_eq!(env.interrupt_index, 0x1a);
    env.do_interrupt(Trap::new(SparcArch::V8, 0x1a)).unwrap();
    assert!(!env.interrupt_pending());
    assert_eq!(env.interrupt_index, 0);
}

#[test]
fn v8_pil_masks_interrupts() {
    let mut env = v8_running();
    env.psrpil = 12;
    env.set_pil_in(1 << 10);
    assert!(!env.interrupt_pending());
    env.set_pil_in(1 << 15);
    assert!(env.interrupt_pending());
}

// ── V9 trap entry ────────────────────────────────────────────────

fn v9_running() -> SparcCpu {
    let mut env = v9_cpu();
    env.tl = 0;
    env.pstate = PS_PRIV | PS_PEF | PS_IE;
    env.tbr = 0x1_0000_0000;
    env.pc = 0x2000;
    env.npc = 0x2004;
    env.put_ccr(0x35);
    env.asi = 0x80;
    env
}

#[test]
fn v9_trap_entry_saves_state() {
    let mut env = v9_running();
    env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_TRAP))
        .unwrap();
    assert_eq!(env.tl, 1);
    let ts = env.ts[1];
    assert_eq!((ts.tpc, ts.tnpc, ts.tt), (0x2000, 0x2004, v9::TT_TRAP));
    assert_eq!(ts.tstate, 0x35_8000_1607);
    assert_eq!(env.pstate, PS_PEF | PS_PRIV | PS_AG);
    assert_eq!(env.pc, 0x1_0000_2000);
    assert_eq!(env.npc, 0x1_0000_2004);
}

#[test]
fn v9_nested_trap_uses_upper_table() {
    let mut env = v9_running();
    env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_TRAP))
        .unwrap();
    env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_CLRWIN))
        .unwrap();
    assert_eq!(env.tl, 2);
    assert_eq!(env.pc, 0x1_0000_0000 | (1 << 14) | (0x24 << 5));
    assert_eq!(env.cwp, 7);
}

#[test]
fn v9_spill_entry_moves_window() {
    let mut env = v9_running();
    env.cansave = 0;
    env.canrestore = 6;
    env.cwp = 2;
    env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_SPILL | 0x8))
        .unwrap();
    assert_eq!(env.cwp, 0);
}

#[test]
fn v9_red_state_near_maxtl() {
    let mut env = v9_running();
    env.tl = 3;
    env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_TRAP))
        .unwrap();
    assert_eq!(env.pstate & PS_RED, 0);
    env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_TRAP))
        .unwrap();
    assert_eq!(env.tl, 5);
    assert_ne!(env.pstate & PS_RED, 0);
    assert_eq!(
        env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_TRAP)),
        Err(CpuError::ErrorState { tt: v9::TT_TRAP })
    );
    assert_eq!(env.tl, 5);
}

#[test]
fn sun4v_trap_bumps_gl() {
    let mut env = super::sun4v_cpu();
    env.tl = 0;
    env.gl = 0;
    env.do_interrupt(Trap::new(SparcArch::V9, v9::TT_TRAP))
        .unwrap();
    assert_eq!(env.gl, 1);
    assert_eq!((env.ts[1].tstate >> 40) & 7, 0);
}
