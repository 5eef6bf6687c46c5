//! SPARC CPU architectural state.
//!
//! One `SparcCpu` per emulated processor, owned by the thread that
//! executes it. Helpers receive it as `&mut SparcCpu`; everything a
//! helper may read or modify lives here.

use std::sync::Arc;

use tcg_core::HaltSignal;

use super::cfg::{CpuFeatures, SparcArch, SparcCfg};
use super::error::ConfigError;
use super::timer::CpuTimer;
use super::trap::{v8, v9};

// ── Register file geometry ───────────────────────────────────────

/// Number of architectural integer registers (%g0-%i7).
pub const NUM_REGS: usize = 32;
/// Registers per window held in the circular file (locals + ins).
pub const WINDOW_REGS: usize = 16;
/// Global register banks: AG/MG/IG on sun4u, GL levels on sun4v.
pub const NUM_GLOBAL_BANKS: usize = 8;
/// Number of 64-bit FP registers (%d0-%d62).
pub const NUM_FPRS: usize = 32;

// ── PSR (V8) ─────────────────────────────────────────────────────

pub const PSR_CWP: u32 = 0x1f;
pub const PSR_ET: u32 = 1 << 5;
pub const PSR_PS: u32 = 1 << 6;
pub const PSR_S: u32 = 1 << 7;
pub const PSR_PIL_SHIFT: u32 = 8;
pub const PSR_PIL: u32 = 0xf << PSR_PIL_SHIFT;
pub const PSR_EF: u32 = 1 << 12;
pub const PSR_EC: u32 = 1 << 13;
pub const PSR_ICC_SHIFT: u32 = 20;
pub const PSR_ICC: u32 = 0xf << PSR_ICC_SHIFT;
pub const PSR_VERSION: u32 = 0xff00_0000;

pub const TBR_BASE_MASK: u64 = 0xffff_f000;

// ── PSTATE / HPSTATE (V9) ────────────────────────────────────────

pub const PS_AG: u32 = 1 << 0;
pub const PS_IE: u32 = 1 << 1;
pub const PS_PRIV: u32 = 1 << 2;
pub const PS_AM: u32 = 1 << 3;
pub const PS_PEF: u32 = 1 << 4;
pub const PS_RED: u32 = 1 << 5;
pub const PS_MG: u32 = 1 << 10;
pub const PS_IG: u32 = 1 << 11;
/// Writable PSTATE bits.
pub const PSTATE_MASK: u32 = 0xf3f;
/// PSTATE bits selecting the global bank on sun4u.
pub const PSTATE_GREGS_MASK: u32 = PS_AG | PS_MG | PS_IG;

pub const HS_PRIV: u64 = 1 << 2;

pub const FPRS_FEF: u32 = 1 << 2;

// ── SOFTINT ──────────────────────────────────────────────────────

/// TICK_INT: tick compare match, delivered at level 14.
pub const SOFTINT_TIMER: u32 = 1;
/// STICK_INT: system tick compare match, delivered at level 14.
pub const SOFTINT_STIMER: u32 = 1 << 16;
/// Software interrupt levels 1..15.
pub const SOFTINT_INTRMASK: u32 = 0xfffe;

// ── MMU control ──────────────────────────────────────────────────

/// SRMMU control: translation enable.
pub const MMU_E: u32 = 1 << 0;
/// SRMMU control: no-fault.
pub const MMU_NF: u32 = 1 << 1;
/// LSU control: instruction MMU enable.
pub const IMMU_E: u64 = 1 << 2;
/// LSU control: data MMU enable.
pub const DMMU_E: u64 = 1 << 3;

/// MMU translation regime, ordered by privilege.
///
/// Maps to QEMU's `MMU_*_IDX` constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MmuIdx {
    User = 0,
    UserSecondary = 1,
    Kernel = 2,
    KernelSecondary = 3,
    Nucleus = 4,
    Hypervisor = 5,
    Phys = 6,
}

impl MmuIdx {
    pub const fn from_raw(raw: u8) -> Option<MmuIdx> {
        Some(match raw {
            0 => MmuIdx::User,
            1 => MmuIdx::UserSecondary,
            2 => MmuIdx::Kernel,
            3 => MmuIdx::KernelSecondary,
            4 => MmuIdx::Nucleus,
            5 => MmuIdx::Hypervisor,
            6 => MmuIdx::Phys,
            _ => return None,
        })
    }

    pub const fn is_user(self) -> bool {
        matches!(self, MmuIdx::User | MmuIdx::UserSecondary)
    }
}

#[inline]
const fn flag(set: bool, mask: u32) -> u32 {
    if set {
        mask
    } else {
        0
    }
}

/// One V9 trap-stack level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapState {
    pub tpc: u64,
    pub tnpc: u64,
    pub tstate: u64,
    pub tt: u32,
}

/// sun4u I/D-MMU register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MmuState {
    pub sfsr: u64,
    pub sfar: u64,
    pub tsb: u64,
    pub tag_access: u64,
    pub primary_context: u64,
    pub secondary_context: u64,
    pub virt_watchpoint: u64,
    pub phys_watchpoint: u64,
}

/// SPARC CPU architectural state.
pub struct SparcCpu {
    pub cfg: SparcCfg,
    pub cpu_index: u32,

    /// Active global registers. `gregs[0]` is never read.
    pub gregs: [u64; 8],
    /// Inactive global banks.
    pub gbanks: [[u64; 8]; NUM_GLOBAL_BANKS],
    /// Circular window file, `nwindows * 16` entries.
    pub regbase: Vec<u64>,
    /// Current window pointer. SAVE decrements it on both
    /// architectures; the V9 `%cwp` register is `nwindows-1-cwp`.
    pub cwp: u32,

    pub pc: u64,
    pub npc: u64,
    pub y: u64,
    /// Integer condition codes, NZVC in bits 3:0.
    pub icc: u32,
    /// 64-bit condition codes (V9), NZVC in bits 3:0.
    pub xcc: u32,

    // V8 privileged state.
    pub psrs: bool,
    pub psrps: bool,
    pub psret: bool,
    /// Processor interrupt level; `%pil` on V9.
    pub psrpil: u32,
    pub psref: bool,
    pub wim: u32,
    /// Trap base: `%tbr` on V8, `%tba` on V9.
    pub tbr: u64,

    // V9 privileged state.
    pub pstate: u32,
    pub tl: u32,
    pub gl: u32,
    pub cansave: u32,
    pub canrestore: u32,
    pub otherwin: u32,
    pub cleanwin: u32,
    pub wstate: u32,
    pub asi: u32,
    pub fprs: u32,
    pub gsr: u64,
    /// Trap stack, indexed by trap level (`maxtl + 1` entries).
    pub ts: Vec<TrapState>,
    pub hpstate: u64,
    pub htstate: Vec<u64>,
    pub htba: u64,

    // Floating point.
    pub fpr: [u64; NUM_FPRS],
    /// FSR RD, TEM and AEXC fields.
    pub fsr: u64,
    /// FSR CEXC and FTT fields.
    pub fsr_cexc_ftt: u32,
    pub fcc: [u32; 4],

    // Interrupts.
    pub softint: u32,
    /// External interrupt lines, bit n = level n.
    pub pil_in: u32,
    /// Trap type of the highest pending interrupt, 0 if none.
    pub interrupt_index: u32,
    /// `interrupt_index` is deliverable now.
    pub interrupt_request: bool,

    // MMU.
    /// SRMMU registers (V8): control, ctp, context, fsr, far.
    pub mmuregs: [u32; 32],
    /// LSU control register (V9).
    pub lsu: u64,
    pub immu: MmuState,
    pub dmmu: MmuState,
    /// LEON cache control register.
    pub cache_control: u32,

    pub halted: bool,
    pub halt: Arc<HaltSignal>,

    pub tick: Option<Arc<CpuTimer>>,
    pub stick: Option<Arc<CpuTimer>>,
    pub hstick: Option<Arc<CpuTimer>>,
}

impl SparcCpu {
    /// Build a CPU in its reset state.
    pub fn new(cfg: SparcCfg, cpu_index: u32) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let nwindows = cfg.nwindows as usize;
        let levels = cfg.maxtl as usize + 1;
        let mut cpu = Self {
            cfg,
            cpu_index,
            gregs: [0; 8],
            gbanks: [[0; 8]; NUM_GLOBAL_BANKS],
            regbase: vec![0; nwindows * WINDOW_REGS],
            cwp: 0,
            pc: 0,
            npc: 4,
            y: 0,
            icc: 0,
            xcc: 0,
            psrs: false,
            psrps: false,
            psret: false,
            psrpil: 0,
            psref: false,
            wim: 0,
            tbr: 0,
            pstate: 0,
            tl: 0,
            gl: 0,
            cansave: 0,
            canrestore: 0,
            otherwin: 0,
            cleanwin: 0,
            wstate: 0,
            asi: 0,
            fprs: 0,
            gsr: 0,
            ts: vec![TrapState::default(); levels],
            hpstate: 0,
            htstate: vec![0; levels],
            htba: 0,
            fpr: [0; NUM_FPRS],
            fsr: 0,
            fsr_cexc_ftt: 0,
            fcc: [0; 4],
            softint: 0,
            pil_in: 0,
            interrupt_index: 0,
            interrupt_request: false,
            mmuregs: [0; 32],
            lsu: 0,
            immu: MmuState::default(),
            dmmu: MmuState::default(),
            cache_control: 0,
            halted: false,
            halt: Arc::new(HaltSignal::new()),
            tick: None,
            stick: None,
            hstick: None,
        };
        cpu.reset();
        Ok(cpu)
    }

    /// Put the CPU into its power-on state.
    ///
    /// Maps to QEMU's `sparc_cpu_reset_hold`.
    pub fn reset(&mut self) {
        let nwindows = self.cfg.nwindows;
        self.gregs = [0; 8];
        self.gbanks = [[0; 8]; NUM_GLOBAL_BANKS];
        self.regbase.iter_mut().for_each(|r| *r = 0);
        self.cwp = 0;
        self.pc = 0;
        self.npc = 4;
        self.cansave = nwindows - 2;
        self.canrestore = 0;
        self.otherwin = 0;
        self.cleanwin = nwindows - 2;
        self.fsr = 0;
        self.fsr_cexc_ftt = 0;
        self.fcc = [0; 4];
        self.softint = 0;
        self.pil_in = 0;
        self.interrupt_index = 0;
        self.interrupt_request = false;
        self.halted = false;
        self.ts.iter_mut().for_each(|t| *t = TrapState::default());

        match (self.cfg.arch, self.cfg.user_only) {
            (SparcArch::V8, false) => {
                self.wim = 1;
                self.psret = false;
                self.psrs = true;
                self.psrps = true;
                self.mmuregs[0] = self.cfg.mmu_version & !(MMU_E | MMU_NF);
            }
            (SparcArch::V8, true) => {
                self.wim = 1;
                self.psret = true;
                self.psrs = false;
                self.psrps = false;
                self.psref = self.cfg.has(CpuFeatures::FLOAT);
            }
            (SparcArch::V9, false) => {
                self.pstate = PS_PRIV | PS_RED | PS_PEF;
                self.hpstate = if self.cfg.has_hypervisor() {
                    HS_PRIV
                } else {
                    0
                };
                self.tl = self.cfg.maxtl;
                self.ts[self.tl as usize].tt = 0x001;
                self.lsu = 0;
            }
            (SparcArch::V9, true) => {
                self.pstate = PS_PEF | PS_IE;
                self.tl = 0;
                self.asi = 0x82;
                self.fprs = FPRS_FEF;
            }
        }
        log::debug!(
            "cpu{} reset: {} nwindows={}",
            self.cpu_index,
            self.cfg.name,
            nwindows
        );
    }

    #[inline]
    pub fn nwindows(&self) -> u32 {
        self.cfg.nwindows
    }

    #[inline]
    pub fn is_v9(&self) -> bool {
        self.cfg.is_v9()
    }

    // -- Integer registers --

    fn window_index(&self, cwp: u32, r: usize) -> usize {
        let size = self.regbase.len();
        (cwp as usize * WINDOW_REGS + (r - 8)) % size
    }

    /// Read integer register `r` of the current window.
    pub fn reg(&self, r: usize) -> u64 {
        match r & 31 {
            0 => 0,
            g @ 1..=7 => self.gregs[g],
            w => self.regbase[self.window_index(self.cwp, w)],
        }
    }

    /// Write integer register `r` of the current window.
    pub fn set_reg(&mut self, r: usize, val: u64) {
        match r & 31 {
            0 => {}
            g @ 1..=7 => self.gregs[g] = val,
            w => {
                let idx = self.window_index(self.cwp, w);
                self.regbase[idx] = val;
            }
        }
    }

    // -- Window pointer --

    /// Window index `delta` steps from the current one.
    #[inline]
    pub fn cwp_offset(&self, delta: i32) -> u32 {
        (self.cwp as i64 + delta as i64).rem_euclid(self.nwindows() as i64)
            as u32
    }

    /// Move the window pointer. The circular register file makes
    /// this a plain index update.
    pub fn set_cwp(&mut self, new_cwp: u32) {
        log::trace!("cpu{} cwp {} -> {}", self.cpu_index, self.cwp, new_cwp);
        self.cwp = new_cwp;
    }

    /// V9 `%cwp` view of the window pointer.
    pub fn get_cwp64(&self) -> u32 {
        self.nwindows() - 1 - self.cwp
    }

    pub fn put_cwp64(&mut self, cwp: u32) {
        let cwp = cwp % self.nwindows();
        self.set_cwp(self.nwindows() - 1 - cwp);
    }

    // -- PSR / CCR --

    pub fn get_psr(&self) -> u32 {
        (self.cfg.iu_version as u32 & PSR_VERSION)
            | (self.icc << PSR_ICC_SHIFT)
            | flag(self.psref, PSR_EF)
            | (self.psrpil << PSR_PIL_SHIFT)
            | flag(self.psrs, PSR_S)
            | flag(self.psrps, PSR_PS)
            | flag(self.psret, PSR_ET)
            | self.cwp
    }

    /// Write all PSR fields. `CWP` must already be validated.
    pub fn put_psr_raw(&mut self, val: u32) {
        self.icc = (val & PSR_ICC) >> PSR_ICC_SHIFT;
        self.psref = val & PSR_EF != 0 && self.cfg.has(CpuFeatures::FLOAT);
        self.psrpil = (val & PSR_PIL) >> PSR_PIL_SHIFT;
        self.psrs = val & PSR_S != 0;
        self.psrps = val & PSR_PS != 0;
        self.psret = val & PSR_ET != 0;
        self.set_cwp(val & PSR_CWP);
    }

    pub fn put_psr(&mut self, val: u32) {
        self.put_psr_raw(val);
        self.check_irqs();
    }

    pub fn get_ccr(&self) -> u32 {
        (self.xcc << 4) | self.icc
    }

    pub fn put_ccr(&mut self, val: u32) {
        self.xcc = (val >> 4) & 0xf;
        self.icc = val & 0xf;
    }

    // -- Privilege --

    pub fn is_supervisor(&self) -> bool {
        match self.cfg.arch {
            SparcArch::V8 => self.psrs,
            SparcArch::V9 => {
                self.pstate & PS_PRIV != 0 || self.is_hypervisor()
            }
        }
    }

    pub fn is_hypervisor(&self) -> bool {
        self.cfg.has_hypervisor() && self.hpstate & HS_PRIV != 0
    }

    pub fn interrupts_enabled(&self) -> bool {
        match self.cfg.arch {
            SparcArch::V8 => self.psret,
            SparcArch::V9 => {
                if self.is_hypervisor() {
                    false
                } else {
                    self.pstate & PS_IE != 0
                }
            }
        }
    }

    /// MMU index for data accesses in the current mode.
    pub fn mmu_index(&self) -> MmuIdx {
        if self.cfg.user_only {
            return MmuIdx::User;
        }
        match self.cfg.arch {
            SparcArch::V8 => {
                if self.mmuregs[0] & MMU_E == 0 {
                    MmuIdx::Phys
                } else if self.psrs {
                    MmuIdx::Kernel
                } else {
                    MmuIdx::User
                }
            }
            SparcArch::V9 => {
                if self.lsu & DMMU_E == 0 {
                    MmuIdx::Phys
                } else if self.is_hypervisor() {
                    MmuIdx::Hypervisor
                } else if self.tl > 0 {
                    MmuIdx::Nucleus
                } else if self.pstate & PS_PRIV != 0 {
                    MmuIdx::Kernel
                } else {
                    MmuIdx::User
                }
            }
        }
    }

    // -- Global register banks --

    fn switch_gregs(&mut self, from: usize, to: usize) {
        self.gbanks[from] = self.gregs;
        self.gregs = self.gbanks[to];
    }

    fn pstate_bank(&self, pstate: u32) -> usize {
        match pstate & PSTATE_GREGS_MASK {
            0 => 0,
            PS_AG => 1,
            PS_MG => 2,
            PS_IG => 3,
            bad => {
                log::warn!("pstate global bits {bad:#x} not implemented");
                0
            }
        }
    }

    /// Install a new PSTATE, switching the global bank if AG/MG/IG
    /// changed.
    ///
    /// Maps to QEMU's `cpu_change_pstate`.
    pub fn change_pstate(&mut self, new_pstate: u32) {
        if self.cfg.has(CpuFeatures::GL) {
            self.pstate = new_pstate & !PSTATE_GREGS_MASK;
            return;
        }
        let old_bank = self.pstate_bank(self.pstate);
        let new_bank = self.pstate_bank(new_pstate);
        if old_bank != new_bank {
            log::trace!(
                "cpu{} switch pstate gregs {:#x} -> {:#x}",
                self.cpu_index,
                self.pstate & PSTATE_GREGS_MASK,
                new_pstate & PSTATE_GREGS_MASK
            );
            self.switch_gregs(old_bank, new_bank);
        }
        self.pstate = new_pstate;
    }

    /// Install a new global level, switching the global bank.
    pub fn gl_switch(&mut self, new_gl: u32) {
        let new_gl = new_gl & 7;
        if new_gl != self.gl {
            self.switch_gregs(self.gl as usize, new_gl as usize);
        }
        self.gl = new_gl;
    }

    // -- Interrupts --

    /// Drive the external interrupt lines and re-evaluate.
    pub fn set_pil_in(&mut self, lines: u32) {
        self.pil_in = lines & 0xfffe;
        self.check_irqs();
    }

    /// Recompute the highest pending interrupt.
    ///
    /// Maps to QEMU's `cpu_check_irqs`.
    pub fn check_irqs(&mut self) {
        let (pending, base) = match self.cfg.arch {
            SparcArch::V8 => (self.pil_in, v8::TT_EXTINT),
            SparcArch::V9 => {
                let mut pil = self.pil_in
                    | (self.softint & !(SOFTINT_TIMER | SOFTINT_STIMER));
                if self.softint & (SOFTINT_TIMER | SOFTINT_STIMER) != 0 {
                    pil |= 1 << 14;
                }
                (pil & 0xfffe, v9::TT_EXTINT)
            }
        };
        if pending == 0 {
            self.interrupt_index = 0;
            self.interrupt_request = false;
            return;
        }
        let level = 31 - pending.leading_zeros();
        let new_index = base | level;
        let in_trap = self.is_v9() && self.tl > 0;
        if in_trap && self.ts[self.tl as usize].tt > new_index {
            // A higher-numbered trap is being handled; leave it be.
            return;
        }
        if self.interrupt_index != new_index {
            log::trace!("cpu{} irq pending: level {level}", self.cpu_index);
        }
        self.interrupt_index = new_index;
        let unmasked = level > self.psrpil || (!self.is_v9() && level == 15);
        self.interrupt_request = unmasked && self.interrupts_enabled();
    }

    /// An interrupt is pending and deliverable.
    ///
    /// `interrupt_request` is only recomputed while interrupts are
    /// enabled, so the enable state and PIL are checked again here.
    pub fn interrupt_pending(&self) -> bool {
        let level = self.interrupt_index & 0xf;
        let unmasked = level > self.psrpil || (!self.is_v9() && level == 15);
        self.interrupt_request
            && self.interrupt_index != 0
            && unmasked
            && self.interrupts_enabled()
    }
}
