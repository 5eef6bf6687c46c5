//! Trap types, priorities and trap entry.
//!
//! A helper that detects an exceptional condition returns
//! `Err(CpuExit::Trap(..))`. The caller propagates it with `?` out to
//! the execution loop, which hands it to [`SparcCpu::do_interrupt`].

use std::convert::Infallible;
use std::fmt;

use thiserror::Error;

use super::cfg::{CpuFeatures, SparcArch};
use super::cpu::*;
use super::error::CpuError;

/// V8 trap types.
pub mod v8 {
    pub const TT_TFAULT: u32 = 0x01;
    pub const TT_ILL_INSN: u32 = 0x02;
    pub const TT_PRIV_INSN: u32 = 0x03;
    pub const TT_NFPU_INSN: u32 = 0x04;
    pub const TT_WIN_OVF: u32 = 0x05;
    pub const TT_WIN_UNF: u32 = 0x06;
    pub const TT_UNALIGNED: u32 = 0x07;
    pub const TT_FP_EXCP: u32 = 0x08;
    pub const TT_DFAULT: u32 = 0x09;
    pub const TT_TOVF: u32 = 0x0a;
    pub const TT_EXTINT: u32 = 0x10;
    pub const TT_CODE_ACCESS: u32 = 0x21;
    pub const TT_DATA_ACCESS: u32 = 0x29;
    pub const TT_DIV_ZERO: u32 = 0x2a;
    pub const TT_TRAP: u32 = 0x80;
}

/// V9 trap types.
pub mod v9 {
    pub const TT_POWER_ON_RESET: u32 = 0x01;
    pub const TT_TFAULT: u32 = 0x08;
    pub const TT_CODE_ACCESS: u32 = 0x0a;
    pub const TT_ILL_INSN: u32 = 0x10;
    pub const TT_PRIV_INSN: u32 = 0x11;
    pub const TT_NFPU_INSN: u32 = 0x20;
    pub const TT_FP_EXCP: u32 = 0x21;
    pub const TT_TOVF: u32 = 0x23;
    pub const TT_CLRWIN: u32 = 0x24;
    pub const TT_DIV_ZERO: u32 = 0x28;
    pub const TT_DFAULT: u32 = 0x30;
    pub const TT_DATA_ACCESS: u32 = 0x32;
    pub const TT_UNALIGNED: u32 = 0x34;
    pub const TT_PRIV_ACT: u32 = 0x37;
    pub const TT_EXTINT: u32 = 0x40;
    pub const TT_IVEC: u32 = 0x60;
    pub const TT_DMISS: u32 = 0x68;
    pub const TT_DPROT: u32 = 0x6c;
    pub const TT_SPILL: u32 = 0x80;
    pub const TT_FILL: u32 = 0xc0;
    pub const TT_WOTHER: u32 = 0x20;
    pub const TT_TRAP: u32 = 0x100;
    pub const TT_HTRAP: u32 = 0x180;
}

/// Trap conditions shared by both architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrapKind {
    InstructionAccessException,
    InstructionAccessError,
    IllegalInstruction,
    /// `privileged_instruction` (V8) / `privileged_opcode` (V9).
    PrivilegedInstruction,
    FpDisabled,
    FpException,
    TagOverflow,
    DivisionByZero,
    DataAccessException,
    DataAccessError,
    MemAddressNotAligned,
}

impl TrapKind {
    pub const fn tt(self, arch: SparcArch) -> u32 {
        use TrapKind::*;
        match arch {
            SparcArch::V8 => match self {
                InstructionAccessException => v8::TT_TFAULT,
                InstructionAccessError => v8::TT_CODE_ACCESS,
                IllegalInstruction => v8::TT_ILL_INSN,
                PrivilegedInstruction => v8::TT_PRIV_INSN,
                FpDisabled => v8::TT_NFPU_INSN,
                FpException => v8::TT_FP_EXCP,
                TagOverflow => v8::TT_TOVF,
                DivisionByZero => v8::TT_DIV_ZERO,
                DataAccessException => v8::TT_DFAULT,
                DataAccessError => v8::TT_DATA_ACCESS,
                MemAddressNotAligned => v8::TT_UNALIGNED,
            },
            SparcArch::V9 => match self {
                InstructionAccessException => v9::TT_TFAULT,
                InstructionAccessError => v9::TT_CODE_ACCESS,
                IllegalInstruction => v9::TT_ILL_INSN,
                PrivilegedInstruction => v9::TT_PRIV_INSN,
                FpDisabled => v9::TT_NFPU_INSN,
                FpException => v9::TT_FP_EXCP,
                TagOverflow => v9::TT_TOVF,
                DivisionByZero => v9::TT_DIV_ZERO,
                DataAccessException => v9::TT_DFAULT,
                DataAccessError => v9::TT_DATA_ACCESS,
                MemAddressNotAligned => v9::TT_UNALIGNED,
            },
        }
    }
}

/// Architectural priority of trap type `tt`; lower is more urgent.
pub const fn priority(arch: SparcArch, tt: u32) -> u8 {
    match arch {
        SparcArch::V8 => match tt {
            0x01 => 5,
            0x02 => 7,
            0x03 => 6,
            0x04 | 0x0b | 0x24 | 0x25 => 8,
            0x05 | 0x06 => 9,
            0x07 => 10,
            0x08 | 0x28 => 11,
            0x09 => 13,
            0x0a => 14,
            0x11..=0x1f => 32 - (tt & 0xf) as u8,
            0x20 => 4,
            0x21 => 3,
            0x29 | 0x2c => 12,
            0x2a => 15,
            0x2b | 0x3c => 2,
            _ => 16,
        },
        SparcArch::V9 => match tt {
            0x001..=0x005 => 1,
            0x008 => 5,
            0x009 | 0x040 | 0x064..=0x067 => 2,
            0x00a => 3,
            0x029 => 4,
            0x011..=0x013 => 6,
            0x010 => 7,
            0x020 => 8,
            0x080..=0x0ff => 9,
            0x024..=0x027 | 0x034..=0x036 | 0x038 | 0x039 => 10,
            0x021 | 0x022 | 0x037 => 11,
            0x030..=0x033 | 0x068..=0x06f => 12,
            0x023 => 14,
            0x028 => 15,
            0x041..=0x04f => 32 - (tt & 0xf) as u8,
            _ => 16,
        },
    }
}

/// A trap about to be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trap {
    pub tt: u32,
    pub priority: u8,
}

impl Trap {
    pub const fn new(arch: SparcArch, tt: u32) -> Self {
        Self {
            tt,
            priority: priority(arch, tt),
        }
    }

    pub const fn of(arch: SparcArch, kind: TrapKind) -> Self {
        Self::new(arch, kind.tt(arch))
    }

    /// The most urgent of several simultaneous traps. Ties keep the
    /// first.
    pub fn highest<I>(traps: I) -> Option<Trap>
    where
        I: IntoIterator<Item = Trap>,
    {
        traps.into_iter().fold(None, |best, t| match best {
            Some(b) if b.priority <= t.priority => Some(b),
            _ => Some(t),
        })
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tt={:#05x} (priority {})", self.tt, self.priority)
    }
}

/// Non-local exit from a helper back to the execution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuExit {
    #[error("trap {0}")]
    Trap(Trap),
    /// Debug exception (breakpoint helper).
    #[error("debug exception")]
    Debug,
    /// Reset requested while halted.
    #[error("reset")]
    Reset,
}

impl From<Trap> for CpuExit {
    fn from(trap: Trap) -> Self {
        CpuExit::Trap(trap)
    }
}

/// Return type of every helper that can trap.
pub type HelperResult<T> = Result<T, CpuExit>;

impl SparcCpu {
    /// Build the exit for a shared trap condition.
    pub fn trap(&self, kind: TrapKind) -> CpuExit {
        self.trap_tt(kind.tt(self.cfg.arch))
    }

    /// Build the exit for a raw trap type.
    pub fn trap_tt(&self, tt: u32) -> CpuExit {
        let trap = Trap::new(self.cfg.arch, tt);
        log::debug!(
            "cpu{} raise {} at pc={:#x}",
            self.cpu_index,
            trap,
            self.pc
        );
        CpuExit::Trap(trap)
    }

    /// Compose the V9 `TSTATE` image of the current state.
    pub fn tstate(&self) -> u64 {
        let mut tstate = ((self.get_ccr() as u64) << 32)
            | (((self.asi & 0xff) as u64) << 24)
            | (((self.pstate & PSTATE_MASK) as u64) << 8)
            | self.get_cwp64() as u64;
        if self.cfg.has(CpuFeatures::GL) {
            tstate |= ((self.gl & 7) as u64) << 40;
        }
        tstate
    }

    /// Take a trap: save state and vector to the handler.
    ///
    /// Maps to QEMU's `sparc_cpu_do_interrupt`.
    pub fn do_interrupt(&mut self, trap: Trap) -> Result<(), CpuError> {
        log::debug!(
            "cpu{} trap entry {} pc={:#x} npc={:#x}",
            self.cpu_index,
            trap,
            self.pc,
            self.npc
        );
        match self.cfg.arch {
            SparcArch::V8 => self.do_interrupt_v8(trap.tt)?,
            SparcArch::V9 => self.do_interrupt_v9(trap.tt)?,
        }
        self.halted = false;
        let base = if self.is_v9() {
            v9::TT_EXTINT
        } else {
            v8::TT_EXTINT
        };
        if trap.tt & !0xf == base && trap.tt == self.interrupt_index {
            self.interrupt_index = 0;
            self.interrupt_request = false;
        }
        Ok(())
    }

    fn do_interrupt_v8(&mut self, tt: u32) -> Result<(), CpuError> {
        if !self.psret {
            if tt == v8::TT_TRAP && self.cfg.has(CpuFeatures::TA0_SHUTDOWN)
            {
                return Err(CpuError::Shutdown);
            }
            log::warn!("cpu{} trap {tt:#x} with ET=0", self.cpu_index);
            return Err(CpuError::ErrorState { tt });
        }
        self.psret = false;
        self.set_cwp(self.cwp_offset(-1));
        self.set_reg(17, self.pc);
        self.set_reg(18, self.npc);
        self.psrps = self.psrs;
        self.psrs = true;
        self.tbr = (self.tbr & TBR_BASE_MASK) | ((tt as u64) << 4);
        self.pc = self.tbr;
        self.npc = self.pc + 4;
        Ok(())
    }

    fn do_interrupt_v9(&mut self, tt: u32) -> Result<(), CpuError> {
        let maxtl = self.cfg.maxtl;
        if self.tl >= maxtl {
            log::warn!(
                "cpu{} trap {tt:#x} at TL={} >= MAXTL",
                self.cpu_index,
                self.tl
            );
            return Err(CpuError::ErrorState { tt });
        }
        if self.tl + 1 >= maxtl {
            self.pstate |= PS_RED;
        }
        self.tl += 1;

        let tstate = self.tstate();
        let level = self.tl as usize;
        self.ts[level] = TrapState {
            tpc: self.pc,
            tnpc: self.npc,
            tstate,
            tt,
        };

        let hypv = self.cfg.has_hypervisor();
        if hypv {
            self.htstate[level] = self.hpstate;
            if self.tl > 2 {
                self.hpstate |= HS_PRIV;
            }
        }
        if self.cfg.has(CpuFeatures::GL) {
            self.gl_switch(self.gl + 1);
        }

        let red = self.pstate & PS_RED;
        match tt {
            v9::TT_IVEC => {
                if !hypv {
                    self.change_pstate(PS_PEF | PS_PRIV | PS_IG | red);
                }
            }
            v9::TT_TFAULT
            | v9::TT_DFAULT
            | 0x64..=0x67
            | 0x68..=0x6b
            | 0x6c..=0x6f => {
                if hypv {
                    self.hpstate |= HS_PRIV;
                    self.pstate = PS_PEF | PS_PRIV | red;
                } else {
                    self.change_pstate(PS_PEF | PS_PRIV | PS_MG | red);
                }
            }
            _ => self.change_pstate(PS_PEF | PS_PRIV | PS_AG | red),
        }

        if tt == v9::TT_CLRWIN {
            self.set_cwp(self.cwp_offset(-1));
        } else if tt & 0x1c0 == v9::TT_SPILL {
            let delta = -(self.cansave as i32) - 2;
            self.set_cwp(self.cwp_offset(delta));
        } else if tt & 0x1c0 == v9::TT_FILL {
            self.set_cwp(self.cwp_offset(1));
        }

        self.pc = self.tbr & !0x7fff;
        if self.tl > 1 {
            self.pc |= 1 << 14;
        }
        self.pc |= (tt as u64) << 5;
        self.npc = self.pc + 4;
        Ok(())
    }
}

/// Unconditionally raise trap `tt`.
pub fn raise_exception(env: &SparcCpu, tt: u32) -> Result<Infallible, CpuExit> {
    Err(env.trap_tt(tt))
}
