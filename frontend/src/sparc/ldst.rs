//! Alternate-space (ASI) load and store helpers.
//!
//! An ASI selects either an address space in guest memory (with its
//! own MMU regime, byte order and fault behaviour) or an internal
//! register file such as the MMU control registers. Decoding the ASI,
//! checking privilege and alignment, and composing the bytes all
//! happen here; the [`GuestMemory`] backend only moves bytes.

use tcg_core::{AccessCtx, AccessType, GuestMemory, MemFault, MemOp, MemOpIdx};

use super::cfg::{CpuFeatures, SparcArch};
use super::cpu::*;
use super::trap::{v9, CpuExit, HelperResult, Trap, TrapKind};

/// V8 ASI numbers.
pub mod asi_v8 {
    pub const ASI_CACHECTL: u32 = 0x02;
    pub const ASI_MMUFLUSH: u32 = 0x03;
    pub const ASI_MMUREGS: u32 = 0x04;
    pub const ASI_USERTXT: u32 = 0x08;
    pub const ASI_KERNELTXT: u32 = 0x09;
    pub const ASI_USERDATA: u32 = 0x0a;
    pub const ASI_KERNELDATA: u32 = 0x0b;
    pub const ASI_BYPASS: u32 = 0x20;
}

/// V9 ASI numbers.
pub mod asi_v9 {
    pub const ASI_N: u32 = 0x04;
    pub const ASI_NL: u32 = 0x0c;
    pub const ASI_AIUP: u32 = 0x10;
    pub const ASI_AIUS: u32 = 0x11;
    pub const ASI_REAL: u32 = 0x14;
    pub const ASI_REAL_IO: u32 = 0x15;
    pub const ASI_AIUPL: u32 = 0x18;
    pub const ASI_AIUSL: u32 = 0x19;
    pub const ASI_REAL_L: u32 = 0x1c;
    pub const ASI_REAL_IO_L: u32 = 0x1d;
    pub const ASI_LSU_CONTROL: u32 = 0x45;
    pub const ASI_IMMU: u32 = 0x50;
    pub const ASI_DMMU: u32 = 0x58;
    pub const ASI_P: u32 = 0x80;
    pub const ASI_S: u32 = 0x81;
    pub const ASI_PNF: u32 = 0x82;
    pub const ASI_SNF: u32 = 0x83;
    pub const ASI_PL: u32 = 0x88;
    pub const ASI_SL: u32 = 0x89;
    pub const ASI_PNFL: u32 = 0x8a;
    pub const ASI_SNFL: u32 = 0x8b;
}

use asi_v8::*;
use asi_v9::*;

// sun4u SFSR fields.
pub const SFSR_VALID: u64 = 1 << 0;
pub const SFSR_OW: u64 = 1 << 1;
pub const SFSR_WRITE: u64 = 1 << 2;
pub const SFSR_CT_SHIFT: u64 = 4;
pub const SFSR_FT_SHIFT: u64 = 7;
pub const SFSR_ASI_SHIFT: u64 = 16;
pub const SFSR_FT_PRIV: u64 = 0x01;
pub const SFSR_FT_ILL_ASI: u64 = 0x08;
pub const SFSR_FT_RANGE: u64 = 0x20;

// SRMMU fault status fields.
pub const SRMMU_OW: u32 = 1 << 0;
pub const SRMMU_FAV: u32 = 1 << 1;
pub const SRMMU_FT_SHIFT: u32 = 2;
pub const SRMMU_AT_SHIFT: u32 = 5;
pub const SRMMU_FT_INVALID: u32 = 1;
pub const SRMMU_FT_PROT: u32 = 2;
pub const SRMMU_FT_BUS: u32 = 5;

// LEON cache control bits that always read as zero.
const CACHE_CTRL_FD: u32 = 1 << 22;
const CACHE_CTRL_FI: u32 = 1 << 21;
const CACHE_CTRL_IB: u32 = 1 << 16;
const CACHE_CTRL_IP: u32 = 1 << 15;
const CACHE_CTRL_DP: u32 = 1 << 14;

/// A memory address space selected by an ASI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemSpace {
    pub mmu_idx: MmuIdx,
    pub little_endian: bool,
    /// Loads return zero instead of faulting; stores are illegal.
    pub no_fault: bool,
    /// Instruction space (V8 `ASI_*TXT`).
    pub code: bool,
    /// Physical address bits above 32 (V8 bypass ASIs).
    pub phys_hi: u64,
}

impl MemSpace {
    const fn new(mmu_idx: MmuIdx) -> Self {
        Self {
            mmu_idx,
            little_endian: false,
            no_fault: false,
            code: false,
            phys_hi: 0,
        }
    }

    const fn le(self) -> Self {
        Self {
            little_endian: true,
            ..self
        }
    }

    const fn nf(self) -> Self {
        Self {
            no_fault: true,
            ..self
        }
    }
}

/// What an ASI refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsiSpace {
    Memory(MemSpace),
    /// SRMMU control registers (V8 0x04).
    MmuRegs,
    /// SRMMU probe (loads) / flush (stores) (V8 0x03).
    MmuProbe,
    /// LEON cache control (V8 0x02).
    CacheControl,
    /// LSU control register (V9 0x45).
    LsuControl,
    /// I-MMU registers (V9 0x50).
    Immu,
    /// D-MMU registers (V9 0x58).
    Dmmu,
}

impl SparcCpu {
    fn mmu_enabled(&self) -> bool {
        match self.cfg.arch {
            SparcArch::V8 => self.mmuregs[0] & MMU_E != 0,
            SparcArch::V9 => self.lsu & DMMU_E != 0,
        }
    }

    /// MMU index of the primary/secondary context at the current
    /// privilege, or as if in user mode.
    fn context_idx(&self, secondary: bool, as_user: bool) -> MmuIdx {
        let user = as_user || !self.is_supervisor();
        if self.is_hypervisor() && !as_user {
            MmuIdx::Hypervisor
        } else {
            match (user, secondary) {
                (true, false) => MmuIdx::User,
                (true, true) => MmuIdx::UserSecondary,
                (false, false) => MmuIdx::Kernel,
                (false, true) => MmuIdx::KernelSecondary,
            }
        }
    }

    /// Decode `asi` for the configured architecture.
    pub fn decode_asi(&self, asi: u32) -> Option<AsiSpace> {
        let space = match self.cfg.arch {
            SparcArch::V8 => match asi {
                ASI_CACHECTL if self.cfg.has(CpuFeatures::CACHE_CTRL) => {
                    AsiSpace::CacheControl
                }
                ASI_MMUFLUSH => AsiSpace::MmuProbe,
                ASI_MMUREGS => AsiSpace::MmuRegs,
                ASI_USERTXT => AsiSpace::Memory(MemSpace {
                    code: true,
                    ..MemSpace::new(MmuIdx::User)
                }),
                ASI_KERNELTXT => AsiSpace::Memory(MemSpace {
                    code: true,
                    ..MemSpace::new(MmuIdx::Kernel)
                }),
                ASI_USERDATA => {
                    AsiSpace::Memory(MemSpace::new(MmuIdx::User))
                }
                ASI_KERNELDATA => {
                    AsiSpace::Memory(MemSpace::new(MmuIdx::Kernel))
                }
                0x20..=0x2f => AsiSpace::Memory(MemSpace {
                    phys_hi: ((asi - ASI_BYPASS) as u64) << 32,
                    ..MemSpace::new(MmuIdx::Phys)
                }),
                _ => return None,
            },
            SparcArch::V9 => {
                let nucleus = MemSpace::new(MmuIdx::Nucleus);
                let aiup = MemSpace::new(MmuIdx::User);
                let aius = MemSpace::new(MmuIdx::UserSecondary);
                let real = MemSpace::new(MmuIdx::Phys);
                let p = MemSpace::new(self.context_idx(false, false));
                let s = MemSpace::new(self.context_idx(true, false));
                match asi {
                    ASI_N => AsiSpace::Memory(nucleus),
                    ASI_NL => AsiSpace::Memory(nucleus.le()),
                    ASI_AIUP => AsiSpace::Memory(aiup),
                    ASI_AIUS => AsiSpace::Memory(aius),
                    ASI_AIUPL => AsiSpace::Memory(aiup.le()),
                    ASI_AIUSL => AsiSpace::Memory(aius.le()),
                    ASI_REAL | ASI_REAL_IO => AsiSpace::Memory(real),
                    ASI_REAL_L | ASI_REAL_IO_L => AsiSpace::Memory(real.le()),
                    ASI_LSU_CONTROL => AsiSpace::LsuControl,
                    ASI_IMMU => AsiSpace::Immu,
                    ASI_DMMU => AsiSpace::Dmmu,
                    ASI_P => AsiSpace::Memory(p),
                    ASI_S => AsiSpace::Memory(s),
                    ASI_PNF => AsiSpace::Memory(p.nf()),
                    ASI_SNF => AsiSpace::Memory(s.nf()),
                    ASI_PL => AsiSpace::Memory(p.le()),
                    ASI_SL => AsiSpace::Memory(s.le()),
                    ASI_PNFL => AsiSpace::Memory(p.nf().le()),
                    ASI_SNFL => AsiSpace::Memory(s.nf().le()),
                    _ => return None,
                }
            }
        };
        Some(space)
    }

    /// Privilege required to use `asi`.
    ///
    /// V8 alternate-space instructions are privileged outright. On V9,
    /// ASIs below 0x80 need supervisor mode, and 0x30..0x7f need
    /// hyperprivilege where a hypervisor exists.
    fn check_asi(&self, asi: u32) -> Option<Trap> {
        let arch = self.cfg.arch;
        match arch {
            SparcArch::V8 => (!self.psrs)
                .then(|| Trap::of(arch, TrapKind::PrivilegedInstruction)),
            SparcArch::V9 => {
                let denied = asi < 0x80
                    && !self.is_hypervisor()
                    && (!self.is_supervisor()
                        || (asi >= 0x30 && self.cfg.has_hypervisor()));
                denied.then(|| Trap::new(arch, v9::TT_PRIV_ACT))
            }
        }
    }

    fn asi_address(&self, addr: u64) -> u64 {
        if !self.is_v9() || self.pstate & PS_AM != 0 {
            addr & 0xffff_ffff
        } else {
            addr
        }
    }

    /// Check privilege and alignment; the higher-priority trap wins.
    /// A winning alignment trap records the faulting address.
    fn check_access(
        &mut self,
        addr: u64,
        asi: Option<u32>,
        memop: MemOp,
        access: AccessType,
    ) -> HelperResult<()> {
        if memop.size() > MemOp::SIZE_64 {
            return Err(self.trap(TrapKind::IllegalInstruction));
        }
        let size = memop.size_bytes() as u64;
        let unaligned = (addr & (size - 1) != 0).then(|| {
            Trap::of(self.cfg.arch, TrapKind::MemAddressNotAligned)
        });
        let privilege = match asi {
            Some(asi) => self.check_asi(asi),
            None => (!self.is_supervisor()).then(|| {
                Trap::of(self.cfg.arch, TrapKind::PrivilegedInstruction)
            }),
        };
        let Some(trap) =
            Trap::highest([privilege, unaligned].into_iter().flatten())
        else {
            return Ok(());
        };
        if Some(trap) == unaligned {
            self.record_unaligned(addr, asi.unwrap_or(0), access);
        }
        Err(self.trap_tt(trap.tt))
    }

    /// Note a misaligned access: the address on V8, SFAR and SFSR
    /// of the data MMU on V9.
    fn record_unaligned(&mut self, addr: u64, asi: u32, access: AccessType) {
        match self.cfg.arch {
            SparcArch::V8 => self.mmuregs[4] = addr as u32,
            SparcArch::V9 => {
                let idx = self.mmu_index();
                let access = match access {
                    AccessType::Fetch => AccessType::Read,
                    other => other,
                };
                self.record_fault(addr, asi, access, idx, 0, 0);
            }
        }
    }

    /// Record a fault in the fault-status registers.
    fn record_fault(
        &mut self,
        addr: u64,
        asi: u32,
        access: AccessType,
        mmu_idx: MmuIdx,
        v9_ft: u64,
        srmmu_ft: u32,
    ) {
        match self.cfg.arch {
            SparcArch::V8 => {
                let at = match access {
                    AccessType::Read => 0,
                    AccessType::Fetch => 2,
                    AccessType::Write => 4,
                } + u32::from(!mmu_idx.is_user());
                if self.mmuregs[3] != 0 {
                    self.mmuregs[3] |= SRMMU_OW;
                }
                self.mmuregs[3] |= (at << SRMMU_AT_SHIFT)
                    | (srmmu_ft << SRMMU_FT_SHIFT)
                    | SRMMU_FAV;
                self.mmuregs[4] = addr as u32;
            }
            SparcArch::V9 => {
                let ct = match mmu_idx {
                    MmuIdx::UserSecondary | MmuIdx::KernelSecondary => 1,
                    MmuIdx::Nucleus => 2,
                    _ => 0,
                };
                let mmu = if access == AccessType::Fetch {
                    &mut self.immu
                } else {
                    &mut self.dmmu
                };
                let mut sfsr = SFSR_VALID;
                if mmu.sfsr & SFSR_VALID != 0 {
                    sfsr |= SFSR_OW;
                }
                if access == AccessType::Write {
                    sfsr |= SFSR_WRITE;
                }
                sfsr |= ct << SFSR_CT_SHIFT;
                sfsr |= v9_ft << SFSR_FT_SHIFT;
                sfsr |= ((asi & 0xff) as u64) << SFSR_ASI_SHIFT;
                mmu.sfsr = sfsr;
                mmu.sfar = addr;
            }
        }
        log::debug!(
            "cpu{} mmu fault addr={:#x} asi={:#x} {:?}",
            self.cpu_index,
            addr,
            asi,
            access
        );
    }

    /// Turn a backend fault into the architectural trap.
    fn mem_fault(
        &mut self,
        fault: MemFault,
        asi: u32,
        access: AccessType,
        mmu_idx: MmuIdx,
    ) -> CpuExit {
        let (v9_ft, srmmu_ft, error) = match fault {
            MemFault::Protection { .. } => {
                (SFSR_FT_PRIV, SRMMU_FT_PROT, false)
            }
            MemFault::Unmapped { .. } => {
                (SFSR_FT_RANGE, SRMMU_FT_INVALID, false)
            }
            MemFault::Bus { .. } => (0, SRMMU_FT_BUS, true),
        };
        self.record_fault(fault.addr(), asi, access, mmu_idx, v9_ft, srmmu_ft);
        let kind = match (access == AccessType::Fetch, error) {
            (true, false) => TrapKind::InstructionAccessException,
            (true, true) => TrapKind::InstructionAccessError,
            (false, false) => TrapKind::DataAccessException,
            (false, true) => TrapKind::DataAccessError,
        };
        self.trap(kind)
    }

    fn illegal_asi(
        &mut self,
        addr: u64,
        asi: u32,
        access: AccessType,
    ) -> CpuExit {
        let idx = self.mmu_index();
        self.record_fault(
            addr,
            asi,
            access,
            idx,
            SFSR_FT_ILL_ASI,
            SRMMU_FT_INVALID,
        );
        self.trap(TrapKind::DataAccessException)
    }

    fn access_ctx(&self, space: &MemSpace, access: AccessType) -> AccessCtx {
        let ctx = AccessCtx::new(
            space.mmu_idx as u8,
            access,
            space.mmu_idx.is_user(),
        );
        if space.mmu_idx == MmuIdx::Phys || !self.mmu_enabled() {
            ctx.with_bypass()
        } else {
            ctx
        }
    }
}

fn compose(bytes: &[u8], little_endian: bool) -> u64 {
    let fold = |acc: u64, b: &u8| (acc << 8) | *b as u64;
    if little_endian {
        bytes.iter().rev().fold(0, fold)
    } else {
        bytes.iter().fold(0, fold)
    }
}

fn decompose(val: u64, size: usize, little_endian: bool) -> [u8; 8] {
    let mut buf = [0u8; 8];
    for (i, b) in buf.iter_mut().take(size).enumerate() {
        let shift = if little_endian { i } else { size - 1 - i };
        *b = (val >> (8 * shift)) as u8;
    }
    buf
}

fn load_mem<M: GuestMemory + ?Sized>(
    env: &mut SparcCpu,
    mem: &M,
    addr: u64,
    asi: u32,
    space: MemSpace,
    memop: MemOp,
) -> HelperResult<u64> {
    let size = memop.size_bytes() as usize;
    let access = if space.code {
        AccessType::Fetch
    } else {
        AccessType::Read
    };
    let ctx = env.access_ctx(&space, access);
    let mut buf = [0u8; 8];
    if let Err(fault) = mem.read(addr | space.phys_hi, &mut buf[..size], ctx) {
        if space.no_fault {
            log::trace!("no-fault load at {addr:#x} returns 0");
            return Ok(0);
        }
        return Err(env.mem_fault(fault, asi, access, space.mmu_idx));
    }
    let little = space.little_endian ^ memop.is_bswap();
    Ok(memop.extend(compose(&buf[..size], little)))
}

fn store_mem<M: GuestMemory + ?Sized>(
    env: &mut SparcCpu,
    mem: &mut M,
    addr: u64,
    val: u64,
    asi: u32,
    space: MemSpace,
    memop: MemOp,
) -> HelperResult<()> {
    if space.no_fault {
        return Err(env.illegal_asi(addr, asi, AccessType::Write));
    }
    let size = memop.size_bytes() as usize;
    let ctx = env.access_ctx(&space, AccessType::Write);
    let little = space.little_endian ^ memop.is_bswap();
    let buf = decompose(val, size, little);
    mem.write(addr | space.phys_hi, &buf[..size], ctx)
        .map_err(|fault| {
            env.mem_fault(fault, asi, AccessType::Write, space.mmu_idx)
        })
}

fn tag_target(tag_access: u64) -> u64 {
    ((tag_access & 0x1fff) << 48) | (tag_access >> 22)
}

fn load_mmu_v9(
    env: &mut SparcCpu,
    addr: u64,
    asi: u32,
    data: bool,
) -> HelperResult<u64> {
    let reg = (addr >> 3) & 0xf;
    let mmu = if data { &env.dmmu } else { &env.immu };
    let val = match (reg, data) {
        (0, _) => tag_target(mmu.tag_access),
        (1, true) => mmu.primary_context,
        (2, true) => mmu.secondary_context,
        (3, _) => mmu.sfsr,
        (4, true) => mmu.sfar,
        (5, _) => mmu.tsb,
        (6, _) => mmu.tag_access,
        (7, true) => mmu.virt_watchpoint,
        (8, true) => mmu.phys_watchpoint,
        _ => return Err(env.illegal_asi(addr, asi, AccessType::Read)),
    };
    Ok(val)
}

fn store_mmu_v9(
    env: &mut SparcCpu,
    addr: u64,
    val: u64,
    asi: u32,
    data: bool,
) -> HelperResult<()> {
    let reg = (addr >> 3) & 0xf;
    let mmu = if data { &mut env.dmmu } else { &mut env.immu };
    match (reg, data) {
        (1, true) => mmu.primary_context = val & 0x1fff,
        (2, true) => mmu.secondary_context = val & 0x1fff,
        (3, _) => mmu.sfsr = val,
        (4, true) => {}
        (5, _) => mmu.tsb = val,
        (6, _) => mmu.tag_access = val,
        (7, true) => mmu.virt_watchpoint = val,
        (8, true) => mmu.phys_watchpoint = val,
        _ => return Err(env.illegal_asi(addr, asi, AccessType::Write)),
    }
    Ok(())
}

fn load_mmureg_v8(env: &mut SparcCpu, addr: u64) -> u64 {
    let reg = ((addr >> 8) & 0x1f) as usize;
    match reg {
        3 => {
            let sfsr = env.mmuregs[3];
            env.mmuregs[3] = 0;
            sfsr as u64
        }
        0x13 => env.mmuregs[3] as u64,
        0x14 => env.mmuregs[4] as u64,
        _ => env.mmuregs[reg] as u64,
    }
}

fn store_mmureg_v8(env: &mut SparcCpu, addr: u64, val: u64) {
    let reg = ((addr >> 8) & 0x1f) as usize;
    let val = val as u32;
    match reg {
        0 => {
            let keep = env.mmuregs[0] & 0xff00_0000;
            env.mmuregs[0] = keep | (val & 0x00ff_ffff);
        }
        2 => env.mmuregs[2] = val & 0xff,
        3 | 4 => {}
        0x13 => env.mmuregs[3] = val,
        0x14 => env.mmuregs[4] = val,
        _ => env.mmuregs[reg] = val,
    }
    log::trace!("mmu reg[{reg:#x}] <- {val:#x}");
}

fn load_cache_control(env: &SparcCpu, addr: u64, memop: MemOp) -> u64 {
    if memop.size() != MemOp::SIZE_32 {
        log::warn!("cache control access must be 32-bit");
        return 0;
    }
    match addr {
        0x00 => env.cache_control as u64,
        0x08 => 0x1022_0000,
        0x0c => 0x1822_0000,
        _ => {
            log::warn!("unimplemented cache control register {addr:#x}");
            0
        }
    }
}

fn store_cache_control(env: &mut SparcCpu, addr: u64, val: u64, memop: MemOp) {
    if memop.size() != MemOp::SIZE_32 {
        log::warn!("cache control access must be 32-bit");
        return;
    }
    match addr {
        0x00 => {
            let mask = CACHE_CTRL_FD
                | CACHE_CTRL_FI
                | CACHE_CTRL_IB
                | CACHE_CTRL_IP
                | CACHE_CTRL_DP;
            env.cache_control = val as u32 & !mask;
        }
        _ => log::warn!("read-only cache control register {addr:#x}"),
    }
}

/// LDA / LDxA: load from alternate space `asi`.
pub fn ld_asi<M: GuestMemory + ?Sized>(
    env: &mut SparcCpu,
    mem: &M,
    addr: u64,
    asi: u32,
    memop: MemOp,
) -> HelperResult<u64> {
    let asi = asi & 0xff;
    let addr = env.asi_address(addr);
    env.check_access(addr, Some(asi), memop, AccessType::Read)?;
    let Some(space) = env.decode_asi(asi) else {
        return Err(env.illegal_asi(addr, asi, AccessType::Read));
    };
    match space {
        AsiSpace::Memory(ms) => load_mem(env, mem, addr, asi, ms, memop),
        AsiSpace::MmuRegs => Ok(load_mmureg_v8(env, addr)),
        AsiSpace::MmuProbe => {
            log::trace!("mmu probe {addr:#x}: no table walker");
            Ok(0)
        }
        AsiSpace::CacheControl => Ok(load_cache_control(env, addr, memop)),
        AsiSpace::LsuControl => Ok(env.lsu),
        AsiSpace::Immu => load_mmu_v9(env, addr, asi, false),
        AsiSpace::Dmmu => load_mmu_v9(env, addr, asi, true),
    }
}

/// STA / STxA: store to alternate space `asi`.
pub fn st_asi<M: GuestMemory + ?Sized>(
    env: &mut SparcCpu,
    mem: &mut M,
    addr: u64,
    val: u64,
    asi: u32,
    memop: MemOp,
) -> HelperResult<()> {
    let asi = asi & 0xff;
    let addr = env.asi_address(addr);
    env.check_access(addr, Some(asi), memop, AccessType::Write)?;
    let Some(space) = env.decode_asi(asi) else {
        return Err(env.illegal_asi(addr, asi, AccessType::Write));
    };
    match space {
        AsiSpace::Memory(ms) => {
            let ms = MemSpace { code: false, ..ms };
            store_mem(env, mem, addr, val, asi, ms, memop)
        }
        AsiSpace::MmuRegs => {
            store_mmureg_v8(env, addr, val);
            Ok(())
        }
        AsiSpace::MmuProbe => {
            log::trace!("mmu flush {addr:#x}");
            Ok(())
        }
        AsiSpace::CacheControl => {
            store_cache_control(env, addr, val, memop);
            Ok(())
        }
        AsiSpace::LsuControl => {
            env.lsu = val & (DMMU_E | IMMU_E);
            log::debug!("cpu{} lsu control = {:#x}", env.cpu_index, env.lsu);
            Ok(())
        }
        AsiSpace::Immu => store_mmu_v9(env, addr, val, asi, false),
        AsiSpace::Dmmu => store_mmu_v9(env, addr, val, asi, true),
    }
}

/// Supervisor load from instruction space (V8 `LDA` to the text
/// ASIs). `oi` carries the access size and the MMU index.
pub fn ld_code<M: GuestMemory + ?Sized>(
    env: &mut SparcCpu,
    mem: &M,
    addr: u64,
    oi: MemOpIdx,
) -> HelperResult<u64> {
    let memop = oi.memop();
    let addr = env.asi_address(addr);
    env.check_access(addr, None, memop, AccessType::Fetch)?;
    let Some(mmu_idx) = MmuIdx::from_raw(oi.mmu_idx()) else {
        return Err(env.trap(TrapKind::IllegalInstruction));
    };
    let space = MemSpace {
        code: true,
        ..MemSpace::new(mmu_idx)
    };
    let asi = if mmu_idx.is_user() {
        ASI_USERTXT
    } else {
        ASI_KERNELTXT
    };
    load_mem(env, mem, addr, asi, space, memop)
}
