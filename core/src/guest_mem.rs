//! Guest memory backend.
//!
//! Helpers reach guest memory through the [`GuestMemory`] trait: a
//! byte-slice read/write keyed by guest address and an access
//! context. [`GuestRam`] is a flat, page-protected RAM backend used
//! by user-mode runs and by the tests.

use thiserror::Error;

/// Guest page size: 8 KiB, the SPARC base page.
pub const PAGE_SIZE: u64 = 8192;

/// Round `addr` up to the next page boundary.
pub const fn page_align_up(addr: u64) -> u64 {
    (addr + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

/// Round `addr` down to a page boundary.
pub const fn page_align_down(addr: u64) -> u64 {
    addr & !(PAGE_SIZE - 1)
}

/// Kind of access being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    Read,
    Write,
    Fetch,
}

/// Per-access context forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCtx {
    /// Target-defined MMU index the access was issued under.
    pub mmu_idx: u8,
    pub access: AccessType,
    /// Access carries user (non-privileged) permissions.
    pub user: bool,
    /// Physical bypass: no translation or protection checks.
    pub bypass: bool,
}

impl AccessCtx {
    pub const fn new(mmu_idx: u8, access: AccessType, user: bool) -> Self {
        Self {
            mmu_idx,
            access,
            user,
            bypass: false,
        }
    }

    pub const fn with_bypass(self) -> Self {
        Self {
            bypass: true,
            ..self
        }
    }
}

/// A failed guest memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemFault {
    /// Page present but the access is not permitted.
    #[error("protection fault at {addr:#x}")]
    Protection { addr: u64 },
    /// No mapping for the address.
    #[error("unmapped address {addr:#x}")]
    Unmapped { addr: u64 },
    /// The device behind the address reported an error.
    #[error("bus error at {addr:#x}")]
    Bus { addr: u64 },
}

impl MemFault {
    pub const fn addr(self) -> u64 {
        match self {
            MemFault::Protection { addr }
            | MemFault::Unmapped { addr }
            | MemFault::Bus { addr } => addr,
        }
    }
}

/// Byte-level guest memory access.
///
/// Implementations must not partially perform an access: when an
/// error is returned, memory is unchanged.
pub trait GuestMemory: Send {
    fn read(
        &self,
        addr: u64,
        buf: &mut [u8],
        ctx: AccessCtx,
    ) -> Result<(), MemFault>;

    fn write(
        &mut self,
        addr: u64,
        data: &[u8],
        ctx: AccessCtx,
    ) -> Result<(), MemFault>;
}

/// Page protection bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageProt(u8);

impl PageProt {
    pub const NONE: PageProt = PageProt(0);
    pub const READ: PageProt = PageProt(0x01);
    pub const WRITE: PageProt = PageProt(0x02);
    pub const EXEC: PageProt = PageProt(0x04);
    /// Accessible from user mode.
    pub const USER: PageProt = PageProt(0x08);

    pub const RW: PageProt = PageProt(0x03);
    pub const RWX: PageProt = PageProt(0x07);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: PageProt) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: PageProt) -> Self {
        Self(self.0 | other.0)
    }
}

/// Flat guest RAM starting at `base`, with per-page protection.
///
/// Pages start unmapped (`PageProt::NONE`); `protect` maps them.
pub struct GuestRam {
    base: u64,
    data: Vec<u8>,
    prot: Vec<PageProt>,
}

impl GuestRam {
    /// Create `size` bytes of RAM (rounded up to whole pages) at `base`.
    pub fn new(base: u64, size: u64) -> Self {
        let size = page_align_up(size);
        let pages = (size / PAGE_SIZE) as usize;
        Self {
            base: page_align_down(base),
            data: vec![0; size as usize],
            prot: vec![PageProt::NONE; pages],
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Set the protection of every page overlapping `[addr, addr+len)`.
    pub fn protect(
        &mut self,
        addr: u64,
        len: u64,
        prot: PageProt,
    ) -> Result<(), MemFault> {
        let start = page_align_down(addr);
        let end = page_align_up(addr + len);
        let mut page = start;
        while page < end {
            let idx = self.page_index(page)?;
            self.prot[idx] = prot;
            page += PAGE_SIZE;
        }
        Ok(())
    }

    pub fn prot_at(&self, addr: u64) -> Option<PageProt> {
        self.page_index(addr).ok().map(|i| self.prot[i])
    }

    /// Copy bytes in without protection checks (loader path).
    pub fn load(&mut self, addr: u64, data: &[u8]) -> Result<(), MemFault> {
        let off = self.range(addr, data.len())?;
        self.data[off..off + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Borrow bytes without protection checks.
    pub fn peek(&self, addr: u64, len: usize) -> Result<&[u8], MemFault> {
        let off = self.range(addr, len)?;
        Ok(&self.data[off..off + len])
    }

    fn page_index(&self, addr: u64) -> Result<usize, MemFault> {
        if addr < self.base || addr - self.base >= self.size() {
            return Err(MemFault::Unmapped { addr });
        }
        Ok(((addr - self.base) / PAGE_SIZE) as usize)
    }

    fn range(&self, addr: u64, len: usize) -> Result<usize, MemFault> {
        let end = addr
            .checked_add(len as u64)
            .ok_or(MemFault::Unmapped { addr })?;
        if addr < self.base || end > self.base + self.size() {
            return Err(MemFault::Unmapped { addr });
        }
        Ok((addr - self.base) as usize)
    }

    /// Check every page touched by the access before any byte moves.
    fn check(
        &self,
        addr: u64,
        len: usize,
        ctx: AccessCtx,
    ) -> Result<usize, MemFault> {
        let off = self.range(addr, len)?;
        if ctx.bypass || len == 0 {
            return Ok(off);
        }
        let need = match ctx.access {
            AccessType::Read => PageProt::READ,
            AccessType::Write => PageProt::WRITE,
            AccessType::Fetch => PageProt::EXEC,
        };
        let last = addr + len as u64 - 1;
        let mut page = page_align_down(addr);
        while page <= last {
            let prot = self.prot[self.page_index(page)?];
            let fault_addr = page.max(addr);
            if prot == PageProt::NONE {
                return Err(MemFault::Unmapped { addr: fault_addr });
            }
            let user_denied = ctx.user && !prot.contains(PageProt::USER);
            if !prot.contains(need) || user_denied {
                return Err(MemFault::Protection { addr: fault_addr });
            }
            page += PAGE_SIZE;
        }
        Ok(off)
    }
}

impl GuestMemory for GuestRam {
    fn read(
        &self,
        addr: u64,
        buf: &mut [u8],
        ctx: AccessCtx,
    ) -> Result<(), MemFault> {
        let off = self.check(addr, buf.len(), ctx)?;
        buf.copy_from_slice(&self.data[off..off + buf.len()]);
        Ok(())
    }

    fn write(
        &mut self,
        addr: u64,
        data: &[u8],
        ctx: AccessCtx,
    ) -> Result<(), MemFault> {
        let off = self.check(addr, data.len(), ctx)?;
        self.data[off..off + data.len()].copy_from_slice(data);
        Ok(())
    }
}
