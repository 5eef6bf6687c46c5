/// Helper operand value types.
///
/// Maps to QEMU's `TCGType` restricted to what out-of-line helpers
/// exchange with generated code: 32/64-bit integers and the 128-bit
/// pair used for quad-precision payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Type {
    I32 = 0,
    I64 = 1,
    I128 = 2,
}

impl Type {
    pub const fn size_bits(self) -> u32 {
        match self {
            Type::I32 => 32,
            Type::I64 => 64,
            Type::I128 => 128,
        }
    }

    pub const fn size_bytes(self) -> u32 {
        self.size_bits() / 8
    }
}

/// Signed comparison predicates.
///
/// Maps to the signed subset of QEMU's `TCGCond`; the packed VIS
/// compares are parameterised by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cond {
    Eq = 8,
    Ne = 9,
    Lt = 10,
    Ge = 11,
    Le = 12,
    Gt = 13,
}

impl Cond {
    /// Evaluate the predicate on two signed values.
    #[inline]
    pub const fn eval(self, a: i64, b: i64) -> bool {
        match self {
            Cond::Eq => a == b,
            Cond::Ne => a != b,
            Cond::Lt => a < b,
            Cond::Ge => a >= b,
            Cond::Le => a <= b,
            Cond::Gt => a > b,
        }
    }
}

/// Memory operation descriptor: encodes size, signedness and
/// byte order.
///
/// Maps to QEMU's `MemOp`. Guest byte order is big-endian; `BSWAP`
/// selects the little-endian form used by the `*_LITTLE` ASIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemOp(u16);

impl MemOp {
    pub const SIZE_8: u16 = 0;
    pub const SIZE_16: u16 = 1;
    pub const SIZE_32: u16 = 2;
    pub const SIZE_64: u16 = 3;
    pub const SIZE_128: u16 = 4;
    const SIZE_MASK: u16 = 0x7;

    pub const SIGN: u16 = 1 << 3;
    pub const BSWAP: u16 = 1 << 4;

    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn ub() -> Self {
        Self(Self::SIZE_8)
    }
    pub const fn sb() -> Self {
        Self(Self::SIZE_8 | Self::SIGN)
    }
    pub const fn uw() -> Self {
        Self(Self::SIZE_16)
    }
    pub const fn sw() -> Self {
        Self(Self::SIZE_16 | Self::SIGN)
    }
    pub const fn ul() -> Self {
        Self(Self::SIZE_32)
    }
    pub const fn sl() -> Self {
        Self(Self::SIZE_32 | Self::SIGN)
    }
    pub const fn uq() -> Self {
        Self(Self::SIZE_64)
    }
    pub const fn uo() -> Self {
        Self(Self::SIZE_128)
    }

    pub const fn with(self, flags: u16) -> Self {
        Self(self.0 | flags)
    }
    pub const fn without(self, flags: u16) -> Self {
        Self(self.0 & !flags)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
    pub const fn size(self) -> u16 {
        self.0 & Self::SIZE_MASK
    }
    pub const fn is_signed(self) -> bool {
        self.0 & Self::SIGN != 0
    }
    pub const fn is_bswap(self) -> bool {
        self.0 & Self::BSWAP != 0
    }
    pub const fn size_bytes(self) -> u32 {
        1 << self.size()
    }

    /// Sign- or zero-extend the low `size_bytes()` of `val` to 64 bits.
    pub const fn extend(self, val: u64) -> u64 {
        let bits = self.size_bytes() * 8;
        if bits >= 64 {
            return val;
        }
        let shift = 64 - bits;
        if self.is_signed() {
            (((val << shift) as i64) >> shift) as u64
        } else {
            (val << shift) >> shift
        }
    }
}

/// A `MemOp` combined with an MMU index.
///
/// Maps to QEMU's `MemOpIdx`: `memop << 4 | mmu_idx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemOpIdx(u32);

impl MemOpIdx {
    pub const fn new(op: MemOp, mmu_idx: u8) -> Self {
        Self(((op.bits() as u32) << 4) | (mmu_idx as u32 & 0xf))
    }

    pub const fn memop(self) -> MemOp {
        MemOp::new((self.0 >> 4) as u16)
    }

    pub const fn mmu_idx(self) -> u8 {
        (self.0 & 0xf) as u8
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}
