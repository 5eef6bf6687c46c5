//! VIS partitioned arithmetic.
//!
//! Pure functions over 64-bit (or 32-bit) operands split into 8-, 16-
//! or 32-bit lanes. Lane 0 is the least significant. Operations that
//! depend on `%gsr` take it as an explicit argument.

use tcg_core::Cond;

/// GSR.scale for `fpack16` (4 bits).
const GSR_SCALE16_SHIFT: u32 = 3;
const GSR_SCALE16_MASK: u64 = 0xf;
/// GSR.scale for `fpack32`/`fpackfix` (5 bits).
const GSR_SCALE32_MASK: u64 = 0x1f;
/// GSR.mask, the `bshuffle` selector.
const GSR_MASK_SHIFT: u32 = 32;

#[inline]
fn byte(v: u64, i: u32) -> u64 {
    (v >> (8 * i)) & 0xff
}

#[inline]
fn lane16(v: u64, i: u32) -> i32 {
    (v >> (16 * i)) as i16 as i32
}

/// `(a * b) >> 8`, rounding the discarded byte half-up.
#[inline]
fn mul_round8(a: i32, b: i32) -> u64 {
    let mut tmp = a * b;
    if tmp & 0xff > 0x7f {
        tmp += 0x100;
    }
    ((tmp >> 8) as u16) as u64
}

/// Interleave the low words of `src1` and `src2`: `src1` bytes land
/// in the odd lanes, `src2` bytes in the even ones.
pub fn fpmerge(src1: u64, src2: u64) -> u64 {
    (0..4).fold(0, |acc, i| {
        acc | (byte(src2, i) << (16 * i)) | (byte(src1, i) << (16 * i + 8))
    })
}

/// Unsigned bytes of `src1` times the signed 16-bit lanes of `src2`.
pub fn fmul8x16(src1: u32, src2: u64) -> u64 {
    (0..4).fold(0, |acc, i| {
        let r = mul_round8(byte(src1 as u64, i) as i32, lane16(src2, i));
        acc | (r << (16 * i))
    })
}

/// Unsigned bytes of `src1` times one signed 16-bit scalar.
pub fn fmul8x16a(src1: u32, src2: i32) -> u64 {
    let scalar = src2 as i16 as i32;
    (0..4).fold(0, |acc, i| {
        let r = mul_round8(byte(src1 as u64, i) as i32, scalar);
        acc | (r << (16 * i))
    })
}

/// Signed upper byte of each `src1` lane times the `src2` lane.
pub fn fmul8sux16(src1: u64, src2: u64) -> u64 {
    (0..4).fold(0, |acc, i| {
        let upper = lane16(src1, i) >> 8;
        acc | (mul_round8(upper, lane16(src2, i)) << (16 * i))
    })
}

/// Unsigned lower byte of each `src1` lane times the `src2` lane.
pub fn fmul8ulx16(src1: u64, src2: u64) -> u64 {
    (0..4).fold(0, |acc, i| {
        let lower = byte(src1, 2 * i) as i32;
        acc | (mul_round8(lower, lane16(src2, i)) << (16 * i))
    })
}

/// Widen each byte to a 16-bit lane in 8.4 fixed point.
pub fn fexpand(src2: u32) -> u64 {
    (0..4).fold(0, |acc, i| acc | (byte(src2 as u64, i) << (16 * i + 4)))
}

/// Accumulate the absolute byte differences of `src1` and `src2`.
pub fn pdist(sum: u64, src1: u64, src2: u64) -> u64 {
    (0..8).fold(sum, |acc, i| {
        acc.wrapping_add(byte(src1, i).abs_diff(byte(src2, i)))
    })
}

/// Scale four 16-bit lanes by `GSR.scale` and clamp to unsigned bytes.
pub fn fpack16(gsr: u64, rs2: u64) -> u32 {
    let scale = (gsr >> GSR_SCALE16_SHIFT) & GSR_SCALE16_MASK;
    (0..4).fold(0, |acc, i| {
        let scaled = lane16(rs2, i) << scale;
        let val = (scaled >> 7).clamp(0, 255) as u32;
        acc | (val << (8 * i))
    })
}

/// Shift `rs1` left a byte and drop in the clamped, scaled 32-bit
/// lanes of `rs2` at bytes 0 and 4.
pub fn fpack32(gsr: u64, rs1: u64, rs2: u64) -> u64 {
    let scale = (gsr >> GSR_SCALE16_SHIFT) & GSR_SCALE32_MASK;
    let base = (rs1 << 8) & !0x0000_00ff_0000_00ff;
    (0..2).fold(base, |acc, i| {
        let src = (rs2 >> (32 * i)) as i32 as i64;
        let val = ((src << scale) >> 23).clamp(0, 255) as u64;
        acc | (val << (32 * i))
    })
}

/// Scale two 32-bit lanes and saturate them to signed 16 bits.
pub fn fpackfix(gsr: u64, rs2: u64) -> u32 {
    let scale = (gsr >> GSR_SCALE16_SHIFT) & GSR_SCALE32_MASK;
    (0..2).fold(0, |acc, i| {
        let src = (rs2 >> (32 * i)) as i32 as i64;
        let val = ((src << scale) >> 16).clamp(-32768, 32767);
        acc | (((val as u32) & 0xffff) << (16 * i))
    })
}

/// Select bytes from the 16-byte concatenation `src1:src2`.
///
/// Nibble `i` of `GSR.mask`, counted from the top, picks result byte
/// `i` from the top; index 0 is the most significant byte of `src1`.
pub fn bshuffle(gsr: u64, src1: u64, src2: u64) -> u64 {
    let cat = ((src1 as u128) << 64) | src2 as u128;
    let mask = (gsr >> GSR_MASK_SHIFT) as u32;
    (0..8).fold(0, |acc, i| {
        let e = (mask >> (28 - 4 * i)) & 0xf;
        let b = ((cat >> (8 * (15 - e))) & 0xff) as u64;
        acc | (b << (8 * (7 - i)))
    })
}

// ── Partitioned compare ──────────────────────────────────────────

/// Lane width for the partitioned compares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaneWidth {
    W16,
    W32,
}

impl LaneWidth {
    pub const fn bits(self) -> u32 {
        match self {
            LaneWidth::W16 => 16,
            LaneWidth::W32 => 32,
        }
    }

    pub const fn lanes(self) -> u32 {
        64 / self.bits()
    }

    fn lane(self, v: u64, i: u32) -> i64 {
        match self {
            LaneWidth::W16 => (v >> (16 * i)) as i16 as i64,
            LaneWidth::W32 => (v >> (32 * i)) as i32 as i64,
        }
    }
}

/// Compare lanes as signed integers; bit `i` of the result is set
/// when lane `i` of `src1` and `src2` satisfies `cond`.
pub fn fcmp(cond: Cond, width: LaneWidth, src1: u64, src2: u64) -> u64 {
    (0..width.lanes()).fold(0, |acc, i| {
        let hit = cond.eval(width.lane(src1, i), width.lane(src2, i));
        acc | ((hit as u64) << i)
    })
}

macro_rules! vis_cmp {
    ($($name:ident => $cond:ident, $width:ident;)*) => {$(
        pub fn $name(src1: u64, src2: u64) -> u64 {
            fcmp(Cond::$cond, LaneWidth::$width, src1, src2)
        }
    )*};
}

vis_cmp! {
    fcmpgt16 => Gt, W16;
    fcmpeq16 => Eq, W16;
    fcmple16 => Le, W16;
    fcmpne16 => Ne, W16;
    fcmpgt32 => Gt, W32;
    fcmpeq32 => Eq, W32;
    fcmple32 => Le, W32;
    fcmpne32 => Ne, W32;
}

// ── Blocked-byte addressing ──────────────────────────────────────

#[inline]
fn field(v: u64, lo: u32, len: u32) -> u64 {
    if len == 0 {
        0
    } else {
        (v >> lo) & (u64::MAX >> (64 - len))
    }
}

/// Convert a fixed-point 3-D pixel address into a blocked-byte
/// offset for a cube of `2^cubesize` 64-byte blocks per side.
///
/// The integer parts of x, y and z sit at bits 11+, 33+ and 55+.
/// Low bits of each coordinate interleave into the 512-byte block;
/// the remaining `cubesize` bits of x and y and the upper four of z
/// select the block.
pub fn array8(pixel_addr: u64, cubesize: u64) -> u64 {
    let n = (cubesize & 7) as u32;
    let v = pixel_addr;
    field(v, 11, 2)
        | (field(v, 33, 2) << 2)
        | (field(v, 55, 1) << 4)
        | (field(v, 13, 4) << 5)
        | (field(v, 35, 4) << 9)
        | (field(v, 56, 4) << 13)
        | (field(v, 17, n) << 17)
        | (field(v, 39, n) << (17 + n))
        | (field(v, 60, 4) << (17 + 2 * n))
}
