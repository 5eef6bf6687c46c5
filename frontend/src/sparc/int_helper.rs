//! Integer divide and tagged arithmetic helpers.

use super::cpu::SparcCpu;
use super::trap::{HelperResult, TrapKind};

const CC_N: u32 = 8;
const CC_Z: u32 = 4;
const CC_V: u32 = 2;
const CC_C: u32 = 1;

fn nz32(val: u32) -> u32 {
    let mut cc = 0;
    if val == 0 {
        cc |= CC_Z;
    }
    if (val as i32) < 0 {
        cc |= CC_N;
    }
    cc
}

fn nz64(val: u64) -> u32 {
    let mut cc = 0;
    if val == 0 {
        cc |= CC_Z;
    }
    if (val as i64) < 0 {
        cc |= CC_N;
    }
    cc
}

fn dividend(env: &SparcCpu, a: u64) -> u64 {
    ((env.y as u32 as u64) << 32) | (a as u32 as u64)
}

/// UDIV: `(Y:a) / b[31:0]`.
///
/// The low word holds the 32-bit quotient. On overflow the quotient
/// saturates and the high word is all-ones, which the caller uses to
/// set `V` for UDIVcc.
pub fn udiv(env: &mut SparcCpu, a: u64, b: u64) -> HelperResult<u64> {
    let a64 = dividend(env, a);
    let b32 = b as u32;
    if b32 == 0 {
        return Err(env.trap(TrapKind::DivisionByZero));
    }
    let q = a64 / b32 as u64;
    if q > u32::MAX as u64 {
        return Ok(u64::MAX);
    }
    Ok(q)
}

/// SDIV: signed `(Y:a) / b[31:0]`, saturating like [`udiv`].
pub fn sdiv(env: &mut SparcCpu, a: u64, b: u64) -> HelperResult<u64> {
    let a64 = dividend(env, a) as i64;
    let b32 = b as i32;
    if b32 == 0 {
        return Err(env.trap(TrapKind::DivisionByZero));
    }
    let overflow = |negative: bool| -> u64 {
        let r = if negative { i32::MIN } else { i32::MAX };
        (r as u32 as u64) | (u64::MAX << 32)
    };
    if a64 == i64::MIN {
        // No 32-bit divisor yields a 32-bit quotient.
        return Ok(overflow(b32 > 0));
    }
    let q = a64 / b32 as i64;
    if q != q as i32 as i64 {
        return Ok(overflow(q < 0));
    }
    Ok(q as i32 as u32 as u64)
}

/// TADDccTV: tagged add, trapping on tag or 32-bit overflow.
pub fn taddcctv(env: &mut SparcCpu, src1: u64, src2: u64) -> HelperResult<u64> {
    if (src1 | src2) & 3 != 0 {
        return Err(env.trap(TrapKind::TagOverflow));
    }
    let dst = src1.wrapping_add(src2);
    let v = !(src1 ^ src2) & (src1 ^ dst);
    if v & (1 << 31) != 0 {
        return Err(env.trap(TrapKind::TagOverflow));
    }
    let (s1, d32) = (src1 as u32, dst as u32);
    env.icc = nz32(d32) | if d32 < s1 { CC_C } else { 0 };
    env.xcc = nz64(dst)
        | if v & (1 << 63) != 0 { CC_V } else { 0 }
        | if dst < src1 { CC_C } else { 0 };
    Ok(dst)
}

/// TSUBccTV: tagged subtract, trapping on tag or 32-bit overflow.
pub fn tsubcctv(env: &mut SparcCpu, src1: u64, src2: u64) -> HelperResult<u64> {
    if (src1 | src2) & 3 != 0 {
        return Err(env.trap(TrapKind::TagOverflow));
    }
    let dst = src1.wrapping_sub(src2);
    let v = (src1 ^ src2) & (src1 ^ dst);
    if v & (1 << 31) != 0 {
        return Err(env.trap(TrapKind::TagOverflow));
    }
    let (s1, s2) = (src1 as u32, src2 as u32);
    env.icc = nz32(dst as u32) | if s1 < s2 { CC_C } else { 0 };
    env.xcc = nz64(dst)
        | if v & (1 << 63) != 0 { CC_V } else { 0 }
        | if src1 < src2 { CC_C } else { 0 };
    Ok(dst)
}
