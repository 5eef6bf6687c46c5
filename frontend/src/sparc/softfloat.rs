//! Software IEEE-754 arithmetic.
//!
//! Bit-exact binary32, binary64 and binary128 operations with the
//! SPARC NaN conventions. Values are carried as raw bit patterns in a
//! `u128`; a [`FloatFmt`] says how to read them. Rounding follows the
//! dynamic mode in [`FloatStatus`] and exceptions accumulate there.
//!
//! Internally a finite non-zero value is a significand with its
//! leading one at bit 126 and an unbiased exponent:
//! `value = sig * 2^(exp - 126)`. That leaves at least 14 guard bits
//! below a quad significand and one carry bit above it.

use std::cmp::Ordering;

// ── Rounding and exception state ─────────────────────────────────

/// Rounding direction, encoded as in `FSR.RD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundMode {
    NearestEven,
    ToZero,
    Up,
    Down,
}

impl RoundMode {
    pub const fn from_rd(rd: u64) -> Self {
        match rd & 3 {
            0 => RoundMode::NearestEven,
            1 => RoundMode::ToZero,
            2 => RoundMode::Up,
            _ => RoundMode::Down,
        }
    }

    /// Whether an overflow of a value with `sign` rounds to infinity
    /// rather than to the largest finite value.
    const fn overflows_to_inf(self, sign: bool) -> bool {
        match self {
            RoundMode::NearestEven => true,
            RoundMode::ToZero => false,
            RoundMode::Up => !sign,
            RoundMode::Down => sign,
        }
    }
}

/// IEEE exception flags. Bit layout matches `FSR.cexc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FloatFlags(u8);

impl FloatFlags {
    pub const NONE: Self = Self(0);
    pub const INEXACT: Self = Self(0x01);
    pub const DIV_BY_ZERO: Self = Self(0x02);
    pub const UNDERFLOW: Self = Self(0x04);
    pub const OVERFLOW: Self = Self(0x08);
    pub const INVALID: Self = Self(0x10);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Per-operation rounding mode and accumulated flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloatStatus {
    pub round: RoundMode,
    pub flags: FloatFlags,
}

impl FloatStatus {
    pub const fn new(round: RoundMode) -> Self {
        Self {
            round,
            flags: FloatFlags::NONE,
        }
    }

    #[inline]
    pub fn raise(&mut self, flags: FloatFlags) {
        self.flags = self.flags.union(flags);
    }
}

impl Default for FloatStatus {
    fn default() -> Self {
        Self::new(RoundMode::NearestEven)
    }
}

// ── Formats ──────────────────────────────────────────────────────

/// Interchange format geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloatFmt {
    pub exp_bits: u32,
    pub frac_bits: u32,
}

const SIG_TOP: i32 = 126;

impl FloatFmt {
    pub const F32: Self = Self {
        exp_bits: 8,
        frac_bits: 23,
    };
    pub const F64: Self = Self {
        exp_bits: 11,
        frac_bits: 52,
    };
    pub const F128: Self = Self {
        exp_bits: 15,
        frac_bits: 112,
    };

    const fn bias(self) -> i32 {
        (1 << (self.exp_bits - 1)) - 1
    }

    const fn exp_max(self) -> u128 {
        (1 << self.exp_bits) - 1
    }

    const fn frac_mask(self) -> u128 {
        (1 << self.frac_bits) - 1
    }

    const fn sign_bit(self) -> u128 {
        1 << (self.exp_bits + self.frac_bits)
    }

    const fn quiet_bit(self) -> u128 {
        1 << (self.frac_bits - 1)
    }

    const fn pack(self, sign: bool, exp: u128, frac: u128) -> u128 {
        let s = if sign { self.sign_bit() } else { 0 };
        s | (exp << self.frac_bits) | frac
    }

    /// SPARC default NaN: positive, all fraction bits set.
    pub const fn default_nan(self) -> u128 {
        self.pack(false, self.exp_max(), self.frac_mask())
    }

    pub const fn inf(self, sign: bool) -> u128 {
        self.pack(sign, self.exp_max(), 0)
    }

    pub const fn zero(self, sign: bool) -> u128 {
        self.pack(sign, 0, 0)
    }

    pub const fn max_finite(self, sign: bool) -> u128 {
        self.pack(sign, self.exp_max() - 1, self.frac_mask())
    }
}

/// Class of an encoded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatClass {
    Zero,
    Normal,
    Inf,
    QNaN,
    SNaN,
}

impl FloatClass {
    pub const fn is_nan(self) -> bool {
        matches!(self, FloatClass::QNaN | FloatClass::SNaN)
    }
}

/// Result of a comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatRelation {
    Less,
    Equal,
    Greater,
    Unordered,
}

#[derive(Clone, Copy, Debug)]
struct Parts {
    class: FloatClass,
    sign: bool,
    exp: i32,
    /// Normalized significand, or the raw fraction for NaNs.
    sig: u128,
}

fn unpack(fmt: FloatFmt, bits: u128) -> Parts {
    let sign = bits & fmt.sign_bit() != 0;
    let e = (bits >> fmt.frac_bits) & fmt.exp_max();
    let frac = bits & fmt.frac_mask();
    let fb = fmt.frac_bits as i32;
    let (class, exp, sig) = if e == fmt.exp_max() {
        let class = if frac == 0 {
            FloatClass::Inf
        } else if frac & fmt.quiet_bit() != 0 {
            FloatClass::QNaN
        } else {
            FloatClass::SNaN
        };
        (class, 0, frac)
    } else if e == 0 {
        if frac == 0 {
            (FloatClass::Zero, 0, 0)
        } else {
            let shift = frac.leading_zeros() as i32 - 1;
            let exp = 1 - fmt.bias() - fb + SIG_TOP - shift;
            (FloatClass::Normal, exp, frac << shift)
        }
    } else {
        let sig = (frac | (1 << fmt.frac_bits)) << (SIG_TOP - fb);
        (FloatClass::Normal, e as i32 - fmt.bias(), sig)
    };
    Parts {
        class,
        sign,
        exp,
        sig,
    }
}

/// Classify an encoded value.
pub fn classify(fmt: FloatFmt, bits: u128) -> FloatClass {
    unpack(fmt, bits).class
}

// ── Wide integer support ─────────────────────────────────────────

fn shift_right_jam(x: u128, n: u32) -> u128 {
    if n == 0 {
        x
    } else if n >= 128 {
        (x != 0) as u128
    } else {
        (x >> n) | ((x & ((1 << n) - 1) != 0) as u128)
    }
}

/// Full 128x128 -> 256-bit product as `(hi, lo)`.
fn mul_u128(a: u128, b: u128) -> (u128, u128) {
    let (a0, a1) = (a as u64 as u128, a >> 64);
    let (b0, b1) = (b as u64 as u128, b >> 64);
    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;
    let (mid, mid_carry) = p01.overflowing_add(p10);
    let (lo, lo_carry) = p00.overflowing_add(mid << 64);
    let hi = p11
        + (mid >> 64)
        + ((mid_carry as u128) << 64)
        + lo_carry as u128;
    (hi, lo)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct U256 {
    hi: u128,
    lo: u128,
}

impl U256 {
    const ZERO: Self = Self { hi: 0, lo: 0 };

    fn from_shl(x: u128, n: u32) -> Self {
        match n {
            0 => Self { hi: 0, lo: x },
            1..=127 => Self {
                hi: x >> (128 - n),
                lo: x << n,
            },
            _ => Self {
                hi: x << (n - 128),
                lo: 0,
            },
        }
    }

    fn shr(self, n: u32) -> Self {
        match n {
            0 => self,
            1..=127 => Self {
                hi: self.hi >> n,
                lo: (self.lo >> n) | (self.hi << (128 - n)),
            },
            _ => Self {
                hi: 0,
                lo: self.hi >> (n - 128),
            },
        }
    }

    fn add(self, o: Self) -> Self {
        let (lo, c) = self.lo.overflowing_add(o.lo);
        Self {
            hi: self.hi.wrapping_add(o.hi).wrapping_add(c as u128),
            lo,
        }
    }

    fn sub(self, o: Self) -> Self {
        let (lo, b) = self.lo.overflowing_sub(o.lo);
        Self {
            hi: self.hi.wrapping_sub(o.hi).wrapping_sub(b as u128),
            lo,
        }
    }

    fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

/// Integer square root of `n`; the flag is set when exact.
fn isqrt(n: U256) -> (u128, bool) {
    let mut x = n;
    let mut res = U256::ZERO;
    let mut bit = U256::from_shl(1, 254);
    while bit > x {
        bit = bit.shr(2);
    }
    while !bit.is_zero() {
        let t = res.add(bit);
        if x >= t {
            x = x.sub(t);
            res = res.shr(1).add(bit);
        } else {
            res = res.shr(1);
        }
        bit = bit.shr(2);
    }
    (res.lo, x.is_zero())
}

// ── Rounding ─────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Rem {
    Exact,
    Below,
    Half,
    Above,
}

fn split(sig: u128, shift: i32) -> (u128, Rem) {
    if shift <= 0 {
        return (sig, Rem::Exact);
    }
    if shift >= 128 {
        let rem = if sig == 0 { Rem::Exact } else { Rem::Below };
        return (0, rem);
    }
    let kept = sig >> shift;
    let rem = sig & ((1 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let rem = match rem.cmp(&half) {
        _ if rem == 0 => Rem::Exact,
        Ordering::Less => Rem::Below,
        Ordering::Equal => Rem::Half,
        Ordering::Greater => Rem::Above,
    };
    (kept, rem)
}

/// Round `sig * 2^(exp - 126)` to `fmt` and encode it.
fn round_pack(
    fmt: FloatFmt,
    sign: bool,
    exp: i32,
    sig: u128,
    st: &mut FloatStatus,
) -> u128 {
    if sig == 0 {
        return fmt.zero(sign);
    }
    let lz = sig.leading_zeros() as i32;
    let (mut exp, sig) = if lz == 0 {
        (exp + 1, shift_right_jam(sig, 1))
    } else {
        (exp - (lz - 1), sig << (lz - 1))
    };

    let bias = fmt.bias();
    let emin = 1 - bias;
    let fb = fmt.frac_bits as i32;
    let tiny = exp < emin;
    let mut shift = SIG_TOP - fb;
    if tiny {
        shift += emin - exp;
    }
    let (kept, rem) = split(sig, shift);
    let inexact = rem != Rem::Exact;
    let round_up = match st.round {
        RoundMode::NearestEven => {
            rem == Rem::Above || (rem == Rem::Half && kept & 1 == 1)
        }
        RoundMode::ToZero => false,
        RoundMode::Up => inexact && !sign,
        RoundMode::Down => inexact && sign,
    };
    let mut kept = kept + round_up as u128;
    if inexact {
        st.raise(FloatFlags::INEXACT);
    }

    if tiny {
        if inexact {
            st.raise(FloatFlags::UNDERFLOW);
        }
        // A carry into bit `fb` lands in the exponent field as the
        // smallest normal.
        return fmt.pack(sign, 0, kept);
    }
    if kept >> (fb + 1) != 0 {
        kept >>= 1;
        exp += 1;
    }
    if exp > bias {
        st.raise(FloatFlags::OVERFLOW.union(FloatFlags::INEXACT));
        return if st.round.overflows_to_inf(sign) {
            fmt.inf(sign)
        } else {
            fmt.max_finite(sign)
        };
    }
    fmt.pack(sign, (exp + bias) as u128, kept & fmt.frac_mask())
}

// ── NaN handling ─────────────────────────────────────────────────

fn pack_nan(fmt: FloatFmt, p: &Parts) -> u128 {
    fmt.pack(p.sign, fmt.exp_max(), p.sig | fmt.quiet_bit())
}

/// Two-operand NaN result: SNaN(b), SNaN(a), QNaN(b), QNaN(a).
fn propagate_nan2(
    fmt: FloatFmt,
    a: &Parts,
    b: &Parts,
    st: &mut FloatStatus,
) -> u128 {
    let a_snan = a.class == FloatClass::SNaN;
    let b_snan = b.class == FloatClass::SNaN;
    if a_snan || b_snan {
        st.raise(FloatFlags::INVALID);
    }
    let pick = if b_snan {
        b
    } else if a_snan {
        a
    } else if b.class == FloatClass::QNaN {
        b
    } else {
        a
    };
    pack_nan(fmt, pick)
}

fn propagate_nan1(fmt: FloatFmt, a: &Parts, st: &mut FloatStatus) -> u128 {
    if a.class == FloatClass::SNaN {
        st.raise(FloatFlags::INVALID);
    }
    pack_nan(fmt, a)
}

fn invalid(fmt: FloatFmt, st: &mut FloatStatus) -> u128 {
    st.raise(FloatFlags::INVALID);
    fmt.default_nan()
}

// ── Arithmetic ───────────────────────────────────────────────────

fn addsub(
    fmt: FloatFmt,
    a: u128,
    b: u128,
    subtract: bool,
    st: &mut FloatStatus,
) -> u128 {
    use FloatClass::*;
    let a = unpack(fmt, a);
    let mut b = unpack(fmt, b);
    if a.class.is_nan() || b.class.is_nan() {
        return propagate_nan2(fmt, &a, &b, st);
    }
    b.sign ^= subtract;
    match (a.class, b.class) {
        (Inf, Inf) if a.sign != b.sign => invalid(fmt, st),
        (Inf, _) => fmt.inf(a.sign),
        (_, Inf) => fmt.inf(b.sign),
        (Zero, Zero) => {
            if a.sign == b.sign {
                fmt.zero(a.sign)
            } else {
                fmt.zero(st.round == RoundMode::Down)
            }
        }
        (Zero, _) => round_pack(fmt, b.sign, b.exp, b.sig, st),
        (_, Zero) => round_pack(fmt, a.sign, a.exp, a.sig, st),
        _ => {
            let a_larger = a.exp > b.exp || (a.exp == b.exp && a.sig >= b.sig);
            let (x, y) = if a_larger { (a, b) } else { (b, a) };
            let ysig = shift_right_jam(y.sig, (x.exp - y.exp) as u32);
            if x.sign == y.sign {
                round_pack(fmt, x.sign, x.exp, x.sig + ysig, st)
            } else {
                let diff = x.sig - ysig;
                if diff == 0 {
                    fmt.zero(st.round == RoundMode::Down)
                } else {
                    round_pack(fmt, x.sign, x.exp, diff, st)
                }
            }
        }
    }
}

pub fn add(fmt: FloatFmt, a: u128, b: u128, st: &mut FloatStatus) -> u128 {
    addsub(fmt, a, b, false, st)
}

pub fn sub(fmt: FloatFmt, a: u128, b: u128, st: &mut FloatStatus) -> u128 {
    addsub(fmt, a, b, true, st)
}

pub fn mul(fmt: FloatFmt, a: u128, b: u128, st: &mut FloatStatus) -> u128 {
    use FloatClass::*;
    let a = unpack(fmt, a);
    let b = unpack(fmt, b);
    if a.class.is_nan() || b.class.is_nan() {
        return propagate_nan2(fmt, &a, &b, st);
    }
    let sign = a.sign ^ b.sign;
    match (a.class, b.class) {
        (Inf, Zero) | (Zero, Inf) => invalid(fmt, st),
        (Inf, _) | (_, Inf) => fmt.inf(sign),
        (Zero, _) | (_, Zero) => fmt.zero(sign),
        _ => {
            let (hi, lo) = mul_u128(a.sig, b.sig);
            let sticky = (lo & ((1 << 126) - 1) != 0) as u128;
            let sig = (hi << 2) | (lo >> 126) | sticky;
            round_pack(fmt, sign, a.exp + b.exp, sig, st)
        }
    }
}

pub fn div(fmt: FloatFmt, a: u128, b: u128, st: &mut FloatStatus) -> u128 {
    use FloatClass::*;
    let a = unpack(fmt, a);
    let b = unpack(fmt, b);
    if a.class.is_nan() || b.class.is_nan() {
        return propagate_nan2(fmt, &a, &b, st);
    }
    let sign = a.sign ^ b.sign;
    match (a.class, b.class) {
        (Inf, Inf) | (Zero, Zero) => invalid(fmt, st),
        (Inf, _) => fmt.inf(sign),
        (_, Inf) | (Zero, _) => fmt.zero(sign),
        (_, Zero) => {
            st.raise(FloatFlags::DIV_BY_ZERO);
            fmt.inf(sign)
        }
        _ => {
            let mut rem = a.sig;
            let mut q: u128 = 0;
            for _ in 0..=SIG_TOP {
                q <<= 1;
                if rem >= b.sig {
                    rem -= b.sig;
                    q |= 1;
                }
                rem <<= 1;
            }
            let sticky = (rem != 0) as u128;
            round_pack(fmt, sign, a.exp - b.exp, q | sticky, st)
        }
    }
}

pub fn sqrt(fmt: FloatFmt, a: u128, st: &mut FloatStatus) -> u128 {
    use FloatClass::*;
    let a = unpack(fmt, a);
    match a.class {
        QNaN | SNaN => propagate_nan1(fmt, &a, st),
        Zero => fmt.zero(a.sign),
        _ if a.sign => invalid(fmt, st),
        Inf => fmt.inf(false),
        Normal => {
            let e = a.exp - SIG_TOP;
            let s = SIG_TOP + e.rem_euclid(2);
            let (root, exact) = isqrt(U256::from_shl(a.sig, s as u32));
            let exp = (e - s) / 2 + SIG_TOP;
            round_pack(fmt, false, exp, root | (!exact) as u128, st)
        }
    }
}

/// Compare `a` with `b`. NaN operands are unordered; `signaling`
/// makes any NaN raise invalid, otherwise only signaling NaNs do.
pub fn compare(
    fmt: FloatFmt,
    a: u128,
    b: u128,
    signaling: bool,
    st: &mut FloatStatus,
) -> FloatRelation {
    let pa = unpack(fmt, a);
    let pb = unpack(fmt, b);
    if pa.class.is_nan() || pb.class.is_nan() {
        let snan =
            pa.class == FloatClass::SNaN || pb.class == FloatClass::SNaN;
        if signaling || snan {
            st.raise(FloatFlags::INVALID);
        }
        return FloatRelation::Unordered;
    }
    let key = |p: &Parts, bits: u128| -> i128 {
        let mag = if p.class == FloatClass::Zero {
            0
        } else {
            (bits & !fmt.sign_bit()) as i128
        };
        if p.sign {
            -mag
        } else {
            mag
        }
    };
    match key(&pa, a).cmp(&key(&pb, b)) {
        Ordering::Less => FloatRelation::Less,
        Ordering::Equal => FloatRelation::Equal,
        Ordering::Greater => FloatRelation::Greater,
    }
}

// ── Conversions ──────────────────────────────────────────────────

/// Convert between formats, rounding when narrowing.
pub fn convert(
    from: FloatFmt,
    to: FloatFmt,
    bits: u128,
    st: &mut FloatStatus,
) -> u128 {
    let p = unpack(from, bits);
    match p.class {
        FloatClass::QNaN | FloatClass::SNaN => {
            if p.class == FloatClass::SNaN {
                st.raise(FloatFlags::INVALID);
            }
            let payload = if to.frac_bits >= from.frac_bits {
                p.sig << (to.frac_bits - from.frac_bits)
            } else {
                p.sig >> (from.frac_bits - to.frac_bits)
            };
            to.pack(p.sign, to.exp_max(), payload | to.quiet_bit())
        }
        FloatClass::Inf => to.inf(p.sign),
        FloatClass::Zero => to.zero(p.sign),
        FloatClass::Normal => round_pack(to, p.sign, p.exp, p.sig, st),
    }
}

/// Convert a signed integer, rounding if it does not fit exactly.
pub fn from_int(fmt: FloatFmt, val: i64, st: &mut FloatStatus) -> u128 {
    let sign = val < 0;
    let mag = val.unsigned_abs() as u128;
    if mag == 0 {
        return fmt.zero(false);
    }
    round_pack(fmt, sign, SIG_TOP, mag, st)
}

/// Convert to a `width`-bit signed integer, rounding toward zero.
///
/// NaN and out-of-range inputs raise invalid and saturate; NaN
/// saturates to the positive limit.
pub fn to_int_round_to_zero(
    fmt: FloatFmt,
    bits: u128,
    width: u32,
    st: &mut FloatStatus,
) -> i64 {
    let max = (1i128 << (width - 1)) - 1;
    let min = -(1i128 << (width - 1));
    let p = unpack(fmt, bits);
    let saturate = |st: &mut FloatStatus, negative: bool| -> i64 {
        st.raise(FloatFlags::INVALID);
        if negative {
            min as i64
        } else {
            max as i64
        }
    };
    match p.class {
        FloatClass::QNaN | FloatClass::SNaN => saturate(st, false),
        FloatClass::Inf => saturate(st, p.sign),
        FloatClass::Zero => 0,
        FloatClass::Normal => {
            if p.exp < 0 {
                st.raise(FloatFlags::INEXACT);
                return 0;
            }
            if p.exp >= 64 {
                return saturate(st, p.sign);
            }
            let shift = (SIG_TOP - p.exp) as u32;
            let int_part = (p.sig >> shift) as i128;
            let frac_nonzero = p.sig & ((1 << shift) - 1) != 0;
            let val = if p.sign { -int_part } else { int_part };
            if val > max || val < min {
                return saturate(st, p.sign);
            }
            if frac_nonzero {
                st.raise(FloatFlags::INEXACT);
            }
            val as i64
        }
    }
}
