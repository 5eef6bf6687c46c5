//! Floating-point helpers.
//!
//! Each arithmetic helper runs the soft-float engine under the
//! rounding mode in `FSR.RD`, then folds the raised exceptions into
//! the FSR. An enabled exception aborts the instruction with
//! `fp_exception` before the result is written back.
//!
//! Single values travel as `u32`, doubles as `u64`, quads as `u128`.

use super::cfg::{FpTrapPolicy, SparcArch};
use super::cpu::SparcCpu;
use super::softfloat::{
    self, FloatFlags, FloatFmt, FloatRelation, FloatStatus, RoundMode,
};
use super::trap::{HelperResult, TrapKind};

// ── FSR layout ───────────────────────────────────────────────────

pub const FSR_CEXC_MASK: u32 = 0x1f;
pub const FSR_AEXC_SHIFT: u32 = 5;
pub const FSR_AEXC_MASK: u64 = 0x1f << FSR_AEXC_SHIFT;
pub const FSR_FCC0_SHIFT: u32 = 10;
pub const FSR_FTT_SHIFT: u32 = 14;
pub const FSR_FTT_MASK: u32 = 7 << FSR_FTT_SHIFT;
pub const FSR_FTT_IEEE_EXCP: u32 = 1 << FSR_FTT_SHIFT;
pub const FSR_VER_MASK: u64 = 7 << 17;
pub const FSR_TEM_SHIFT: u32 = 23;
pub const FSR_TEM_MASK: u64 = 0x1f << FSR_TEM_SHIFT;
pub const FSR_RD_SHIFT: u32 = 30;
pub const FSR_RD_MASK: u64 = 3 << FSR_RD_SHIFT;
/// V9 only: `fcc1`..`fcc3` live at bits 33:32, 35:34, 37:36.
pub const FSR_FCC1_SHIFT: u32 = 32;

/// Condition codes produced by the compare helpers.
pub const FCC_EQ: u32 = 0;
pub const FCC_LT: u32 = 1;
pub const FCC_GT: u32 = 2;
pub const FCC_UNORD: u32 = 3;

impl SparcCpu {
    /// Soft-float state for the current `FSR.RD`.
    pub fn float_status(&self) -> FloatStatus {
        FloatStatus::new(RoundMode::from_rd(self.fsr >> FSR_RD_SHIFT))
    }

    /// Fold an operation's exception flags into the FSR.
    ///
    /// Replaces `cexc`, clears `ftt` and accumulates into `aexc`, or
    /// raises `fp_exception` when a raised flag is enabled in `TEM`.
    pub fn check_ieee_exceptions(
        &mut self,
        flags: FloatFlags,
    ) -> HelperResult<()> {
        let cexc = flags.bits() as u32;
        if cexc == 0 {
            self.fsr_cexc_ftt = 0;
            return Ok(());
        }
        let tem = ((self.fsr & FSR_TEM_MASK) >> FSR_TEM_SHIFT) as u32;
        if self.cfg.fp_trap_policy == FpTrapPolicy::Architectural
            && cexc & tem != 0
        {
            self.fsr_cexc_ftt = cexc | FSR_FTT_IEEE_EXCP;
            log::debug!("cpu{} ieee trap cexc={:#x}", self.cpu_index, cexc);
            return Err(self.trap(TrapKind::FpException));
        }
        self.fsr |= (cexc as u64) << FSR_AEXC_SHIFT;
        self.fsr_cexc_ftt = cexc;
        Ok(())
    }

    /// Assemble the architectural FSR image.
    pub fn get_fsr(&self) -> u64 {
        let mut fsr = self.fsr | self.fsr_cexc_ftt as u64;
        fsr |= ((self.fcc[0] & 3) as u64) << FSR_FCC0_SHIFT;
        if self.cfg.arch == SparcArch::V9 {
            for (i, fcc) in self.fcc.iter().enumerate().skip(1) {
                let shift = FSR_FCC1_SHIFT + 2 * (i as u32 - 1);
                fsr |= ((fcc & 3) as u64) << shift;
            }
        }
        fsr | (self.cfg.fpu_version as u64 & FSR_VER_MASK)
    }

    /// Write every software-visible FSR field, `fcc` included.
    ///
    /// `ftt` and `ver` are read-only and keep their values.
    pub fn put_fsr(&mut self, fsr: u64) {
        self.fcc[0] = ((fsr >> FSR_FCC0_SHIFT) & 3) as u32;
        if self.cfg.arch == SparcArch::V9 {
            for i in 1..4 {
                let shift = FSR_FCC1_SHIFT + 2 * (i as u32 - 1);
                self.fcc[i] = ((fsr >> shift) & 3) as u32;
            }
        }
        self.put_fsr_nofcc_noftt(fsr);
    }

    fn put_fsr_nofcc_noftt(&mut self, fsr: u64) {
        self.fsr = fsr & (FSR_RD_MASK | FSR_TEM_MASK | FSR_AEXC_MASK);
        self.fsr_cexc_ftt &= FSR_FTT_MASK;
        self.fsr_cexc_ftt |= fsr as u32 & FSR_CEXC_MASK;
        log::trace!("cpu{} fsr <- {:#x}", self.cpu_index, self.get_fsr());
    }
}

/// Run `op` under the CPU's rounding mode and settle its exceptions.
fn with_status<T>(
    env: &mut SparcCpu,
    op: impl FnOnce(&mut FloatStatus) -> T,
) -> HelperResult<T> {
    let mut st = env.float_status();
    let result = op(&mut st);
    env.check_ieee_exceptions(st.flags)?;
    Ok(result)
}

// ── Status register ──────────────────────────────────────────────

pub fn get_fsr(env: &SparcCpu) -> u64 {
    env.get_fsr()
}

/// `LDFSR` on V9: RD, TEM, AEXC and CEXC change, `fcc` and `ftt` do not.
pub fn set_fsr_nofcc_noftt(env: &mut SparcCpu, fsr: u32) {
    env.put_fsr_nofcc_noftt(fsr as u64);
}

/// `LDFSR` on V8: also loads `fcc0`.
pub fn set_fsr_nofcc(env: &mut SparcCpu, fsr: u32) {
    env.fcc[0] = (fsr >> FSR_FCC0_SHIFT) & 3;
    env.put_fsr_nofcc_noftt(fsr as u64);
}

// ── Arithmetic ───────────────────────────────────────────────────

macro_rules! fp_binop {
    ($($name:ident: $ty:ty, $fmt:expr, $op:path;)*) => {$(
        pub fn $name(env: &mut SparcCpu, a: $ty, b: $ty) -> HelperResult<$ty> {
            with_status(env, |st| {
                $op($fmt, a as u128, b as u128, st) as $ty
            })
        }
    )*};
}

fp_binop! {
    fadds: u32, FloatFmt::F32, softfloat::add;
    fsubs: u32, FloatFmt::F32, softfloat::sub;
    fmuls: u32, FloatFmt::F32, softfloat::mul;
    fdivs: u32, FloatFmt::F32, softfloat::div;
    faddd: u64, FloatFmt::F64, softfloat::add;
    fsubd: u64, FloatFmt::F64, softfloat::sub;
    fmuld: u64, FloatFmt::F64, softfloat::mul;
    fdivd: u64, FloatFmt::F64, softfloat::div;
    faddq: u128, FloatFmt::F128, softfloat::add;
    fsubq: u128, FloatFmt::F128, softfloat::sub;
    fmulq: u128, FloatFmt::F128, softfloat::mul;
    fdivq: u128, FloatFmt::F128, softfloat::div;
}

/// Single x single -> double. The widening is exact.
pub fn fsmuld(env: &mut SparcCpu, a: u32, b: u32) -> HelperResult<u64> {
    with_status(env, |st| {
        let a =
            softfloat::convert(FloatFmt::F32, FloatFmt::F64, a as u128, st);
        let b =
            softfloat::convert(FloatFmt::F32, FloatFmt::F64, b as u128, st);
        softfloat::mul(FloatFmt::F64, a, b, st) as u64
    })
}

/// Double x double -> quad. The widening is exact.
pub fn fdmulq(env: &mut SparcCpu, a: u64, b: u64) -> HelperResult<u128> {
    with_status(env, |st| {
        let a =
            softfloat::convert(FloatFmt::F64, FloatFmt::F128, a as u128, st);
        let b =
            softfloat::convert(FloatFmt::F64, FloatFmt::F128, b as u128, st);
        softfloat::mul(FloatFmt::F128, a, b, st)
    })
}

pub fn fsqrts(env: &mut SparcCpu, a: u32) -> HelperResult<u32> {
    with_status(env, |st| {
        softfloat::sqrt(FloatFmt::F32, a as u128, st) as u32
    })
}

pub fn fsqrtd(env: &mut SparcCpu, a: u64) -> HelperResult<u64> {
    with_status(env, |st| {
        softfloat::sqrt(FloatFmt::F64, a as u128, st) as u64
    })
}

pub fn fsqrtq(env: &mut SparcCpu, a: u128) -> HelperResult<u128> {
    with_status(env, |st| softfloat::sqrt(FloatFmt::F128, a, st))
}

// ── Compare ──────────────────────────────────────────────────────

fn fcc_of(rel: FloatRelation) -> u32 {
    match rel {
        FloatRelation::Equal => FCC_EQ,
        FloatRelation::Less => FCC_LT,
        FloatRelation::Greater => FCC_GT,
        FloatRelation::Unordered => FCC_UNORD,
    }
}

fn compare(
    env: &mut SparcCpu,
    fmt: FloatFmt,
    a: u128,
    b: u128,
    signaling: bool,
) -> HelperResult<u32> {
    with_status(env, |st| {
        fcc_of(softfloat::compare(fmt, a, b, signaling, st))
    })
}

/// `FCMPs`: quiet compare; only signaling NaNs raise invalid.
pub fn fcmps(env: &mut SparcCpu, a: u32, b: u32) -> HelperResult<u32> {
    compare(env, FloatFmt::F32, a as u128, b as u128, false)
}

pub fn fcmpd(env: &mut SparcCpu, a: u64, b: u64) -> HelperResult<u32> {
    compare(env, FloatFmt::F64, a as u128, b as u128, false)
}

pub fn fcmpq(env: &mut SparcCpu, a: u128, b: u128) -> HelperResult<u32> {
    compare(env, FloatFmt::F128, a, b, false)
}

/// `FCMPEs`: any NaN operand raises invalid.
pub fn fcmpes(env: &mut SparcCpu, a: u32, b: u32) -> HelperResult<u32> {
    compare(env, FloatFmt::F32, a as u128, b as u128, true)
}

pub fn fcmped(env: &mut SparcCpu, a: u64, b: u64) -> HelperResult<u32> {
    compare(env, FloatFmt::F64, a as u128, b as u128, true)
}

pub fn fcmpeq(env: &mut SparcCpu, a: u128, b: u128) -> HelperResult<u32> {
    compare(env, FloatFmt::F128, a, b, true)
}

// ── Integer conversion ───────────────────────────────────────────

pub fn fitos(env: &mut SparcCpu, src: i32) -> HelperResult<u32> {
    with_status(env, |st| {
        softfloat::from_int(FloatFmt::F32, src as i64, st) as u32
    })
}

pub fn fitod(env: &mut SparcCpu, src: i32) -> HelperResult<u64> {
    with_status(env, |st| {
        softfloat::from_int(FloatFmt::F64, src as i64, st) as u64
    })
}

pub fn fitoq(env: &mut SparcCpu, src: i32) -> HelperResult<u128> {
    with_status(env, |st| softfloat::from_int(FloatFmt::F128, src as i64, st))
}

pub fn fxtos(env: &mut SparcCpu, src: i64) -> HelperResult<u32> {
    with_status(env, |st| {
        softfloat::from_int(FloatFmt::F32, src, st) as u32
    })
}

pub fn fxtod(env: &mut SparcCpu, src: i64) -> HelperResult<u64> {
    with_status(env, |st| {
        softfloat::from_int(FloatFmt::F64, src, st) as u64
    })
}

pub fn fxtoq(env: &mut SparcCpu, src: i64) -> HelperResult<u128> {
    with_status(env, |st| softfloat::from_int(FloatFmt::F128, src, st))
}

fn to_int(
    env: &mut SparcCpu,
    fmt: FloatFmt,
    src: u128,
    width: u32,
) -> HelperResult<i64> {
    with_status(env, |st| {
        softfloat::to_int_round_to_zero(fmt, src, width, st)
    })
}

pub fn fstoi(env: &mut SparcCpu, src: u32) -> HelperResult<i32> {
    Ok(to_int(env, FloatFmt::F32, src as u128, 32)? as i32)
}

pub fn fdtoi(env: &mut SparcCpu, src: u64) -> HelperResult<i32> {
    Ok(to_int(env, FloatFmt::F64, src as u128, 32)? as i32)
}

pub fn fqtoi(env: &mut SparcCpu, src: u128) -> HelperResult<i32> {
    Ok(to_int(env, FloatFmt::F128, src, 32)? as i32)
}

pub fn fstox(env: &mut SparcCpu, src: u32) -> HelperResult<i64> {
    to_int(env, FloatFmt::F32, src as u128, 64)
}

pub fn fdtox(env: &mut SparcCpu, src: u64) -> HelperResult<i64> {
    to_int(env, FloatFmt::F64, src as u128, 64)
}

pub fn fqtox(env: &mut SparcCpu, src: u128) -> HelperResult<i64> {
    to_int(env, FloatFmt::F128, src, 64)
}

// ── Format conversion ────────────────────────────────────────────

fn convert(
    env: &mut SparcCpu,
    from: FloatFmt,
    to: FloatFmt,
    src: u128,
) -> HelperResult<u128> {
    with_status(env, |st| softfloat::convert(from, to, src, st))
}

pub fn fstod(env: &mut SparcCpu, src: u32) -> HelperResult<u64> {
    Ok(convert(env, FloatFmt::F32, FloatFmt::F64, src as u128)? as u64)
}

pub fn fstoq(env: &mut SparcCpu, src: u32) -> HelperResult<u128> {
    convert(env, FloatFmt::F32, FloatFmt::F128, src as u128)
}

pub fn fdtos(env: &mut SparcCpu, src: u64) -> HelperResult<u32> {
    Ok(convert(env, FloatFmt::F64, FloatFmt::F32, src as u128)? as u32)
}

pub fn fdtoq(env: &mut SparcCpu, src: u64) -> HelperResult<u128> {
    convert(env, FloatFmt::F64, FloatFmt::F128, src as u128)
}

pub fn fqtos(env: &mut SparcCpu, src: u128) -> HelperResult<u32> {
    Ok(convert(env, FloatFmt::F128, FloatFmt::F32, src)? as u32)
}

pub fn fqtod(env: &mut SparcCpu, src: u128) -> HelperResult<u64> {
    Ok(convert(env, FloatFmt::F128, FloatFmt::F64, src)? as u64)
}
