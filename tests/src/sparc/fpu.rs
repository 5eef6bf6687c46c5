use proptest::prelude::*;

use tcg_frontend::sparc::fpu::*;
use tcg_frontend::sparc::trap::{v8, v9};
use tcg_frontend::sparc::{FpTrapPolicy, SparcCfg, SparcCpu};

use super::{trap_tt, v8_cpu, v9_cpu};

const DZ: u64 = 0x02;
const NV: u64 = 0x10;
const NX: u64 = 0x01;

fn bits(v: f64) -> u64 {
    v.to_bits()
}

fn cexc(env: &SparcCpu) -> u64 {
    env.get_fsr() & FSR_CEXC_MASK as u64
}

fn aexc(env: &SparcCpu) -> u64 {
    (env.get_fsr() & FSR_AEXC_MASK) >> FSR_AEXC_SHIFT
}

fn ftt(env: &SparcCpu) -> u64 {
    env.get_fsr() & FSR_FTT_MASK as u64
}

// ── Exception folding ────────────────────────────────────────────

#[test]
fn divide_by_zero_accumulates() {
    let mut env = v9_cpu();
    let r = fdivd(&mut env, bits(1.0), bits(0.0)).unwrap();
    assert_eq!(r, bits(f64::INFINITY));
    assert_eq!(cexc(&env), DZ);
    assert_eq!(aexc(&env), DZ);

    // An exact operation clears cexc; aexc sticks.
    let r = faddd(&mut env, bits(1.0), bits(1.0)).unwrap();
    assert_eq!(r, bits(2.0));
    assert_eq!(cexc(&env), 0);
    assert_eq!(aexc(&env), DZ);

    fdivd(&mut env, bits(1.0), bits(3.0)).unwrap();
    assert_eq!(cexc(&env), NX);
    assert_eq!(aexc(&env), DZ | NX);
}

#[test]
fn enabled_exception_traps() {
    let mut env = v9_cpu();
    env.put_fsr(DZ << FSR_TEM_SHIFT);
    let r = fdivd(&mut env, bits(1.0), bits(0.0));
    assert_eq!(trap_tt(r), v9::TT_FP_EXCP);
    assert_eq!(cexc(&env), DZ);
    assert_eq!(aexc(&env), 0);
    assert_eq!(ftt(&env), FSR_FTT_IEEE_EXCP as u64);

    // A disabled exception still just accumulates.
    fdivd(&mut env, bits(1.0), bits(3.0)).unwrap();
    assert_eq!(aexc(&env), NX);
    assert_eq!(ftt(&env), 0);
}

#[test]
fn flags_only_policy_never_traps() {
    let cfg = SparcCfg::SPARC64_SUN4U
        .with_fp_trap_policy(FpTrapPolicy::FlagsOnly);
    let mut env = super::cpu(cfg);
    env.put_fsr(0x1f << FSR_TEM_SHIFT);
    let r = fdivs(&mut env, 1.0f32.to_bits(), 0.0f32.to_bits()).unwrap();
    assert_eq!(r, f32::INFINITY.to_bits());
    assert_eq!(aexc(&env), DZ);
}

#[test]
fn v8_fp_exception_number() {
    let mut env = v8_cpu();
    env.put_fsr(NV << FSR_TEM_SHIFT);
    let r = fsqrts(&mut env, (-4.0f32).to_bits());
    assert_eq!(trap_tt(r), v8::TT_FP_EXCP);
}

// ── FSR image ────────────────────────────────────────────────────

#[test]
fn v9_fsr_condition_fields() {
    let mut env = v9_cpu();
    let image = (3 << FSR_FCC1_SHIFT)
        | (2 << (FSR_FCC1_SHIFT + 4))
        | (1 << FSR_FCC0_SHIFT)
        | (2 << FSR_RD_SHIFT)
        | (NX << FSR_AEXC_SHIFT);
    env.put_fsr(image);
    assert_eq!(env.fcc, [1, 3, 0, 2]);
    assert_eq!(get_fsr(&env), image);
}

#[test]
fn v8_fsr_has_version_and_fcc0_only() {
    let mut env = v8_cpu();
    env.put_fsr((3 << FSR_FCC1_SHIFT) | (2 << FSR_FCC0_SHIFT));
    assert_eq!(env.fcc, [2, 0, 0, 0]);
    let fsr = get_fsr(&env);
    assert_eq!(fsr & FSR_VER_MASK, 4 << 17);
    assert_eq!(fsr >> 32, 0);
}

#[test]
fn ldfsr_variants_keep_ftt() {
    let mut env = v9_cpu();
    env.put_fsr(DZ << FSR_TEM_SHIFT);
    assert!(fdivd(&mut env, bits(1.0), bits(0.0)).is_err());
    env.fcc[0] = 2;

    set_fsr_nofcc_noftt(&mut env, (1 << FSR_FCC0_SHIFT) | 0x1);
    assert_eq!(env.fcc[0], 2);
    assert_eq!(cexc(&env), NX);
    assert_eq!(ftt(&env), FSR_FTT_IEEE_EXCP as u64);

    set_fsr_nofcc(&mut env, 3 << FSR_FCC0_SHIFT);
    assert_eq!(env.fcc[0], 3);
    assert_eq!(ftt(&env), FSR_FTT_IEEE_EXCP as u64);
}

#[test]
fn rounding_mode_comes_from_fsr() {
    let mut env = v9_cpu();
    let big = 16_777_217;
    assert_eq!(fitos(&mut env, big).unwrap(), 16_777_216f32.to_bits());
    assert_eq!(cexc(&env), NX);
    env.put_fsr(2 << FSR_RD_SHIFT);
    assert_eq!(fitos(&mut env, big).unwrap(), 16_777_218f32.to_bits());
}

// ── Compares ─────────────────────────────────────────────────────

#[test]
fn compare_codes() {
    let mut env = v9_cpu();
    assert_eq!(fcmpd(&mut env, bits(1.0), bits(2.0)).unwrap(), FCC_LT);
    assert_eq!(fcmpd(&mut env, bits(2.0), bits(1.0)).unwrap(), FCC_GT);
    assert_eq!(fcmpd(&mut env, bits(0.0), bits(-0.0)).unwrap(), FCC_EQ);
    let nan = bits(f64::NAN);
    assert_eq!(fcmpd(&mut env, nan, bits(1.0)).unwrap(), FCC_UNORD);
    assert_eq!(cexc(&env), 0);
    assert_eq!(fcmped(&mut env, nan, bits(1.0)).unwrap(), FCC_UNORD);
    assert_eq!(cexc(&env), NV);
}

#[test]
fn quiet_compare_signals_on_snan() {
    let mut env = v9_cpu();
    let snan = 0x7f80_0001;
    assert_eq!(fcmps(&mut env, snan, 0).unwrap(), FCC_UNORD);
    assert_eq!(cexc(&env), NV);
    env.put_fsr(NV << FSR_TEM_SHIFT);
    assert_eq!(trap_tt(fcmps(&mut env, snan, 0)), v9::TT_FP_EXCP);
    assert_eq!(fcmps(&mut env, 0x7fc0_0000, 0).unwrap(), FCC_UNORD);
}

#[test]
fn quad_compares() {
    let mut env = v9_cpu();
    let one = 0x3fff_u128 << 112;
    let two = 0x4000_u128 << 112;
    assert_eq!(fcmpq(&mut env, one, two).unwrap(), FCC_LT);
    assert_eq!(fcmpeq(&mut env, two, two).unwrap(), FCC_EQ);
}

// ── Conversions ──────────────────────────────────────────────────

#[test]
fn float_to_int() {
    let mut env = v9_cpu();
    assert_eq!(fdtoi(&mut env, bits(-2.9)).unwrap(), -2);
    assert_eq!(cexc(&env), NX);
    assert_eq!(fstoi(&mut env, 7.0f32.to_bits()).unwrap(), 7);
    assert_eq!(cexc(&env), 0);
    assert_eq!(fdtoi(&mut env, bits(1e10)).unwrap(), i32::MAX);
    assert_eq!(cexc(&env), NV);
    assert_eq!(fdtoi(&mut env, bits(-1e10)).unwrap(), i32::MIN);
    assert_eq!(fstoi(&mut env, f32::NAN.to_bits()).unwrap(), i32::MAX);
    assert_eq!(fdtox(&mut env, bits(-1e19)).unwrap(), i64::MIN);
    assert_eq!(fdtox(&mut env, bits(1e18)).unwrap(), 1_000_000_000_000_000_000);
}

#[test]
fn int_to_float() {
    let mut env = v9_cpu();
    assert_eq!(fitod(&mut env, -5).unwrap(), bits(-5.0));
    assert_eq!(fxtod(&mut env, 1 << 53).unwrap(), bits(9007199254740992.0));
    assert_eq!(fxtos(&mut env, -1).unwrap(), (-1.0f32).to_bits());
    assert_eq!(fitoq(&mut env, 1).unwrap(), 0x3fff_u128 << 112);
    assert_eq!(fxtoq(&mut env, i64::MIN).unwrap(), (0xc03e_u128) << 112);
    assert_eq!(cexc(&env), 0);
}

#[test]
fn widen_and_narrow() {
    let mut env = v9_cpu();
    let third = 1.0f32 / 3.0;
    assert_eq!(fstod(&mut env, third.to_bits()).unwrap(), bits(third as f64));
    assert_eq!(cexc(&env), 0);
    assert_eq!(fdtos(&mut env, bits(1.0 / 3.0)).unwrap(), third.to_bits());
    assert_eq!(cexc(&env), NX);
    let q = fstoq(&mut env, 1.5f32.to_bits()).unwrap();
    assert_eq!(fqtos(&mut env, q).unwrap(), 1.5f32.to_bits());
    let q = fdtoq(&mut env, bits(-0.25)).unwrap();
    assert_eq!(fqtod(&mut env, q).unwrap(), bits(-0.25));
    assert_eq!(fdtos(&mut env, bits(1e300)).unwrap(), f32::INFINITY.to_bits());
    assert_eq!(cexc(&env), 0x08 | NX);
}

#[test]
fn exact_widening_multiplies() {
    let mut env = v9_cpu();
    let (a, b) = (3.0f32, 0.1f32);
    let r = fsmuld(&mut env, a.to_bits(), b.to_bits()).unwrap();
    assert_eq!(r, bits(a as f64 * b as f64));
    assert_eq!(cexc(&env), 0);

    let three = (0x4000_u128 << 112) | (1 << 111);
    assert_eq!(fdmulq(&mut env, bits(1.5), bits(2.0)).unwrap(), three);
}

#[test]
fn quad_ops() {
    let mut env = v9_cpu();
    let two = 0x4000_u128 << 112;
    let four = 0x4001_u128 << 112;
    assert_eq!(faddq(&mut env, two, two).unwrap(), four);
    assert_eq!(fsubq(&mut env, four, two).unwrap(), two);
    assert_eq!(fmulq(&mut env, two, two).unwrap(), four);
    assert_eq!(fdivq(&mut env, four, two).unwrap(), two);
    assert_eq!(fsqrtq(&mut env, four).unwrap(), two);
}

#[test]
fn single_ops() {
    let mut env = v9_cpu();
    let f = |v: f32| v.to_bits();
    assert_eq!(fadds(&mut env, f(1.5), f(2.25)).unwrap(), f(3.75));
    assert_eq!(fsubs(&mut env, f(1.5), f(2.25)).unwrap(), f(-0.75));
    assert_eq!(fmuls(&mut env, f(1.5), f(-2.0)).unwrap(), f(-3.0));
    assert_eq!(fsqrts(&mut env, f(2.25)).unwrap(), f(1.5));
    assert_eq!(fsqrtd(&mut env, bits(2.0)).unwrap(), bits(2f64.sqrt()));
    assert_eq!(fmuld(&mut env, bits(0.5), bits(8.0)).unwrap(), bits(4.0));
    assert_eq!(fsubd(&mut env, bits(0.5), bits(8.0)).unwrap(), bits(-7.5));
}

proptest! {
    #[test]
    fn int_round_trip(v: i32) {
        let mut env = v9_cpu();
        let d = fitod(&mut env, v).unwrap();
        prop_assert_eq!(fdtoi(&mut env, d).unwrap(), v);
        prop_assert_eq!(aexc(&env), 0);
    }

    #[test]
    fn compare_antisymmetric(a: f64, b: f64) {
        let mut env = v9_cpu();
        let ab = fcmpd(&mut env, a.to_bits(), b.to_bits()).unwrap();
        let ba = fcmpd(&mut env, b.to_bits(), a.to_bits()).unwrap();
        let swapped = match ab {
            FCC_LT => FCC_GT,
            FCC_GT => FCC_LT,
            other => other,
        };
        prop_assert_eq!(ba, swapped);
    }
}
