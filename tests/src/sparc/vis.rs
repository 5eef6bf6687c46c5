use proptest::prelude::*;

use tcg_core::Cond;
use tcg_frontend::sparc::vis::*;

#[test]
fn fpmerge_interleaves() {
    assert_eq!(fpmerge(0x1122_3344, 0xaabb_ccdd), 0x11aa_22bb_33cc_44dd);
    let hi = 0xffff_ffff_0000_0000;
    assert_eq!(
        fpmerge(hi | 0x1122_3344, hi | 0xaabb_ccdd),
        0x11aa_22bb_33cc_44dd
    );
}

#[test]
fn fmul8x16_lanes_and_rounding() {
    // bytes 0x80, 0x80, 0x01, 0x01 against 256, -256, 128, 127
    let r = fmul8x16(0x0101_8080, 0x007f_0080_ff00_0100);
    assert_eq!(r, 0x0000_0001_ff80_0080);
}

#[test]
fn fmul8x16a_uses_low_half_of_scalar() {
    assert_eq!(fmul8x16a(0x0201_ff00, 0x0200), 0x0004_0002_01fe_0000);
    assert_eq!(fmul8x16a(0x0201_ff00, 0x7fff_0200), 0x0004_0002_01fe_0000);
}

#[test]
fn fmul8sux16_signed_upper_byte() {
    let r = fmul8sux16(0x0000_0000_0200_ff00, 0x0000_0000_0100_0100);
    assert_eq!(r, 0x0000_0000_0002_ffff);
}

#[test]
fn fmul8ulx16_unsigned_lower_byte() {
    let r = fmul8ulx16(0x0000_0000_ab80_00ff, 0x0000_0000_0100_0100);
    assert_eq!(r, 0x0000_0000_0080_00ff);
}

#[test]
fn fexpand_widens_bytes() {
    assert_eq!(fexpand(0x1122_33ff), 0x0110_0220_0330_0ff0);
}

#[test]
fn pdist_accumulates() {
    assert_eq!(pdist(10, 0x05ff, 0x0800), 10 + 3 + 255);
    assert_eq!(pdist(0, u64::MAX, 0), 8 * 255);
    assert_eq!(pdist(u64::MAX, 1, 0), 0);
}

#[test]
fn fpack16_scales_and_clamps() {
    // scale 7 keeps the lane value
    let gsr = 7 << 3;
    assert_eq!(fpack16(gsr, 0x00ff_ffff_0100_0010), 0xff00_ff10);
    // scale 0 drops seven fraction bits
    assert_eq!(fpack16(0, 0x0000_007f_0080_0100), 0x0000_0102);
    // the scale field is four bits wide
    assert_eq!(fpack16(gsr | (1 << 7), 0x10), fpack16(gsr, 0x10));
}

#[test]
fn fpack32_shifts_accumulator() {
    let gsr = 23 << 3;
    let rs2 = (300u64 << 32) | 0x42;
    let r = fpack32(gsr, 0x0011_2233_0044_5566, rs2);
    assert_eq!(r, 0x1122_33ff_4455_6642);

    // negative lanes clamp to zero; the top byte of rs1 falls off
    let rs2 = 0xffff_fff0u64 << 32 | 0xffff_fff0;
    assert_eq!(fpack32(gsr, 0xaa00_0000_0000_0001, rs2), 0x100);
}

#[test]
fn fpackfix_saturates() {
    let gsr = 16 << 3;
    let rs2 = (0x0001_0000u64 << 32) | 0xffff_fffb;
    assert_eq!(fpackfix(gsr, rs2), 0x7fff_fffb);

    let rs2 = (0x0003_0000u64 << 32) | 0xfffe_0000;
    assert_eq!(fpackfix(0, rs2), 0x0003_fffe);

    let rs2 = 0x8000_0000u64 << 32;
    assert_eq!(fpackfix(gsr, rs2), 0x8000_0000);
}

#[test]
fn bshuffle_selects_bytes() {
    let a = 0x0011_2233_4455_6677;
    let b: u64 = 0x8899_aabb_ccdd_eeff;
    let gsr = |mask: u64| mask << 32 | 0x1f;
    assert_eq!(bshuffle(gsr(0x0123_4567), a, b), a);
    assert_eq!(bshuffle(gsr(0x89ab_cdef), a, b), b);
    assert_eq!(bshuffle(gsr(0xfedc_ba98), a, b), b.swap_bytes());
    let top = 0xab00_0000_0000_0000;
    assert_eq!(bshuffle(gsr(0), top, b), 0xabab_abab_abab_abab);
    assert_eq!(bshuffle(gsr(0x0819_2a3b), a, b), 0x0088_1199_22aa_33bb);
}

#[test]
fn fcmp16_is_signed() {
    let a = 0x0001_0000_ffff_0005;
    let b = 0x0000_0000_0000_0003;
    assert_eq!(fcmpgt16(a, b), 0b1001);
    assert_eq!(fcmple16(a, b), 0b0110);
    assert_eq!(fcmpeq16(a, b), 0b0100);
    assert_eq!(fcmpne16(a, b), 0b1011);
    assert_eq!(fcmple16(0x8000, 0), 0b1111);
}

#[test]
fn fcmp32_lanes() {
    let a = 0x0000_0001_0000_0002;
    let b = 0x0000_0001_0000_0003;
    assert_eq!(fcmpeq32(a, b), 0b10);
    assert_eq!(fcmpne32(a, b), 0b01);
    assert_eq!(fcmple32(a, b), 0b11);
    assert_eq!(fcmpgt32(a, b), 0);
    assert_eq!(fcmpgt32(0, 0x8000_0000_8000_0000), 0b11);
}

#[test]
fn array8_fields() {
    assert_eq!(array8(0x7ff, 0), 0);
    assert_eq!(array8(1 << 11, 0), 1);
    assert_eq!(array8(1 << 33, 0), 1 << 2);
    assert_eq!(array8(1 << 55, 0), 1 << 4);
    assert_eq!(array8(1 << 13, 0), 1 << 5);
    assert_eq!(array8(1 << 35, 0), 1 << 9);
    assert_eq!(array8(1 << 56, 0), 1 << 13);
    assert_eq!(array8(1 << 17, 0), 0);
    assert_eq!(array8(1 << 17, 2), 1 << 17);
    assert_eq!(array8(1 << 39, 2), 1 << 19);
    assert_eq!(array8(1 << 60, 2), 1 << 21);
    assert_eq!(array8(1 << 39, 10), 1 << 19);
}

fn lane_cmp(cond: Cond, width: LaneWidth, a: u64, b: u64, i: u32) -> bool {
    let bits = width.bits();
    let sext =
        |v: u64| (((v >> (bits * i)) << (64 - bits)) as i64) >> (64 - bits);
    cond.eval(sext(a), sext(b))
}

const CONDS: [Cond; 4] = [Cond::Gt, Cond::Eq, Cond::Le, Cond::Ne];

proptest! {
    #[test]
    fn fcmp_matches_per_lane(a: u64, b: u64) {
        for width in [LaneWidth::W16, LaneWidth::W32] {
            for cond in CONDS {
                let mask = fcmp(cond, width, a, b);
                prop_assert!(mask >> width.lanes() == 0);
                for i in 0..width.lanes() {
                    let bit = (mask >> i) & 1 != 0;
                    prop_assert_eq!(bit, lane_cmp(cond, width, a, b, i));
                }
            }
        }
    }

    #[test]
    fn fcmp_complements(a: u64, b: u64) {
        prop_assert_eq!(fcmpgt16(a, b) ^ fcmple16(a, b), 0xf);
        prop_assert_eq!(fcmpeq16(a, b) ^ fcmpne16(a, b), 0xf);
        prop_assert_eq!(fcmpgt32(a, b) ^ fcmple32(a, b), 0x3);
        prop_assert_eq!(fcmpeq32(a, b) ^ fcmpne32(a, b), 0x3);
        prop_assert_eq!(fcmpeq16(a, a), 0xf);
    }
}
