//! SPARC helper declarations.
//!
//! One entry per out-of-line helper: its call signature and flags as
//! the code generator sees them, plus the CPU models that provide it.
//! [`HelperTable`] resolves the subset a given [`SparcCfg`] offers.

use std::collections::HashMap;

use tcg_core::{CallFlags as C, HelperDef, HelperType as T};

use super::cfg::{CpuFeatures as F, SparcArch, SparcCfg};
use super::error::ConfigError;

/// Architectures a helper exists on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Avail {
    V8,
    V9,
    Both,
}

impl Avail {
    pub const fn includes(self, arch: SparcArch) -> bool {
        matches!(
            (self, arch),
            (Avail::Both, _)
                | (Avail::V8, SparcArch::V8)
                | (Avail::V9, SparcArch::V9)
        )
    }
}

/// A helper and where it is available.
#[derive(Clone, Copy, Debug)]
pub struct SparcHelper {
    pub def: HelperDef,
    pub arch: Avail,
    /// Architectures that keep the helper under user-mode emulation;
    /// `None` for system-only helpers.
    pub user: Option<Avail>,
    pub requires: F,
}

impl SparcHelper {
    /// Why `cfg` cannot use this helper, if it cannot.
    pub fn unavailable_reason(&self, cfg: &SparcCfg) -> Option<&'static str> {
        if !self.arch.includes(cfg.arch) {
            return Some("not implemented on this architecture");
        }
        if cfg.user_only && !self.user.is_some_and(|u| u.includes(cfg.arch)) {
            return Some("system emulation only");
        }
        if !cfg.features.contains(self.requires) {
            return Some("cpu feature missing");
        }
        None
    }
}

const ALL: Option<Avail> = Some(Avail::Both);
const SYS: Option<Avail> = None;

macro_rules! helpers {
    ($(
        $name:ident: $flags:expr, $ret:ident($($arg:ident),*),
        $arch:ident, $user:expr, $req:expr;
    )*) => {
        &[$(SparcHelper {
            def: HelperDef {
                name: stringify!($name),
                flags: $flags,
                ret: T::$ret,
                args: &[$(T::$arg),*],
            },
            arch: Avail::$arch,
            user: $user,
            requires: $req,
        }),*]
    };
}

/// Every SPARC helper.
pub static HELPERS: &[SparcHelper] = helpers! {
    // Register windows.
    save: C::NONE, Void(Env), Both, ALL, F::EMPTY;
    restore: C::NONE, Void(Env), Both, ALL, F::EMPTY;
    flushw: C::NO_WG, Void(Env), V9, ALL, F::EMPTY;
    saved: C::NO_RWG, Void(Env), V9, SYS, F::EMPTY;
    restored: C::NO_RWG, Void(Env), V9, SYS, F::EMPTY;
    rdcwp: C::NONE, Tl(Env), V9, SYS, F::EMPTY;
    wrcwp: C::NONE, Void(Env, Tl), V9, SYS, F::EMPTY;

    // Privileged state and traps.
    rdpsr: C::NONE, Tl(Env), V8, SYS, F::EMPTY;
    wrpsr: C::NONE, Void(Env, Tl), V8, SYS, F::EMPTY;
    rett: C::NONE, Void(Env), V8, SYS, F::EMPTY;
    rdasr17: C::NONE, Tl(Env), V8, SYS, F::ASR17;
    power_down: C::NONE, Void(Env), V8, SYS, F::POWERDOWN;
    wrpil: C::NO_RWG, Void(Env, Tl), V9, SYS, F::EMPTY;
    wrgl: C::NONE, Void(Env, Tl), V9, SYS, F::GL;
    wrpstate: C::NONE, Void(Env, Tl), V9, SYS, F::EMPTY;
    done: C::NONE, Void(Env), V9, SYS, F::EMPTY;
    retry: C::NONE, Void(Env), V9, SYS, F::EMPTY;
    rdccr: C::NONE, Tl(Env), V9, ALL, F::EMPTY;
    wrccr: C::NONE, Void(Env, Tl), V9, ALL, F::EMPTY;
    debug: C::NONE, Void(Env), Both, ALL, F::EMPTY;
    raise_exception: C::NO_RETURN, Void(Env, Int), Both, ALL, F::EMPTY;

    // Integer.
    udiv: C::NO_WG, I64(Env, Tl, Tl), Both, ALL, F::EMPTY;
    sdiv: C::NO_WG, I64(Env, Tl, Tl), Both, ALL, F::EMPTY;
    taddcctv: C::NONE, Tl(Env, Tl, Tl), Both, ALL, F::EMPTY;
    tsubcctv: C::NONE, Tl(Env, Tl, Tl), Both, ALL, F::EMPTY;

    // Alternate space memory.
    ld_asi: C::NO_WG, I64(Env, Tl, Int, I32), Both, Some(Avail::V9),
        F::EMPTY;
    st_asi: C::NO_WG, Void(Env, Tl, I64, Int, I32), Both,
        Some(Avail::V9), F::EMPTY;
    ld_code: C::NO_WG, I64(Env, Tl, I32), V8, SYS, F::EMPTY;

    // FP status.
    get_fsr: C::NO_WG_SE, Tl(Env), Both, ALL, F::FLOAT;
    set_fsr_nofcc_noftt: C::NO_RWG, Void(Env, I32), Both, ALL, F::FLOAT;
    set_fsr_nofcc: C::NO_RWG, Void(Env, I32), V8, ALL, F::FLOAT;

    // FP arithmetic.
    fadds: C::NO_WG, F32(Env, F32, F32), Both, ALL, F::FLOAT;
    fsubs: C::NO_WG, F32(Env, F32, F32), Both, ALL, F::FLOAT;
    fmuls: C::NO_WG, F32(Env, F32, F32), Both, ALL, F::FLOAT;
    fdivs: C::NO_WG, F32(Env, F32, F32), Both, ALL, F::FLOAT;
    faddd: C::NO_WG, F64(Env, F64, F64), Both, ALL, F::FLOAT;
    fsubd: C::NO_WG, F64(Env, F64, F64), Both, ALL, F::FLOAT;
    fmuld: C::NO_WG, F64(Env, F64, F64), Both, ALL, F::FLOAT;
    fdivd: C::NO_WG, F64(Env, F64, F64), Both, ALL, F::FLOAT;
    faddq: C::NO_WG, I128(Env, I128, I128), Both, ALL, F::FLOAT128;
    fsubq: C::NO_WG, I128(Env, I128, I128), Both, ALL, F::FLOAT128;
    fmulq: C::NO_WG, I128(Env, I128, I128), Both, ALL, F::FLOAT128;
    fdivq: C::NO_WG, I128(Env, I128, I128), Both, ALL, F::FLOAT128;
    fsmuld: C::NO_WG, F64(Env, F32, F32), Both, ALL, F::FSMULD;
    fdmulq: C::NO_WG, I128(Env, F64, F64), Both, ALL, F::FLOAT128;
    fsqrts: C::NO_WG, F32(Env, F32), Both, ALL, F::FSQRT;
    fsqrtd: C::NO_WG, F64(Env, F64), Both, ALL, F::FSQRT;
    fsqrtq: C::NO_WG, I128(Env, I128), Both, ALL,
        F::FSQRT.union(F::FLOAT128);

    // FP compare.
    fcmps: C::NO_WG, I32(Env, F32, F32), Both, ALL, F::FLOAT;
    fcmpd: C::NO_WG, I32(Env, F64, F64), Both, ALL, F::FLOAT;
    fcmpq: C::NO_WG, I32(Env, I128, I128), Both, ALL, F::FLOAT128;
    fcmpes: C::NO_WG, I32(Env, F32, F32), Both, ALL, F::FLOAT;
    fcmped: C::NO_WG, I32(Env, F64, F64), Both, ALL, F::FLOAT;
    fcmpeq: C::NO_WG, I32(Env, I128, I128), Both, ALL, F::FLOAT128;

    // FP conversion.
    fitos: C::NO_WG, F32(Env, S32), Both, ALL, F::FLOAT;
    fitod: C::NO_WG, F64(Env, S32), Both, ALL, F::FLOAT;
    fitoq: C::NO_WG, I128(Env, S32), Both, ALL, F::FLOAT128;
    fxtos: C::NO_WG, F32(Env, S64), V9, ALL, F::FLOAT;
    fxtod: C::NO_WG, F64(Env, S64), V9, ALL, F::FLOAT;
    fxtoq: C::NO_WG, I128(Env, S64), V9, ALL, F::FLOAT128;
    fstoi: C::NO_WG, S32(Env, F32), Both, ALL, F::FLOAT;
    fdtoi: C::NO_WG, S32(Env, F64), Both, ALL, F::FLOAT;
    fqtoi: C::NO_WG, S32(Env, I128), Both, ALL, F::FLOAT128;
    fstox: C::NO_WG, S64(Env, F32), V9, ALL, F::FLOAT;
    fdtox: C::NO_WG, S64(Env, F64), V9, ALL, F::FLOAT;
    fqtox: C::NO_WG, S64(Env, I128), V9, ALL, F::FLOAT128;
    fstod: C::NO_WG, F64(Env, F32), Both, ALL, F::FLOAT;
    fstoq: C::NO_WG, I128(Env, F32), Both, ALL, F::FLOAT128;
    fdtos: C::NO_WG, F32(Env, F64), Both, ALL, F::FLOAT;
    fdtoq: C::NO_WG, I128(Env, F64), Both, ALL, F::FLOAT128;
    fqtos: C::NO_WG, F32(Env, I128), Both, ALL, F::FLOAT128;
    fqtod: C::NO_WG, F64(Env, I128), Both, ALL, F::FLOAT128;

    // VIS.
    array8: C::NO_RWG_SE, Tl(Tl, Tl), V9, ALL, F::VIS1;
    fpmerge: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fmul8x16: C::NO_RWG_SE, I64(I32, I64), V9, ALL, F::VIS1;
    fmul8x16a: C::NO_RWG_SE, I64(I32, S32), V9, ALL, F::VIS1;
    fmul8sux16: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fmul8ulx16: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fexpand: C::NO_RWG_SE, I64(I32), V9, ALL, F::VIS1;
    pdist: C::NO_RWG_SE, I64(I64, I64, I64), V9, ALL, F::VIS1;
    fpack16: C::NO_RWG_SE, I32(I64, I64), V9, ALL, F::VIS1;
    fpack32: C::NO_RWG_SE, I64(I64, I64, I64), V9, ALL, F::VIS1;
    fpackfix: C::NO_RWG_SE, I32(I64, I64), V9, ALL, F::VIS1;
    bshuffle: C::NO_RWG_SE, I64(I64, I64, I64), V9, ALL, F::VIS2;
    fcmpgt16: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fcmpeq16: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fcmple16: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fcmpne16: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fcmpgt32: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fcmpeq32: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fcmple32: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;
    fcmpne32: C::NO_RWG_SE, I64(I64, I64), V9, ALL, F::VIS1;

    // Interrupts and timers.
    set_softint: C::NO_RWG, Void(Env, I64), V9, SYS, F::EMPTY;
    clear_softint: C::NO_RWG, Void(Env, I64), V9, SYS, F::EMPTY;
    write_softint: C::NO_RWG, Void(Env, I64), V9, SYS, F::EMPTY;
    tick_set_count: C::NO_RWG, Void(Ptr, I64), V9, SYS, F::EMPTY;
    tick_get_count: C::NO_WG, I64(Env, Ptr, Int), V9, SYS, F::EMPTY;
    tick_set_limit: C::NO_RWG, Void(Ptr, I64), V9, SYS, F::EMPTY;
};

/// Helpers a particular CPU model can call, by name.
#[derive(Debug)]
pub struct HelperTable {
    cfg: SparcCfg,
    defs: HashMap<&'static str, &'static HelperDef>,
}

impl HelperTable {
    pub fn new(cfg: &SparcCfg) -> Self {
        let defs: HashMap<_, _> = HELPERS
            .iter()
            .filter(|h| h.unavailable_reason(cfg).is_none())
            .map(|h| (h.def.name, &h.def))
            .collect();
        log::debug!("{}: {} helpers available", cfg.name, defs.len());
        Self { cfg: *cfg, defs }
    }

    pub fn get(&self, name: &str) -> Option<&'static HelperDef> {
        self.defs.get(name).copied()
    }

    /// Look up `name`, explaining why it is missing if it is.
    pub fn require(
        &self,
        name: &str,
    ) -> Result<&'static HelperDef, ConfigError> {
        if let Some(def) = self.get(name) {
            return Ok(def);
        }
        let helper = HELPERS
            .iter()
            .find(|h| h.def.name == name)
            .ok_or_else(|| ConfigError::UnknownHelper(name.to_string()))?;
        let reason = helper
            .unavailable_reason(&self.cfg)
            .unwrap_or("not available");
        Err(ConfigError::HelperUnavailable {
            name: helper.def.name,
            reason,
        })
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static HelperDef> + '_ {
        self.defs.values().copied()
    }
}
