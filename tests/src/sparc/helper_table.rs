use std::collections::HashSet;

use tcg_core::{CallFlags, HelperType, SideEffectClass};
use tcg_frontend::sparc::{ConfigError, HelperTable, SparcCfg, HELPERS};

use super::init_logging;

fn table(cfg: SparcCfg) -> HelperTable {
    init_logging();
    HelperTable::new(&cfg)
}

#[test]
fn helper_names_are_unique() {
    let mut seen = HashSet::new();
    for h in HELPERS {
        assert!(seen.insert(h.def.name), "duplicate {}", h.def.name);
    }
}

#[test]
fn sun4u_table() {
    let t = table(SparcCfg::SPARC64_SUN4U);
    assert!(!t.is_empty());
    for name in ["save", "flushw", "fxtod", "faddq", "bshuffle", "wrpstate"] {
        assert!(t.get(name).is_some(), "{name}");
    }
    let v8_only = ["rett", "rdpsr", "rdasr17", "ld_code", "set_fsr_nofcc"];
    for name in v8_only.into_iter().chain(["wrgl"]) {
        assert!(t.get(name).is_none(), "{name}");
    }
}

#[test]
fn leon3_table() {
    let t = table(SparcCfg::SPARC32_LEON3);
    for name in ["rett", "rdpsr", "rdasr17", "power_down", "ld_code"] {
        assert!(t.get(name).is_some(), "{name}");
    }
    for name in ["fxtos", "flushw", "fpmerge", "faddq", "tick_get_count"] {
        assert!(t.get(name).is_none(), "{name}");
    }
}

#[test]
fn sun4v_has_wrgl() {
    let t = table(SparcCfg::SPARC64_SUN4V);
    assert!(t.get("wrgl").is_some());
    assert!(t.len() > table(SparcCfg::SPARC64_SUN4U).len());
}

#[test]
fn user_mode_drops_system_helpers() {
    let t = table(SparcCfg::SPARC64_SUN4U.user_mode());
    assert!(t.get("saved").is_none());
    assert!(t.get("wrpstate").is_none());
    assert!(t.get("set_softint").is_none());
    assert!(t.get("ld_asi").is_some());
    assert!(t.get("flushw").is_some());
    assert!(t.get("rdccr").is_some());

    let t = table(SparcCfg::SPARC32_LEON3.user_mode());
    assert!(t.get("ld_asi").is_none());
    assert!(t.get("save").is_some());
}

#[test]
fn every_available_helper_is_listed() {
    let cfg = SparcCfg::SPARC64_SUN4V;
    let t = table(cfg);
    let expected = HELPERS
        .iter()
        .filter(|h| h.unavailable_reason(&cfg).is_none())
        .count();
    assert_eq!(t.len(), expected);
    assert_eq!(t.iter().count(), expected);
}

#[test]
fn require_explains_missing_helpers() {
    let t = table(SparcCfg::SPARC64_SUN4U);
    assert!(t.require("udiv").is_ok());
    assert_eq!(
        t.require("frobnicate").unwrap_err(),
        ConfigError::UnknownHelper("frobnicate".to_string())
    );
    assert_eq!(
        t.require("rett").unwrap_err(),
        ConfigError::HelperUnavailable {
            name: "rett",
            reason: "not implemented on this architecture",
        }
    );
    assert_eq!(
        t.require("wrgl").unwrap_err(),
        ConfigError::HelperUnavailable {
            name: "wrgl",
            reason: "cpu feature missing",
        }
    );

    let t = table(SparcCfg::SPARC64_SUN4U.user_mode());
    let err = t.require("wrpil").unwrap_err();
    assert_eq!(
        err.to_string(),
        "helper `wrpil` unavailable: system emulation only"
    );
}

#[test]
fn call_flags() {
    let t = table(SparcCfg::SPARC64_SUN4U);
    let flags = |name: &str| t.require(name).unwrap().flags;

    let raise = flags("raise_exception");
    assert_eq!(raise, CallFlags::NO_RETURN);
    assert_eq!(raise.side_effect_class(), SideEffectClass::NoReturn);

    // tagged arithmetic writes the condition codes
    assert_eq!(flags("taddcctv"), CallFlags::NONE);
    assert_eq!(flags("tsubcctv"), CallFlags::NONE);

    assert_eq!(flags("fpmerge").side_effect_class(), SideEffectClass::Pure);
    assert_eq!(flags("get_fsr"), CallFlags::NO_WG_SE);
    assert_eq!(flags("saved"), CallFlags::NO_RWG);
    assert_eq!(flags("faddd"), CallFlags::NO_WG);
    assert_eq!(flags("save"), CallFlags::NONE);
}

#[test]
fn leon3_call_flags() {
    let t = table(SparcCfg::SPARC32_LEON3);
    let flags = |name: &str| t.require(name).unwrap().flags;
    assert_eq!(flags("rdasr17"), CallFlags::NONE);
    assert_eq!(flags("ld_code"), CallFlags::NO_WG);
    assert_eq!(flags("wrpsr"), CallFlags::NONE);
}

#[test]
fn signatures() {
    let t = table(SparcCfg::SPARC64_SUN4U);
    let ld = t.require("ld_asi").unwrap();
    assert_eq!(ld.ret, HelperType::I64);
    assert_eq!(
        ld.args,
        &[HelperType::Env, HelperType::Tl, HelperType::Int, HelperType::I32]
    );
    assert!(ld.takes_env());

    let merge = t.require("fpmerge").unwrap();
    assert_eq!(merge.args, &[HelperType::I64, HelperType::I64]);
    assert!(!merge.takes_env());

    let q = t.require("faddq").unwrap();
    assert_eq!(q.ret, HelperType::I128);
}
