use tcg_core::helper::*;
use tcg_core::Type;

#[test]
fn call_flag_aliases() {
    assert_eq!(CallFlags::NO_RWG, CallFlags::NO_READ_GLOBALS);
    assert_eq!(CallFlags::NO_WG, CallFlags::NO_WRITE_GLOBALS);
    assert_eq!(
        CallFlags::NO_RWG_SE,
        CallFlags::NO_RWG.union(CallFlags::NO_SIDE_EFFECTS)
    );
    assert!(CallFlags::NO_WG_SE.contains(CallFlags::NO_SIDE_EFFECTS));
    assert!(!CallFlags::NO_WG.contains(CallFlags::NO_READ_GLOBALS));
}

#[test]
fn side_effect_classes() {
    assert_eq!(CallFlags::NONE.side_effect_class(), SideEffectClass::General);
    assert_eq!(
        CallFlags::NO_RWG_SE.side_effect_class(),
        SideEffectClass::Pure
    );
    assert_eq!(
        CallFlags::NO_WG_SE.side_effect_class(),
        SideEffectClass::ReadOnly
    );
    assert_eq!(
        CallFlags::NO_RWG.side_effect_class(),
        SideEffectClass::NoGlobals
    );
    assert_eq!(
        CallFlags::NO_WG.side_effect_class(),
        SideEffectClass::NoWriteGlobals
    );
    let noreturn = CallFlags::NO_WG.union(CallFlags::NO_RETURN);
    assert_eq!(noreturn.side_effect_class(), SideEffectClass::NoReturn);
}

#[test]
fn helper_type_mapping() {
    assert_eq!(HelperType::Void.ir_type(Type::I64), None);
    assert_eq!(HelperType::Tl.ir_type(Type::I32), Some(Type::I32));
    assert_eq!(HelperType::Tl.ir_type(Type::I64), Some(Type::I64));
    assert_eq!(HelperType::F32.ir_type(Type::I64), Some(Type::I32));
    assert_eq!(HelperType::F64.ir_type(Type::I32), Some(Type::I64));
    assert_eq!(HelperType::I128.ir_type(Type::I64), Some(Type::I128));
    assert_eq!(HelperType::Env.ir_type(Type::I32), Some(Type::I64));
}

#[test]
fn helper_def_shape() {
    let def = HelperDef {
        name: "udiv",
        flags: CallFlags::NO_WG,
        ret: HelperType::I64,
        args: &[HelperType::Env, HelperType::Tl, HelperType::Tl],
    };
    assert_eq!(def.nb_args(), 3);
    assert!(def.takes_env());

    let pure = HelperDef {
        name: "pdist",
        flags: CallFlags::NO_RWG_SE,
        ret: HelperType::I64,
        args: &[HelperType::I64, HelperType::I64, HelperType::I64],
    };
    assert!(!pure.takes_env());
}
