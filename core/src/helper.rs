//! Out-of-line helper descriptors.
//!
//! Generated code calls helpers for operations too large or too
//! stateful to inline. Each helper publishes its signature and how
//! it interacts with CPU globals so the optimizer can keep values in
//! host registers across the call.

use crate::types::Type;

/// Call flags describing a helper's interaction with globals.
///
/// Maps to QEMU's `TCG_CALL_*` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallFlags(u8);

impl CallFlags {
    /// Reads and writes globals; full synchronisation required.
    pub const NONE: CallFlags = CallFlags(0);
    /// Does not read globals.
    pub const NO_READ_GLOBALS: CallFlags = CallFlags(0x01);
    /// Does not write globals.
    pub const NO_WRITE_GLOBALS: CallFlags = CallFlags(0x02);
    /// Has no side effects and may be removed if its result is dead.
    pub const NO_SIDE_EFFECTS: CallFlags = CallFlags(0x04);
    /// Never returns to generated code.
    pub const NO_RETURN: CallFlags = CallFlags(0x08);

    pub const NO_RWG: CallFlags = CallFlags(0x01);
    pub const NO_WG: CallFlags = CallFlags(0x02);
    pub const NO_RWG_SE: CallFlags = CallFlags(0x01 | 0x04);
    pub const NO_WG_SE: CallFlags = CallFlags(0x02 | 0x04);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: CallFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: CallFlags) -> Self {
        Self(self.0 | other.0)
    }

    /// Coarse classification used by callers that only care about
    /// whether the call may be reordered or dropped.
    pub const fn side_effect_class(self) -> SideEffectClass {
        if self.contains(Self::NO_RETURN) {
            SideEffectClass::NoReturn
        } else if self.contains(Self::NO_RWG_SE) {
            SideEffectClass::Pure
        } else if self.contains(Self::NO_WG_SE) {
            SideEffectClass::ReadOnly
        } else if self.contains(Self::NO_READ_GLOBALS) {
            SideEffectClass::NoGlobals
        } else if self.contains(Self::NO_WRITE_GLOBALS) {
            SideEffectClass::NoWriteGlobals
        } else {
            SideEffectClass::General
        }
    }
}

/// How much the code generator must synchronise around a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideEffectClass {
    /// Result depends only on arguments; the call may be dropped.
    Pure,
    /// Reads globals, writes nothing, no side effects.
    ReadOnly,
    /// Touches CPU state only through the env pointer.
    NoGlobals,
    /// Reads globals, may fault or touch memory.
    NoWriteGlobals,
    /// May read and write any global.
    General,
    /// Transfers control away and never returns.
    NoReturn,
}

/// Helper argument/return kinds.
///
/// Maps to the `dh_*` type tags of QEMU's `DEF_HELPER_*` macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperType {
    Void,
    /// Target-long: 32 or 64 bits depending on the guest.
    Tl,
    I32,
    S32,
    I64,
    S64,
    F32,
    F64,
    /// 128-bit quad payload.
    I128,
    Int,
    Ptr,
    /// The CPU state pointer.
    Env,
}

impl HelperType {
    /// IR type carrying this value, `None` for `Void`.
    pub const fn ir_type(self, target_long: Type) -> Option<Type> {
        match self {
            HelperType::Void => None,
            HelperType::Tl => Some(target_long),
            HelperType::I32
            | HelperType::S32
            | HelperType::F32
            | HelperType::Int => Some(Type::I32),
            HelperType::I64
            | HelperType::S64
            | HelperType::F64
            | HelperType::Ptr
            | HelperType::Env => Some(Type::I64),
            HelperType::I128 => Some(Type::I128),
        }
    }
}

/// Static description of one helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperDef {
    pub name: &'static str,
    pub flags: CallFlags,
    pub ret: HelperType,
    pub args: &'static [HelperType],
}

impl HelperDef {
    pub const fn nb_args(&self) -> usize {
        self.args.len()
    }

    pub const fn takes_env(&self) -> bool {
        matches!(self.args.first(), Some(HelperType::Env))
    }
}
