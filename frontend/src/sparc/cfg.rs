//! SPARC CPU model configuration.
//!
//! Provides a feature bitmask (`CpuFeatures`) and a per-CPU
//! configuration struct (`SparcCfg`) mirroring QEMU's `sparc_def_t`.
//! Profiles are `const` so they can seed static tables.

use super::error::ConfigError;

// ── Architecture ─────────────────────────────────────────────────

/// Architecture generation the CPU implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SparcArch {
    /// 32-bit SPARC V8 (PSR/WIM/TBR privileged model).
    V8,
    /// 64-bit SPARC V9 (PSTATE/TL/window counters).
    V9,
}

// ── Feature bitmask ──────────────────────────────────────────────

/// Optional CPU features.
///
/// Maps to QEMU's `CPU_FEATURE_*` bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuFeatures(u32);

impl CpuFeatures {
    pub const EMPTY: Self = Self(0);
    /// Floating-point unit present.
    pub const FLOAT: Self = Self(1 << 0);
    /// Quad-precision arithmetic implemented in hardware.
    pub const FLOAT128: Self = Self(1 << 1);
    pub const FSQRT: Self = Self(1 << 2);
    pub const FSMULD: Self = Self(1 << 3);
    pub const VIS1: Self = Self(1 << 4);
    pub const VIS2: Self = Self(1 << 5);
    /// Hyperprivileged mode (sun4v).
    pub const HYPV: Self = Self(1 << 6);
    /// Global-level register banks instead of AG/MG/IG.
    pub const GL: Self = Self(1 << 7);
    /// LEON %asr17 configuration register.
    pub const ASR17: Self = Self(1 << 8);
    /// LEON power-down via `wr %asr19`.
    pub const POWERDOWN: Self = Self(1 << 9);
    /// LEON cache control ASI.
    pub const CACHE_CTRL: Self = Self(1 << 10);
    /// `ta 0` with traps disabled shuts the machine down.
    pub const TA0_SHUTDOWN: Self = Self(1 << 11);

    pub const V9_ONLY: Self = Self(
        Self::VIS1.0 | Self::VIS2.0 | Self::HYPV.0 | Self::GL.0,
    );
    pub const V8_ONLY: Self = Self(
        Self::ASR17.0
            | Self::POWERDOWN.0
            | Self::CACHE_CTRL.0
            | Self::TA0_SHUTDOWN.0,
    );

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & ((1 << 12) - 1))
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

// ── FP trap policy ───────────────────────────────────────────────

/// What happens when an FP exception is enabled in `FSR.TEM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FpTrapPolicy {
    /// Raise `fp_exception` with `FTT = IEEE_754_exception`.
    #[default]
    Architectural,
    /// Accumulate flags only; `TEM` is ignored.
    FlagsOnly,
}

// ── CPU configuration ────────────────────────────────────────────

/// Per-CPU model configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparcCfg {
    pub name: &'static str,
    pub arch: SparcArch,
    /// User-mode emulation: no privileged state transitions.
    pub user_only: bool,
    pub nwindows: u32,
    /// Maximum trap level (V9); 0 on V8.
    pub maxtl: u32,
    pub features: CpuFeatures,
    /// IU version: PSR impl/ver (V8) or the `%ver` register (V9).
    pub iu_version: u64,
    /// Value of `FSR.ver`, pre-shifted to bits 19:17.
    pub fpu_version: u32,
    /// MMU control register implementation/version bits (V8).
    pub mmu_version: u32,
    pub fp_trap_policy: FpTrapPolicy,
}

pub const MIN_NWINDOWS: u32 = 3;
pub const MAX_NWINDOWS: u32 = 32;
pub const MAXTL_MAX: u32 = 8;

/// Assemble a V9 `%ver` value.
const fn v9_version(manuf: u64, imp: u64, mask: u64, maxtl: u64) -> u64 {
    (manuf << 48) | (imp << 32) | (mask << 24) | (maxtl << 8)
}

// ── Predefined profiles ──────────────────────────────────────────

impl SparcCfg {
    /// Gaisler LEON3: V8 with LEON extensions.
    pub const SPARC32_LEON3: Self = Self {
        name: "LEON3",
        arch: SparcArch::V8,
        user_only: false,
        nwindows: 8,
        maxtl: 0,
        features: CpuFeatures::from_bits_truncate(
            CpuFeatures::FLOAT.0
                | CpuFeatures::FSQRT.0
                | CpuFeatures::FSMULD.0
                | CpuFeatures::ASR17.0
                | CpuFeatures::POWERDOWN.0
                | CpuFeatures::CACHE_CTRL.0
                | CpuFeatures::TA0_SHUTDOWN.0,
        ),
        iu_version: 0xf300_0000,
        fpu_version: 4 << 17,
        mmu_version: 0xf300_0000,
        fp_trap_policy: FpTrapPolicy::Architectural,
    };

    /// Sun UltraSPARC IIi (sun4u).
    pub const SPARC64_SUN4U: Self = Self {
        name: "Sun UltraSparc IIi",
        arch: SparcArch::V9,
        user_only: false,
        nwindows: 8,
        maxtl: 5,
        features: CpuFeatures::from_bits_truncate(
            CpuFeatures::FLOAT.0
                | CpuFeatures::FLOAT128.0
                | CpuFeatures::FSQRT.0
                | CpuFeatures::FSMULD.0
                | CpuFeatures::VIS1.0
                | CpuFeatures::VIS2.0,
        ),
        iu_version: v9_version(0x17, 0x12, 0x91, 5),
        fpu_version: 0,
        mmu_version: 0,
        fp_trap_policy: FpTrapPolicy::Architectural,
    };

    /// Sun UltraSPARC T1 (sun4v).
    pub const SPARC64_SUN4V: Self = Self {
        name: "Sun UltraSparc T1",
        arch: SparcArch::V9,
        user_only: false,
        nwindows: 8,
        maxtl: 6,
        features: CpuFeatures::from_bits_truncate(
            CpuFeatures::FLOAT.0
                | CpuFeatures::FLOAT128.0
                | CpuFeatures::FSQRT.0
                | CpuFeatures::FSMULD.0
                | CpuFeatures::VIS1.0
                | CpuFeatures::VIS2.0
                | CpuFeatures::HYPV.0
                | CpuFeatures::GL.0,
        ),
        iu_version: v9_version(0x3e, 0x23, 0x02, 6),
        fpu_version: 0,
        mmu_version: 0,
        fp_trap_policy: FpTrapPolicy::Architectural,
    };

    /// The same CPU model run under user-mode emulation.
    pub const fn user_mode(self) -> Self {
        Self {
            user_only: true,
            ..self
        }
    }

    pub const fn with_nwindows(self, nwindows: u32) -> Self {
        Self { nwindows, ..self }
    }

    pub const fn with_fp_trap_policy(self, policy: FpTrapPolicy) -> Self {
        Self {
            fp_trap_policy: policy,
            ..self
        }
    }

    #[inline]
    pub const fn is_v9(&self) -> bool {
        matches!(self.arch, SparcArch::V9)
    }

    #[inline]
    pub const fn has(&self, feature: CpuFeatures) -> bool {
        self.features.contains(feature)
    }

    #[inline]
    pub const fn has_hypervisor(&self) -> bool {
        self.has(CpuFeatures::HYPV)
    }

    /// Reject configurations no implementation could run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_NWINDOWS..=MAX_NWINDOWS).contains(&self.nwindows) {
            return Err(ConfigError::InvalidWindowCount(self.nwindows));
        }
        match self.arch {
            SparcArch::V8 => {
                if self.maxtl != 0 {
                    return Err(ConfigError::InvalidMaxTl(self.maxtl));
                }
                if self.features.intersects(CpuFeatures::V9_ONLY) {
                    return Err(ConfigError::FeatureMismatch {
                        arch: self.arch,
                        features: self.features.bits()
                            & CpuFeatures::V9_ONLY.bits(),
                    });
                }
            }
            SparcArch::V9 => {
                if self.maxtl == 0 || self.maxtl > MAXTL_MAX {
                    return Err(ConfigError::InvalidMaxTl(self.maxtl));
                }
                if self.features.intersects(CpuFeatures::V8_ONLY) {
                    return Err(ConfigError::FeatureMismatch {
                        arch: self.arch,
                        features: self.features.bits()
                            & CpuFeatures::V8_ONLY.bits(),
                    });
                }
                let sun4v = CpuFeatures::GL.union(CpuFeatures::HYPV);
                if self.has(CpuFeatures::GL) != self.has(CpuFeatures::HYPV) {
                    return Err(ConfigError::FeatureMismatch {
                        arch: self.arch,
                        features: self.features.bits() & sun4v.bits(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for SparcCfg {
    fn default() -> Self {
        Self::SPARC64_SUN4U
    }
}
