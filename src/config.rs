//! Build-mode, revision and host parameter handling.

use std::fmt;
use std::str::FromStr;

use crate::{SafetyError, SafetyResult};

/// Host parameter bit enabling openpilot longitudinal control
pub const FLAG_VOLKSWAGEN_LONG_CONTROL: u16 = 1;
/// Host parameter bit marking second-generation MEB platforms (2024 layout)
pub const FLAG_VOLKSWAGEN_ALT_CRC_VARIANT_1: u16 = 2;

/// Whether the firmware may honour capability escalation from the host.
///
/// Production builds never read the longitudinal bit; the parameter is
/// untrusted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Production,
    DebugCapable,
}

impl BuildMode {
    pub fn allows_debug(self) -> bool {
        matches!(self, BuildMode::DebugCapable)
    }
}

impl FromStr for BuildMode {
    type Err = SafetyError;

    fn from_str(s: &str) -> SafetyResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "release" => Ok(BuildMode::Production),
            "debug" | "debug-capable" => Ok(BuildMode::DebugCapable),
            other => Err(SafetyError::InvalidConfiguration(format!(
                "Unknown build mode '{}'",
                other
            ))),
        }
    }
}

/// MEB byte-layout generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Revision {
    #[default]
    Legacy,
    Rev2024,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Legacy => write!(f, "legacy"),
            Revision::Rev2024 => write!(f, "2024"),
        }
    }
}

impl FromStr for Revision {
    type Err = SafetyError;

    fn from_str(s: &str) -> SafetyResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "meb" => Ok(Revision::Legacy),
            "2024" | "meb_2024" | "meb-2024" => Ok(Revision::Rev2024),
            other => Err(SafetyError::InvalidConfiguration(format!(
                "Unknown MEB revision '{}'",
                other
            ))),
        }
    }
}

/// Opaque parameter word handed over by the host at init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyParam(pub u16);

impl SafetyParam {
    fn flag(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn long_control(self) -> bool {
        self.flag(FLAG_VOLKSWAGEN_LONG_CONTROL)
    }

    pub fn alt_crc_variant(self) -> bool {
        self.flag(FLAG_VOLKSWAGEN_ALT_CRC_VARIANT_1)
    }

    /// Longitudinal capability as granted under `build_mode`
    pub fn longitudinal_allowed(self, build_mode: BuildMode) -> bool {
        build_mode.allows_debug() && self.long_control()
    }
}

/// Which variant to install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MebConfig {
    pub revision: Revision,
    pub build_mode: BuildMode,
}

impl MebConfig {
    /// Revision from the host parameter. The layout bit does not grant any
    /// capability, so it is honoured in every build mode.
    pub fn from_param(param: u16, build_mode: BuildMode) -> Self {
        let revision = if SafetyParam(param).alt_crc_variant() {
            Revision::Rev2024
        } else {
            Revision::Legacy
        };
        Self {
            revision,
            build_mode,
        }
    }
}
