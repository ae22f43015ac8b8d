// Shared enums and aliases used across the codec, snapshot and plan modules.

use crate::error::{ReconcileError, Result};
use std::fmt;
use std::str::FromStr;

/// RightsMask, the 32-bit access mask carried by every ACE.
/// - Bits 0-5: specific registry rights (QueryValues .. CreateLink).
/// - Bits 16-19: standard rights (Delete, ReadPermissions, ChangePermissions, TakeOwnership).
/// - Bits 28-31: generic rights. GENERIC_READ is the sign bit, so hosts that report masks
///   as signed integers hand it over as `-2147483648`.
pub type RightsMask = u32;

/// Whether an ACE grants or denies its rights.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum AceType {
    Allow = 0,
    Deny = 1,
}

impl AceType {
    pub fn label(self) -> &'static str {
        match self {
            AceType::Allow => "Allow",
            AceType::Deny => "Deny",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim() {
            "Allow" => Ok(AceType::Allow),
            "Deny" => Ok(AceType::Deny),
            other => Err(ReconcileError::InvalidFlag {
                kind: "AccessControlType",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<i64> for AceType {
    type Error = ReconcileError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(AceType::Allow),
            1 => Ok(AceType::Deny),
            _ => Err(ReconcileError::InvalidFlag {
                kind: "AccessControlType",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for AceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the declared ACE list relates to the object's full ordinary ACL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PurgeMode {
    /// Declared entries must be present; anything else is left alone.
    #[default]
    Off,
    /// Declared entries must be absent.
    Listed,
    /// Declared entries are the entire ordinary ACL.
    All,
}

impl FromStr for PurgeMode {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "false" => Ok(PurgeMode::Off),
            "listed" => Ok(PurgeMode::Listed),
            "all" => Ok(PurgeMode::All),
            other => Err(ReconcileError::Config(format!("Invalid purge mode: {}", other))),
        }
    }
}

impl TryFrom<String> for PurgeMode {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PurgeMode> for String {
    fn from(mode: PurgeMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for PurgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PurgeMode::Off => "off",
            PurgeMode::Listed => "listed",
            PurgeMode::All => "all",
        })
    }
}
