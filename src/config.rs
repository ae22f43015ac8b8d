//!
//! Declared configuration: what a caller asks the engine to converge a target to.
//!
//! Permission entries keep the host's field names so a declaration can be pasted
//! straight from an access-list dump.

use crate::access::{IdentityAdapter, IdentityResolver};
use crate::error::{ReconcileError, Result};
use crate::flags::{InheritanceFlags, PropagationFlags};
use crate::primitives::{Ace, DesiredState};
use crate::rights;
use crate::types::{AceType, PurgeMode};
use std::path::Path;

fn default_ace_type() -> String {
    AceType::Allow.label().to_string()
}

fn default_flag() -> String {
    "None".to_string()
}

/// One ACE as declared, with symbolic labels and an account name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeclaredAce {
    #[serde(rename = "IdentityReference")]
    pub identity: String,
    #[serde(rename = "RegistryRights")]
    pub rights: String,
    #[serde(rename = "AccessControlType", default = "default_ace_type")]
    pub ace_type: String,
    #[serde(rename = "IsInherited", default)]
    pub inherited: bool,
    #[serde(rename = "InheritanceFlags", default = "default_flag")]
    pub inheritance: String,
    #[serde(rename = "PropagationFlags", default = "default_flag")]
    pub propagation: String,
}

impl DeclaredAce {
    /// Resolves the identity and encodes every label. Any failure is fatal to the cycle.
    pub fn resolve<R: IdentityResolver>(&self, identities: &IdentityAdapter<R>) -> Result<Ace> {
        Ok(Ace {
            identity: identities.resolve_sid(&self.identity)?,
            rights: rights::encode(&self.rights)?,
            ace_type: AceType::from_label(&self.ace_type)?,
            inherited: self.inherited,
            inheritance: InheritanceFlags::encode(&self.inheritance)?,
            propagation: PropagationFlags::encode(&self.propagation)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeclaredConfig {
    pub target: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub inherit_from_parent: Option<bool>,
    #[serde(default)]
    pub permissions: Vec<DeclaredAce>,
    #[serde(default)]
    pub purge: PurgeMode,
}

impl DeclaredConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ReconcileError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReconcileError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Builds the desired state, resolving the owner and every declared ACE.
    pub fn desired_state<R: IdentityResolver>(&self, identities: &IdentityAdapter<R>) -> Result<DesiredState> {
        let owner = self.owner.as_deref().map(|o| identities.resolve_sid(o)).transpose()?;
        let aces = self
            .permissions
            .iter()
            .map(|p| p.resolve(identities))
            .collect::<Result<Vec<_>>>()?;
        Ok(DesiredState {
            owner,
            inherit_from_parent: self.inherit_from_parent,
            aces,
            purge: self.purge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DECLARATION: &str = r#"{
        "target": "hklm:software",
        "inherit_from_parent": false,
        "owner": "Administrators",
        "permissions": [
            {
                "IdentityReference": "CREATOR OWNER",
                "RegistryRights": "FullControl",
                "AccessControlType": "Allow",
                "IsInherited": false,
                "InheritanceFlags": "ContainerInherit",
                "PropagationFlags": "InheritOnly"
            },
            { "IdentityReference": "Users", "RegistryRights": "ReadKey" }
        ]
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = DeclaredConfig::from_json_str(DECLARATION).unwrap();
        assert_eq!(config.target, "hklm:software");
        assert_eq!(config.owner.as_deref(), Some("Administrators"));
        assert_eq!(config.inherit_from_parent, Some(false));
        assert_eq!(config.purge, PurgeMode::Off);
        assert_eq!(config.permissions.len(), 2);
        assert_eq!(config.permissions[1].ace_type, "Allow");
        assert_eq!(config.permissions[1].inheritance, "None");
        assert!(!config.permissions[1].inherited);
    }

    #[test]
    fn test_purge_is_case_insensitive() {
        let config = DeclaredConfig::from_json_str(r#"{"target":"hku:.DEFAULT","purge":"Listed"}"#).unwrap();
        assert_eq!(config.purge, PurgeMode::Listed);
        assert!(config.owner.is_none());
        assert!(DeclaredConfig::from_json_str(r#"{"target":"x","purge":"maybe"}"#).is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DECLARATION.as_bytes()).unwrap();
        let config = DeclaredConfig::from_path(file.path()).unwrap();
        assert_eq!(config.permissions[0].identity, "CREATOR OWNER");

        let missing = DeclaredConfig::from_path("/definitely/not/here.json");
        assert!(matches!(missing, Err(ReconcileError::Config(_))));
    }
}
