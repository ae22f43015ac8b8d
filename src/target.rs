//!
//! Target addressing: `<root>:<path>` or `<root>\<path>`.
//!
//! Parsing validates the root before any collaborator is touched and reports the setup
//! the executor needs in order to address that root, instead of accumulating it anywhere.

use crate::error::{ReconcileError, Result};
use std::fmt;

/// Registry hives the engine can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RootKind {
    LocalMachine,
    ClassesRoot,
    Users,
}

impl RootKind {
    pub fn canonical_name(self) -> &'static str {
        match self {
            RootKind::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKind::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKind::Users => "HKEY_USERS",
        }
    }

    /// Drive aliases the host shell needs mounted before paths under this root resolve.
    /// HKLM is natively addressable.
    pub fn setup(self) -> Vec<SetupRequirement> {
        let drives: &[&str] = match self {
            RootKind::LocalMachine => &[],
            RootKind::ClassesRoot => &["HKCR", "HKEY_CLASSES_ROOT"],
            RootKind::Users => &["HKU", "HKEY_USERS"],
        };
        drives
            .iter()
            .map(|drive| SetupRequirement::MountDrive { name: (*drive).to_string(), root: self })
            .collect()
    }
}

const UNSUPPORTED_ROOTS: &[&str] = &[
    "hkcu",
    "hkey_current_user",
    "hkcc",
    "hkey_current_config",
    "hkey_performance_data",
    "hkey_performance_text",
    "hkey_performance_nlstext",
    "hkey_dyn_data",
];

/// A step the executor performs before the plan's operations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum SetupRequirement {
    MountDrive { name: String, root: RootKind },
}

/// A validated target.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Target {
    /// The string as declared; executors address the object with it.
    pub raw: String,
    pub root: RootKind,
    /// Path components below the root.
    pub path: Vec<String>,
}

impl Target {
    pub fn parse(value: &str) -> Result<Self> {
        let mut parts = value.split([':', ',', '\\']);
        let root_token = parts.next().unwrap_or_default().trim();
        let lowered = root_token.to_ascii_lowercase();

        let root = match lowered.as_str() {
            "hklm" | "hkey_local_machine" => RootKind::LocalMachine,
            "hkcr" | "hkey_classes_root" => RootKind::ClassesRoot,
            "hku" | "hkey_users" => RootKind::Users,
            other if UNSUPPORTED_ROOTS.contains(&other) => {
                return Err(ReconcileError::UnsupportedRoot(value.to_string()))
            }
            _ => return Err(ReconcileError::InvalidTarget(value.to_string())),
        };

        let path = parts.filter(|p| !p.is_empty()).map(str::to_string).collect();
        let target = Target { raw: value.to_string(), root, path };
        tracing::debug!(key = %target, "parsed target");
        Ok(target)
    }

    pub fn setup(&self) -> Vec<SetupRequirement> {
        self.root.setup()
    }

    /// Path relative to the root, backslash-joined.
    pub fn subkey(&self) -> String {
        self.path.join("\\")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(self.root.canonical_name())
        } else {
            write!(f, "{}\\{}", self.root.canonical_name(), self.subkey())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_roots() {
        let t = Target::parse("hklm:software\\vendor").unwrap();
        assert_eq!(t.root, RootKind::LocalMachine);
        assert_eq!(t.path, vec!["software", "vendor"]);
        assert_eq!(t.to_string(), "HKEY_LOCAL_MACHINE\\software\\vendor");
        assert!(t.setup().is_empty());

        let t = Target::parse("HKEY_USERS\\.DEFAULT").unwrap();
        assert_eq!(t.root, RootKind::Users);
        assert_eq!(t.subkey(), ".DEFAULT");

        let t = Target::parse("HKCR:\\.txt").unwrap();
        assert_eq!(t.root, RootKind::ClassesRoot);
        assert_eq!(t.path, vec![".txt"]);
    }

    #[test]
    fn test_setup_requirements_follow_root() {
        let t = Target::parse("hkcr:.txt").unwrap();
        assert_eq!(
            t.setup(),
            vec![
                SetupRequirement::MountDrive { name: "HKCR".into(), root: RootKind::ClassesRoot },
                SetupRequirement::MountDrive { name: "HKEY_CLASSES_ROOT".into(), root: RootKind::ClassesRoot },
            ]
        );
        assert_eq!(Target::parse("hku:.DEFAULT").unwrap().setup().len(), 2);
    }

    #[test]
    fn test_unsupported_and_invalid_roots() {
        assert_eq!(
            Target::parse("hkcu:software"),
            Err(ReconcileError::UnsupportedRoot("hkcu:software".into()))
        );
        assert!(matches!(
            Target::parse("HKEY_PERFORMANCE_DATA\\x"),
            Err(ReconcileError::UnsupportedRoot(_))
        ));
        assert_eq!(Target::parse("hkxx:software"), Err(ReconcileError::InvalidTarget("hkxx:software".into())));
        assert!(matches!(Target::parse(""), Err(ReconcileError::InvalidTarget(_))));
        assert!(matches!(Target::parse(":software"), Err(ReconcileError::InvalidTarget(_))));
    }
}
