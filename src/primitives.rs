use crate::access::Identity;
use crate::flags::{InheritanceFlags, PropagationFlags};
use crate::rights;
use crate::types::{AceType, PurgeMode, RightsMask};
use crate::error::{ReconcileError, Result};

// --- Access control entries --------------------------------------------------

/// One normalized access rule.
///
/// Field order matters: the derived `Ord` sorts by identity first, which is what
/// the comparator relies on for deterministic set semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Ace {
    pub identity: Identity,
    /// Normalized mask: only bits the permission codec can name.
    pub rights: RightsMask,
    pub ace_type: AceType,
    pub inherited: bool,
    pub inheritance: InheritanceFlags,
    pub propagation: PropagationFlags,
}

impl Ace {
    /// An explicit (non-inherited) rule with no inheritance flags.
    pub fn explicit(identity: Identity, rights: RightsMask, ace_type: AceType) -> Self {
        Ace {
            identity,
            rights,
            ace_type,
            inherited: false,
            inheritance: InheritanceFlags::None,
            propagation: PropagationFlags::None,
        }
    }

    pub fn with_flags(mut self, inheritance: InheritanceFlags, propagation: PropagationFlags) -> Self {
        self.inheritance = inheritance;
        self.propagation = propagation;
        self
    }

    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    /// Human-readable rendering with symbolic labels, for logs and diagnostics.
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} (inherited: {}, inheritance: {}, propagation: {})",
            self.ace_type,
            self.identity,
            rights::decode(self.rights),
            self.inherited,
            self.inheritance,
            self.propagation
        )
    }
}

// --- Raw host data -----------------------------------------------------------

/// `IdentityReference` as the host dumps it: `{"Value": "BUILTIN\\Users"}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawIdentity {
    #[serde(rename = "Value")]
    pub value: String,
}

/// An ACE exactly as the object-access collaborator reports it, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawAce {
    #[serde(rename = "IdentityReference")]
    pub identity: RawIdentity,
    #[serde(rename = "RegistryRights")]
    pub rights: i64,
    #[serde(rename = "AccessControlType")]
    pub ace_type: i64,
    #[serde(rename = "IsInherited")]
    pub inherited: bool,
    #[serde(rename = "InheritanceFlags")]
    pub inheritance: i64,
    #[serde(rename = "PropagationFlags")]
    pub propagation: i64,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RawAce>),
    One(RawAce),
}

impl RawAce {
    /// Parses the host's JSON dump of an access list. A key with exactly one ACE is
    /// dumped as a bare object rather than a one-element array; an empty dump is no ACEs.
    pub fn parse_list(json: &str) -> Result<Vec<RawAce>> {
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        let parsed: OneOrMany =
            serde_json::from_str(json).map_err(|e| ReconcileError::Config(format!("Malformed ACE list: {}", e)))?;
        Ok(match parsed {
            OneOrMany::Many(list) => list,
            OneOrMany::One(ace) => vec![ace],
        })
    }
}

// --- Snapshot & desired state ------------------------------------------------

/// The normalized view of one object's access control, read once per cycle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AclSnapshot {
    pub owner: Identity,
    /// True if any ACE on the object was inherited from its parent.
    pub inherit_from_parent: bool,
    /// Entries the engine compares and may mutate.
    pub ordinary: Vec<Ace>,
    /// Entries for capability identities. Carried along, never compared or mutated.
    pub capability: Vec<Ace>,
    /// Raw entries dropped during decoding, each as an `AceDecodeSkipped` error.
    #[serde(skip)]
    pub warnings: Vec<ReconcileError>,
}

/// What the declaration asks for, with identities resolved and labels encoded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DesiredState {
    /// `None` leaves the owner unmanaged.
    pub owner: Option<Identity>,
    /// `None` leaves inheritance protection unmanaged.
    pub inherit_from_parent: Option<bool>,
    /// Declared order; comparison ignores it.
    pub aces: Vec<Ace>,
    pub purge: PurgeMode,
}
