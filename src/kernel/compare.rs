//! Compliance checks.

use crate::primitives::{Ace, AclSnapshot, DesiredState};
use crate::types::PurgeMode;
use std::collections::BTreeSet;

/// Whether the ordinary ACEs satisfy the desired set under `mode`.
///
/// Both sides are collected into ordered sets (identity first), so declaration order and
/// structural duplicates make no difference.
/// - `All`: the sets are equal.
/// - `Listed`: nothing desired is present.
/// - `Off`: everything desired is present.
pub fn is_compliant(current: &[Ace], desired: &[Ace], mode: PurgeMode) -> bool {
    let current: BTreeSet<&Ace> = current.iter().collect();
    let desired: BTreeSet<&Ace> = desired.iter().collect();
    let common: BTreeSet<&Ace> = current.intersection(&desired).copied().collect();

    tracing::trace!(mode = %mode, current = current.len(), desired = desired.len(), common = common.len(), "permissions in sync?");

    match mode {
        PurgeMode::All => current == desired,
        PurgeMode::Listed => common.is_empty(),
        PurgeMode::Off => common == desired,
    }
}

/// Per-property compliance of a snapshot against the desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Verdict {
    pub owner_in_sync: bool,
    pub inheritance_in_sync: bool,
    pub permissions_in_sync: bool,
}

impl Verdict {
    pub fn is_compliant(&self) -> bool {
        self.owner_in_sync && self.inheritance_in_sync && self.permissions_in_sync
    }
}

/// Desired ACEs the engine may compare: capability identities are never managed.
pub fn manageable(desired: &[Ace]) -> Vec<Ace> {
    desired
        .iter()
        .filter(|ace| {
            if ace.identity.is_capability() {
                tracing::warn!(identity = %ace.identity.sid, "capability identities cannot be managed; ignoring declared ACE");
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

pub fn assess(snapshot: &AclSnapshot, desired: &DesiredState) -> Verdict {
    let owner_in_sync = desired.owner.as_ref().map_or(true, |owner| *owner == snapshot.owner);
    let inheritance_in_sync = desired
        .inherit_from_parent
        .map_or(true, |inherit| inherit == snapshot.inherit_from_parent);
    let permissions_in_sync = is_compliant(&snapshot.ordinary, &manageable(&desired.aces), desired.purge);

    let verdict = Verdict { owner_in_sync, inheritance_in_sync, permissions_in_sync };
    tracing::debug!(?verdict, "assessed snapshot");
    verdict
}
