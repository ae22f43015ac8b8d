//! Mutation plan synthesis.
//!
//! Turns a snapshot, a desired state and a [`Verdict`] into the ordered operations that
//! converge the object. Nothing here performs I/O; the executor gets the finished plan.

use crate::access::Identity;
use crate::kernel::compare::{manageable, Verdict};
use crate::primitives::{Ace, AclSnapshot, DesiredState};
use crate::target::{SetupRequirement, Target};
use crate::types::PurgeMode;
use std::collections::BTreeSet;
use std::fmt;

/// One step of a plan. Every operation must be safe to apply when it is already a no-op.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum MutationOp {
    SetOwner(Identity),
    /// Remove every non-inherited ordinary ACE. Capability ACEs stay.
    ///
    /// Package-authority entries cannot be removed by their raw identity string, so they
    /// are listed here rebuilt as plain rules keyed by the unqualified account name.
    RemoveAllOrdinaryAces { reconstructed: Vec<Ace> },
    /// Clear every non-inherited ACE for an identity before re-adding its rules.
    RemoveNonInheritedAces(Identity),
    AddAccessRule(Ace),
    RemoveAccessRule(Ace),
    /// `block_inheritance = true` stops entries flowing from the parent while keeping
    /// explicit entries; `false` lets them flow again.
    SetInheritanceProtection { block_inheritance: bool },
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationOp::SetOwner(owner) => write!(f, "SetOwner({})", owner),
            MutationOp::RemoveAllOrdinaryAces { reconstructed } => {
                write!(f, "RemoveAllOrdinaryAces({} reconstructed)", reconstructed.len())
            }
            MutationOp::RemoveNonInheritedAces(identity) => write!(f, "RemoveNonInheritedAces({})", identity),
            MutationOp::AddAccessRule(ace) => write!(f, "AddAccessRule({})", ace.describe()),
            MutationOp::RemoveAccessRule(ace) => write!(f, "RemoveAccessRule({})", ace.describe()),
            MutationOp::SetInheritanceProtection { block_inheritance } => {
                write!(f, "SetInheritanceProtection({})", block_inheritance)
            }
        }
    }
}

/// Everything the executor needs for one cycle, handed over in a single call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MutationPlan {
    pub target: Target,
    /// Performed before any operation (e.g. mounting a drive for HKCR).
    pub setup: Vec<SetupRequirement>,
    pub operations: Vec<MutationOp>,
}

impl MutationPlan {
    pub fn empty(target: &Target) -> Self {
        MutationPlan { target: target.clone(), setup: target.setup(), operations: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

/// Builds the plan. Sections are emitted in a fixed order: owner, permissions,
/// inheritance protection. A section is skipped when the verdict says it is in sync.
pub fn synthesize(target: &Target, current: &AclSnapshot, desired: &DesiredState, verdict: &Verdict) -> MutationPlan {
    let mut plan = MutationPlan::empty(target);
    let ops = &mut plan.operations;

    if let Some(owner) = desired.owner.as_ref().filter(|_| !verdict.owner_in_sync) {
        ops.push(MutationOp::SetOwner(owner.clone()));
    }

    if !verdict.permissions_in_sync {
        let wanted = manageable(&desired.aces);
        match desired.purge {
            PurgeMode::All => purge_all(current, &wanted, ops),
            PurgeMode::Off => ensure_present(current, &wanted, ops),
            PurgeMode::Listed => ensure_absent(current, &wanted, ops),
        }
    }

    if let Some(inherit) = desired.inherit_from_parent.filter(|_| !verdict.inheritance_in_sync) {
        ops.push(MutationOp::SetInheritanceProtection { block_inheritance: !inherit });
    }

    tracing::debug!(key = %target, operations = plan.operations.len(), "synthesized plan");
    plan
}

/// Inherited entries belong to the parent; the engine never adds or removes them.
fn mutable(ace: &Ace) -> bool {
    if ace.inherited {
        tracing::warn!(ace = %ace.describe(), "inherited ACE cannot be changed on this object; skipping");
    }
    !ace.inherited
}

fn push_add(ace: &Ace, added: &mut BTreeSet<Ace>, ops: &mut Vec<MutationOp>) {
    if mutable(ace) && added.insert(ace.clone()) {
        ops.push(MutationOp::AddAccessRule(ace.clone()));
    }
}

fn purge_all(current: &AclSnapshot, wanted: &[Ace], ops: &mut Vec<MutationOp>) {
    let reconstructed = current
        .ordinary
        .iter()
        .filter(|ace| !ace.inherited && ace.identity.is_package_authority())
        .cloned()
        .collect();
    ops.push(MutationOp::RemoveAllOrdinaryAces { reconstructed });

    let mut added = BTreeSet::new();
    for ace in wanted {
        push_add(ace, &mut added, ops);
    }
}

fn ensure_present(current: &AclSnapshot, wanted: &[Ace], ops: &mut Vec<MutationOp>) {
    let present: BTreeSet<&Ace> = current.ordinary.iter().collect();
    let mut handled: BTreeSet<&Identity> = BTreeSet::new();
    let mut added = BTreeSet::new();

    for ace in wanted {
        // An inherited entry can never be added here, so it must not clear anything either.
        if present.contains(ace) || !mutable(ace) || !handled.insert(&ace.identity) {
            continue;
        }

        let has_explicit = current
            .ordinary
            .iter()
            .any(|c| !c.inherited && c.identity == ace.identity);

        let siblings = wanted.iter().filter(|d| d.identity == ace.identity);
        if has_explicit {
            // Clearing conflicting rules takes the identity's already-correct rules with
            // them, so every desired rule for it is added back.
            ops.push(MutationOp::RemoveNonInheritedAces(ace.identity.clone()));
            for sibling in siblings.filter(|d| !d.inherited) {
                push_add(sibling, &mut added, ops);
            }
        } else {
            for sibling in siblings.filter(|d| !present.contains(d)) {
                push_add(sibling, &mut added, ops);
            }
        }
    }
}

fn ensure_absent(current: &AclSnapshot, wanted: &[Ace], ops: &mut Vec<MutationOp>) {
    let present: BTreeSet<&Ace> = current.ordinary.iter().collect();
    let mut removed = BTreeSet::new();
    for ace in wanted {
        if present.contains(ace) && mutable(ace) && removed.insert(ace) {
            ops.push(MutationOp::RemoveAccessRule(ace.clone()));
        }
    }
}
