//! In-memory host used by tests: an object store, an account table and an executor
//! that applies plans to the store, so a second cycle sees the first cycle's changes.

use crate::access::{is_capability_sid, strip_package_authority, Identity, IdentityResolver, PACKAGE_AUTHORITY};
use crate::error::{ReconcileError, Result};
use crate::kernel::plan::{MutationOp, MutationPlan};
use crate::kernel::runtime::{ExecutionFailure, MutationExecutor, ObjectAccess};
use crate::primitives::{Ace, RawAce, RawIdentity};
use crate::target::Target;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Well-known accounts every host starts with, as `(qualified name, SID)`.
pub const WELL_KNOWN: &[(&str, &str)] = &[
    ("BUILTIN\\Administrators", "S-1-5-32-544"),
    ("BUILTIN\\Users", "S-1-5-32-545"),
    ("NT AUTHORITY\\SYSTEM", "S-1-5-18"),
    ("CREATOR OWNER", "S-1-3-0"),
    ("Everyone", "S-1-1-0"),
    ("APPLICATION PACKAGE AUTHORITY\\ALL APPLICATION PACKAGES", "S-1-15-2-1"),
];

/// Installs a `tracing` subscriber that writes through the test harness. Safe to call
/// from every test.
#[cfg(feature = "test-utils")]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One stored object.
#[derive(Debug, Clone)]
pub struct KeyState {
    pub owner: Identity,
    pub aces: Vec<Ace>,
    /// Entries the parent hands down while inheritance is not blocked.
    pub parent_aces: Vec<Ace>,
    /// Extra raw entries appended verbatim to every read, e.g. undecodable ones.
    pub raw_extra: Vec<RawAce>,
}

#[derive(Debug, Default)]
pub struct InMemoryHost {
    accounts: Vec<(String, String)>,
    keys: RefCell<HashMap<String, KeyState>>,
    executed: RefCell<Vec<MutationPlan>>,
    ace_reads: Cell<usize>,
    fail_at: Cell<Option<usize>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        InMemoryHost {
            accounts: WELL_KNOWN.iter().map(|(n, s)| (n.to_string(), s.to_string())).collect(),
            ..Default::default()
        }
    }

    pub fn with_account(mut self, name: &str, sid: &str) -> Self {
        self.accounts.push((name.to_string(), sid.to_string()));
        self
    }

    /// The identity for a known account, as the host names it.
    pub fn identity(&self, name: &str) -> Identity {
        let sid = self.name_to_sid(name).unwrap_or_else(|| panic!("unknown test account {}", name));
        let qualified = self.sid_to_name(&sid).unwrap_or_else(|| name.to_string());
        Identity::new(sid, qualified)
    }

    /// Creates an object. Parent entries are applied as inherited ACEs immediately.
    pub fn insert_key(&self, target: &str, owner: &str, explicit: Vec<Ace>, parent_aces: Vec<Ace>) {
        let mut aces = explicit;
        aces.extend(parent_aces.iter().cloned().map(Ace::inherited));
        let state = KeyState { owner: self.identity(owner), aces, parent_aces, raw_extra: Vec::new() };
        self.keys.borrow_mut().insert(key_of(target), state);
    }

    pub fn push_raw_ace(&self, target: &str, raw: RawAce) {
        if let Some(state) = self.keys.borrow_mut().get_mut(&key_of(target)) {
            state.raw_extra.push(raw);
        }
    }

    pub fn key(&self, target: &str) -> Option<KeyState> {
        self.keys.borrow().get(&key_of(target)).cloned()
    }

    pub fn executed(&self) -> Vec<MutationPlan> {
        self.executed.borrow().clone()
    }

    pub fn ace_reads(&self) -> usize {
        self.ace_reads.get()
    }

    /// Makes the next execution fail at the given operation index without applying anything.
    pub fn fail_next_execution_at(&self, operation: usize) {
        self.fail_at.set(Some(operation));
    }

    fn raw_of(&self, ace: &Ace) -> RawAce {
        let value = if is_capability_sid(&ace.identity.sid) {
            ace.identity.sid.clone()
        } else {
            self.sid_to_name(&ace.identity.sid).unwrap_or_else(|| ace.identity.name.clone())
        };
        RawAce {
            identity: RawIdentity { value },
            // Masks come back the way the host reports them: signed.
            rights: i64::from(ace.rights as i32),
            ace_type: ace.ace_type as i64,
            inherited: ace.inherited,
            inheritance: i64::from(ace.inheritance.bits()),
            propagation: i64::from(ace.propagation.bits()),
        }
    }
}

fn key_of(target: &str) -> String {
    Target::parse(target).map(|t| t.to_string().to_ascii_lowercase()).unwrap_or_else(|_| target.to_string())
}

fn apply(state: &mut KeyState, op: &MutationOp) {
    match op {
        MutationOp::SetOwner(owner) => state.owner = owner.clone(),
        MutationOp::RemoveAllOrdinaryAces { .. } => {
            state.aces.retain(|a| a.inherited || a.identity.is_capability());
        }
        MutationOp::RemoveNonInheritedAces(identity) => {
            state.aces.retain(|a| a.inherited || a.identity != *identity);
        }
        MutationOp::AddAccessRule(ace) => {
            if !state.aces.contains(ace) {
                state.aces.push(ace.clone());
            }
        }
        MutationOp::RemoveAccessRule(ace) => {
            state.aces.retain(|a| a.inherited || a != ace);
        }
        MutationOp::SetInheritanceProtection { block_inheritance: true } => {
            state.aces.retain(|a| !a.inherited);
        }
        MutationOp::SetInheritanceProtection { block_inheritance: false } => {
            for parent in state.parent_aces.iter().cloned().map(Ace::inherited) {
                if !state.aces.contains(&parent) {
                    state.aces.push(parent);
                }
            }
        }
    }
}

impl ObjectAccess for InMemoryHost {
    fn exists(&self, target: &Target) -> Result<bool> {
        Ok(self.keys.borrow().contains_key(&target.to_string().to_ascii_lowercase()))
    }

    fn owner(&self, target: &Target) -> Result<String> {
        let keys = self.keys.borrow();
        let state = keys
            .get(&target.to_string().to_ascii_lowercase())
            .ok_or_else(|| ReconcileError::TargetNotFound(target.raw.clone()))?;
        Ok(self.sid_to_name(&state.owner.sid).unwrap_or_else(|| state.owner.sid.clone()))
    }

    fn aces(&self, target: &Target) -> Result<Vec<RawAce>> {
        self.ace_reads.set(self.ace_reads.get() + 1);
        let keys = self.keys.borrow();
        let state = keys
            .get(&target.to_string().to_ascii_lowercase())
            .ok_or_else(|| ReconcileError::TargetNotFound(target.raw.clone()))?;
        let mut raw: Vec<RawAce> = state.aces.iter().map(|a| self.raw_of(a)).collect();
        raw.extend(state.raw_extra.iter().cloned());
        Ok(raw)
    }
}

impl IdentityResolver for InMemoryHost {
    /// Matches a qualified name or its trailing component. Like the real service,
    /// qualified package-authority names do not resolve.
    fn name_to_sid(&self, name: &str) -> Option<String> {
        if name.contains(PACKAGE_AUTHORITY) {
            return None;
        }
        self.accounts
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name) || strip_domain(n).eq_ignore_ascii_case(name))
            .map(|(_, sid)| sid.clone())
    }

    fn sid_to_name(&self, sid: &str) -> Option<String> {
        self.accounts.iter().find(|(_, s)| s == sid).map(|(n, _)| n.clone())
    }
}

fn strip_domain(name: &str) -> &str {
    let name = strip_package_authority(name);
    name.rsplit('\\').next().unwrap_or(name)
}

impl MutationExecutor for InMemoryHost {
    fn execute(&self, plan: &MutationPlan) -> std::result::Result<(), ExecutionFailure> {
        self.executed.borrow_mut().push(plan.clone());

        let key = plan.target.to_string().to_ascii_lowercase();
        let mut keys = self.keys.borrow_mut();
        let current = keys.get(&key).cloned().ok_or_else(|| ExecutionFailure {
            operation: 0,
            message: format!("{} does not exist", plan.target),
        })?;

        // Work on a copy and commit only if every operation succeeds.
        let mut staged = current;
        for (index, op) in plan.operations.iter().enumerate() {
            if self.fail_at.get() == Some(index) {
                self.fail_at.set(None);
                return Err(ExecutionFailure { operation: index, message: format!("injected failure at {}", op) });
            }
            apply(&mut staged, op);
        }
        keys.insert(key, staged);
        Ok(())
    }
}
