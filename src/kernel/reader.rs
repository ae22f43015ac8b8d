//! Snapshot reader: raw host data in, normalized [`AclSnapshot`] out.

use crate::access::{IdentityAdapter, IdentityResolver};
use crate::error::{ReconcileError, Result};
use crate::flags::{InheritanceFlags, PropagationFlags};
use crate::kernel::runtime::ObjectAccess;
use crate::primitives::{Ace, AclSnapshot, RawAce};
use crate::rights;
use crate::target::Target;
use crate::types::AceType;

/// Reads one target's access control at most once.
///
/// A reader belongs to a single reconciliation cycle; the first successful `read` is
/// cached and every later call returns it without touching the host again.
pub struct SnapshotReader<'a, A, R> {
    target: &'a Target,
    access: &'a A,
    identities: &'a IdentityAdapter<R>,
    cached: Option<AclSnapshot>,
}

impl<'a, A: ObjectAccess, R: IdentityResolver> SnapshotReader<'a, A, R> {
    pub fn new(target: &'a Target, access: &'a A, identities: &'a IdentityAdapter<R>) -> Self {
        SnapshotReader { target, access, identities, cached: None }
    }

    pub fn read(&mut self) -> Result<&AclSnapshot> {
        let snapshot = match self.cached.take() {
            Some(snapshot) => snapshot,
            None => self.fetch()?,
        };
        Ok(self.cached.insert(snapshot))
    }

    /// Consumes the reader, handing out the cached snapshot (reading it if needed).
    pub fn into_snapshot(mut self) -> Result<AclSnapshot> {
        match self.cached.take() {
            Some(snapshot) => Ok(snapshot),
            None => self.fetch(),
        }
    }

    fn fetch(&self) -> Result<AclSnapshot> {
        let target = self.target;
        if !self.access.exists(target)? {
            return Err(ReconcileError::TargetNotFound(target.raw.clone()));
        }

        let raw_owner = self.access.owner(target)?;
        let owner = self.identities.resolve_sid(&raw_owner)?;
        tracing::debug!(key = %target, owner = %owner.name, "current owner");

        let raw_aces = self.access.aces(target)?;
        tracing::debug!(key = %target, count = raw_aces.len(), "current ACE list");

        let mut snapshot = AclSnapshot {
            owner,
            inherit_from_parent: false,
            ordinary: Vec::new(),
            capability: Vec::new(),
            warnings: Vec::new(),
        };

        for (index, raw) in raw_aces.iter().enumerate() {
            // A single inherited entry is enough to know the object is inheriting, even one
            // that fails to decode below.
            snapshot.inherit_from_parent |= raw.inherited;

            match self.decode_ace(raw) {
                Ok(ace) if ace.identity.is_capability() => snapshot.capability.push(ace),
                Ok(ace) => snapshot.ordinary.push(ace),
                Err(reason) => {
                    let skipped = ReconcileError::AceDecodeSkipped {
                        target: target.raw.clone(),
                        index,
                        reason: Box::new(reason),
                    };
                    tracing::warn!(key = %target, raw = ?raw, "{}", skipped);
                    snapshot.warnings.push(skipped);
                }
            }
        }

        Ok(snapshot)
    }

    fn decode_ace(&self, raw: &RawAce) -> Result<Ace> {
        let rights = rights::normalise(rights::from_raw(raw.rights)?)?;
        let ace_type = AceType::try_from(raw.ace_type)?;
        let identity = self.identities.resolve_sid(&raw.identity.value)?;
        Ok(Ace {
            identity,
            rights,
            ace_type,
            inherited: raw.inherited,
            inheritance: InheritanceFlags::decode(raw.inheritance)?,
            propagation: PropagationFlags::decode(raw.propagation)?,
        })
    }
}
