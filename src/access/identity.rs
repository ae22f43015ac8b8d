use crate::error::{ReconcileError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Capability SIDs are intentionally not resolvable to an account name.
pub const CAPABILITY_SID_PREFIX: &str = "S-1-15-3-";

/// SIDs issued by the package authority (e.g. ALL APPLICATION PACKAGES is `S-1-15-2-1`).
pub const PACKAGE_AUTHORITY_SID_PREFIX: &str = "S-1-15-2-";

/// Names in this namespace do not resolve in their qualified form; only the part after
/// the backslash does.
pub const PACKAGE_AUTHORITY: &str = "APPLICATION PACKAGE AUTHORITY";

/// A security principal: a stable SID plus the account name it was resolved from.
///
/// Equality, ordering and hashing only look at the SID.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    pub sid: String,
    pub name: String,
}

impl Identity {
    pub fn new(sid: impl Into<String>, name: impl Into<String>) -> Self {
        Identity { sid: sid.into(), name: name.into() }
    }

    /// A capability identity, which is its own name.
    pub fn capability(sid: impl Into<String>) -> Self {
        let sid = sid.into();
        Identity { name: sid.clone(), sid }
    }

    pub fn is_capability(&self) -> bool {
        is_capability_sid(&self.sid)
    }

    pub fn is_package_authority(&self) -> bool {
        self.sid.starts_with(PACKAGE_AUTHORITY_SID_PREFIX) || self.name.contains(PACKAGE_AUTHORITY)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.sid == other.sid
    }
}

impl Eq for Identity {}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sid.cmp(&other.sid)
    }
}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sid.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub fn is_capability_sid(value: &str) -> bool {
    value.starts_with(CAPABILITY_SID_PREFIX)
}

/// `APPLICATION PACKAGE AUTHORITY\ALL APPLICATION PACKAGES` -> `ALL APPLICATION PACKAGES`.
/// Names outside that namespace are returned unchanged.
pub fn strip_package_authority(name: &str) -> &str {
    if !name.contains(PACKAGE_AUTHORITY) {
        return name;
    }
    name.split('\\').nth(1).unwrap_or(name)
}

/// The external name/SID lookup service.
pub trait IdentityResolver {
    fn name_to_sid(&self, name: &str) -> Option<String>;
    fn sid_to_name(&self, sid: &str) -> Option<String>;
}

impl<T: IdentityResolver + ?Sized> IdentityResolver for &T {
    fn name_to_sid(&self, name: &str) -> Option<String> {
        (**self).name_to_sid(name)
    }

    fn sid_to_name(&self, sid: &str) -> Option<String> {
        (**self).sid_to_name(sid)
    }
}

/// Wraps an [`IdentityResolver`] with the carve-outs the raw service gets wrong.
#[derive(Debug, Clone)]
pub struct IdentityAdapter<R> {
    resolver: R,
}

impl<R: IdentityResolver> IdentityAdapter<R> {
    pub fn new(resolver: R) -> Self {
        IdentityAdapter { resolver }
    }

    /// SID -> account name. Capability SIDs come back unchanged.
    pub fn resolve_name(&self, sid: &str) -> Result<String> {
        if is_capability_sid(sid) {
            return Ok(sid.to_string());
        }
        let name = self
            .resolver
            .sid_to_name(sid)
            .ok_or_else(|| ReconcileError::IdentityNotFound(sid.to_string()))?;
        Ok(strip_package_authority(&name).to_string())
    }

    /// Account name (or SID string) -> [`Identity`], named the way [`resolve_name`]
    /// renders its SID. Falls back to the given name when the SID has no reverse mapping.
    ///
    /// [`resolve_name`]: IdentityAdapter::resolve_name
    pub fn resolve_sid(&self, name: &str) -> Result<Identity> {
        let name = strip_package_authority(name.trim());
        if is_capability_sid(name) {
            return Ok(Identity::capability(name));
        }
        let sid = self
            .resolver
            .name_to_sid(name)
            .ok_or_else(|| ReconcileError::IdentityNotFound(name.to_string()))?;
        let account = self.resolve_name(&sid).unwrap_or_else(|_| name.to_string());
        tracing::trace!(name, sid = %sid, account = %account, "resolved account");
        Ok(Identity::new(sid, account))
    }
}
