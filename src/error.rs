//!
//! Defines error types for the reconciliation engine.

/// Every failure a reconciliation cycle can surface.
///
/// Only `AceDecodeSkipped` is non-fatal: the snapshot reader records it as a
/// warning and drops the offending entry. Everything else aborts the cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// The target string could not be split into a root and a path.
    #[error("Invalid registry key: {0}")]
    InvalidTarget(String),
    /// The root is a predefined key the engine refuses to manage.
    #[error("Unsupported predefined key: {0}")]
    UnsupportedRoot(String),
    /// The object does not exist. The engine never creates it.
    #[error("Target registry key doesn't exist: {0}")]
    TargetNotFound(String),
    /// A symbolic rights token (or a raw mask with no named bits) is not known.
    #[error("Invalid permission - {0}")]
    InvalidPermission(String),
    /// An inheritance, propagation or access-control-type value is not in its table.
    #[error("Invalid {kind} - {value}")]
    InvalidFlag { kind: &'static str, value: String },
    /// The identity resolver could not map a name or SID.
    #[error("Could not resolve identity {0}")]
    IdentityNotFound(String),
    /// One raw ACE failed to decode and was left out of the snapshot.
    #[error("Pre-existing ACE #{index} on {target} ignored due to: {reason}")]
    AceDecodeSkipped {
        target: String,
        index: usize,
        reason: Box<ReconcileError>,
    },
    /// The executor rejected the plan.
    #[error("Executing plan against {target} failed at operation {operation}: {message}")]
    ExecutionFailed {
        target: String,
        operation: usize,
        message: String,
    },
    /// An object-access call failed for a reason other than absence.
    #[error("Reading {target} failed: {message}")]
    Collaborator { target: String, message: String },
    /// The declared configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

impl ReconcileError {
    /// `true` for the one error kind the engine absorbs instead of propagating.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReconcileError::AceDecodeSkipped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_decode_skips_are_recoverable() {
        let skipped = ReconcileError::AceDecodeSkipped {
            target: "HKLM:\\Software".into(),
            index: 2,
            reason: Box::new(ReconcileError::InvalidPermission("0".into())),
        };
        assert!(skipped.is_recoverable());
        assert!(!ReconcileError::TargetNotFound("x".into()).is_recoverable());
    }

    #[test]
    fn test_messages_carry_offending_value() {
        let err = ReconcileError::InvalidFlag { kind: "InheritanceFlags", value: "7".into() };
        assert_eq!(err.to_string(), "Invalid InheritanceFlags - 7");

        let err = ReconcileError::ExecutionFailed {
            target: "HKLM:\\Software".into(),
            operation: 1,
            message: "access denied".into(),
        };
        assert!(err.to_string().contains("operation 1"));
        assert!(err.to_string().contains("access denied"));
    }
}
