//! Collaborator seams.
//!
//! The engine never touches the registry or a shell itself. Reading goes through an
//! [`ObjectAccess`] implementation and writing through a [`MutationExecutor`], which
//! receives the whole plan at once and applies it as one transaction.

use crate::error::Result;
use crate::kernel::plan::MutationPlan;
use crate::primitives::RawAce;
use crate::target::Target;

/// Read access to securable objects.
///
/// Implementations report an absent object through `exists` and any other failure as
/// `ReconcileError::Collaborator`.
pub trait ObjectAccess {
    fn exists(&self, target: &Target) -> Result<bool>;

    /// The owner as the host reports it (usually a qualified account name).
    fn owner(&self, target: &Target) -> Result<String>;

    fn aces(&self, target: &Target) -> Result<Vec<RawAce>>;
}

impl<T: ObjectAccess + ?Sized> ObjectAccess for &T {
    fn exists(&self, target: &Target) -> Result<bool> {
        (**self).exists(target)
    }

    fn owner(&self, target: &Target) -> Result<String> {
        (**self).owner(target)
    }

    fn aces(&self, target: &Target) -> Result<Vec<RawAce>> {
        (**self).aces(target)
    }
}

/// Why an executor rejected a plan. `operation` indexes `MutationPlan::operations`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("operation {operation}: {message}")]
pub struct ExecutionFailure {
    pub operation: usize,
    pub message: String,
}

/// Applies a plan: setup steps first, then every operation, all or nothing.
pub trait MutationExecutor {
    fn execute(&self, plan: &MutationPlan) -> std::result::Result<(), ExecutionFailure>;
}

impl<T: MutationExecutor + ?Sized> MutationExecutor for &T {
    fn execute(&self, plan: &MutationPlan) -> std::result::Result<(), ExecutionFailure> {
        (**self).execute(plan)
    }
}

/// Executor that only logs the plan. Useful for reporting drift without changing anything.
#[derive(Default, Debug, Clone)]
pub struct DryRunExecutor;

impl MutationExecutor for DryRunExecutor {
    fn execute(&self, plan: &MutationPlan) -> std::result::Result<(), ExecutionFailure> {
        for (index, op) in plan.operations.iter().enumerate() {
            tracing::info!(key = %plan.target, index, op = %op, "dry run");
        }
        Ok(())
    }
}
