//!
//! The reconciler: drives one read → compare → synthesize → execute cycle per call.
//!
//! A cycle owns its snapshot cache and nothing survives it. Callers must not run two
//! cycles against the same target at once; the reconciler has no locking of its own.

use crate::access::{IdentityAdapter, IdentityResolver};
use crate::config::DeclaredConfig;
use crate::error::{ReconcileError, Result};
use crate::kernel::compare::{assess, Verdict};
use crate::kernel::plan::{synthesize, MutationPlan};
use crate::kernel::reader::SnapshotReader;
use crate::kernel::runtime::{MutationExecutor, ObjectAccess};
use crate::primitives::{AclSnapshot, DesiredState};
use crate::target::Target;
use uuid::Uuid;

/// What one cycle found and (for `reconcile`) applied.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReconcileOutcome {
    /// Correlates every log line of the cycle.
    pub cycle: Uuid,
    pub snapshot: AclSnapshot,
    pub desired: DesiredState,
    pub verdict: Verdict,
    /// Empty when the target was already compliant.
    pub plan: MutationPlan,
}

impl ReconcileOutcome {
    pub fn is_compliant(&self) -> bool {
        self.verdict.is_compliant()
    }

    /// ACEs dropped while reading the snapshot.
    pub fn warnings(&self) -> &[ReconcileError] {
        &self.snapshot.warnings
    }
}

/// Reconciles securable objects through three collaborators.
#[derive(Debug, Clone)]
pub struct Reconciler<A, R, E> {
    access: A,
    identities: IdentityAdapter<R>,
    executor: E,
}

impl<A, R, E> Reconciler<A, R, E>
where
    A: ObjectAccess,
    R: IdentityResolver,
    E: MutationExecutor,
{
    pub fn new(access: A, resolver: R, executor: E) -> Self {
        Reconciler { access, identities: IdentityAdapter::new(resolver), executor }
    }

    pub fn identities(&self) -> &IdentityAdapter<R> {
        &self.identities
    }

    /// Validates the target and checks that it exists. The engine never creates objects.
    pub fn ensure_exists(&self, target: &str) -> Result<Target> {
        let target = Target::parse(target)?;
        if !self.access.exists(&target)? {
            return Err(ReconcileError::TargetNotFound(target.raw));
        }
        Ok(target)
    }

    /// Reads, compares and synthesizes without executing anything.
    pub fn plan(&self, config: &DeclaredConfig) -> Result<ReconcileOutcome> {
        let cycle = Uuid::new_v4();
        let span = tracing::info_span!("reconcile", %cycle, key = %config.target);
        let _enter = span.enter();
        self.plan_cycle(cycle, config)
    }

    /// Runs a full cycle: the plan (if any) is handed to the executor in one call.
    pub fn reconcile(&self, config: &DeclaredConfig) -> Result<ReconcileOutcome> {
        let cycle = Uuid::new_v4();
        let span = tracing::info_span!("reconcile", %cycle, key = %config.target);
        let _enter = span.enter();

        let outcome = self.plan_cycle(cycle, config)?;
        if outcome.plan.is_empty() {
            tracing::debug!("target compliant, nothing to execute");
            return Ok(outcome);
        }

        tracing::info!(operations = outcome.plan.len(), "handing plan to executor");
        self.executor.execute(&outcome.plan).map_err(|failure| {
            tracing::error!(%failure, "plan execution failed");
            ReconcileError::ExecutionFailed {
                target: outcome.plan.target.raw.clone(),
                operation: failure.operation,
                message: failure.message,
            }
        })?;
        Ok(outcome)
    }

    fn plan_cycle(&self, cycle: Uuid, config: &DeclaredConfig) -> Result<ReconcileOutcome> {
        // Bad targets fail before any collaborator is consulted.
        let target = Target::parse(&config.target)?;
        let desired = config.desired_state(&self.identities)?;

        let snapshot = SnapshotReader::new(&target, &self.access, &self.identities).into_snapshot()?;
        for warning in &snapshot.warnings {
            tracing::debug!(%warning, "degraded snapshot");
        }

        let verdict = assess(&snapshot, &desired);
        let plan = if verdict.is_compliant() {
            MutationPlan::empty(&target)
        } else {
            synthesize(&target, &snapshot, &desired, &verdict)
        };

        for (index, op) in plan.operations.iter().enumerate() {
            tracing::debug!(index, %op, "planned");
        }

        Ok(ReconcileOutcome { cycle, snapshot, desired, verdict, plan })
    }
}
