pub mod core;
pub mod runtime;
pub mod reader;
pub mod compare;
pub mod plan;


// Re-export the primary types so callers can stay on `crate::kernel::*` paths.
pub use self::core::{ReconcileOutcome, Reconciler};
pub use compare::{assess, is_compliant, Verdict};
pub use plan::{synthesize, MutationOp, MutationPlan};
pub use reader::SnapshotReader;
pub use runtime::{DryRunExecutor, ExecutionFailure, MutationExecutor, ObjectAccess};
