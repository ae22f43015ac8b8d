#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Regacl-Core reconciles the access control of a registry key against a declared
//! desired state.
//!
//! A cycle reads the key's owner and ACEs once, normalizes them through the permission
//! and flag codecs, decides compliance under the declared purge mode, and (when out of
//! sync) builds an ordered mutation plan that an external executor applies in one go.
//! Reading the registry, resolving accounts and running the plan are all left to
//! collaborators behind traits in [`kernel::runtime`] and [`access`].

// Shared enums and aliases (RightsMask, AceType, PurgeMode).
pub mod types;

// ACEs, raw host data, snapshots and desired state.
pub mod primitives;

pub use primitives::*;

// Permission codec.
pub mod rights;

// Inheritance and propagation flag codecs.
pub mod flags;

// Identities and the resolver adapter.
pub mod access;

pub mod target;

pub mod config;

pub mod error;

// Reader, comparator, synthesizer and the reconciler that drives them.
pub mod kernel;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{ReconcileError, Result};
pub use kernel::{MutationOp, MutationPlan, ReconcileOutcome, Reconciler};
