//! Identity handling: SIDs, account names, and the adapter around the external resolver.

pub mod identity;

pub use identity::*;
