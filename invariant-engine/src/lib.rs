//! Runtime invariant verification for SVS-3 async vaults.
//!
//! [`AssertionRunner`] wraps a single vault operation: it captures a
//! [`VaultSnapshot`] before and after, evaluates the armed checks of the
//! [`EpochInvariantChecker`] and [`SyncModeInvariantChecker`] against the
//! resulting [`Transition`], and commits the operation only if every check
//! passes.
//!
//! The [`Vault`] model drives the program's own `AsyncVault` state machine,
//! so the checks observe exactly the transitions the on-chain handlers make.

pub mod checkers;
pub mod config;
pub mod error;
pub mod ledger;
pub mod operation;
pub mod runner;
pub mod scenario;
pub mod snapshot;
pub mod transition;
pub mod vault;


pub use checkers::{
    checker_for, default_checks, Check, EpochInvariantChecker, InvariantChecker,
    SyncModeInvariantChecker,
};
pub use config::EngineConfig;
pub use error::{ConfigurationError, EngineError, OperationError, Result, Violation};
pub use operation::{Caller, Operation, OperationKind};
pub use runner::{AssertionRunner, Evaluation, GuardedOperation, Invocation, Verdict};
pub use snapshot::VaultSnapshot;
pub use transition::{Delta, Transition};
pub use vault::{Vault, VaultRoles};
