//! Error types for the invariant engine

use std::fmt;

use anchor_lang::prelude::Pubkey;
use serde::Serialize;
use svs_3::error::VaultError;
use thiserror::Error;

use crate::{checkers::Check, operation::OperationKind};

/// Which half of the epoch machinery a violation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Deposit,
    Redeem,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Deposit => f.write_str("deposit"),
            Side::Redeem => f.write_str("redeem"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Odd,
    Even,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Odd => f.write_str("odd"),
            Parity::Even => f.write_str("even"),
        }
    }
}

/// Deposit path a transition was expected to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositMode {
    Sync,
    Async,
}

impl fmt::Display for DepositMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepositMode::Sync => f.write_str("sync"),
            DepositMode::Async => f.write_str("async"),
        }
    }
}

/// Snapshot fields audited around a synchronous deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditedField {
    TotalAssets,
    SafeAssetBalance,
    ReceiverShareBalance,
    DepositEpochId,
    RedeemEpochId,
    PendingSiloAssetBalance,
}

impl fmt::Display for AuditedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditedField::TotalAssets => "total_assets",
            AuditedField::SafeAssetBalance => "safe_asset_balance",
            AuditedField::ReceiverShareBalance => "receiver_share_balance",
            AuditedField::DepositEpochId => "deposit_epoch_id",
            AuditedField::RedeemEpochId => "redeem_epoch_id",
            AuditedField::PendingSiloAssetBalance => "pending_silo_asset_balance",
        };
        f.write_str(name)
    }
}

/// A state transition broke a vault invariant.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("{side} epoch {epoch_id} must be {expected}")]
    Parity {
        side: Side,
        epoch_id: u64,
        expected: Parity,
    },

    #[error("last settled {side} epoch {last_settled} must trail current epoch {current} by at least 2")]
    Ordering {
        side: Side,
        last_settled: u64,
        current: u64,
    },

    #[error("{side} epoch advanced by {observed_delta}, expected 0 or 2")]
    Increment { side: Side, observed_delta: i128 },

    #[error("deposit executed outside {expected} mode")]
    Mode { expected: DepositMode },

    #[error("{field} moved from {before} to {after} for a deposit of {assets}")]
    Accounting {
        field: AuditedField,
        before: u64,
        after: u64,
        assets: u64,
    },

    #[error("sync deposit touched {field}: {before} -> {after}")]
    Isolation {
        field: AuditedField,
        before: u64,
        after: u64,
    },

    #[error("NAV expiration is {actual}, expected {expected}")]
    Expiration { expected: i64, actual: i64 },
}

/// The runner was armed or driven incorrectly.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("registration is missing a target vault")]
    MissingTarget,

    #[error("no checks are armed for vault {0}")]
    NotArmed(Pubkey),

    #[error("checks are armed for vault {armed}, not {target}")]
    TargetMismatch { armed: Pubkey, target: Pubkey },

    #[error("checker {checker} does not implement {check}")]
    UnsupportedCheck { checker: &'static str, check: Check },

    #[error("{check} cannot evaluate a {operation} transition")]
    OperationMismatch {
        check: Check,
        operation: OperationKind,
    },

    #[error("unknown check: {0}")]
    UnknownCheck(String),
}

/// Vault role an operation is gated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    ValuationManager,
    Curator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::ValuationManager => f.write_str("valuation manager"),
            Role::Curator => f.write_str("curator"),
        }
    }
}

/// The guarded operation itself failed. Reported as-is, never as a violation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("{actor} is not the vault {role}")]
    Unauthorized { actor: Pubkey, role: Role },

    #[error("vault rejected operation: {name} ({code}): {message}")]
    Rejected {
        code: u32,
        name: String,
        message: String,
    },

    #[error("program error: {0}")]
    Program(String),

    #[error("{holder} holds {available} of {token}, needs {needed}")]
    InsufficientBalance {
        token: String,
        holder: String,
        needed: u64,
        available: u64,
    },

    #[error("{holder} balance of {token} would overflow")]
    BalanceOverflow { token: String, holder: String },
}

impl OperationError {
    /// True when the vault rejected the operation with `err`.
    pub fn is_vault_error(&self, err: VaultError) -> bool {
        matches!(self, OperationError::Rejected { code, .. } if *code == u32::from(err))
    }
}

impl From<anchor_lang::error::Error> for OperationError {
    fn from(err: anchor_lang::error::Error) -> Self {
        match err {
            anchor_lang::error::Error::AnchorError(e) => OperationError::Rejected {
                code: e.error_code_number,
                name: e.error_name.clone(),
                message: e.error_msg.clone(),
            },
            anchor_lang::error::Error::ProgramError(e) => {
                OperationError::Program(e.program_error.to_string())
            }
        }
    }
}

/// Engine error types
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invariant violated: {0}")]
    Violation(#[from] Violation),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("operation failed: {0}")]
    Operation(#[from] OperationError),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
