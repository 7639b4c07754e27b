//! Vault operations the runner can guard.

use std::fmt;

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};

use crate::error::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    UpdateNewTotalAssets,
    SettleDeposit,
    SettleRedeem,
    SyncDeposit,
    RequestDeposit,
    RequestRedeem,
    ClaimShares,
    ClaimAssets,
    UpdateTotalAssetsLifespan,
    ExpireTotalAssets,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::UpdateNewTotalAssets => "update_new_total_assets",
            OperationKind::SettleDeposit => "settle_deposit",
            OperationKind::SettleRedeem => "settle_redeem",
            OperationKind::SyncDeposit => "sync_deposit",
            OperationKind::RequestDeposit => "request_deposit",
            OperationKind::RequestRedeem => "request_redeem",
            OperationKind::ClaimShares => "claim_shares",
            OperationKind::ClaimAssets => "claim_assets",
            OperationKind::UpdateTotalAssetsLifespan => "update_total_assets_lifespan",
            OperationKind::ExpireTotalAssets => "expire_total_assets",
        }
    }

    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            OperationKind::SettleDeposit | OperationKind::SettleRedeem
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single state-changing call on the vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Push a valuation and close every epoch with pending flow
    UpdateNewTotalAssets { new_total_assets: u64 },
    /// Settle the pending deposit epoch at `valuation`
    SettleDeposit { valuation: u64 },
    /// Settle the pending redeem epoch at `valuation`
    SettleRedeem { valuation: u64 },
    SyncDeposit {
        assets: u64,
        receiver: Pubkey,
        min_shares_out: u64,
    },
    RequestDeposit { assets: u64 },
    RequestRedeem { shares: u64 },
    ClaimShares,
    ClaimAssets,
    UpdateTotalAssetsLifespan { lifespan: u64 },
    ExpireTotalAssets,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::UpdateNewTotalAssets { .. } => OperationKind::UpdateNewTotalAssets,
            Operation::SettleDeposit { .. } => OperationKind::SettleDeposit,
            Operation::SettleRedeem { .. } => OperationKind::SettleRedeem,
            Operation::SyncDeposit { .. } => OperationKind::SyncDeposit,
            Operation::RequestDeposit { .. } => OperationKind::RequestDeposit,
            Operation::RequestRedeem { .. } => OperationKind::RequestRedeem,
            Operation::ClaimShares => OperationKind::ClaimShares,
            Operation::ClaimAssets => OperationKind::ClaimAssets,
            Operation::UpdateTotalAssetsLifespan { .. } => {
                OperationKind::UpdateTotalAssetsLifespan
            }
            Operation::ExpireTotalAssets => OperationKind::ExpireTotalAssets,
        }
    }

    /// Role the caller must hold. `None` means any signer.
    pub fn required_role(&self) -> Option<Role> {
        match self.kind() {
            OperationKind::UpdateNewTotalAssets => Some(Role::ValuationManager),
            OperationKind::SettleDeposit
            | OperationKind::SettleRedeem
            | OperationKind::UpdateTotalAssetsLifespan
            | OperationKind::ExpireTotalAssets => Some(Role::Curator),
            _ => None,
        }
    }

    /// Account whose share balance the snapshots follow.
    pub fn receiver(&self) -> Option<Pubkey> {
        match self {
            Operation::SyncDeposit { receiver, .. } => Some(*receiver),
            _ => None,
        }
    }

    /// Assets moved into the vault by a synchronous deposit.
    pub fn sync_deposit_assets(&self) -> Option<u64> {
        match self {
            Operation::SyncDeposit { assets, .. } => Some(*assets),
            _ => None,
        }
    }
}

/// A signer that has already been verified at the call boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    key: Pubkey,
}

impl Caller {
    pub fn signed(key: Pubkey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> Pubkey {
        self.key
    }
}
