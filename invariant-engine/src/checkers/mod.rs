//! Invariant checkers and the checks they implement.

mod epoch;
mod sync_mode;

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

pub use epoch::EpochInvariantChecker;
pub use sync_mode::SyncModeInvariantChecker;

use crate::{
    error::{ConfigurationError, Result},
    operation::OperationKind,
    transition::Transition,
};

/// Check selector passed at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Deposit epoch odd, redeem epoch even
    EpochParity,
    /// Last settled epochs trail the current ones by at least one step
    SettlementOrdering,
    /// Epochs advance by 0 or 2
    EpochIncrements,
    /// Synchronous deposits only while NAV is valid
    SyncDepositMode,
    /// Deposit requests only while NAV is expired
    AsyncDepositMode,
    /// Synchronous deposits credit total assets, the safe and the receiver
    SyncDepositAccounting,
    /// Synchronous deposits leave the epochs and the pending silo alone
    EpochIsolation,
    /// Settlements restart the NAV window
    NavExpirationUpdate,
}

impl Check {
    pub const ALL: [Check; 8] = [
        Check::EpochParity,
        Check::SettlementOrdering,
        Check::EpochIncrements,
        Check::SyncDepositMode,
        Check::AsyncDepositMode,
        Check::SyncDepositAccounting,
        Check::EpochIsolation,
        Check::NavExpirationUpdate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Check::EpochParity => "epoch_parity",
            Check::SettlementOrdering => "settlement_ordering",
            Check::EpochIncrements => "epoch_increments",
            Check::SyncDepositMode => "sync_deposit_mode",
            Check::AsyncDepositMode => "async_deposit_mode",
            Check::SyncDepositAccounting => "sync_deposit_accounting",
            Check::EpochIsolation => "epoch_isolation",
            Check::NavExpirationUpdate => "nav_expiration_update",
        }
    }

    /// Whether the check has anything to say about `kind` transitions.
    pub fn applies_to(&self, kind: OperationKind) -> bool {
        match self {
            Check::EpochParity | Check::SettlementOrdering | Check::EpochIncrements => true,
            Check::SyncDepositMode | Check::SyncDepositAccounting | Check::EpochIsolation => {
                kind == OperationKind::SyncDeposit
            }
            Check::AsyncDepositMode => kind == OperationKind::RequestDeposit,
            Check::NavExpirationUpdate => kind.is_settlement(),
        }
    }

    pub(crate) fn expect_operation(&self, transition: &Transition) -> Result<()> {
        if !self.applies_to(transition.kind()) {
            return Err(ConfigurationError::OperationMismatch {
                check: *self,
                operation: transition.kind(),
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Check {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Check::ALL
            .into_iter()
            .find(|check| check.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownCheck(s.to_string()))
    }
}

/// A stateless predicate family over vault transitions.
pub trait InvariantChecker: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, check: Check) -> bool;

    /// Evaluate `check` against one transition.
    ///
    /// Returns [`EngineError::Violation`](crate::error::EngineError::Violation)
    /// when the invariant is broken and
    /// [`EngineError::Configuration`](crate::error::EngineError::Configuration)
    /// when the check cannot be evaluated here.
    fn evaluate(&self, check: Check, transition: &Transition) -> Result<()>;
}

/// The built-in checker implementing `check`.
pub fn checker_for(check: Check) -> Arc<dyn InvariantChecker> {
    if EpochInvariantChecker.supports(check) {
        Arc::new(EpochInvariantChecker)
    } else {
        Arc::new(SyncModeInvariantChecker)
    }
}

/// Checks armed for `kind` when the caller names none.
pub fn default_checks(kind: OperationKind) -> &'static [Check] {
    match kind {
        OperationKind::UpdateNewTotalAssets => &[
            Check::EpochIncrements,
            Check::EpochParity,
            Check::SettlementOrdering,
        ],
        OperationKind::SettleDeposit | OperationKind::SettleRedeem => &[
            Check::EpochParity,
            Check::SettlementOrdering,
            Check::EpochIncrements,
            Check::NavExpirationUpdate,
        ],
        OperationKind::SyncDeposit => &[
            Check::SyncDepositMode,
            Check::SyncDepositAccounting,
            Check::EpochIsolation,
            Check::EpochParity,
        ],
        OperationKind::RequestDeposit => &[
            Check::AsyncDepositMode,
            Check::EpochParity,
            Check::EpochIncrements,
        ],
        _ => &[
            Check::EpochParity,
            Check::SettlementOrdering,
            Check::EpochIncrements,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_names_round_trip() {
        for check in Check::ALL {
            assert_eq!(check.name().parse::<Check>().unwrap(), check);
        }
        assert_eq!(
            "epochParity".parse::<Check>().unwrap_err(),
            ConfigurationError::UnknownCheck("epochParity".to_string())
        );
    }

    #[test]
    fn test_every_check_has_a_checker() {
        for check in Check::ALL {
            assert!(checker_for(check).supports(check), "{check}");
        }
    }

    #[test]
    fn test_default_checks_apply_to_their_operation() {
        let kinds = [
            OperationKind::UpdateNewTotalAssets,
            OperationKind::SettleDeposit,
            OperationKind::SettleRedeem,
            OperationKind::SyncDeposit,
            OperationKind::RequestDeposit,
            OperationKind::RequestRedeem,
            OperationKind::ClaimShares,
            OperationKind::ClaimAssets,
            OperationKind::UpdateTotalAssetsLifespan,
            OperationKind::ExpireTotalAssets,
        ];
        for kind in kinds {
            for check in default_checks(kind) {
                assert!(check.applies_to(kind), "{check} on {kind}");
            }
        }
    }
}
