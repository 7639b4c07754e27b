use super::{Check, InvariantChecker};
use crate::{
    error::{AuditedField, ConfigurationError, DepositMode, Result, Violation},
    transition::{Delta, Transition},
};

/// Invariants of the two deposit paths and the NAV validity window.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncModeInvariantChecker;

impl SyncModeInvariantChecker {
    /// A synchronous deposit starts from a valid NAV.
    pub fn sync_deposit_mode(&self, transition: &Transition) -> Result<()> {
        Check::SyncDepositMode.expect_operation(transition)?;
        if !transition.pre().is_total_assets_valid {
            return Err(Violation::Mode {
                expected: DepositMode::Sync,
            }
            .into());
        }
        Ok(())
    }

    /// A deposit request starts from an expired NAV.
    pub fn async_deposit_mode(&self, transition: &Transition) -> Result<()> {
        Check::AsyncDepositMode.expect_operation(transition)?;
        if transition.pre().is_total_assets_valid {
            return Err(Violation::Mode {
                expected: DepositMode::Async,
            }
            .into());
        }
        Ok(())
    }

    /// Deposited assets land in total assets and the safe, and the receiver
    /// gets shares.
    pub fn sync_deposit_accounting(&self, transition: &Transition) -> Result<()> {
        Check::SyncDepositAccounting.expect_operation(transition)?;
        let assets = transition.operation().sync_deposit_assets().unwrap_or(0);

        credited(AuditedField::TotalAssets, transition.total_assets(), assets)?;
        credited(
            AuditedField::SafeAssetBalance,
            transition.safe_asset_balance(),
            assets,
        )?;

        let shares = transition.receiver_share_balance();
        if shares.after <= shares.before {
            return Err(Violation::Accounting {
                field: AuditedField::ReceiverShareBalance,
                before: shares.before,
                after: shares.after,
                assets,
            }
            .into());
        }
        Ok(())
    }

    /// A synchronous deposit never touches the epoch machinery.
    pub fn epoch_isolation(&self, transition: &Transition) -> Result<()> {
        Check::EpochIsolation.expect_operation(transition)?;
        untouched(AuditedField::DepositEpochId, transition.deposit_epoch_id())?;
        untouched(AuditedField::RedeemEpochId, transition.redeem_epoch_id())?;
        untouched(
            AuditedField::PendingSiloAssetBalance,
            transition.pending_silo_asset_balance(),
        )
    }

    /// A settlement with a non-zero lifespan restarts the NAV window at the
    /// settlement time.
    pub fn nav_expiration_update(&self, transition: &Transition) -> Result<()> {
        Check::NavExpirationUpdate.expect_operation(transition)?;
        let pre = transition.pre();
        if pre.total_assets_lifespan == 0 {
            return Ok(());
        }

        let actual = transition.post().total_assets_expiration;
        let expected = i64::try_from(pre.total_assets_lifespan)
            .ok()
            .and_then(|lifespan| transition.timestamp().checked_add(lifespan));
        match expected {
            Some(expected) if expected == actual => Ok(()),
            Some(expected) => Err(Violation::Expiration { expected, actual }.into()),
            None => Err(Violation::Expiration {
                expected: i64::MAX,
                actual,
            }
            .into()),
        }
    }
}

fn credited(field: AuditedField, delta: Delta<u64>, assets: u64) -> Result<()> {
    if delta.signed() != i128::from(assets) {
        return Err(Violation::Accounting {
            field,
            before: delta.before,
            after: delta.after,
            assets,
        }
        .into());
    }
    Ok(())
}

fn untouched(field: AuditedField, delta: Delta<u64>) -> Result<()> {
    if delta.changed() {
        return Err(Violation::Isolation {
            field,
            before: delta.before,
            after: delta.after,
        }
        .into());
    }
    Ok(())
}

impl InvariantChecker for SyncModeInvariantChecker {
    fn name(&self) -> &'static str {
        "sync_mode"
    }

    fn supports(&self, check: Check) -> bool {
        matches!(
            check,
            Check::SyncDepositMode
                | Check::AsyncDepositMode
                | Check::SyncDepositAccounting
                | Check::EpochIsolation
                | Check::NavExpirationUpdate
        )
    }

    fn evaluate(&self, check: Check, transition: &Transition) -> Result<()> {
        match check {
            Check::SyncDepositMode => self.sync_deposit_mode(transition),
            Check::AsyncDepositMode => self.async_deposit_mode(transition),
            Check::SyncDepositAccounting => self.sync_deposit_accounting(transition),
            Check::EpochIsolation => self.epoch_isolation(transition),
            Check::NavExpirationUpdate => self.nav_expiration_update(transition),
            _ => Err(ConfigurationError::UnsupportedCheck {
                checker: self.name(),
                check,
            }
            .into()),
        }
    }
}
