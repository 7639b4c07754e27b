use svs_3::constants::EPOCH_STEP;

use super::{Check, InvariantChecker};
use crate::{
    error::{ConfigurationError, Parity, Result, Side, Violation},
    snapshot::VaultSnapshot,
    transition::Transition,
};

/// Structural invariants of the deposit and redeem epoch counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct EpochInvariantChecker;

impl EpochInvariantChecker {
    /// Deposit epochs stay odd and redeem epochs stay even.
    pub fn epoch_parity(&self, transition: &Transition) -> Result<()> {
        let post = transition.post();
        if post.deposit_epoch_id % 2 != 1 {
            return Err(Violation::Parity {
                side: Side::Deposit,
                epoch_id: post.deposit_epoch_id,
                expected: Parity::Odd,
            }
            .into());
        }
        if post.redeem_epoch_id % 2 != 0 {
            return Err(Violation::Parity {
                side: Side::Redeem,
                epoch_id: post.redeem_epoch_id,
                expected: Parity::Even,
            }
            .into());
        }
        Ok(())
    }

    /// A settled epoch trails the open one by at least [`EPOCH_STEP`].
    ///
    /// A last-settled id of zero means nothing has settled on that side yet.
    pub fn settlement_ordering(&self, transition: &Transition) -> Result<()> {
        let post = transition.post();
        check_ordering(Side::Deposit, post.last_deposit_epoch_id_settled, post.deposit_epoch_id)?;
        check_ordering(Side::Redeem, post.last_redeem_epoch_id_settled, post.redeem_epoch_id)
    }

    /// Each epoch counter moves by exactly 0 or [`EPOCH_STEP`].
    pub fn epoch_increments(&self, transition: &Transition) -> Result<()> {
        check_increment(Side::Deposit, transition, |s| s.deposit_epoch_id)?;
        check_increment(Side::Redeem, transition, |s| s.redeem_epoch_id)
    }
}

fn check_ordering(side: Side, last_settled: u64, current: u64) -> Result<()> {
    if last_settled == 0 {
        return Ok(());
    }
    match last_settled.checked_add(EPOCH_STEP) {
        Some(bound) if bound <= current => Ok(()),
        _ => Err(Violation::Ordering {
            side,
            last_settled,
            current,
        }
        .into()),
    }
}

fn check_increment(
    side: Side,
    transition: &Transition,
    field: impl Fn(&VaultSnapshot) -> u64,
) -> Result<()> {
    let observed_delta = transition.delta(field).signed();
    if observed_delta != 0 && observed_delta != i128::from(EPOCH_STEP) {
        return Err(Violation::Increment {
            side,
            observed_delta,
        }
        .into());
    }
    Ok(())
}

impl InvariantChecker for EpochInvariantChecker {
    fn name(&self) -> &'static str {
        "epoch"
    }

    fn supports(&self, check: Check) -> bool {
        matches!(
            check,
            Check::EpochParity | Check::SettlementOrdering | Check::EpochIncrements
        )
    }

    fn evaluate(&self, check: Check, transition: &Transition) -> Result<()> {
        match check {
            Check::EpochParity => self.epoch_parity(transition),
            Check::SettlementOrdering => self.settlement_ordering(transition),
            Check::EpochIncrements => self.epoch_increments(transition),
            _ => Err(ConfigurationError::UnsupportedCheck {
                checker: self.name(),
                check,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use anchor_lang::prelude::Pubkey;

    use super::*;
    use crate::{
        error::EngineError,
        operation::{Caller, Operation},
        vault::{Vault, VaultRoles},
    };

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    fn snapshot(configure: impl FnOnce(&mut Vault)) -> VaultSnapshot {
        let roles = VaultRoles {
            authority: key(1),
            valuation_manager: key(2),
            curator: key(3),
        };
        let mut vault = Vault::new(key(9), roles, 3, 1_000, 0);
        configure(&mut vault);
        VaultSnapshot::capture(&vault, None)
    }

    fn transition(pre: VaultSnapshot, post: VaultSnapshot) -> Transition {
        Transition::new(
            Operation::UpdateNewTotalAssets { new_total_assets: 0 },
            pre,
            post,
        )
    }

    fn violation(result: Result<()>) -> Violation {
        match result {
            Err(EngineError::Violation(violation)) => violation,
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn test_parity_holds_on_fresh_vault() {
        let t = transition(snapshot(|_| {}), snapshot(|_| {}));
        assert!(EpochInvariantChecker.epoch_parity(&t).is_ok());
    }

    #[test]
    fn test_parity_rejects_even_deposit_epoch() {
        let t = transition(
            snapshot(|_| {}),
            snapshot(|v| v.state_mut().deposit_epoch_id = 2),
        );
        assert_eq!(
            violation(EpochInvariantChecker.epoch_parity(&t)),
            Violation::Parity {
                side: Side::Deposit,
                epoch_id: 2,
                expected: Parity::Odd
            }
        );
    }

    #[test]
    fn test_parity_rejects_odd_redeem_epoch() {
        let t = transition(
            snapshot(|_| {}),
            snapshot(|v| v.state_mut().redeem_epoch_id = 3),
        );
        assert_eq!(
            violation(EpochInvariantChecker.epoch_parity(&t)),
            Violation::Parity {
                side: Side::Redeem,
                epoch_id: 3,
                expected: Parity::Even
            }
        );
    }

    #[test]
    fn test_ordering_allows_unsettled_sides() {
        let t = transition(snapshot(|_| {}), snapshot(|_| {}));
        assert!(EpochInvariantChecker.settlement_ordering(&t).is_ok());
    }

    #[test]
    fn test_ordering_boundaries() {
        let at_bound = snapshot(|v| {
            v.state_mut().deposit_epoch_id = 5;
            v.state_mut().last_deposit_epoch_id_settled = 3;
        });
        let t = transition(snapshot(|_| {}), at_bound);
        assert!(EpochInvariantChecker.settlement_ordering(&t).is_ok());

        let caught_up = snapshot(|v| {
            v.state_mut().redeem_epoch_id = 4;
            v.state_mut().last_redeem_epoch_id_settled = 4;
        });
        let t = transition(snapshot(|_| {}), caught_up);
        assert_eq!(
            violation(EpochInvariantChecker.settlement_ordering(&t)),
            Violation::Ordering {
                side: Side::Redeem,
                last_settled: 4,
                current: 4
            }
        );
    }

    #[test]
    fn test_ordering_rejects_overflowing_last_settled() {
        let post = snapshot(|v| v.state_mut().last_deposit_epoch_id_settled = u64::MAX);
        let t = transition(snapshot(|_| {}), post);
        assert!(matches!(
            violation(EpochInvariantChecker.settlement_ordering(&t)),
            Violation::Ordering { side: Side::Deposit, .. }
        ));
    }

    #[test]
    fn test_increments() {
        let pre = snapshot(|_| {});
        for (deposit_epoch_id, ok) in [(1, true), (2, false), (3, true), (4, false)] {
            let post = snapshot(|v| v.state_mut().deposit_epoch_id = deposit_epoch_id);
            let result = EpochInvariantChecker.epoch_increments(&transition(pre.clone(), post));
            assert_eq!(result.is_ok(), ok, "deposit epoch {deposit_epoch_id}");
        }

        let post = snapshot(|v| v.state_mut().redeem_epoch_id = 0);
        assert_eq!(
            violation(EpochInvariantChecker.epoch_increments(&transition(pre, post))),
            Violation::Increment {
                side: Side::Redeem,
                observed_delta: -2
            }
        );
    }

    #[test]
    fn test_rejects_foreign_check() {
        let t = transition(snapshot(|_| {}), snapshot(|_| {}));
        let err = EpochInvariantChecker
            .evaluate(Check::SyncDepositMode, &t)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::UnsupportedCheck {
                checker: "epoch",
                check: Check::SyncDepositMode
            })
        );
    }

    #[test]
    fn test_vault_push_passes_all_epoch_checks() {
        let roles = VaultRoles {
            authority: key(1),
            valuation_manager: key(2),
            curator: key(3),
        };
        let mut vault = Vault::new(key(9), roles, 3, 1_000, 0);
        vault
            .ledger_mut()
            .fund(crate::ledger::Holder::Wallet(key(10)), 10_000)
            .unwrap();
        vault
            .apply(
                &Caller::signed(key(10)),
                &Operation::RequestDeposit { assets: 10_000 },
            )
            .unwrap();

        let pre = VaultSnapshot::capture(&vault, None);
        let push = Operation::UpdateNewTotalAssets { new_total_assets: 0 };
        vault.apply(&Caller::signed(key(2)), &push).unwrap();
        let t = Transition::new(push, pre, VaultSnapshot::capture(&vault, None));

        assert_eq!(t.deposit_epoch_id().signed(), 2);
        for check in [
            Check::EpochParity,
            Check::SettlementOrdering,
            Check::EpochIncrements,
        ] {
            assert!(EpochInvariantChecker.evaluate(check, &t).is_ok(), "{check}");
        }
    }
}
