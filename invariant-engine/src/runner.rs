//! Guards vault operations with pre/post snapshot assertions.
//!
//! A runner is armed with one or more `(checker, check)` registrations for a
//! single vault, then executes exactly one operation:
//!
//! ```text
//! Idle -> Armed -> PreCaptured -> Executed -> PostCaptured -> Evaluated -> Idle
//! ```
//!
//! The operation runs against a staged copy of the vault. The copy replaces
//! the live vault only when every registered check passes, so a violating
//! operation leaves no trace.

use std::{fmt, sync::Arc};

use anchor_lang::prelude::Pubkey;
use tracing::{debug, info, warn};

use crate::{
    checkers::{checker_for, default_checks, Check, InvariantChecker},
    error::{ConfigurationError, EngineError, OperationError, Result, Violation},
    operation::{Caller, Operation, OperationKind},
    snapshot::VaultSnapshot,
    transition::Transition,
    vault::Vault,
};

/// An operation the runner can stage and execute.
pub trait GuardedOperation {
    fn operation(&self) -> &Operation;

    /// Perform the operation against `vault`.
    fn execute(&self, vault: &mut Vault) -> std::result::Result<(), OperationError>;
}

/// A plain vault call made by a verified caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub caller: Caller,
    pub operation: Operation,
}

impl GuardedOperation for Invocation {
    fn operation(&self) -> &Operation {
        &self.operation
    }

    fn execute(&self, vault: &mut Vault) -> std::result::Result<(), OperationError> {
        vault.apply(&self.caller, &self.operation)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Armed,
    PreCaptured,
    Executed,
    PostCaptured,
    Evaluated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Armed => "armed",
            Phase::PreCaptured => "pre_captured",
            Phase::Executed => "executed",
            Phase::PostCaptured => "post_captured",
            Phase::Evaluated => "evaluated",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
struct Registration {
    checker: Arc<dyn InvariantChecker>,
    check: Check,
}

#[derive(Clone, Debug)]
struct Armed {
    target: Pubkey,
    registrations: Vec<Registration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Violated { check: Check, violation: Violation },
}

/// Outcome of one guarded execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub transition: Transition,
}

impl Evaluation {
    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    pub fn violation(&self) -> Option<&Violation> {
        match &self.verdict {
            Verdict::Pass => None,
            Verdict::Violated { violation, .. } => Some(violation),
        }
    }

    /// The transition on pass, the violation otherwise.
    pub fn into_result(self) -> Result<Transition> {
        match self.verdict {
            Verdict::Pass => Ok(self.transition),
            Verdict::Violated { violation, .. } => Err(EngineError::Violation(violation)),
        }
    }
}

#[derive(Debug, Default)]
pub struct AssertionRunner {
    armed: Option<Armed>,
}

impl AssertionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Idle` or `Armed`. The capture and evaluation phases run inside a
    /// single `execute` call and only show up in its log records.
    pub fn phase(&self) -> Phase {
        if self.armed.is_some() {
            Phase::Armed
        } else {
            Phase::Idle
        }
    }

    /// Arm `check` of `checker` for the next operation on `target`.
    ///
    /// Registrations accumulate until an operation executes and are
    /// evaluated in registration order.
    pub fn register(
        &mut self,
        target: Pubkey,
        checker: Arc<dyn InvariantChecker>,
        check: Check,
    ) -> Result<()> {
        if target == Pubkey::default() {
            return Err(ConfigurationError::MissingTarget.into());
        }
        if !checker.supports(check) {
            return Err(ConfigurationError::UnsupportedCheck {
                checker: checker.name(),
                check,
            }
            .into());
        }

        let registration = Registration { checker, check };
        match &mut self.armed {
            None => {
                self.armed = Some(Armed {
                    target,
                    registrations: vec![registration],
                });
            }
            Some(armed) if armed.target == target => armed.registrations.push(registration),
            Some(armed) => {
                return Err(ConfigurationError::TargetMismatch {
                    armed: armed.target,
                    target,
                }
                .into())
            }
        }

        debug!(vault = %target, %check, "Check armed");
        Ok(())
    }

    /// Arm the built-in checks for an operation of `kind`.
    pub fn arm_defaults(&mut self, target: Pubkey, kind: OperationKind) -> Result<()> {
        for &check in default_checks(kind) {
            self.register(target, checker_for(check), check)?;
        }
        Ok(())
    }

    /// Drop every pending registration.
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn execute(
        &mut self,
        vault: &mut Vault,
        caller: &Caller,
        operation: Operation,
    ) -> Result<Evaluation> {
        let invocation = Invocation {
            caller: *caller,
            operation,
        };
        self.execute_with(vault, &invocation)
    }

    /// Execute one guarded operation and evaluate every armed check.
    ///
    /// Registrations are consumed whatever the outcome. Operation errors are
    /// returned untouched and no check is evaluated for them.
    pub fn execute_with<G: GuardedOperation + ?Sized>(
        &mut self,
        vault: &mut Vault,
        guarded: &G,
    ) -> Result<Evaluation> {
        let armed = self
            .armed
            .take()
            .ok_or(ConfigurationError::NotArmed(vault.key()))?;
        if armed.target != vault.key() {
            return Err(ConfigurationError::TargetMismatch {
                armed: armed.target,
                target: vault.key(),
            }
            .into());
        }

        let operation = guarded.operation().clone();
        let kind = operation.kind();
        for registration in &armed.registrations {
            if !registration.check.applies_to(kind) {
                return Err(ConfigurationError::OperationMismatch {
                    check: registration.check,
                    operation: kind,
                }
                .into());
            }
        }

        let receiver = operation.receiver();
        let pre = VaultSnapshot::capture(vault, receiver);
        trace_phase(Phase::PreCaptured, &operation, &pre);

        let mut staged = vault.clone();
        if let Err(err) = guarded.execute(&mut staged) {
            warn!(
                vault = %vault.key(),
                operation = %kind,
                error = %err,
                "Guarded operation failed"
            );
            return Err(err.into());
        }
        debug!(vault = %vault.key(), operation = %kind, phase = %Phase::Executed);

        let post = VaultSnapshot::capture(&staged, receiver);
        trace_phase(Phase::PostCaptured, &operation, &post);

        let transition = Transition::new(operation, pre, post);
        for registration in &armed.registrations {
            match registration.checker.evaluate(registration.check, &transition) {
                Ok(()) => {}
                Err(EngineError::Violation(violation)) => {
                    warn!(
                        vault = %vault.key(),
                        operation = %kind,
                        check = %registration.check,
                        %violation,
                        "Invariant violated, operation discarded"
                    );
                    return Ok(Evaluation {
                        verdict: Verdict::Violated {
                            check: registration.check,
                            violation,
                        },
                        transition,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        *vault = staged;
        info!(
            vault = %vault.key(),
            operation = %kind,
            checks = armed.registrations.len(),
            phase = %Phase::Evaluated,
            "Operation committed"
        );

        Ok(Evaluation {
            verdict: Verdict::Pass,
            transition,
        })
    }
}

fn trace_phase(phase: Phase, operation: &Operation, snapshot: &VaultSnapshot) {
    debug!(
        vault = %snapshot.vault,
        operation = %operation.kind(),
        %phase,
        digest = %snapshot.digest,
        deposit_epoch_id = snapshot.deposit_epoch_id,
        redeem_epoch_id = snapshot.redeem_epoch_id,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        checkers::{EpochInvariantChecker, SyncModeInvariantChecker},
        ledger::Holder,
        vault::VaultRoles,
    };

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    fn vault() -> Vault {
        let roles = VaultRoles {
            authority: key(1),
            valuation_manager: key(2),
            curator: key(3),
        };
        let mut vault = Vault::new(key(9), roles, 3, 1_000, 1_700_000_000);
        vault
            .ledger_mut()
            .fund(Holder::Wallet(key(10)), 100_000)
            .unwrap();
        vault
    }

    fn push() -> Operation {
        Operation::UpdateNewTotalAssets { new_total_assets: 0 }
    }

    #[test]
    fn test_register_arms_runner() {
        let mut runner = AssertionRunner::new();
        assert_eq!(runner.phase(), Phase::Idle);

        runner
            .register(key(9), Arc::new(EpochInvariantChecker), Check::EpochParity)
            .unwrap();
        assert_eq!(runner.phase(), Phase::Armed);
    }

    #[test]
    fn test_register_rejects_missing_target() {
        let mut runner = AssertionRunner::new();
        let err = runner
            .register(Pubkey::default(), Arc::new(EpochInvariantChecker), Check::EpochParity)
            .unwrap_err();
        assert_eq!(err, EngineError::Configuration(ConfigurationError::MissingTarget));
        assert_eq!(runner.phase(), Phase::Idle);
    }

    #[test]
    fn test_register_rejects_unsupported_check() {
        let mut runner = AssertionRunner::new();
        let err = runner
            .register(key(9), Arc::new(SyncModeInvariantChecker), Check::EpochParity)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::UnsupportedCheck {
                checker: "sync_mode",
                check: Check::EpochParity
            })
        );
    }

    #[test]
    fn test_register_rejects_second_target() {
        let mut runner = AssertionRunner::new();
        runner
            .register(key(9), Arc::new(EpochInvariantChecker), Check::EpochParity)
            .unwrap();
        let err = runner
            .register(key(8), Arc::new(EpochInvariantChecker), Check::EpochParity)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::TargetMismatch {
                armed: key(9),
                target: key(8)
            })
        );
    }

    #[test]
    fn test_execute_requires_arming() {
        let mut runner = AssertionRunner::new();
        let mut vault = vault();
        let err = runner
            .execute(&mut vault, &Caller::signed(key(2)), push())
            .unwrap_err();
        assert_eq!(err, EngineError::Configuration(ConfigurationError::NotArmed(key(9))));
    }

    #[test]
    fn test_execute_checks_target() {
        let mut runner = AssertionRunner::new();
        runner
            .register(key(8), Arc::new(EpochInvariantChecker), Check::EpochParity)
            .unwrap();

        let mut vault = vault();
        let before = vault.clone();
        let err = runner
            .execute(&mut vault, &Caller::signed(key(2)), push())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::TargetMismatch {
                armed: key(8),
                target: key(9)
            })
        );
        assert_eq!(vault, before);
    }

    #[test]
    fn test_execute_rejects_operation_mismatch_before_running() {
        let mut runner = AssertionRunner::new();
        runner
            .register(key(9), Arc::new(SyncModeInvariantChecker), Check::SyncDepositMode)
            .unwrap();

        let mut vault = vault();
        let before = vault.clone();
        let err = runner
            .execute(&mut vault, &Caller::signed(key(2)), push())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::OperationMismatch {
                check: Check::SyncDepositMode,
                operation: OperationKind::UpdateNewTotalAssets
            })
        );
        assert_eq!(vault, before);
    }

    #[test]
    fn test_pass_commits_and_consumes_registrations() {
        let mut runner = AssertionRunner::new();
        let mut vault = vault();
        runner.arm_defaults(vault.key(), OperationKind::UpdateNewTotalAssets).unwrap();

        let evaluation = runner
            .execute(&mut vault, &Caller::signed(key(2)), push())
            .unwrap();
        assert!(evaluation.is_pass());
        assert_eq!(vault.state().new_total_assets, 0);
        assert_eq!(runner.phase(), Phase::Idle);

        let err = runner
            .execute(&mut vault, &Caller::signed(key(2)), push())
            .unwrap_err();
        assert_eq!(err, EngineError::Configuration(ConfigurationError::NotArmed(key(9))));
    }

    #[test]
    fn test_operation_error_is_not_masked() {
        let mut runner = AssertionRunner::new();
        let mut vault = vault();
        runner.arm_defaults(vault.key(), OperationKind::UpdateNewTotalAssets).unwrap();

        let before = vault.clone();
        let err = runner
            .execute(&mut vault, &Caller::signed(key(10)), push())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Operation(OperationError::Unauthorized {
                actor: key(10),
                role: crate::error::Role::ValuationManager
            })
        );
        assert_eq!(vault, before);
        assert_eq!(runner.phase(), Phase::Idle);
    }

    #[test]
    fn test_noop_transition_passes() {
        let mut runner = AssertionRunner::new();
        let mut vault = vault();
        runner.arm_defaults(vault.key(), OperationKind::ExpireTotalAssets).unwrap();

        let evaluation = runner
            .execute(&mut vault, &Caller::signed(key(3)), Operation::ExpireTotalAssets)
            .unwrap();
        assert!(evaluation.is_pass());
        assert!(evaluation.transition.is_noop());
        assert!(evaluation.into_result().is_ok());
    }
}
