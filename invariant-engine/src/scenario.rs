//! JSON scenarios replayed against a fresh vault under the assertion runner.

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    checkers::{checker_for, default_checks, Check},
    config::EngineConfig,
    error::{EngineError, Result, Violation},
    ledger::Holder,
    operation::{Caller, Operation, OperationKind},
    runner::{AssertionRunner, Verdict},
    snapshot::VaultSnapshot,
    vault::{Vault, VaultRoles},
};

/// Deterministic key for a named actor.
pub fn actor_key(name: &str) -> Pubkey {
    Pubkey::new_from_array(*blake3::hash(name.as_bytes()).as_bytes())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "default_vault_name")]
    pub vault: String,
    pub roles: RoleNames,
    /// NAV lifespan, falls back to the engine default
    #[serde(default)]
    pub lifespan: Option<u64>,
    #[serde(default)]
    pub decimals_offset: Option<u8>,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub funding: Vec<Funding>,
    pub steps: Vec<Step>,
}

fn default_vault_name() -> String {
    "vault".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleNames {
    pub authority: String,
    pub valuation_manager: String,
    pub curator: String,
}

/// Assets credited to an actor's wallet before the first step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Funding {
    pub actor: String,
    pub assets: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Advance the vault clock
    Warp { seconds: i64 },
    Execute {
        actor: String,
        operation: StepOperation,
        /// Check names; empty arms the defaults when enabled
        #[serde(default)]
        checks: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOperation {
    UpdateNewTotalAssets {
        new_total_assets: u64,
    },
    SettleDeposit {
        valuation: u64,
    },
    SettleRedeem {
        valuation: u64,
    },
    SyncDeposit {
        assets: u64,
        /// Defaults to the depositing actor
        #[serde(default)]
        receiver: Option<String>,
        #[serde(default)]
        min_shares_out: u64,
    },
    RequestDeposit {
        assets: u64,
    },
    RequestRedeem {
        shares: u64,
    },
    ClaimShares,
    ClaimAssets,
    UpdateTotalAssetsLifespan {
        lifespan: u64,
    },
    ExpireTotalAssets,
}

impl StepOperation {
    pub fn resolve(&self, actor: &str) -> Operation {
        match self {
            StepOperation::UpdateNewTotalAssets { new_total_assets } => {
                Operation::UpdateNewTotalAssets {
                    new_total_assets: *new_total_assets,
                }
            }
            StepOperation::SettleDeposit { valuation } => Operation::SettleDeposit {
                valuation: *valuation,
            },
            StepOperation::SettleRedeem { valuation } => Operation::SettleRedeem {
                valuation: *valuation,
            },
            StepOperation::SyncDeposit {
                assets,
                receiver,
                min_shares_out,
            } => Operation::SyncDeposit {
                assets: *assets,
                receiver: actor_key(receiver.as_deref().unwrap_or(actor)),
                min_shares_out: *min_shares_out,
            },
            StepOperation::RequestDeposit { assets } => {
                Operation::RequestDeposit { assets: *assets }
            }
            StepOperation::RequestRedeem { shares } => Operation::RequestRedeem { shares: *shares },
            StepOperation::ClaimShares => Operation::ClaimShares,
            StepOperation::ClaimAssets => Operation::ClaimAssets,
            StepOperation::UpdateTotalAssetsLifespan { lifespan } => {
                Operation::UpdateTotalAssetsLifespan {
                    lifespan: *lifespan,
                }
            }
            StepOperation::ExpireTotalAssets => Operation::ExpireTotalAssets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Warped { now: i64 },
    Passed { checks: Vec<Check> },
    Violated { check: Check, violation: Violation },
    /// The vault refused the operation
    Rejected { error: String },
    /// Executed with no checks armed
    Unguarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationKind>,
    #[serde(flatten)]
    pub status: StepStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    pub final_state: VaultSnapshot,
}

impl ReplayReport {
    pub fn violations(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps
            .iter()
            .filter(|step| matches!(step.status, StepStatus::Violated { .. }))
    }

    pub fn has_violations(&self) -> bool {
        self.violations().next().is_some()
    }
}

/// Replay `scenario` on a fresh vault.
///
/// Vault rejections are recorded and replay continues. Configuration errors
/// abort the replay.
pub fn replay(scenario: &Scenario, config: &EngineConfig) -> Result<ReplayReport> {
    let roles = VaultRoles {
        authority: actor_key(&scenario.roles.authority),
        valuation_manager: actor_key(&scenario.roles.valuation_manager),
        curator: actor_key(&scenario.roles.curator),
    };
    let mut vault = Vault::new(
        actor_key(&scenario.vault),
        roles,
        scenario.decimals_offset.unwrap_or(config.decimals_offset),
        scenario.lifespan.unwrap_or(config.default_lifespan),
        scenario.start_time,
    );
    for funding in &scenario.funding {
        vault
            .ledger_mut()
            .fund(Holder::Wallet(actor_key(&funding.actor)), funding.assets)?;
    }

    info!(
        vault = %vault.key(),
        steps = scenario.steps.len(),
        "Replaying scenario"
    );

    let mut runner = AssertionRunner::new();
    let mut steps = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = match step {
            Step::Warp { seconds } => {
                vault.warp(*seconds);
                StepOutcome {
                    index,
                    operation: None,
                    status: StepStatus::Warped { now: vault.now() },
                }
            }
            Step::Execute {
                actor,
                operation,
                checks,
            } => {
                let operation = operation.resolve(actor);
                let caller = Caller::signed(actor_key(actor));
                let checks = select_checks(checks, operation.kind(), config)?;
                let status = if checks.is_empty() {
                    execute_unguarded(&mut vault, &caller, &operation)
                } else {
                    execute_guarded(&mut runner, &mut vault, &caller, operation.clone(), checks)?
                };
                StepOutcome {
                    index,
                    operation: Some(operation.kind()),
                    status,
                }
            }
        };

        let violated = matches!(outcome.status, StepStatus::Violated { .. });
        steps.push(outcome);
        if violated && config.stop_on_violation {
            warn!(step = index, "Stopping replay at first violation");
            break;
        }
    }

    Ok(ReplayReport {
        steps,
        final_state: VaultSnapshot::capture(&vault, None),
    })
}

fn select_checks(
    names: &[String],
    kind: OperationKind,
    config: &EngineConfig,
) -> Result<Vec<Check>> {
    if names.is_empty() && config.arm_defaults {
        return Ok(default_checks(kind).to_vec());
    }
    names
        .iter()
        .map(|name| name.parse::<Check>().map_err(EngineError::from))
        .collect()
}

fn execute_guarded(
    runner: &mut AssertionRunner,
    vault: &mut Vault,
    caller: &Caller,
    operation: Operation,
    checks: Vec<Check>,
) -> Result<StepStatus> {
    for &check in &checks {
        if let Err(err) = runner.register(vault.key(), checker_for(check), check) {
            runner.disarm();
            return Err(err);
        }
    }

    match runner.execute(vault, caller, operation) {
        Ok(evaluation) => Ok(match evaluation.verdict {
            Verdict::Pass => StepStatus::Passed { checks },
            Verdict::Violated { check, violation } => StepStatus::Violated { check, violation },
        }),
        Err(EngineError::Operation(err)) => Ok(StepStatus::Rejected {
            error: err.to_string(),
        }),
        Err(err) => Err(err),
    }
}

fn execute_unguarded(vault: &mut Vault, caller: &Caller, operation: &Operation) -> StepStatus {
    let mut staged = vault.clone();
    match staged.apply(caller, operation) {
        Ok(()) => {
            *vault = staged;
            StepStatus::Unguarded
        }
        Err(err) => StepStatus::Rejected {
            error: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, DepositMode};

    fn scenario(steps: serde_json::Value) -> Scenario {
        serde_json::from_value(serde_json::json!({
            "roles": {
                "authority": "admin",
                "valuation_manager": "oracle",
                "curator": "curator"
            },
            "start_time": 1_700_000_000,
            "funding": [
                { "actor": "alice", "assets": 1_000_000 },
                { "actor": "bob", "assets": 1_000_000 }
            ],
            "steps": steps
        }))
        .unwrap()
    }

    #[test]
    fn test_actor_keys_are_stable() {
        assert_eq!(actor_key("alice"), actor_key("alice"));
        assert_ne!(actor_key("alice"), actor_key("bob"));
        assert_ne!(actor_key("alice"), Pubkey::default());
    }

    #[test]
    fn test_full_cycle_passes() {
        let scenario = scenario(serde_json::json!([
            { "step": "execute", "actor": "alice", "operation": { "kind": "request_deposit", "assets": 10_000 } },
            { "step": "execute", "actor": "oracle", "operation": { "kind": "update_new_total_assets", "new_total_assets": 0 } },
            { "step": "execute", "actor": "curator", "operation": { "kind": "settle_deposit", "valuation": 0 } },
            { "step": "execute", "actor": "bob", "operation": { "kind": "sync_deposit", "assets": 10_000 } },
            { "step": "execute", "actor": "alice", "operation": { "kind": "claim_shares" } },
            { "step": "warp", "seconds": 1_000 },
            { "step": "execute", "actor": "bob", "operation": { "kind": "sync_deposit", "assets": 10_000 } }
        ]));

        let report = replay(&scenario, &EngineConfig::default()).unwrap();
        assert!(!report.has_violations());
        assert_eq!(report.steps.len(), 7);
        assert!(matches!(report.steps[3].status, StepStatus::Passed { .. }));
        assert_eq!(
            report.steps[5].status,
            StepStatus::Warped {
                now: 1_700_001_000
            }
        );
        assert!(matches!(report.steps[6].status, StepStatus::Rejected { .. }));
        assert_eq!(report.final_state.deposit_epoch_id, 3);
        assert_eq!(report.final_state.last_deposit_epoch_id_settled, 1);
        assert_eq!(report.final_state.total_assets, 20_000);
    }

    #[test]
    fn test_explicit_checks_are_armed() {
        let scenario = scenario(serde_json::json!([
            {
                "step": "execute",
                "actor": "alice",
                "operation": { "kind": "request_deposit", "assets": 10_000 },
                "checks": ["async_deposit_mode"]
            }
        ]));

        let report = replay(&scenario, &EngineConfig::default()).unwrap();
        assert_eq!(
            report.steps[0].status,
            StepStatus::Passed {
                checks: vec![Check::AsyncDepositMode]
            }
        );
    }

    #[test]
    fn test_unknown_check_aborts_replay() {
        let scenario = scenario(serde_json::json!([
            {
                "step": "execute",
                "actor": "alice",
                "operation": { "kind": "request_deposit", "assets": 10_000 },
                "checks": ["assertEpochParity"]
            }
        ]));

        let err = replay(&scenario, &EngineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Configuration(ConfigurationError::UnknownCheck(
                "assertEpochParity".to_string()
            ))
        );
    }

    #[test]
    fn test_mismatched_check_aborts_replay() {
        let scenario = scenario(serde_json::json!([
            {
                "step": "execute",
                "actor": "oracle",
                "operation": { "kind": "update_new_total_assets", "new_total_assets": 0 },
                "checks": ["sync_deposit_mode"]
            }
        ]));

        let err = replay(&scenario, &EngineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Configuration(ConfigurationError::OperationMismatch { .. })
        ));
    }

    #[test]
    fn test_unguarded_when_defaults_disabled() {
        let scenario = scenario(serde_json::json!([
            { "step": "execute", "actor": "alice", "operation": { "kind": "request_deposit", "assets": 10_000 } },
            { "step": "execute", "actor": "alice", "operation": { "kind": "request_deposit", "assets": 10 } }
        ]));
        let config = EngineConfig {
            arm_defaults: false,
            ..EngineConfig::default()
        };

        let report = replay(&scenario, &config).unwrap();
        assert_eq!(report.steps[0].status, StepStatus::Unguarded);
        assert!(matches!(report.steps[1].status, StepStatus::Rejected { .. }));
        assert_eq!(report.final_state.pending_silo_asset_balance, 10_000);
    }

    #[test]
    fn test_bundled_scenario_passes() {
        let scenario: Scenario =
            serde_json::from_str(include_str!("../scenarios/sync_window.json")).unwrap();

        let report = replay(&scenario, &EngineConfig::default()).unwrap();
        assert!(!report.has_violations());
        assert_eq!(report.steps.len(), scenario.steps.len());
        assert!(matches!(report.steps[6].status, StepStatus::Rejected { .. }));
        assert_eq!(report.final_state.deposit_epoch_id, 5);
        assert_eq!(report.final_state.last_deposit_epoch_id_settled, 3);
        assert_eq!(report.final_state.total_assets, 31_000);
        assert_eq!(
            report.final_state.total_assets_expiration,
            1_700_000_000 + 1_030 + 1_000
        );
    }

    #[test]
    fn test_report_serializes_flat_status() {
        let outcome = StepOutcome {
            index: 2,
            operation: Some(OperationKind::SyncDeposit),
            status: StepStatus::Violated {
                check: Check::SyncDepositMode,
                violation: Violation::Mode {
                    expected: DepositMode::Sync,
                },
            },
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "violated");
        assert_eq!(json["operation"], "sync_deposit");
        assert_eq!(json["check"], "sync_deposit_mode");
        assert_eq!(json["violation"]["kind"], "mode");
        assert_eq!(json["violation"]["expected"], "sync");
    }
}
