use fuzz_accounts::*;
use svs_3::constants::{MAX_EPOCH_ID, NO_PENDING_VALUATION};
use svs_invariant_engine::{
    ledger::{Holder, Token},
    scenario::actor_key,
    AssertionRunner, Caller, EngineError, Operation, Vault, VaultRoles,
};
use trident_fuzz::fuzzing::*;
mod fuzz_accounts;

const DEPOSITORS: [&str; 3] = ["alice", "bob", "carol"];
const START: i64 = 1_700_000_000;

#[derive(FuzzTestMethods)]
struct FuzzTest {
    trident: Trident,
    fuzz_accounts: AccountAddresses,
    vault: Vault,
    runner: AssertionRunner,
}

#[flow_executor]
impl FuzzTest {
    fn new() -> Self {
        Self {
            trident: Trident::default(),
            fuzz_accounts: AccountAddresses::default(),
            vault: fresh_vault(1_000),
            runner: AssertionRunner::new(),
        }
    }

    #[init]
    fn start(&mut self) {
        // Lifespan 0 keeps the vault in async-only mode for the whole run
        let lifespan = [0u64, 60, 1_000][rand::random::<usize>() % 3];
        self.vault = fresh_vault(lifespan);
        self.runner = AssertionRunner::new();
    }

    /// Queue assets for the next deposit settlement
    #[flow]
    fn flow_request_deposit(&mut self) {
        let depositor = random_depositor();
        let assets = rand::random::<u64>() % 1_000_000 + 1;
        self.guard(depositor, Operation::RequestDeposit { assets });
    }

    /// Deposit at the live rate, valid only inside the NAV window
    #[flow]
    fn flow_sync_deposit(&mut self) {
        let depositor = random_depositor();
        let receiver = random_depositor();
        let assets = rand::random::<u64>() % 1_000_000 + 1;
        self.guard(
            depositor,
            Operation::SyncDeposit {
                assets,
                receiver: receiver.key(),
                min_shares_out: 0,
            },
        );
    }

    /// Queue a slice of a depositor's shares for redemption
    #[flow]
    fn flow_request_redeem(&mut self) {
        let depositor = random_depositor();
        let balance = self
            .vault
            .ledger()
            .balance(Token::Share, Holder::Wallet(depositor.key()));
        if balance == 0 {
            return;
        }
        let shares = rand::random::<u64>() % balance + 1;
        self.guard(depositor, Operation::RequestRedeem { shares });
    }

    /// Push a valuation drifting up to 10% around the settled NAV
    #[flow]
    fn flow_push_valuation(&mut self) {
        let total_assets = self.vault.state().total_assets;
        let drift = total_assets / 10;
        let new_total_assets = if drift == 0 {
            total_assets
        } else if rand::random::<bool>() {
            total_assets.saturating_add(rand::random::<u64>() % drift)
        } else {
            total_assets.saturating_sub(rand::random::<u64>() % drift)
        };
        self.guard(
            Caller::signed(actor_key("oracle")),
            Operation::UpdateNewTotalAssets { new_total_assets },
        );
    }

    #[flow]
    fn flow_settle_deposit(&mut self) {
        let valuation = self.settlement_valuation();
        self.guard(
            Caller::signed(actor_key("curator")),
            Operation::SettleDeposit { valuation },
        );
    }

    #[flow]
    fn flow_settle_redeem(&mut self) {
        let valuation = self.settlement_valuation();
        self.guard(
            Caller::signed(actor_key("curator")),
            Operation::SettleRedeem { valuation },
        );
    }

    #[flow]
    fn flow_claim(&mut self) {
        let depositor = random_depositor();
        let operation = if rand::random::<bool>() {
            Operation::ClaimShares
        } else {
            Operation::ClaimAssets
        };
        self.guard(depositor, operation);
    }

    /// Move the clock, sometimes past the NAV expiration
    #[flow]
    fn flow_warp(&mut self) {
        self.vault.warp((rand::random::<u64>() % 1_500) as i64);
    }

    #[flow]
    fn flow_expire(&mut self) {
        self.guard(
            Caller::signed(actor_key("curator")),
            Operation::ExpireTotalAssets,
        );
    }

    #[end]
    fn end(&mut self) {
        let state = self.vault.state();

        // Invariant: parity never changes
        assert_eq!(state.deposit_epoch_id % 2, 1, "Invariant: deposit epoch must be odd");
        assert_eq!(state.redeem_epoch_id % 2, 0, "Invariant: redeem epoch must be even");

        // Invariant: settled epochs trail the open ones
        for (last, current) in [
            (state.last_deposit_epoch_id_settled, state.deposit_epoch_id),
            (state.last_redeem_epoch_id_settled, state.redeem_epoch_id),
        ] {
            assert!(
                last == 0 || last + 2 <= current,
                "Invariant: last settled epoch {last} must trail {current}"
            );
        }
        assert!(state.deposit_epoch_id <= MAX_EPOCH_ID);

        // Invariant: a zero lifespan never opens the sync window
        if state.total_assets_lifespan == 0 {
            assert!(!self.vault.is_total_assets_valid());
        }

        // Invariant: share supply is fully held
        let held: u64 = self
            .vault
            .ledger()
            .iter()
            .filter(|(token, _, _)| *token == Token::Share)
            .map(|(_, _, amount)| amount)
            .sum();
        assert_eq!(held, self.vault.ledger().total_supply());
    }

    /// Run `operation` under the default checks. Vault rejections are
    /// expected; violations and misconfiguration are not.
    fn guard(&mut self, caller: Caller, operation: Operation) {
        if let Err(err) = self.runner.arm_defaults(self.vault.key(), operation.kind()) {
            panic!("failed to arm checks: {err}");
        }

        match self.runner.execute(&mut self.vault, &caller, operation) {
            Ok(evaluation) => {
                assert!(
                    evaluation.is_pass(),
                    "Invariant violated: {:?}",
                    evaluation.verdict
                );
            }
            Err(EngineError::Operation(_)) => {}
            Err(err) => panic!("runner error: {err}"),
        }
    }

    /// The valuation a settlement must present to be accepted.
    fn settlement_valuation(&self) -> u64 {
        let state = self.vault.state();
        if state.new_total_assets == NO_PENDING_VALUATION {
            state.total_assets
        } else {
            state.new_total_assets
        }
    }
}

fn random_depositor() -> Caller {
    Caller::signed(actor_key(DEPOSITORS[rand::random::<usize>() % DEPOSITORS.len()]))
}

fn fresh_vault(lifespan: u64) -> Vault {
    let roles = VaultRoles {
        authority: actor_key("admin"),
        valuation_manager: actor_key("oracle"),
        curator: actor_key("curator"),
    };
    let mut vault = Vault::new(actor_key("vault"), roles, 3, lifespan, START);
    for name in DEPOSITORS {
        vault
            .ledger_mut()
            .fund(Holder::Wallet(actor_key(name)), 1_000_000_000)
            .unwrap_or_else(|err| panic!("funding {name}: {err}"));
    }
    vault
}

fn main() {
    // Run 1000 iterations with up to 100 flows per iteration
    FuzzTest::fuzz(1000, 100);
}
