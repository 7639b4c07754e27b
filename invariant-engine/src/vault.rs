//! Host-side model of one SVS-3 vault.
//!
//! Every operation drives the same [`AsyncVault`] methods the program's
//! instruction handlers call, with the token CPIs replaced by a
//! [`TokenLedger`] and the sysvar clock replaced by a settable timestamp.

use std::collections::BTreeMap;

use anchor_lang::prelude::{error, Pubkey};
use svs_3::{
    error::VaultError,
    state::{AsyncVault, DepositRequest, EpochBinding, EpochData, RedeemRequest, SettleData},
};
use tracing::debug;

use crate::{
    error::{OperationError, Role},
    ledger::{Holder, Token, TokenLedger},
    operation::{Caller, Operation},
};

/// Keys holding the vault roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultRoles {
    pub authority: Pubkey,
    pub valuation_manager: Pubkey,
    pub curator: Pubkey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vault {
    key: Pubkey,
    state: AsyncVault,
    deposit_settles: BTreeMap<u64, SettleData>,
    redeem_settles: BTreeMap<u64, SettleData>,
    epochs: BTreeMap<u64, EpochData>,
    deposit_requests: BTreeMap<Pubkey, DepositRequest>,
    redeem_requests: BTreeMap<Pubkey, RedeemRequest>,
    ledger: TokenLedger,
    now: i64,
}

impl Vault {
    pub fn new(
        key: Pubkey,
        roles: VaultRoles,
        decimals_offset: u8,
        total_assets_lifespan: u64,
        now: i64,
    ) -> Self {
        let mut state = AsyncVault {
            authority: roles.authority,
            valuation_manager: roles.valuation_manager,
            curator: roles.curator,
            decimals_offset,
            ..Default::default()
        };
        state.reset_epochs(total_assets_lifespan);

        Self {
            key,
            state,
            deposit_settles: BTreeMap::new(),
            redeem_settles: BTreeMap::new(),
            epochs: BTreeMap::new(),
            deposit_requests: BTreeMap::new(),
            redeem_requests: BTreeMap::new(),
            ledger: TokenLedger::default(),
            now,
        }
    }

    pub fn key(&self) -> Pubkey {
        self.key
    }

    pub fn state(&self) -> &AsyncVault {
        &self.state
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    /// Balances outside the vault's control, e.g. funding depositor wallets.
    pub fn ledger_mut(&mut self) -> &mut TokenLedger {
        &mut self.ledger
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn warp(&mut self, seconds: i64) {
        self.now = self.now.saturating_add(seconds);
    }

    pub fn is_total_assets_valid(&self) -> bool {
        self.state.is_total_assets_valid(self.now)
    }

    pub fn deposit_settle(&self, settle_id: u64) -> Option<&SettleData> {
        self.deposit_settles.get(&settle_id)
    }

    pub fn redeem_settle(&self, settle_id: u64) -> Option<&SettleData> {
        self.redeem_settles.get(&settle_id)
    }

    pub fn deposit_settles(&self) -> impl Iterator<Item = &SettleData> {
        self.deposit_settles.values()
    }

    pub fn redeem_settles(&self) -> impl Iterator<Item = &SettleData> {
        self.redeem_settles.values()
    }

    pub fn epoch(&self, epoch_id: u64) -> Option<&EpochData> {
        self.epochs.get(&epoch_id)
    }

    pub fn deposit_request(&self, owner: &Pubkey) -> Option<&DepositRequest> {
        self.deposit_requests.get(owner)
    }

    pub fn redeem_request(&self, owner: &Pubkey) -> Option<&RedeemRequest> {
        self.redeem_requests.get(owner)
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut AsyncVault {
        &mut self.state
    }

    /// Apply `operation` on behalf of `caller`.
    ///
    /// On error the vault may be partially updated; callers that need
    /// atomicity apply to a clone.
    pub fn apply(&mut self, caller: &Caller, operation: &Operation) -> Result<(), OperationError> {
        if let Some(role) = operation.required_role() {
            self.authorize(caller, role)?;
        }

        debug!(
            vault = %self.key,
            caller = %caller.key(),
            operation = %operation.kind(),
            now = self.now,
            "Applying operation"
        );

        match *operation {
            Operation::UpdateNewTotalAssets { new_total_assets } => {
                self.update_new_total_assets(new_total_assets)
            }
            Operation::SettleDeposit { valuation } => self.settle_deposit(valuation),
            Operation::SettleRedeem { valuation } => self.settle_redeem(valuation),
            Operation::SyncDeposit {
                assets,
                receiver,
                min_shares_out,
            } => self.sync_deposit(caller, assets, receiver, min_shares_out),
            Operation::RequestDeposit { assets } => self.request_deposit(caller, assets),
            Operation::RequestRedeem { shares } => self.request_redeem(caller, shares),
            Operation::ClaimShares => self.claim_shares(caller),
            Operation::ClaimAssets => self.claim_assets(caller),
            Operation::UpdateTotalAssetsLifespan { lifespan } => {
                self.state.update_total_assets_lifespan(lifespan);
                Ok(())
            }
            Operation::ExpireTotalAssets => {
                self.state.expire_total_assets();
                Ok(())
            }
        }
    }

    fn authorize(&self, caller: &Caller, role: Role) -> Result<(), OperationError> {
        let holder = match role {
            Role::ValuationManager => self.state.valuation_manager,
            Role::Curator => self.state.curator,
        };
        if caller.key() != holder {
            return Err(OperationError::Unauthorized {
                actor: caller.key(),
                role,
            });
        }
        Ok(())
    }

    fn update_new_total_assets(&mut self, new_total_assets: u64) -> Result<(), OperationError> {
        let pending_assets = self.ledger.balance(Token::Asset, Holder::PendingSilo);
        let pending_shares = self.ledger.balance(Token::Share, Holder::PendingSilo);

        let push = self
            .state
            .update_new_total_assets(new_total_assets, pending_assets, pending_shares)?;

        if let Some(binding) = push.deposit {
            self.bind_epoch(&binding);
            let record = self.deposit_settles.entry(binding.settle_id).or_default();
            record.open(self.key, binding.settle_id, 0);
            record.pending_assets = binding.pending;
        }

        if let Some(binding) = push.redeem {
            self.bind_epoch(&binding);
            let record = self.redeem_settles.entry(binding.settle_id).or_default();
            record.open(self.key, binding.settle_id, 0);
            record.pending_shares = binding.pending;
        }

        Ok(())
    }

    fn bind_epoch(&mut self, binding: &EpochBinding) {
        self.epochs
            .entry(binding.epoch_id)
            .or_default()
            .bind(self.key, binding, 0);
    }

    fn settle_deposit(&mut self, valuation: u64) -> Result<(), OperationError> {
        let settle_id = self.state.deposit_settle_id;
        let mut record = self
            .deposit_settles
            .get(&settle_id)
            .cloned()
            .unwrap_or_else(|| self.empty_record(settle_id));

        let settlement = self.state.settle_deposit(
            valuation,
            &mut record,
            self.ledger.total_supply(),
            self.now,
        )?;
        self.deposit_settles.insert(settle_id, record);

        self.ledger.transfer(
            Token::Asset,
            Holder::PendingSilo,
            Holder::Safe,
            settlement.assets,
        )?;
        self.ledger
            .mint_shares(Holder::Claimable, settlement.shares)?;

        debug!(
            settle_id = settlement.settle_id,
            epoch_id = settlement.epoch_id,
            assets = settlement.assets,
            shares = settlement.shares,
            "Deposit epoch settled"
        );
        Ok(())
    }

    fn settle_redeem(&mut self, valuation: u64) -> Result<(), OperationError> {
        let settle_id = self.state.redeem_settle_id;
        let mut record = self
            .redeem_settles
            .get(&settle_id)
            .cloned()
            .unwrap_or_else(|| self.empty_record(settle_id));

        let settlement = self.state.settle_redeem(
            valuation,
            &mut record,
            self.ledger.total_supply(),
            self.ledger.balance(Token::Asset, Holder::Safe),
            self.now,
        )?;
        self.redeem_settles.insert(settle_id, record);

        self.ledger
            .burn_shares(Holder::PendingSilo, settlement.shares)?;
        self.ledger.transfer(
            Token::Asset,
            Holder::Safe,
            Holder::Claimable,
            settlement.assets,
        )?;

        debug!(
            settle_id = settlement.settle_id,
            epoch_id = settlement.epoch_id,
            assets = settlement.assets,
            shares = settlement.shares,
            "Redeem epoch settled"
        );
        Ok(())
    }

    fn empty_record(&self, settle_id: u64) -> SettleData {
        let mut record = SettleData::default();
        record.open(self.key, settle_id, 0);
        record
    }

    fn sync_deposit(
        &mut self,
        caller: &Caller,
        assets: u64,
        receiver: Pubkey,
        min_shares_out: u64,
    ) -> Result<(), OperationError> {
        let shares = self.state.sync_deposit(
            assets,
            self.ledger.total_supply(),
            min_shares_out,
            self.now,
        )?;

        self.ledger.transfer(
            Token::Asset,
            Holder::Wallet(caller.key()),
            Holder::Safe,
            assets,
        )?;
        self.ledger.mint_shares(Holder::Wallet(receiver), shares)?;
        Ok(())
    }

    fn request_deposit(&mut self, caller: &Caller, assets: u64) -> Result<(), OperationError> {
        let owner = caller.key();
        let mut request = self
            .deposit_requests
            .get(&owner)
            .cloned()
            .unwrap_or_default();

        self.state
            .request_deposit(&mut request, owner, assets, self.now)?;
        request.vault = self.key;

        self.ledger.transfer(
            Token::Asset,
            Holder::Wallet(owner),
            Holder::PendingSilo,
            assets,
        )?;
        self.deposit_requests.insert(owner, request);
        Ok(())
    }

    fn request_redeem(&mut self, caller: &Caller, shares: u64) -> Result<(), OperationError> {
        let owner = caller.key();
        if self.ledger.balance(Token::Share, Holder::Wallet(owner)) < shares {
            return Err(error!(VaultError::InsufficientShares).into());
        }

        let mut request = self
            .redeem_requests
            .get(&owner)
            .cloned()
            .unwrap_or_default();

        self.state.request_redeem(&mut request, owner, shares)?;
        request.vault = self.key;

        self.ledger.transfer(
            Token::Share,
            Holder::Wallet(owner),
            Holder::PendingSilo,
            shares,
        )?;
        self.redeem_requests.insert(owner, request);
        Ok(())
    }

    fn claim_shares(&mut self, caller: &Caller) -> Result<(), OperationError> {
        let owner = caller.key();
        let mut request = self
            .deposit_requests
            .get(&owner)
            .cloned()
            .unwrap_or_default();
        let epoch = self.epochs.get(&request.epoch_id).cloned().unwrap_or_default();
        let record = self
            .deposit_settles
            .get(&epoch.settle_id)
            .cloned()
            .unwrap_or_default();

        let shares = self.state.claim_shares(&mut request, &epoch, &record)?;

        self.ledger.transfer(
            Token::Share,
            Holder::Claimable,
            Holder::Wallet(owner),
            shares,
        )?;
        self.deposit_requests.insert(owner, request);
        Ok(())
    }

    fn claim_assets(&mut self, caller: &Caller) -> Result<(), OperationError> {
        let owner = caller.key();
        let mut request = self
            .redeem_requests
            .get(&owner)
            .cloned()
            .unwrap_or_default();
        let epoch = self.epochs.get(&request.epoch_id).cloned().unwrap_or_default();
        let record = self
            .redeem_settles
            .get(&epoch.settle_id)
            .cloned()
            .unwrap_or_default();

        let assets = self.state.claim_assets(&mut request, &epoch, &record)?;

        self.ledger.transfer(
            Token::Asset,
            Holder::Claimable,
            Holder::Wallet(owner),
            assets,
        )?;
        self.redeem_requests.insert(owner, request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: i64 = 1_700_000_000;

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    fn setup(lifespan: u64) -> Vault {
        let roles = VaultRoles {
            authority: key(1),
            valuation_manager: key(2),
            curator: key(3),
        };
        let mut vault = Vault::new(key(9), roles, 3, lifespan, START);
        vault.ledger_mut().fund(Holder::Wallet(key(10)), 1_000_000).unwrap();
        vault.ledger_mut().fund(Holder::Wallet(key(11)), 1_000_000).unwrap();
        vault
    }

    fn manager() -> Caller {
        Caller::signed(key(2))
    }

    fn curator() -> Caller {
        Caller::signed(key(3))
    }

    fn alice() -> Caller {
        Caller::signed(key(10))
    }

    /// Request, push and settle one deposit epoch for alice.
    fn settle_first_deposit(vault: &mut Vault, assets: u64) {
        vault
            .apply(&alice(), &Operation::RequestDeposit { assets })
            .unwrap();
        vault
            .apply(&manager(), &Operation::UpdateNewTotalAssets { new_total_assets: 0 })
            .unwrap();
        vault
            .apply(&curator(), &Operation::SettleDeposit { valuation: 0 })
            .unwrap();
    }

    #[test]
    fn test_new_vault_state() {
        let vault = setup(1_000);
        assert_eq!(vault.state().deposit_epoch_id, 1);
        assert_eq!(vault.state().redeem_epoch_id, 2);
        assert_eq!(vault.state().last_deposit_epoch_id_settled, 0);
        assert!(!vault.is_total_assets_valid());
    }

    #[test]
    fn test_role_gating() {
        let mut vault = setup(1_000);
        let err = vault
            .apply(&alice(), &Operation::UpdateNewTotalAssets { new_total_assets: 0 })
            .unwrap_err();
        assert_eq!(
            err,
            OperationError::Unauthorized {
                actor: key(10),
                role: Role::ValuationManager
            }
        );

        let err = vault
            .apply(&manager(), &Operation::ExpireTotalAssets)
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::Unauthorized { role: Role::Curator, .. }
        ));
    }

    #[test]
    fn test_deposit_settlement_moves_tokens() {
        let mut vault = setup(1_000);
        settle_first_deposit(&mut vault, 10_000);

        let ledger = vault.ledger();
        assert_eq!(ledger.balance(Token::Asset, Holder::PendingSilo), 0);
        assert_eq!(ledger.balance(Token::Asset, Holder::Safe), 10_000);
        assert_eq!(ledger.balance(Token::Share, Holder::Claimable), 10_000_000);

        let state = vault.state();
        assert_eq!(state.total_assets, 10_000);
        assert_eq!(state.deposit_epoch_id, 3);
        assert_eq!(state.last_deposit_epoch_id_settled, 1);
        assert_eq!(state.deposit_settle_id, 1);
        assert_eq!(state.total_assets_expiration, START + 1_000);
        assert!(vault.is_total_assets_valid());

        let record = vault.deposit_settle(0).unwrap();
        assert_eq!(record.pending_assets, 10_000);
        assert_eq!(record.total_assets, 0);
        assert_eq!(record.total_supply, 0);
        assert_eq!(vault.epoch(1).unwrap().settle_id, 0);
    }

    #[test]
    fn test_claim_shares_after_settlement() {
        let mut vault = setup(1_000);
        settle_first_deposit(&mut vault, 10_000);

        vault.apply(&alice(), &Operation::ClaimShares).unwrap();

        assert_eq!(
            vault.ledger().balance(Token::Share, Holder::Wallet(key(10))),
            10_000_000
        );
        assert_eq!(vault.ledger().balance(Token::Share, Holder::Claimable), 0);
        assert_eq!(vault.deposit_request(&key(10)).unwrap().assets, 0);
    }

    #[test]
    fn test_claim_before_settlement_rejected() {
        let mut vault = setup(1_000);
        vault
            .apply(&alice(), &Operation::RequestDeposit { assets: 10_000 })
            .unwrap();

        let err = vault.apply(&alice(), &Operation::ClaimShares).unwrap_err();
        assert!(err.is_vault_error(VaultError::RequestNotSettled));
    }

    #[test]
    fn test_redeem_round_trip() {
        let mut vault = setup(1_000);
        settle_first_deposit(&mut vault, 10_000);
        vault.apply(&alice(), &Operation::ClaimShares).unwrap();

        vault
            .apply(&alice(), &Operation::RequestRedeem { shares: 5_000_001 })
            .unwrap();
        vault
            .apply(&manager(), &Operation::UpdateNewTotalAssets { new_total_assets: 10_000 })
            .unwrap();
        assert_eq!(vault.state().redeem_epoch_id, 4);
        assert_eq!(vault.state().deposit_epoch_id, 3);

        vault
            .apply(&curator(), &Operation::SettleRedeem { valuation: 10_000 })
            .unwrap();
        assert_eq!(vault.state().last_redeem_epoch_id_settled, 2);
        assert_eq!(vault.ledger().total_supply(), 4_999_999);

        vault.apply(&alice(), &Operation::ClaimAssets).unwrap();
        // 5_000_001 * 10_001 / 10_001_000 = 5_000.001, floored
        assert_eq!(
            vault.ledger().balance(Token::Asset, Holder::Wallet(key(10))),
            1_000_000 - 10_000 + 5_000
        );
    }

    #[test]
    fn test_redeem_needs_share_balance() {
        let mut vault = setup(1_000);
        let err = vault
            .apply(&alice(), &Operation::RequestRedeem { shares: 1 })
            .unwrap_err();
        assert!(err.is_vault_error(VaultError::InsufficientShares));
    }

    #[test]
    fn test_warp_expires_nav() {
        let mut vault = setup(1_000);
        settle_first_deposit(&mut vault, 10_000);
        assert!(vault.is_total_assets_valid());

        vault.warp(999);
        assert!(vault.is_total_assets_valid());
        vault.warp(1);
        assert!(!vault.is_total_assets_valid());
    }
}
