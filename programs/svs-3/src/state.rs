use anchor_lang::prelude::*;

use crate::{
    constants::{
        EPOCH_STEP, INITIAL_DEPOSIT_EPOCH_ID, INITIAL_REDEEM_EPOCH_ID, MAX_EPOCH_ID,
        MIN_DEPOSIT_AMOUNT, NO_PENDING_VALUATION, VAULT_SEED,
    },
    error::VaultError,
    math::ExchangeRate,
};

#[account]
#[derive(Default, Debug, PartialEq, Eq)]
pub struct AsyncVault {
    /// Vault admin who can rotate roles
    pub authority: Pubkey,
    /// Pushes new total assets (valuation authority)
    pub valuation_manager: Pubkey,
    /// Settles epochs and owns the safe (settlement executor)
    pub curator: Pubkey,
    /// Underlying asset mint
    pub asset_mint: Pubkey,
    /// Token-2022 shares mint
    pub shares_mint: Pubkey,
    /// Curator-owned custody account receiving deposited assets
    pub safe_asset_account: Pubkey,
    /// Assets of deposit requests awaiting settlement
    pub pending_silo_assets: Pubkey,
    /// Shares of redeem requests awaiting settlement
    pub pending_silo_shares: Pubkey,
    /// Assets of settled redeem requests awaiting claim
    pub claimable_assets: Pubkey,
    /// Shares of settled deposit requests awaiting claim
    pub claimable_shares: Pubkey,
    /// Settled NAV
    pub total_assets: u64,
    /// Last pushed valuation, NO_PENDING_VALUATION once adopted
    pub new_total_assets: u64,
    /// Active deposit epoch (always odd)
    pub deposit_epoch_id: u64,
    /// Active redeem epoch (always even)
    pub redeem_epoch_id: u64,
    pub deposit_settle_id: u64,
    pub redeem_settle_id: u64,
    /// 0 until the first deposit settlement
    pub last_deposit_epoch_id_settled: u64,
    /// 0 until the first redeem settlement
    pub last_redeem_epoch_id_settled: u64,
    /// Seconds a settled NAV stays valid, 0 disables synchronous deposits
    pub total_assets_lifespan: u64,
    /// Unix timestamp after which NAV is stale
    pub total_assets_expiration: i64,
    /// Virtual offset exponent (9 - asset_decimals)
    pub decimals_offset: u8,
    /// PDA bump seed
    pub bump: u8,
    /// Unique vault identifier (allows multiple vaults per asset)
    pub vault_id: u64,
    /// Assets deposited synchronously since the pending valuation was pushed
    pub sync_assets_since_push: u64,
    /// Reserved for future upgrades
    pub _reserved: [u8; 24],
}

/// Epoch binding produced by a valuation push for one side.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EpochBinding {
    /// The epoch that was closed by the push
    pub epoch_id: u64,
    pub settle_id: u64,
    /// Pending assets (deposit side) or shares (redeem side)
    pub pending: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ValuationPush {
    pub deposit: Option<EpochBinding>,
    pub redeem: Option<EpochBinding>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DepositSettlement {
    pub settle_id: u64,
    pub epoch_id: u64,
    pub assets: u64,
    pub shares: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RedeemSettlement {
    pub settle_id: u64,
    pub epoch_id: u64,
    pub assets: u64,
    pub shares: u64,
}

impl AsyncVault {
    pub const LEN: usize = 8 +  // discriminator
        32 * 10 + // role and token account keys
        8 +   // total_assets
        8 +   // new_total_assets
        8 +   // deposit_epoch_id
        8 +   // redeem_epoch_id
        8 +   // deposit_settle_id
        8 +   // redeem_settle_id
        8 +   // last_deposit_epoch_id_settled
        8 +   // last_redeem_epoch_id_settled
        8 +   // total_assets_lifespan
        8 +   // total_assets_expiration
        1 +   // decimals_offset
        1 +   // bump
        8 +   // vault_id
        8 +   // sync_assets_since_push
        24; // _reserved

    pub const SEED_PREFIX: &'static [u8] = VAULT_SEED;

    /// Seed the epoch and settlement counters of a fresh vault.
    pub fn reset_epochs(&mut self, total_assets_lifespan: u64) {
        self.total_assets = 0;
        self.new_total_assets = NO_PENDING_VALUATION;
        self.sync_assets_since_push = 0;
        self.deposit_epoch_id = INITIAL_DEPOSIT_EPOCH_ID;
        self.redeem_epoch_id = INITIAL_REDEEM_EPOCH_ID;
        self.deposit_settle_id = 0;
        self.redeem_settle_id = 0;
        self.last_deposit_epoch_id_settled = 0;
        self.last_redeem_epoch_id_settled = 0;
        self.total_assets_lifespan = total_assets_lifespan;
        self.total_assets_expiration = 0;
    }

    /// NAV is valid strictly before its expiration and never with a zero lifespan.
    pub fn is_total_assets_valid(&self, now: i64) -> bool {
        self.total_assets_lifespan > 0 && now < self.total_assets_expiration
    }

    pub fn exchange_rate(&self, total_supply: u64) -> ExchangeRate {
        ExchangeRate::new(self.total_assets, total_supply, self.decimals_offset)
    }

    /// Record a new valuation and close every epoch that has pending flow.
    ///
    /// A side with pending flow is bound to its current settle id and its epoch
    /// advances by exactly [`EPOCH_STEP`]; a side without pending flow is left
    /// untouched. The pushed valuation already covers every earlier synchronous
    /// deposit.
    pub fn update_new_total_assets(
        &mut self,
        new_total_assets: u64,
        pending_assets: u64,
        pending_shares: u64,
    ) -> Result<ValuationPush> {
        require!(
            new_total_assets != NO_PENDING_VALUATION,
            VaultError::MathOverflow
        );

        let mut push = ValuationPush::default();

        if pending_assets > 0 {
            push.deposit = Some(EpochBinding {
                epoch_id: self.deposit_epoch_id,
                settle_id: self.deposit_settle_id,
                pending: pending_assets,
            });
            self.deposit_epoch_id = next_epoch(self.deposit_epoch_id)?;
        }

        if pending_shares > 0 {
            push.redeem = Some(EpochBinding {
                epoch_id: self.redeem_epoch_id,
                settle_id: self.redeem_settle_id,
                pending: pending_shares,
            });
            self.redeem_epoch_id = next_epoch(self.redeem_epoch_id)?;
        }

        self.new_total_assets = new_total_assets;
        self.sync_assets_since_push = 0;

        Ok(push)
    }

    /// Adopt the pushed valuation, or confirm the one already adopted.
    ///
    /// Synchronous deposits credited after the push are carried over on top
    /// of the pushed valuation.
    fn adopt_valuation(&mut self, valuation: u64) -> Result<()> {
        if self.new_total_assets == NO_PENDING_VALUATION {
            require!(valuation == self.total_assets, VaultError::StaleValuation);
            return Ok(());
        }

        require!(
            valuation == self.new_total_assets,
            VaultError::StaleValuation
        );
        self.total_assets = valuation
            .checked_add(self.sync_assets_since_push)
            .ok_or(VaultError::MathOverflow)?;
        self.new_total_assets = NO_PENDING_VALUATION;
        self.sync_assets_since_push = 0;
        Ok(())
    }

    /// Restart the NAV validity window. A zero lifespan leaves the expiration untouched.
    pub fn refresh_expiration(&mut self, now: i64) -> Result<()> {
        if self.total_assets_lifespan == 0 {
            return Ok(());
        }

        let lifespan =
            i64::try_from(self.total_assets_lifespan).map_err(|_| error!(VaultError::MathOverflow))?;
        self.total_assets_expiration = now.checked_add(lifespan).ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Settle the pending deposit record at the current deposit settle id.
    ///
    /// The record keeps the totals the pending assets were priced at; the
    /// caller mints `shares` to the claimable account and moves `assets`
    /// from the pending silo to the safe.
    pub fn settle_deposit(
        &mut self,
        valuation: u64,
        record: &mut SettleData,
        total_supply: u64,
        now: i64,
    ) -> Result<DepositSettlement> {
        require!(
            record.settle_id == self.deposit_settle_id,
            VaultError::EpochMismatch
        );
        require!(record.pending_assets > 0, VaultError::NothingToSettle);

        self.adopt_valuation(valuation)?;

        let assets = record.pending_assets;
        let shares = self
            .exchange_rate(total_supply)
            .to_shares(assets)?;

        record.total_assets = self.total_assets;
        record.total_supply = total_supply;

        self.total_assets = self
            .total_assets
            .checked_add(assets)
            .ok_or(VaultError::MathOverflow)?;
        self.last_deposit_epoch_id_settled = self
            .deposit_epoch_id
            .checked_sub(EPOCH_STEP)
            .ok_or(VaultError::MathOverflow)?;
        self.deposit_settle_id = self
            .deposit_settle_id
            .checked_add(1)
            .ok_or(VaultError::MathOverflow)?;
        self.refresh_expiration(now)?;

        Ok(DepositSettlement {
            settle_id: record.settle_id,
            epoch_id: self.last_deposit_epoch_id_settled,
            assets,
            shares,
        })
    }

    /// Settle the pending redeem record at the current redeem settle id.
    ///
    /// The caller burns `shares` from the pending share silo and moves
    /// `assets` from the safe to the claimable account.
    pub fn settle_redeem(
        &mut self,
        valuation: u64,
        record: &mut SettleData,
        total_supply: u64,
        safe_balance: u64,
        now: i64,
    ) -> Result<RedeemSettlement> {
        require!(
            record.settle_id == self.redeem_settle_id,
            VaultError::EpochMismatch
        );
        require!(record.pending_shares > 0, VaultError::NothingToSettle);

        self.adopt_valuation(valuation)?;

        let shares = record.pending_shares;
        let assets = self
            .exchange_rate(total_supply)
            .to_assets(shares)?;
        require!(assets <= safe_balance, VaultError::InsufficientAssets);

        record.total_assets = self.total_assets;
        record.total_supply = total_supply;

        self.total_assets = self
            .total_assets
            .checked_sub(assets)
            .ok_or(VaultError::InsufficientAssets)?;
        self.last_redeem_epoch_id_settled = self
            .redeem_epoch_id
            .checked_sub(EPOCH_STEP)
            .ok_or(VaultError::MathOverflow)?;
        self.redeem_settle_id = self
            .redeem_settle_id
            .checked_add(1)
            .ok_or(VaultError::MathOverflow)?;
        self.refresh_expiration(now)?;

        Ok(RedeemSettlement {
            settle_id: record.settle_id,
            epoch_id: self.last_redeem_epoch_id_settled,
            assets,
            shares,
        })
    }

    /// Deposit at the live rate while NAV is valid. Returns the shares to mint.
    pub fn sync_deposit(
        &mut self,
        assets: u64,
        total_supply: u64,
        min_shares_out: u64,
        now: i64,
    ) -> Result<u64> {
        require!(assets > 0, VaultError::ZeroAmount);
        require!(assets >= MIN_DEPOSIT_AMOUNT, VaultError::DepositTooSmall);
        require!(
            self.is_total_assets_valid(now),
            VaultError::AsyncDepositOnly
        );

        let shares = self
            .exchange_rate(total_supply)
            .to_shares(assets)?;
        require!(shares > 0, VaultError::ZeroAmount);
        require!(shares >= min_shares_out, VaultError::SlippageExceeded);

        self.total_assets = self
            .total_assets
            .checked_add(assets)
            .ok_or(VaultError::MathOverflow)?;
        if self.new_total_assets != NO_PENDING_VALUATION {
            self.sync_assets_since_push = self
                .sync_assets_since_push
                .checked_add(assets)
                .ok_or(VaultError::MathOverflow)?;
        }

        Ok(shares)
    }

    /// Bind a deposit request to the active deposit epoch while NAV is stale.
    pub fn request_deposit(
        &self,
        request: &mut DepositRequest,
        owner: Pubkey,
        assets: u64,
        now: i64,
    ) -> Result<u64> {
        require!(assets > 0, VaultError::ZeroAmount);
        require!(assets >= MIN_DEPOSIT_AMOUNT, VaultError::DepositTooSmall);
        require!(
            !self.is_total_assets_valid(now),
            VaultError::SyncDepositOnly
        );
        require!(
            request.assets == 0 || request.epoch_id == self.deposit_epoch_id,
            VaultError::RequestNotClaimed
        );

        request.owner = owner;
        request.epoch_id = self.deposit_epoch_id;
        request.assets = request
            .assets
            .checked_add(assets)
            .ok_or(VaultError::MathOverflow)?;

        Ok(self.deposit_epoch_id)
    }

    /// Bind a redeem request to the active redeem epoch. Always allowed.
    pub fn request_redeem(
        &self,
        request: &mut RedeemRequest,
        owner: Pubkey,
        shares: u64,
    ) -> Result<u64> {
        require!(shares > 0, VaultError::ZeroAmount);
        require!(
            request.shares == 0 || request.epoch_id == self.redeem_epoch_id,
            VaultError::RequestNotClaimed
        );

        request.owner = owner;
        request.epoch_id = self.redeem_epoch_id;
        request.shares = request
            .shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;

        Ok(self.redeem_epoch_id)
    }

    /// Convert a settled deposit request into shares at its settlement rate.
    pub fn claim_shares(
        &self,
        request: &mut DepositRequest,
        epoch: &EpochData,
        record: &SettleData,
    ) -> Result<u64> {
        require!(request.assets > 0, VaultError::ZeroAmount);
        require!(
            settled(request.epoch_id, self.last_deposit_epoch_id_settled),
            VaultError::RequestNotSettled
        );
        require!(
            epoch.epoch_id == request.epoch_id && record.settle_id == epoch.settle_id,
            VaultError::EpochMismatch
        );

        let shares = ExchangeRate::at_settlement(record, self.decimals_offset)
            .to_shares(request.assets)?;
        request.assets = 0;

        Ok(shares)
    }

    /// Convert a settled redeem request into assets at its settlement rate.
    pub fn claim_assets(
        &self,
        request: &mut RedeemRequest,
        epoch: &EpochData,
        record: &SettleData,
    ) -> Result<u64> {
        require!(request.shares > 0, VaultError::ZeroAmount);
        require!(
            settled(request.epoch_id, self.last_redeem_epoch_id_settled),
            VaultError::RequestNotSettled
        );
        require!(
            epoch.epoch_id == request.epoch_id && record.settle_id == epoch.settle_id,
            VaultError::EpochMismatch
        );

        let assets = ExchangeRate::at_settlement(record, self.decimals_offset)
            .to_assets(request.shares)?;
        request.shares = 0;

        Ok(assets)
    }

    /// Returns the previous lifespan. A zero lifespan expires NAV immediately.
    pub fn update_total_assets_lifespan(&mut self, lifespan: u64) -> u64 {
        let previous = self.total_assets_lifespan;
        self.total_assets_lifespan = lifespan;
        if lifespan == 0 {
            self.total_assets_expiration = 0;
        }
        previous
    }

    /// Returns the previous expiration.
    pub fn expire_total_assets(&mut self) -> i64 {
        std::mem::replace(&mut self.total_assets_expiration, 0)
    }

    /// Returns the previous valuation manager.
    pub fn set_valuation_manager(&mut self, valuation_manager: Pubkey) -> Pubkey {
        std::mem::replace(&mut self.valuation_manager, valuation_manager)
    }

    /// Move the settlement role and custody to a new curator. Returns the
    /// previous curator.
    pub fn set_curator(&mut self, curator: Pubkey, safe_asset_account: Pubkey) -> Pubkey {
        self.safe_asset_account = safe_asset_account;
        std::mem::replace(&mut self.curator, curator)
    }
}

fn next_epoch(epoch_id: u64) -> Result<u64> {
    epoch_id
        .checked_add(EPOCH_STEP)
        .filter(|next| *next <= MAX_EPOCH_ID)
        .ok_or_else(|| error!(VaultError::MathOverflow))
}

fn settled(epoch_id: u64, last_settled: u64) -> bool {
    last_settled != 0 && epoch_id <= last_settled
}

/// Settlement ledger entry, one per (side, settle id).
#[account]
#[derive(Default, Debug, PartialEq, Eq)]
pub struct SettleData {
    pub vault: Pubkey,
    pub settle_id: u64,
    pub pending_assets: u64,
    pub pending_shares: u64,
    /// Vault total assets right before the settlement
    pub total_assets: u64,
    /// Share supply right before the settlement
    pub total_supply: u64,
    pub bump: u8,
}

impl SettleData {
    pub const LEN: usize = 8 + 32 + 8 * 5 + 1;

    pub fn open(&mut self, vault: Pubkey, settle_id: u64, bump: u8) {
        self.vault = vault;
        self.settle_id = settle_id;
        self.bump = bump;
    }
}

/// Links a closed epoch to the settle id it was priced under.
#[account]
#[derive(Default, Debug, PartialEq, Eq)]
pub struct EpochData {
    pub vault: Pubkey,
    pub epoch_id: u64,
    pub settle_id: u64,
    pub bump: u8,
}

impl EpochData {
    pub const LEN: usize = 8 + 32 + 8 + 8 + 1;

    pub fn bind(&mut self, vault: Pubkey, binding: &EpochBinding, bump: u8) {
        self.vault = vault;
        self.epoch_id = binding.epoch_id;
        self.settle_id = binding.settle_id;
        self.bump = bump;
    }
}

#[account]
#[derive(Default, Debug, PartialEq, Eq)]
pub struct DepositRequest {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub epoch_id: u64,
    pub assets: u64,
    pub bump: u8,
}

impl DepositRequest {
    pub const LEN: usize = 8 + 32 + 32 + 8 + 8 + 1;
}

#[account]
#[derive(Default, Debug, PartialEq, Eq)]
pub struct RedeemRequest {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub epoch_id: u64,
    pub shares: u64,
    pub bump: u8,
}

impl RedeemRequest {
    pub const LEN: usize = 8 + 32 + 32 + 8 + 8 + 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(lifespan: u64) -> AsyncVault {
        let mut vault = AsyncVault {
            decimals_offset: 3,
            ..Default::default()
        };
        vault.reset_epochs(lifespan);
        vault
    }

    fn record(settle_id: u64) -> SettleData {
        SettleData {
            settle_id,
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_vault_counters() {
        let vault = vault(1000);
        assert_eq!(vault.deposit_epoch_id, 1);
        assert_eq!(vault.redeem_epoch_id, 2);
        assert_eq!(vault.deposit_settle_id, 0);
        assert_eq!(vault.redeem_settle_id, 0);
        assert!(!vault.is_total_assets_valid(0));
    }

    #[test]
    fn test_push_without_flow_keeps_epochs() {
        let mut vault = vault(1000);
        let push = vault.update_new_total_assets(500, 0, 0).unwrap();
        assert_eq!(push, ValuationPush::default());
        assert_eq!(vault.deposit_epoch_id, 1);
        assert_eq!(vault.redeem_epoch_id, 2);
        assert_eq!(vault.new_total_assets, 500);
    }

    #[test]
    fn test_push_with_flow_advances_by_two() {
        let mut vault = vault(1000);
        let push = vault.update_new_total_assets(0, 10_000, 7).unwrap();
        assert_eq!(
            push.deposit,
            Some(EpochBinding {
                epoch_id: 1,
                settle_id: 0,
                pending: 10_000
            })
        );
        assert_eq!(push.redeem.map(|b| b.epoch_id), Some(2));
        assert_eq!(vault.deposit_epoch_id, 3);
        assert_eq!(vault.redeem_epoch_id, 4);
    }

    #[test]
    fn test_epoch_width_is_bounded() {
        let mut vault = vault(1000);
        vault.deposit_epoch_id = MAX_EPOCH_ID;
        assert!(vault.update_new_total_assets(0, 1, 0).is_err());
    }

    #[test]
    fn test_settle_deposit_marks_previous_epoch_and_refreshes_nav() {
        let mut vault = vault(1000);
        let push = vault.update_new_total_assets(0, 10_000, 0).unwrap();
        let mut record = record(0);
        record.pending_assets = push.deposit.unwrap().pending;

        let settlement = vault.settle_deposit(0, &mut record, 0, 5_000).unwrap();

        assert_eq!(settlement.assets, 10_000);
        assert_eq!(settlement.shares, 10_000_000);
        assert_eq!(settlement.epoch_id, 1);
        assert_eq!(vault.last_deposit_epoch_id_settled, vault.deposit_epoch_id - 2);
        assert_eq!(vault.deposit_settle_id, 1);
        assert_eq!(vault.total_assets, 10_000);
        assert_eq!(vault.total_assets_expiration, 6_000);
        assert_eq!(vault.new_total_assets, NO_PENDING_VALUATION);
        assert_eq!(record.total_assets, 0);
        assert_eq!(record.total_supply, 0);
        assert!(vault.is_total_assets_valid(5_999));
        assert!(!vault.is_total_assets_valid(6_000));
    }

    #[test]
    fn test_settle_rejects_stale_valuation() {
        let mut vault = vault(1000);
        vault.update_new_total_assets(100, 10_000, 0).unwrap();
        let mut record = record(0);
        record.pending_assets = 10_000;
        assert!(vault.settle_deposit(99, &mut record, 0, 0).is_err());
    }

    #[test]
    fn test_settle_without_pending_fails() {
        let mut vault = vault(1000);
        vault.update_new_total_assets(0, 0, 0).unwrap();
        assert!(vault.settle_deposit(0, &mut record(0), 0, 0).is_err());
        assert!(vault.settle_redeem(0, &mut record(0), 0, 0, 0).is_err());
    }

    #[test]
    fn test_zero_lifespan_leaves_expiration_untouched() {
        let mut vault = vault(0);
        vault.total_assets_expiration = 42;
        vault.update_new_total_assets(0, 10_000, 0).unwrap();
        let mut record = record(0);
        record.pending_assets = 10_000;
        vault.settle_deposit(0, &mut record, 0, 5_000).unwrap();
        assert_eq!(vault.total_assets_expiration, 42);
        assert!(!vault.is_total_assets_valid(0));
    }

    #[test]
    fn test_settle_redeem_requires_safe_liquidity() {
        let mut vault = vault(1000);
        vault.total_assets = 10_000;
        vault.new_total_assets = NO_PENDING_VALUATION;
        vault.update_new_total_assets(10_000, 0, 1_000_000).unwrap();
        let mut record = record(0);
        record.pending_shares = 1_000_000;

        let err = vault.settle_redeem(10_000, &mut record, 10_000_000, 0, 0);
        assert!(err.is_err());

        let mut record = record.clone();
        let settlement = vault
            .settle_redeem(10_000, &mut record, 10_000_000, 10_000, 0)
            .unwrap();
        assert_eq!(settlement.shares, 1_000_000);
        assert!(settlement.assets > 0 && settlement.assets <= 1_000);
        assert_eq!(vault.last_redeem_epoch_id_settled, 2);
        assert_eq!(vault.redeem_settle_id, 1);
    }

    #[test]
    fn test_sync_deposit_during_pending_valuation_survives_settlement() {
        let mut vault = vault(1000);
        vault.total_assets = 10_000;
        vault.total_assets_expiration = 1_000;
        vault.update_new_total_assets(10_000, 0, 1_000_000).unwrap();

        vault.sync_deposit(10_000, 10_000_000, 0, 0).unwrap();
        assert_eq!(vault.total_assets, 20_000);
        assert_eq!(vault.sync_assets_since_push, 10_000);

        let mut record = record(0);
        record.pending_shares = 1_000_000;
        let settlement = vault
            .settle_redeem(10_000, &mut record, 20_000_000, 20_000, 0)
            .unwrap();

        assert_eq!(record.total_assets, 20_000);
        assert_eq!(settlement.assets, 1_000);
        assert_eq!(vault.total_assets, 19_000);
        assert_eq!(vault.sync_assets_since_push, 0);
    }

    #[test]
    fn test_new_push_supersedes_carried_sync_assets() {
        let mut vault = vault(1000);
        vault.total_assets = 10_000;
        vault.total_assets_expiration = 1_000;
        vault.update_new_total_assets(10_000, 0, 0).unwrap();
        vault.sync_deposit(5_000, 10_000_000, 0, 0).unwrap();

        vault.update_new_total_assets(15_000, 0, 0).unwrap();
        assert_eq!(vault.sync_assets_since_push, 0);
    }

    #[test]
    fn test_sync_and_async_deposits_are_exclusive() {
        let mut vault = vault(1000);
        vault.total_assets_expiration = 1_000;
        let mut request = DepositRequest::default();
        let owner = Pubkey::new_from_array([7u8; 32]);

        assert!(vault.sync_deposit(10_000, 0, 0, 999).is_ok());
        assert!(vault
            .request_deposit(&mut request, owner, 10_000, 999)
            .is_err());

        assert!(vault.sync_deposit(10_000, 0, 0, 1_000).is_err());
        assert_eq!(
            vault
                .request_deposit(&mut request, owner, 10_000, 1_000)
                .unwrap(),
            1
        );
        assert_eq!(request.assets, 10_000);
    }

    #[test]
    fn test_one_open_request_per_epoch() {
        let mut vault = vault(1000);
        let owner = Pubkey::new_from_array([7u8; 32]);
        let mut request = DepositRequest::default();
        vault.request_deposit(&mut request, owner, 2_000, 0).unwrap();
        vault.request_deposit(&mut request, owner, 3_000, 0).unwrap();
        assert_eq!(request.assets, 5_000);

        vault.update_new_total_assets(0, 5_000, 0).unwrap();
        assert!(vault.request_deposit(&mut request, owner, 1_000, 0).is_err());
    }

    #[test]
    fn test_claim_shares_after_settlement() {
        let mut vault = vault(1000);
        let owner = Pubkey::new_from_array([7u8; 32]);
        let mut request = DepositRequest::default();
        vault.request_deposit(&mut request, owner, 10_000, 0).unwrap();

        let push = vault.update_new_total_assets(0, 10_000, 0).unwrap();
        let binding = push.deposit.unwrap();
        let mut epoch = EpochData::default();
        epoch.bind(Pubkey::default(), &binding, 0);
        let mut record = record(binding.settle_id);
        record.pending_assets = binding.pending;

        assert!(vault
            .claim_shares(&mut request.clone(), &epoch, &record)
            .is_err());

        let settlement = vault.settle_deposit(0, &mut record, 0, 0).unwrap();
        let shares = vault.claim_shares(&mut request, &epoch, &record).unwrap();
        assert_eq!(shares, settlement.shares);
        assert_eq!(request.assets, 0);
    }

    #[test]
    fn test_role_rotation() {
        let mut vault = vault(1000);
        let oracle = Pubkey::new_from_array([1u8; 32]);
        let curator = Pubkey::new_from_array([2u8; 32]);
        let safe = Pubkey::new_from_array([3u8; 32]);
        vault.valuation_manager = oracle;
        vault.curator = curator;
        vault.safe_asset_account = safe;

        let next_oracle = Pubkey::new_from_array([4u8; 32]);
        assert_eq!(vault.set_valuation_manager(next_oracle), oracle);
        assert_eq!(vault.valuation_manager, next_oracle);

        let next_curator = Pubkey::new_from_array([5u8; 32]);
        let next_safe = Pubkey::new_from_array([6u8; 32]);
        assert_eq!(vault.set_curator(next_curator, next_safe), curator);
        assert_eq!(vault.curator, next_curator);
        assert_eq!(vault.safe_asset_account, next_safe);
        assert_eq!(vault.deposit_epoch_id, 1);
    }

    #[test]
    fn test_lifespan_zero_expires_nav() {
        let mut vault = vault(1000);
        vault.total_assets_expiration = 10_000;
        assert!(vault.is_total_assets_valid(0));
        assert_eq!(vault.update_total_assets_lifespan(0), 1000);
        assert!(!vault.is_total_assets_valid(0));

        vault.update_total_assets_lifespan(1000);
        vault.total_assets_expiration = 10_000;
        assert_eq!(vault.expire_total_assets(), 10_000);
        assert!(!vault.is_total_assets_valid(0));
    }
}
