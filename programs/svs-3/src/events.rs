use anchor_lang::prelude::*;

#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub valuation_manager: Pubkey,
    pub curator: Pubkey,
    pub asset_mint: Pubkey,
    pub shares_mint: Pubkey,
    pub vault_id: u64,
    pub total_assets_lifespan: u64,
}

#[event]
pub struct NewTotalAssetsUpdated {
    pub vault: Pubkey,
    pub new_total_assets: u64,
    pub deposit_epoch_id: u64,
    pub redeem_epoch_id: u64,
    pub pending_assets: u64,
    pub pending_shares: u64,
}

#[event]
pub struct SettleDeposit {
    pub vault: Pubkey,
    pub settle_id: u64,
    pub epoch_id: u64,
    pub total_assets: u64,
    pub total_supply: u64,
    pub assets_deposited: u64,
    pub shares_minted: u64,
}

#[event]
pub struct SettleRedeem {
    pub vault: Pubkey,
    pub settle_id: u64,
    pub epoch_id: u64,
    pub total_assets: u64,
    pub total_supply: u64,
    pub assets_withdrawn: u64,
    pub shares_burned: u64,
}

#[event]
pub struct DepositSync {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub receiver: Pubkey,
    pub assets: u64,
    pub shares: u64,
}

#[event]
pub struct DepositRequested {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub epoch_id: u64,
    pub assets: u64,
}

#[event]
pub struct RedeemRequested {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub epoch_id: u64,
    pub shares: u64,
}

#[event]
pub struct SharesClaimed {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub epoch_id: u64,
    pub shares: u64,
}

#[event]
pub struct AssetsClaimed {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub epoch_id: u64,
    pub assets: u64,
}

#[event]
pub struct TotalAssetsLifespanUpdated {
    pub vault: Pubkey,
    pub previous_lifespan: u64,
    pub new_lifespan: u64,
}

#[event]
pub struct TotalAssetsExpired {
    pub vault: Pubkey,
    pub previous_expiration: i64,
}

#[event]
pub struct AuthorityTransferred {
    pub vault: Pubkey,
    pub previous_authority: Pubkey,
    pub new_authority: Pubkey,
}

#[event]
pub struct ValuationManagerUpdated {
    pub vault: Pubkey,
    pub previous_valuation_manager: Pubkey,
    pub new_valuation_manager: Pubkey,
}

#[event]
pub struct CuratorUpdated {
    pub vault: Pubkey,
    pub previous_curator: Pubkey,
    pub new_curator: Pubkey,
    pub previous_safe_asset_account: Pubkey,
    pub new_safe_asset_account: Pubkey,
}
