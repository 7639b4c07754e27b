use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;

use instructions::*;

declare_id!("BLhwJLNJho1jVE8vVY26WxjbXnd8qwHKSL3PKVmGwddr");

#[program]
pub mod svs_3 {
    use super::*;

    /// Initialize a new async vault for the given asset
    pub fn initialize(
        ctx: Context<Initialize>,
        vault_id: u64,
        total_assets_lifespan: u64,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, vault_id, total_assets_lifespan)
    }

    // ============ Valuation & Settlement ============

    /// Push a new valuation; closes every epoch with pending flow
    pub fn update_new_total_assets(
        ctx: Context<UpdateNewTotalAssets>,
        new_total_assets: u64,
    ) -> Result<()> {
        instructions::update_new_total_assets::handler(ctx, new_total_assets)
    }

    /// Settle pending deposits at the pushed valuation and refresh NAV expiration
    pub fn settle_deposit(ctx: Context<SettleDeposit>, valuation: u64) -> Result<()> {
        instructions::settle::settle_deposit(ctx, valuation)
    }

    /// Settle pending redemptions at the pushed valuation and refresh NAV expiration
    pub fn settle_redeem(ctx: Context<SettleRedeem>, valuation: u64) -> Result<()> {
        instructions::settle::settle_redeem(ctx, valuation)
    }

    // ============ Deposits & Redemptions ============

    /// Deposit and receive shares immediately (only while NAV is valid)
    /// Shares minted with floor rounding - favors vault
    pub fn sync_deposit(ctx: Context<SyncDeposit>, assets: u64, min_shares_out: u64) -> Result<()> {
        instructions::sync_deposit::handler(ctx, assets, min_shares_out)
    }

    /// Queue assets for the next deposit settlement (only while NAV is expired)
    pub fn request_deposit(ctx: Context<RequestDeposit>, assets: u64) -> Result<()> {
        instructions::request::request_deposit(ctx, assets)
    }

    /// Queue shares for the next redeem settlement
    pub fn request_redeem(ctx: Context<RequestRedeem>, shares: u64) -> Result<()> {
        instructions::request::request_redeem(ctx, shares)
    }

    /// Claim shares of a settled deposit request
    pub fn claim_shares(ctx: Context<ClaimShares>) -> Result<()> {
        instructions::claim::claim_shares(ctx)
    }

    /// Claim assets of a settled redeem request
    pub fn claim_assets(ctx: Context<ClaimAssets>) -> Result<()> {
        instructions::claim::claim_assets(ctx)
    }

    // ============ NAV Window ============

    /// Set the NAV lifespan (0 disables synchronous deposits)
    pub fn update_total_assets_lifespan(ctx: Context<Curator>, lifespan: u64) -> Result<()> {
        instructions::admin::update_total_assets_lifespan(ctx, lifespan)
    }

    /// Force NAV stale
    pub fn expire_total_assets(ctx: Context<Curator>) -> Result<()> {
        instructions::admin::expire_total_assets(ctx)
    }

    // ============ Roles ============

    /// Transfer vault authority
    pub fn transfer_authority(ctx: Context<Admin>, new_authority: Pubkey) -> Result<()> {
        instructions::admin::transfer_authority(ctx, new_authority)
    }

    /// Rotate the valuation manager
    pub fn set_valuation_manager(ctx: Context<Admin>, new_valuation_manager: Pubkey) -> Result<()> {
        instructions::admin::set_valuation_manager(ctx, new_valuation_manager)
    }

    /// Rotate the curator and its custody account
    pub fn set_curator(ctx: Context<SetCurator>, new_curator: Pubkey) -> Result<()> {
        instructions::admin::set_curator(ctx, new_curator)
    }
}
