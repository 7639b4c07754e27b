use anchor_lang::prelude::*;
use anchor_spl::token_interface::TokenAccount;

use crate::{
    constants::{DEPOSIT_SETTLE_SEED, EPOCH_SEED, REDEEM_SETTLE_SEED},
    error::VaultError,
    events::NewTotalAssetsUpdated,
    state::{AsyncVault, EpochData, SettleData},
};

#[derive(Accounts)]
pub struct UpdateNewTotalAssets<'info> {
    #[account(
        mut,
        constraint = valuation_manager.key() == vault.valuation_manager @ VaultError::Unauthorized,
    )]
    pub valuation_manager: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, AsyncVault>>,

    #[account(
        constraint = pending_silo_assets.key() == vault.pending_silo_assets,
    )]
    pub pending_silo_assets: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        constraint = pending_silo_shares.key() == vault.pending_silo_shares,
    )]
    pub pending_silo_shares: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = valuation_manager,
        space = SettleData::LEN,
        seeds = [DEPOSIT_SETTLE_SEED, vault.key().as_ref(), &vault.deposit_settle_id.to_le_bytes()],
        bump
    )]
    pub deposit_settle: Box<Account<'info, SettleData>>,

    #[account(
        init_if_needed,
        payer = valuation_manager,
        space = SettleData::LEN,
        seeds = [REDEEM_SETTLE_SEED, vault.key().as_ref(), &vault.redeem_settle_id.to_le_bytes()],
        bump
    )]
    pub redeem_settle: Box<Account<'info, SettleData>>,

    #[account(
        init_if_needed,
        payer = valuation_manager,
        space = EpochData::LEN,
        seeds = [EPOCH_SEED, vault.key().as_ref(), &vault.deposit_epoch_id.to_le_bytes()],
        bump
    )]
    pub deposit_epoch: Box<Account<'info, EpochData>>,

    #[account(
        init_if_needed,
        payer = valuation_manager,
        space = EpochData::LEN,
        seeds = [EPOCH_SEED, vault.key().as_ref(), &vault.redeem_epoch_id.to_le_bytes()],
        bump
    )]
    pub redeem_epoch: Box<Account<'info, EpochData>>,

    pub system_program: Program<'info, System>,
}

/// Push a new valuation and close the epochs that have pending flow.
///
/// Pending amounts are read from the silos, so a side whose silo is empty
/// keeps its epoch open and its settle record untouched.
pub fn handler(ctx: Context<UpdateNewTotalAssets>, new_total_assets: u64) -> Result<()> {
    let vault_key = ctx.accounts.vault.key();
    let pending_assets = ctx.accounts.pending_silo_assets.amount;
    let pending_shares = ctx.accounts.pending_silo_shares.amount;

    let push = ctx.accounts.vault.update_new_total_assets(
        new_total_assets,
        pending_assets,
        pending_shares,
    )?;

    if let Some(binding) = push.deposit {
        ctx.accounts
            .deposit_epoch
            .bind(vault_key, &binding, ctx.bumps.deposit_epoch);

        let record = &mut ctx.accounts.deposit_settle;
        record.open(vault_key, binding.settle_id, ctx.bumps.deposit_settle);
        record.pending_assets = binding.pending;
    }

    if let Some(binding) = push.redeem {
        ctx.accounts
            .redeem_epoch
            .bind(vault_key, &binding, ctx.bumps.redeem_epoch);

        let record = &mut ctx.accounts.redeem_settle;
        record.open(vault_key, binding.settle_id, ctx.bumps.redeem_settle);
        record.pending_shares = binding.pending;
    }

    let vault = &ctx.accounts.vault;
    emit!(NewTotalAssetsUpdated {
        vault: vault_key,
        new_total_assets,
        deposit_epoch_id: vault.deposit_epoch_id,
        redeem_epoch_id: vault.redeem_epoch_id,
        pending_assets,
        pending_shares,
    });

    Ok(())
}
