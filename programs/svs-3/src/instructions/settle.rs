use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::{self, Burn, MintTo, Token2022},
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::{
    constants::{DEPOSIT_SETTLE_SEED, REDEEM_SETTLE_SEED, VAULT_SEED},
    error::VaultError,
    events::{SettleDeposit as SettleDepositEvent, SettleRedeem as SettleRedeemEvent},
    state::{AsyncVault, SettleData},
};

#[derive(Accounts)]
pub struct SettleDeposit<'info> {
    #[account(
        constraint = curator.key() == vault.curator @ VaultError::Unauthorized,
    )]
    pub curator: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, AsyncVault>>,

    #[account(
        constraint = asset_mint.key() == vault.asset_mint,
    )]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = shares_mint.key() == vault.shares_mint,
    )]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = pending_silo_assets.key() == vault.pending_silo_assets,
    )]
    pub pending_silo_assets: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = safe_asset_account.key() == vault.safe_asset_account,
    )]
    pub safe_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = claimable_shares.key() == vault.claimable_shares,
    )]
    pub claimable_shares: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [DEPOSIT_SETTLE_SEED, vault.key().as_ref(), &vault.deposit_settle_id.to_le_bytes()],
        bump = deposit_settle.bump,
    )]
    pub deposit_settle: Box<Account<'info, SettleData>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
}

#[derive(Accounts)]
pub struct SettleRedeem<'info> {
    #[account(
        constraint = curator.key() == vault.curator @ VaultError::Unauthorized,
    )]
    pub curator: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, AsyncVault>>,

    #[account(
        constraint = asset_mint.key() == vault.asset_mint,
    )]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = shares_mint.key() == vault.shares_mint,
    )]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = pending_silo_shares.key() == vault.pending_silo_shares,
    )]
    pub pending_silo_shares: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = safe_asset_account.key() == vault.safe_asset_account,
        constraint = safe_asset_account.owner == curator.key(),
    )]
    pub safe_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = claimable_assets.key() == vault.claimable_assets,
    )]
    pub claimable_assets: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [REDEEM_SETTLE_SEED, vault.key().as_ref(), &vault.redeem_settle_id.to_le_bytes()],
        bump = redeem_settle.bump,
    )]
    pub redeem_settle: Box<Account<'info, SettleData>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
}

/// Settle pending deposits at the pushed valuation.
///
/// `valuation` must match the last pushed total assets so a curator cannot
/// settle against a valuation the valuation manager never published.
pub fn settle_deposit(ctx: Context<SettleDeposit>, valuation: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let total_supply = ctx.accounts.shares_mint.supply;

    let settlement = ctx.accounts.vault.settle_deposit(
        valuation,
        &mut ctx.accounts.deposit_settle,
        total_supply,
        now,
    )?;

    let asset_mint_key = ctx.accounts.vault.asset_mint;
    let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
    let bump = ctx.accounts.vault.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        asset_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[bump],
    ]];

    // Pending assets leave the silo for the safe
    transfer_checked(
        CpiContext::new_with_signer(
            ctx.accounts.asset_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.pending_silo_assets.to_account_info(),
                to: ctx.accounts.safe_asset_account.to_account_info(),
                mint: ctx.accounts.asset_mint.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
            signer_seeds,
        ),
        settlement.assets,
        ctx.accounts.asset_mint.decimals,
    )?;

    // Shares wait in the claimable account until each request is claimed
    token_2022::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_2022_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.shares_mint.to_account_info(),
                to: ctx.accounts.claimable_shares.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
            signer_seeds,
        ),
        settlement.shares,
    )?;

    emit!(SettleDepositEvent {
        vault: ctx.accounts.vault.key(),
        settle_id: settlement.settle_id,
        epoch_id: settlement.epoch_id,
        total_assets: ctx.accounts.vault.total_assets,
        total_supply: total_supply
            .checked_add(settlement.shares)
            .ok_or(VaultError::MathOverflow)?,
        assets_deposited: settlement.assets,
        shares_minted: settlement.shares,
    });

    Ok(())
}

/// Settle pending redemptions at the pushed valuation.
pub fn settle_redeem(ctx: Context<SettleRedeem>, valuation: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let total_supply = ctx.accounts.shares_mint.supply;
    let safe_balance = ctx.accounts.safe_asset_account.amount;

    let settlement = ctx.accounts.vault.settle_redeem(
        valuation,
        &mut ctx.accounts.redeem_settle,
        total_supply,
        safe_balance,
        now,
    )?;

    let asset_mint_key = ctx.accounts.vault.asset_mint;
    let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
    let bump = ctx.accounts.vault.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        asset_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[bump],
    ]];

    // Burn the redeemed shares held by the silo
    token_2022::burn(
        CpiContext::new_with_signer(
            ctx.accounts.token_2022_program.to_account_info(),
            Burn {
                mint: ctx.accounts.shares_mint.to_account_info(),
                from: ctx.accounts.pending_silo_shares.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
            signer_seeds,
        ),
        settlement.shares,
    )?;

    // The curator releases the assets from the safe
    transfer_checked(
        CpiContext::new(
            ctx.accounts.asset_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.safe_asset_account.to_account_info(),
                to: ctx.accounts.claimable_assets.to_account_info(),
                mint: ctx.accounts.asset_mint.to_account_info(),
                authority: ctx.accounts.curator.to_account_info(),
            },
        ),
        settlement.assets,
        ctx.accounts.asset_mint.decimals,
    )?;

    emit!(SettleRedeemEvent {
        vault: ctx.accounts.vault.key(),
        settle_id: settlement.settle_id,
        epoch_id: settlement.epoch_id,
        total_assets: ctx.accounts.vault.total_assets,
        total_supply: total_supply
            .checked_sub(settlement.shares)
            .ok_or(VaultError::MathOverflow)?,
        assets_withdrawn: settlement.assets,
        shares_burned: settlement.shares,
    });

    Ok(())
}
