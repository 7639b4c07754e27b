use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::{
    constants::{DEPOSIT_REQUEST_SEED, REDEEM_REQUEST_SEED},
    error::VaultError,
    events::{DepositRequested, RedeemRequested},
    state::{AsyncVault, DepositRequest, RedeemRequest},
};

#[derive(Accounts)]
pub struct RequestDeposit<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    pub vault: Box<Account<'info, AsyncVault>>,

    #[account(
        constraint = asset_mint.key() == vault.asset_mint,
    )]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = owner_asset_account.mint == vault.asset_mint,
        constraint = owner_asset_account.owner == owner.key(),
    )]
    pub owner_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = pending_silo_assets.key() == vault.pending_silo_assets,
    )]
    pub pending_silo_assets: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = DepositRequest::LEN,
        seeds = [DEPOSIT_REQUEST_SEED, vault.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub deposit_request: Box<Account<'info, DepositRequest>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RequestRedeem<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    pub vault: Box<Account<'info, AsyncVault>>,

    #[account(
        constraint = shares_mint.key() == vault.shares_mint,
    )]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = owner_shares_account.mint == vault.shares_mint,
        constraint = owner_shares_account.owner == owner.key(),
    )]
    pub owner_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = pending_silo_shares.key() == vault.pending_silo_shares,
    )]
    pub pending_silo_shares: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = RedeemRequest::LEN,
        seeds = [REDEEM_REQUEST_SEED, vault.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub redeem_request: Box<Account<'info, RedeemRequest>>,

    pub token_2022_program: Program<'info, Token2022>,
    pub system_program: Program<'info, System>,
}

/// Request an epoch-settled deposit. Only allowed while total assets are expired.
pub fn request_deposit(ctx: Context<RequestDeposit>, assets: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let owner_key = ctx.accounts.owner.key();

    let request = &mut ctx.accounts.deposit_request;
    let epoch_id = ctx
        .accounts
        .vault
        .request_deposit(request, owner_key, assets, now)?;
    request.vault = vault_key;
    request.bump = ctx.bumps.deposit_request;

    transfer_checked(
        CpiContext::new(
            ctx.accounts.asset_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.owner_asset_account.to_account_info(),
                to: ctx.accounts.pending_silo_assets.to_account_info(),
                mint: ctx.accounts.asset_mint.to_account_info(),
                authority: ctx.accounts.owner.to_account_info(),
            },
        ),
        assets,
        ctx.accounts.asset_mint.decimals,
    )?;

    emit!(DepositRequested {
        vault: vault_key,
        owner: owner_key,
        epoch_id,
        assets,
    });

    Ok(())
}

/// Request an epoch-settled redemption.
pub fn request_redeem(ctx: Context<RequestRedeem>, shares: u64) -> Result<()> {
    require!(
        ctx.accounts.owner_shares_account.amount >= shares,
        VaultError::InsufficientShares
    );

    let vault_key = ctx.accounts.vault.key();
    let owner_key = ctx.accounts.owner.key();

    let request = &mut ctx.accounts.redeem_request;
    let epoch_id = ctx
        .accounts
        .vault
        .request_redeem(request, owner_key, shares)?;
    request.vault = vault_key;
    request.bump = ctx.bumps.redeem_request;

    transfer_checked(
        CpiContext::new(
            ctx.accounts.token_2022_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.owner_shares_account.to_account_info(),
                to: ctx.accounts.pending_silo_shares.to_account_info(),
                mint: ctx.accounts.shares_mint.to_account_info(),
                authority: ctx.accounts.owner.to_account_info(),
            },
        ),
        shares,
        ctx.accounts.shares_mint.decimals,
    )?;

    emit!(RedeemRequested {
        vault: vault_key,
        owner: owner_key,
        epoch_id,
        shares,
    });

    Ok(())
}
