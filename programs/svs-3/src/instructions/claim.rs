use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::{
    constants::{
        DEPOSIT_REQUEST_SEED, DEPOSIT_SETTLE_SEED, EPOCH_SEED, REDEEM_REQUEST_SEED,
        REDEEM_SETTLE_SEED, VAULT_SEED,
    },
    events::{AssetsClaimed, SharesClaimed},
    state::{AsyncVault, DepositRequest, EpochData, RedeemRequest, SettleData},
};

#[derive(Accounts)]
pub struct ClaimShares<'info> {
    pub owner: Signer<'info>,

    pub vault: Box<Account<'info, AsyncVault>>,

    #[account(
        constraint = shares_mint.key() == vault.shares_mint,
    )]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        seeds = [DEPOSIT_REQUEST_SEED, vault.key().as_ref(), owner.key().as_ref()],
        bump = deposit_request.bump,
    )]
    pub deposit_request: Box<Account<'info, DepositRequest>>,

    #[account(
        seeds = [EPOCH_SEED, vault.key().as_ref(), &deposit_request.epoch_id.to_le_bytes()],
        bump = epoch.bump,
    )]
    pub epoch: Box<Account<'info, EpochData>>,

    #[account(
        seeds = [DEPOSIT_SETTLE_SEED, vault.key().as_ref(), &epoch.settle_id.to_le_bytes()],
        bump = settle.bump,
    )]
    pub settle: Box<Account<'info, SettleData>>,

    #[account(
        mut,
        constraint = claimable_shares.key() == vault.claimable_shares,
    )]
    pub claimable_shares: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = owner_shares_account.mint == vault.shares_mint,
        constraint = owner_shares_account.owner == owner.key(),
    )]
    pub owner_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_2022_program: Program<'info, Token2022>,
}

#[derive(Accounts)]
pub struct ClaimAssets<'info> {
    pub owner: Signer<'info>,

    pub vault: Box<Account<'info, AsyncVault>>,

    #[account(
        constraint = asset_mint.key() == vault.asset_mint,
    )]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        seeds = [REDEEM_REQUEST_SEED, vault.key().as_ref(), owner.key().as_ref()],
        bump = redeem_request.bump,
    )]
    pub redeem_request: Box<Account<'info, RedeemRequest>>,

    #[account(
        seeds = [EPOCH_SEED, vault.key().as_ref(), &redeem_request.epoch_id.to_le_bytes()],
        bump = epoch.bump,
    )]
    pub epoch: Box<Account<'info, EpochData>>,

    #[account(
        seeds = [REDEEM_SETTLE_SEED, vault.key().as_ref(), &epoch.settle_id.to_le_bytes()],
        bump = settle.bump,
    )]
    pub settle: Box<Account<'info, SettleData>>,

    #[account(
        mut,
        constraint = claimable_assets.key() == vault.claimable_assets,
    )]
    pub claimable_assets: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = owner_asset_account.mint == vault.asset_mint,
        constraint = owner_asset_account.owner == owner.key(),
    )]
    pub owner_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
}

/// Claim the shares of a settled deposit request.
pub fn claim_shares(ctx: Context<ClaimShares>) -> Result<()> {
    let epoch_id = ctx.accounts.deposit_request.epoch_id;
    let shares = ctx.accounts.vault.claim_shares(
        &mut ctx.accounts.deposit_request,
        &ctx.accounts.epoch,
        &ctx.accounts.settle,
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

    transfer_checked(
        CpiContext::new_with_signer(
            ctx.accounts.token_2022_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.claimable_shares.to_account_info(),
                to: ctx.accounts.owner_shares_account.to_account_info(),
                mint: ctx.accounts.shares_mint.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
            signer_seeds,
        ),
        shares,
        ctx.accounts.shares_mint.decimals,
    )?;

    emit!(SharesClaimed {
        vault: ctx.accounts.vault.key(),
        owner: ctx.accounts.owner.key(),
        epoch_id,
        shares,
    });

    Ok(())
}

/// Claim the assets of a settled redeem request.
pub fn claim_assets(ctx: Context<ClaimAssets>) -> Result<()> {
    let epoch_id = ctx.accounts.redeem_request.epoch_id;
    let assets = ctx.accounts.vault.claim_assets(
        &mut ctx.accounts.redeem_request,
        &ctx.accounts.epoch,
        &ctx.accounts.settle,
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

    transfer_checked(
        CpiContext::new_with_signer(
            ctx.accounts.asset_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.claimable_assets.to_account_info(),
                to: ctx.accounts.owner_asset_account.to_account_info(),
                mint: ctx.accounts.asset_mint.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
            signer_seeds,
        ),
        assets,
        ctx.accounts.asset_mint.decimals,
    )?;

    emit!(AssetsClaimed {
        vault: ctx.accounts.vault.key(),
        owner: ctx.accounts.owner.key(),
        epoch_id,
        assets,
    });

    Ok(())
}
