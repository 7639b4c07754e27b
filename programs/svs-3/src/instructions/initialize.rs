use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{Mint, TokenAccount, TokenInterface},
};

use crate::{
    constants::{
        ASSETS_TAG, CLAIMABLE_SEED, MAX_DECIMALS, PENDING_SILO_SEED, SHARES_DECIMALS,
        SHARES_MINT_SEED, SHARES_TAG, VAULT_SEED,
    },
    error::VaultError,
    events::VaultInitialized,
    state::AsyncVault,
};

#[derive(Accounts)]
#[instruction(vault_id: u64)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    /// CHECK: Role holder only, never read or written
    pub valuation_manager: UncheckedAccount<'info>,

    /// CHECK: Role holder only, must own the safe asset account
    pub curator: UncheckedAccount<'info>,

    #[account(
        init,
        payer = authority,
        space = AsyncVault::LEN,
        seeds = [VAULT_SEED, asset_mint.key().as_ref(), &vault_id.to_le_bytes()],
        bump
    )]
    pub vault: Box<Account<'info, AsyncVault>>,

    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = authority,
        seeds = [SHARES_MINT_SEED, vault.key().as_ref()],
        bump,
        mint::decimals = SHARES_DECIMALS,
        mint::authority = vault,
        mint::token_program = token_2022_program,
    )]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        constraint = safe_asset_account.mint == asset_mint.key(),
        constraint = safe_asset_account.owner == curator.key(),
    )]
    pub safe_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        seeds = [PENDING_SILO_SEED, vault.key().as_ref(), ASSETS_TAG],
        bump,
        token::mint = asset_mint,
        token::authority = vault,
        token::token_program = asset_token_program,
    )]
    pub pending_silo_assets: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        seeds = [PENDING_SILO_SEED, vault.key().as_ref(), SHARES_TAG],
        bump,
        token::mint = shares_mint,
        token::authority = vault,
        token::token_program = token_2022_program,
    )]
    pub pending_silo_shares: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        seeds = [CLAIMABLE_SEED, vault.key().as_ref(), ASSETS_TAG],
        bump,
        token::mint = asset_mint,
        token::authority = vault,
        token::token_program = asset_token_program,
    )]
    pub claimable_assets: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        seeds = [CLAIMABLE_SEED, vault.key().as_ref(), SHARES_TAG],
        bump,
        token::mint = shares_mint,
        token::authority = vault,
        token::token_program = token_2022_program,
    )]
    pub claimable_shares: Box<InterfaceAccount<'info, TokenAccount>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, vault_id: u64, total_assets_lifespan: u64) -> Result<()> {
    let asset_decimals = ctx.accounts.asset_mint.decimals;
    require!(
        asset_decimals <= MAX_DECIMALS,
        VaultError::InvalidAssetDecimals
    );

    let vault_key = ctx.accounts.vault.key();
    let vault = &mut ctx.accounts.vault;
    vault.authority = ctx.accounts.authority.key();
    vault.valuation_manager = ctx.accounts.valuation_manager.key();
    vault.curator = ctx.accounts.curator.key();
    vault.asset_mint = ctx.accounts.asset_mint.key();
    vault.shares_mint = ctx.accounts.shares_mint.key();
    vault.safe_asset_account = ctx.accounts.safe_asset_account.key();
    vault.pending_silo_assets = ctx.accounts.pending_silo_assets.key();
    vault.pending_silo_shares = ctx.accounts.pending_silo_shares.key();
    vault.claimable_assets = ctx.accounts.claimable_assets.key();
    vault.claimable_shares = ctx.accounts.claimable_shares.key();
    vault.decimals_offset = MAX_DECIMALS - asset_decimals;
    vault.bump = ctx.bumps.vault;
    vault.vault_id = vault_id;
    vault._reserved = [0u8; 24];
    vault.reset_epochs(total_assets_lifespan);

    emit!(VaultInitialized {
        vault: vault_key,
        authority: vault.authority,
        valuation_manager: vault.valuation_manager,
        curator: vault.curator,
        asset_mint: vault.asset_mint,
        shares_mint: vault.shares_mint,
        vault_id,
        total_assets_lifespan,
    });

    msg!(
        "Async vault {} initialized, deposit epoch {}, redeem epoch {}",
        vault_id,
        vault.deposit_epoch_id,
        vault.redeem_epoch_id
    );

    Ok(())
}
