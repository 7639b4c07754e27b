use anchor_lang::prelude::*;
use anchor_spl::token_interface::TokenAccount;

use crate::{
    error::VaultError,
    events::{
        AuthorityTransferred, CuratorUpdated, TotalAssetsExpired, TotalAssetsLifespanUpdated,
        ValuationManagerUpdated,
    },
    state::AsyncVault,
};

#[derive(Accounts)]
pub struct Admin<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, AsyncVault>,
}

#[derive(Accounts)]
#[instruction(new_curator: Pubkey)]
pub struct SetCurator<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, AsyncVault>,

    /// The new curator's custody account
    #[account(
        constraint = safe_asset_account.mint == vault.asset_mint,
        constraint = safe_asset_account.owner == new_curator @ VaultError::Unauthorized,
    )]
    pub safe_asset_account: Box<InterfaceAccount<'info, TokenAccount>>,
}

#[derive(Accounts)]
pub struct Curator<'info> {
    #[account(
        constraint = curator.key() == vault.curator @ VaultError::Unauthorized,
    )]
    pub curator: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, AsyncVault>,
}

/// Set how long a settled valuation keeps synchronous deposits open.
/// A zero lifespan closes the synchronous window immediately.
pub fn update_total_assets_lifespan(ctx: Context<Curator>, lifespan: u64) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    let previous_lifespan = vault.update_total_assets_lifespan(lifespan);

    emit!(TotalAssetsLifespanUpdated {
        vault: vault.key(),
        previous_lifespan,
        new_lifespan: lifespan,
    });

    Ok(())
}

/// Force total assets stale, switching deposits to the request path.
pub fn expire_total_assets(ctx: Context<Curator>) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    let previous_expiration = vault.expire_total_assets();

    emit!(TotalAssetsExpired {
        vault: vault.key(),
        previous_expiration,
    });

    Ok(())
}

/// Transfer vault authority to new address
pub fn transfer_authority(ctx: Context<Admin>, new_authority: Pubkey) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    let previous_authority = vault.authority;

    vault.authority = new_authority;

    emit!(AuthorityTransferred {
        vault: vault.key(),
        previous_authority,
        new_authority,
    });

    Ok(())
}

pub fn set_valuation_manager(ctx: Context<Admin>, new_valuation_manager: Pubkey) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    let previous_valuation_manager = vault.set_valuation_manager(new_valuation_manager);

    emit!(ValuationManagerUpdated {
        vault: vault.key(),
        previous_valuation_manager,
        new_valuation_manager,
    });

    Ok(())
}

/// Hand settlement to a new curator together with the custody account it owns.
/// Assets left in the previous safe are the previous curator's to move.
pub fn set_curator(ctx: Context<SetCurator>, new_curator: Pubkey) -> Result<()> {
    let new_safe_asset_account = ctx.accounts.safe_asset_account.key();
    let vault = &mut ctx.accounts.vault;
    let previous_safe_asset_account = vault.safe_asset_account;
    let previous_curator = vault.set_curator(new_curator, new_safe_asset_account);

    emit!(CuratorUpdated {
        vault: vault.key(),
        previous_curator,
        new_curator,
        previous_safe_asset_account,
        new_safe_asset_account,
    });

    Ok(())
}
