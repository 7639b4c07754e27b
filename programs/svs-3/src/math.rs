use anchor_lang::prelude::*;

use crate::{error::VaultError, state::SettleData};

/// Asset/share exchange rate with virtual offset protection. Both directions
/// round down, in the vault's favor.
///
/// shares = assets × (total_supply + 10^offset) / (total_assets + 1)
/// assets = shares × (total_assets + 1) / (total_supply + 10^offset)
///
/// Settlement records freeze the rate an epoch was settled at, so claims use
/// [`ExchangeRate::at_settlement`] rather than the live vault totals.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ExchangeRate {
    pub total_assets: u64,
    pub total_supply: u64,
    pub decimals_offset: u8,
}

impl ExchangeRate {
    pub fn new(total_assets: u64, total_supply: u64, decimals_offset: u8) -> Self {
        Self {
            total_assets,
            total_supply,
            decimals_offset,
        }
    }

    pub fn at_settlement(record: &SettleData, decimals_offset: u8) -> Self {
        Self::new(record.total_assets, record.total_supply, decimals_offset)
    }

    fn virtual_supply(&self) -> Result<u64> {
        let offset = 10u64
            .checked_pow(self.decimals_offset as u32)
            .ok_or(VaultError::MathOverflow)?;

        Ok(self
            .total_supply
            .checked_add(offset)
            .ok_or(VaultError::MathOverflow)?)
    }

    fn virtual_assets(&self) -> Result<u64> {
        Ok(self
            .total_assets
            .checked_add(1)
            .ok_or(VaultError::MathOverflow)?)
    }

    pub fn to_shares(&self, assets: u64) -> Result<u64> {
        mul_div(assets, self.virtual_supply()?, self.virtual_assets()?)
    }

    pub fn to_assets(&self, shares: u64) -> Result<u64> {
        mul_div(shares, self.virtual_assets()?, self.virtual_supply()?)
    }
}

/// Computes floor((value × numerator) / denominator) through a u128 intermediate.
pub fn mul_div(value: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?;

    let result = product / denominator as u128;

    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floors() {
        assert_eq!(mul_div(100, 1, 3).unwrap(), 33);
        assert_eq!(mul_div(100, 3, 2).unwrap(), 150);
    }

    #[test]
    fn test_mul_div_rejects_zero_denominator() {
        assert!(mul_div(100, 100, 0).is_err());
    }

    #[test]
    fn test_mul_div_rejects_u64_overflow() {
        assert!(mul_div(u64::MAX, 2, 1).is_err());
    }

    #[test]
    fn test_first_sync_deposit_uses_virtual_supply() {
        // Empty vault, offset 3: 10_000 × 1000 / 1
        let rate = ExchangeRate::new(0, 0, 3);
        assert_eq!(rate.to_shares(10_000).unwrap(), 10_000_000);
    }

    #[test]
    fn test_settlement_rate_is_frozen() {
        let record = SettleData {
            total_assets: 1_000_000,
            total_supply: 1_000_000_000,
            ..Default::default()
        };
        let rate = ExchangeRate::at_settlement(&record, 3);

        // (1_000_000_000 + 1000) / (1_000_000 + 1) ≈ 1000 shares per asset
        let shares = rate.to_shares(5_000).unwrap();
        assert!(shares > 4_990_000 && shares <= 5_000_000);

        let assets = rate.to_assets(shares).unwrap();
        assert!(assets <= 5_000);
    }

    #[test]
    fn test_donation_to_empty_vault_yields_nothing() {
        let rate = ExchangeRate::new(1_000_000, 0, 3);
        assert_eq!(rate.to_shares(1).unwrap(), 0);
    }
}
