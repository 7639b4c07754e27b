//! In-memory token balances for the vault model.

use std::{collections::BTreeMap, fmt};

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};

use crate::error::OperationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    Asset,
    Share,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Asset => f.write_str("assets"),
            Token::Share => f.write_str("shares"),
        }
    }
}

/// Token account owner. Vault-controlled accounts are named by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Holder {
    /// Curator custody for settled and synchronously deposited assets
    Safe,
    /// Assets and shares of requests awaiting settlement
    PendingSilo,
    /// Settled assets and shares awaiting claim
    Claimable,
    Wallet(Pubkey),
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Safe => f.write_str("safe"),
            Holder::PendingSilo => f.write_str("pending silo"),
            Holder::Claimable => f.write_str("claimable"),
            Holder::Wallet(key) => write!(f, "wallet {key}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenLedger {
    balances: BTreeMap<(Token, Holder), u64>,
    share_supply: u64,
}

impl TokenLedger {
    pub fn balance(&self, token: Token, holder: Holder) -> u64 {
        self.balances.get(&(token, holder)).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.share_supply
    }

    /// Fund a holder with assets from outside the vault.
    pub fn fund(&mut self, holder: Holder, amount: u64) -> Result<(), OperationError> {
        self.credit(Token::Asset, holder, amount)
    }

    pub fn mint_shares(&mut self, holder: Holder, amount: u64) -> Result<(), OperationError> {
        self.share_supply = self
            .share_supply
            .checked_add(amount)
            .ok_or_else(|| overflow(Token::Share, holder))?;
        self.credit(Token::Share, holder, amount)
    }

    pub fn burn_shares(&mut self, holder: Holder, amount: u64) -> Result<(), OperationError> {
        self.debit(Token::Share, holder, amount)?;
        self.share_supply -= amount;
        Ok(())
    }

    pub fn transfer(
        &mut self,
        token: Token,
        from: Holder,
        to: Holder,
        amount: u64,
    ) -> Result<(), OperationError> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)
    }

    /// Every non-zero balance, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, Holder, u64)> + '_ {
        self.balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|((token, holder), amount)| (*token, *holder, *amount))
    }

    fn credit(&mut self, token: Token, holder: Holder, amount: u64) -> Result<(), OperationError> {
        let balance = self.balances.entry((token, holder)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| overflow(token, holder))?;
        Ok(())
    }

    fn debit(&mut self, token: Token, holder: Holder, amount: u64) -> Result<(), OperationError> {
        let available = self.balance(token, holder);
        if available < amount {
            return Err(OperationError::InsufficientBalance {
                token: token.to_string(),
                holder: holder.to_string(),
                needed: amount,
                available,
            });
        }
        self.balances.insert((token, holder), available - amount);
        Ok(())
    }
}

fn overflow(token: Token, holder: Holder) -> OperationError {
    OperationError::BalanceOverflow {
        token: token.to_string(),
        holder: holder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = TokenLedger::default();
        ledger.fund(Holder::PendingSilo, 5_000).unwrap();

        ledger
            .transfer(Token::Asset, Holder::PendingSilo, Holder::Safe, 3_000)
            .unwrap();

        assert_eq!(ledger.balance(Token::Asset, Holder::PendingSilo), 2_000);
        assert_eq!(ledger.balance(Token::Asset, Holder::Safe), 3_000);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = TokenLedger::default();
        ledger.fund(Holder::Safe, 100).unwrap();

        let err = ledger
            .transfer(Token::Asset, Holder::Safe, Holder::Claimable, 101)
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::InsufficientBalance { needed: 101, available: 100, .. }
        ));
        assert_eq!(ledger.balance(Token::Asset, Holder::Safe), 100);
    }

    #[test]
    fn test_mint_and_burn_track_supply() {
        let mut ledger = TokenLedger::default();
        ledger.mint_shares(Holder::Claimable, 10_000).unwrap();
        ledger.mint_shares(Holder::PendingSilo, 4_000).unwrap();
        assert_eq!(ledger.total_supply(), 14_000);

        ledger.burn_shares(Holder::PendingSilo, 4_000).unwrap();
        assert_eq!(ledger.total_supply(), 10_000);
        assert_eq!(ledger.balance(Token::Share, Holder::PendingSilo), 0);

        assert!(ledger.burn_shares(Holder::PendingSilo, 1).is_err());
        assert_eq!(ledger.total_supply(), 10_000);
    }

    #[test]
    fn test_iter_skips_empty_balances() {
        let mut ledger = TokenLedger::default();
        ledger.fund(Holder::Safe, 10).unwrap();
        ledger
            .transfer(Token::Asset, Holder::Safe, Holder::Claimable, 10)
            .unwrap();

        let balances: Vec<_> = ledger.iter().collect();
        assert_eq!(balances, vec![(Token::Asset, Holder::Claimable, 10)]);
    }
}
