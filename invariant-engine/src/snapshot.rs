//! Point-in-time copies of the vault fields the checkers read.

use anchor_lang::prelude::Pubkey;
use serde::{Serialize, Serializer};
use svs_3::state::SettleData;

use crate::{
    ledger::{Holder, Token},
    vault::Vault,
};

/// Settlement ledger entry as seen by a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SettleRecord {
    pub settle_id: u64,
    pub pending_assets: u64,
    pub pending_shares: u64,
    pub total_assets: u64,
    pub total_supply: u64,
}

impl From<&SettleData> for SettleRecord {
    fn from(record: &SettleData) -> Self {
        Self {
            settle_id: record.settle_id,
            pending_assets: record.pending_assets,
            pending_shares: record.pending_shares,
            total_assets: record.total_assets,
            total_supply: record.total_supply,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VaultSnapshot {
    #[serde(serialize_with = "serialize_pubkey")]
    pub vault: Pubkey,
    pub timestamp: i64,

    pub deposit_epoch_id: u64,
    pub redeem_epoch_id: u64,
    pub deposit_settle_id: u64,
    pub redeem_settle_id: u64,
    pub last_deposit_epoch_id_settled: u64,
    pub last_redeem_epoch_id_settled: u64,

    pub total_assets: u64,
    pub new_total_assets: u64,
    pub sync_assets_since_push: u64,
    pub total_assets_lifespan: u64,
    pub total_assets_expiration: i64,
    pub is_total_assets_valid: bool,

    pub total_supply: u64,
    pub safe_asset_balance: u64,
    pub pending_silo_asset_balance: u64,
    pub pending_silo_share_balance: u64,

    #[serde(serialize_with = "serialize_optional_pubkey")]
    pub receiver: Option<Pubkey>,
    /// Zero when no receiver is followed
    pub receiver_share_balance: u64,

    pub deposit_settles: Vec<SettleRecord>,
    pub redeem_settles: Vec<SettleRecord>,

    /// BLAKE3 over every field above
    #[serde(serialize_with = "serialize_hash")]
    pub digest: blake3::Hash,
}

impl VaultSnapshot {
    /// Copy the vault fields at the vault's current clock.
    ///
    /// `receiver` selects whose share balance is followed across a deposit.
    pub fn capture(vault: &Vault, receiver: Option<Pubkey>) -> Self {
        let state = vault.state();
        let ledger = vault.ledger();

        let mut snapshot = Self {
            vault: vault.key(),
            timestamp: vault.now(),
            deposit_epoch_id: state.deposit_epoch_id,
            redeem_epoch_id: state.redeem_epoch_id,
            deposit_settle_id: state.deposit_settle_id,
            redeem_settle_id: state.redeem_settle_id,
            last_deposit_epoch_id_settled: state.last_deposit_epoch_id_settled,
            last_redeem_epoch_id_settled: state.last_redeem_epoch_id_settled,
            total_assets: state.total_assets,
            new_total_assets: state.new_total_assets,
            sync_assets_since_push: state.sync_assets_since_push,
            total_assets_lifespan: state.total_assets_lifespan,
            total_assets_expiration: state.total_assets_expiration,
            is_total_assets_valid: vault.is_total_assets_valid(),
            total_supply: ledger.total_supply(),
            safe_asset_balance: ledger.balance(Token::Asset, Holder::Safe),
            pending_silo_asset_balance: ledger.balance(Token::Asset, Holder::PendingSilo),
            pending_silo_share_balance: ledger.balance(Token::Share, Holder::PendingSilo),
            receiver,
            receiver_share_balance: receiver
                .map(|key| ledger.balance(Token::Share, Holder::Wallet(key)))
                .unwrap_or(0),
            deposit_settles: vault.deposit_settles().map(SettleRecord::from).collect(),
            redeem_settles: vault.redeem_settles().map(SettleRecord::from).collect(),
            digest: blake3::Hash::from([0u8; 32]),
        };
        snapshot.digest = snapshot.fingerprint();
        snapshot
    }

    /// Hash of the canonical little-endian encoding of every field.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.vault.as_ref());
        hasher.update(&self.timestamp.to_le_bytes());
        for value in [
            self.deposit_epoch_id,
            self.redeem_epoch_id,
            self.deposit_settle_id,
            self.redeem_settle_id,
            self.last_deposit_epoch_id_settled,
            self.last_redeem_epoch_id_settled,
            self.total_assets,
            self.new_total_assets,
            self.sync_assets_since_push,
            self.total_assets_lifespan,
        ] {
            hasher.update(&value.to_le_bytes());
        }
        hasher.update(&self.total_assets_expiration.to_le_bytes());
        hasher.update(&[self.is_total_assets_valid as u8]);
        for value in [
            self.total_supply,
            self.safe_asset_balance,
            self.pending_silo_asset_balance,
            self.pending_silo_share_balance,
        ] {
            hasher.update(&value.to_le_bytes());
        }
        match self.receiver {
            Some(key) => {
                hasher.update(&[1]);
                hasher.update(key.as_ref());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.update(&self.receiver_share_balance.to_le_bytes());
        for records in [&self.deposit_settles, &self.redeem_settles] {
            hasher.update(&(records.len() as u64).to_le_bytes());
            for record in records {
                for value in [
                    record.settle_id,
                    record.pending_assets,
                    record.pending_shares,
                    record.total_assets,
                    record.total_supply,
                ] {
                    hasher.update(&value.to_le_bytes());
                }
            }
        }
        hasher.finalize()
    }

    /// True when every field except the clock matches.
    pub fn same_state(&self, other: &VaultSnapshot) -> bool {
        let mut other = other.clone();
        other.timestamp = self.timestamp;
        other.digest = other.fingerprint();
        other.digest == self.digest
    }
}

fn serialize_pubkey<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

fn serialize_optional_pubkey<S: Serializer>(
    key: &Option<Pubkey>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.collect_str(key),
        None => serializer.serialize_none(),
    }
}

fn serialize_hash<S: Serializer>(hash: &blake3::Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(hash.to_hex().as_str())
}
