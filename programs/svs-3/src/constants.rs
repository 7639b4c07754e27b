pub const VAULT_SEED: &[u8] = b"vault";
pub const SHARES_MINT_SEED: &[u8] = b"shares";
pub const PENDING_SILO_SEED: &[u8] = b"pending_silo";
pub const CLAIMABLE_SEED: &[u8] = b"claimable";
pub const ASSETS_TAG: &[u8] = b"assets";
pub const SHARES_TAG: &[u8] = b"shares";
pub const DEPOSIT_SETTLE_SEED: &[u8] = b"deposit_settle";
pub const REDEEM_SETTLE_SEED: &[u8] = b"redeem_settle";
pub const EPOCH_SEED: &[u8] = b"epoch";
pub const DEPOSIT_REQUEST_SEED: &[u8] = b"deposit_request";
pub const REDEEM_REQUEST_SEED: &[u8] = b"redeem_request";

pub const MAX_DECIMALS: u8 = 9;
pub const SHARES_DECIMALS: u8 = 9;

pub const MIN_DEPOSIT_AMOUNT: u64 = 1000;

/// Deposit epochs are odd, redeem epochs are even.
pub const INITIAL_DEPOSIT_EPOCH_ID: u64 = 1;
pub const INITIAL_REDEEM_EPOCH_ID: u64 = 2;

/// An epoch only ever advances by this step, so its parity never changes.
pub const EPOCH_STEP: u64 = 2;

/// Epoch ids fit in 40 bits.
pub const MAX_EPOCH_ID: u64 = (1 << 40) - 1;

/// Marks `new_total_assets` as consumed by a settlement.
pub const NO_PENDING_VALUATION: u64 = u64::MAX;
