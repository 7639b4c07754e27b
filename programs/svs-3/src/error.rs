use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Slippage tolerance exceeded")]
    SlippageExceeded,

    #[msg("Asset decimals must be <= 9")]
    InvalidAssetDecimals,

    #[msg("Arithmetic overflow")]
    MathOverflow,

    #[msg("Division by zero")]
    DivisionByZero,

    #[msg("Insufficient shares balance")]
    InsufficientShares,

    #[msg("Insufficient assets in safe")]
    InsufficientAssets,

    #[msg("Unauthorized - caller does not hold the required role")]
    Unauthorized,

    #[msg("Deposit amount below minimum threshold")]
    DepositTooSmall,

    #[msg("Total assets are valid - only synchronous deposits are allowed")]
    SyncDepositOnly,

    #[msg("Total assets are expired - only deposit requests are allowed")]
    AsyncDepositOnly,

    #[msg("No pending amount recorded for the current settle id")]
    NothingToSettle,

    #[msg("Settlement valuation does not match the pushed total assets")]
    StaleValuation,

    #[msg("Request epoch has not been settled yet")]
    RequestNotSettled,

    #[msg("Previous request must be claimed before requesting in a new epoch")]
    RequestNotClaimed,

    #[msg("Epoch or settle record does not belong to this request")]
    EpochMismatch,
}
