use trident_fuzz::fuzzing::*;

/// Storage for all account addresses used in fuzz testing.
///
/// This struct serves as a centralized repository for account addresses,
/// enabling their reuse across different instruction flows and test scenarios.
///
/// Docs: https://ackee.xyz/trident/docs/latest/trident-api-macro/trident-types/fuzz-accounts/
#[derive(Default)]
pub struct AccountAddresses {
    pub vault: AddressStorage,

    pub authority: AddressStorage,

    pub valuation_manager: AddressStorage,

    pub curator: AddressStorage,

    pub depositor: AddressStorage,

    pub asset_mint: AddressStorage,

    pub shares_mint: AddressStorage,

    pub safe_asset_account: AddressStorage,

    pub pending_silo_assets: AddressStorage,

    pub pending_silo_shares: AddressStorage,

    pub claimable_assets: AddressStorage,

    pub claimable_shares: AddressStorage,

    pub deposit_settle: AddressStorage,

    pub redeem_settle: AddressStorage,

    pub epoch: AddressStorage,

    pub deposit_request: AddressStorage,

    pub redeem_request: AddressStorage,
}
