pub mod admin;
pub mod claim;
pub mod initialize;
pub mod request;
pub mod settle;
pub mod sync_deposit;
pub mod update_new_total_assets;

#[allow(ambiguous_glob_reexports)]
pub use admin::*;
#[allow(ambiguous_glob_reexports)]
pub use claim::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize::*;
#[allow(ambiguous_glob_reexports)]
pub use request::*;
#[allow(ambiguous_glob_reexports)]
pub use settle::*;
#[allow(ambiguous_glob_reexports)]
pub use sync_deposit::*;
#[allow(ambiguous_glob_reexports)]
pub use update_new_total_assets::*;
