//! Before/after pairs captured around one guarded operation.

use crate::{
    operation::{Operation, OperationKind},
    snapshot::VaultSnapshot,
};

/// A field read from both snapshots of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delta<T> {
    pub before: T,
    pub after: T,
}

impl<T: PartialEq> Delta<T> {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

impl Delta<u64> {
    /// Signed change, wide enough for any pair of u64 values.
    pub fn signed(&self) -> i128 {
        i128::from(self.after) - i128::from(self.before)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    operation: Operation,
    pre: VaultSnapshot,
    post: VaultSnapshot,
}

impl Transition {
    pub fn new(operation: Operation, pre: VaultSnapshot, post: VaultSnapshot) -> Self {
        Self {
            operation,
            pre,
            post,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    pub fn pre(&self) -> &VaultSnapshot {
        &self.pre
    }

    pub fn post(&self) -> &VaultSnapshot {
        &self.post
    }

    /// Clock at which the operation executed.
    pub fn timestamp(&self) -> i64 {
        self.pre.timestamp
    }

    pub fn delta<T>(&self, field: impl Fn(&VaultSnapshot) -> T) -> Delta<T> {
        Delta {
            before: field(&self.pre),
            after: field(&self.post),
        }
    }

    pub fn deposit_epoch_id(&self) -> Delta<u64> {
        self.delta(|s| s.deposit_epoch_id)
    }

    pub fn redeem_epoch_id(&self) -> Delta<u64> {
        self.delta(|s| s.redeem_epoch_id)
    }

    pub fn total_assets(&self) -> Delta<u64> {
        self.delta(|s| s.total_assets)
    }

    pub fn safe_asset_balance(&self) -> Delta<u64> {
        self.delta(|s| s.safe_asset_balance)
    }

    pub fn pending_silo_asset_balance(&self) -> Delta<u64> {
        self.delta(|s| s.pending_silo_asset_balance)
    }

    pub fn receiver_share_balance(&self) -> Delta<u64> {
        self.delta(|s| s.receiver_share_balance)
    }

    pub fn total_assets_expiration(&self) -> Delta<i64> {
        self.delta(|s| s.total_assets_expiration)
    }

    /// The operation left every snapshot field except the clock untouched.
    pub fn is_noop(&self) -> bool {
        self.pre.same_state(&self.post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_delta() {
        let up = Delta { before: 1u64, after: 3u64 };
        assert_eq!(up.signed(), 2);
        assert!(up.changed());

        let down = Delta { before: 5u64, after: 1u64 };
        assert_eq!(down.signed(), -4);

        let wide = Delta { before: 0u64, after: u64::MAX };
        assert_eq!(wide.signed(), u64::MAX as i128);

        assert!(!Delta { before: 7u64, after: 7u64 }.changed());
    }
}
