use serde::{Deserialize, Serialize};

use crate::condition::{join_custom, split_custom};
use crate::flags::{CommitFlags, TransferFlags};
use crate::results::{CommitTransferError, CreateTransferError};

/// Command creating one two-phase transfer.
///
/// A pending transfer reserves `amount` on the debit side of
/// `debit_account_id` and the credit side of `credit_account_id` until a
/// [`CommitTransfer`] accepts or rejects it, or its timeout elapses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateTransfer {
    pub id: u128,
    pub debit_account_id: u128,
    pub credit_account_id: u128,
    pub custom_1: u128,
    /// With [`TransferFlags::CONDITION`], the low half of the condition.
    pub custom_2: u128,
    /// With [`TransferFlags::CONDITION`], the high half of the condition.
    pub custom_3: u128,
    pub flags: TransferFlags,
    pub amount: u64,
    /// Nanoseconds after creation at which a pending transfer expires.
    pub timeout: u64,
    /// Assigned by the engine; must be zero on submission.
    #[serde(default)]
    pub timestamp: u64,
}

impl CreateTransfer {
    pub fn new(id: u128, debit_account_id: u128, credit_account_id: u128, amount: u64) -> Self {
        Self {
            id,
            debit_account_id,
            credit_account_id,
            amount,
            ..Self::default()
        }
    }

    /// Settle at creation instead of reserving.
    pub fn auto_committed(mut self) -> Self {
        self.flags = self
            .flags
            .with(TransferFlags::AUTO_COMMIT)
            .with(TransferFlags::ACCEPT);
        self
    }

    /// Lock the transfer behind `condition`; committing it then needs the
    /// pre-image hashing to it.
    pub fn with_condition(mut self, condition: &[u8; 32]) -> Self {
        let (lo, hi) = split_custom(condition);
        self.custom_2 = lo;
        self.custom_3 = hi;
        self.flags = self.flags.with(TransferFlags::CONDITION);
        self
    }

    /// Reserved fields and reserved flag bits. Runs before any business rule.
    pub fn check_reserved(&self) -> Result<(), CreateTransferError> {
        if self.flags.padding() != 0 {
            return Err(CreateTransferError::ReservedFlagPadding);
        }
        if !self.flags.auto_commit() {
            if self.flags.contains(TransferFlags::ACCEPT) {
                return Err(CreateTransferError::ReservedFlagAccept);
            }
            if self.flags.contains(TransferFlags::REJECT) {
                return Err(CreateTransferError::ReservedFlagReject);
            }
        }
        if !self.flags.condition() && (self.custom_2 != 0 || self.custom_3 != 0) {
            return Err(CreateTransferError::ReservedFieldCustom);
        }
        if self.timestamp != 0 {
            return Err(CreateTransferError::ReservedFieldTimestamp);
        }
        Ok(())
    }

    /// Rules that need no ledger state: auto-commit shape, amount, accounts.
    pub fn check_shape(&self) -> Result<(), CreateTransferError> {
        if self.flags.auto_commit() {
            if !self.flags.contains(TransferFlags::ACCEPT)
                || self.flags.contains(TransferFlags::REJECT)
            {
                return Err(CreateTransferError::AutoCommitMustAccept);
            }
            if self.timeout != 0 {
                return Err(CreateTransferError::AutoCommitCannotTimeout);
            }
        }
        if self.amount == 0 {
            return Err(CreateTransferError::AmountIsZero);
        }
        if self.debit_account_id == self.credit_account_id {
            return Err(CreateTransferError::AccountsAreTheSame);
        }
        Ok(())
    }

    /// First field that differs from a stored transfer with the same id.
    pub fn first_difference(&self, existing: &CreateTransfer) -> Option<CreateTransferError> {
        if self.debit_account_id != existing.debit_account_id {
            Some(CreateTransferError::ExistsWithDifferentDebitAccountId)
        } else if self.credit_account_id != existing.credit_account_id {
            Some(CreateTransferError::ExistsWithDifferentCreditAccountId)
        } else if self.custom_1 != existing.custom_1
            || self.custom_2 != existing.custom_2
            || self.custom_3 != existing.custom_3
        {
            Some(CreateTransferError::ExistsWithDifferentCustomFields)
        } else if self.amount != existing.amount {
            Some(CreateTransferError::ExistsWithDifferentAmount)
        } else if self.timeout != existing.timeout {
            Some(CreateTransferError::ExistsWithDifferentTimeout)
        } else if self.flags != existing.flags {
            Some(CreateTransferError::ExistsWithDifferentFlags)
        } else {
            None
        }
    }

    /// The hash condition, when [`TransferFlags::CONDITION`] is set.
    pub fn condition(&self) -> Option<[u8; 32]> {
        self.flags
            .condition()
            .then(|| join_custom(self.custom_2, self.custom_3))
    }
}

/// Command resolving one pending transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitTransfer {
    /// Id of the transfer being committed.
    pub id: u128,
    pub custom_1: u128,
    /// With [`CommitFlags::PREIMAGE`], the low half of the pre-image.
    pub custom_2: u128,
    /// With [`CommitFlags::PREIMAGE`], the high half of the pre-image.
    pub custom_3: u128,
    pub flags: CommitFlags,
    /// Assigned by the engine; must be zero on submission.
    #[serde(default)]
    pub timestamp: u64,
}

impl CommitTransfer {
    pub fn accept(id: u128) -> Self {
        Self {
            id,
            flags: CommitFlags::from_bits(CommitFlags::ACCEPT),
            ..Self::default()
        }
    }

    pub fn reject(id: u128) -> Self {
        Self {
            id,
            flags: CommitFlags::from_bits(CommitFlags::REJECT),
            ..Self::default()
        }
    }

    /// Attach a pre-image, setting [`CommitFlags::PREIMAGE`].
    pub fn with_preimage(mut self, preimage: &[u8; 32]) -> Self {
        let (lo, hi) = split_custom(preimage);
        self.custom_2 = lo;
        self.custom_3 = hi;
        self.flags = self.flags.with(CommitFlags::PREIMAGE);
        self
    }

    /// Reserved fields and reserved flag bits. Runs before any business rule.
    pub fn check_reserved(&self) -> Result<(), CommitTransferError> {
        if self.flags.padding() != 0 {
            return Err(CommitTransferError::ReservedFlagPadding);
        }
        if !self.flags.preimage() && (self.custom_2 != 0 || self.custom_3 != 0) {
            return Err(CommitTransferError::ReservedFieldCustom);
        }
        if self.timestamp != 0 {
            return Err(CommitTransferError::ReservedFieldTimestamp);
        }
        Ok(())
    }

    /// Exactly one of accept or reject.
    pub fn check_shape(&self) -> Result<(), CommitTransferError> {
        match (self.flags.accept(), self.flags.reject()) {
            (false, false) => Err(CommitTransferError::CommitMustAcceptOrReject),
            (true, true) => Err(CommitTransferError::CommitCannotAcceptAndReject),
            _ => Ok(()),
        }
    }

    /// The pre-image, when [`CommitFlags::PREIMAGE`] is set.
    pub fn preimage(&self) -> Option<[u8; 32]> {
        self.flags
            .preimage()
            .then(|| join_custom(self.custom_2, self.custom_3))
    }
}
