//! Per-command outcomes and the exhaustive error taxonomy of each operation.
//!
//! A business error is always a specific named condition. Callers branch on
//! the exact variant; there is deliberately no catch-all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::Account;

/// Why a single `CreateAccount` command was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateAccountError {
    #[error("account already exists")]
    Exists,
    #[error("account exists with a different unit")]
    ExistsWithDifferentUnit,
    #[error("account exists with different limits")]
    ExistsWithDifferentLimits,
    #[error("account exists with a different custom field")]
    ExistsWithDifferentCustomField,
    #[error("account exists with different flags")]
    ExistsWithDifferentFlags,
    #[error("reserved custom field is not zero")]
    ReservedFieldCustom,
    #[error("reserved padding is not zero")]
    ReservedFieldPadding,
    #[error("reserved timestamp field is not zero")]
    ReservedFieldTimestamp,
    #[error("reserved flag bits are set")]
    ReservedFlagPadding,
    #[error("debit reserved balance exceeds its limit")]
    ExceedsDebitReservedLimit,
    #[error("debit accepted balance exceeds its limit")]
    ExceedsDebitAcceptedLimit,
    #[error("credit reserved balance exceeds its limit")]
    ExceedsCreditReservedLimit,
    #[error("credit accepted balance exceeds its limit")]
    ExceedsCreditAcceptedLimit,
    #[error("debit reserved limit exceeds debit accepted limit")]
    DebitReservedLimitExceedsDebitAcceptedLimit,
    #[error("credit reserved limit exceeds credit accepted limit")]
    CreditReservedLimitExceedsCreditAcceptedLimit,
}

impl CreateAccountError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::ExistsWithDifferentUnit => "exists_with_different_unit",
            Self::ExistsWithDifferentLimits => "exists_with_different_limits",
            Self::ExistsWithDifferentCustomField => "exists_with_different_custom_field",
            Self::ExistsWithDifferentFlags => "exists_with_different_flags",
            Self::ReservedFieldCustom => "reserved_field_custom",
            Self::ReservedFieldPadding => "reserved_field_padding",
            Self::ReservedFieldTimestamp => "reserved_field_timestamp",
            Self::ReservedFlagPadding => "reserved_flag_padding",
            Self::ExceedsDebitReservedLimit => "exceeds_debit_reserved_limit",
            Self::ExceedsDebitAcceptedLimit => "exceeds_debit_accepted_limit",
            Self::ExceedsCreditReservedLimit => "exceeds_credit_reserved_limit",
            Self::ExceedsCreditAcceptedLimit => "exceeds_credit_accepted_limit",
            Self::DebitReservedLimitExceedsDebitAcceptedLimit => {
                "debit_reserved_limit_exceeds_debit_accepted_limit"
            }
            Self::CreditReservedLimitExceedsCreditAcceptedLimit => {
                "credit_reserved_limit_exceeds_credit_accepted_limit"
            }
        }
    }
}

/// Why a single `CreateTransfer` command was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateTransferError {
    #[error("transfer already exists")]
    Exists,
    #[error("transfer exists with a different debit account")]
    ExistsWithDifferentDebitAccountId,
    #[error("transfer exists with a different credit account")]
    ExistsWithDifferentCreditAccountId,
    #[error("transfer exists with different custom fields")]
    ExistsWithDifferentCustomFields,
    #[error("transfer exists with a different amount")]
    ExistsWithDifferentAmount,
    #[error("transfer exists with a different timeout")]
    ExistsWithDifferentTimeout,
    #[error("transfer exists with different flags")]
    ExistsWithDifferentFlags,
    #[error("transfer exists and was already committed and accepted")]
    ExistsAndAlreadyCommittedAndAccepted,
    #[error("transfer exists and was already committed and rejected")]
    ExistsAndAlreadyCommittedAndRejected,
    #[error("reserved custom fields are not zero")]
    ReservedFieldCustom,
    #[error("reserved timestamp field is not zero")]
    ReservedFieldTimestamp,
    #[error("reserved flag bits are set")]
    ReservedFlagPadding,
    #[error("accept flag is reserved on a transfer that is not auto-committed")]
    ReservedFlagAccept,
    #[error("reject flag is reserved on a transfer")]
    ReservedFlagReject,
    #[error("debit account not found")]
    DebitAccountNotFound,
    #[error("credit account not found")]
    CreditAccountNotFound,
    #[error("debit and credit accounts are the same")]
    AccountsAreTheSame,
    #[error("debit and credit accounts have different units")]
    AccountsHaveDifferentUnits,
    #[error("amount is zero")]
    AmountIsZero,
    #[error("transfer would exceed the debit reserved limit")]
    ExceedsDebitReservedLimit,
    #[error("transfer would exceed the debit accepted limit")]
    ExceedsDebitAcceptedLimit,
    #[error("transfer would exceed the credit reserved limit")]
    ExceedsCreditReservedLimit,
    #[error("transfer would exceed the credit accepted limit")]
    ExceedsCreditAcceptedLimit,
    #[error("auto-commit transfer must accept")]
    AutoCommitMustAccept,
    #[error("auto-commit transfer cannot time out")]
    AutoCommitCannotTimeout,
}

impl CreateTransferError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::ExistsWithDifferentDebitAccountId => "exists_with_different_debit_account_id",
            Self::ExistsWithDifferentCreditAccountId => "exists_with_different_credit_account_id",
            Self::ExistsWithDifferentCustomFields => "exists_with_different_custom_fields",
            Self::ExistsWithDifferentAmount => "exists_with_different_amount",
            Self::ExistsWithDifferentTimeout => "exists_with_different_timeout",
            Self::ExistsWithDifferentFlags => "exists_with_different_flags",
            Self::ExistsAndAlreadyCommittedAndAccepted => {
                "exists_and_already_committed_and_accepted"
            }
            Self::ExistsAndAlreadyCommittedAndRejected => {
                "exists_and_already_committed_and_rejected"
            }
            Self::ReservedFieldCustom => "reserved_field_custom",
            Self::ReservedFieldTimestamp => "reserved_field_timestamp",
            Self::ReservedFlagPadding => "reserved_flag_padding",
            Self::ReservedFlagAccept => "reserved_flag_accept",
            Self::ReservedFlagReject => "reserved_flag_reject",
            Self::DebitAccountNotFound => "debit_account_not_found",
            Self::CreditAccountNotFound => "credit_account_not_found",
            Self::AccountsAreTheSame => "accounts_are_the_same",
            Self::AccountsHaveDifferentUnits => "accounts_have_different_units",
            Self::AmountIsZero => "amount_is_zero",
            Self::ExceedsDebitReservedLimit => "exceeds_debit_reserved_limit",
            Self::ExceedsDebitAcceptedLimit => "exceeds_debit_accepted_limit",
            Self::ExceedsCreditReservedLimit => "exceeds_credit_reserved_limit",
            Self::ExceedsCreditAcceptedLimit => "exceeds_credit_accepted_limit",
            Self::AutoCommitMustAccept => "auto_commit_must_accept",
            Self::AutoCommitCannotTimeout => "auto_commit_cannot_timeout",
        }
    }
}

/// Why a single `CommitTransfer` command was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitTransferError {
    #[error("reserved custom fields are not zero")]
    ReservedFieldCustom,
    #[error("reserved timestamp field is not zero")]
    ReservedFieldTimestamp,
    #[error("reserved flag bits are set")]
    ReservedFlagPadding,
    #[error("commit must accept or reject")]
    CommitMustAcceptOrReject,
    #[error("commit cannot both accept and reject")]
    CommitCannotAcceptAndReject,
    #[error("transfer not found")]
    TransferNotFound,
    #[error("transfer expired")]
    TransferExpired,
    #[error("transfer was already auto-committed")]
    AlreadyAutoCommitted,
    #[error("transfer was already committed")]
    AlreadyCommitted,
    #[error("transfer was already committed, but accepted")]
    AlreadyCommittedButAccepted,
    #[error("transfer was already committed, but rejected")]
    AlreadyCommittedButRejected,
    #[error("debit account not found")]
    DebitAccountNotFound,
    #[error("credit account not found")]
    CreditAccountNotFound,
    #[error("debit amount was not reserved")]
    DebitAmountWasNotReserved,
    #[error("credit amount was not reserved")]
    CreditAmountWasNotReserved,
    #[error("commit would exceed the debit accepted limit")]
    ExceedsDebitAcceptedLimit,
    #[error("commit would exceed the credit accepted limit")]
    ExceedsCreditAcceptedLimit,
    #[error("transfer condition requires a pre-image")]
    ConditionRequiresPreimage,
    #[error("pre-image given for a transfer without a condition")]
    PreimageRequiresCondition,
    #[error("pre-image does not match the transfer condition")]
    PreimageInvalid,
}

impl CommitTransferError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReservedFieldCustom => "reserved_field_custom",
            Self::ReservedFieldTimestamp => "reserved_field_timestamp",
            Self::ReservedFlagPadding => "reserved_flag_padding",
            Self::CommitMustAcceptOrReject => "commit_must_accept_or_reject",
            Self::CommitCannotAcceptAndReject => "commit_cannot_accept_and_reject",
            Self::TransferNotFound => "transfer_not_found",
            Self::TransferExpired => "transfer_expired",
            Self::AlreadyAutoCommitted => "already_auto_committed",
            Self::AlreadyCommitted => "already_committed",
            Self::AlreadyCommittedButAccepted => "already_committed_but_accepted",
            Self::AlreadyCommittedButRejected => "already_committed_but_rejected",
            Self::DebitAccountNotFound => "debit_account_not_found",
            Self::CreditAccountNotFound => "credit_account_not_found",
            Self::DebitAmountWasNotReserved => "debit_amount_was_not_reserved",
            Self::CreditAmountWasNotReserved => "credit_amount_was_not_reserved",
            Self::ExceedsDebitAcceptedLimit => "exceeds_debit_accepted_limit",
            Self::ExceedsCreditAcceptedLimit => "exceeds_credit_accepted_limit",
            Self::ConditionRequiresPreimage => "condition_requires_preimage",
            Self::PreimageRequiresCondition => "preimage_requires_condition",
            Self::PreimageInvalid => "preimage_invalid",
        }
    }
}

/// Why an account lookup produced no account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountLookupError {
    #[error("account not found")]
    NotFound,
}

impl AccountLookupError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
        }
    }
}

macro_rules! indexed_result {
    ($(#[$meta:meta])* $name:ident, $error:ty) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Position of the command in its batch.
            pub index: u32,
            /// `None` when the command was applied.
            pub error: Option<$error>,
        }

        impl $name {
            pub fn ok(index: u32) -> Self {
                Self { index, error: None }
            }

            pub fn err(index: u32, error: $error) -> Self {
                Self {
                    index,
                    error: Some(error),
                }
            }

            pub fn is_ok(&self) -> bool {
                self.error.is_none()
            }
        }
    };
}

indexed_result!(
    /// Outcome of one `CreateAccount` command.
    CreateAccountResult,
    CreateAccountError
);
indexed_result!(
    /// Outcome of one `CreateTransfer` command.
    CreateTransferResult,
    CreateTransferError
);
indexed_result!(
    /// Outcome of one `CommitTransfer` command.
    CommitTransferResult,
    CommitTransferError
);

/// Outcome of one account lookup: the account, or why there is none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountLookupResult {
    Found(Account),
    Missing { index: u32, error: AccountLookupError },
}

impl AccountLookupResult {
    pub fn not_found(index: u32) -> Self {
        Self::Missing {
            index,
            error: AccountLookupError::NotFound,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            Self::Found(account) => Some(account),
            Self::Missing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_names_match_serde_names() {
        let samples = [
            CreateAccountError::DebitReservedLimitExceedsDebitAcceptedLimit,
            CreateAccountError::ExistsWithDifferentCustomField,
        ];
        for e in samples {
            let json = serde_json::to_string(&e).unwrap();
            assert_eq!(json, format!("\"{}\"", e.as_str()));
        }

        let json = serde_json::to_string(&CreateTransferError::ExistsAndAlreadyCommittedAndRejected)
            .unwrap();
        assert_eq!(json, "\"exists_and_already_committed_and_rejected\"");

        let json =
            serde_json::to_string(&CommitTransferError::AlreadyCommittedButAccepted).unwrap();
        assert_eq!(json, "\"already_committed_but_accepted\"");
    }

    #[test]
    fn limit_errors_are_distinct() {
        assert_ne!(
            CreateTransferError::ExceedsDebitReservedLimit,
            CreateTransferError::ExceedsDebitAcceptedLimit
        );
        assert_ne!(
            CreateTransferError::ExceedsDebitReservedLimit.as_str(),
            CreateTransferError::ExceedsCreditReservedLimit.as_str()
        );
    }

    #[test]
    fn indexed_result_helpers() {
        assert!(CreateAccountResult::ok(3).is_ok());
        let r = CommitTransferResult::err(1, CommitTransferError::TransferNotFound);
        assert!(!r.is_ok());
        assert_eq!(r.index, 1);
    }

    #[test]
    fn lookup_missing_has_no_account() {
        let r = AccountLookupResult::not_found(4);
        assert!(r.account().is_none());
        assert_eq!(
            r,
            AccountLookupResult::Missing {
                index: 4,
                error: AccountLookupError::NotFound
            }
        );
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            CommitTransferError::PreimageInvalid.to_string(),
            "pre-image does not match the transfer condition"
        );
        assert_eq!(AccountLookupError::NotFound.to_string(), "account not found");
    }
}
