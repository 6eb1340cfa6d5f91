use serde::{Deserialize, Serialize};

use crate::flags::AccountFlags;
use crate::results::CreateAccountError;

/// A ledger account as stored by the engine and returned by lookups.
///
/// Debits and credits are tracked independently. Each side is split into a
/// *reserved* sub-balance (held by pending transfers) and an *accepted*
/// sub-balance (settled), and every sub-balance has its own limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub id: u128,
    pub custom: u128,
    pub flags: AccountFlags,
    pub unit: u64,
    pub debit_accepted: u64,
    pub debit_reserved: u64,
    pub credit_accepted: u64,
    pub credit_reserved: u64,
    pub debit_accepted_limit: u64,
    pub debit_reserved_limit: u64,
    pub credit_accepted_limit: u64,
    pub credit_reserved_limit: u64,
    /// Engine-assigned creation time in nanoseconds.
    pub timestamp: u64,
}

/// Command creating one account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateAccount {
    pub id: u128,
    pub custom: u128,
    /// Reserved second custom slot; must be zero.
    #[serde(default)]
    pub reserved_custom: u128,
    pub flags: AccountFlags,
    pub unit: u64,
    pub debit_accepted: u64,
    pub debit_reserved: u64,
    pub credit_accepted: u64,
    pub credit_reserved: u64,
    pub debit_accepted_limit: u64,
    pub debit_reserved_limit: u64,
    pub credit_accepted_limit: u64,
    pub credit_reserved_limit: u64,
    /// Reserved; must be zero.
    #[serde(default)]
    pub padding: u64,
    /// Creation timeout slot. Accounts never expire and their timestamp is
    /// assigned by the engine, so this must be zero.
    #[serde(default)]
    pub timeout: u64,
}

impl CreateAccount {
    /// An account with every limit set to `limit` and zero balances.
    pub fn with_limits(id: u128, unit: u64, limit: u64) -> Self {
        Self {
            id,
            unit,
            debit_accepted_limit: limit,
            debit_reserved_limit: limit,
            credit_accepted_limit: limit,
            credit_reserved_limit: limit,
            ..Self::default()
        }
    }

    /// Reserved fields and reserved flag bits. Runs before any business rule.
    pub fn check_reserved(&self) -> Result<(), CreateAccountError> {
        if self.reserved_custom != 0 {
            return Err(CreateAccountError::ReservedFieldCustom);
        }
        if self.padding != 0 {
            return Err(CreateAccountError::ReservedFieldPadding);
        }
        if self.timeout != 0 {
            return Err(CreateAccountError::ReservedFieldTimestamp);
        }
        if self.flags.padding() != 0 {
            return Err(CreateAccountError::ReservedFlagPadding);
        }
        Ok(())
    }

    /// Limit ordering, then each opening balance against its limit.
    pub fn check_limits(&self) -> Result<(), CreateAccountError> {
        if self.debit_reserved_limit > self.debit_accepted_limit {
            return Err(CreateAccountError::DebitReservedLimitExceedsDebitAcceptedLimit);
        }
        if self.credit_reserved_limit > self.credit_accepted_limit {
            return Err(CreateAccountError::CreditReservedLimitExceedsCreditAcceptedLimit);
        }
        if self.debit_reserved > self.debit_reserved_limit {
            return Err(CreateAccountError::ExceedsDebitReservedLimit);
        }
        if self.debit_accepted > self.debit_accepted_limit {
            return Err(CreateAccountError::ExceedsDebitAcceptedLimit);
        }
        if self.credit_reserved > self.credit_reserved_limit {
            return Err(CreateAccountError::ExceedsCreditReservedLimit);
        }
        if self.credit_accepted > self.credit_accepted_limit {
            return Err(CreateAccountError::ExceedsCreditAcceptedLimit);
        }
        Ok(())
    }

    /// Compare against an already stored account with the same id.
    ///
    /// Always returns an error: either the specific mismatching field, or
    /// [`CreateAccountError::Exists`] when the command is identical.
    pub fn compare_existing(&self, existing: &Account) -> CreateAccountError {
        if self.unit != existing.unit {
            CreateAccountError::ExistsWithDifferentUnit
        } else if !self.same_limits(existing) {
            CreateAccountError::ExistsWithDifferentLimits
        } else if self.custom != existing.custom {
            CreateAccountError::ExistsWithDifferentCustomField
        } else if self.flags != existing.flags {
            CreateAccountError::ExistsWithDifferentFlags
        } else {
            CreateAccountError::Exists
        }
    }

    fn same_limits(&self, existing: &Account) -> bool {
        self.debit_accepted_limit == existing.debit_accepted_limit
            && self.debit_reserved_limit == existing.debit_reserved_limit
            && self.credit_accepted_limit == existing.credit_accepted_limit
            && self.credit_reserved_limit == existing.credit_reserved_limit
    }

    /// The stored form of this command.
    pub fn into_account(self, timestamp: u64) -> Account {
        Account {
            id: self.id,
            custom: self.custom,
            flags: self.flags,
            unit: self.unit,
            debit_accepted: self.debit_accepted,
            debit_reserved: self.debit_reserved,
            credit_accepted: self.credit_accepted,
            credit_reserved: self.credit_reserved,
            debit_accepted_limit: self.debit_accepted_limit,
            debit_reserved_limit: self.debit_reserved_limit,
            credit_accepted_limit: self.credit_accepted_limit,
            credit_reserved_limit: self.credit_reserved_limit,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> CreateAccount {
        CreateAccount::with_limits(1, 7, 100)
    }

    #[test]
    fn default_limits_helper_is_valid() {
        let a = account();
        assert_eq!(a.check_reserved(), Ok(()));
        assert_eq!(a.check_limits(), Ok(()));
    }

    #[test]
    fn reserved_fields_are_checked_in_order() {
        let mut a = account();
        a.reserved_custom = 1;
        a.padding = 1;
        assert_eq!(a.check_reserved(), Err(CreateAccountError::ReservedFieldCustom));

        a.reserved_custom = 0;
        assert_eq!(a.check_reserved(), Err(CreateAccountError::ReservedFieldPadding));

        a.padding = 0;
        a.timeout = 5;
        assert_eq!(a.check_reserved(), Err(CreateAccountError::ReservedFieldTimestamp));

        a.timeout = 0;
        a.flags = AccountFlags::from_bits(1 << 63);
        assert_eq!(a.check_reserved(), Err(CreateAccountError::ReservedFlagPadding));
    }

    #[test]
    fn reserved_limit_must_not_exceed_accepted_limit() {
        let mut a = account();
        a.debit_reserved_limit = 101;
        assert_eq!(
            a.check_limits(),
            Err(CreateAccountError::DebitReservedLimitExceedsDebitAcceptedLimit)
        );

        let mut a = account();
        a.credit_reserved_limit = 101;
        assert_eq!(
            a.check_limits(),
            Err(CreateAccountError::CreditReservedLimitExceedsCreditAcceptedLimit)
        );
    }

    #[test]
    fn opening_balances_are_checked_against_each_limit() {
        let cases = [
            (
                CreateAccount {
                    debit_reserved: 101,
                    ..account()
                },
                CreateAccountError::ExceedsDebitReservedLimit,
            ),
            (
                CreateAccount {
                    debit_accepted: 101,
                    ..account()
                },
                CreateAccountError::ExceedsDebitAcceptedLimit,
            ),
            (
                CreateAccount {
                    credit_reserved: 101,
                    ..account()
                },
                CreateAccountError::ExceedsCreditReservedLimit,
            ),
            (
                CreateAccount {
                    credit_accepted: 101,
                    ..account()
                },
                CreateAccountError::ExceedsCreditAcceptedLimit,
            ),
        ];
        for (command, expected) in cases {
            assert_eq!(command.check_limits(), Err(expected));
        }
    }

    #[test]
    fn compare_existing_reports_specific_field() {
        let stored = account().into_account(10);
        assert_eq!(account().compare_existing(&stored), CreateAccountError::Exists);

        let changed = CreateAccount {
            unit: 8,
            ..account()
        };
        assert_eq!(
            changed.compare_existing(&stored),
            CreateAccountError::ExistsWithDifferentUnit
        );

        let changed = CreateAccount {
            credit_accepted_limit: 200,
            ..account()
        };
        assert_eq!(
            changed.compare_existing(&stored),
            CreateAccountError::ExistsWithDifferentLimits
        );

        let changed = CreateAccount {
            custom: 9,
            ..account()
        };
        assert_eq!(
            changed.compare_existing(&stored),
            CreateAccountError::ExistsWithDifferentCustomField
        );

        let changed = CreateAccount {
            flags: AccountFlags::from_bits(2),
            ..account()
        };
        assert_eq!(
            changed.compare_existing(&stored),
            CreateAccountError::ExistsWithDifferentFlags
        );
    }

    #[test]
    fn into_account_keeps_balances() {
        let a = CreateAccount {
            debit_accepted: 5,
            credit_reserved: 3,
            ..account()
        }
        .into_account(42);
        assert_eq!(a.timestamp, 42);
        assert_eq!(a.debit_accepted, 5);
        assert_eq!(a.credit_reserved, 3);
        assert_eq!(a.debit_reserved_limit, 100);
    }
}
