use serde::{Deserialize, Serialize};
use tally_types::{
    AccountLookupResult, CommitTransferError, CommitTransferResult, CreateAccountError,
    CreateAccountResult, CreateTransferError, CreateTransferResult, Operation,
};

/// What the engine sends back for one batch.
///
/// Mutating operations report only failures as `(index, error)` pairs, plus
/// how many commands were evaluated; an index that does not appear succeeded.
/// Lookups report one entry per evaluated id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    CreateAccounts {
        evaluated: u32,
        errors: Vec<(u32, CreateAccountError)>,
    },
    CreateTransfers {
        evaluated: u32,
        errors: Vec<(u32, CreateTransferError)>,
    },
    CommitTransfers {
        evaluated: u32,
        errors: Vec<(u32, CommitTransferError)>,
    },
    LookupAccounts(Vec<AccountLookupResult>),
}

impl Reply {
    pub fn create_accounts(evaluated: usize, results: &[CreateAccountResult]) -> Self {
        Self::CreateAccounts {
            evaluated: evaluated as u32,
            errors: results
                .iter()
                .filter_map(|r| r.error.map(|e| (r.index, e)))
                .collect(),
        }
    }

    pub fn create_transfers(evaluated: usize, results: &[CreateTransferResult]) -> Self {
        Self::CreateTransfers {
            evaluated: evaluated as u32,
            errors: results
                .iter()
                .filter_map(|r| r.error.map(|e| (r.index, e)))
                .collect(),
        }
    }

    pub fn commit_transfers(evaluated: usize, results: &[CommitTransferResult]) -> Self {
        Self::CommitTransfers {
            evaluated: evaluated as u32,
            errors: results
                .iter()
                .filter_map(|r| r.error.map(|e| (r.index, e)))
                .collect(),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::CreateAccounts { .. } => Operation::CreateAccounts,
            Self::CreateTransfers { .. } => Operation::CreateTransfers,
            Self::CommitTransfers { .. } => Operation::CommitTransfers,
            Self::LookupAccounts(_) => Operation::LookupAccounts,
        }
    }

    /// Number of commands the engine evaluated before replying.
    pub fn evaluated(&self) -> usize {
        match self {
            Self::CreateAccounts { evaluated, .. }
            | Self::CreateTransfers { evaluated, .. }
            | Self::CommitTransfers { evaluated, .. } => *evaluated as usize,
            Self::LookupAccounts(results) => results.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_constructor_drops_successes() {
        let reply = Reply::create_accounts(
            3,
            &[
                CreateAccountResult::ok(0),
                CreateAccountResult::err(2, CreateAccountError::Exists),
            ],
        );
        assert_eq!(
            reply,
            Reply::CreateAccounts {
                evaluated: 3,
                errors: vec![(2, CreateAccountError::Exists)],
            }
        );
        assert_eq!(reply.evaluated(), 3);
        assert_eq!(reply.operation(), Operation::CreateAccounts);
    }

    #[test]
    fn lookup_evaluated_is_entry_count() {
        let reply = Reply::LookupAccounts(vec![
            AccountLookupResult::not_found(0),
            AccountLookupResult::not_found(1),
        ]);
        assert_eq!(reply.evaluated(), 2);
    }
}
