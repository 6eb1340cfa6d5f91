use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::account::CreateAccount;
use crate::error::{TypeError, TypeResult};
use crate::results::{
    AccountLookupResult, CommitTransferResult, CreateAccountResult, CreateTransferResult,
};
use crate::transfer::{CommitTransfer, CreateTransfer};

/// Ledger operation kinds. The discriminant is the wire code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Operation {
    CreateAccounts = 2,
    CreateTransfers = 3,
    CommitTransfers = 4,
    LookupAccounts = 5,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Self::CreateAccounts,
        Self::CreateTransfers,
        Self::CommitTransfers,
        Self::LookupAccounts,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateAccounts => "create_accounts",
            Self::CreateTransfers => "create_transfers",
            Self::CommitTransfers => "commit_transfers",
            Self::LookupAccounts => "lookup_accounts",
        }
    }

    /// Whether the operation can change ledger state.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::LookupAccounts)
    }
}

impl TryFrom<u8> for Operation {
    type Error = TypeError;

    fn try_from(code: u8) -> TypeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.code() == code)
            .ok_or(TypeError::UnknownOperation(code))
    }
}

impl FromStr for Operation {
    type Err = TypeError;

    fn from_str(s: &str) -> TypeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| TypeError::UnknownOperationName(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered sequence of commands that all share one operation kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Batch {
    CreateAccounts(Vec<CreateAccount>),
    CreateTransfers(Vec<CreateTransfer>),
    CommitTransfers(Vec<CommitTransfer>),
    LookupAccounts(Vec<u128>),
}

impl Batch {
    pub fn operation(&self) -> Operation {
        match self {
            Self::CreateAccounts(_) => Operation::CreateAccounts,
            Self::CreateTransfers(_) => Operation::CreateTransfers,
            Self::CommitTransfers(_) => Operation::CommitTransfers,
            Self::LookupAccounts(_) => Operation::LookupAccounts,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::CreateAccounts(v) => v.len(),
            Self::CreateTransfers(v) => v.len(),
            Self::CommitTransfers(v) => v.len(),
            Self::LookupAccounts(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-command outcomes of one batch, positionally aligned with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Results {
    CreateAccounts(Vec<CreateAccountResult>),
    CreateTransfers(Vec<CreateTransferResult>),
    CommitTransfers(Vec<CommitTransferResult>),
    LookupAccounts(Vec<AccountLookupResult>),
}

impl Results {
    pub fn operation(&self) -> Operation {
        match self {
            Self::CreateAccounts(_) => Operation::CreateAccounts,
            Self::CreateTransfers(_) => Operation::CreateTransfers,
            Self::CommitTransfers(_) => Operation::CommitTransfers,
            Self::LookupAccounts(_) => Operation::LookupAccounts,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::CreateAccounts(v) => v.len(),
            Self::CreateTransfers(v) => v.len(),
            Self::CommitTransfers(v) => v.len(),
            Self::LookupAccounts(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of commands that reported a business error.
    pub fn error_count(&self) -> usize {
        match self {
            Self::CreateAccounts(v) => v.iter().filter(|r| !r.is_ok()).count(),
            Self::CreateTransfers(v) => v.iter().filter(|r| !r.is_ok()).count(),
            Self::CommitTransfers(v) => v.iter().filter(|r| !r.is_ok()).count(),
            Self::LookupAccounts(v) => v.iter().filter(|r| r.account().is_none()).count(),
        }
    }
}
