//! Foundation types for Tally.
//!
//! This crate holds the value objects exchanged between Tally clients and a
//! ledger cluster, together with the exhaustive per-operation error
//! taxonomies. Every other Tally crate depends on `tally-types`.
//!
//! # Key Types
//!
//! - [`Account`] / [`CreateAccount`]: double-entry accounts with reserved and
//!   accepted sub-balances and a limit for each
//! - [`CreateTransfer`]: a two-phase transfer between two accounts
//! - [`CommitTransfer`]: accepts or rejects a pending transfer
//! - [`Operation`], [`Batch`], [`Results`]: same-kind command batches and their
//!   positionally aligned results
//! - [`ReplicaAddress`]: a replica endpoint as given in client configuration

pub mod account;
pub mod address;
pub mod batch;
pub mod condition;
pub mod error;
pub mod flags;
pub mod id;
pub mod results;
pub mod transfer;

pub use account::{Account, CreateAccount};
pub use address::ReplicaAddress;
pub use batch::{Batch, Operation, Results};
pub use condition::{condition_for, join_custom, split_custom};
pub use error::{TypeError, TypeResult};
pub use flags::{AccountFlags, CommitFlags, TransferFlags};
pub use results::{
    AccountLookupError, AccountLookupResult, CommitTransferError, CommitTransferResult,
    CreateAccountError, CreateAccountResult, CreateTransferError, CreateTransferResult,
};
pub use transfer::{CommitTransfer, CreateTransfer};
