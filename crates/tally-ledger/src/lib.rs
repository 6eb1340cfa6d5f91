//! Reference double-entry state machine for Tally.
//!
//! This crate is the executable form of the ledger operation contract. It
//! provides:
//! - [`Ledger`], an in-memory state machine applying create-account,
//!   create-transfer, commit-transfer and lookup batches
//! - Server-side expiry of pending transfers
//! - [`Clock`] boundaries so tests can drive time by hand

pub mod clock;
pub mod config;
pub mod error;
pub mod memory;
pub mod transfer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LedgerConfig, ZeroTimeout};
pub use error::{LedgerError, LedgerResult};
pub use memory::Ledger;
pub use transfer::{TransferRecord, TransferState};
