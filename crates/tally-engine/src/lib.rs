//! Engine boundary for Tally.
//!
//! A session talks to a cluster only through the [`Engine`] and
//! [`EngineContext`] traits: submit an encoded batch, get exactly one
//! completion back, and call `drive` so pending work makes progress.
//!
//! [`MemoryEngine`] is a loopback cluster that applies batches to an
//! in-memory [`tally_ledger::Ledger`].

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use memory::MemoryEngine;
pub use traits::{Completion, Engine, EngineContext};
