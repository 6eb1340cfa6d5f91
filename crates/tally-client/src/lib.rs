//! Client session for Tally.
//!
//! Open a [`Client`] through a [`SessionRegistry`], submit batches of
//! same-kind ledger commands, and receive one result per command, in batch
//! order. Systemic failures come back as [`ClientError`]; per-command
//! business errors come back inside the results.
//!
//! ```no_run
//! use tally_client::{ClientConfig, SessionRegistry};
//! use tally_engine::MemoryEngine;
//! use tally_types::CreateAccount;
//!
//! # async fn run() -> tally_client::ClientResult<()> {
//! let engine = MemoryEngine::default();
//! let client = SessionRegistry::global().open(&engine, ClientConfig::default())?;
//! let results = client
//!     .create_accounts(&[CreateAccount::with_limits(1, 1, 1_000)])
//!     .await?;
//! assert!(results[0].is_ok());
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod registry;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use registry::SessionRegistry;
