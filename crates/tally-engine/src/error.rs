use tally_ledger::LedgerError;
use tally_protocol::ProtocolError;
use tally_types::TypeError;
use thiserror::Error;

/// Systemic failures raised by an engine. Business outcomes never appear here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid replica addresses: {0}")]
    InvalidAddress(String),

    #[error("cluster mismatch: engine serves {expected:#x}, session asked for {actual:#x}")]
    ClusterMismatch { expected: u128, actual: u128 },

    #[error("engine context is closed")]
    Closed,

    #[error("engine state lock poisoned")]
    LockPoisoned,

    #[error("injected fault: {0}")]
    Injected(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<TypeError> for EngineError {
    fn from(err: TypeError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
