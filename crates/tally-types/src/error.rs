use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown operation code: {0}")]
    UnknownOperation(u8),

    #[error("unknown operation name: {0:?}")]
    UnknownOperationName(String),

    #[error("invalid replica address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid identifier {0:?}: expected decimal or 0x-prefixed hex")]
    InvalidId(String),
}

pub type TypeResult<T> = Result<T, TypeError>;
