use tally_types::Operation;
use thiserror::Error;

/// Errors produced while encoding or decoding batches and replies.
///
/// All of these are systemic: when one occurs, no per-command result of the
/// batch is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("batch is empty")]
    EmptyBatch,

    #[error("batch too large: {len} commands (max {max})")]
    BatchTooLarge { len: usize, max: usize },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("framing error: {0}")]
    FramingError(String),

    #[error("unknown operation code {0}")]
    UnknownOperation(u8),

    #[error("reply is for {actual}, batch was {expected}")]
    OperationMismatch { expected: Operation, actual: Operation },

    #[error("header declares {declared} entries, payload holds {actual}")]
    CountMismatch { declared: usize, actual: usize },

    #[error("engine stopped after {evaluated} of {expected} commands")]
    Truncated { evaluated: usize, expected: usize },

    #[error("reply covers {evaluated} commands, batch has {expected}")]
    TooManyResults { evaluated: usize, expected: usize },

    #[error("reply index {index} is out of order or outside a batch of {len}")]
    InvalidIndex { index: u32, len: usize },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
