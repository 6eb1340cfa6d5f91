use tally_engine::EngineError;
use tally_protocol::ProtocolError;
use tally_types::Operation;
use thiserror::Error;

/// Systemic client failures. Per-command business errors are not here; they
/// travel inside a successful result sequence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("client is closed")]
    Closed,

    #[error("client has already been initialized with the same arguments")]
    AlreadyInitializedSameArgs,

    #[error("client has already been initialized with different arguments")]
    AlreadyInitializedDifferentArgs,

    #[error("batch is empty")]
    EmptyBatch,

    #[error("operation mismatch: dispatched as {expected}, batch holds {actual}")]
    OperationMismatch {
        expected: Operation,
        actual: Operation,
    },

    #[error("no tokio runtime is running")]
    NoRuntime,

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
