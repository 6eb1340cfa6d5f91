/// Errors produced by the ledger itself, as opposed to per-command outcomes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("batch is empty")]
    EmptyBatch,
}

pub type LedgerResult<T> = Result<T, LedgerError>;
