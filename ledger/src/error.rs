use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger rpc error: {0}")]
    Rpc(String),

    #[error("ledger rpc timed out")]
    Timeout,

    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),
}
