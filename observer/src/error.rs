use thiserror::Error;
use xchain_ledger::LedgerError;
use xchain_store::StoreError;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid {var} value {value:?}: expected a block number or \"latest\"")]
    InvalidScanOverride { var: String, value: String },
}
