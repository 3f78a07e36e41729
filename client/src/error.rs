use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("observer error: {0}")]
    Observer(#[from] xchain_observer::ObserverError),

    #[error("signer error: {0}")]
    Signer(#[from] xchain_signer::SignerError),

    #[error("ledger error: {0}")]
    Ledger(#[from] xchain_ledger::LedgerError),

    #[error("tss error: {0}")]
    Tss(#[from] xchain_tss::TssError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),
}
