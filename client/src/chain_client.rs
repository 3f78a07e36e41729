//! One chain's observer/signer stack and its collaborators.

use std::sync::Arc;
use std::time::Duration;

use xchain_ledger::LedgerRepo;
use xchain_observer::{InboundBacklog, ObserverState};
use xchain_signer::BatchSigner;
use xchain_store::LastBlockStore;
use xchain_tss::TssSigner;
use xchain_types::{Chain, ChainParams};
use xchain_utils::Clock;

use crate::{ClientConfig, ClientError, ClientMetrics};

/// External collaborators shared by every chain.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn LedgerRepo>,
    pub tss: Arc<dyn TssSigner>,
    pub store: Arc<dyn LastBlockStore>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<ClientMetrics>,
}

pub struct ChainClient {
    pub(crate) observer: Arc<ObserverState>,
    pub(crate) signer: Arc<BatchSigner>,
    pub(crate) backlog: Arc<InboundBacklog>,
    pub(crate) ledger: Arc<dyn LedgerRepo>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) metrics: Arc<ClientMetrics>,
    pub(crate) keysign_delay: Duration,
}

impl ChainClient {
    pub fn new(config: &ClientConfig, chain: Chain, params: ChainParams, deps: Collaborators) -> Self {
        let tss_address = deps.tss.pubkey().address.clone();
        let observer = ObserverState::new(chain.clone(), params, tss_address, deps.store);
        let signer = BatchSigner::new(
            chain.clone(),
            deps.tss,
            deps.ledger.clone(),
            config.signer.batch_signer_config(),
        );
        let backlog = InboundBacklog::new(
            chain.chain_id,
            deps.ledger.clone(),
            deps.clock.clone(),
            config.observer.backlog_config(),
        );
        Self {
            observer: Arc::new(observer),
            signer: Arc::new(signer),
            backlog: Arc::new(backlog),
            ledger: deps.ledger,
            clock: deps.clock,
            metrics: deps.metrics,
            keysign_delay: config.signer.keysign_delay(),
        }
    }

    pub fn chain(&self) -> &Chain {
        self.observer.chain()
    }

    pub fn observer(&self) -> &Arc<ObserverState> {
        &self.observer
    }

    pub fn signer(&self) -> &Arc<BatchSigner> {
        &self.signer
    }

    pub fn backlog(&self) -> &Arc<InboundBacklog> {
        &self.backlog
    }

    /// Load scan progress (environment override or store) and publish it.
    pub fn start(&self) -> Result<(), ClientError> {
        self.observer.load_last_block_scanned()?;
        self.observer.load_last_tx_scanned()?;
        let block = self.observer.last_block_scanned();
        self.metrics.set_last_scanned_block(self.chain(), block);
        tracing::info!(chain = %self.chain().chain_id, name = %self.chain().name, last_scanned = block, "chain client started");
        Ok(())
    }

    /// Persist `block` as scanned and publish it.
    pub fn record_scanned_block(&self, block: u64) -> Result<(), ClientError> {
        self.observer.save_last_block_scanned(block)?;
        self.metrics
            .set_last_scanned_block(self.chain(), self.observer.last_block_scanned());
        Ok(())
    }

    /// Persist `tx_hash` as the last scanned tx found at `block` and publish
    /// the scanned height.
    pub fn record_scanned_tx(&self, tx_hash: &str, block: u64) -> Result<(), ClientError> {
        self.observer.save_last_tx_scanned(tx_hash, block)?;
        self.metrics
            .set_last_scanned_block(self.chain(), self.observer.last_block_scanned());
        Ok(())
    }
}
