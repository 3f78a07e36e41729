//! Prometheus metrics for the cross-chain client.
//!
//! [`ClientMetrics`] owns a dedicated [`Registry`]; [`ClientMetrics::encode`]
//! renders it in the Prometheus text exposition format for whatever endpoint
//! the embedding process exposes.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_vec_with_registry, Encoder,
    IntCounter, IntGaugeVec, Opts, Registry, TextEncoder,
};
use xchain_types::Chain;

use crate::ClientError;

pub struct ClientMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// TSS batches signed by this client.
    pub keysign_batches_signed: IntCounter,
    /// Keysign rounds that returned an error.
    pub keysign_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Last scanned external block, by chain name.
    pub last_scanned_block: IntGaugeVec,
    /// Failed inbound votes awaiting reconciliation, by chain name.
    pub inbound_backlog_size: IntGaugeVec,
}

impl ClientMetrics {
    pub fn new() -> Result<Self, ClientError> {
        let registry = Registry::new();

        let keysign_batches_signed = register_int_counter_with_registry!(
            Opts::new(
                "xchain_keysign_batches_signed_total",
                "Total TSS keysign batches signed"
            ),
            registry
        )?;

        let keysign_failures = register_int_counter_with_registry!(
            Opts::new(
                "xchain_keysign_failures_total",
                "Total TSS keysign rounds that failed"
            ),
            registry
        )?;

        let last_scanned_block = register_int_gauge_vec_with_registry!(
            Opts::new("xchain_last_scanned_block", "Last scanned block per chain"),
            &["chain"],
            registry
        )?;

        let inbound_backlog_size = register_int_gauge_vec_with_registry!(
            Opts::new(
                "xchain_inbound_backlog_size",
                "Failed inbound votes awaiting reconciliation per chain"
            ),
            &["chain"],
            registry
        )?;

        Ok(Self {
            registry,
            keysign_batches_signed,
            keysign_failures,
            last_scanned_block,
            inbound_backlog_size,
        })
    }

    pub fn set_last_scanned_block(&self, chain: &Chain, block: u64) {
        self.last_scanned_block
            .with_label_values(&[chain.name.as_str()])
            .set(i64::try_from(block).unwrap_or(i64::MAX));
    }

    pub fn set_inbound_backlog_size(&self, chain: &Chain, size: usize) {
        self.inbound_backlog_size
            .with_label_values(&[chain.name.as_str()])
            .set(i64::try_from(size).unwrap_or(i64::MAX));
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, ClientError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| ClientError::Config(e.to_string()))
    }
}
