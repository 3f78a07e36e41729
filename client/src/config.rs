//! Client configuration with TOML file support.
//!
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use xchain_observer::BacklogConfig;
use xchain_signer::BatchSignerConfig;
use xchain_tss::SignatureCache;
use xchain_utils::{Clock, LogFormat};

use crate::ClientError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub signer: SignerConfig,

    #[serde(default)]
    pub observer: ObserverConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Maximum number of cached TSS signatures.
    #[serde(default = "default_signature_cache_size")]
    pub signature_cache_size: usize,

    /// Seconds a cached signature stays valid. `0` disables the cache.
    #[serde(default = "default_signature_cache_ttl_secs")]
    pub signature_cache_ttl_secs: u64,

    /// Milliseconds between batch collection attempts.
    #[serde(default = "default_collect_batch_backoff_ms")]
    pub collect_batch_backoff_ms: u64,

    /// Collection attempts after the first one.
    #[serde(default = "default_collect_batch_retries")]
    pub collect_batch_retries: usize,

    /// Stagger applied after a block event before signing, in milliseconds.
    #[serde(default)]
    pub keysign_delay_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_monitoring_timeout_secs")]
    pub monitoring_timeout_secs: u64,

    #[serde(default = "default_backlog_retry_interval_secs")]
    pub backlog_retry_interval_secs: u64,

    #[serde(default = "default_max_inbound_trackers_per_scan")]
    pub max_inbound_trackers_per_scan: usize,
}

// ── Defaults ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_signature_cache_size() -> usize {
    10_000
}

fn default_signature_cache_ttl_secs() -> u64 {
    600
}

fn default_collect_batch_backoff_ms() -> u64 {
    4_000
}

fn default_collect_batch_retries() -> usize {
    2
}

fn default_monitoring_timeout_secs() -> u64 {
    300
}

fn default_backlog_retry_interval_secs() -> u64 {
    60
}

fn default_max_inbound_trackers_per_scan() -> usize {
    50
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            signature_cache_size: default_signature_cache_size(),
            signature_cache_ttl_secs: default_signature_cache_ttl_secs(),
            collect_batch_backoff_ms: default_collect_batch_backoff_ms(),
            collect_batch_retries: default_collect_batch_retries(),
            keysign_delay_ms: 0,
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            monitoring_timeout_secs: default_monitoring_timeout_secs(),
            backlog_retry_interval_secs: default_backlog_retry_interval_secs(),
            max_inbound_trackers_per_scan: default_max_inbound_trackers_per_scan(),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ClientError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        let config: Self = toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.signer.signature_cache_size == 0 {
            return Err(ClientError::Config(
                "signer.signature_cache_size must be greater than zero".into(),
            ));
        }
        if self.observer.max_inbound_trackers_per_scan == 0 {
            return Err(ClientError::Config(
                "observer.max_inbound_trackers_per_scan must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Install the global tracing subscriber for this configuration.
    pub fn init_logging(&self) -> bool {
        xchain_utils::init_logging(self.logging.format, &self.logging.level)
    }
}

impl SignerConfig {
    pub fn batch_signer_config(&self) -> BatchSignerConfig {
        BatchSignerConfig {
            collect_batch_backoff: Duration::from_millis(self.collect_batch_backoff_ms),
            collect_batch_retries: self.collect_batch_retries,
        }
    }

    pub fn keysign_delay(&self) -> Duration {
        Duration::from_millis(self.keysign_delay_ms)
    }

    pub fn signature_cache(&self, clock: Arc<dyn Clock>) -> Result<SignatureCache, ClientError> {
        Ok(SignatureCache::new(
            self.signature_cache_size,
            Duration::from_secs(self.signature_cache_ttl_secs),
            clock,
        )?)
    }
}

impl ObserverConfig {
    pub fn backlog_config(&self) -> BacklogConfig {
        BacklogConfig {
            retry_interval: Duration::from_secs(self.backlog_retry_interval_secs),
            max_trackers_per_scan: self.max_inbound_trackers_per_scan,
            monitoring_timeout: Duration::from_secs(self.monitoring_timeout_secs),
        }
    }
}
