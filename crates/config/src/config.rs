use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default value for `pull_interval_ms` in [`BatcherConfig`].
const DEFAULT_PULL_INTERVAL_MS: u64 = 10_000;

/// Default value for `finalizer_interval_ms` in [`BatcherConfig`].
const DEFAULT_FINALIZER_INTERVAL_MS: u64 = 60_000;

/// Default value for `batch_size_mb_limit` in [`BatcherConfig`].
const DEFAULT_BATCH_SIZE_MB_LIMIT: u32 = 100;

/// Default value for `max_retries_per_blob` in [`BatcherConfig`].
const DEFAULT_MAX_RETRIES_PER_BLOB: u32 = 3;

/// Default value for `confirmation_queue_size` in [`BatcherConfig`].
const DEFAULT_CONFIRMATION_QUEUE_SIZE: usize = 16;

/// Default value for `num_connections` in [`BatcherConfig`].
const DEFAULT_NUM_CONNECTIONS: usize = 8;

/// Default value for `encoding_request_queue_size` in [`BatcherConfig`].
const DEFAULT_ENCODING_REQUEST_QUEUE_SIZE: usize = 500;

/// Default timeout in ms for the timeout fields of [`TimeoutConfig`].
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Batcher configuration.
///
/// The encoding worker-pool fields (`num_connections`,
/// `encoding_request_queue_size`) and `finalizer_interval_ms` are passed to
/// the respective collaborators at wiring and are opaque to the batching
/// core itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatcherConfig {
    /// Period of the pull-based batching trigger.
    #[serde(default = "default_pull_interval_ms")]
    pub pull_interval_ms: u64,

    /// Cadence of the batch finalizer.
    #[serde(default = "default_finalizer_interval_ms")]
    pub finalizer_interval_ms: u64,

    /// Pending encoded bytes above `batch_size_mb_limit * 1 MiB` trigger a
    /// batch attempt ahead of the pull interval.
    #[serde(default = "default_batch_size_mb_limit")]
    pub batch_size_mb_limit: u32,

    /// Failed attempts a blob may accumulate before it is permanently failed.
    #[serde(default = "default_max_retries_per_blob")]
    pub max_retries_per_blob: u32,

    /// Capacity of the confirmation handoff queue; a full queue applies
    /// backpressure to the batching loop.
    #[serde(default = "default_confirmation_queue_size")]
    pub confirmation_queue_size: usize,

    /// Size of the encoding worker pool.
    #[serde(default = "default_num_connections")]
    pub num_connections: usize,

    /// Bound on queued encoding requests.
    #[serde(default = "default_encoding_request_queue_size")]
    pub encoding_request_queue_size: usize,
}

impl BatcherConfig {
    pub fn pull_interval(&self) -> Duration {
        Duration::from_millis(self.pull_interval_ms)
    }

    pub fn finalizer_interval(&self) -> Duration {
        Duration::from_millis(self.finalizer_interval_ms)
    }

    /// Size-trigger threshold in bytes.
    pub fn batch_size_limit_bytes(&self) -> u64 {
        self.batch_size_mb_limit as u64 * 1024 * 1024
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            pull_interval_ms: DEFAULT_PULL_INTERVAL_MS,
            finalizer_interval_ms: DEFAULT_FINALIZER_INTERVAL_MS,
            batch_size_mb_limit: DEFAULT_BATCH_SIZE_MB_LIMIT,
            max_retries_per_blob: DEFAULT_MAX_RETRIES_PER_BLOB,
            confirmation_queue_size: DEFAULT_CONFIRMATION_QUEUE_SIZE,
            num_connections: DEFAULT_NUM_CONNECTIONS,
            encoding_request_queue_size: DEFAULT_ENCODING_REQUEST_QUEUE_SIZE,
        }
    }
}

/// Deadlines handed to collaborators for their blocking I/O. The core itself
/// only propagates these; enforcement lives with the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_ms")]
    pub encoding_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub chain_read_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub chain_write_timeout_ms: u64,
}

impl TimeoutConfig {
    pub fn encoding_timeout(&self) -> Duration {
        Duration::from_millis(self.encoding_timeout_ms)
    }

    pub fn chain_read_timeout(&self) -> Duration {
        Duration::from_millis(self.chain_read_timeout_ms)
    }

    pub fn chain_write_timeout(&self) -> Duration {
        Duration::from_millis(self.chain_write_timeout_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            encoding_timeout_ms: DEFAULT_TIMEOUT_MS,
            chain_read_timeout_ms: DEFAULT_TIMEOUT_MS,
            chain_write_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

fn default_pull_interval_ms() -> u64 {
    DEFAULT_PULL_INTERVAL_MS
}

fn default_finalizer_interval_ms() -> u64 {
    DEFAULT_FINALIZER_INTERVAL_MS
}

fn default_batch_size_mb_limit() -> u32 {
    DEFAULT_BATCH_SIZE_MB_LIMIT
}

fn default_max_retries_per_blob() -> u32 {
    DEFAULT_MAX_RETRIES_PER_BLOB
}

fn default_confirmation_queue_size() -> usize {
    DEFAULT_CONFIRMATION_QUEUE_SIZE
}

fn default_num_connections() -> usize {
    DEFAULT_NUM_CONNECTIONS
}

fn default_encoding_request_queue_size() -> usize {
    DEFAULT_ENCODING_REQUEST_QUEUE_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
