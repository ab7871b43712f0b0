//! Startup provisioning: make sure every required collection exists and is
//! active before the listener binds.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackoffKind, BootstrapConfig};
use crate::store::{DocumentStore, StoreError};

pub mod readiness;
pub mod report;
pub mod retry;
pub mod tables;
pub mod validate;

use retry::{RetryPolicy, Sleeper, TokioSleeper};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("unable to connect to the store: {0}")]
    Connectivity(#[source] StoreError),
    #[error("timed out waiting for collection {collection} to become active")]
    Timeout { collection: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Bootstrap {
    store: Arc<dyn DocumentStore>,
    sleeper: Arc<dyn Sleeper>,
    outer: RetryPolicy,
    readiness: RetryPolicy,
}

impl Bootstrap {
    pub fn new(store: Arc<dyn DocumentStore>, cfg: &BootstrapConfig) -> Self {
        let delay = Duration::from_secs(cfg.retry_delay_secs);
        let outer = match cfg.backoff {
            BackoffKind::Fixed => RetryPolicy::fixed(cfg.max_attempts, delay),
            BackoffKind::Exponential => {
                RetryPolicy::exponential(cfg.max_attempts, delay, delay.saturating_mul(8))
            }
        };
        Self {
            store,
            sleeper: Arc::new(TokioSleeper),
            outer,
            readiness: RetryPolicy::fixed(
                cfg.readiness_attempts,
                Duration::from_secs(cfg.readiness_poll_secs),
            ),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policies(mut self, outer: RetryPolicy, readiness: RetryPolicy) -> Self {
        self.outer = outer;
        self.readiness = readiness;
        self
    }
}
