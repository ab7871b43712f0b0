use tracing::{info, warn};

use super::{
    retry::{RetryPolicy, Sleeper},
    BootstrapError,
};
use crate::store::DocumentStore;

/// Poll `name` until the store reports it active or the policy runs out.
pub async fn wait_until_active(
    store: &dyn DocumentStore,
    name: &str,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<(), BootstrapError> {
    info!(collection = %name, "waiting for collection to become active");

    for attempt in 1..=policy.max_attempts {
        match store.describe_collection(name).await {
            Ok(desc) if desc.status.is_active() => {
                info!(collection = %name, attempt, "collection is active");
                return Ok(());
            }
            Ok(desc) => {
                info!(collection = %name, status = %desc.status, attempt, "collection not active yet");
            }
            Err(e) => {
                warn!(collection = %name, error = %e, attempt, "describe failed while polling");
            }
        }

        if policy.has_next(attempt) {
            sleeper.sleep(policy.delay_for(attempt)).await;
        }
    }

    Err(BootstrapError::Timeout {
        collection: name.to_string(),
    })
}
