use tracing::{error, info};

use super::Bootstrap;
use crate::store::tables::REQUIRED;

impl Bootstrap {
    /// Final gate before serving: every required collection is listed and
    /// active. Failures are logged and reported as `false`.
    pub async fn validate_tables(&self) -> bool {
        let names = match self.store.list_collections().await {
            Ok(names) => names,
            Err(e) => {
                error!(error = %e, "error validating collections");
                return false;
            }
        };

        for descriptor in REQUIRED.iter() {
            if !names.iter().any(|n| n == descriptor.name) {
                error!(collection = %descriptor.name, "required collection is missing");
                return false;
            }

            match self.store.describe_collection(descriptor.name).await {
                Ok(desc) if desc.status.is_active() => {}
                Ok(desc) => {
                    error!(collection = %descriptor.name, status = %desc.status, "collection is not active");
                    return false;
                }
                Err(e) => {
                    error!(collection = %descriptor.name, error = %e, "error validating collections");
                    return false;
                }
            }
        }

        info!("all required collections are present and active");
        true
    }
}
