use tracing::{error, info, warn};

use super::{readiness::wait_until_active, Bootstrap, BootstrapError};
use crate::store::{tables::REQUIRED, CollectionDescriptor, StoreError};

impl Bootstrap {
    pub async fn check_connection(&self) -> Result<(), BootstrapError> {
        self.store
            .list_collections()
            .await
            .map_err(BootstrapError::Connectivity)?;
        info!("connected to document store");
        Ok(())
    }

    /// Describe the collection and create it when the store does not know it.
    /// An existing collection is left alone whatever its status.
    pub async fn ensure_collection(
        &self,
        descriptor: &CollectionDescriptor,
    ) -> Result<(), BootstrapError> {
        match self.store.describe_collection(descriptor.name).await {
            Ok(_) => {
                info!(collection = %descriptor.name, "collection already exists");
                return Ok(());
            }
            Err(StoreError::CollectionNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        self.store.create_collection(descriptor).await?;
        info!(collection = %descriptor.name, "collection creation initiated");
        wait_until_active(
            self.store.as_ref(),
            descriptor.name,
            &self.readiness,
            self.sleeper.as_ref(),
        )
        .await?;
        info!(collection = %descriptor.name, "collection created and ready");
        Ok(())
    }

    async fn provision_once(&self) -> Result<(), BootstrapError> {
        self.check_connection().await?;
        for descriptor in REQUIRED.iter() {
            self.ensure_collection(descriptor).await?;
        }
        Ok(())
    }

    /// Run the provisioning sequence, restarting it from the connectivity
    /// check on any failure until the outer budget is spent.
    pub async fn initialize_tables(&self) -> Result<(), BootstrapError> {
        let mut attempt = 1;
        loop {
            match self.provision_once().await {
                Ok(()) => {
                    info!(attempt, "all collections initialized");
                    return Ok(());
                }
                Err(e) if self.outer.has_next(attempt) => {
                    let delay = self.outer.delay_for(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        retries_left = self.outer.max_attempts - attempt,
                        ?delay,
                        "collection initialization failed; retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(error = %e, attempt, "collection initialization failed; giving up");
                    return Err(e);
                }
            }
        }
    }
}
