//! Read-only inventory of the store's collections for operators.

use std::fmt;

use tracing::{info, warn};

use super::{Bootstrap, BootstrapError};
use crate::store::{tables::REQUIRED, CollectionStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionState {
    Present(CollectionStatus),
    Missing,
    /// Listed, but describing it failed.
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub name: String,
    pub required: bool,
    pub state: CollectionState,
}

impl CollectionReport {
    /// Whether this entry stands in the way of serving traffic.
    pub fn blocks_startup(&self) -> bool {
        self.required && self.state != CollectionState::Present(CollectionStatus::Active)
    }
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.required { "required" } else { "extra" };
        match &self.state {
            CollectionState::Present(status) => write!(f, "{} ({}): {}", self.name, tag, status),
            CollectionState::Missing => write!(f, "{} ({}): MISSING", self.name, tag),
            CollectionState::Unreadable(e) => {
                write!(f, "{} ({}): UNREADABLE ({})", self.name, tag, e)
            }
        }
    }
}

impl Bootstrap {
    /// Every collection the store lists, then any required one it lacks.
    /// Only a failed listing is an error.
    pub async fn collection_report(&self) -> Result<Vec<CollectionReport>, BootstrapError> {
        let names = self
            .store
            .list_collections()
            .await
            .map_err(BootstrapError::Connectivity)?;
        info!(count = names.len(), "collections listed");

        let mut report = Vec::with_capacity(names.len() + REQUIRED.len());
        for name in &names {
            let state = match self.store.describe_collection(name).await {
                Ok(desc) => CollectionState::Present(desc.status),
                Err(e) => {
                    warn!(collection = %name, error = %e, "describe failed");
                    CollectionState::Unreadable(e.to_string())
                }
            };
            report.push(CollectionReport {
                name: name.clone(),
                required: REQUIRED.iter().any(|d| d.name == name),
                state,
            });
        }

        for descriptor in REQUIRED.iter() {
            if !names.iter().any(|n| n == descriptor.name) {
                report.push(CollectionReport {
                    name: descriptor.name.to_string(),
                    required: true,
                    state: CollectionState::Missing,
                });
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AppConfig;
    use crate::store::{tables::USERS, CollectionDescriptor, DocumentStore, MemoryStore};

    const AUDIT: CollectionDescriptor = CollectionDescriptor {
        name: "Audit",
        primary_key: "id",
        index: None,
        read_capacity: 1,
        write_capacity: 1,
    };

    fn bootstrap(store: Arc<MemoryStore>) -> Bootstrap {
        Bootstrap::new(store, &AppConfig::fake().bootstrap)
    }

    fn find<'a>(report: &'a [CollectionReport], name: &str) -> &'a CollectionReport {
        report.iter().find(|r| r.name == name).unwrap()
    }

    #[tokio::test]
    async fn provisioned_store_reports_active_and_nothing_blocks() {
        let report = bootstrap(Arc::new(MemoryStore::provisioned()))
            .collection_report()
            .await
            .unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|r| r.required));
        assert!(!report.iter().any(CollectionReport::blocks_startup));
        assert_eq!(find(&report, "Users").to_string(), "Users (required): ACTIVE");
    }

    #[tokio::test]
    async fn missing_and_extra_collections_are_listed() {
        let store = Arc::new(MemoryStore::new());
        store.create_collection(&USERS).await.unwrap();
        store.create_collection(&AUDIT).await.unwrap();
        store.set_status("Users", CollectionStatus::Creating).await;

        let report = bootstrap(store).collection_report().await.unwrap();
        assert_eq!(report.len(), 3);

        let audit = find(&report, "Audit");
        assert!(!audit.required);
        assert!(!audit.blocks_startup());

        let users = find(&report, "Users");
        assert_eq!(users.state, CollectionState::Present(CollectionStatus::Creating));
        assert!(users.blocks_startup());

        let tasks = find(&report, "Tasks");
        assert_eq!(tasks.state, CollectionState::Missing);
        assert_eq!(tasks.to_string(), "Tasks (required): MISSING");
    }

    #[tokio::test]
    async fn describe_failure_is_reported_not_raised() {
        let store = Arc::new(MemoryStore::provisioned());
        store.fail_describe("Tasks").await;

        let report = bootstrap(store).collection_report().await.unwrap();
        let tasks = find(&report, "Tasks");
        assert!(matches!(tasks.state, CollectionState::Unreadable(_)));
        assert!(tasks.blocks_startup());
        assert!(!find(&report, "Users").blocks_startup());
    }

    #[tokio::test]
    async fn unreachable_store_is_a_connectivity_error() {
        let store = Arc::new(MemoryStore::provisioned());
        store.fail_next(1).await;
        let err = bootstrap(store).collection_report().await.unwrap_err();
        assert!(matches!(err, BootstrapError::Connectivity(_)));
    }
}
