use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{
    tables::REQUIRED, CollectionDescription, CollectionDescriptor, CollectionStatus, Document,
    DocumentStore, StoreError,
};

struct Collection {
    descriptor: CollectionDescriptor,
    status: CollectionStatus,
    // Statuses handed out by describe before settling on `status`.
    pending: VecDeque<CollectionStatus>,
    items: BTreeMap<String, Document>,
}

#[derive(Default)]
struct Inner {
    collections: BTreeMap<String, Collection>,
    scripts: HashMap<String, Vec<CollectionStatus>>,
    failures_left: usize,
    undescribable: HashSet<String>,
}

/// Process-local [`DocumentStore`] used by tests and local runs without DynamoDB.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    create_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where every required collection already exists and is active.
    pub fn provisioned() -> Self {
        let mut inner = Inner::default();
        for descriptor in REQUIRED {
            inner.collections.insert(
                descriptor.name.to_string(),
                Collection {
                    descriptor,
                    status: CollectionStatus::Active,
                    pending: VecDeque::new(),
                    items: BTreeMap::new(),
                },
            );
        }
        Self {
            inner: Mutex::new(inner),
            create_calls: AtomicUsize::new(0),
        }
    }

    /// Statuses reported by `describe_collection` after `name` gets created.
    /// The last entry sticks once the script runs out.
    pub async fn script_status(&self, name: &str, statuses: Vec<CollectionStatus>) {
        self.inner
            .lock()
            .await
            .scripts
            .insert(name.to_string(), statuses);
    }

    /// Force the collection into a given status, bypassing any script.
    pub async fn set_status(&self, name: &str, status: CollectionStatus) {
        if let Some(col) = self.inner.lock().await.collections.get_mut(name) {
            col.pending.clear();
            col.status = status;
        }
    }

    /// Make the next `calls` operations fail as if the store were down.
    pub async fn fail_next(&self, calls: usize) {
        self.inner.lock().await.failures_left = calls;
    }

    /// Make every `describe_collection(name)` fail while listing still works.
    pub async fn fail_describe(&self, name: &str) {
        self.inner
            .lock()
            .await
            .undescribable
            .insert(name.to_string());
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub async fn item_count(&self, name: &str) -> usize {
        self.inner
            .lock()
            .await
            .collections
            .get(name)
            .map(|c| c.items.len())
            .unwrap_or(0)
    }
}

impl Inner {
    fn check_reachable(&mut self) -> Result<(), StoreError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(StoreError::Unreachable("simulated outage".into()));
        }
        Ok(())
    }

    fn collection(&mut self, name: &str) -> Result<&mut Collection, StoreError> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }
}

fn key_of(doc: &Document, attribute: &str) -> Result<String, StoreError> {
    match doc.get(attribute) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(StoreError::Backend(format!(
            "item is missing string key attribute {}",
            attribute
        ))),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_reachable()?;
        Ok(inner.collections.keys().cloned().collect())
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionDescription, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_reachable()?;
        if inner.undescribable.contains(name) {
            return Err(StoreError::Backend(format!("describe {} failed", name)));
        }
        let col = inner.collection(name)?;
        let status = col.pending.pop_front().unwrap_or_else(|| col.status.clone());
        Ok(CollectionDescription {
            name: name.to_string(),
            status,
            key_schema: vec![col.descriptor.primary_key.to_string()],
        })
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_reachable()?;
        if inner.collections.contains_key(descriptor.name) {
            return Err(StoreError::Backend(format!(
                "collection {} already exists",
                descriptor.name
            )));
        }
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mut script = inner.scripts.remove(descriptor.name).unwrap_or_default();
        let status = script.pop().unwrap_or(CollectionStatus::Active);
        inner.collections.insert(
            descriptor.name.to_string(),
            Collection {
                descriptor: *descriptor,
                status,
                pending: script.into(),
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn get_item(
        &self,
        collection: &CollectionDescriptor,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_reachable()?;
        Ok(inner.collection(collection.name)?.items.get(id).cloned())
    }

    async fn put_item(
        &self,
        collection: &CollectionDescriptor,
        item: Document,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_reachable()?;
        let id = key_of(&item, collection.primary_key)?;
        inner.collection(collection.name)?.items.insert(id, item);
        Ok(())
    }

    async fn delete_item(
        &self,
        collection: &CollectionDescriptor,
        id: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_reachable()?;
        inner.collection(collection.name)?.items.remove(id);
        Ok(())
    }

    async fn query_by_index(
        &self,
        collection: &CollectionDescriptor,
        index_name: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_reachable()?;
        let col = inner.collection(collection.name)?;
        let key = col
            .descriptor
            .index_key(index_name)
            .ok_or_else(|| StoreError::UnknownIndex {
                collection: collection.name.to_string(),
                index: index_name.to_string(),
            })?;
        Ok(col
            .items
            .values()
            .filter(|doc| doc.get(key).and_then(Value::as_str) == Some(value))
            .cloned()
            .collect())
    }
}
