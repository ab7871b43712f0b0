use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

pub mod dynamo;
pub mod memory;
pub mod tables;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;
pub use tables::{CollectionDescriptor, SecondaryIndex};

/// A single record as stored in a collection.
pub type Document = Map<String, Value>;

/// Provisioning state reported by the store for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other(String),
}

impl CollectionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CREATING" => Self::Creating,
            "ACTIVE" => Self::Active,
            "UPDATING" => Self::Updating,
            "DELETING" => Self::Deleting,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => f.write_str("CREATING"),
            Self::Active => f.write_str("ACTIVE"),
            Self::Updating => f.write_str("UPDATING"),
            Self::Deleting => f.write_str("DELETING"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionDescription {
    pub name: String,
    pub status: CollectionStatus,
    pub key_schema: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection {0} not found")]
    CollectionNotFound(String),
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("collection {collection} has no index {index}")]
    UnknownIndex { collection: String, index: String },
    #[error("store request failed: {0}")]
    Backend(String),
    #[error("document codec: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Operations the service needs from the document store.
///
/// One instance is built at startup and shared (behind an `Arc`) by the
/// bootstrap routine and every request handler.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    async fn describe_collection(&self, name: &str) -> Result<CollectionDescription, StoreError>;

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<(), StoreError>;

    async fn get_item(
        &self,
        collection: &CollectionDescriptor,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    async fn put_item(
        &self,
        collection: &CollectionDescriptor,
        item: Document,
    ) -> Result<(), StoreError>;

    async fn delete_item(&self, collection: &CollectionDescriptor, id: &str)
        -> Result<(), StoreError>;

    async fn query_by_index(
        &self,
        collection: &CollectionDescriptor,
        index_name: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError>;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected an object document, got {}",
            other
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
