use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::{
    config::{Builder as DynamoConfigBuilder, Region},
    error::{DisplayErrorContext, SdkError},
    types::{
        AttributeDefinition, AttributeValue, GlobalSecondaryIndex, KeySchemaElement, KeyType,
        Projection, ProjectionType, ProvisionedThroughput, ScalarAttributeType,
    },
    Client,
};
use aws_smithy_types::timeout::TimeoutConfig;
use serde_json::{Map, Value};
use tracing::debug;

use super::{
    CollectionDescription, CollectionDescriptor, CollectionStatus, Document, DocumentStore,
    StoreError,
};
use crate::config::StoreConfig;

/// DynamoDB (or DynamoDB Local) backed [`DocumentStore`].
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    pub async fn new(cfg: &StoreConfig) -> anyhow::Result<Self> {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(cfg.timeout_secs))
            .build();

        let mut loader = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .timeout_config(timeouts);
        if let (Some(access_key), Some(secret_key)) = (&cfg.access_key, &cfg.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ));
        }
        let shared = loader.load().await;

        let mut conf = DynamoConfigBuilder::from(&shared);
        if let Some(endpoint) = &cfg.endpoint {
            debug!(%endpoint, "using dynamodb endpoint override");
            conf = conf.endpoint_url(endpoint);
        }

        Ok(Self::from_client(Client::from_conf(conf.build())))
    }

    /// Wraps an already configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn sdk_error<E, R>(op: &str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let msg = format!("{}: {}", op, DisplayErrorContext(&err));
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => StoreError::Unreachable(msg),
        _ => StoreError::Backend(msg),
    }
}

fn build_error(err: aws_sdk_dynamodb::error::BuildError) -> StoreError {
    StoreError::Backend(format!("invalid request: {}", err))
}

fn hash_key(attribute: &str) -> Result<KeySchemaElement, StoreError> {
    KeySchemaElement::builder()
        .attribute_name(attribute)
        .key_type(KeyType::Hash)
        .build()
        .map_err(build_error)
}

fn string_attribute(attribute: &str) -> Result<AttributeDefinition, StoreError> {
    AttributeDefinition::builder()
        .attribute_name(attribute)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(build_error)
}

fn throughput(d: &CollectionDescriptor) -> Result<ProvisionedThroughput, StoreError> {
    ProvisionedThroughput::builder()
        .read_capacity_units(d.read_capacity)
        .write_capacity_units(d.write_capacity)
        .build()
        .map_err(build_error)
}

pub(crate) fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

pub(crate) fn from_attribute(attr: &AttributeValue) -> Result<Value, StoreError> {
    Ok(match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(n.parse::<serde_json::Number>()?),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(from_attribute)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), from_attribute(v)?)))
                .collect::<Result<Map<_, _>, StoreError>>()?,
        ),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        other => {
            return Err(StoreError::Backend(format!(
                "unsupported attribute type: {:?}",
                other
            )))
        }
    })
}

pub(crate) fn to_attributes(doc: &Document) -> HashMap<String, AttributeValue> {
    doc.iter()
        .map(|(k, v)| (k.clone(), to_attribute(v)))
        .collect()
}

pub(crate) fn from_attributes(item: &HashMap<String, AttributeValue>) -> Result<Document, StoreError> {
    item.iter()
        .map(|(k, v)| Ok((k.clone(), from_attribute(v)?)))
        .collect()
}

#[async_trait]
impl DocumentStore for DynamoStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;
        loop {
            let out = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(|e| sdk_error("list_tables", e))?;
            names.extend(out.table_names().iter().cloned());
            match out.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }
        Ok(names)
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionDescription, StoreError> {
        let out = self
            .client
            .describe_table()
            .table_name(name)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_resource_not_found_exception())
                    .unwrap_or(false);
                if missing {
                    StoreError::CollectionNotFound(name.to_string())
                } else {
                    sdk_error("describe_table", e)
                }
            })?;

        let table = out
            .table()
            .ok_or_else(|| StoreError::Backend(format!("describe_table {} returned no table", name)))?;
        let status = table
            .table_status()
            .map(|s| CollectionStatus::parse(s.as_str()))
            .unwrap_or_else(|| CollectionStatus::Other("UNKNOWN".into()));
        let key_schema = table
            .key_schema()
            .iter()
            .map(|k| k.attribute_name().to_string())
            .collect();

        Ok(CollectionDescription {
            name: name.to_string(),
            status,
            key_schema,
        })
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<(), StoreError> {
        let mut attributes = vec![string_attribute(descriptor.primary_key)?];
        let mut req = self
            .client
            .create_table()
            .table_name(descriptor.name)
            .key_schema(hash_key(descriptor.primary_key)?)
            .provisioned_throughput(throughput(descriptor)?);

        if let Some(index) = descriptor.index {
            attributes.push(string_attribute(index.key)?);
            let gsi = GlobalSecondaryIndex::builder()
                .index_name(index.name)
                .key_schema(hash_key(index.key)?)
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .provisioned_throughput(throughput(descriptor)?)
                .build()
                .map_err(build_error)?;
            req = req.global_secondary_indexes(gsi);
        }

        req.set_attribute_definitions(Some(attributes))
            .send()
            .await
            .map_err(|e| sdk_error("create_table", e))?;
        Ok(())
    }

    async fn get_item(
        &self,
        collection: &CollectionDescriptor,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let out = self
            .client
            .get_item()
            .table_name(collection.name)
            .key(collection.primary_key, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| sdk_error("get_item", e))?;
        out.item().map(from_attributes).transpose()
    }

    async fn put_item(
        &self,
        collection: &CollectionDescriptor,
        item: Document,
    ) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(collection.name)
            .set_item(Some(to_attributes(&item)))
            .send()
            .await
            .map_err(|e| sdk_error("put_item", e))?;
        Ok(())
    }

    async fn delete_item(
        &self,
        collection: &CollectionDescriptor,
        id: &str,
    ) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(collection.name)
            .key(collection.primary_key, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| sdk_error("delete_item", e))?;
        Ok(())
    }

    async fn query_by_index(
        &self,
        collection: &CollectionDescriptor,
        index_name: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let key = collection
            .index_key(index_name)
            .ok_or_else(|| StoreError::UnknownIndex {
                collection: collection.name.to_string(),
                index: index_name.to_string(),
            })?;

        let mut docs = Vec::new();
        let mut start: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let out = self
                .client
                .query()
                .table_name(collection.name)
                .index_name(index_name)
                .key_condition_expression("#k = :v")
                .expression_attribute_names("#k", key)
                .expression_attribute_values(":v", AttributeValue::S(value.to_string()))
                .set_exclusive_start_key(start.take())
                .send()
                .await
                .map_err(|e| sdk_error("query", e))?;
            for item in out.items() {
                docs.push(from_attributes(item)?);
            }
            match out.last_evaluated_key() {
                Some(last) if !last.is_empty() => start = Some(last.clone()),
                _ => break,
            }
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::config::retry::RetryConfig;
    use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_types::body::SdkBody;
    use axum::http;
    use serde_json::json;

    /// A store whose HTTP layer answers each call with the next canned response.
    /// Once the responses run out, calls fail at dispatch.
    fn replaying(responses: &[(u16, &str)]) -> DynamoStore {
        let events = responses
            .iter()
            .map(|(status, body)| {
                ReplayEvent::new(
                    http::Request::builder()
                        .uri("https://dynamodb.us-east-1.amazonaws.com/")
                        .body(SdkBody::empty())
                        .unwrap(),
                    http::Response::builder()
                        .status(*status)
                        .header("content-type", "application/x-amz-json-1.0")
                        .body(SdkBody::from(body.to_string()))
                        .unwrap(),
                )
            })
            .collect();

        let conf = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .http_client(StaticReplayClient::new(events))
            .build();
        DynamoStore::from_client(Client::from_conf(conf))
    }

    const NOT_FOUND: &str = r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found: Table: Users not found"}"#;
    const INTERNAL: &str = r#"{"__type":"com.amazonaws.dynamodb.v20120810#InternalServerError","message":"try again"}"#;

    #[tokio::test]
    async fn missing_table_maps_to_collection_not_found() {
        let store = replaying(&[(400, NOT_FOUND)]);
        let err = store.describe_collection("Users").await.unwrap_err();
        assert!(
            matches!(&err, StoreError::CollectionNotFound(name) if name == "Users"),
            "{:?}",
            err
        );
    }

    #[tokio::test]
    async fn describe_reads_status_and_key_schema() {
        let store = replaying(&[(
            200,
            r#"{"Table":{"TableName":"Users","TableStatus":"CREATING","KeySchema":[{"AttributeName":"id","KeyType":"HASH"}]}}"#,
        )]);
        let desc = store.describe_collection("Users").await.unwrap();
        assert_eq!(desc.name, "Users");
        assert_eq!(desc.status, CollectionStatus::Creating);
        assert_eq!(desc.key_schema, vec!["id".to_string()]);
    }

    #[tokio::test]
    async fn dispatch_failure_maps_to_unreachable() {
        let store = replaying(&[]);
        let err = store.list_collections().await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)), "{:?}", err);

        let err = store.describe_collection("Users").await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn other_service_errors_map_to_backend() {
        let store = replaying(&[(500, INTERNAL), (500, INTERNAL)]);
        let err = store.describe_collection("Users").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)), "{:?}", err);

        let err = store.list_collections().await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn list_follows_pagination() {
        let store = replaying(&[
            (200, r#"{"TableNames":["Tasks"],"LastEvaluatedTableName":"Tasks"}"#),
            (200, r#"{"TableNames":["Users"]}"#),
        ]);
        assert_eq!(
            store.list_collections().await.unwrap(),
            vec!["Tasks".to_string(), "Users".to_string()]
        );
    }

    #[test]
    fn task_document_converts_both_ways() {
        let doc = match json!({
            "id": "t1",
            "userId": "u1",
            "title": "buy milk",
            "description": "",
            "completed": false,
            "tags": ["home", "errand"],
            "meta": {"priority": 3, "note": null}
        }) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };

        let attrs = to_attributes(&doc);
        assert_eq!(attrs["completed"], AttributeValue::Bool(false));
        assert_eq!(attrs["id"], AttributeValue::S("t1".into()));
        assert_eq!(
            attrs["meta"].as_m().unwrap()["priority"],
            AttributeValue::N("3".into())
        );

        let back = from_attributes(&attrs).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn string_sets_become_arrays() {
        let value = from_attribute(&AttributeValue::Ss(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn malformed_number_is_a_codec_error() {
        let err = from_attribute(&AttributeValue::N("twelve".into())).unwrap_err();
        assert!(matches!(err, StoreError::Codec(_)));
    }
}
