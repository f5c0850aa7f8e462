//! In-process storage node
//!
//! Holds installed protocols and records for one tenant DID, enforcing the
//! protocol structure (paths, parent chain, context, schema, data format) and
//! access rules on every write. State can be snapshotted to a JSON file so
//! durable records survive a restart.

use super::network::NodeNetwork;
use super::record::{micros_timestamp, CreateRecord, Record, RecordData, RecordDescriptor, RecordEntry, RecordsFilter};
use super::{ConfigureStatus, DwnNode, NodeError};
use crate::identity::{Did, DidResolver};
use crate::protocol::{parent_path, Action, Ancestor, ProtocolDefinition};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default, Serialize, Deserialize)]
struct NodeState {
    protocols: BTreeMap<String, ProtocolDefinition>,
    /// Insertion order is query order
    records: Vec<Record>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    tenant: Did,
    state: NodeState,
}

impl NodeState {
    fn find(&self, record_id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == record_id)
    }

    /// Parent chain of `record_id`, root first, including the record itself
    fn chain(&self, record_id: &str) -> Vec<Ancestor> {
        let mut chain = Vec::new();
        let mut next = Some(record_id.to_string());
        while let Some(id) = next {
            let Some(record) = self.find(&id) else { break };
            if let Some(path) = record.protocol_path() {
                chain.push(Ancestor {
                    protocol_path: path.to_string(),
                    author: record.author.clone(),
                });
            }
            next = record.descriptor.message.parent_id.clone();
        }
        chain.reverse();
        chain
    }

    fn readable(&self, tenant: &Did, reader: &Did, record: &Record) -> bool {
        if reader == tenant || reader == &record.author {
            return true;
        }
        let message = &record.descriptor.message;
        match (&message.protocol, &message.protocol_path) {
            (Some(protocol), Some(path)) => self.protocols.get(protocol).is_some_and(|def| {
                let ancestors = self.chain(&record.id);
                def.allows(path, Action::Read, reader, &ancestors)
            }),
            _ => message.published,
        }
    }
}

pub struct InMemoryNode {
    tenant: Did,
    endpoint: String,
    network: Arc<NodeNetwork>,
    state: RwLock<NodeState>,
}

impl std::fmt::Debug for InMemoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryNode")
            .field("tenant", &self.tenant)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl InMemoryNode {
    /// Create an empty node for `tenant`, reachable on `network`
    pub async fn new(tenant: Did, network: Arc<NodeNetwork>) -> Arc<Self> {
        Self::with_state(tenant, network, NodeState::default()).await
    }

    /// A node on its own private network: every `send` is unreachable
    pub async fn detached(tenant: Did) -> Arc<Self> {
        Self::new(tenant, NodeNetwork::new(Arc::new(DidResolver::new()))).await
    }

    /// A node on its own network that is also its tenant's published endpoint
    pub async fn standalone(tenant: Did) -> Arc<Self> {
        let network = NodeNetwork::new(Arc::new(DidResolver::new()));
        let node = Self::new(tenant, network.clone()).await;
        network.publish(&node).await;
        node
    }

    /// Restore a node from a snapshot file; a missing file gives an empty node
    pub async fn open(
        path: impl AsRef<Path>,
        tenant: Did,
        network: Arc<NodeNetwork>,
    ) -> Result<Arc<Self>, NodeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new(tenant, network).await);
        }
        let json = std::fs::read_to_string(path).map_err(|e| NodeError::Storage(e.to_string()))?;
        let snapshot: Snapshot =
            serde_json::from_str(&json).map_err(|e| NodeError::Storage(e.to_string()))?;
        if snapshot.tenant != tenant {
            return Err(NodeError::Storage(format!(
                "snapshot belongs to {}, not {}",
                snapshot.tenant, tenant
            )));
        }
        info!(
            "Restored node for {}: {} protocols, {} records",
            tenant,
            snapshot.state.protocols.len(),
            snapshot.state.records.len()
        );
        Ok(Self::with_state(tenant, network, snapshot.state).await)
    }

    async fn with_state(tenant: Did, network: Arc<NodeNetwork>, state: NodeState) -> Arc<Self> {
        let node = Arc::new(Self {
            tenant,
            endpoint: format!("memory://{}", uuid::Uuid::new_v4()),
            network: network.clone(),
            state: RwLock::new(state),
        });
        network.attach(&node).await;
        node
    }

    /// Write a snapshot of every protocol and record
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), NodeError> {
        let state = self.state.read().await;
        let snapshot = SnapshotRef {
            tenant: &self.tenant,
            state: &state,
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| NodeError::Storage(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| NodeError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn tenant_did(&self) -> &Did {
        &self.tenant
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn protocol(&self, uri: &str) -> Option<ProtocolDefinition> {
        self.state.read().await.protocols.get(uri).cloned()
    }

    pub async fn protocol_count(&self) -> usize {
        self.state.read().await.protocols.len()
    }

    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn contains(&self, record_id: &str) -> bool {
        self.state.read().await.find(record_id).is_some()
    }

    /// Accept a protocol propagated from another node
    async fn ingest_protocol(&self, definition: ProtocolDefinition) {
        let mut state = self.state.write().await;
        state.protocols.insert(definition.protocol.clone(), definition);
    }

    /// Accept a record propagated from another node
    async fn ingest_record(&self, record: Record) -> Result<(), NodeError> {
        let mut state = self.state.write().await;
        if let Some(protocol) = &record.descriptor.message.protocol {
            if !state.protocols.contains_key(protocol) {
                return Err(NodeError::ProtocolNotFound(protocol.clone()));
            }
        }
        match state.records.iter().position(|r| r.id == record.id) {
            Some(index) => state.records[index] = record,
            None => state.records.push(record),
        }
        Ok(())
    }

    async fn remote_for(&self, target: &Did) -> Result<Option<Arc<InMemoryNode>>, NodeError> {
        let remote = self
            .network
            .resolve_node(target)
            .await
            .ok_or_else(|| NodeError::Unreachable(target.to_string()))?;
        if remote.endpoint == self.endpoint {
            return Ok(None);
        }
        Ok(Some(remote))
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    tenant: &'a Did,
    state: &'a NodeState,
}

#[async_trait]
impl DwnNode for InMemoryNode {
    fn tenant(&self) -> &Did {
        &self.tenant
    }

    async fn configure_protocol(
        &self,
        author: &Did,
        definition: &ProtocolDefinition,
    ) -> Result<ConfigureStatus, NodeError> {
        if author != &self.tenant {
            return Err(NodeError::Unauthorized(format!(
                "{} cannot configure protocols on {}",
                author, self.tenant
            )));
        }
        definition
            .validate()
            .map_err(NodeError::InvalidProtocolPath)?;

        let mut state = self.state.write().await;
        let status = match state.protocols.get(&definition.protocol) {
            Some(existing) if existing == definition => ConfigureStatus::AlreadyConfigured,
            Some(_) => ConfigureStatus::Updated,
            None => ConfigureStatus::Created,
        };
        if status != ConfigureStatus::AlreadyConfigured {
            state
                .protocols
                .insert(definition.protocol.clone(), definition.clone());
        }
        debug!("Configured {} on {}: {:?}", definition.protocol, self.endpoint, status);
        Ok(status)
    }

    async fn send_protocol(&self, protocol: &str, target: &Did) -> Result<(), NodeError> {
        let definition = self
            .protocol(protocol)
            .await
            .ok_or_else(|| NodeError::ProtocolNotFound(protocol.to_string()))?;
        if let Some(remote) = self.remote_for(target).await? {
            remote.ingest_protocol(definition).await;
            debug!("Sent protocol {} to {}", protocol, remote.endpoint);
        }
        Ok(())
    }

    async fn create_record(&self, author: &Did, request: CreateRecord) -> Result<Record, NodeError> {
        let CreateRecord { data, mut message } = request;
        let id = uuid::Uuid::new_v4().to_string();
        let mut state = self.state.write().await;

        if let Some(protocol) = message.protocol.clone() {
            let definition = state
                .protocols
                .get(&protocol)
                .cloned()
                .ok_or_else(|| NodeError::ProtocolNotFound(protocol.clone()))?;
            let path = message
                .protocol_path
                .clone()
                .ok_or_else(|| NodeError::InvalidProtocolPath("missing protocolPath".into()))?;
            let declared = definition
                .type_at(&path)
                .ok_or_else(|| NodeError::InvalidProtocolPath(path.clone()))?;

            if let Some(schema) = &declared.schema {
                if message.schema.as_deref() != Some(schema.as_str()) {
                    return Err(NodeError::SchemaMismatch(format!(
                        "{} expects {}, got {:?}",
                        path, schema, message.schema
                    )));
                }
            }
            if !declared.accepts(&message.data_format) {
                return Err(NodeError::DataFormatNotAllowed(format!(
                    "{} at {}",
                    message.data_format, path
                )));
            }

            let ancestors = match parent_path(&path) {
                None => {
                    if message.parent_id.is_some() {
                        return Err(NodeError::ParentMismatch(format!("{} is a root path", path)));
                    }
                    message.context_id = Some(id.clone());
                    Vec::new()
                }
                Some(expected_parent) => {
                    let parent_id = message
                        .parent_id
                        .clone()
                        .ok_or_else(|| NodeError::ParentMismatch(format!("{} needs a parent", path)))?;
                    let parent = state
                        .find(&parent_id)
                        .ok_or_else(|| NodeError::ParentMismatch(format!("parent {} not found", parent_id)))?;
                    let parent_msg = &parent.descriptor.message;
                    if parent_msg.protocol.as_deref() != Some(protocol.as_str())
                        || parent_msg.protocol_path.as_deref() != Some(expected_parent)
                    {
                        return Err(NodeError::ParentMismatch(format!(
                            "parent {} is not a {} record",
                            parent_id, expected_parent
                        )));
                    }
                    let context = parent_msg.context_id.clone();
                    if message.context_id.is_some() && message.context_id != context {
                        return Err(NodeError::ParentMismatch(format!(
                            "contextId {:?} does not match parent context {:?}",
                            message.context_id, context
                        )));
                    }
                    message.context_id = context;
                    state.chain(&parent_id)
                }
            };

            if author != &self.tenant && !definition.allows(&path, Action::Write, author, &ancestors) {
                return Err(NodeError::Unauthorized(format!("{} cannot write {}", author, path)));
            }
        } else if author != &self.tenant {
            return Err(NodeError::Unauthorized(format!(
                "{} cannot write records without a protocol",
                author
            )));
        }

        let now = micros_timestamp(Utc::now());
        let record = Record {
            id,
            author: author.clone(),
            descriptor: RecordDescriptor {
                message,
                date_created: now.clone(),
                date_modified: now,
                data_cid: data.cid(),
                data_size: data.len(),
            },
            data,
        };
        debug!(
            "Created record {} ({:?}, {} bytes)",
            record.id,
            record.protocol_path(),
            record.descriptor.data_size
        );
        state.records.push(record.clone());
        Ok(record)
    }

    async fn read_record(&self, reader: &Did, record_id: &str) -> Result<Record, NodeError> {
        let state = self.state.read().await;
        let record = state
            .find(record_id)
            .ok_or_else(|| NodeError::RecordNotFound(record_id.to_string()))?;
        if !state.readable(&self.tenant, reader, record) {
            return Err(NodeError::Unauthorized(format!("{} cannot read {}", reader, record_id)));
        }
        Ok(record.clone())
    }

    async fn query_records(
        &self,
        reader: &Did,
        filter: &RecordsFilter,
        limit: Option<usize>,
    ) -> Result<Vec<RecordEntry>, NodeError> {
        let state = self.state.read().await;
        let entries = state
            .records
            .iter()
            .filter(|r| filter.matches(&r.id, &r.author, &r.descriptor))
            .filter(|r| state.readable(&self.tenant, reader, r))
            .take(limit.unwrap_or(usize::MAX))
            .map(Record::entry)
            .collect();
        Ok(entries)
    }

    async fn update_record(
        &self,
        author: &Did,
        record_id: &str,
        data: RecordData,
    ) -> Result<Record, NodeError> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| NodeError::RecordNotFound(record_id.to_string()))?;
        if author != &record.author && author != &self.tenant {
            return Err(NodeError::Unauthorized(format!("{} cannot update {}", author, record_id)));
        }
        record.descriptor.date_modified = micros_timestamp(Utc::now());
        record.descriptor.data_cid = data.cid();
        record.descriptor.data_size = data.len();
        record.data = data;
        Ok(record.clone())
    }

    async fn delete_record(&self, author: &Did, record_id: &str) -> Result<(), NodeError> {
        let mut state = self.state.write().await;
        let index = state
            .records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| NodeError::RecordNotFound(record_id.to_string()))?;
        if author != &state.records[index].author && author != &self.tenant {
            return Err(NodeError::Unauthorized(format!("{} cannot delete {}", author, record_id)));
        }
        state.records.remove(index);
        debug!("Deleted record {}", record_id);
        Ok(())
    }

    async fn send_record(&self, record_id: &str, target: &Did) -> Result<(), NodeError> {
        let record = self
            .state
            .read()
            .await
            .find(record_id)
            .cloned()
            .ok_or_else(|| NodeError::RecordNotFound(record_id.to_string()))?;
        if let Some(remote) = self.remote_for(target).await? {
            remote.ingest_record(record).await?;
            debug!("Sent record {} to {}", record_id, remote.endpoint);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::KeyStore;
    use crate::node::RecordMessage;
    use crate::protocol::{
        dudemy_protocol, COMMENTS_PATH, CONTENT_PATH, CONTENT_SCHEMA, COURSE_PATH, COURSE_SCHEMA,
        DUDEMY_PROTOCOL, JSON_FORMAT, VIDEO_FORMAT, VIDEO_PATH, VIDEO_SCHEMA,
    };
    use serde_json::json;

    struct Fixture {
        alice: Did,
        bob: Did,
        node: Arc<InMemoryNode>,
    }

    async fn fixture() -> Fixture {
        let mut keys = KeyStore::new();
        let alice = keys.generate();
        let bob = keys.generate();
        let node = InMemoryNode::detached(alice.clone()).await;
        node.configure_protocol(&alice, &dudemy_protocol()).await.unwrap();
        Fixture { alice, bob, node }
    }

    fn course_request(title: &str) -> CreateRecord {
        CreateRecord::new(
            RecordData::from_json(&json!({"title": title, "description": "d"})).unwrap(),
            RecordMessage::protocol(DUDEMY_PROTOCOL, COURSE_PATH, JSON_FORMAT)
                .with_schema(Some(COURSE_SCHEMA))
                .published(None),
        )
    }

    fn content_request(course_id: &str) -> CreateRecord {
        CreateRecord::new(
            RecordData::from_json(&json!({"title": "Lesson"})).unwrap(),
            RecordMessage::protocol(DUDEMY_PROTOCOL, CONTENT_PATH, JSON_FORMAT)
                .with_schema(Some(CONTENT_SCHEMA))
                .with_parent(course_id, course_id),
        )
    }

    #[tokio::test]
    async fn test_configure_is_idempotent() {
        let f = fixture().await;
        let status = f.node.configure_protocol(&f.alice, &dudemy_protocol()).await.unwrap();
        assert_eq!(status, ConfigureStatus::AlreadyConfigured);
        assert_eq!(f.node.protocol_count().await, 1);

        let mut changed = dudemy_protocol();
        changed.published = false;
        let status = f.node.configure_protocol(&f.alice, &changed).await.unwrap();
        assert_eq!(status, ConfigureStatus::Updated);
        assert_eq!(f.node.protocol_count().await, 1);
    }

    #[tokio::test]
    async fn test_only_tenant_configures() {
        let f = fixture().await;
        let err = f.node.configure_protocol(&f.bob, &dudemy_protocol()).await.unwrap_err();
        assert!(matches!(err, NodeError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_unknown_protocol_rejected() {
        let mut keys = KeyStore::new();
        let alice = keys.generate();
        let node = InMemoryNode::detached(alice.clone()).await;
        let err = node.create_record(&alice, course_request("Intro")).await.unwrap_err();
        assert_eq!(err, NodeError::ProtocolNotFound(DUDEMY_PROTOCOL.to_string()));
    }

    #[tokio::test]
    async fn test_root_record_is_its_own_context() {
        let f = fixture().await;
        let course = f.node.create_record(&f.alice, course_request("Intro")).await.unwrap();
        assert_eq!(course.descriptor.message.context_id.as_deref(), Some(course.id.as_str()));

        let content = f.node.create_record(&f.alice, content_request(&course.id)).await.unwrap();
        assert_eq!(content.descriptor.message.context_id.as_deref(), Some(course.id.as_str()));
    }

    #[tokio::test]
    async fn test_structure_enforced() {
        let f = fixture().await;
        let course = f.node.create_record(&f.alice, course_request("Intro")).await.unwrap();

        // content without a parent
        let mut orphan = content_request(&course.id);
        orphan.message.parent_id = None;
        assert!(matches!(
            f.node.create_record(&f.alice, orphan).await,
            Err(NodeError::ParentMismatch(_))
        ));

        // video directly under a course
        let video = CreateRecord::new(
            RecordData::from_bytes(vec![1, 2, 3]),
            RecordMessage::protocol(DUDEMY_PROTOCOL, VIDEO_PATH, VIDEO_FORMAT)
                .with_schema(Some(VIDEO_SCHEMA))
                .with_parent(&course.id, &course.id),
        );
        assert!(matches!(
            f.node.create_record(&f.alice, video).await,
            Err(NodeError::ParentMismatch(_))
        ));

        // wrong schema
        let mut wrong = content_request(&course.id);
        wrong.message.schema = Some(COURSE_SCHEMA.to_string());
        assert!(matches!(
            f.node.create_record(&f.alice, wrong).await,
            Err(NodeError::SchemaMismatch(_))
        ));

        // wrong format
        let mut wrong = content_request(&course.id);
        wrong.message.data_format = VIDEO_FORMAT.to_string();
        assert!(matches!(
            f.node.create_record(&f.alice, wrong).await,
            Err(NodeError::DataFormatNotAllowed(_))
        ));

        // unknown path
        let mut wrong = content_request(&course.id);
        wrong.message.protocol_path = Some("course/quiz".to_string());
        assert!(matches!(
            f.node.create_record(&f.alice, wrong).await,
            Err(NodeError::InvalidProtocolPath(_))
        ));
    }

    #[tokio::test]
    async fn test_context_mismatch_rejected() {
        let f = fixture().await;
        let course = f.node.create_record(&f.alice, course_request("A")).await.unwrap();
        let mut request = content_request(&course.id);
        request.message.context_id = Some("some-other-course".to_string());
        assert!(matches!(
            f.node.create_record(&f.alice, request).await,
            Err(NodeError::ParentMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_access_rules_for_visitors() {
        let f = fixture().await;
        let course = f.node.create_record(&f.alice, course_request("Intro")).await.unwrap();

        // anyone may comment
        let comment = CreateRecord::new(
            RecordData::from_json(&json!({"text": "great"})).unwrap(),
            RecordMessage::protocol(DUDEMY_PROTOCOL, COMMENTS_PATH, JSON_FORMAT)
                .with_parent(&course.id, &course.id),
        );
        assert!(f.node.create_record(&f.bob, comment).await.is_ok());

        // only the course author may add content
        let err = f.node.create_record(&f.bob, content_request(&course.id)).await.unwrap_err();
        assert!(matches!(err, NodeError::Unauthorized(_)));

        // anyone may read course records
        assert!(f.node.read_record(&f.bob, &course.id).await.is_ok());

        // non-protocol records stay private unless published
        let private = CreateRecord::new(
            RecordData::from_bytes(b"secret".to_vec()),
            RecordMessage::schema_only("Notes", "text/plain"),
        );
        let private = f.node.create_record(&f.alice, private).await.unwrap();
        assert!(matches!(
            f.node.read_record(&f.bob, &private.id).await,
            Err(NodeError::Unauthorized(_))
        ));
        let hidden = f
            .node
            .query_records(&f.bob, &RecordsFilter::schema("Notes"), None)
            .await
            .unwrap();
        assert!(hidden.is_empty());
    }

    #[tokio::test]
    async fn test_query_order_and_limit() {
        let f = fixture().await;
        for title in ["a", "b", "c"] {
            f.node.create_record(&f.alice, course_request(title)).await.unwrap();
        }
        let filter = RecordsFilter::protocol(DUDEMY_PROTOCOL);
        let all = f.node.query_records(&f.alice, &filter, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let limited = f.node.query_records(&f.alice, &filter, Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, all[0].id);
        assert_eq!(limited[1].id, all[1].id);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let f = fixture().await;
        let course = f.node.create_record(&f.alice, course_request("Intro")).await.unwrap();

        let data = RecordData::from_json(&json!({"title": "Renamed", "description": "d"})).unwrap();
        let updated = f.node.update_record(&f.alice, &course.id, data.clone()).await.unwrap();
        assert_eq!(updated.id, course.id);
        assert_eq!(updated.descriptor.data_cid, data.cid());

        assert!(matches!(
            f.node.update_record(&f.bob, &course.id, data).await,
            Err(NodeError::Unauthorized(_))
        ));
        assert!(matches!(
            f.node.delete_record(&f.bob, &course.id).await,
            Err(NodeError::Unauthorized(_))
        ));

        f.node.delete_record(&f.alice, &course.id).await.unwrap();
        assert!(!f.node.contains(&course.id).await);
        assert!(matches!(
            f.node.delete_record(&f.alice, &course.id).await,
            Err(NodeError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_send_requires_protocol_on_remote() {
        let mut keys = KeyStore::new();
        let alice = keys.generate();
        let network = NodeNetwork::new(Arc::new(DidResolver::new()));
        let local = InMemoryNode::new(alice.clone(), network.clone()).await;
        let remote = InMemoryNode::new(alice.clone(), network.clone()).await;
        network.publish(&remote).await;

        local.configure_protocol(&alice, &dudemy_protocol()).await.unwrap();
        let course = local.create_record(&alice, course_request("Intro")).await.unwrap();

        let err = local.send_record(&course.id, &alice).await.unwrap_err();
        assert_eq!(err, NodeError::ProtocolNotFound(DUDEMY_PROTOCOL.to_string()));

        local.send_protocol(DUDEMY_PROTOCOL, &alice).await.unwrap();
        local.send_record(&course.id, &alice).await.unwrap();
        assert!(remote.contains(&course.id).await);

        // sending again overwrites rather than duplicates
        local.send_record(&course.id, &alice).await.unwrap();
        assert_eq!(remote.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_send_to_self_is_local() {
        let mut keys = KeyStore::new();
        let alice = keys.generate();
        let node = InMemoryNode::standalone(alice.clone()).await;
        node.configure_protocol(&alice, &dudemy_protocol()).await.unwrap();
        let course = node.create_record(&alice, course_request("Intro")).await.unwrap();

        node.send_protocol(DUDEMY_PROTOCOL, &alice).await.unwrap();
        node.send_record(&course.id, &alice).await.unwrap();
        assert_eq!(node.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_send_to_unknown_endpoint() {
        let f = fixture().await;
        let err = f.node.send_protocol(DUDEMY_PROTOCOL, &f.bob).await.unwrap_err();
        assert!(matches!(err, NodeError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let f = fixture().await;
        let course = f.node.create_record(&f.alice, course_request("Intro")).await.unwrap();
        let video_bytes: Vec<u8> = (0..=255).collect();
        let content = f.node.create_record(&f.alice, content_request(&course.id)).await.unwrap();
        let video = CreateRecord::new(
            RecordData::from_bytes(video_bytes.clone()),
            RecordMessage::protocol(DUDEMY_PROTOCOL, VIDEO_PATH, VIDEO_FORMAT)
                .with_schema(Some(VIDEO_SCHEMA))
                .with_parent(&content.id, &course.id),
        );
        let video = f.node.create_record(&f.alice, video).await.unwrap();

        let path = std::env::temp_dir().join(format!("dudemy-node-{}.json", uuid::Uuid::new_v4()));
        f.node.save(&path).await.unwrap();

        let network = NodeNetwork::new(Arc::new(DidResolver::new()));
        let restored = InMemoryNode::open(&path, f.alice.clone(), network.clone()).await.unwrap();
        assert_eq!(restored.record_count().await, 3);
        assert!(restored.protocol(DUDEMY_PROTOCOL).await.is_some());
        let read = restored.read_record(&f.alice, &video.id).await.unwrap();
        assert_eq!(read.data.bytes(), video_bytes.as_slice());

        let err = InMemoryNode::open(&path, f.bob.clone(), network).await.unwrap_err();
        assert!(matches!(err, NodeError::Storage(_)));

        let _ = std::fs::remove_file(&path);
    }
}
