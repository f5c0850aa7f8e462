//! Storage node adapter
//!
//! A DID-addressed record store. Records are created, read, queried, updated
//! and deleted against the local node; `send` propagates a protocol or a
//! record to the node advertised in the target DID's document.
//!
//! - DwnNode: the async surface the platform consumes
//! - InMemoryNode: complete in-process node with snapshot persistence
//! - NodeNetwork: endpoint registry used for propagation

mod memory;
mod network;
mod record;

pub use memory::InMemoryNode;
pub use network::NodeNetwork;
pub use record::{
    micros_timestamp, CreateRecord, Record, RecordData, RecordDescriptor, RecordEntry,
    RecordMessage, RecordsFilter,
};

use crate::identity::Did;
use crate::protocol::ProtocolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of configuring a protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigureStatus {
    /// First installation of this protocol URI
    Created,
    /// An identical definition was already installed
    AlreadyConfigured,
    /// A different definition under the same URI replaced the old one
    Updated,
}

#[async_trait]
pub trait DwnNode: Send + Sync {
    /// DID that owns this node
    fn tenant(&self) -> &Did;

    async fn configure_protocol(
        &self,
        author: &Did,
        definition: &ProtocolDefinition,
    ) -> Result<ConfigureStatus, NodeError>;

    /// Propagate an installed protocol to `target`'s endpoint
    async fn send_protocol(&self, protocol: &str, target: &Did) -> Result<(), NodeError>;

    async fn create_record(&self, author: &Did, request: CreateRecord) -> Result<Record, NodeError>;

    async fn read_record(&self, reader: &Did, record_id: &str) -> Result<Record, NodeError>;

    async fn query_records(
        &self,
        reader: &Did,
        filter: &RecordsFilter,
        limit: Option<usize>,
    ) -> Result<Vec<RecordEntry>, NodeError>;

    /// Replace a record's data, keeping its id and placement
    async fn update_record(
        &self,
        author: &Did,
        record_id: &str,
        data: RecordData,
    ) -> Result<Record, NodeError>;

    async fn delete_record(&self, author: &Did, record_id: &str) -> Result<(), NodeError>;

    /// Propagate a record to `target`'s endpoint
    async fn send_record(&self, record_id: &str, target: &Did) -> Result<(), NodeError>;
}

/// Errors raised by a storage node
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("protocol not found: {0}")]
    ProtocolNotFound(String),

    #[error("invalid protocol path: {0}")]
    InvalidProtocolPath(String),

    #[error("parent mismatch: {0}")]
    ParentMismatch(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("data format not allowed: {0}")]
    DataFormatNotAllowed(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("storage failure: {0}")]
    Storage(String),
}
