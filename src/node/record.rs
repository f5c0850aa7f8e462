//! Record messages, stored records, and query filters

use crate::identity::Did;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Timestamp with millisecond precision padded to six fractional digits,
/// e.g. `2024-05-01T12:00:00.123000Z`
pub fn micros_timestamp(at: DateTime<Utc>) -> String {
    format!(
        "{}{:03}000Z",
        at.format("%Y-%m-%dT%H:%M:%S."),
        at.timestamp_subsec_millis()
    )
}

/// Opaque record payload with JSON and binary accessors
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RecordData(Vec<u8>);

impl RecordData {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(Self)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Content digest (hex SHA-256)
    pub fn cid(&self) -> String {
        hex::encode(Sha256::digest(&self.0))
    }
}

impl fmt::Debug for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordData({} bytes)", self.0.len())
    }
}

impl Serialize for RecordData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for RecordData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Caller-supplied message fields of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub data_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
}

impl RecordMessage {
    /// A record placed in a protocol's structure tree
    pub fn protocol(protocol: &str, path: &str, data_format: &str) -> Self {
        Self {
            protocol: Some(protocol.to_string()),
            protocol_path: Some(path.to_string()),
            data_format: data_format.to_string(),
            ..Self::default()
        }
    }

    /// A free-standing record identified only by its schema
    pub fn schema_only(schema: &str, data_format: &str) -> Self {
        Self {
            schema: Some(schema.to_string()),
            data_format: data_format.to_string(),
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.map(str::to_string);
        self
    }

    pub fn with_parent(mut self, parent_id: &str, context_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self.context_id = Some(context_id.to_string());
        self
    }

    pub fn published(mut self, date_published: Option<String>) -> Self {
        self.published = true;
        self.date_published = date_published;
        self
    }
}

/// A create request: payload plus message
#[derive(Debug, Clone)]
pub struct CreateRecord {
    pub data: RecordData,
    pub message: RecordMessage,
}

impl CreateRecord {
    pub fn new(data: RecordData, message: RecordMessage) -> Self {
        Self { data, message }
    }
}

/// Message fields plus the node-assigned metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDescriptor {
    #[serde(flatten)]
    pub message: RecordMessage,
    pub date_created: String,
    pub date_modified: String,
    pub data_cid: String,
    pub data_size: usize,
}

/// A stored record with its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub author: Did,
    pub descriptor: RecordDescriptor,
    pub data: RecordData,
}

impl Record {
    pub fn entry(&self) -> RecordEntry {
        RecordEntry {
            id: self.id.clone(),
            author: self.author.clone(),
            descriptor: self.descriptor.clone(),
        }
    }

    pub fn protocol_path(&self) -> Option<&str> {
        self.descriptor.message.protocol_path.as_deref()
    }
}

/// Query result entry: metadata only, read the record for its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub id: String,
    pub author: Did,
    pub descriptor: RecordDescriptor,
}

/// Conjunctive query filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordsFilter {
    pub record_id: Option<String>,
    pub protocol: Option<String>,
    pub protocol_path: Option<String>,
    pub schema: Option<String>,
    pub context_id: Option<String>,
    pub parent_id: Option<String>,
    pub author: Option<Did>,
}

impl RecordsFilter {
    pub fn protocol(protocol: &str) -> Self {
        Self {
            protocol: Some(protocol.to_string()),
            ..Self::default()
        }
    }

    pub fn schema(schema: &str) -> Self {
        Self {
            schema: Some(schema.to_string()),
            ..Self::default()
        }
    }

    pub fn and_path(mut self, path: &str) -> Self {
        self.protocol_path = Some(path.to_string());
        self
    }

    pub fn and_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub fn and_context(mut self, context_id: &str) -> Self {
        self.context_id = Some(context_id.to_string());
        self
    }

    pub fn and_parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    pub fn and_author(mut self, author: &Did) -> Self {
        self.author = Some(author.clone());
        self
    }

    pub fn matches(&self, id: &str, author: &Did, descriptor: &RecordDescriptor) -> bool {
        let m = &descriptor.message;
        fn check(want: &Option<String>, have: Option<&str>) -> bool {
            want.as_deref().map_or(true, |w| have == Some(w))
        }
        check(&self.record_id, Some(id))
            && check(&self.protocol, m.protocol.as_deref())
            && check(&self.protocol_path, m.protocol_path.as_deref())
            && check(&self.schema, m.schema.as_deref())
            && check(&self.context_id, m.context_id.as_deref())
            && check(&self.parent_id, m.parent_id.as_deref())
            && self.author.as_ref().map_or(true, |a| a == author)
    }
}
