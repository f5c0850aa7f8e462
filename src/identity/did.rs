//! Decentralized identifiers
//!
//! Only the `did:key` method with Ed25519 keys is supported: the public key
//! is multibase (base58btc, `z` prefix) encoded behind the `0xed01`
//! multicodec header, so the DID alone is enough to verify its signatures.
//! Service endpoints are not part of a `did:key`; the resolver attaches the
//! storage node endpoints that were registered for an identifier.

use ed25519_dalek::VerifyingKey;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Multicodec header for an Ed25519 public key
const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Service type under which storage node endpoints are published
pub const DWN_SERVICE_TYPE: &str = "DecentralizedWebNode";

/// A decentralized identifier, e.g. `did:key:z6Mk...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Parse a DID string, checking the `did:<method>:<id>` shape
    pub fn parse(value: impl Into<String>) -> Result<Self, DidError> {
        let value = value.into();
        let mut parts = value.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty() => {
                Ok(Self(value))
            }
            _ => Err(DidError::InvalidDid(value)),
        }
    }

    /// Build the `did:key` identifier for an Ed25519 public key
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut bytes = Vec::with_capacity(34);
        bytes.extend_from_slice(&ED25519_MULTICODEC);
        bytes.extend_from_slice(key.as_bytes());
        Self(format!("did:key:z{}", bs58::encode(bytes).into_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// The method-specific identifier (everything after `did:<method>:`)
    pub fn method_id(&self) -> &str {
        self.0.splitn(3, ':').nth(2).unwrap_or_default()
    }

    /// Key id used in JWT headers: `<did>#<method id>`
    pub fn key_id(&self) -> String {
        format!("{}#{}", self.0, self.method_id())
    }

    /// Recover the Ed25519 verification key embedded in a `did:key`
    pub fn verifying_key(&self) -> Result<VerifyingKey, DidError> {
        if self.method() != "key" {
            return Err(DidError::UnsupportedMethod(self.0.clone()));
        }
        let encoded = self
            .method_id()
            .strip_prefix('z')
            .ok_or_else(|| DidError::InvalidDid("did:key must use base58btc (z prefix)".into()))?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| DidError::InvalidKey(e.to_string()))?;
        if bytes.len() != 34 || bytes[..2] != ED25519_MULTICODEC {
            return Err(DidError::InvalidKey(format!(
                "expected ed25519 multicodec key, got {} bytes",
                bytes.len()
            )));
        }
        let raw: [u8; 32] = bytes[2..]
            .try_into()
            .map_err(|_| DidError::InvalidKey("bad key length".into()))?;
        VerifyingKey::from_bytes(&raw).map_err(|e| DidError::InvalidKey(e.to_string()))
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolved DID document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidDocument {
    #[serde(rename = "@context", default)]
    pub context: Vec<String>,
    pub id: Did,
    #[serde(rename = "verificationMethod", default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(rename = "assertionMethod", default)]
    pub assertion_method: Vec<String>,
    #[serde(default)]
    pub service: Vec<Service>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: Did,
    #[serde(rename = "publicKeyMultibase")]
    pub public_key_multibase: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

impl DidDocument {
    /// First storage node endpoint advertised by this document
    pub fn dwn_endpoint(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|s| s.service_type == DWN_SERVICE_TYPE)
            .map(|s| s.service_endpoint.as_str())
    }
}

/// Resolves DIDs to documents and keeps the endpoint registry
#[derive(Debug, Default)]
pub struct DidResolver {
    endpoints: RwLock<HashMap<Did, Vec<String>>>,
}

impl DidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a storage node endpoint for a DID
    pub async fn register_endpoint(&self, did: &Did, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        debug!("Registering endpoint {} for {}", endpoint, did);
        let mut endpoints = self.endpoints.write().await;
        let list = endpoints.entry(did.clone()).or_default();
        if !list.contains(&endpoint) {
            list.push(endpoint);
        }
    }

    /// Resolve a DID into its document
    pub async fn resolve(&self, did: &Did) -> Result<DidDocument, DidError> {
        let key = did.verifying_key()?;
        let key_id = did.key_id();
        let multibase = did.method_id().to_string();
        debug!("Resolved {} ({} bytes of key material)", did, key.as_bytes().len());

        let service = self
            .endpoints
            .read()
            .await
            .get(did)
            .map(|list| {
                list.iter()
                    .enumerate()
                    .map(|(i, endpoint)| Service {
                        id: format!("{}#dwn{}", did, i),
                        service_type: DWN_SERVICE_TYPE.to_string(),
                        service_endpoint: endpoint.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(DidDocument {
            context: vec![
                "https://www.w3.org/ns/did/v1".to_string(),
                "https://w3id.org/security/suites/ed25519-2020/v1".to_string(),
            ],
            id: did.clone(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                method_type: "Ed25519VerificationKey2020".to_string(),
                controller: did.clone(),
                public_key_multibase: multibase,
            }],
            assertion_method: vec![key_id],
            service,
        })
    }
}

/// Errors from identifier handling
#[derive(Debug, thiserror::Error)]
pub enum DidError {
    #[error("Invalid DID: {0}")]
    InvalidDid(String),

    #[error("Unsupported DID method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("No signing key held for {0}")]
    KeyNotFound(String),
}
