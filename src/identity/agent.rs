//! Identity agent: owns the signing keys behind the DIDs it created
//!
//! Private keys live only in the [`KeyStore`]. They are never logged, and
//! the only way they leave memory is [`KeyStore::save`] into the agent's own
//! key file.

use super::did::{Did, DidError, DidResolver};
use crate::error::Result;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use log::info;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Signing keys held by an agent, keyed by DID
#[derive(Default)]
pub struct KeyStore {
    keys: BTreeMap<Did, SigningKey>,
}

/// On-disk form of a key store
#[derive(Serialize, Deserialize)]
struct KeyFile {
    keys: BTreeMap<Did, String>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("dids", &self.keys.keys().collect::<Vec<_>>())
            .field("keys", &"<redacted>")
            .finish()
    }
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a key file; a missing file gives an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        let file: KeyFile = serde_json::from_str(&json)?;
        let mut keys = BTreeMap::new();
        for (did, secret) in file.keys {
            let bytes = hex::decode(&secret).map_err(|e| DidError::InvalidKey(e.to_string()))?;
            let raw: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| DidError::InvalidKey(format!("bad secret length for {}", did)))?;
            let key = SigningKey::from_bytes(&raw);
            if Did::from_verifying_key(&key.verifying_key()) != did {
                return Err(DidError::InvalidKey(format!("stored key does not belong to {}", did)).into());
            }
            keys.insert(did, key);
        }
        info!("Opened key store with {} identities", keys.len());
        Ok(Self { keys })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = KeyFile {
            keys: self
                .keys
                .iter()
                .map(|(did, key)| (did.clone(), hex::encode(key.to_bytes())))
                .collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Generate a fresh Ed25519 key and its `did:key`
    pub fn generate(&mut self) -> Did {
        let signing_key = SigningKey::generate(&mut OsRng);
        let did = Did::from_verifying_key(&signing_key.verifying_key());
        self.keys.insert(did.clone(), signing_key);
        did
    }

    pub fn contains(&self, did: &Did) -> bool {
        self.keys.contains_key(did)
    }

    pub fn dids(&self) -> impl Iterator<Item = &Did> {
        self.keys.keys()
    }

    pub fn verifying_key(&self, did: &Did) -> std::result::Result<VerifyingKey, DidError> {
        self.keys
            .get(did)
            .map(|k| k.verifying_key())
            .ok_or_else(|| DidError::KeyNotFound(did.to_string()))
    }

    pub fn sign(&self, did: &Did, message: &[u8]) -> std::result::Result<Signature, DidError> {
        let key = self
            .keys
            .get(did)
            .ok_or_else(|| DidError::KeyNotFound(did.to_string()))?;
        Ok(key.sign(message))
    }
}

/// The identity provider handed to the platform
#[derive(Debug)]
pub struct IdentityAgent {
    keys: KeyStore,
    resolver: Arc<DidResolver>,
}

impl IdentityAgent {
    pub fn new(resolver: Arc<DidResolver>) -> Self {
        Self::with_keys(KeyStore::new(), resolver)
    }

    pub fn with_keys(keys: KeyStore, resolver: Arc<DidResolver>) -> Self {
        Self { keys, resolver }
    }

    /// Return the agent's DID, creating one on first use
    pub fn connect(&mut self) -> Did {
        if let Some(did) = self.keys.dids().next() {
            return did.clone();
        }
        let did = self.keys.generate();
        info!("Created identity {}", did);
        did
    }

    /// Create an additional `did:key` identity
    pub fn create_did(&mut self) -> Did {
        let did = self.keys.generate();
        info!("Created identity {}", did);
        did
    }

    pub fn resolver(&self) -> &Arc<DidResolver> {
        &self.resolver
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Detached signer callback for `did`
    pub fn signer<'a>(
        &'a self,
        did: &'a Did,
    ) -> impl Fn(&[u8]) -> std::result::Result<Vec<u8>, DidError> + 'a {
        move |message| self.keys.sign(did, message).map(|sig| sig.to_bytes().to_vec())
    }
}
