//! Playable references for resolved video payloads
//!
//! A resolved video holds one ephemeral `blob:` URL backed by the bytes in
//! memory. URLs live until revoked or until the registry is dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const BLOB_SCHEME: &str = "blob:dudemy/";

/// A local reference a player can be pointed at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableRef {
    pub url: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Default)]
struct Registry {
    blobs: HashMap<String, Arc<[u8]>>,
    /// source record id → its live reference
    sources: HashMap<String, PlayableRef>,
}

/// Live `blob:` URLs. A source record holds at most one URL at a time.
#[derive(Debug, Clone, Default)]
pub struct MediaUrls {
    registry: Arc<RwLock<Registry>>,
}

impl MediaUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live reference for `source_id`, if one was registered and not revoked
    pub async fn reference(&self, source_id: &str) -> Option<PlayableRef> {
        self.registry.read().await.sources.get(source_id).cloned()
    }

    /// Register `bytes` for `source_id`, reusing its live URL if it has one
    pub async fn register(&self, source_id: &str, bytes: Vec<u8>, mime_type: &str) -> PlayableRef {
        let mut registry = self.registry.write().await;
        if let Some(existing) = registry.sources.get(source_id) {
            return existing.clone();
        }
        let playable = PlayableRef {
            url: format!("{}{}", BLOB_SCHEME, uuid::Uuid::new_v4()),
            mime_type: mime_type.to_string(),
            size: bytes.len(),
        };
        registry.blobs.insert(playable.url.clone(), Arc::from(bytes));
        registry.sources.insert(source_id.to_string(), playable.clone());
        playable
    }

    pub async fn fetch(&self, url: &str) -> Option<Arc<[u8]>> {
        self.registry.read().await.blobs.get(url).cloned()
    }

    /// Release the bytes behind `url`; returns whether it was registered
    pub async fn revoke(&self, url: &str) -> bool {
        let mut registry = self.registry.write().await;
        registry.sources.retain(|_, playable| playable.url != url);
        registry.blobs.remove(url).is_some()
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.blobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.blobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_fetch_revoke() {
        let media = MediaUrls::new();
        let playable = media.register("v1", vec![1, 2, 3], "video/mp4").await;
        assert!(playable.url.starts_with("blob:dudemy/"));
        assert_eq!(playable.size, 3);

        assert_eq!(media.fetch(&playable.url).await.as_deref(), Some(&[1u8, 2, 3][..]));
        assert!(media.revoke(&playable.url).await);
        assert!(!media.revoke(&playable.url).await);
        assert!(media.fetch(&playable.url).await.is_none());
        assert!(media.is_empty().await);
    }

    #[tokio::test]
    async fn test_one_url_per_source() {
        let media = MediaUrls::new();
        let a = media.register("v1", vec![9], "video/mp4").await;
        let again = media.register("v1", vec![9], "video/mp4").await;
        let b = media.register("v2", vec![9], "video/mp4").await;
        assert_eq!(a, again);
        assert_ne!(a.url, b.url);
        assert_eq!(media.len().await, 2);
        assert_eq!(media.reference("v1").await, Some(a));
    }

    #[tokio::test]
    async fn test_revoked_source_gets_fresh_url() {
        let media = MediaUrls::new();
        let first = media.register("v1", vec![9], "video/mp4").await;
        assert!(media.revoke(&first.url).await);
        assert!(media.reference("v1").await.is_none());

        let second = media.register("v1", vec![9], "video/mp4").await;
        assert_ne!(first.url, second.url);
        assert_eq!(media.len().await, 1);
    }
}
