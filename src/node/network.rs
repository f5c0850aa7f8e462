//! Endpoint registry for in-process nodes
//!
//! Nodes are addressed by `memory://<uuid>` endpoint URLs. A node is
//! published for its tenant by advertising its endpoint in the DID resolver,
//! which is how `send` finds it.

use super::memory::InMemoryNode;
use crate::identity::{Did, DidResolver};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct NodeNetwork {
    resolver: Arc<DidResolver>,
    nodes: RwLock<HashMap<String, Weak<InMemoryNode>>>,
}

impl NodeNetwork {
    pub fn new(resolver: Arc<DidResolver>) -> Arc<Self> {
        Arc::new(Self {
            resolver,
            nodes: RwLock::new(HashMap::new()),
        })
    }

    pub fn resolver(&self) -> &Arc<DidResolver> {
        &self.resolver
    }

    /// Make `node` reachable at its endpoint; entries of dropped nodes go
    pub(crate) async fn attach(&self, node: &Arc<InMemoryNode>) {
        let mut nodes = self.nodes.write().await;
        let before = nodes.len();
        nodes.retain(|_, weak| weak.strong_count() > 0);
        if nodes.len() < before {
            debug!("Pruned {} dropped nodes", before - nodes.len());
        }
        nodes.insert(node.endpoint().to_string(), Arc::downgrade(node));
    }

    /// Attach `node` and advertise it as its tenant's storage endpoint
    pub async fn publish(&self, node: &Arc<InMemoryNode>) {
        self.attach(node).await;
        self.resolver
            .register_endpoint(node.tenant_did(), node.endpoint())
            .await;
        info!("Published node {} for {}", node.endpoint(), node.tenant_did());
    }

    /// Node currently listening at `endpoint`
    pub async fn lookup(&self, endpoint: &str) -> Option<Arc<InMemoryNode>> {
        let weak = self.nodes.read().await.get(endpoint)?.clone();
        if let Some(node) = weak.upgrade() {
            return Some(node);
        }
        let mut nodes = self.nodes.write().await;
        if nodes.get(endpoint).is_some_and(|w| w.strong_count() == 0) {
            nodes.remove(endpoint);
        }
        None
    }

    /// Registered endpoints, including any not yet pruned
    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }

    /// Resolve `did` to the node advertised in its document
    pub async fn resolve_node(&self, did: &Did) -> Option<Arc<InMemoryNode>> {
        let document = self.resolver.resolve(did).await.ok()?;
        let endpoint = document.dwn_endpoint()?;
        self.lookup(endpoint).await
    }
}
