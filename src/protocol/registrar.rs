//! Protocol registrar
//!
//! Installs a protocol definition on the local node, then announces it to
//! the owner's network endpoint. Content operations take an
//! [`AnnouncedProtocol`], which can only be obtained through
//! [`ProtocolRegistrar::announce`], so nothing touches the hierarchy before
//! both steps have completed.

use super::ProtocolDefinition;
use crate::error::{PlatformError, Result};
use crate::identity::Did;
use crate::node::{ConfigureStatus, DwnNode, NodeError};
use log::info;
use std::sync::Arc;

/// A protocol configured on the local node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledProtocol {
    definition: ProtocolDefinition,
    status: ConfigureStatus,
}

impl InstalledProtocol {
    pub fn uri(&self) -> &str {
        &self.definition.protocol
    }

    pub fn definition(&self) -> &ProtocolDefinition {
        &self.definition
    }

    pub fn status(&self) -> ConfigureStatus {
        self.status
    }
}

/// A protocol installed locally and propagated to its owner's endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedProtocol {
    installed: InstalledProtocol,
    owner: Did,
}

impl AnnouncedProtocol {
    pub fn uri(&self) -> &str {
        self.installed.uri()
    }

    pub fn definition(&self) -> &ProtocolDefinition {
        self.installed.definition()
    }

    pub fn owner(&self) -> &Did {
        &self.owner
    }
}

pub struct ProtocolRegistrar<N: DwnNode + ?Sized> {
    node: Arc<N>,
}

impl<N: DwnNode + ?Sized> ProtocolRegistrar<N> {
    pub fn new(node: Arc<N>) -> Self {
        Self { node }
    }

    /// Configure `definition` on the node; an identical prior install counts as success
    pub async fn install(&self, definition: &ProtocolDefinition) -> Result<InstalledProtocol> {
        let tenant = self.node.tenant().clone();
        let status = self
            .node
            .configure_protocol(&tenant, definition)
            .await
            .map_err(protocol_error)?;
        info!("Protocol {} installed ({:?})", definition.protocol, status);
        Ok(InstalledProtocol {
            definition: definition.clone(),
            status,
        })
    }

    /// Propagate an installed protocol to `owner`'s endpoint
    pub async fn announce(&self, installed: InstalledProtocol, owner: &Did) -> Result<AnnouncedProtocol> {
        self.node
            .send_protocol(installed.uri(), owner)
            .await
            .map_err(protocol_error)?;
        info!("Protocol {} announced to {}", installed.uri(), owner);
        Ok(AnnouncedProtocol {
            installed,
            owner: owner.clone(),
        })
    }

    /// `install` followed by `announce` to the node's own tenant
    pub async fn provision(&self, definition: &ProtocolDefinition) -> Result<AnnouncedProtocol> {
        let installed = self.install(definition).await?;
        let owner = self.node.tenant().clone();
        self.announce(installed, &owner).await
    }
}

/// Install/propagate failures are fatal to startup whatever their cause
fn protocol_error(err: NodeError) -> PlatformError {
    PlatformError::Protocol(err.to_string())
}
