//! Platform configuration
//!
//! Plain serde struct with sensible defaults. Can be loaded from a JSON file;
//! a missing or unreadable file falls back to the defaults.

use crate::error::Result;
use crate::protocol::DUDEMY_PROTOCOL;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration shared by every platform component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Protocol URI the course hierarchy lives under
    pub protocol_uri: String,
    /// Node-side limit for course listings
    pub course_limit: usize,
    /// Node-side limit for lesson listings
    pub lesson_limit: usize,
    /// Node-side limit for comment listings
    pub comment_limit: usize,
    /// Session cache key the signed credential is stored under
    pub credential_cache_key: String,
    /// Schema tag of the durable credential record
    pub credential_schema: String,
    /// Data format of the durable credential record
    pub credential_format: String,
    /// Whether authoring commands require a verified instructor credential
    pub require_instructor: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            protocol_uri: DUDEMY_PROTOCOL.to_string(),
            course_limit: 5,
            lesson_limit: 3,
            comment_limit: 10,
            credential_cache_key: "instructorCredential".to_string(),
            credential_schema: "TeacherCredential".to_string(),
            credential_format: "application/vc+jwt".to_string(),
            require_instructor: true,
        }
    }
}

impl PlatformConfig {
    /// Configuration for the anonymous flow: no credential gate on authoring
    pub fn anonymous() -> Self {
        Self {
            require_instructor: false,
            ..Self::default()
        }
    }

    /// Load a config file, or fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<PlatformConfig>(&json) {
                    Ok(config) => {
                        info!("Loaded platform config from {}", path.display());
                        return config;
                    }
                    Err(e) => warn!("Ignoring malformed config {}: {}", path.display(), e),
                },
                Err(e) => warn!("Cannot read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
