//! Credential authority
//!
//! Issues, persists and verifies the self-issued instructor credential.
//!
//! ```text
//! LoggedOut ──register──▶ Registering ──▶ LoggedIn
//! LoggedOut ──login────▶ LoggingIn ──▶ LoggedIn | LoggedOut(message)
//! any ───────logout────▶ LoggedOut
//! ```
//!
//! A signed credential is stored twice: in the session cache under a fixed
//! key and as a durable node record tagged with the credential schema.
//! `login` tries the cache first and falls back to the newest durable record
//! authored by the current DID.

use super::vc::InstructorCredential;
use crate::config::PlatformConfig;
use crate::error::{PlatformError, Result};
use crate::identity::{Did, IdentityAgent};
use crate::node::{CreateRecord, DwnNode, RecordData, RecordMessage, RecordsFilter};
use crate::session::{SessionCache, SessionState};
use log::{debug, info, warn};
use std::sync::Arc;

pub const NOT_REGISTERED: &str = "not registered";
pub const INVALID_CREDENTIAL: &str = "invalid credential";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut { message: Option<String> },
    Registering,
    LoggingIn,
    LoggedIn(InstructorCredential),
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::LoggedOut { message: None }
    }
}

impl AuthState {
    pub fn credential(&self) -> Option<&InstructorCredential> {
        match self {
            AuthState::LoggedIn(credential) => Some(credential),
            _ => None,
        }
    }
}

pub struct CredentialAuthority<N: DwnNode + ?Sized> {
    node: Arc<N>,
    agent: Arc<IdentityAgent>,
    cache: SessionCache,
    cache_key: String,
    schema: String,
    data_format: String,
}

impl<N: DwnNode + ?Sized> CredentialAuthority<N> {
    pub fn new(node: Arc<N>, agent: Arc<IdentityAgent>, cache: SessionCache, config: &PlatformConfig) -> Self {
        Self {
            node,
            agent,
            cache,
            cache_key: config.credential_cache_key.clone(),
            schema: config.credential_schema.clone(),
            data_format: config.credential_format.clone(),
        }
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Issue a credential for the session's DID, persist it and log in
    pub async fn register(
        &self,
        session: &mut SessionState,
        name: &str,
        email: &str,
    ) -> Result<InstructorCredential> {
        if name.is_empty() || email.is_empty() {
            return Err(PlatformError::validation("name and email are required"));
        }
        session.set_auth(AuthState::Registering);

        let did = session.did().clone();
        match self.issue_and_store(&did, name, email).await {
            Ok(credential) => {
                info!("Registered instructor credential {} for {}", credential.vc().id, did);
                session.set_auth(AuthState::LoggedIn(credential.clone()));
                Ok(credential)
            }
            Err(e) => {
                warn!("Registration failed: {}", e);
                session.set_auth(AuthState::LoggedOut {
                    message: Some(e.to_string()),
                });
                Err(e)
            }
        }
    }

    async fn issue_and_store(&self, did: &Did, name: &str, email: &str) -> Result<InstructorCredential> {
        let credential = InstructorCredential::issue(&self.agent, did, name, email, &self.schema)?;

        let message = RecordMessage::schema_only(&self.schema, &self.data_format);
        let data = RecordData::from_bytes(credential.jwt().as_bytes());
        let record = self
            .node
            .create_record(did, CreateRecord::new(data, message))
            .await?;
        if let Err(e) = self.node.send_record(&record.id, did).await {
            // an unpropagated record must not log this identity in later
            if let Err(cleanup) = self.node.delete_record(did, &record.id).await {
                warn!("Could not remove unsent credential record {}: {}", record.id, cleanup);
            }
            return Err(e.into());
        }
        debug!("Stored credential record {}", record.id);

        self.cache.set(&self.cache_key, credential.jwt()).await;
        Ok(credential)
    }

    /// Restore and verify the session's credential
    pub async fn login(&self, session: &mut SessionState) -> Result<InstructorCredential> {
        session.set_auth(AuthState::LoggingIn);

        let did = session.did().clone();
        match self.restore(&did).await {
            Ok(credential) => {
                info!("Logged in as {} ({})", credential.claims().name, did);
                session.set_auth(AuthState::LoggedIn(credential.clone()));
                Ok(credential)
            }
            Err(e) => {
                session.set_auth(AuthState::LoggedOut {
                    message: Some(e.to_string()),
                });
                Err(e)
            }
        }
    }

    async fn restore(&self, did: &Did) -> Result<InstructorCredential> {
        let jwt = match self.cache.get(&self.cache_key).await {
            Some(jwt) => {
                debug!("Credential found in session cache");
                jwt
            }
            None => self
                .fetch_durable(did)
                .await?
                .ok_or_else(|| PlatformError::auth(NOT_REGISTERED))?,
        };

        let credential = InstructorCredential::from_jwt(&jwt).map_err(|e| {
            warn!("Rejected credential: {}", e);
            PlatformError::auth(INVALID_CREDENTIAL)
        })?;
        if credential.subject() != did {
            warn!("Credential subject {} is not {}", credential.subject(), did);
            return Err(PlatformError::auth(INVALID_CREDENTIAL));
        }

        self.cache.set(&self.cache_key, jwt).await;
        Ok(credential)
    }

    /// Newest durable credential authored by `did`
    async fn fetch_durable(&self, did: &Did) -> Result<Option<String>> {
        let filter = RecordsFilter::schema(&self.schema).and_author(did);
        let entries = self.node.query_records(did, &filter, None).await?;
        let Some(latest) = entries.last() else {
            debug!("No durable credential for {}", did);
            return Ok(None);
        };
        let record = self.node.read_record(did, &latest.id).await?;
        String::from_utf8(record.data.into_bytes())
            .map(Some)
            .map_err(|_| PlatformError::auth(INVALID_CREDENTIAL))
    }

    /// Drop the cached credential and log out; durable records are kept
    pub async fn logout(&self, session: &mut SessionState) {
        self.cache.remove(&self.cache_key).await;
        session.set_auth(AuthState::LoggedOut { message: None });
        info!("Logged out {}", session.did());
    }
}
