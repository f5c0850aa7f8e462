//! Identity provider
//!
//! - Did / DidDocument: `did:key` identifiers and their resolution
//! - IdentityAgent: key store and detached signer callbacks

mod agent;
mod did;

pub use agent::{IdentityAgent, KeyStore};
pub use did::{Did, DidDocument, DidError, DidResolver, Service, VerificationMethod, DWN_SERVICE_TYPE};
