//! Dudemy: DID-addressed course publishing
//!
//! Courses, lessons and videos live as protocol records on a decentralized
//! storage node addressed by the instructor's DID. Authoring is gated by a
//! self-issued, signed instructor credential.

pub mod config;
pub mod content;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod node;
pub mod platform;
pub mod protocol;
pub mod session;

pub use config::PlatformConfig;
pub use content::{Comment, Course, CourseManager, Lesson, MediaUrls, PlayableRef, PublishPolicy};
pub use credentials::{AuthState, CredentialAuthority, InstructorCredential, VerifiableCredential};
pub use error::{PlatformError, Result};
pub use identity::{Did, DidResolver, IdentityAgent, KeyStore};
pub use node::{DwnNode, InMemoryNode, NodeNetwork};
pub use platform::{Command, CommandOutput, Platform};
pub use protocol::{dudemy_protocol, AnnouncedProtocol, ProtocolDefinition, ProtocolRegistrar};
pub use session::{SessionCache, SessionState};
