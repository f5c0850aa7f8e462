//! Instructor credentials
//!
//! - vc: the W3C credential body and the verified [`InstructorCredential`]
//! - jwt: compact EdDSA JWT signing and verification
//! - authority: register / login / logout state machine

mod authority;
pub mod jwt;
mod vc;

pub use authority::{AuthState, CredentialAuthority, INVALID_CREDENTIAL, NOT_REGISTERED};
pub use jwt::JwtError;
pub use vc::{CredentialSubject, InstructorClaims, InstructorCredential, VerifiableCredential, INSTRUCTOR_ROLE};
