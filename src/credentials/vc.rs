//! Verifiable credential model
//!
//! An instructor credential is self-issued: issuer and subject are the same
//! DID, and the claims assert the holder's name, email and the
//! `Instructor` role.

use super::jwt::{self, JwtError};
use crate::identity::{Did, IdentityAgent};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const VC_TYPE: &str = "VerifiableCredential";
pub const INSTRUCTOR_ROLE: &str = "Instructor";

/// Claims carried by an instructor credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorClaims {
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub id: Did,
    #[serde(flatten)]
    pub claims: InstructorClaims,
}

/// Unsigned W3C credential body, embedded as the `vc` claim of a JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub issuer: Did,
    pub issuance_date: String,
    pub credential_subject: CredentialSubject,
}

impl VerifiableCredential {
    /// Build an unsigned instructor credential of type `credential_type`
    pub fn instructor(issuer: &Did, subject: &Did, name: &str, email: &str, credential_type: &str) -> Self {
        Self {
            context: vec![VC_CONTEXT.to_string()],
            id: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            types: vec![VC_TYPE.to_string(), credential_type.to_string()],
            issuer: issuer.clone(),
            issuance_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            credential_subject: CredentialSubject {
                id: subject.clone(),
                claims: InstructorClaims {
                    name: name.to_string(),
                    email: email.to_string(),
                    role: INSTRUCTOR_ROLE.to_string(),
                },
            },
        }
    }

    pub fn subject(&self) -> &Did {
        &self.credential_subject.id
    }

    pub fn claims(&self) -> &InstructorClaims {
        &self.credential_subject.claims
    }

    /// Same issuer, subject and claims; ids and dates may differ
    pub fn same_assertion(&self, other: &VerifiableCredential) -> bool {
        self.issuer == other.issuer
            && self.subject() == other.subject()
            && self.claims() == other.claims()
    }
}

/// A credential together with the compact JWT it was verified from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructorCredential {
    pub(crate) jwt: String,
    pub(crate) vc: VerifiableCredential,
}

impl InstructorCredential {
    /// Self-issue and sign a credential for `did` with the agent's key
    pub fn issue(
        agent: &IdentityAgent,
        did: &Did,
        name: &str,
        email: &str,
        credential_type: &str,
    ) -> Result<Self, JwtError> {
        let vc = VerifiableCredential::instructor(did, did, name, email, credential_type);
        let jwt = jwt::sign(&vc, agent.signer(did))?;
        Ok(Self { jwt, vc })
    }

    /// Verify a compact JWT and check it asserts the instructor role
    pub fn from_jwt(jwt: &str) -> Result<Self, JwtError> {
        let vc = jwt::verify(jwt)?;
        if vc.claims().role != INSTRUCTOR_ROLE {
            return Err(JwtError::ClaimMismatch(format!("role {}", vc.claims().role)));
        }
        Ok(Self {
            jwt: jwt.to_string(),
            vc,
        })
    }

    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    pub fn vc(&self) -> &VerifiableCredential {
        &self.vc
    }

    pub fn issuer(&self) -> &Did {
        &self.vc.issuer
    }

    pub fn subject(&self) -> &Did {
        self.vc.subject()
    }

    pub fn claims(&self) -> &InstructorClaims {
        self.vc.claims()
    }
}
