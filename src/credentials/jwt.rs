//! Compact JWT codec for verifiable credentials (`alg: EdDSA`)
//!
//! The signing input is `base64url(header) "." base64url(payload)`; the
//! signature is a detached Ed25519 signature by the issuer's `did:key`.
//! Verification recomputes that input from the received segments and checks
//! it against the key embedded in the `iss` DID.

use super::vc::VerifiableCredential;
use crate::identity::{Did, DidError};
use base64::prelude::*;
use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};

pub const JWT_ALG: &str = "EdDSA";
pub const JWT_TYP: &str = "JWT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
    pub kid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtPayload {
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub vc: VerifiableCredential,
}

/// A parsed but not yet verified token
#[derive(Debug, Clone)]
pub struct DecodedJwt {
    pub header: JwtHeader,
    pub payload: JwtPayload,
    signing_input: String,
    signature: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Malformed JWT: {0}")]
    Malformed(String),

    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("JWT claims disagree with credential: {0}")]
    ClaimMismatch(String),

    #[error("Invalid issuer: {0}")]
    InvalidIssuer(#[from] DidError),

    #[error("Signature verification failed")]
    InvalidSignature,
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, JwtError> {
    let json = serde_json::to_vec(value).map_err(|e| JwtError::Malformed(e.to_string()))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T, JwtError> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JwtError::Malformed(format!("{}: {}", what, e)))?;
    serde_json::from_slice(&bytes).map_err(|e| JwtError::Malformed(format!("{}: {}", what, e)))
}

/// Sign `vc` with a detached signer for its issuer, producing a compact JWT
pub fn sign<F>(vc: &VerifiableCredential, signer: F) -> Result<String, JwtError>
where
    F: Fn(&[u8]) -> Result<Vec<u8>, DidError>,
{
    let header = JwtHeader {
        alg: JWT_ALG.to_string(),
        typ: JWT_TYP.to_string(),
        kid: vc.issuer.key_id(),
    };
    let payload = JwtPayload {
        iss: vc.issuer.to_string(),
        sub: vc.subject().to_string(),
        jti: vc.id.clone(),
        iat: chrono::Utc::now().timestamp(),
        vc: vc.clone(),
    };
    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&payload)?);
    let signature = signer(signing_input.as_bytes())?;
    Ok(format!("{}.{}", signing_input, BASE64_URL_SAFE_NO_PAD.encode(signature)))
}

/// Split and decode a compact JWT without checking its signature
pub fn decode(jwt: &str) -> Result<DecodedJwt, JwtError> {
    let mut parts = jwt.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::Malformed("expected three segments".into()));
    };
    let signature = BASE64_URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| JwtError::Malformed(format!("signature: {}", e)))?;
    Ok(DecodedJwt {
        header: decode_segment(header, "header")?,
        payload: decode_segment(payload, "payload")?,
        signing_input: format!("{}.{}", header, payload),
        signature,
    })
}

/// Verify a compact JWT and return the credential it carries
pub fn verify(jwt: &str) -> Result<VerifiableCredential, JwtError> {
    let decoded = decode(jwt)?;
    if decoded.header.alg != JWT_ALG {
        return Err(JwtError::UnsupportedAlgorithm(decoded.header.alg));
    }

    let payload = decoded.payload;
    if payload.iss != payload.vc.issuer.as_str() {
        return Err(JwtError::ClaimMismatch(format!(
            "iss {} vs issuer {}",
            payload.iss, payload.vc.issuer
        )));
    }
    if payload.sub != payload.vc.subject().as_str() {
        return Err(JwtError::ClaimMismatch(format!(
            "sub {} vs subject {}",
            payload.sub,
            payload.vc.subject()
        )));
    }
    if payload.jti != payload.vc.id {
        return Err(JwtError::ClaimMismatch("jti does not match credential id".into()));
    }

    let issuer = Did::parse(payload.iss.as_str())?;
    if decoded.header.kid != issuer.key_id() {
        return Err(JwtError::ClaimMismatch(format!("kid {} not issued by {}", decoded.header.kid, issuer)));
    }
    let key = issuer.verifying_key()?;
    let signature = Signature::from_slice(&decoded.signature).map_err(|_| JwtError::InvalidSignature)?;
    key.verify_strict(decoded.signing_input.as_bytes(), &signature)
        .map_err(|_| JwtError::InvalidSignature)?;

    Ok(payload.vc)
}
