//! Credential engine: compact signed tokens carrying ownership, capability
//! and status-list claims.
//!
//! Tokens are verifiable offline from their own bytes plus the issuer DID.

pub mod issue;
pub mod types;
pub mod verify;

pub use issue::{
    capability_credential, issue, ownership_credential, sign_credential, CredentialRequest,
};
pub use types::{
    Credential, CredentialClaims, CredentialPayload, CredentialStatus, StatusPurpose,
    TokenHeader,
};
pub use verify::{verify, verify_at, VerificationResult, VerifyOptions};

/// A token split into its parts, unverified.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub payload: CredentialPayload,
    /// base64url signature segment.
    pub signature: String,
}

/// Parse a token without checking its signature or validity window.
///
/// Returns `None` on any parse failure. For inspection tooling only.
pub fn decode(token: &str) -> Option<DecodedToken> {
    let mut parts = token.split('.');
    let (header, payload, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(DecodedToken {
        header: verify::decode_segment(header)?,
        payload: verify::decode_segment(payload)?,
        signature: signature.to_string(),
    })
}

/// Stable identifier of a token, used as the revocation key.
///
/// The `jti` claim when present; otherwise derived from a BLAKE3 hash of the
/// signed segments.
pub fn credential_id(token: &str) -> Option<String> {
    let decoded = decode(token)?;
    if !decoded.payload.jti.is_empty() {
        return Some(decoded.payload.jti);
    }
    let signing_input = token.rsplit_once('.').map(|(input, _)| input)?;
    Some(format!(
        "urn:adid:token:{}",
        blake3::hash(signing_input.as_bytes()).to_hex()
    ))
}
