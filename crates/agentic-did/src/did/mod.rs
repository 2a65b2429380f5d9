//! Identifier codec: raw Ed25519 public keys ↔ self-certifying `did:key`
//! identifiers.

pub mod codec;
pub mod document;

use serde::Serialize;

pub use codec::{decode, encode, Did, DID_METHOD, DID_SCHEME, ED25519_MULTICODEC};
pub use document::{DidDocument, VerificationMethod};

/// Result record for tooling that validates identifiers without handling
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DidValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Validate an identifier, reporting the decode failure as a reason string.
pub fn validate(identifier: &str) -> DidValidation {
    match decode(identifier) {
        Ok(_) => DidValidation {
            valid: true,
            reason: None,
        },
        Err(e) => DidValidation {
            valid: false,
            reason: Some(e.to_string()),
        },
    }
}
