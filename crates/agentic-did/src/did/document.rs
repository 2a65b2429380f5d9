//! Minimal DID document view for `did:key` identifiers.
//!
//! The document is derived entirely from the identifier; nothing is fetched.

use serde::{Deserialize, Serialize};

use super::codec::Did;
use crate::error::Result;

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
const ED25519_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
const VERIFICATION_KEY_TYPE: &str = "Ed25519VerificationKey2020";

/// A W3C DID document with one Ed25519 verification method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
}

/// A verification method entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    pub public_key_multibase: String,
}

impl DidDocument {
    /// Resolve a `did:key` identifier into its document.
    ///
    /// Fails with the same errors as [`super::decode`].
    pub fn resolve(did: &Did) -> Result<Self> {
        did.public_key()?;
        let vm_id = did.verification_method_id();
        Ok(Self {
            context: vec![DID_CONTEXT.to_string(), ED25519_CONTEXT.to_string()],
            id: did.to_string(),
            verification_method: vec![VerificationMethod {
                id: vm_id.clone(),
                type_: VERIFICATION_KEY_TYPE.to_string(),
                controller: did.to_string(),
                public_key_multibase: did.method_specific_id().to_string(),
            }],
            authentication: vec![vm_id.clone()],
            assertion_method: vec![vm_id],
        })
    }
}
