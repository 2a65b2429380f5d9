//! Self-contained credential verification.
//!
//! Checks, in order; the first failure is reported:
//! 1. Token has three segments
//! 2. Header decodes and names `EdDSA`
//! 3. Payload decodes
//! 4. Not expired, not before `nbf`
//! 5. Issuer allow-list, subject, audience, domain
//! 6. Issuer DID decodes to an Ed25519 key
//! 7. Signature over `header.payload`
//!
//! No keystore is consulted. Revocation is checked separately.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;

use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::signing;

use super::types::{CredentialPayload, TokenHeader};

/// Caller expectations. Unset fields are not checked.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub trusted_issuers: Option<Vec<String>>,
    pub subject: Option<String>,
    pub audience: Option<String>,
    pub domain: Option<String>,
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trusted_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_issuers = Some(issuers.into_iter().map(Into::into).collect());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Outcome of [`verify`]. Failure is a value, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<CredentialPayload>,
}

impl VerificationResult {
    fn ok(payload: CredentialPayload) -> Self {
        Self {
            valid: true,
            reason: None,
            payload: Some(payload),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            payload: None,
        }
    }
}

/// Verify a token against the current clock.
pub fn verify(token: &str, options: &VerifyOptions) -> VerificationResult {
    verify_at(token, options, crate::time::now_secs())
}

/// Verify a token as of `now` (epoch seconds).
pub fn verify_at(token: &str, options: &VerifyOptions, now: i64) -> VerificationResult {
    let parts: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = parts.as_slice() else {
        return VerificationResult::fail("Malformed token");
    };

    let Some(header) = decode_segment::<TokenHeader>(header_b64) else {
        return VerificationResult::fail("Malformed token");
    };
    if header.alg != signing::ALGORITHM {
        return VerificationResult::fail(format!("Unsupported algorithm: {}", header.alg));
    }

    let Some(payload) = decode_segment::<CredentialPayload>(payload_b64) else {
        return VerificationResult::fail("Malformed payload");
    };

    let Ok(expires_at) = payload.expires_at() else {
        return VerificationResult::fail("Malformed payload");
    };
    if expires_at.is_some_and(|exp| now >= exp) {
        return VerificationResult::fail("Credential has expired");
    }
    if payload.nbf.is_some_and(|nbf| now < nbf) {
        return VerificationResult::fail("Credential is not yet valid");
    }

    if let Some(issuers) = &options.trusted_issuers {
        if !issuers.iter().any(|i| i == payload.iss.as_str()) {
            return VerificationResult::fail("Untrusted issuer");
        }
    }
    if let Some(subject) = &options.subject {
        if subject != payload.sub.as_str() {
            return VerificationResult::fail("Subject mismatch");
        }
    }
    if let Some(audience) = &options.audience {
        if payload.aud.as_ref() != Some(audience) {
            return VerificationResult::fail("Audience mismatch");
        }
    }
    if let Some(domain) = &options.domain {
        if payload.domain.as_ref() != Some(domain) {
            return VerificationResult::fail("Domain mismatch");
        }
    }

    let verifying_key = match payload
        .iss
        .public_key()
        .and_then(|pk| Ed25519KeyPair::verifying_key_from_bytes(&pk))
    {
        Ok(vk) => vk,
        Err(e) => return VerificationResult::fail(format!("Invalid issuer DID: {e}")),
    };

    let signing_input = format!("{header_b64}.{payload_b64}");
    if signing::verify_from_base64url(&verifying_key, signing_input.as_bytes(), signature_b64)
        .is_err()
    {
        return VerificationResult::fail("Invalid signature");
    }

    VerificationResult::ok(payload)
}

pub(super) fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}
