//! Credential issuance.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::crypto::{random, signing};
use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::identity::KeyMaterial;
use crate::keystore::Keystore;

use super::types::{
    Credential, CredentialClaims, CredentialPayload, CredentialStatus, TokenHeader,
    BASE_CREDENTIAL_TYPE, CREDENTIAL_CONTEXT, TOKEN_TYPE,
};

/// Everything needed to mint one credential.
#[derive(Debug, Clone)]
pub struct CredentialRequest {
    pub issuer: Did,
    pub subject: Did,
    pub claims: CredentialClaims,
    pub audience: Option<String>,
    pub domain: Option<String>,
    /// Epoch seconds.
    pub not_before: Option<i64>,
    /// Epoch seconds.
    pub expires_at: Option<i64>,
    pub status: Option<CredentialStatus>,
}

impl CredentialRequest {
    pub fn new(issuer: Did, subject: Did, claims: CredentialClaims) -> Self {
        Self {
            issuer,
            subject,
            claims,
            audience: None,
            domain: None,
            not_before: None,
            expires_at: None,
            status: None,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn not_before(mut self, secs: i64) -> Self {
        self.not_before = Some(secs);
        self
    }

    pub fn expires_at(mut self, secs: i64) -> Self {
        self.expires_at = Some(secs);
        self
    }

    /// Expire `secs` seconds from now. Saturates at
    /// [`MAX_TIMESTAMP_SECS`](crate::time::MAX_TIMESTAMP_SECS).
    pub fn expires_in(self, secs: i64) -> Self {
        let at = crate::time::offset_secs(crate::time::now_secs(), secs);
        self.expires_at(at)
    }

    pub fn with_status(mut self, status: CredentialStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Build the payload as of `now` (epoch seconds).
    pub fn to_payload(&self, now: i64) -> CredentialPayload {
        let vc = Credential {
            context: vec![CREDENTIAL_CONTEXT.to_string()],
            types: vec![
                BASE_CREDENTIAL_TYPE.to_string(),
                self.claims.credential_type().to_string(),
            ],
            issuer: self.issuer.clone(),
            valid_from: crate::time::secs_to_rfc3339(self.not_before.unwrap_or(now)),
            valid_until: self.expires_at.map(crate::time::secs_to_rfc3339),
            credential_subject: self.claims.to_subject(&self.issuer, &self.subject),
            credential_status: self.status.clone(),
        };
        CredentialPayload {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            iat: now,
            nbf: self.not_before,
            exp: self.expires_at,
            jti: new_credential_id(),
            aud: self.audience.clone(),
            domain: self.domain.clone(),
            vc,
        }
    }
}

/// Ownership credential: `owner` asserts it controls `agent`.
pub fn ownership_credential(owner: &Did, agent: &Did) -> CredentialRequest {
    CredentialRequest::new(owner.clone(), agent.clone(), CredentialClaims::Ownership)
}

/// Capability credential granting `scopes` to `subject`.
pub fn capability_credential<I, S>(issuer: &Did, subject: &Did, scopes: I) -> CredentialRequest
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CredentialRequest::new(
        issuer.clone(),
        subject.clone(),
        CredentialClaims::capability(scopes),
    )
}

fn new_credential_id() -> String {
    format!("urn:adid:cred:{}", hex::encode(random::random_bytes::<16>()))
}

/// Issue a credential signed by the issuer's key from `keystore`.
///
/// # Errors
///
/// `NotFound` if the issuer is not in the keystore, `Authentication` if its
/// key cannot be decrypted.
pub fn issue(keystore: &Keystore, request: &CredentialRequest) -> Result<String> {
    keystore.require_identity(request.issuer.as_str())?;
    let key = keystore.load_key_material(request.issuer.as_str())?;
    let payload = request.to_payload(crate::time::now_secs());
    let token = sign_credential(&key, &payload)?;
    log::info!(
        "issued {} {} to {}",
        request.claims.credential_type(),
        payload.jti,
        payload.sub
    );
    Ok(token)
}

/// Sign a prepared payload with key material the caller already holds.
///
/// The payload's `iss` must be the DID of `key`.
pub fn sign_credential(key: &KeyMaterial, payload: &CredentialPayload) -> Result<String> {
    let did = key.did();
    if payload.iss != did {
        return Err(IdentityError::Policy(format!(
            "payload issuer {} does not match signing key {did}",
            payload.iss
        )));
    }

    let header = TokenHeader {
        alg: signing::ALGORITHM.to_string(),
        typ: TOKEN_TYPE.to_string(),
        kid: did.verification_method_id(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let signature = signing::sign_to_base64url(&key.signing_key(), signing_input.as_bytes());
    Ok(format!("{signing_input}.{signature}"))
}
