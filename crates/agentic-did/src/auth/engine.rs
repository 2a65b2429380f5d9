//! Challenge creation, signing and verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::{random, signing};
use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::identity::KeyMaterial;
use crate::keystore::Keystore;

use super::types::*;

/// 32 random bytes as unpadded base64url.
pub fn generate_nonce() -> String {
    URL_SAFE_NO_PAD.encode(random::random_nonce_32())
}

/// Build a challenge payload starting now.
pub fn create_payload(did: &Did, nonce: &str, options: &ChallengeOptions) -> ChallengePayload {
    create_payload_at(did, nonce, options, crate::time::now_secs())
}

pub fn create_payload_at(
    did: &Did,
    nonce: &str,
    options: &ChallengeOptions,
    now: i64,
) -> ChallengePayload {
    ChallengePayload {
        nonce: nonce.to_string(),
        issued_at: now,
        expires_at: crate::time::offset_secs(now, options.ttl_secs),
        did: did.clone(),
        audience: options.audience.clone(),
        domain: options.domain.clone(),
    }
}

/// Sign a challenge with the key of `payload.did` from `keystore`.
pub fn sign_challenge(keystore: &Keystore, payload: &ChallengePayload) -> Result<SignedChallenge> {
    let key = keystore.load_key_material(payload.did.as_str())?;
    sign_challenge_with_key(&key, payload)
}

/// Sign a challenge with key material the caller already holds.
pub fn sign_challenge_with_key(
    key: &KeyMaterial,
    payload: &ChallengePayload,
) -> Result<SignedChallenge> {
    let did = key.did();
    if payload.did != did {
        return Err(IdentityError::Policy(format!(
            "challenge is for {} but the key belongs to {did}",
            payload.did
        )));
    }

    let encoded_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
    let signature = signing::sign_to_base64url(&key.signing_key(), encoded_payload.as_bytes());
    log::debug!("signed challenge for {did}");

    Ok(SignedChallenge {
        key_id: did.verification_method_id(),
        did,
        payload: payload.clone(),
        encoded_payload,
        signature,
        algorithm: signing::ALGORITHM.to_string(),
        issued_at: payload.issued_at,
        expires_at: payload.expires_at,
    })
}

/// Verify a challenge response against the current clock.
///
/// Nonce bookkeeping (issuing, single use) is the caller's job.
pub fn verify_challenge(
    did: &str,
    encoded_payload: &str,
    signature: &str,
    expectations: &ChallengeExpectations,
) -> AuthVerification {
    verify_challenge_at(
        did,
        encoded_payload,
        signature,
        expectations,
        crate::time::now_secs(),
    )
}

pub fn verify_challenge_at(
    did: &str,
    encoded_payload: &str,
    signature: &str,
    expectations: &ChallengeExpectations,
    now: i64,
) -> AuthVerification {
    let payload: ChallengePayload = match URL_SAFE_NO_PAD
        .decode(encoded_payload)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    {
        Some(p) => p,
        None => return AuthVerification::fail("Invalid payload encoding"),
    };

    if payload.did.as_str() != did {
        return AuthVerification::fail("DID mismatch");
    }
    if now >= payload.expires_at {
        return AuthVerification::fail("Challenge has expired");
    }
    if let Some(nonce) = &expectations.nonce {
        if &payload.nonce != nonce {
            return AuthVerification::fail("Nonce mismatch");
        }
    }
    if let Some(audience) = &expectations.audience {
        if payload.audience.as_ref() != Some(audience) {
            return AuthVerification::fail("Audience mismatch");
        }
    }
    if let Some(domain) = &expectations.domain {
        if payload.domain.as_ref() != Some(domain) {
            return AuthVerification::fail("Domain mismatch");
        }
    }

    let verifying_key = match crate::did::decode(did)
        .and_then(|pk| Ed25519KeyPair::verifying_key_from_bytes(&pk))
    {
        Ok(vk) => vk,
        Err(_) => return AuthVerification::fail("Invalid DID"),
    };

    if signing::verify_from_base64url(&verifying_key, encoded_payload.as_bytes(), signature)
        .is_err()
    {
        return AuthVerification::fail("Invalid signature");
    }

    AuthVerification::ok(payload)
}
