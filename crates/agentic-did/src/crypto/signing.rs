//! Ed25519 signing and verification.
//!
//! Signatures travel as unpadded base64url, matching the JWS compact
//! serialization used by credential tokens and signed challenges.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{IdentityError, Result};

/// JOSE algorithm name for Ed25519 signatures.
pub const ALGORITHM: &str = "EdDSA";

/// Sign a message with an Ed25519 signing key.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> Result<()> {
    verifying_key
        .verify(message, signature)
        .map_err(|_| IdentityError::SignatureInvalid)
}

/// Sign a message and return the signature as unpadded base64url.
pub fn sign_to_base64url(signing_key: &SigningKey, message: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(sign(signing_key, message).to_bytes())
}

/// Verify an unpadded base64url signature.
pub fn verify_from_base64url(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<()> {
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| IdentityError::SignatureInvalid)?;

    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| IdentityError::SignatureInvalid)?;

    let signature = Signature::from_bytes(&sig_array);
    verify(verifying_key, message, &signature)
}
