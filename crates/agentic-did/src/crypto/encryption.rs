//! Symmetric encryption using ChaCha20-Poly1305 and passphrase-based
//! key derivation using Argon2id.
//!
//! Used for encrypting private keys at rest in keystore key records. The
//! Poly1305 tag is split off the ciphertext so the record can store it in
//! its own `authTag` field.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use zeroize::Zeroize;

use crate::config::KdfParams;
use crate::crypto::derivation;
use crate::crypto::random::{random_nonce_12, random_salt_16};
use crate::error::{IdentityError, Result};

/// Cipher name recorded in key records.
pub const CIPHER_NAME: &str = "chacha20-poly1305";
/// KDF name recorded in key records.
pub const KDF_NAME: &str = "argon2id";
/// Hash underlying the KDF (Argon2 compresses with BLAKE2b).
pub const KDF_HASH: &str = "blake2b";
/// Derived key length in bytes.
pub const KEY_LENGTH: usize = 32;
/// Nonce ("IV") length in bytes.
pub const IV_LENGTH: usize = 12;
/// Poly1305 tag length in bytes.
pub const AUTH_TAG_LENGTH: usize = 16;
/// Salt length in bytes.
pub const SALT_LENGTH: usize = 16;

/// HKDF context separating the keystore encryption key from the raw
/// Argon2id output. Must remain stable across versions.
const KEYSTORE_ENCRYPTION_CONTEXT: &str = "agentic-did/keystore-encryption";

/// Output of passphrase encryption, ready to be written into a key record.
#[derive(Debug, Clone)]
pub struct SealedSecret {
    pub salt: [u8; SALT_LENGTH],
    pub iv: [u8; IV_LENGTH],
    pub ciphertext: Vec<u8>,
    pub auth_tag: [u8; AUTH_TAG_LENGTH],
}

/// Derive a 32-byte encryption key from a passphrase and salt using Argon2id.
pub fn derive_passphrase_key(
    passphrase: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<[u8; KEY_LENGTH]> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| IdentityError::DerivationFailed(format!("Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut output = [0u8; KEY_LENGTH];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| IdentityError::DerivationFailed(format!("Argon2 hash: {e}")))?;

    Ok(output)
}

/// Encrypt plaintext with ChaCha20-Poly1305 under a fresh random nonce.
///
/// Returns `(nonce, ciphertext, tag)`.
pub fn encrypt(
    key: &[u8; KEY_LENGTH],
    plaintext: &[u8],
) -> Result<([u8; IV_LENGTH], Vec<u8>, [u8; AUTH_TAG_LENGTH])> {
    let nonce_bytes = random_nonce_12();
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| IdentityError::EncryptionFailed(format!("cipher init: {e}")))?;
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| IdentityError::EncryptionFailed(format!("encrypt: {e}")))?;

    let tag_start = sealed.len() - AUTH_TAG_LENGTH;
    let mut tag = [0u8; AUTH_TAG_LENGTH];
    tag.copy_from_slice(&sealed[tag_start..]);
    sealed.truncate(tag_start);
    Ok((nonce_bytes, sealed, tag))
}

/// Decrypt ciphertext with ChaCha20-Poly1305.
///
/// Every failure, including malformed nonce or tag lengths, maps to
/// [`IdentityError::Authentication`].
pub fn decrypt(
    key: &[u8; KEY_LENGTH],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>> {
    if nonce.len() != IV_LENGTH || tag.len() != AUTH_TAG_LENGTH {
        return Err(IdentityError::Authentication);
    }
    let cipher =
        ChaCha20Poly1305::new_from_slice(key).map_err(|_| IdentityError::Authentication)?;
    let mut sealed = Vec::with_capacity(ciphertext.len() + AUTH_TAG_LENGTH);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
        .map_err(|_| IdentityError::Authentication)
}

/// Encrypt data with a passphrase.
///
/// passphrase → Argon2id(passphrase, salt) → HKDF-SHA256 → ChaCha20-Poly1305 key
pub fn encrypt_with_passphrase(
    passphrase: &[u8],
    plaintext: &[u8],
    params: &KdfParams,
) -> Result<SealedSecret> {
    let salt = random_salt_16();
    let mut key = stretch(passphrase, &salt, params)?;
    let result = encrypt(&key, plaintext);
    key.zeroize();
    let (iv, ciphertext, auth_tag) = result?;
    Ok(SealedSecret {
        salt,
        iv,
        ciphertext,
        auth_tag,
    })
}

/// Decrypt data with a passphrase.
pub fn decrypt_with_passphrase(
    passphrase: &[u8],
    salt: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    auth_tag: &[u8],
    params: &KdfParams,
) -> Result<Vec<u8>> {
    let mut key = stretch(passphrase, salt, params)?;
    let result = decrypt(&key, iv, ciphertext, auth_tag);
    key.zeroize();
    result
}

fn stretch(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> Result<[u8; KEY_LENGTH]> {
    let mut master = derive_passphrase_key(passphrase, salt, params)?;
    let key = derivation::derive_key(&master, KEYSTORE_ENCRYPTION_CONTEXT);
    master.zeroize();
    key
}
