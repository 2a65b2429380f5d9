//! On-disk key records.
//!
//! Encrypted record:
//! ```json
//! {
//!     "version": 1,
//!     "did": "did:key:z6Mk...",
//!     "encryptedPrivateKey": "<base64 ciphertext>",
//!     "publicKey": "<base64 32 bytes>",
//!     "iv": "<base64 12 bytes>",
//!     "authTag": "<base64 16 bytes>",
//!     "salt": "<base64 16 bytes>",
//!     "kdf": { "name": "argon2id", "iterations": 3, "hash": "blake2b",
//!              "keyLength": 32, "memoryKib": 65536, "parallelism": 4 },
//!     "cipher": { "name": "chacha20-poly1305", "ivLength": 12, "authTagLength": 16 }
//! }
//! ```
//!
//! A plaintext record has no `iv`, `authTag`, `salt`, `kdf` or `cipher`, and
//! `encryptedPrivateKey` carries the raw private key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::config::KdfParams;
use crate::crypto::encryption::{
    self, AUTH_TAG_LENGTH, CIPHER_NAME, IV_LENGTH, KDF_HASH, KDF_NAME, KEY_LENGTH,
};
use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::identity::KeyMaterial;

const KEY_RECORD_VERSION: u32 = 1;

/// KDF parameters stored with an encrypted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfDescriptor {
    pub name: String,
    pub iterations: u32,
    pub hash: String,
    pub key_length: usize,
    pub memory_kib: u32,
    pub parallelism: u32,
}

impl KdfDescriptor {
    fn from_params(params: &KdfParams) -> Self {
        Self {
            name: KDF_NAME.to_string(),
            iterations: params.iterations,
            hash: KDF_HASH.to_string(),
            key_length: KEY_LENGTH,
            memory_kib: params.memory_kib,
            parallelism: params.parallelism,
        }
    }

    fn params(&self) -> KdfParams {
        KdfParams {
            iterations: self.iterations,
            memory_kib: self.memory_kib,
            parallelism: self.parallelism,
        }
    }
}

/// Cipher parameters stored with an encrypted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherDescriptor {
    pub name: String,
    pub iv_length: usize,
    pub auth_tag_length: usize,
}

/// On-disk projection of [`KeyMaterial`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedKeyRecord {
    pub version: u32,
    pub did: Did,
    pub encrypted_private_key: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<KdfDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<CipherDescriptor>,
}

impl EncryptedKeyRecord {
    /// Encrypt key material under a passphrase.
    pub fn seal(key: &KeyMaterial, passphrase: &str, params: &KdfParams) -> Result<Self> {
        let sealed =
            encryption::encrypt_with_passphrase(passphrase.as_bytes(), key.private_key(), params)?;
        Ok(Self {
            version: KEY_RECORD_VERSION,
            did: key.did(),
            encrypted_private_key: STANDARD.encode(&sealed.ciphertext),
            public_key: STANDARD.encode(key.public_key()),
            iv: Some(STANDARD.encode(sealed.iv)),
            auth_tag: Some(STANDARD.encode(sealed.auth_tag)),
            salt: Some(STANDARD.encode(sealed.salt)),
            kdf: Some(KdfDescriptor::from_params(params)),
            cipher: Some(CipherDescriptor {
                name: CIPHER_NAME.to_string(),
                iv_length: IV_LENGTH,
                auth_tag_length: AUTH_TAG_LENGTH,
            }),
        })
    }

    /// Store key material without encryption.
    pub fn plaintext(key: &KeyMaterial) -> Self {
        Self {
            version: KEY_RECORD_VERSION,
            did: key.did(),
            encrypted_private_key: STANDARD.encode(key.private_key()),
            public_key: STANDARD.encode(key.public_key()),
            iv: None,
            auth_tag: None,
            salt: None,
            kdf: None,
            cipher: None,
        }
    }

    /// Whether this record is encrypted. Absence of `kdf`/`cipher` is the
    /// plaintext marker.
    pub fn is_encrypted(&self) -> bool {
        self.kdf.is_some() || self.cipher.is_some()
    }

    /// Public key bytes, readable without any passphrase.
    pub fn public_key_bytes(&self) -> Result<[u8; 32]> {
        let bytes = STANDARD.decode(&self.public_key).map_err(|e| {
            IdentityError::InvalidFileFormat(format!("invalid public key base64: {e}"))
        })?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| IdentityError::Length {
            expected: 32,
            actual: len,
        })
    }

    /// Recover key material.
    ///
    /// For encrypted records every cryptographic failure (wrong passphrase,
    /// tampered ciphertext, mangled IV/tag/salt) is reported as
    /// [`IdentityError::Authentication`].
    pub fn open(&self, passphrase: Option<&str>) -> Result<KeyMaterial> {
        let public_key = self.public_key_bytes()?;

        let private = if self.is_encrypted() {
            let passphrase = passphrase.ok_or_else(|| {
                IdentityError::Policy(format!(
                    "key for {} is encrypted; a passphrase is required",
                    self.did
                ))
            })?;
            self.decrypt(passphrase)?
        } else {
            Zeroizing::new(STANDARD.decode(&self.encrypted_private_key).map_err(|e| {
                IdentityError::InvalidFileFormat(format!("invalid private key base64: {e}"))
            })?)
        };

        let mut private_key = [0u8; 32];
        if private.len() != private_key.len() {
            return Err(if self.is_encrypted() {
                IdentityError::Authentication
            } else {
                IdentityError::Length {
                    expected: 32,
                    actual: private.len(),
                }
            });
        }
        private_key.copy_from_slice(&private);
        let result = KeyMaterial::from_bytes(public_key, private_key).map_err(|e| {
            if self.is_encrypted() {
                IdentityError::Authentication
            } else {
                e
            }
        });
        private_key.zeroize();
        result
    }

    fn decrypt(&self, passphrase: &str) -> Result<Zeroizing<Vec<u8>>> {
        let (kdf, cipher) = match (&self.kdf, &self.cipher) {
            (Some(k), Some(c)) => (k, c),
            _ => {
                return Err(IdentityError::InvalidFileFormat(
                    "encrypted key record is missing kdf or cipher parameters".into(),
                ))
            }
        };
        if kdf.name != KDF_NAME || cipher.name != CIPHER_NAME {
            return Err(IdentityError::InvalidFileFormat(format!(
                "unsupported key protection: kdf={} cipher={}",
                kdf.name, cipher.name
            )));
        }

        let field = |v: &Option<String>| -> Result<Vec<u8>> {
            v.as_deref()
                .and_then(|s| STANDARD.decode(s).ok())
                .ok_or(IdentityError::Authentication)
        };
        let salt = field(&self.salt)?;
        let iv = field(&self.iv)?;
        let tag = field(&self.auth_tag)?;
        let ciphertext = STANDARD
            .decode(&self.encrypted_private_key)
            .map_err(|_| IdentityError::Authentication)?;

        let plain = encryption::decrypt_with_passphrase(
            passphrase.as_bytes(),
            &salt,
            &iv,
            &ciphertext,
            &tag,
            &kdf.params(),
        )?;
        Ok(Zeroizing::new(plain))
    }
}
