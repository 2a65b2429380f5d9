//! Ed25519 key material owned by the keystore.

use ed25519_dalek::SigningKey;
use zeroize::Zeroizing;

use crate::crypto::keys::Ed25519KeyPair;
use crate::did::Did;
use crate::error::{IdentityError, Result};

/// A 32-byte public key and its 32-byte private key.
///
/// The private half is zeroized on drop and never printed.
pub struct KeyMaterial {
    public_key: [u8; 32],
    private_key: Zeroizing<[u8; 32]>,
}

impl KeyMaterial {
    /// Generate fresh key material.
    pub fn generate() -> Self {
        let kp = Ed25519KeyPair::generate();
        Self {
            public_key: kp.verifying_key_bytes(),
            private_key: Zeroizing::new(kp.signing_key_bytes()),
        }
    }

    /// Rebuild from raw bytes, checking that the halves belong together.
    pub fn from_bytes(public_key: [u8; 32], private_key: [u8; 32]) -> Result<Self> {
        let private_key = Zeroizing::new(private_key);
        let kp = Ed25519KeyPair::from_signing_key_bytes(&private_key);
        if kp.verifying_key_bytes() != public_key {
            return Err(IdentityError::InvalidKey(
                "private key does not match public key".into(),
            ));
        }
        Ok(Self {
            public_key,
            private_key,
        })
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    /// Raw private key bytes. Only the keystore and signing paths use this.
    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// The DID derived from the public key.
    pub fn did(&self) -> Did {
        Did::from_public_key(&self.public_key)
    }

    /// Build a transient signing key.
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.private_key)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("did", &self.did())
            .field("private_key", &"<redacted>")
            .finish()
    }
}
