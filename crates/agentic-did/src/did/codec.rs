//! `did:key` codec for Ed25519 public keys.
//!
//! ```text
//! did:key:z<base58btc(0xed 0x01 || 32-byte public key)>
//! ```
//!
//! `z` is the multibase marker for base58btc; `0xed 0x01` is the varint
//! multicodec tag for `ed25519-pub`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// Identifier scheme.
pub const DID_SCHEME: &str = "did";
/// Identifier method.
pub const DID_METHOD: &str = "key";
/// Multibase marker for base58btc.
pub const MULTIBASE_BASE58BTC: char = 'z';
/// Multicodec tag for Ed25519 public keys.
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];
/// Raw Ed25519 public key length.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// A `did:key` identifier.
///
/// Constructed either from a public key (always valid) or by parsing, which
/// runs the full decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(pub String);

impl Did {
    /// Encode a public key as a DID.
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(encode(public_key))
    }

    /// Parse and validate a DID string.
    pub fn parse(s: &str) -> Result<Self> {
        decode(s)?;
        Ok(Self(s.to_string()))
    }

    /// Recover the public key.
    pub fn public_key(&self) -> Result<[u8; PUBLIC_KEY_LENGTH]> {
        decode(&self.0)
    }

    /// The multibase-encoded method-specific identifier (`z6Mk...`).
    pub fn method_specific_id(&self) -> &str {
        self.0
            .strip_prefix("did:key:")
            .unwrap_or(self.0.as_str())
    }

    /// The verification method id: `did#<multibase-value>`.
    pub fn verification_method_id(&self) -> String {
        format!("{}#{}", self.0, self.method_specific_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Did {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encode a raw Ed25519 public key as a `did:key` string.
pub fn encode(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> String {
    let mut tagged = Vec::with_capacity(ED25519_MULTICODEC.len() + PUBLIC_KEY_LENGTH);
    tagged.extend_from_slice(&ED25519_MULTICODEC);
    tagged.extend_from_slice(public_key);
    format!(
        "{DID_SCHEME}:{DID_METHOD}:{MULTIBASE_BASE58BTC}{}",
        bs58::encode(&tagged).into_string()
    )
}

/// Decode a `did:key` string back to the raw Ed25519 public key.
///
/// # Errors
///
/// - `Format` for a wrong scheme/method, a missing or unsupported multibase
///   marker, or characters outside the base58btc alphabet.
/// - `UnsupportedKeyType` if the multicodec tag is not Ed25519.
/// - `Length` if the key is not exactly 32 bytes.
pub fn decode(identifier: &str) -> Result<[u8; PUBLIC_KEY_LENGTH]> {
    let mut parts = identifier.splitn(3, ':');
    let scheme = parts.next().unwrap_or_default();
    let method = parts.next();
    let msid = parts.next();

    let (method, msid) = match (method, msid) {
        (Some(m), Some(id)) if scheme == DID_SCHEME => (m, id),
        _ => {
            return Err(IdentityError::Format(
                "Invalid DID format: expected did:key:<multibase>".into(),
            ))
        }
    };
    if method != DID_METHOD {
        return Err(IdentityError::Format(format!(
            "Unsupported DID method: {method}"
        )));
    }

    let encoded = msid
        .strip_prefix(MULTIBASE_BASE58BTC)
        .ok_or_else(|| IdentityError::Format("Unsupported multibase encoding".into()))?;

    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| IdentityError::Format("Invalid base58 encoding".into()))?;

    if bytes.len() < ED25519_MULTICODEC.len() || bytes[..2] != ED25519_MULTICODEC {
        let tag = bytes.iter().take(2).map(|b| format!("{b:02x}")).collect::<String>();
        return Err(IdentityError::UnsupportedKeyType(format!(
            "expected Ed25519 multicodec 0xed01, got 0x{tag}"
        )));
    }

    let key = &bytes[ED25519_MULTICODEC.len()..];
    key.try_into().map_err(|_| IdentityError::Length {
        expected: PUBLIC_KEY_LENGTH,
        actual: key.len(),
    })
}
