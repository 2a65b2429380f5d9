//! Key derivation using HKDF-SHA256.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{IdentityError, Result};

/// Derive a 32-byte child key from input key material and a context string.
///
/// Uses HKDF-SHA256 (RFC 5869) with the input as IKM and the context as info.
pub fn derive_key(ikm: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| IdentityError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}
