//! CSPRNG helpers backed by the thread-local `rand` generator.

use rand::RngCore;

/// `N` random bytes. Credential ids use 16.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// Challenge nonce.
pub fn random_nonce_32() -> [u8; 32] {
    random_bytes()
}

/// ChaCha20-Poly1305 nonce.
pub fn random_nonce_12() -> [u8; 12] {
    random_bytes()
}

/// Argon2id salt.
pub fn random_salt_16() -> [u8; 16] {
    random_bytes()
}
