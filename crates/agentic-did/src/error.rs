//! Error types for AgenticDID.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material is never included in error messages.

/// Message used for every authenticated-decryption failure.
///
/// Wrong passphrase and corrupted ciphertext are deliberately reported the
/// same way so callers cannot tell them apart.
pub const AUTHENTICATION_FAILED: &str =
    "Failed to decrypt private key: invalid passphrase or corrupted key data";

/// Identity error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("{}", AUTHENTICATION_FAILED)]
    Authentication,

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Passphrase rejected: {0}")]
    WeakPassphrase(String),

    #[error("Policy violation: {0}")]
    Policy(String),

    #[error("Rotation ledger contains a cycle at {0}")]
    RotationCycle(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error classes exposed to callers that only need to decide how to
/// recover (retry, prompt, abort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Crypto,
    NotFound,
    Policy,
    Expiry,
    Io,
}

impl IdentityError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_)
            | Self::UnsupportedKeyType(_)
            | Self::Length { .. }
            | Self::InvalidFileFormat(_) => ErrorKind::Format,
            Self::InvalidKey(_)
            | Self::SignatureInvalid
            | Self::Authentication
            | Self::DerivationFailed(_)
            | Self::EncryptionFailed(_) => ErrorKind::Crypto,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::WeakPassphrase(_) | Self::Policy(_) | Self::RotationCycle(_) => ErrorKind::Policy,
            Self::Expired(_) => ErrorKind::Expiry,
            Self::StorageError(_)
            | Self::SerializationError(_)
            | Self::Compression(_)
            | Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<serde_json::Error> for IdentityError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, IdentityError>;
