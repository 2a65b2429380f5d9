//! AgenticDID — portable, offline-verifiable identity for AI agents.
//!
//! Provides self-certifying `did:key` identifiers, an encrypted file
//! keystore, signed ownership and capability credentials, revocation
//! registries and status lists, challenge-response authentication, and
//! key rotation with identity continuity.

pub mod auth;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod did;
pub mod error;
pub mod identity;
pub mod keystore;
pub mod revocation;
pub mod rotation;
pub mod storage;
pub mod time;

// Re-export primary types
pub use config::{
    resolve_passphrase, KdfParams, KeystoreConfig, PassphraseCandidate, PassphraseOrigin,
    ResolvedPassphrase,
};
pub use did::{Did, DidDocument, DidValidation};
pub use error::{ErrorKind, IdentityError, Result};
pub use identity::{Identity, IdentityRole, KeyMaterial};
pub use keystore::{IntegrityReport, KeyProtection, Keystore};

// Re-export credential types
pub use credential::{
    CredentialClaims, CredentialPayload, CredentialRequest, CredentialStatus, StatusPurpose,
    VerificationResult, VerifyOptions,
};

// Re-export auth types
pub use auth::{
    AuthVerification, ChallengeExpectations, ChallengeOptions, ChallengePayload, SignedChallenge,
};

// Re-export revocation and rotation types
pub use revocation::{RevocationRecord, RevocationRegistry, StatusList, StatusListStore};
pub use rotation::{RotationManager, RotationRecord, RotationStatus};
