//! Challenge-response data types.

use serde::{Deserialize, Serialize};

use crate::config::{KeystoreConfig, DEFAULT_CHALLENGE_TTL_SECS};
use crate::did::Did;

/// Options for [`super::create_payload`].
#[derive(Debug, Clone)]
pub struct ChallengeOptions {
    /// Lifetime in seconds.
    pub ttl_secs: i64,
    pub audience: Option<String>,
    pub domain: Option<String>,
}

impl Default for ChallengeOptions {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CHALLENGE_TTL_SECS,
            audience: None,
            domain: None,
        }
    }
}

impl ChallengeOptions {
    /// Defaults with the TTL taken from a keystore config.
    pub fn from_config(config: &KeystoreConfig) -> Self {
        Self {
            ttl_secs: config.challenge_ttl_secs,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// What the prover signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    pub nonce: String,
    /// Epoch seconds.
    pub issued_at: i64,
    /// Epoch seconds.
    pub expires_at: i64,
    pub did: Did,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A signed challenge response, ready to send to the verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedChallenge {
    pub did: Did,
    pub key_id: String,
    pub payload: ChallengePayload,
    /// base64url JSON of `payload`; the exact bytes that were signed.
    pub encoded_payload: String,
    /// base64url Ed25519 signature.
    pub signature: String,
    pub algorithm: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Values the verifier expects. Unset fields are not checked.
#[derive(Debug, Clone, Default)]
pub struct ChallengeExpectations {
    pub nonce: Option<String>,
    pub audience: Option<String>,
    pub domain: Option<String>,
}

impl ChallengeExpectations {
    pub fn nonce(nonce: impl Into<String>) -> Self {
        Self {
            nonce: Some(nonce.into()),
            ..Self::default()
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Outcome of [`super::verify_challenge`].
#[derive(Debug, Clone, Serialize)]
pub struct AuthVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ChallengePayload>,
}

impl AuthVerification {
    pub(super) fn ok(payload: ChallengePayload) -> Self {
        Self {
            valid: true,
            reason: None,
            payload: Some(payload),
        }
    }

    pub(super) fn fail(reason: &str) -> Self {
        Self {
            valid: false,
            reason: Some(reason.to_string()),
            payload: None,
        }
    }
}
