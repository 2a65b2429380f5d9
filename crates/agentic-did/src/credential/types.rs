//! Credential token data model.
//!
//! A token is `base64url(header).base64url(payload).base64url(signature)`.
//! The payload carries JWT registered claims plus a `vc` object shaped like a
//! W3C verifiable credential.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::did::Did;
use crate::error::{IdentityError, Result};

/// `typ` header value.
pub const TOKEN_TYPE: &str = "JWT";
/// `@context` of every credential.
pub const CREDENTIAL_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";
/// Base type present in every `type` array.
pub const BASE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

pub const OWNERSHIP_CREDENTIAL_TYPE: &str = "AgentOwnershipCredential";
pub const CAPABILITY_CREDENTIAL_TYPE: &str = "AgentCapabilityCredential";
pub const STATUS_LIST_CREDENTIAL_TYPE: &str = "BitstringStatusListCredential";
/// `type` of a `credentialStatus` entry.
pub const STATUS_LIST_ENTRY_TYPE: &str = "BitstringStatusListEntry";

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    /// Verification method id of the signing key.
    pub kid: String,
}

/// What a status-list bit means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPurpose {
    Revocation,
    Suspension,
}

impl StatusPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revocation => "revocation",
            Self::Suspension => "suspension",
        }
    }
}

impl std::fmt::Display for StatusPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusPurpose {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "revocation" => Ok(Self::Revocation),
            "suspension" => Ok(Self::Suspension),
            other => Err(IdentityError::Format(format!(
                "unknown status purpose: {other}"
            ))),
        }
    }
}

/// Pointer from a credential to its bit in a published status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub id: String,
    #[serde(rename = "type")]
    pub status_type: String,
    pub status_purpose: StatusPurpose,
    pub status_list_index: u64,
    /// Identifier of the status-list credential holding the bit.
    pub status_list_credential: String,
}

impl CredentialStatus {
    /// Identifier under which an issuer publishes a status list.
    pub fn list_id(issuer: &Did, purpose: StatusPurpose) -> String {
        format!("{issuer}/status/{purpose}")
    }

    pub fn new(issuer: &Did, purpose: StatusPurpose, index: u64) -> Self {
        let list = Self::list_id(issuer, purpose);
        Self {
            id: format!("{list}#{index}"),
            status_type: STATUS_LIST_ENTRY_TYPE.to_string(),
            status_purpose: purpose,
            status_list_index: index,
            status_list_credential: list,
        }
    }
}

/// The `vc` claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub issuer: Did,
    /// RFC 3339.
    pub valid_from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    pub credential_subject: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
}

impl Credential {
    /// The most specific type (the last non-base entry).
    pub fn primary_type(&self) -> Option<&str> {
        self.types
            .iter()
            .rev()
            .map(String::as_str)
            .find(|t| *t != BASE_CREDENTIAL_TYPE)
    }

    /// Parse the subject into the claim variant named by the type array.
    pub fn claims(&self) -> Result<CredentialClaims> {
        CredentialClaims::from_credential(self)
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialPayload {
    pub iss: Did,
    pub sub: Did,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Credential id. Tokens minted elsewhere may omit it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub vc: Credential,
}

impl CredentialPayload {
    /// Expiry in epoch seconds: `exp`, or `vc.validUntil` when `exp` is
    /// absent.
    ///
    /// # Errors
    ///
    /// `Format` when `exp` is absent and `validUntil` is not RFC 3339.
    pub fn expires_at(&self) -> Result<Option<i64>> {
        if let Some(exp) = self.exp {
            return Ok(Some(exp));
        }
        self.vc
            .valid_until
            .as_deref()
            .map(|until| {
                crate::time::rfc3339_to_secs(until)
                    .ok_or_else(|| IdentityError::Format(format!("invalid validUntil: {until}")))
            })
            .transpose()
    }

    pub fn claims(&self) -> Result<CredentialClaims> {
        self.vc.claims()
    }
}

// ── Claims ────────────────────────────────────────────────────────────────────

/// Claim bundle, one variant per credential type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialClaims {
    /// The issuer owns the subject agent.
    Ownership,
    /// The subject may act within `scopes`.
    Capability { scopes: Vec<String> },
    /// A published status list.
    StatusList {
        purpose: StatusPurpose,
        encoded_list: String,
    },
}

impl CredentialClaims {
    pub fn capability<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Capability {
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn credential_type(&self) -> &'static str {
        match self {
            Self::Ownership => OWNERSHIP_CREDENTIAL_TYPE,
            Self::Capability { .. } => CAPABILITY_CREDENTIAL_TYPE,
            Self::StatusList { .. } => STATUS_LIST_CREDENTIAL_TYPE,
        }
    }

    /// Render as a `credentialSubject` object.
    pub fn to_subject(&self, issuer: &Did, subject: &Did) -> Value {
        match self {
            Self::Ownership => json!({
                "id": subject,
                "ownedBy": issuer,
            }),
            Self::Capability { scopes } => json!({
                "id": subject,
                "scopes": scopes,
            }),
            Self::StatusList {
                purpose,
                encoded_list,
            } => json!({
                "id": CredentialStatus::list_id(issuer, *purpose),
                "type": "BitstringStatusList",
                "statusPurpose": purpose,
                "encodedList": encoded_list,
            }),
        }
    }

    /// Parse the claims of a decoded credential.
    pub fn from_credential(vc: &Credential) -> Result<Self> {
        let subject = &vc.credential_subject;
        let field = |name: &str| {
            subject.get(name).ok_or_else(|| {
                IdentityError::Format(format!("credentialSubject is missing {name}"))
            })
        };

        match vc.primary_type() {
            Some(OWNERSHIP_CREDENTIAL_TYPE) => Ok(Self::Ownership),
            Some(CAPABILITY_CREDENTIAL_TYPE) => {
                let scopes: Vec<String> = serde_json::from_value(field("scopes")?.clone())
                    .map_err(|e| IdentityError::Format(format!("invalid scopes: {e}")))?;
                Ok(Self::Capability { scopes })
            }
            Some(STATUS_LIST_CREDENTIAL_TYPE) => {
                let purpose = serde_json::from_value(field("statusPurpose")?.clone())
                    .map_err(|e| IdentityError::Format(format!("invalid statusPurpose: {e}")))?;
                let encoded_list = field("encodedList")?
                    .as_str()
                    .ok_or_else(|| IdentityError::Format("encodedList must be a string".into()))?
                    .to_string();
                Ok(Self::StatusList {
                    purpose,
                    encoded_list,
                })
            }
            Some(other) => Err(IdentityError::Format(format!(
                "unsupported credential type: {other}"
            ))),
            None => Err(IdentityError::Format("credential has no specific type".into())),
        }
    }
}
