//! Identity metadata records.

use serde::{Deserialize, Serialize};

use crate::did::Did;
use crate::error::{IdentityError, Result};

/// Role of an identity within an ownership hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityRole {
    /// A human or organisation that controls agents.
    Owner,
    /// An autonomous agent, always bound to exactly one owner.
    Agent,
}

impl IdentityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Agent => "agent",
        }
    }
}

impl std::str::FromStr for IdentityRole {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "owner" => Ok(Self::Owner),
            "agent" => Ok(Self::Agent),
            other => Err(IdentityError::Format(format!("unknown identity role: {other}"))),
        }
    }
}

/// Public metadata for one identity, as kept in the keystore index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub did: Did,
    pub role: IdentityRole,
    pub name: String,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_did: Option<Did>,
}

impl Identity {
    /// Metadata for a new owner identity.
    pub fn owner(did: Did, name: impl Into<String>) -> Self {
        Self {
            did,
            role: IdentityRole::Owner,
            name: name.into(),
            created_at: crate::time::now_micros(),
            owner_did: None,
        }
    }

    /// Metadata for a new agent identity bound to `owner`.
    pub fn agent(did: Did, name: impl Into<String>, owner: Did) -> Self {
        Self {
            did,
            role: IdentityRole::Agent,
            name: name.into(),
            created_at: crate::time::now_micros(),
            owner_did: Some(owner),
        }
    }

    /// Check the role/owner invariant: agents have an owner, owners do not.
    pub fn check_role(&self) -> Result<()> {
        match (self.role, &self.owner_did) {
            (IdentityRole::Agent, None) => Err(IdentityError::Policy(format!(
                "agent identity {} must reference an owner",
                self.did
            ))),
            (IdentityRole::Owner, Some(_)) => Err(IdentityError::Policy(format!(
                "owner identity {} cannot reference an owner",
                self.did
            ))),
            _ => Ok(()),
        }
    }
}
