//! Per-issuer revocation registry.
//!
//! Each issuer has one append-only list at
//! `revocations/{sanitized-issuer}.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::credential;
use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::keystore::Keystore;
use crate::storage::{self, REVOCATIONS_DIR};

/// One revoked credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRecord {
    pub credential_id: String,
    pub issuer: Did,
    pub subject: Did,
    /// Microseconds since Unix epoch.
    pub revoked_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Answer to [`RevocationRegistry::get_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatus {
    pub credential_id: String,
    pub revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RevocationRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RevocationList {
    issuer: Did,
    revocations: Vec<RevocationRecord>,
}

/// Revocation registry rooted in a keystore directory.
pub struct RevocationRegistry<'a> {
    keystore: &'a Keystore,
}

impl<'a> RevocationRegistry<'a> {
    pub fn new(keystore: &'a Keystore) -> Self {
        Self { keystore }
    }

    /// Revoke a credential.
    ///
    /// # Errors
    ///
    /// `Policy` if the issuer is not held by this keystore or the credential
    /// is already revoked; the list is left unchanged in both cases.
    pub fn revoke(
        &self,
        credential_id: &str,
        issuer: &Did,
        subject: &Did,
        reason: Option<&str>,
    ) -> Result<RevocationRecord> {
        self.keystore.ensure_writable()?;
        require_issuer(self.keystore, issuer)?;

        let mut list = self.load(issuer)?;
        if list
            .revocations
            .iter()
            .any(|r| r.credential_id == credential_id)
        {
            return Err(IdentityError::Policy(format!(
                "credential {credential_id} is already revoked"
            )));
        }

        let record = RevocationRecord {
            credential_id: credential_id.to_string(),
            issuer: issuer.clone(),
            subject: subject.clone(),
            revoked_at: crate::time::now_micros(),
            reason: reason.map(String::from),
        };
        list.revocations.push(record.clone());
        storage::write_json(&self.path(issuer), &list)?;
        log::info!("revoked {credential_id} issued by {issuer}");
        Ok(record)
    }

    /// Revoke a token, taking id, issuer and subject from its payload.
    pub fn revoke_token(&self, token: &str, reason: Option<&str>) -> Result<RevocationRecord> {
        let decoded = credential::decode(token)
            .ok_or_else(|| IdentityError::Format("Malformed token".into()))?;
        let id = credential::credential_id(token)
            .ok_or_else(|| IdentityError::Format("Malformed token".into()))?;
        self.revoke(&id, &decoded.payload.iss, &decoded.payload.sub, reason)
    }

    pub fn is_revoked(&self, issuer: &Did, credential_id: &str) -> Result<bool> {
        Ok(self.find(issuer, credential_id)?.is_some())
    }

    pub fn get_status(&self, issuer: &Did, credential_id: &str) -> Result<RevocationStatus> {
        let record = self.find(issuer, credential_id)?;
        Ok(RevocationStatus {
            credential_id: credential_id.to_string(),
            revoked: record.is_some(),
            record,
        })
    }

    /// All revocations by `issuer`, oldest first.
    pub fn list_revocations(&self, issuer: &Did) -> Result<Vec<RevocationRecord>> {
        Ok(self.load(issuer)?.revocations)
    }

    fn find(&self, issuer: &Did, credential_id: &str) -> Result<Option<RevocationRecord>> {
        Ok(self
            .load(issuer)?
            .revocations
            .into_iter()
            .find(|r| r.credential_id == credential_id))
    }

    fn load(&self, issuer: &Did) -> Result<RevocationList> {
        Ok(storage::read_json(&self.path(issuer))?.unwrap_or_else(|| RevocationList {
            issuer: issuer.clone(),
            revocations: Vec::new(),
        }))
    }

    fn path(&self, issuer: &Did) -> PathBuf {
        self.keystore.root().join(REVOCATIONS_DIR).join(format!(
            "{}.json",
            storage::sanitize_file_name(issuer.as_str())
        ))
    }
}

/// The ownership check shared by both revocation mechanisms.
pub(crate) fn require_issuer(keystore: &Keystore, issuer: &Did) -> Result<()> {
    if keystore.get_identity(issuer.as_str())?.is_none() {
        return Err(IdentityError::Policy(format!(
            "issuer {issuer} is not held by this keystore"
        )));
    }
    Ok(())
}
