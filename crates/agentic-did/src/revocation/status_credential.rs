//! Publishing status lists as signed credentials and checking against them.

use crate::credential::{
    self, CredentialClaims, CredentialRequest, CredentialStatus, StatusPurpose, VerifyOptions,
};
use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::keystore::Keystore;

use super::status_list::{StatusList, StatusListStore};

/// Sign the current state of `(issuer, purpose)` as a status-list
/// credential. Subject and issuer are both `issuer`.
pub fn issue_status_list_credential(
    keystore: &Keystore,
    issuer: &Did,
    purpose: StatusPurpose,
) -> Result<String> {
    let list = StatusListStore::new(keystore).load(issuer, purpose)?;
    let request = CredentialRequest::new(
        issuer.clone(),
        issuer.clone(),
        CredentialClaims::StatusList {
            purpose,
            encoded_list: list.encode()?,
        },
    );
    credential::issue(keystore, &request)
}

/// Whether the bit referenced by `status` is set in a published
/// status-list credential.
///
/// The status-list token is verified first and must come from the issuer
/// named in `status.statusListCredential`.
pub fn check_credential_status(status: &CredentialStatus, status_list_token: &str) -> Result<bool> {
    let result = credential::verify(status_list_token, &VerifyOptions::new());
    let payload = match (result.valid, result.payload) {
        (true, Some(payload)) => payload,
        _ => {
            let reason = result.reason.unwrap_or_default();
            return Err(if reason == "Credential has expired" {
                IdentityError::Expired("status list credential has expired".into())
            } else {
                IdentityError::Policy(format!("status list credential rejected: {reason}"))
            });
        }
    };

    let CredentialClaims::StatusList {
        purpose,
        encoded_list,
    } = payload.claims()?
    else {
        return Err(IdentityError::Format(
            "token is not a status list credential".into(),
        ));
    };

    if CredentialStatus::list_id(&payload.iss, purpose) != status.status_list_credential
        || purpose != status.status_purpose
    {
        return Err(IdentityError::Policy(format!(
            "status list credential does not match {}",
            status.status_list_credential
        )));
    }

    StatusList::from_encoded(payload.iss, purpose, &encoded_list)?
        .get_bit(status.status_list_index)
}
