//! Revocation: a simple per-issuer registry and privacy-preserving status
//! lists.
//!
//! The registry answers "is credential X revoked" by scanning the issuer's
//! list. Status lists give each credential one bit in a shared, compressed
//! vector, so a relying party fetches one object instead of asking about a
//! specific credential.
//!
//! Both require the revoking keystore to hold the issuer identity.

pub mod registry;
pub mod status_credential;
pub mod status_list;

pub use registry::{RevocationRecord, RevocationRegistry, RevocationStatus};
pub use status_credential::{check_credential_status, issue_status_list_credential};
pub use status_list::{decode_bits, StatusList, StatusListStore};
