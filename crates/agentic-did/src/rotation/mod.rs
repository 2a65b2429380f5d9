//! Key rotation.
//!
//! Rotating gives an identity a new key and therefore a new DID. The ledger
//! links old to new so relying parties holding the original DID can find
//! the current one. Old identities are deprecated, never deleted.

pub mod ledger;
pub mod manager;

pub use ledger::{RotationRecord, RotationStatus, MAX_ROTATION_HOPS};
pub use manager::RotationManager;
