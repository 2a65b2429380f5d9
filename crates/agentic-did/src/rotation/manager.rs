//! Key rotation with identity continuity.

use std::path::PathBuf;

use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::identity::{Identity, KeyMaterial};
use crate::keystore::Keystore;
use crate::storage::ROTATION_LEDGER_FILE;

use super::ledger::{self, RotationRecord, RotationStatus, MAX_ROTATION_HOPS};

/// Rotates identities in one keystore and answers continuity queries.
pub struct RotationManager<'a> {
    keystore: &'a Keystore,
}

impl<'a> RotationManager<'a> {
    pub fn new(keystore: &'a Keystore) -> Self {
        Self { keystore }
    }

    /// Replace an identity's key with a fresh one.
    ///
    /// A new identity record with the same role, name and owner is stored
    /// under the new DID. The old identity and its key stay in the keystore
    /// and are only marked deprecated by the ledger entry.
    ///
    /// # Errors
    ///
    /// `NotFound` if `old_did` is not in the keystore. `Policy` if it has
    /// already been rotated or its chain is at the hop limit.
    pub fn rotate_key(&self, old_did: &str, reason: Option<&str>) -> Result<RotationRecord> {
        self.keystore.ensure_writable()?;
        let old = self.keystore.require_identity(old_did)?;

        let path = self.ledger_path();
        let mut ledger_file = ledger::load(&path)?;
        if let Some(existing) = ledger_file
            .rotations
            .iter()
            .find(|r| r.old_did.as_str() == old_did)
        {
            return Err(IdentityError::Policy(format!(
                "{old_did} was already rotated to {}",
                existing.new_did
            )));
        }
        if ledger::walk_backward(&ledger_file.rotations, old_did)?.len() >= MAX_ROTATION_HOPS {
            return Err(IdentityError::Policy(format!(
                "rotation chain for {old_did} has reached {MAX_ROTATION_HOPS} links"
            )));
        }

        let key = KeyMaterial::generate();
        let new_did = key.did();
        let replacement = Identity {
            did: new_did.clone(),
            created_at: crate::time::now_micros(),
            ..old
        };
        self.keystore.store_identity(&replacement, &key)?;

        let record = RotationRecord {
            old_did: Did(old_did.to_string()),
            new_did,
            rotated_at: crate::time::now_micros(),
            reason: reason.map(String::from),
            status: RotationStatus::Completed,
        };
        ledger_file.rotations.push(record.clone());
        ledger::save(&path, &mut ledger_file)?;

        log::info!("rotated {} -> {}", record.old_did, record.new_did);
        Ok(record)
    }

    /// The terminal DID reached by following rotations from `did`.
    ///
    /// A DID that was never rotated is its own current DID.
    pub fn get_current_did(&self, did: &str) -> Result<Did> {
        let ledger_file = ledger::load(&self.ledger_path())?;
        let chain = ledger::walk_forward(&ledger_file.rotations, did)?;
        Ok(chain
            .last()
            .map(|r| r.new_did.clone())
            .unwrap_or_else(|| Did(did.to_string())))
    }

    /// Every rotation in the chain containing `did`, oldest first.
    pub fn rotation_history(&self, did: &str) -> Result<Vec<RotationRecord>> {
        let ledger_file = ledger::load(&self.ledger_path())?;
        let records = &ledger_file.rotations;

        let mut history: Vec<RotationRecord> = ledger::walk_backward(records, did)?
            .into_iter()
            .rev()
            .cloned()
            .collect();
        history.extend(ledger::walk_forward(records, did)?.into_iter().cloned());

        if history.len() > MAX_ROTATION_HOPS {
            return Err(IdentityError::RotationCycle(did.to_string()));
        }
        Ok(history)
    }

    /// Whether `did` has been rotated away from.
    pub fn is_deprecated(&self, did: &str) -> Result<bool> {
        Ok(ledger::load(&self.ledger_path())?
            .rotations
            .iter()
            .any(|r| r.old_did.as_str() == did))
    }

    /// The full ledger in append order.
    pub fn ledger(&self) -> Result<Vec<RotationRecord>> {
        Ok(ledger::load(&self.ledger_path())?.rotations)
    }

    fn ledger_path(&self) -> PathBuf {
        self.keystore.root().join(ROTATION_LEDGER_FILE)
    }
}
