//! Rotation ledger: `rotations.json` in the keystore root.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::storage;

/// Longest chain followed before the ledger is treated as corrupt.
pub const MAX_ROTATION_HOPS: usize = 64;

const LEDGER_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationStatus {
    Completed,
}

/// One `old → new` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationRecord {
    pub old_did: Did,
    pub new_did: Did,
    /// Microseconds since Unix epoch.
    pub rotated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: RotationStatus,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct LedgerFile {
    version: u32,
    pub(super) rotations: Vec<RotationRecord>,
}

pub(super) fn load(path: &Path) -> Result<LedgerFile> {
    Ok(storage::read_json(path)?.unwrap_or_default())
}

pub(super) fn save(path: &Path, ledger: &mut LedgerFile) -> Result<()> {
    ledger.version = LEDGER_VERSION;
    storage::write_json(path, ledger)
}

/// Follow `old → new` links from `start` to the terminal DID.
///
/// Returns the records walked, in order.
///
/// # Errors
///
/// `RotationCycle` if a DID repeats or the chain exceeds
/// [`MAX_ROTATION_HOPS`].
pub(super) fn walk_forward<'a>(
    records: &'a [RotationRecord],
    start: &str,
) -> Result<Vec<&'a RotationRecord>> {
    let links: HashMap<&str, &RotationRecord> =
        records.iter().map(|r| (r.old_did.as_str(), r)).collect();
    walk(start, |did| {
        links
            .get(did)
            .copied()
            .map(|r| (r, r.new_did.as_str()))
    })
}

/// Follow `new → old` links from `start` back to the original DID.
///
/// Returns the records walked, newest first.
pub(super) fn walk_backward<'a>(
    records: &'a [RotationRecord],
    start: &str,
) -> Result<Vec<&'a RotationRecord>> {
    let links: HashMap<&str, &RotationRecord> =
        records.iter().map(|r| (r.new_did.as_str(), r)).collect();
    walk(start, |did| {
        links
            .get(did)
            .copied()
            .map(|r| (r, r.old_did.as_str()))
    })
}

fn walk<'a, 'b>(
    start: &'b str,
    next: impl Fn(&str) -> Option<(&'a RotationRecord, &'a str)>,
) -> Result<Vec<&'a RotationRecord>>
where
    'a: 'b,
{
    let mut visited: HashSet<&str> = HashSet::from([start]);
    let mut current: &str = start;
    let mut path = Vec::new();

    while let Some((record, to)) = next(current) {
        if !visited.insert(to) || path.len() >= MAX_ROTATION_HOPS {
            return Err(IdentityError::RotationCycle(to.to_string()));
        }
        path.push(record);
        current = to;
    }
    Ok(path)
}
