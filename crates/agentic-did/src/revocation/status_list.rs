//! Bit-packed status lists.
//!
//! One list per `(issuer, purpose)`. Bit `i` lives in byte `i / 8`, most
//! significant bit first. The published form is the raw bit buffer,
//! zstd-compressed, then base64url-encoded.
//!
//! Alongside the published bits each list keeps a private allocation bitmap
//! so an index is handed out at most once, even after its status bit has
//! been cleared again.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::credential::{CredentialStatus, StatusPurpose};
use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::keystore::Keystore;
use crate::storage::{self, STATUS_LISTS_DIR};

use super::registry::require_issuer;

const COMPRESSION_LEVEL: i32 = 3;

/// A fixed-capacity bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    issuer: Did,
    purpose: StatusPurpose,
    bits: Vec<u8>,
    allocated: Vec<u8>,
}

impl StatusList {
    /// An all-clear list of `size` bits. `size` must be a positive multiple
    /// of 8.
    pub fn new(issuer: Did, purpose: StatusPurpose, size: usize) -> Result<Self> {
        if size == 0 || size % 8 != 0 {
            return Err(IdentityError::Format(format!(
                "status list size must be a positive multiple of 8, got {size}"
            )));
        }
        Ok(Self {
            issuer,
            purpose,
            bits: vec![0u8; size / 8],
            allocated: vec![0u8; size / 8],
        })
    }

    /// Rebuild a list from its published encoding. Nothing is marked
    /// allocated.
    pub fn from_encoded(issuer: Did, purpose: StatusPurpose, encoded: &str) -> Result<Self> {
        let bits = decode_bits(encoded)?;
        if bits.is_empty() {
            return Err(IdentityError::Format("status list is empty".into()));
        }
        let allocated = vec![0u8; bits.len()];
        Ok(Self {
            issuer,
            purpose,
            bits,
            allocated,
        })
    }

    pub fn issuer(&self) -> &Did {
        &self.issuer
    }

    pub fn purpose(&self) -> StatusPurpose {
        self.purpose
    }

    /// Capacity in bits.
    pub fn size(&self) -> usize {
        self.bits.len() * 8
    }

    pub fn set_bit(&mut self, index: u64) -> Result<()> {
        let (byte, mask) = self.locate(index)?;
        self.bits[byte] |= mask;
        Ok(())
    }

    pub fn clear_bit(&mut self, index: u64) -> Result<()> {
        let (byte, mask) = self.locate(index)?;
        self.bits[byte] &= !mask;
        Ok(())
    }

    pub fn get_bit(&self, index: u64) -> Result<bool> {
        let (byte, mask) = self.locate(index)?;
        Ok(self.bits[byte] & mask != 0)
    }

    pub fn is_allocated(&self, index: u64) -> Result<bool> {
        let (byte, mask) = self.locate(index)?;
        Ok(self.allocated[byte] & mask != 0)
    }

    /// First index that is neither allocated nor set.
    ///
    /// # Errors
    ///
    /// `Policy("status list exhausted")` when every index is taken. Lists
    /// never roll over.
    pub fn next_available_index(&self) -> Result<u64> {
        for (byte, (bits, allocated)) in self.bits.iter().zip(&self.allocated).enumerate() {
            let taken = bits | allocated;
            if taken != 0xff {
                let bit = taken.leading_ones() as usize;
                return Ok((byte * 8 + bit) as u64);
            }
        }
        Err(IdentityError::Policy("status list exhausted".into()))
    }

    /// Reserve the next available index.
    pub fn allocate(&mut self) -> Result<u64> {
        let index = self.next_available_index()?;
        let (byte, mask) = self.locate(index)?;
        self.allocated[byte] |= mask;
        Ok(index)
    }

    /// Published encoding of the status bits.
    pub fn encode(&self) -> Result<String> {
        encode_bits(&self.bits)
    }

    fn locate(&self, index: u64) -> Result<(usize, u8)> {
        let size = self.size();
        let i = usize::try_from(index)
            .ok()
            .filter(|i| *i < size)
            .ok_or_else(|| {
                IdentityError::Format(format!(
                    "status list index {index} out of range (size {size})"
                ))
            })?;
        Ok((i / 8, 0x80 >> (i % 8)))
    }
}

fn encode_bits(bits: &[u8]) -> Result<String> {
    let compressed = zstd::encode_all(bits, COMPRESSION_LEVEL)
        .map_err(|e| IdentityError::Compression(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Reverse of [`StatusList::encode`]: the raw bit buffer.
pub fn decode_bits(encoded: &str) -> Result<Vec<u8>> {
    let compressed = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| IdentityError::Format(format!("invalid status list encoding: {e}")))?;
    zstd::decode_all(compressed.as_slice()).map_err(|e| IdentityError::Compression(e.to_string()))
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusListFile {
    issuer: Did,
    purpose: StatusPurpose,
    size: usize,
    encoded_list: String,
    encoded_allocations: String,
    updated_at: u64,
}

impl StatusListFile {
    fn from_list(list: &StatusList) -> Result<Self> {
        Ok(Self {
            issuer: list.issuer.clone(),
            purpose: list.purpose,
            size: list.size(),
            encoded_list: list.encode()?,
            encoded_allocations: encode_bits(&list.allocated)?,
            updated_at: crate::time::now_micros(),
        })
    }

    fn into_list(self) -> Result<StatusList> {
        let bits = decode_bits(&self.encoded_list)?;
        let allocated = decode_bits(&self.encoded_allocations)?;
        if bits.len() * 8 != self.size || allocated.len() != bits.len() {
            return Err(IdentityError::InvalidFileFormat(format!(
                "status list for {} has inconsistent size",
                self.issuer
            )));
        }
        Ok(StatusList {
            issuer: self.issuer,
            purpose: self.purpose,
            bits,
            allocated,
        })
    }
}

/// Exclusive advisory lock on a status list's sibling `.lock` file,
/// released on drop.
struct ListLock {
    file: File,
}

impl ListLock {
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for ListLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Status lists persisted under `status-lists/` in a keystore directory.
///
/// Mutations load, change and save the list while holding an exclusive
/// lock, so cooperating processes never hand out the same index twice.
pub struct StatusListStore<'a> {
    keystore: &'a Keystore,
}

impl<'a> StatusListStore<'a> {
    pub fn new(keystore: &'a Keystore) -> Self {
        Self { keystore }
    }

    /// Load a list, or a fresh one sized from the keystore config if none
    /// has been saved yet.
    pub fn load(&self, issuer: &Did, purpose: StatusPurpose) -> Result<StatusList> {
        match storage::read_json::<StatusListFile>(&self.path(issuer, purpose))? {
            Some(file) => file.into_list(),
            None => StatusList::new(
                issuer.clone(),
                purpose,
                self.keystore.config().status_list_size,
            ),
        }
    }

    /// Allocate and persist the next free index as one locked step.
    pub fn allocate_index(&self, issuer: &Did, purpose: StatusPurpose) -> Result<u64> {
        let index = self.update(issuer, purpose, StatusList::allocate)?;
        log::debug!("allocated {purpose} index {index} for {issuer}");
        Ok(index)
    }

    /// Allocate an index and return the `credentialStatus` entry pointing
    /// at it.
    pub fn allocate_entry(&self, issuer: &Did, purpose: StatusPurpose) -> Result<CredentialStatus> {
        let index = self.allocate_index(issuer, purpose)?;
        Ok(CredentialStatus::new(issuer, purpose, index))
    }

    /// Set (`true`) or clear (`false`) one status bit.
    pub fn set_status(
        &self,
        issuer: &Did,
        purpose: StatusPurpose,
        index: u64,
        flagged: bool,
    ) -> Result<()> {
        self.update(issuer, purpose, |list| {
            if flagged {
                list.set_bit(index)
            } else {
                list.clear_bit(index)
            }
        })?;
        log::info!(
            "{} {purpose} bit {index} for {issuer}",
            if flagged { "set" } else { "cleared" }
        );
        Ok(())
    }

    pub fn get_status(&self, issuer: &Did, purpose: StatusPurpose, index: u64) -> Result<bool> {
        self.load(issuer, purpose)?.get_bit(index)
    }

    fn update<T>(
        &self,
        issuer: &Did,
        purpose: StatusPurpose,
        change: impl FnOnce(&mut StatusList) -> Result<T>,
    ) -> Result<T> {
        self.keystore.ensure_writable()?;
        require_issuer(self.keystore, issuer)?;

        let path = self.path(issuer, purpose);
        let _lock = ListLock::acquire(&path.with_extension("lock"))?;
        let mut list = self.load(issuer, purpose)?;
        let out = change(&mut list)?;
        storage::write_json(&path, &StatusListFile::from_list(&list)?)?;
        Ok(out)
    }

    fn path(&self, issuer: &Did, purpose: StatusPurpose) -> PathBuf {
        self.keystore.root().join(STATUS_LISTS_DIR).join(format!(
            "{}.{purpose}.json",
            storage::sanitize_file_name(issuer.as_str())
        ))
    }
}
