//! File-backed storage primitives shared by the keystore and the ledgers.
//!
//! # Directory layout
//!
//! ```text
//! {keystore_root}/
//! ├── identities.json                    identity index
//! ├── keys/{sanitized-did}.json          one key record per identity
//! ├── credentials/{sanitized-id}.json    opaque credential blobs
//! ├── rotations.json                     rotation ledger
//! ├── revocations/{sanitized-did}.json   per-issuer revocation list
//! └── status-lists/{sanitized-did}.{purpose}.json
//! ```
//!
//! Every JSON document is written with [`write_atomic`].

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{IdentityError, Result};

pub const INDEX_FILE: &str = "identities.json";
pub const KEYS_DIR: &str = "keys";
pub const CREDENTIALS_DIR: &str = "credentials";
pub const ROTATION_LEDGER_FILE: &str = "rotations.json";
pub const REVOCATIONS_DIR: &str = "revocations";
pub const STATUS_LISTS_DIR: &str = "status-lists";

/// Map an identifier to a safe file stem.
///
/// `did:key:z6Mk...` becomes `did_key_z6Mk...`. Anything outside
/// `[A-Za-z0-9._-]` is replaced by `_`.
pub fn sanitize_file_name(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write `data` to `path` atomically using a sibling temporary file.
///
/// Creates the parent directory if it does not exist. The temp file is
/// created owner-only (`0o600`) on unix, then renamed into place, so a
/// crash can leave at most a stale temp file, never a half-written target.
/// On any failure the temp file is removed.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| IdentityError::StorageError(format!("invalid path: {}", path.display())))?;
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    let result = write_private(&tmp_path, data).and_then(|()| {
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

/// Read a JSON document, returning `None` if the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        IdentityError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
