//! File-backed keystore: identity index, key records, credential blobs.
//!
//! A keystore instance is bound to one directory and one
//! [`KeyProtection`] mode. Instances with different modes can point at the
//! same directory; each key record declares its own mode, so encrypted and
//! plaintext identities coexist.
//!
//! There is no locking around the identity index. Two writers against the
//! same directory can race and lose an update; only individual files are
//! replaced atomically.

pub mod key_record;
pub mod passphrase;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::{KeystoreConfig, ResolvedPassphrase};
use crate::did::Did;
use crate::error::{IdentityError, Result};
use crate::identity::{Identity, IdentityRole, KeyMaterial};
use crate::storage::{self, CREDENTIALS_DIR, INDEX_FILE, KEYS_DIR};

pub use key_record::{CipherDescriptor, EncryptedKeyRecord, KdfDescriptor};
pub use passphrase::{estimate_entropy_bits, validate_passphrase};

const INDEX_VERSION: u32 = 1;

/// How private keys written by this instance are protected.
pub enum KeyProtection {
    /// Encrypt with a key derived from this passphrase.
    Encrypted(Zeroizing<String>),
    /// Store private keys in clear. Must be chosen explicitly.
    Plaintext,
}

impl KeyProtection {
    pub fn encrypted(passphrase: impl Into<String>) -> Self {
        Self::Encrypted(Zeroizing::new(passphrase.into()))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    fn passphrase(&self) -> Option<&str> {
        match self {
            Self::Encrypted(p) => Some(p.as_str()),
            Self::Plaintext => None,
        }
    }
}

impl From<ResolvedPassphrase> for KeyProtection {
    fn from(resolved: ResolvedPassphrase) -> Self {
        Self::Encrypted(resolved.value)
    }
}

impl std::fmt::Debug for KeyProtection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encrypted(_) => f.write_str("Encrypted(<redacted>)"),
            Self::Plaintext => f.write_str("Plaintext"),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IdentityIndex {
    version: u32,
    identities: Vec<Identity>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    id: String,
    credential: serde_json::Value,
}

/// Result of [`Keystore::check_integrity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    /// Index entries whose key file is missing (interrupted store).
    pub dangling: Vec<Did>,
    /// Key files with no index entry.
    pub orphaned_key_files: Vec<PathBuf>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.orphaned_key_files.is_empty()
    }
}

/// Filesystem-backed keystore.
#[derive(Debug)]
pub struct Keystore {
    root: PathBuf,
    protection: KeyProtection,
    config: KeystoreConfig,
    writable: bool,
}

impl Keystore {
    /// Open a keystore read-only. The passphrase is not strength-checked.
    pub fn open(root: impl Into<PathBuf>, protection: KeyProtection) -> Result<Self> {
        Self::open_with_config(root, protection, KeystoreConfig::default())
    }

    pub fn open_with_config(
        root: impl Into<PathBuf>,
        protection: KeyProtection,
        config: KeystoreConfig,
    ) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            protection,
            config,
            writable: false,
        })
    }

    /// Open (creating the directory if needed) a keystore for write
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::WeakPassphrase` if an encrypted-mode
    /// passphrase fails [`validate_passphrase`].
    pub fn create(root: impl Into<PathBuf>, protection: KeyProtection) -> Result<Self> {
        Self::create_with_config(root, protection, KeystoreConfig::default())
    }

    pub fn create_with_config(
        root: impl Into<PathBuf>,
        protection: KeyProtection,
        config: KeystoreConfig,
    ) -> Result<Self> {
        if let Some(p) = protection.passphrase() {
            validate_passphrase(p)?;
        }
        let root = root.into();
        std::fs::create_dir_all(root.join(KEYS_DIR))?;
        std::fs::create_dir_all(root.join(CREDENTIALS_DIR))?;
        log::debug!("keystore opened for writing at {}", root.display());
        Ok(Self {
            root,
            protection,
            config,
            writable: true,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &KeystoreConfig {
        &self.config
    }

    pub fn protection(&self) -> &KeyProtection {
        &self.protection
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(IdentityError::Policy(
                "keystore was opened read-only; use Keystore::create for writes".into(),
            ))
        }
    }

    // ── Identities ────────────────────────────────────────────────────────────

    /// Generate key material and store a new identity.
    ///
    /// Agents must name an owner identity present in this keystore; owners
    /// must not name one.
    pub fn create_identity(
        &self,
        role: IdentityRole,
        name: &str,
        owner: Option<&Did>,
    ) -> Result<Identity> {
        let key = KeyMaterial::generate();
        let identity = match (role, owner) {
            (IdentityRole::Owner, None) => Identity::owner(key.did(), name),
            (IdentityRole::Agent, Some(owner)) => {
                let owner_identity = self.require_identity(owner.as_str())?;
                if owner_identity.role != IdentityRole::Owner {
                    return Err(IdentityError::Policy(format!(
                        "{owner} is not an owner identity"
                    )));
                }
                Identity::agent(key.did(), name, owner.clone())
            }
            (IdentityRole::Owner, Some(_)) => {
                return Err(IdentityError::Policy(
                    "owner identities cannot have an owner".into(),
                ))
            }
            (IdentityRole::Agent, None) => {
                return Err(IdentityError::Policy(
                    "agent identities require an owner".into(),
                ))
            }
        };
        self.store_identity(&identity, &key)?;
        log::info!("created {} identity {}", role.as_str(), identity.did);
        Ok(identity)
    }

    /// Persist identity metadata and its key material.
    ///
    /// The index is written first, then the key record. A crash between
    /// the two leaves an index entry without a key file, which
    /// [`Self::check_integrity`] reports, rather than an untracked key file.
    pub fn store_identity(&self, identity: &Identity, key: &KeyMaterial) -> Result<()> {
        self.ensure_writable()?;
        identity.check_role()?;
        if identity.did != key.did() {
            return Err(IdentityError::Policy(format!(
                "identity {} does not match key material {}",
                identity.did,
                key.did()
            )));
        }

        let mut index = self.read_index()?;
        match index.identities.iter_mut().find(|i| i.did == identity.did) {
            Some(existing) => *existing = identity.clone(),
            None => index.identities.push(identity.clone()),
        }
        self.write_index(&mut index)?;

        let record = match self.protection.passphrase() {
            Some(p) => EncryptedKeyRecord::seal(key, p, &self.config.kdf)?,
            None => EncryptedKeyRecord::plaintext(key),
        };
        storage::write_json(&self.key_path(identity.did.as_str()), &record)?;
        log::debug!(
            "stored key for {} ({})",
            identity.did,
            if record.is_encrypted() { "encrypted" } else { "plaintext" }
        );
        Ok(())
    }

    pub fn get_identity(&self, did: &str) -> Result<Option<Identity>> {
        Ok(self
            .read_index()?
            .identities
            .into_iter()
            .find(|i| i.did.as_str() == did))
    }

    /// Like [`Self::get_identity`] but missing identities are an error.
    pub fn require_identity(&self, did: &str) -> Result<Identity> {
        self.get_identity(did)?
            .ok_or_else(|| IdentityError::NotFound(format!("identity not found: {did}")))
    }

    /// All identities in insertion order.
    pub fn list_identities(&self) -> Result<Vec<Identity>> {
        Ok(self.read_index()?.identities)
    }

    pub fn get_agents_for_owner(&self, owner_did: &str) -> Result<Vec<Identity>> {
        Ok(self
            .read_index()?
            .identities
            .into_iter()
            .filter(|i| i.owner_did.as_ref().is_some_and(|o| o.as_str() == owner_did))
            .collect())
    }

    /// Remove an identity and its key file. Returns `false` if the identity
    /// was not in the index. A missing key file is tolerated.
    pub fn delete_identity(&self, did: &str) -> Result<bool> {
        self.ensure_writable()?;
        let mut index = self.read_index()?;
        let before = index.identities.len();
        index.identities.retain(|i| i.did.as_str() != did);
        if index.identities.len() == before {
            return Ok(false);
        }
        self.write_index(&mut index)?;

        if let Err(e) = storage::remove_if_exists(&self.key_path(did)) {
            log::warn!("could not remove key file for {did}: {e}");
        }
        log::info!("deleted identity {did}");
        Ok(true)
    }

    /// Decrypt (or read) the key material for an identity.
    ///
    /// # Errors
    ///
    /// `NotFound` if no key record exists, `Authentication` for any
    /// decryption failure, `Policy` if the record is encrypted but this
    /// instance has no passphrase.
    pub fn load_key_material(&self, did: &str) -> Result<KeyMaterial> {
        self.read_key_record(did)?.open(self.protection.passphrase())
    }

    /// Whether the identity's key record is encrypted. Needs no passphrase.
    pub fn is_encrypted(&self, did: &str) -> Result<bool> {
        Ok(self.read_key_record(did)?.is_encrypted())
    }

    /// Report index entries without key files and key files without index
    /// entries.
    pub fn check_integrity(&self) -> Result<IntegrityReport> {
        let index = self.read_index()?;
        let mut report = IntegrityReport::default();

        for identity in &index.identities {
            if !self.key_path(identity.did.as_str()).exists() {
                log::warn!("dangling index entry without key file: {}", identity.did);
                report.dangling.push(identity.did.clone());
            }
        }

        let keys_dir = self.root.join(KEYS_DIR);
        if keys_dir.exists() {
            let known: std::collections::HashSet<PathBuf> = index
                .identities
                .iter()
                .map(|i| self.key_path(i.did.as_str()))
                .collect();
            for entry in std::fs::read_dir(&keys_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "json") && !known.contains(&path) {
                    report.orphaned_key_files.push(path);
                }
            }
        }
        report.orphaned_key_files.sort();
        Ok(report)
    }

    // ── Credentials ───────────────────────────────────────────────────────────

    /// Store an opaque credential document under a caller-chosen id.
    pub fn store_credential(&self, id: &str, credential: &serde_json::Value) -> Result<()> {
        self.ensure_writable()?;
        let file = CredentialFile {
            id: id.to_string(),
            credential: credential.clone(),
        };
        storage::write_json(&self.credential_path(id), &file)
    }

    pub fn load_credential(&self, id: &str) -> Result<serde_json::Value> {
        match storage::read_json::<CredentialFile>(&self.credential_path(id))? {
            Some(file) if file.id == id => Ok(file.credential),
            _ => Err(IdentityError::NotFound(format!("credential not found: {id}"))),
        }
    }

    /// Ids of all stored credentials, sorted.
    pub fn list_credentials(&self) -> Result<Vec<String>> {
        let dir = self.root.join(CREDENTIALS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(file) = storage::read_json::<CredentialFile>(&path)? {
                    ids.push(file.id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn delete_credential(&self, id: &str) -> Result<bool> {
        self.ensure_writable()?;
        storage::remove_if_exists(&self.credential_path(id))
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn read_index(&self) -> Result<IdentityIndex> {
        Ok(storage::read_json(&self.root.join(INDEX_FILE))?.unwrap_or_default())
    }

    fn write_index(&self, index: &mut IdentityIndex) -> Result<()> {
        index.version = INDEX_VERSION;
        storage::write_json(&self.root.join(INDEX_FILE), index)
    }

    fn read_key_record(&self, did: &str) -> Result<EncryptedKeyRecord> {
        storage::read_json(&self.key_path(did))?
            .ok_or_else(|| IdentityError::NotFound(format!("key file not found for {did}")))
    }

    fn key_path(&self, did: &str) -> PathBuf {
        self.root
            .join(KEYS_DIR)
            .join(format!("{}.json", storage::sanitize_file_name(did)))
    }

    /// Credential ids are arbitrary strings, so the file stem is the blake3
    /// hash of the id rather than a sanitized form of it.
    fn credential_path(&self, id: &str) -> PathBuf {
        self.root
            .join(CREDENTIALS_DIR)
            .join(format!("{}.json", blake3::hash(id.as_bytes()).to_hex()))
    }
}
