//! Integration test: keystore protection modes and on-disk behavior.

use agentic_did::keystore::key_record::EncryptedKeyRecord;
use agentic_did::storage::{INDEX_FILE, KEYS_DIR};
use agentic_did::{
    IdentityError, IdentityRole, KeyProtection, Keystore, KeystoreConfig, RotationManager,
};

const PASSPHRASE: &str = "correct-Horse-battery-9staple";

fn encrypted(dir: &std::path::Path, passphrase: &str) -> agentic_did::Result<Keystore> {
    Keystore::create_with_config(
        dir,
        KeyProtection::encrypted(passphrase),
        KeystoreConfig::for_testing(),
    )
}

fn reader(dir: &std::path::Path, protection: KeyProtection) -> Keystore {
    Keystore::open_with_config(dir, protection, KeystoreConfig::for_testing()).unwrap()
}

fn only_key_file(dir: &std::path::Path) -> std::path::PathBuf {
    let mut files: Vec<_> = std::fs::read_dir(dir.join(KEYS_DIR))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1, "expected exactly one key file");
    files.remove(0)
}

#[test]
fn encrypted_keys_never_hit_disk_in_clear() {
    let dir = tempfile::tempdir().unwrap();
    let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
    let id = ks.create_identity(IdentityRole::Owner, "alice", None).unwrap();
    let key = ks.load_key_material(id.did.as_str()).unwrap();

    let raw = std::fs::read_to_string(only_key_file(dir.path())).unwrap();
    let record: EncryptedKeyRecord = serde_json::from_str(&raw).unwrap();
    assert!(record.is_encrypted());

    use base64::Engine;
    let clear = base64::engine::general_purpose::STANDARD.encode(key.private_key());
    assert!(!raw.contains(&clear), "private key must not be stored in clear");
    assert!(ks.is_encrypted(id.did.as_str()).unwrap());
}

#[test]
fn wrong_passphrase_is_an_authentication_error() {
    let dir = tempfile::tempdir().unwrap();
    let did = {
        let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
        ks.create_identity(IdentityRole::Owner, "alice", None)
            .unwrap()
            .did
    };

    let ks = reader(
        dir.path(),
        KeyProtection::encrypted("Totally-wrong-passphrase-42"),
    );
    assert!(matches!(
        ks.load_key_material(did.as_str()),
        Err(IdentityError::Authentication)
    ));

    // Identity metadata stays readable without the key.
    assert_eq!(ks.list_identities().unwrap().len(), 1);
}

#[test]
fn encrypted_key_without_passphrase_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let did = {
        let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
        ks.create_identity(IdentityRole::Owner, "alice", None)
            .unwrap()
            .did
    };

    let ks = reader(dir.path(), KeyProtection::Plaintext);
    assert!(matches!(
        ks.load_key_material(did.as_str()),
        Err(IdentityError::Policy(_))
    ));
}

#[test]
fn weak_passphrase_rejected_on_create_only() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        encrypted(dir.path(), "short"),
        Err(IdentityError::WeakPassphrase(_))
    ));
    assert!(matches!(
        encrypted(dir.path(), "aaaaaaaaaaaaaaaaaaaa"),
        Err(IdentityError::WeakPassphrase(_))
    ));

    // Reading never checks strength.
    let ks = reader(dir.path(), KeyProtection::encrypted("short"));
    assert!(ks.list_identities().unwrap().is_empty());
}

#[test]
fn read_only_keystore_refuses_writes() {
    let dir = tempfile::tempdir().unwrap();
    let did = {
        let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
        ks.create_identity(IdentityRole::Owner, "alice", None)
            .unwrap()
            .did
    };

    let ks = reader(dir.path(), KeyProtection::encrypted(PASSPHRASE));
    assert!(!ks.is_writable());
    assert!(matches!(
        ks.create_identity(IdentityRole::Owner, "bob", None),
        Err(IdentityError::Policy(_))
    ));
    assert!(matches!(
        RotationManager::new(&ks).rotate_key(did.as_str(), None),
        Err(IdentityError::Policy(_))
    ));
    // Signing with an existing key is still allowed.
    assert!(ks.load_key_material(did.as_str()).is_ok());
}

#[test]
fn plaintext_and_encrypted_records_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let plain_did = {
        let ks = Keystore::create_with_config(
            dir.path(),
            KeyProtection::Plaintext,
            KeystoreConfig::for_testing(),
        )
        .unwrap();
        ks.create_identity(IdentityRole::Owner, "plain", None)
            .unwrap()
            .did
    };
    let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
    let sealed = ks.create_identity(IdentityRole::Owner, "sealed", None).unwrap();

    assert!(!ks.is_encrypted(plain_did.as_str()).unwrap());
    assert!(ks.is_encrypted(sealed.did.as_str()).unwrap());
    assert!(ks.load_key_material(plain_did.as_str()).is_ok());
    assert!(ks.load_key_material(sealed.did.as_str()).is_ok());
}

#[test]
fn integrity_check_finds_dangling_and_orphaned() {
    let dir = tempfile::tempdir().unwrap();
    let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
    let alice = ks.create_identity(IdentityRole::Owner, "alice", None).unwrap();
    assert!(ks.check_integrity().unwrap().is_clean());

    // Remove alice's key behind the keystore's back.
    std::fs::remove_file(only_key_file(dir.path())).unwrap();
    // Drop a stray key file in.
    std::fs::write(dir.path().join(KEYS_DIR).join("stray.json"), "{}").unwrap();

    let report = ks.check_integrity().unwrap();
    assert_eq!(report.dangling, vec![alice.did.clone()]);
    assert_eq!(report.orphaned_key_files.len(), 1);
    assert!(matches!(
        ks.load_key_material(alice.did.as_str()),
        Err(IdentityError::NotFound(_))
    ));
}

#[test]
fn corrupt_index_is_an_invalid_file_format() {
    let dir = tempfile::tempdir().unwrap();
    let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
    ks.create_identity(IdentityRole::Owner, "alice", None).unwrap();

    std::fs::write(dir.path().join(INDEX_FILE), "{ not json").unwrap();
    assert!(matches!(
        ks.list_identities(),
        Err(IdentityError::InvalidFileFormat(_))
    ));
}

#[test]
fn delete_removes_index_entry_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let ks = encrypted(dir.path(), PASSPHRASE).unwrap();
    let alice = ks.create_identity(IdentityRole::Owner, "alice", None).unwrap();

    assert!(ks.delete_identity(alice.did.as_str()).unwrap());
    assert!(!ks.delete_identity(alice.did.as_str()).unwrap());
    assert!(ks.get_identity(alice.did.as_str()).unwrap().is_none());
    assert_eq!(std::fs::read_dir(dir.path().join(KEYS_DIR)).unwrap().count(), 0);
}
