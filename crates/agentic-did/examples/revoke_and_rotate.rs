//! Revoke and Rotate — revoke credentials through the registry and a
//! published status list, then rotate an agent's key.
//!
//! Run with:
//!   cargo run --example revoke_and_rotate -p agentic-did

use agentic_did::credential;
use agentic_did::revocation::{self, RevocationRegistry, StatusListStore};
use agentic_did::{
    IdentityRole, KeyProtection, Keystore, KeystoreConfig, RotationManager, StatusPurpose,
};

fn main() {
    let dir = tempfile::tempdir().expect("temp dir");
    let ks = Keystore::create_with_config(
        dir.path(),
        KeyProtection::Plaintext,
        KeystoreConfig::for_testing(),
    )
    .expect("keystore should open");

    let owner = ks
        .create_identity(IdentityRole::Owner, "alice", None)
        .expect("owner");
    let agent = ks
        .create_identity(IdentityRole::Agent, "worker", Some(&owner.did))
        .expect("agent");

    // ── 1. Registry revocation ──────────────────────────────────────────────
    let token = credential::issue(
        &ks,
        &credential::capability_credential(&owner.did, &agent.did, ["read"]),
    )
    .expect("issue");
    let id = credential::credential_id(&token).expect("well-formed token");

    let registry = RevocationRegistry::new(&ks);
    registry
        .revoke_token(&token, Some("scope no longer needed"))
        .expect("revoke");
    println!("{id} revoked: {}", registry.is_revoked(&owner.did, &id).expect("status"));
    println!();

    // ── 2. Status-list revocation ───────────────────────────────────────────
    //
    // The credential carries a pointer to one bit. A relying party fetches the
    // published list once and checks any number of credentials against it.
    let store = StatusListStore::new(&ks);
    let entry = store
        .allocate_entry(&owner.did, StatusPurpose::Revocation)
        .expect("allocate");
    credential::issue(
        &ks,
        &credential::capability_credential(&owner.did, &agent.did, ["write"])
            .with_status(entry.clone()),
    )
    .expect("issue");

    store
        .set_status(&owner.did, StatusPurpose::Revocation, entry.status_list_index, true)
        .expect("set bit");
    let published =
        revocation::issue_status_list_credential(&ks, &owner.did, StatusPurpose::Revocation)
            .expect("publish");
    println!(
        "Status list published ({} bytes); index {} revoked: {}",
        published.len(),
        entry.status_list_index,
        revocation::check_credential_status(&entry, &published).expect("check")
    );
    println!();

    // ── 3. Rotation ─────────────────────────────────────────────────────────
    let rm = RotationManager::new(&ks);
    let record = rm
        .rotate_key(agent.did.as_str(), Some("quarterly rotation"))
        .expect("rotate");
    println!("Rotated {}", record.old_did);
    println!("     -> {}", record.new_did);
    println!(
        "Current DID for the original: {}",
        rm.get_current_did(agent.did.as_str()).expect("current")
    );
}
