//! Stress test: many identities in one keystore, owner/agent queries and
//! rotation across them.

use std::collections::HashSet;

use agentic_did::{IdentityRole, KeyProtection, Keystore, KeystoreConfig, RotationManager};

fn keystore(dir: &std::path::Path) -> Keystore {
    Keystore::create_with_config(
        dir,
        KeyProtection::encrypted("correct-Horse-battery-9staple"),
        KeystoreConfig::for_testing(),
    )
    .expect("keystore should open")
}

#[test]
fn stress_three_identities_one_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());

    let owner = ks.create_identity(IdentityRole::Owner, "owner", None).unwrap();
    let a1 = ks
        .create_identity(IdentityRole::Agent, "agent-1", Some(&owner.did))
        .unwrap();
    let a2 = ks
        .create_identity(IdentityRole::Agent, "agent-2", Some(&owner.did))
        .unwrap();

    let rm = RotationManager::new(&ks);
    let record = rm.rotate_key(a1.did.as_str(), Some("routine")).unwrap();

    assert_eq!(rm.get_current_did(a1.did.as_str()).unwrap(), record.new_did);
    assert_eq!(rm.get_current_did(a2.did.as_str()).unwrap(), a2.did);

    let history = rm.rotation_history(a1.did.as_str()).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, agentic_did::RotationStatus::Completed);

    // Owner now has three agents on record: two originals plus the rotated one.
    let agents = ks.get_agents_for_owner(owner.did.as_str()).unwrap();
    assert_eq!(agents.len(), 3);
    assert_eq!(ks.list_identities().unwrap().len(), 4);
}

#[test]
fn stress_100_agents_unique_dids() {
    let dir = tempfile::tempdir().unwrap();
    let ks = Keystore::create_with_config(
        dir.path(),
        KeyProtection::Plaintext,
        KeystoreConfig::for_testing(),
    )
    .unwrap();

    let owner_a = ks.create_identity(IdentityRole::Owner, "a", None).unwrap();
    let owner_b = ks.create_identity(IdentityRole::Owner, "b", None).unwrap();

    let mut seen = HashSet::new();
    for i in 0..100 {
        let owner = if i % 4 == 0 { &owner_b } else { &owner_a };
        let agent = ks
            .create_identity(IdentityRole::Agent, &format!("agent-{i}"), Some(&owner.did))
            .expect("agent creation should succeed");
        assert!(
            seen.insert(agent.did.clone()),
            "Duplicate DID at iteration {i}: {}",
            agent.did
        );
    }

    assert_eq!(ks.list_identities().unwrap().len(), 102);
    assert_eq!(ks.get_agents_for_owner(owner_a.did.as_str()).unwrap().len(), 75);
    assert_eq!(ks.get_agents_for_owner(owner_b.did.as_str()).unwrap().len(), 25);
    assert!(ks.check_integrity().unwrap().is_clean());

    // Every stored key still opens.
    for identity in ks.list_identities().unwrap() {
        let key = ks.load_key_material(identity.did.as_str()).unwrap();
        assert_eq!(key.did(), identity.did);
    }
}

#[test]
fn stress_agent_requires_owner() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());

    assert!(ks.create_identity(IdentityRole::Agent, "orphan", None).is_err());

    let owner = ks.create_identity(IdentityRole::Owner, "o", None).unwrap();
    assert!(ks
        .create_identity(IdentityRole::Owner, "o2", Some(&owner.did))
        .is_err());
    assert_eq!(ks.list_identities().unwrap().len(), 1);
}
