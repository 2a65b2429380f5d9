//! Stress test: long rotation chains resolve from any point and stop at the
//! hop limit.

use agentic_did::rotation::MAX_ROTATION_HOPS;
use agentic_did::{
    Did, IdentityError, IdentityRole, KeyProtection, Keystore, KeystoreConfig, RotationManager,
};

fn keystore(dir: &std::path::Path) -> Keystore {
    Keystore::create_with_config(dir, KeyProtection::Plaintext, KeystoreConfig::for_testing())
        .expect("keystore should open")
}

fn build_chain(ks: &Keystore, links: usize) -> Vec<Did> {
    let rm = RotationManager::new(ks);
    let first = ks.create_identity(IdentityRole::Owner, "rotating", None).unwrap();
    let mut dids = vec![first.did];
    for i in 0..links {
        let current = dids.last().unwrap().clone();
        let record = rm
            .rotate_key(current.as_str(), Some(&format!("rotation {i}")))
            .expect("rotation should succeed");
        dids.push(record.new_did);
    }
    dids
}

#[test]
fn stress_chain_of_32_resolves_from_every_link() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());
    let dids = build_chain(&ks, 32);
    let rm = RotationManager::new(&ks);
    let head = dids.last().unwrap();

    for (i, did) in dids.iter().enumerate() {
        assert_eq!(
            &rm.get_current_did(did.as_str()).unwrap(),
            head,
            "link {i} should resolve to the head"
        );
        assert_eq!(rm.rotation_history(did.as_str()).unwrap().len(), 32);
        assert_eq!(rm.is_deprecated(did.as_str()).unwrap(), did != head);
    }

    // History is ordered oldest first and contiguous.
    let history = rm.rotation_history(head.as_str()).unwrap();
    for (i, pair) in history.windows(2).enumerate() {
        assert_eq!(pair[0].new_did, pair[1].old_did, "gap after record {i}");
    }
    assert_eq!(history[0].old_did, dids[0]);
}

#[test]
fn stress_chain_stops_at_hop_limit() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());
    let dids = build_chain(&ks, MAX_ROTATION_HOPS);
    let rm = RotationManager::new(&ks);
    let head = dids.last().unwrap();

    assert_eq!(&rm.get_current_did(dids[0].as_str()).unwrap(), head);
    assert!(matches!(
        rm.rotate_key(head.as_str(), None),
        Err(IdentityError::Policy(_))
    ));
    assert_eq!(rm.ledger().unwrap().len(), MAX_ROTATION_HOPS);
}

#[test]
fn stress_many_independent_chains() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());
    let rm = RotationManager::new(&ks);

    let mut heads = Vec::new();
    for i in 0..20 {
        let id = ks
            .create_identity(IdentityRole::Owner, &format!("o{i}"), None)
            .unwrap();
        let r1 = rm.rotate_key(id.did.as_str(), None).unwrap();
        let r2 = rm.rotate_key(r1.new_did.as_str(), None).unwrap();
        heads.push((id.did, r2.new_did));
    }

    for (origin, head) in &heads {
        assert_eq!(&rm.get_current_did(origin.as_str()).unwrap(), head);
        assert_eq!(rm.rotation_history(origin.as_str()).unwrap().len(), 2);
    }
    assert_eq!(rm.ledger().unwrap().len(), 40);
}
