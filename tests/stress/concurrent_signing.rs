//! Stress test: high-volume credential issuance, concurrent verification,
//! and concurrent status-list allocation against one keystore directory.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use agentic_did::auth::{self, ChallengeExpectations, ChallengeOptions};
use agentic_did::credential::{self, sign_credential, VerifyOptions};
use agentic_did::{
    IdentityRole, KeyMaterial, KeyProtection, Keystore, KeystoreConfig, StatusListStore,
    StatusPurpose,
};

#[test]
fn stress_1000_sequential_credentials() {
    let owner = KeyMaterial::generate();
    let agent = KeyMaterial::generate();
    let now = agentic_did::time::now_secs();

    let mut tokens = Vec::with_capacity(1000);
    let mut seen_ids = HashSet::new();
    for i in 0..1000 {
        let payload = credential::capability_credential(
            &owner.did(),
            &agent.did(),
            [format!("scope:{i}")],
        )
        .to_payload(now);
        let token = sign_credential(&owner, &payload).expect("signing should succeed");
        assert!(
            seen_ids.insert(payload.jti.clone()),
            "Duplicate credential id at iteration {i}: {}",
            payload.jti
        );
        tokens.push(token);
    }

    let options = VerifyOptions::new().trusted_issuers([owner.did().0]);
    for (i, token) in tokens.iter().enumerate() {
        let result = credential::verify(token, &options);
        assert!(result.valid, "Credential {i} should be valid: {:?}", result.reason);
    }
}

#[test]
fn stress_concurrent_verification() {
    let owner = Arc::new(KeyMaterial::generate());
    let agent = KeyMaterial::generate();
    let payload = credential::ownership_credential(&owner.did(), &agent.did())
        .expires_in(600)
        .to_payload(agentic_did::time::now_secs());
    let token = Arc::new(sign_credential(&owner, &payload).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let token = Arc::clone(&token);
            let owner = Arc::clone(&owner);
            thread::spawn(move || {
                let options = VerifyOptions::new().trusted_issuers([owner.did().0]);
                (0..200).all(|_| credential::verify(&token, &options).valid)
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap(), "every concurrent verification should pass");
    }
}

#[test]
fn stress_concurrent_challenges() {
    let key = Arc::new(KeyMaterial::generate());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let key = Arc::clone(&key);
            thread::spawn(move || {
                for i in 0..50 {
                    let nonce = auth::generate_nonce();
                    let payload = auth::create_payload(
                        &key.did(),
                        &nonce,
                        &ChallengeOptions::default().with_domain(format!("t{t}.example")),
                    );
                    let signed = auth::sign_challenge_with_key(&key, &payload).unwrap();
                    let result = auth::verify_challenge(
                        key.did().as_str(),
                        &signed.encoded_payload,
                        &signed.signature,
                        &ChallengeExpectations::nonce(&nonce)
                            .with_domain(format!("t{t}.example")),
                    );
                    assert!(result.valid, "thread {t} challenge {i}: {:?}", result.reason);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn stress_concurrent_status_allocation_is_unique() {
    let dir = tempfile::tempdir().unwrap();
    let issuer = {
        let ks = Keystore::create_with_config(
            dir.path(),
            KeyProtection::Plaintext,
            KeystoreConfig::for_testing(),
        )
        .unwrap();
        ks.create_identity(IdentityRole::Owner, "issuer", None)
            .unwrap()
            .did
    };
    let root = dir.path().to_path_buf();

    // Each thread opens its own keystore handle, as separate processes would.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let root = root.clone();
            let issuer = issuer.clone();
            thread::spawn(move || {
                let ks = Keystore::create_with_config(
                    root,
                    KeyProtection::Plaintext,
                    KeystoreConfig::for_testing(),
                )
                .unwrap();
                let store = StatusListStore::new(&ks);
                (0..25)
                    .map(|_| {
                        store
                            .allocate_index(&issuer, StatusPurpose::Revocation)
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for h in handles {
        for index in h.join().unwrap() {
            assert!(all.insert(index), "index {index} handed out twice");
        }
    }
    assert_eq!(all.len(), 100);
    assert_eq!(all.iter().max(), Some(&99));
}
