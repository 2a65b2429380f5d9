//! Edge case tests: identifier decoding, identity metadata, credential
//! claim boundaries, challenge timing.

use agentic_did::auth::{self, ChallengeExpectations, ChallengeOptions};
use agentic_did::credential::{self, sign_credential, VerifyOptions};
use agentic_did::did::{self, ED25519_MULTICODEC};
use agentic_did::{
    Did, DidDocument, ErrorKind, IdentityError, IdentityRole, KeyMaterial, KeyProtection,
    Keystore, KeystoreConfig,
};

fn keystore(dir: &std::path::Path) -> Keystore {
    Keystore::create_with_config(dir, KeyProtection::Plaintext, KeystoreConfig::for_testing())
        .unwrap()
}

fn did_from_tagged(bytes: &[u8]) -> String {
    format!("did:key:z{}", bs58::encode(bytes).into_string())
}

// === Identifier Edge Cases ===

#[test]
fn edge_did_shape() {
    let key = KeyMaterial::generate();
    let did = key.did();
    assert!(did.as_str().starts_with("did:key:z6Mk"));
    assert!(did.as_str().len() > 50);
    assert_eq!(did::decode(did.as_str()).unwrap(), *key.public_key());
}

#[test]
fn edge_did_wrong_scheme_or_method() {
    for bad in [
        "",
        "did",
        "did:key",
        "dib:key:z6Mk",
        "did:web:example.com",
        "did:KEY:z6Mk",
    ] {
        let err = did::decode(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "input {bad:?}");
    }
}

#[test]
fn edge_did_wrong_multibase() {
    let key = KeyMaterial::generate();
    let did = key.did();
    let no_marker = did.as_str().replacen(":z", ":m", 1);
    assert!(matches!(
        did::decode(&no_marker),
        Err(IdentityError::Format(_))
    ));

    // '0', 'O', 'I' and 'l' are not base58btc.
    assert!(matches!(
        did::decode("did:key:z0OIl"),
        Err(IdentityError::Format(_))
    ));
}

#[test]
fn edge_did_wrong_multicodec() {
    // secp256k1-pub multicodec 0xe7 0x01
    let mut tagged = vec![0xe7, 0x01];
    tagged.extend_from_slice(&[7u8; 33]);
    assert!(matches!(
        did::decode(&did_from_tagged(&tagged)),
        Err(IdentityError::UnsupportedKeyType(_))
    ));

    // Only one byte after the marker.
    assert!(matches!(
        did::decode(&did_from_tagged(&[0xed])),
        Err(IdentityError::UnsupportedKeyType(_))
    ));
}

#[test]
fn edge_did_wrong_key_length() {
    for len in [0usize, 31, 33, 64] {
        let mut tagged = ED25519_MULTICODEC.to_vec();
        tagged.extend(std::iter::repeat(1u8).take(len));
        match did::decode(&did_from_tagged(&tagged)) {
            Err(IdentityError::Length { expected, actual }) => {
                assert_eq!(expected, 32);
                assert_eq!(actual, len);
            }
            other => panic!("length {len}: expected Length error, got {other:?}"),
        }
    }
}

#[test]
fn edge_document_is_deterministic() {
    let did = KeyMaterial::generate().did();
    let a = DidDocument::resolve(&did).unwrap();
    let b = DidDocument::resolve(&Did::parse(did.as_str()).unwrap()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.verification_method.len(), 1);
    assert_eq!(a.authentication, vec![did.verification_method_id()]);
    assert_eq!(a.assertion_method, vec![did.verification_method_id()]);
}

// === Identity Edge Cases ===

#[test]
fn edge_identity_names_are_free_text() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());
    for name in ["", "with spaces", "ünïcødé 名前", "../../etc/passwd", "a\nb"] {
        let id = ks.create_identity(IdentityRole::Owner, name, None).unwrap();
        assert_eq!(ks.require_identity(id.did.as_str()).unwrap().name, name);
    }
    assert!(ks.check_integrity().unwrap().is_clean());
}

#[test]
fn edge_agent_owner_must_be_an_owner() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());
    let owner = ks.create_identity(IdentityRole::Owner, "o", None).unwrap();
    let agent = ks
        .create_identity(IdentityRole::Agent, "a", Some(&owner.did))
        .unwrap();

    assert!(matches!(
        ks.create_identity(IdentityRole::Agent, "sub", Some(&agent.did)),
        Err(IdentityError::Policy(_))
    ));

    let stranger = KeyMaterial::generate().did();
    assert!(matches!(
        ks.create_identity(IdentityRole::Agent, "x", Some(&stranger)),
        Err(IdentityError::NotFound(_))
    ));
}

#[test]
fn edge_lookup_of_unknown_did() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());
    assert!(ks.get_identity("did:key:z6MkUnknown").unwrap().is_none());
    assert_eq!(
        ks.require_identity("did:key:z6MkUnknown").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(ks.list_identities().unwrap().is_empty());
}

// === Credential Edge Cases ===

#[test]
fn edge_issue_for_foreign_issuer_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ks = keystore(dir.path());
    let subject = ks.create_identity(IdentityRole::Owner, "s", None).unwrap();
    let foreign = KeyMaterial::generate().did();

    assert!(matches!(
        credential::issue(
            &ks,
            &credential::ownership_credential(&foreign, &subject.did)
        ),
        Err(IdentityError::NotFound(_))
    ));

    // Signing a payload with the wrong key is refused before signing.
    let key = KeyMaterial::generate();
    let payload = credential::ownership_credential(&foreign, &subject.did)
        .to_payload(agentic_did::time::now_secs());
    assert!(matches!(
        sign_credential(&key, &payload),
        Err(IdentityError::Policy(_))
    ));
}

#[test]
fn edge_expiry_boundary() {
    let key = KeyMaterial::generate();
    let now = 1_700_000_000;
    let payload = credential::ownership_credential(&key.did(), &KeyMaterial::generate().did())
        .expires_at(now + 10)
        .to_payload(now);
    let token = sign_credential(&key, &payload).unwrap();
    let opts = VerifyOptions::new();

    assert!(credential::verify_at(&token, &opts, now + 9).valid);
    // Expiry is exclusive: at exactly `exp` the credential is expired.
    assert_eq!(
        credential::verify_at(&token, &opts, now + 10).reason.as_deref(),
        Some("Credential has expired")
    );
}

#[test]
fn edge_not_before_boundary() {
    let key = KeyMaterial::generate();
    let now = 1_700_000_000;
    let payload = credential::ownership_credential(&key.did(), &KeyMaterial::generate().did())
        .not_before(now + 60)
        .to_payload(now);
    let token = sign_credential(&key, &payload).unwrap();
    let opts = VerifyOptions::new();

    assert_eq!(
        credential::verify_at(&token, &opts, now).reason.as_deref(),
        Some("Credential is not yet valid")
    );
    assert!(credential::verify_at(&token, &opts, now + 60).valid);
}

#[test]
fn edge_empty_scopes_still_verify() {
    let key = KeyMaterial::generate();
    let payload = credential::capability_credential(
        &key.did(),
        &KeyMaterial::generate().did(),
        Vec::<String>::new(),
    )
    .to_payload(agentic_did::time::now_secs());
    let token = sign_credential(&key, &payload).unwrap();
    let result = credential::verify(&token, &VerifyOptions::new());
    assert!(result.valid);
    assert_eq!(
        result.payload.unwrap().claims().unwrap(),
        agentic_did::CredentialClaims::Capability { scopes: vec![] }
    );
}

#[test]
fn edge_untrusted_issuer() {
    let key = KeyMaterial::generate();
    let payload = credential::ownership_credential(&key.did(), &KeyMaterial::generate().did())
        .to_payload(agentic_did::time::now_secs());
    let token = sign_credential(&key, &payload).unwrap();

    let other = KeyMaterial::generate().did();
    let result = credential::verify(&token, &VerifyOptions::new().trusted_issuers([other.0]));
    assert!(!result.valid);
    // An empty allow-list trusts nobody.
    let result = credential::verify(
        &token,
        &VerifyOptions::new().trusted_issuers(Vec::<String>::new()),
    );
    assert!(!result.valid);
}

// === Challenge Edge Cases ===

#[test]
fn edge_challenge_expiry_boundary() {
    let key = KeyMaterial::generate();
    let nonce = auth::generate_nonce();
    assert_eq!(nonce.len(), 43);

    let issued = 1_700_000_000;
    let payload = auth::create_payload_at(
        &key.did(),
        &nonce,
        &ChallengeOptions::default().with_ttl(30),
        issued,
    );
    assert_eq!(payload.expires_at, issued + 30);
    let signed = auth::sign_challenge_with_key(&key, &payload).unwrap();
    let expect = ChallengeExpectations::nonce(&nonce);
    let check = |now| {
        auth::verify_challenge_at(
            key.did().as_str(),
            &signed.encoded_payload,
            &signed.signature,
            &expect,
            now,
        )
    };

    assert!(check(issued + 29).valid);
    assert_eq!(
        check(issued + 30).reason.as_deref(),
        Some("Challenge has expired")
    );
}

#[test]
fn edge_challenge_for_other_did() {
    let key = KeyMaterial::generate();
    let other = KeyMaterial::generate();
    let payload = auth::create_payload(&key.did(), "n", &ChallengeOptions::default());
    let signed = auth::sign_challenge_with_key(&key, &payload).unwrap();

    let result = auth::verify_challenge(
        other.did().as_str(),
        &signed.encoded_payload,
        &signed.signature,
        &ChallengeExpectations::default(),
    );
    assert_eq!(result.reason.as_deref(), Some("DID mismatch"));

    assert!(matches!(
        auth::sign_challenge_with_key(&other, &payload),
        Err(IdentityError::Policy(_))
    ));
}
