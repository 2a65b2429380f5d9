//! Owner and Agent — create identities, issue credentials, verify offline,
//! authenticate by challenge-response.
//!
//! Run with:
//!   cargo run --example owner_agent -p agentic-did

use agentic_did::auth::{self, ChallengeExpectations, ChallengeOptions};
use agentic_did::credential::{self, VerifyOptions};
use agentic_did::{DidDocument, IdentityRole, KeyProtection, Keystore, KeystoreConfig};

fn main() {
    let dir = tempfile::tempdir().expect("temp dir");

    // ── 1. Open a keystore for writing ──────────────────────────────────────
    //
    // Keys are sealed with Argon2id + ChaCha20-Poly1305 under the passphrase.
    // The test KDF profile keeps the example fast.
    let ks = Keystore::create_with_config(
        dir.path(),
        KeyProtection::encrypted("correct-Horse-battery-9staple"),
        KeystoreConfig::for_testing(),
    )
    .expect("keystore should open");

    // ── 2. Create an owner and an agent ─────────────────────────────────────
    let owner = ks
        .create_identity(IdentityRole::Owner, "alice", None)
        .expect("owner");
    let agent = ks
        .create_identity(IdentityRole::Agent, "deploy-bot", Some(&owner.did))
        .expect("agent");
    println!("Owner: {}", owner.did);
    println!("Agent: {}", agent.did);
    println!();

    // The DID document is derived from the identifier alone.
    let doc = DidDocument::resolve(&agent.did).expect("resolvable");
    println!(
        "Agent DID document:\n{}",
        serde_json::to_string_pretty(&doc).expect("json")
    );
    println!();

    // ── 3. Issue credentials ────────────────────────────────────────────────
    let ownership = credential::issue(
        &ks,
        &credential::ownership_credential(&owner.did, &agent.did).expires_in(86_400),
    )
    .expect("ownership credential");
    let capability = credential::issue(
        &ks,
        &credential::capability_credential(&owner.did, &agent.did, ["deploy:staging"])
            .with_audience("https://ci.example.com")
            .expires_in(3_600),
    )
    .expect("capability credential");
    println!("Ownership token:  {}...", &ownership[..48]);
    println!("Capability token: {}...", &capability[..48]);
    println!();

    // ── 4. Verify with nothing but the token ────────────────────────────────
    //
    // A relying party needs no keystore: the issuer's public key is inside
    // the issuer's DID.
    let result = credential::verify(
        &capability,
        &VerifyOptions::new()
            .trusted_issuers([owner.did.as_str()])
            .audience("https://ci.example.com"),
    );
    println!("Capability valid: {}", result.valid);
    if let Some(payload) = &result.payload {
        println!("  Claims: {:?}", payload.claims().expect("claims"));
    }

    let wrong = credential::verify(
        &capability,
        &VerifyOptions::new().audience("https://prod.example.com"),
    );
    println!(
        "Wrong audience:   {} ({})",
        wrong.valid,
        wrong.reason.unwrap_or_default()
    );
    println!();

    // ── 5. Challenge-response ───────────────────────────────────────────────
    let nonce = auth::generate_nonce();
    let payload = auth::create_payload(&agent.did, &nonce, &ChallengeOptions::default());
    let signed = auth::sign_challenge(&ks, &payload).expect("sign challenge");
    let check = auth::verify_challenge(
        agent.did.as_str(),
        &signed.encoded_payload,
        &signed.signature,
        &ChallengeExpectations::nonce(&nonce),
    );
    println!("Challenge for nonce {nonce}: valid = {}", check.valid);
}
