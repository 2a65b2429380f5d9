//! Challenge-response authentication.
//!
//! A verifier hands out a nonce; the prover signs a short-lived payload
//! binding that nonce to its DID; the verifier checks the response using
//! only the DID. No session state is kept here.

pub mod engine;
pub mod types;

pub use engine::{
    create_payload, create_payload_at, generate_nonce, sign_challenge, sign_challenge_with_key,
    verify_challenge, verify_challenge_at,
};
pub use types::{
    AuthVerification, ChallengeExpectations, ChallengeOptions, ChallengePayload, SignedChallenge,
};
