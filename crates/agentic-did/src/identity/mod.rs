//! Identity metadata and key material.
//!
//! An identity's DID is its public key; the private key proves ownership.

pub mod key_material;
pub mod record;

pub use key_material::KeyMaterial;
pub use record::{Identity, IdentityRole};
