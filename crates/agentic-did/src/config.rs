//! Configuration and passphrase resolution.
//!
//! Nothing here reads the process environment. Front ends gather candidate
//! values (flags, environment variables) and hand them to
//! [`resolve_passphrase`], which picks the first one present.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Default number of bits in a status list.
pub const DEFAULT_STATUS_LIST_SIZE: usize = 131_072;

/// Default lifetime of a signed authentication challenge, in seconds.
pub const DEFAULT_CHALLENGE_TTL_SECS: i64 = 120;

/// Argon2id cost parameters.
///
/// Stored with every encrypted key record so records written under older
/// parameters stay decryptable after the defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    /// Argon2 time cost (passes over memory).
    pub iterations: u32,
    /// Argon2 memory cost in KiB.
    pub memory_kib: u32,
    /// Argon2 lanes.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: 3,
            memory_kib: 65_536, // 64 MiB
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests and benchmarks. Never use for real keys.
    pub fn for_testing() -> Self {
        Self {
            iterations: 1,
            memory_kib: 1024,
            parallelism: 1,
        }
    }
}

/// Tunables for a keystore instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeystoreConfig {
    /// KDF cost used when writing new encrypted key records.
    pub kdf: KdfParams,
    /// Bit capacity of newly created status lists.
    pub status_list_size: usize,
    /// Default TTL for authentication challenges.
    pub challenge_ttl_secs: i64,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            status_list_size: DEFAULT_STATUS_LIST_SIZE,
            challenge_ttl_secs: DEFAULT_CHALLENGE_TTL_SECS,
        }
    }
}

impl KeystoreConfig {
    /// Config with cheap KDF parameters, for tests.
    pub fn for_testing() -> Self {
        Self {
            kdf: KdfParams::for_testing(),
            ..Self::default()
        }
    }
}

// ── Passphrase resolution ─────────────────────────────────────────────────────

/// Where a passphrase candidate came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphraseOrigin {
    /// Passed explicitly (e.g. a command-line flag).
    Explicit,
    /// The primary environment variable.
    Primary,
    /// A supported alias of the primary variable.
    Alias,
    /// A deprecated name; still honoured, with a one-time warning.
    Legacy,
}

/// One candidate passphrase source.
pub struct PassphraseCandidate {
    pub origin: PassphraseOrigin,
    /// Human-readable source name used in the legacy warning.
    pub name: String,
    pub value: Option<String>,
}

impl PassphraseCandidate {
    pub fn new(origin: PassphraseOrigin, name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            origin,
            name: name.into(),
            value,
        }
    }
}

/// The winning candidate.
pub struct ResolvedPassphrase {
    pub origin: PassphraseOrigin,
    pub value: Zeroizing<String>,
}

impl std::fmt::Debug for ResolvedPassphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedPassphrase")
            .field("origin", &self.origin)
            .field("value", &"<redacted>")
            .finish()
    }
}

static LEGACY_WARNED: AtomicBool = AtomicBool::new(false);

/// Return the first candidate with a non-empty value, in order.
pub fn resolve_passphrase(candidates: Vec<PassphraseCandidate>) -> Option<ResolvedPassphrase> {
    let winner = candidates
        .into_iter()
        .find(|c| c.value.as_deref().is_some_and(|v| !v.is_empty()))?;

    if winner.origin == PassphraseOrigin::Legacy && !LEGACY_WARNED.swap(true, Ordering::Relaxed) {
        log::warn!(
            "passphrase read from deprecated source {}; switch to the primary variable",
            winner.name
        );
    }

    Some(ResolvedPassphrase {
        origin: winner.origin,
        value: Zeroizing::new(winner.value.unwrap_or_default()),
    })
}
