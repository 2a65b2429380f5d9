//! Passphrase strength policy for keystores opened for writing.
//!
//! Opening a keystore read-only never runs these checks, so keystores
//! created under looser rules stay readable.

use crate::error::{IdentityError, Result};

pub const MIN_PASSPHRASE_LENGTH: usize = 12;
pub const MIN_PASSPHRASE_ENTROPY_BITS: f64 = 50.0;
/// Length of a repeated or sequential run that rejects a passphrase.
const PATTERN_RUN: usize = 4;

/// Estimate entropy as `length × log2(character pool size)`.
///
/// The pool is the union of the character classes present: lowercase (26),
/// uppercase (26), digits (10), ASCII symbols (33), anything else (100).
pub fn estimate_entropy_bits(passphrase: &str) -> f64 {
    let (mut lower, mut upper, mut digit, mut symbol, mut other) =
        (false, false, false, false, false);
    for c in passphrase.chars() {
        match c {
            'a'..='z' => lower = true,
            'A'..='Z' => upper = true,
            '0'..='9' => digit = true,
            c if c.is_ascii() => symbol = true,
            _ => other = true,
        }
    }

    let pool: u32 = [
        (lower, 26),
        (upper, 26),
        (digit, 10),
        (symbol, 33),
        (other, 100),
    ]
    .iter()
    .filter(|(present, _)| *present)
    .map(|(_, size)| size)
    .sum();

    if pool == 0 {
        return 0.0;
    }
    passphrase.chars().count() as f64 * f64::from(pool).log2()
}

/// Reject passphrases that are too short, too predictable, or built on a
/// simple repeated (`aaaa`) or sequential (`abcd`, `4321`) run.
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    let len = passphrase.chars().count();
    if len < MIN_PASSPHRASE_LENGTH {
        return Err(IdentityError::WeakPassphrase(format!(
            "must be at least {MIN_PASSPHRASE_LENGTH} characters"
        )));
    }

    let bits = estimate_entropy_bits(passphrase);
    if bits < MIN_PASSPHRASE_ENTROPY_BITS {
        return Err(IdentityError::WeakPassphrase(format!(
            "estimated entropy {bits:.0} bits is below {MIN_PASSPHRASE_ENTROPY_BITS:.0}"
        )));
    }

    let chars: Vec<u32> = passphrase.chars().map(u32::from).collect();
    for window in chars.windows(PATTERN_RUN) {
        let diffs: Vec<i64> = window
            .windows(2)
            .map(|p| i64::from(p[1]) - i64::from(p[0]))
            .collect();
        if diffs.iter().all(|&d| d == 0) {
            return Err(IdentityError::WeakPassphrase(
                "contains a repeated character run".into(),
            ));
        }
        if diffs.iter().all(|&d| d == 1) || diffs.iter().all(|&d| d == -1) {
            return Err(IdentityError::WeakPassphrase(
                "contains a sequential character run".into(),
            ));
        }
    }

    Ok(())
}
