//! Time utilities for AgenticDID.
//!
//! Ledger timestamps are Unix epoch microseconds (u64); token claims
//! (`iat`, `nbf`, `exp`) are Unix epoch seconds (i64), as JWTs expect.

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Return the current time as whole seconds since Unix epoch.
pub fn now_secs() -> i64 {
    (now_micros() / 1_000_000) as i64
}

/// Latest timestamp the token claims can carry: 9999-12-31T23:59:59Z.
pub const MAX_TIMESTAMP_SECS: i64 = 253_402_300_799;

/// `now + delta` clamped to `[0, MAX_TIMESTAMP_SECS]`.
pub fn offset_secs(now: i64, delta: i64) -> i64 {
    now.saturating_add(delta).clamp(0, MAX_TIMESTAMP_SECS)
}

/// Convert epoch seconds to an RFC 3339 string with second precision.
pub fn secs_to_rfc3339(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs.clamp(0, MAX_TIMESTAMP_SECS), 0)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
}

/// Parse an RFC 3339 string into epoch seconds.
pub fn rfc3339_to_secs(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}
