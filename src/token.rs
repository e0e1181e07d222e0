//! Single-use download tokens.
//!
//! A token is a bearer capability: whoever holds the string may download the
//! file it names, once, before it expires. The record carries the resolved
//! file path captured at mint time and nothing about the order it came from.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Random bytes per token (128 bits).
pub const TOKEN_BYTES: usize = 16;

/// Clamp for TTLs too large to represent.
const MAX_TTL_DAYS: i64 = 36_500;

/// Hex characters of a token shown in logs.
const LOG_PREFIX_LEN: usize = 8;

/// An outstanding download credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadToken {
    /// Random, hex-encoded token string.
    pub token: String,
    /// File served on redemption.
    pub file_path: PathBuf,
    /// Instant after which the token is no longer honoured.
    pub expires_at: DateTime<Utc>,
}

impl DownloadToken {
    /// Mint a fresh token for `file_path` valid for `ttl` from `now`.
    #[must_use]
    pub fn mint(file_path: PathBuf, ttl: Duration, now: DateTime<Utc>) -> Self {
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::days(MAX_TTL_DAYS));
        Self {
            token: generate_token(),
            file_path,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// True once `now` is strictly past `expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whole seconds left before expiry, zero if already expired.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.expires_at - now).num_seconds()).unwrap_or(0)
    }

    /// Name the file is served under.
    #[must_use]
    pub fn filename(&self) -> String {
        self.file_path
            .file_name()
            .map_or_else(|| "download".to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Generate a 128-bit random token from the OS RNG, hex encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shortened token for log lines.
#[must_use]
pub fn log_id(token: &str) -> &str {
    token
        .char_indices()
        .nth(LOG_PREFIX_LEN)
        .map_or(token, |(end, _)| &token[..end])
}
