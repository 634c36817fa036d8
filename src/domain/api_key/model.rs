//! ApiKey domain entity

use chrono::{DateTime, Utc};

/// Prefix shared by every minted key token
pub const KEY_PREFIX: &str = "key-number-";

/// Number of random digits appended to [`KEY_PREFIX`]
pub const KEY_DIGITS: usize = 6;

const MASK: &str = "•••••";

/// An issued API key (one row of `api_keys`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Datastore-assigned identifier
    pub id: String,
    /// Human-readable label
    pub name: String,
    /// Secret token presented by clients
    pub key: String,
    pub created_at: DateTime<Utc>,
    /// Time of the most recent successful validation
    pub last_used: Option<DateTime<Utc>>,
}

/// Data needed to persist a freshly minted key
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

impl NewApiKey {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            created_at: Utc::now(),
        }
    }
}

impl ApiKey {
    /// Display form of the token: `key-number-12•••••`.
    ///
    /// Tokens that do not follow the minted format keep only their
    /// first four characters.
    pub fn masked_key(&self) -> String {
        mask_key(&self.key)
    }
}

/// Check if a string looks like a minted key (`key-number-` followed by digits)
pub fn is_key_format(s: &str) -> bool {
    s.strip_prefix(KEY_PREFIX)
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

pub fn mask_key(key: &str) -> String {
    if is_key_format(key) {
        let digits = &key[KEY_PREFIX.len()..];
        let visible = &digits[..digits.len().min(2)];
        return format!("{}{}{}", KEY_PREFIX, visible, MASK);
    }
    let visible: String = key.chars().take(4).collect();
    format!("{}{}", visible, MASK)
}
