//! Filesystem-safe cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Longest readable prefix kept from a URL before the hash suffix.
const URL_PREFIX_LEN: usize = 50;

/// What a cached snapshot was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheIdentity {
    /// A page analyzed directly by URL.
    Url { url: String },
    /// A page loaded from a DSM domain and row.
    Row { domain: String, row: u32 },
}

impl CacheIdentity {
    pub fn url(url: impl Into<String>) -> Self {
        CacheIdentity::Url { url: url.into() }
    }

    pub fn row(domain: impl Into<String>, row: u32) -> Self {
        CacheIdentity::Row { domain: domain.into(), row }
    }
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect()
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// Compute the filesystem-safe cache key (file stem) for an identity.
///
/// URL keys keep a readable sanitized prefix and append a hash of the full URL
/// so long URLs sharing a prefix never collide.
pub fn cache_key(identity: &CacheIdentity) -> String {
    match identity {
        CacheIdentity::Url { url } => {
            let safe: String = sanitize(url).chars().take(URL_PREFIX_LEN).collect();
            format!("page_check_{safe}_{}", short_hash(url))
        }
        CacheIdentity::Row { domain, row } => {
            format!("dsm_{}_{row}", sanitize(&domain.to_lowercase()))
        }
    }
}
