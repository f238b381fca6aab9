use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Canonical record ---

/// The normalized, storage-ready post record. Keyed uniquely on `id`;
/// writes with a duplicate `id` are no-ops (first-write-wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_handle: String,
    pub author_avatar_url: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    pub like_count: i64,
    pub repost_count: i64,
    pub reply_count: i64,
    pub quote_count: i64,
    pub author_follower_count: i64,
}

// --- Pre-normalization shape ---

/// A candidate post as produced by the source adapter, before normalization.
/// Fields may be partially populated: API data can omit follower counts for
/// deleted accounts, synthetic data may leave the avatar unset. Created per
/// fetch, consumed immediately by the normalizer, never persisted.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub id: String,
    pub author_handle: String,
    pub author_avatar_url: Option<String>,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    pub like_count: Option<i64>,
    pub repost_count: Option<i64>,
    pub reply_count: Option<i64>,
    pub quote_count: Option<i64>,
    pub author_follower_count: Option<i64>,
}
