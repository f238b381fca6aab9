//! Source adapter: live recent-search when a bearer token is available,
//! deterministic synthetic batches otherwise.
//!
//! The synthetic mode is a deliberate seam, not error handling: it lets the
//! pipeline and both sinks be exercised without credentials or quota. Keep
//! it reachable as an explicit mode.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use blockpulse_common::RawCandidate;
use twitter_client::{RecentSearchResponse, TwitterClient};

/// Synthetic batches never exceed this many rows regardless of the limit.
const SYNTHETIC_CAP: u32 = 20;

/// Fallback batches (live search errored or came back empty) are smaller.
const FALLBACK_CAP: u32 = 10;

const SYNTHETIC_HANDLES: [&str; 20] = [
    "@blockfest_africa",
    "@crypto_king",
    "@web3_dev",
    "@blockchain_builder",
    "@defi_enthusiast",
    "@nft_creator",
    "@dao_member",
    "@metaverse_builder",
    "@layer2_expert",
    "@consensus_engineer",
    "@smart_contract_dev",
    "@dapp_builder",
    "@crypto_trader",
    "@blockchain_analyst",
    "@web3_consultant",
    "@defi_researcher",
    "@nft_artist",
    "@dao_governor",
    "@metaverse_architect",
    "@layer2_developer",
];

// ---------------------------------------------------------------------------
// PostSearcher — the search capability behind a seam
// ---------------------------------------------------------------------------

/// The search capability the adapter draws from. One bounded request per
/// call; absence of a credential is modeled by passing no searcher at all.
#[async_trait]
pub trait PostSearcher: Send + Sync {
    async fn search_recent(
        &self,
        query: &str,
        since: DateTime<Utc>,
        max_results: u32,
    ) -> Result<RecentSearchResponse>;
}

#[async_trait]
impl PostSearcher for TwitterClient {
    async fn search_recent(
        &self,
        query: &str,
        since: DateTime<Utc>,
        max_results: u32,
    ) -> Result<RecentSearchResponse> {
        Ok(TwitterClient::search_recent(self, query, since, max_results).await?)
    }
}

/// Which tier actually produced the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Live,
    Synthetic,
    Fallback,
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMode::Live => write!(f, "live"),
            FetchMode::Synthetic => write!(f, "synthetic"),
            FetchMode::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug)]
pub struct FetchResult {
    pub candidates: Vec<RawCandidate>,
    pub mode: FetchMode,
}

/// Fetch up to `limit` candidates for `query`. Finite, re-executed per call.
/// Never returns an error and never returns an empty batch for a non-zero
/// limit: upstream failures and empty result sets degrade to synthetic data.
pub async fn fetch(
    searcher: Option<&dyn PostSearcher>,
    query: &str,
    since: DateTime<Utc>,
    limit: u32,
) -> FetchResult {
    let Some(searcher) = searcher else {
        info!("No search credential configured, using synthetic data");
        return FetchResult {
            candidates: synthetic_batch(limit),
            mode: FetchMode::Synthetic,
        };
    };

    match searcher.search_recent(query, since, limit).await {
        Ok(resp) => {
            let candidates = map_response(&resp);
            if candidates.is_empty() {
                info!("Search returned no usable tweets, using fallback data");
                return FetchResult {
                    candidates: fallback_batch(limit),
                    mode: FetchMode::Fallback,
                };
            }
            FetchResult {
                candidates,
                mode: FetchMode::Live,
            }
        }
        Err(e) => {
            warn!(error = %e, "Search request failed, using fallback data");
            FetchResult {
                candidates: fallback_batch(limit),
                mode: FetchMode::Fallback,
            }
        }
    }
}

/// Map a recent-search response into raw candidates. Tweets whose author
/// cannot be resolved from the user expansion (deleted/suspended accounts)
/// are dropped silently.
fn map_response(resp: &RecentSearchResponse) -> Vec<RawCandidate> {
    let mut candidates = Vec::with_capacity(resp.data.len());
    for tweet in &resp.data {
        let Some(author_id) = tweet.author_id.as_deref() else {
            continue;
        };
        let Some(user) = resp.user(author_id) else {
            continue;
        };

        let metrics = tweet.public_metrics.clone().unwrap_or_default();
        candidates.push(RawCandidate {
            id: tweet.id.clone(),
            author_handle: format!("@{}", user.username),
            author_avatar_url: user.profile_image_url.clone(),
            text: tweet.text.clone(),
            posted_at: tweet.created_at.unwrap_or_else(Utc::now),
            like_count: Some(metrics.like_count),
            repost_count: Some(metrics.retweet_count),
            reply_count: Some(metrics.reply_count),
            quote_count: Some(metrics.quote_count),
            author_follower_count: user
                .public_metrics
                .as_ref()
                .map(|m| m.followers_count),
        });
    }
    candidates
}

/// Stable per-handle seed for reproducible engagement metrics. Tests assert
/// on ranges and determinism only, not on exact values.
fn handle_seed(handle: &str) -> i64 {
    let digest = Sha256::digest(handle.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) % i64::MAX as u64) as i64
}

/// Deterministic synthetic batch for credential-less runs. Timestamps are
/// strictly decreasing at 2-hour spacing; ids are unique within the batch.
pub fn synthetic_batch(limit: u32) -> Vec<RawCandidate> {
    let now = Utc::now();
    (0..limit.min(SYNTHETIC_CAP) as i64)
        .map(|i| {
            let handle = SYNTHETIC_HANDLES[i as usize % SYNTHETIC_HANDLES.len()];
            let seed = handle_seed(handle);
            RawCandidate {
                id: format!("synthetic_{i}_{}", handle.trim_start_matches('@')),
                author_handle: handle.to_string(),
                author_avatar_url: Some(format!("https://i.pravatar.cc/100?img={}", i + 1)),
                text: format!(
                    "Blockfest is absolutely incredible! The energy here is unmatched #blockfest #blockfestafrica #{}",
                    handle.trim_start_matches('@')
                ),
                posted_at: now - Duration::hours(i * 2),
                like_count: Some(50 + i * 15 + seed % 100),
                repost_count: Some(10 + i * 3 + seed % 20),
                reply_count: Some(5 + i * 2 + seed % 10),
                quote_count: Some(2 + i + seed % 5),
                author_follower_count: Some(1000 + i * 200 + seed % 5000),
            }
        })
        .collect()
}

/// Smaller batch with distinct ids, used when the live search errors or
/// comes back empty.
pub fn fallback_batch(limit: u32) -> Vec<RawCandidate> {
    let now = Utc::now();
    (1..=limit.min(FALLBACK_CAP) as i64)
        .map(|i| RawCandidate {
            id: format!("fallback_{i}"),
            author_handle: format!("@blockfest_user_{i}"),
            author_avatar_url: Some(format!("https://i.pravatar.cc/100?img={i}")),
            text: format!("Blockfest is amazing! #{i} #blockfest"),
            posted_at: now - Duration::hours(i),
            like_count: Some(100 + i * 10),
            repost_count: Some(20 + i * 2),
            reply_count: Some(10 + i),
            quote_count: Some(5 + i),
            author_follower_count: Some(1000 + i * 100),
        })
        .collect()
}
