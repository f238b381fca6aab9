pub mod error;
pub mod types;

pub use error::{Result, TwitterError};
pub use types::{
    Includes, RecentSearchResponse, SearchMeta, TweetData, TweetMetrics, TwitterUser, UserMetrics,
};

use chrono::{DateTime, Utc};

const BASE_URL: &str = "https://api.twitter.com/2";

/// Server-side cap on `max_results` for the recent-search endpoint.
const MAX_RESULTS_CAP: u32 = 100;

pub struct TwitterClient {
    client: reqwest::Client,
    bearer_token: String,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bearer_token,
        }
    }

    /// Run one bounded recent-search request. Reposts and non-English tweets
    /// are excluded in the query itself; author records come back via the
    /// `author_id` expansion.
    pub async fn search_recent(
        &self,
        query: &str,
        since: DateTime<Utc>,
        max_results: u32,
    ) -> Result<RecentSearchResponse> {
        let search_query = format!("{query} -is:retweet lang:en");
        let max_results = max_results.min(MAX_RESULTS_CAP);
        tracing::info!(query = %search_query, max_results, "Searching recent tweets");

        let url = format!("{BASE_URL}/tweets/search/recent");
        let max_results_param = max_results.to_string();
        let start_time = since.to_rfc3339();
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", search_query.as_str()),
                ("max_results", max_results_param.as_str()),
                ("start_time", start_time.as_str()),
                ("tweet.fields", "created_at,public_metrics,author_id"),
                ("user.fields", "username,profile_image_url,public_metrics"),
                ("expansions", "author_id"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: RecentSearchResponse = resp.json().await?;
        tracing::info!(count = parsed.data.len(), "Fetched tweets");
        Ok(parsed)
    }
}
