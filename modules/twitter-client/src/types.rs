use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response envelope for `GET /2/tweets/search/recent`.
/// `data` is omitted entirely when the query matches nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentSearchResponse {
    #[serde(default)]
    pub data: Vec<TweetData>,
    pub includes: Option<Includes>,
    pub meta: Option<SearchMeta>,
}

impl RecentSearchResponse {
    /// Resolve an expanded user record by author id.
    pub fn user(&self, author_id: &str) -> Option<&TwitterUser> {
        self.includes
            .as_ref()?
            .users
            .iter()
            .find(|u| u.id == author_id)
    }
}

/// A single tweet from the recent-search dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct TweetData {
    pub id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub public_metrics: Option<TweetMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetMetrics {
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub quote_count: i64,
}

/// Expanded objects referenced from the tweet list.
#[derive(Debug, Clone, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<TwitterUser>,
}

/// Author info from the `author_id` expansion.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUser {
    pub id: String,
    pub username: String,
    pub profile_image_url: Option<String>,
    pub public_metrics: Option<UserMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetrics {
    #[serde(default)]
    pub followers_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMeta {
    pub result_count: Option<i64>,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recent_search_payload() {
        let body = r#"{
            "data": [
                {
                    "id": "1701",
                    "text": "Blockfest day one",
                    "author_id": "42",
                    "created_at": "2026-08-20T10:00:00.000Z",
                    "public_metrics": {"retweet_count": 3, "reply_count": 1, "like_count": 12, "quote_count": 0}
                }
            ],
            "includes": {
                "users": [
                    {"id": "42", "username": "builder", "profile_image_url": "https://pbs.twimg.com/x.jpg",
                     "public_metrics": {"followers_count": 900}}
                ]
            },
            "meta": {"result_count": 1, "newest_id": "1701", "oldest_id": "1701"}
        }"#;

        let resp: RecentSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.data.len(), 1);
        let tweet = &resp.data[0];
        assert_eq!(tweet.public_metrics.as_ref().unwrap().like_count, 12);

        let user = resp.user("42").unwrap();
        assert_eq!(user.username, "builder");
        assert_eq!(user.public_metrics.as_ref().unwrap().followers_count, 900);
    }

    #[test]
    fn empty_result_omits_data_field() {
        let body = r#"{"meta": {"result_count": 0}}"#;
        let resp: RecentSearchResponse = serde_json::from_str(body).unwrap();
        assert!(resp.data.is_empty());
        assert!(resp.user("42").is_none());
    }
}
