//! Candidate-to-Post normalization. Pure, no I/O, total over every shape
//! the source adapter can produce.

use blockpulse_common::{Post, RawCandidate};

/// Avatar used when the author record carries none.
pub const PLACEHOLDER_AVATAR: &str =
    "https://abs.twimg.com/sticky/default_profile_images/default_profile_normal.png";

/// Map a raw candidate into the canonical Post shape. Missing counters
/// default to 0, negative counters are clamped, a missing avatar gets the
/// placeholder. The timestamp passes through timezone-aware.
pub fn normalize(candidate: RawCandidate) -> Post {
    Post {
        id: candidate.id,
        author_handle: candidate.author_handle,
        author_avatar_url: candidate
            .author_avatar_url
            .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        text: candidate.text,
        posted_at: candidate.posted_at,
        like_count: candidate.like_count.unwrap_or(0).max(0),
        repost_count: candidate.repost_count.unwrap_or(0).max(0),
        reply_count: candidate.reply_count.unwrap_or(0).max(0),
        quote_count: candidate.quote_count.unwrap_or(0).max(0),
        author_follower_count: candidate.author_follower_count.unwrap_or(0).max(0),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sparse_candidate() -> RawCandidate {
        RawCandidate {
            id: "123".to_string(),
            author_handle: "@someone".to_string(),
            author_avatar_url: None,
            text: "hello".to_string(),
            posted_at: Utc::now(),
            like_count: None,
            repost_count: None,
            reply_count: None,
            quote_count: None,
            author_follower_count: None,
        }
    }

    #[test]
    fn missing_fields_get_defaults() {
        let post = normalize(sparse_candidate());
        assert_eq!(post.author_avatar_url, PLACEHOLDER_AVATAR);
        assert_eq!(post.like_count, 0);
        assert_eq!(post.repost_count, 0);
        assert_eq!(post.reply_count, 0);
        assert_eq!(post.quote_count, 0);
        assert_eq!(post.author_follower_count, 0);
    }

    #[test]
    fn populated_fields_pass_through() {
        let ts = Utc::now();
        let candidate = RawCandidate {
            author_avatar_url: Some("https://pbs.twimg.com/me.jpg".to_string()),
            like_count: Some(12),
            author_follower_count: Some(900),
            posted_at: ts,
            ..sparse_candidate()
        };
        let post = normalize(candidate);
        assert_eq!(post.author_avatar_url, "https://pbs.twimg.com/me.jpg");
        assert_eq!(post.like_count, 12);
        assert_eq!(post.author_follower_count, 900);
        assert_eq!(post.posted_at, ts);
    }

    #[test]
    fn negative_counters_are_clamped() {
        let candidate = RawCandidate {
            like_count: Some(-3),
            ..sparse_candidate()
        };
        assert_eq!(normalize(candidate).like_count, 0);
    }
}
