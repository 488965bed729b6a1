//! Twitter/X via RapidAPI (twitter154)
//!
//! - `GET /search/search?query=..&section=top&limit=..&language=en`
//! - `GET /user/details?username=..`
//!
//! Headers: `x-rapidapi-key`, `x-rapidapi-host`. The key is never logged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::client::Endpoint;
use super::http::send_json;
use crate::models::errors::CallError;
use crate::models::records::{AuthorProfile, Post, QueryKind, SearchQuery};
use crate::models::types::ProviderId;
use crate::utils::constants::RAPIDAPI_TWITTER_HOST;

/// Twitter's legacy timestamp format, e.g. "Wed Oct 10 20:19:24 +0000 2018"
pub const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

// ============================================
// WIRE TYPES
// ============================================

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RawTweet>,
}

#[derive(Debug, Deserialize)]
pub struct RawTweet {
    #[serde(default)]
    pub tweet_id: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub favorite_count: Option<u64>,
    #[serde(default)]
    pub retweet_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub follower_count: Option<u64>,
    #[serde(default)]
    pub following_count: Option<u64>,
    #[serde(default)]
    pub number_of_tweets: Option<u64>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub is_blue_verified: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parse Twitter's timestamp, falling back to RFC 3339
pub fn parse_twitter_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw.trim(), TWITTER_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw.trim()))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl RawUser {
    pub fn into_profile(self, fallback_username: &str) -> AuthorProfile {
        AuthorProfile {
            username: self
                .username
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| fallback_username.to_string()),
            name: self.name.filter(|n| !n.is_empty()),
            followers: self.follower_count,
            following: self.following_count,
            post_count: self.number_of_tweets,
            created_at: self.creation_date.as_deref().and_then(parse_twitter_date),
            verified: self.is_blue_verified.unwrap_or(false),
            description: self.description.filter(|d| !d.is_empty()),
        }
    }
}

impl RawTweet {
    pub fn into_post(self, kind: QueryKind) -> Post {
        let text = self.full_text.or(self.text).unwrap_or_default();
        let author = self.user.unwrap_or_default().into_profile("");
        Post {
            id: self.tweet_id.unwrap_or_default(),
            text,
            author,
            likes: self.favorite_count.unwrap_or(0),
            replies: self.reply_count.unwrap_or(0),
            reposts: self.retweet_count.unwrap_or(0),
            created_at: self.creation_date.as_deref().and_then(parse_twitter_date),
            kind,
        }
    }
}

/// Profile endpoint answers either the user object or `{"result": {...}}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileResponse {
    Wrapped { result: RawUser },
    Direct(RawUser),
}

// ============================================
// PROVIDER
// ============================================

#[derive(Clone)]
pub struct TwitterProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TwitterProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: format!("https://{}", RAPIDAPI_TWITTER_HOST),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", RAPIDAPI_TWITTER_HOST)
    }
}

#[async_trait]
impl Endpoint<SearchQuery, Vec<Post>> for TwitterProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::TWITTER
    }

    async fn fetch(&self, search: &SearchQuery) -> Result<Vec<Post>, CallError> {
        info!("🐦 Twitter: searching {} ({})", search.query, search.kind);
        let limit = search.limit.to_string();
        let request = self.get("/search/search").query(&[
            ("query", search.query.as_str()),
            ("section", "top"),
            ("min_retweets", "0"),
            ("min_likes", "0"),
            ("limit", limit.as_str()),
            ("language", "en"),
        ]);

        let response: SearchResponse = send_json(request).await?;
        let posts: Vec<Post> = response
            .results
            .into_iter()
            .map(|t| t.into_post(search.kind))
            .collect();
        debug!("🐦 Twitter: {} posts for {}", posts.len(), search.kind);
        Ok(posts)
    }
}

#[async_trait]
impl Endpoint<String, AuthorProfile> for TwitterProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::TWITTER
    }

    async fn fetch(&self, username: &String) -> Result<AuthorProfile, CallError> {
        let request = self
            .get("/user/details")
            .query(&[("username", username.as_str())]);

        let user = match send_json::<ProfileResponse>(request).await? {
            ProfileResponse::Wrapped { result } => result,
            ProfileResponse::Direct(user) => user,
        };
        if user.username.is_none() && user.follower_count.is_none() {
            return Err(CallError::not_found(format!("No profile for @{}", username)));
        }
        Ok(user.into_profile(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const SEARCH_FIXTURE: &str = r#"{
        "results": [
            {
                "tweet_id": "1790000000000000001",
                "creation_date": "Mon May 13 10:00:00 +0000 2024",
                "text": "just aped 0xabc",
                "user": {
                    "username": "degen1",
                    "follower_count": 1500,
                    "following_count": 300,
                    "number_of_tweets": 5000,
                    "creation_date": "Fri Jan 01 00:00:00 +0000 2021",
                    "is_blue_verified": true
                },
                "favorite_count": 10,
                "retweet_count": 2,
                "reply_count": 1
            },
            {
                "tweet_id": "1790000000000000002",
                "full_text": "full text wins",
                "text": "short",
                "user": {"username": "degen2"}
            }
        ],
        "continuation_token": "abc"
    }"#;

    #[test]
    fn test_search_fixture_parsing() {
        let resp: SearchResponse = serde_json::from_str(SEARCH_FIXTURE).unwrap();
        let posts: Vec<Post> = resp
            .results
            .into_iter()
            .map(|t| t.into_post(QueryKind::Contract))
            .collect();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].author.username, "degen1");
        assert_eq!(posts[0].author.followers, Some(1500));
        assert!(posts[0].author.verified);
        assert_eq!(posts[0].engagement(), 13);
        assert_eq!(posts[0].created_at.unwrap().year(), 2024);
        assert_eq!(posts[1].text, "full text wins");
        assert!(posts[1].created_at.is_none());
        assert_eq!(posts[1].kind, QueryKind::Contract);
    }

    #[test]
    fn test_profile_response_shapes() {
        let direct = r#"{"user_id": "1", "username": "proj", "follower_count": 42}"#;
        let wrapped = r#"{"result": {"username": "proj", "follower_count": 42}}"#;
        for raw in [direct, wrapped] {
            let user = match serde_json::from_str::<ProfileResponse>(raw).unwrap() {
                ProfileResponse::Wrapped { result } => result,
                ProfileResponse::Direct(user) => user,
            };
            assert_eq!(user.into_profile("x").followers, Some(42));
        }
    }

    #[test]
    fn test_parse_twitter_date() {
        let dt = parse_twitter_date("Wed Oct 10 20:19:24 +0000 2018").unwrap();
        assert_eq!(dt.to_rfc3339(), "2018-10-10T20:19:24+00:00");
        assert!(parse_twitter_date("2024-01-01T00:00:00Z").is_some());
        assert!(parse_twitter_date("yesterday").is_none());
    }
}
