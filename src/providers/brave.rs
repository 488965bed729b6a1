//! Brave Search API
//!
//! API: `GET /web/search?q=..&count=20`, key in `X-Subscription-Token`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::client::Endpoint;
use super::http::send_json;
use crate::models::errors::CallError;
use crate::models::records::WebHit;
use crate::models::types::ProviderId;
use crate::utils::constants::BRAVE_SEARCH_BASE_URL;

/// Results requested per query
pub const BRAVE_RESULT_COUNT: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct BraveResponse {
    #[serde(default)]
    pub web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
pub struct BraveWeb {
    #[serde(default)]
    pub results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
pub struct BraveResult {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
}

impl From<BraveResult> for WebHit {
    fn from(r: BraveResult) -> Self {
        WebHit {
            title: r.title,
            url: r.url,
            description: r.description.filter(|d| !d.is_empty()),
            age: r.age,
        }
    }
}

#[derive(Clone)]
pub struct BraveProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl BraveProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: BRAVE_SEARCH_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Endpoint<String, Vec<WebHit>> for BraveProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::BRAVE
    }

    async fn fetch(&self, query: &String) -> Result<Vec<WebHit>, CallError> {
        info!("🌐 Brave: searching \"{}\"", query);
        let count = BRAVE_RESULT_COUNT.to_string();
        let request = self
            .client
            .get(format!("{}/web/search", self.base_url))
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query.as_str()), ("count", count.as_str())]);

        let response: BraveResponse = send_json(request).await?;
        Ok(response
            .web
            .map(|w| w.results.into_iter().map(WebHit::from).collect())
            .unwrap_or_default())
    }
}
