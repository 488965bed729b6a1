//! Web collector (Brave search)

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Budget, Collector};
use crate::models::records::{WebData, WebHit};
use crate::models::types::{CollectorKind, CollectorResult, FieldLog, TokenContext};
use crate::providers::fallback::FallbackChain;

pub struct WebCollector {
    search: FallbackChain<String, Vec<WebHit>>,
    budget: Duration,
}

impl WebCollector {
    pub fn new(search: FallbackChain<String, Vec<WebHit>>, budget: Duration) -> Self {
        Self { search, budget }
    }
}

pub fn search_query(address: &str) -> String {
    format!("{} token crypto", address)
}

fn is_audit(hit: &WebHit) -> bool {
    hit.title.to_lowercase().contains("audit")
        || hit
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("audit"))
}

/// Split hits into audit reports and news; pick an official website
pub fn classify_hits(query: String, hits: Vec<WebHit>, address: &str) -> WebData {
    let address = address.to_lowercase();
    let website = hits
        .iter()
        .find(|h| {
            let title = h.title.to_lowercase();
            (title.contains("official") || title.contains("homepage"))
                && !h.url.to_lowercase().contains(&address)
        })
        .map(|h| h.url.clone());

    let total_results = hits.len();
    let (audits, news): (Vec<WebHit>, Vec<WebHit>) = hits.into_iter().partition(is_audit);

    WebData {
        query,
        total_results,
        website,
        audits,
        news,
    }
}

#[async_trait]
impl Collector for WebCollector {
    type Output = WebData;

    fn kind(&self) -> CollectorKind {
        CollectorKind::Web
    }

    async fn collect(
        &self,
        ctx: Arc<TokenContext>,
        cancel: &CancellationToken,
    ) -> CollectorResult<WebData> {
        let started = Instant::now();
        let budget = Budget::start(cancel, self.budget);
        let query = search_query(&ctx.address);

        let mut log = FieldLog::default();
        let hits = log.record("search", self.search.resolve(&query, budget.token()).await);
        let data = match hits {
            Some(hits) => classify_hits(query, hits, &ctx.address),
            None => WebData {
                query,
                ..WebData::default()
            },
        };

        info!(
            "🌐 Web: {} results, {} audit links",
            data.total_results,
            data.audits.len()
        );
        CollectorResult::new(
            CollectorKind::Web,
            data,
            log,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, url: &str, desc: Option<&str>) -> WebHit {
        WebHit {
            title: title.into(),
            url: url.into(),
            description: desc.map(String::from),
            age: None,
        }
    }

    #[test]
    fn test_classify_hits() {
        let addr = "0xABC0000000000000000000000000000000000001";
        let data = classify_hits(
            search_query(addr),
            vec![
                hit("TKN Official Site", "https://etherscan.io/token/0xabc0000000000000000000000000000000000001", None),
                hit("TKN Official Homepage", "https://tkn.example", None),
                hit("Security review", "https://certik.example/tkn", Some("Full audit of TKN")),
                hit("TKN pumps 50%", "https://news.example/tkn", None),
            ],
            addr,
        );
        assert_eq!(data.total_results, 4);
        assert_eq!(data.website.as_deref(), Some("https://tkn.example"));
        assert_eq!(data.audits.len(), 1);
        assert_eq!(data.news.len(), 3);
        assert!(data.query.ends_with("token crypto"));
    }
}
