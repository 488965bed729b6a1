//! Reduced, bounded output of an analysis run.
//!
//! Everything here has a fixed maximum size regardless of how much raw data
//! the collectors gathered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::config::Chain;
use super::errors::FailureKind;
use super::records::{LabeledHolder, LaunchpadInfo, PairSummary, QueryKind, WebHit};
use super::types::{FieldStatus, ProviderId, TokenContext};

// ============================================
// DOMAIN REPORTS
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Complete,
    Partial,
    Failed,
    Cancelled,
}

/// One field that did not succeed, with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub kind: FailureKind,
    pub provider: ProviderId,
    pub attempted: Vec<ProviderId>,
    pub attempts: u32,
    pub message: String,
}

impl FieldFailure {
    pub fn from_status(field: &str, status: &FieldStatus) -> Option<Self> {
        match status {
            FieldStatus::Success { .. } => None,
            FieldStatus::Failed {
                kind,
                provider,
                attempts,
                attempted,
                message,
            } => Some(Self {
                field: field.to_string(),
                kind: *kind,
                provider: *provider,
                attempted: attempted.clone(),
                attempts: *attempts,
                message: message.clone(),
            }),
            FieldStatus::Cancelled { provider } => Some(Self {
                field: field.to_string(),
                kind: FailureKind::Cancelled,
                provider: *provider,
                attempted: vec![*provider],
                attempts: 0,
                message: "cancelled".to_string(),
            }),
        }
    }
}

/// Reduced data of one domain plus how complete it is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainReport<T> {
    pub status: DomainStatus,
    pub data: T,
    pub failures: Vec<FieldFailure>,
    /// Provider that answered each successful field
    pub sources: BTreeMap<String, ProviderId>,
    pub elapsed_ms: u64,
}

// ============================================
// PER-DOMAIN SUMMARIES
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OnchainSummary {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub total_supply: Option<String>,
    /// Supply scaled by `decimals`
    pub total_supply_display: Option<String>,
    pub verified: Option<bool>,
    pub contract_name: Option<String>,
    pub proxy: Option<bool>,
    pub implementation: Option<String>,
    pub source_snippet: Option<String>,
    pub deployer: Option<String>,
    pub deployer_is_contract: Option<bool>,
    pub creation_tx: Option<String>,
    pub holders_fetched: usize,
    pub top_holders: Vec<LabeledHolder>,
    /// Combined share of the ten largest holders
    pub top10_share_pct: Option<f64>,
    /// Combined share of holders labeled as pools
    pub pool_share_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketSummary {
    pub price_usd: Option<f64>,
    pub market_cap: Option<f64>,
    pub fdv: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub price_change_1h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub dex_url: Option<String>,
    pub pair_count: usize,
    pub top_pairs: Vec<PairSummary>,
    pub twitter_handle: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebSummary {
    pub total_results: usize,
    pub website: Option<String>,
    pub audits: Vec<WebHit>,
    pub news: Vec<WebHit>,
}

// ============================================
// SOCIAL METRICS
// ============================================

/// Earliest account seen posting the contract address
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FirstPoster {
    Known {
        username: String,
        post_id: String,
        posted_at: DateTime<Utc>,
    },
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluencerEntry {
    pub username: String,
    pub followers: u64,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPost {
    pub id: String,
    pub author: String,
    pub text: String,
    pub engagement: u64,
    pub posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevAccount {
    pub username: String,
    pub followers: Option<u64>,
    pub verified: bool,
    pub account_age_days: Option<i64>,
    /// Deduplicated posts by this account across all searches
    pub posts_found: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommunityLinks {
    pub discord: bool,
    pub telegram: bool,
}

/// Post count of one search; no post text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCount {
    pub kind: QueryKind,
    pub query: String,
    pub posts: usize,
}

/// Activity around the `$TICKER` search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSentiment {
    pub posts: usize,
    pub unique_authors: usize,
    pub likes: u64,
    pub reposts: u64,
    pub avg_engagement: f64,
    /// More unique authors than half the posts
    pub organic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSocialMetrics {
    pub total_posts: usize,
    pub unique_authors: usize,
    pub engagement_rate: f64,
    pub organic_authors: usize,
    pub bot_authors: usize,
    pub organic_ratio: f64,
    pub first_poster: FirstPoster,
    pub top_influencers: Vec<InfluencerEntry>,
    pub top_posts: Vec<TopPost>,
    pub dev_accounts: Vec<DevAccount>,
    pub official_account: Option<String>,
    pub community: CommunityLinks,
    pub linked_accounts: Vec<String>,
    pub searches: Vec<SearchCount>,
    pub ticker: Option<TickerSentiment>,
}

impl Default for AggregatedSocialMetrics {
    fn default() -> Self {
        Self {
            total_posts: 0,
            unique_authors: 0,
            engagement_rate: 0.0,
            organic_authors: 0,
            bot_authors: 0,
            organic_ratio: 0.0,
            first_poster: FirstPoster::None,
            top_influencers: Vec::new(),
            top_posts: Vec::new(),
            dev_accounts: Vec::new(),
            official_account: None,
            community: CommunityLinks::default(),
            linked_accounts: Vec::new(),
            searches: Vec::new(),
            ticker: None,
        }
    }
}

// ============================================
// ANALYSIS SUMMARY
// ============================================

/// Bounded input handed to the downstream consumer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub run_id: Uuid,
    pub address: String,
    pub chain: Chain,
    pub started_at: DateTime<Utc>,
    /// False when the run was cancelled or hit its deadline
    pub complete: bool,
    /// Context as seen by Phase 2
    pub context: TokenContext,
    pub onchain: DomainReport<OnchainSummary>,
    pub market: DomainReport<MarketSummary>,
    pub social: DomainReport<AggregatedSocialMetrics>,
    pub web: DomainReport<WebSummary>,
    pub launchpad: Option<LaunchpadInfo>,
}

impl AnalysisSummary {
    /// Domains that did not come back complete
    pub fn degraded_domains(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.onchain.status != DomainStatus::Complete {
            out.push("onchain");
        }
        if self.market.status != DomainStatus::Complete {
            out.push("market");
        }
        if self.social.status != DomainStatus::Complete {
            out.push("social");
        }
        if self.web.status != DomainStatus::Complete {
            out.push("web");
        }
        out
    }
}

// ============================================
// VERDICT (downstream consumer output)
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategory {
    pub name: String,
    /// 1-10
    pub score: u8,
    pub level: RiskLevel,
    #[serde(default)]
    pub details: String,
}

/// Structured assessment returned by an `AnalysisConsumer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub overall_risk_score: u8,
    pub overall_risk_level: RiskLevel,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub risk_categories: Vec<RiskCategory>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub positive_signals: Vec<String>,
    #[serde(default)]
    pub verdict: String,
}
