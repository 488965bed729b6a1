//! Raw domain records produced by providers and collectors.
//!
//! These are unbounded (holder lists, post sets, search hits). The reduction
//! layer in `core::reduce` turns them into fixed-size summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::errors::FailureKind;
use super::types::ProviderId;

// ============================================
// ON-CHAIN
// ============================================

/// ERC-20 metadata read over JSON-RPC
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenInfo {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    /// Raw total supply as a decimal string
    pub total_supply: Option<String>,
}

/// Explorer verification record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceInfo {
    pub verified: bool,
    pub contract_name: Option<String>,
    pub compiler: Option<String>,
    pub license: Option<String>,
    pub proxy: bool,
    pub implementation: Option<String>,
    /// First characters of the verified source
    pub source_snippet: Option<String>,
}

/// One row of an explorer holder list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderEntry {
    /// Lowercase address
    pub address: String,
    /// Raw balance as a decimal string
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractCreation {
    /// Lowercase creator address
    pub creator: String,
    pub tx_hash: Option<String>,
}

/// Runtime code of an address, reduced to a signature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeInfo {
    pub is_contract: bool,
    /// 0x-prefixed keccak256 of the runtime bytecode
    pub code_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployerInfo {
    pub address: String,
    pub creation_tx: Option<String>,
    pub is_contract: Option<bool>,
    pub code_signature: Option<String>,
}

/// How a launchpad match was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchpadMatch {
    Deployer,
    CodeSignature,
}

/// A registry hit. Surfaced as provenance, never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchpadInfo {
    pub factory_id: String,
    pub name: String,
    pub factory_address: String,
    pub matched_by: LaunchpadMatch,
}

// ============================================
// LABELS
// ============================================

/// Address metadata as returned by a label provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddressLabel {
    pub address: String,
    pub name: Option<String>,
    pub is_contract: Option<bool>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelCategory {
    Pool,
    Vesting,
    Multisig,
    Unlabeled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelConfidence {
    High,
    Low,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledAddress {
    pub address: String,
    pub category: LabelCategory,
    pub confidence: LabelConfidence,
    pub source: Option<ProviderId>,
    pub name: Option<String>,
    pub is_contract: Option<bool>,
    /// Set when the lookup itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl LabeledAddress {
    /// Degraded label for an address whose lookup failed
    pub fn unresolved(address: impl Into<String>, failure: FailureKind) -> Self {
        Self {
            address: address.into(),
            category: LabelCategory::Unlabeled,
            confidence: LabelConfidence::None,
            source: None,
            name: None,
            is_contract: None,
            failure: Some(failure),
        }
    }
}

/// Holder row joined with its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledHolder {
    pub address: String,
    pub quantity: String,
    /// Share of total supply in percent, when the supply is known
    pub share_pct: Option<f64>,
    pub category: LabelCategory,
    pub confidence: LabelConfidence,
    pub name: Option<String>,
    pub is_contract: Option<bool>,
}

/// Output of the on-chain collector
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OnchainData {
    pub token_info: Option<TokenInfo>,
    pub source: Option<SourceInfo>,
    pub holders: Vec<LabeledHolder>,
    pub creation: Option<ContractCreation>,
    pub deployer: Option<DeployerInfo>,
    pub launchpad: Option<LaunchpadInfo>,
}

// ============================================
// MARKET
// ============================================

/// One trading pair, normalized
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PairSummary {
    pub dex_id: String,
    pub pair_address: String,
    pub base_symbol: Option<String>,
    pub quote_symbol: Option<String>,
    pub price_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub volume_24h: Option<f64>,
    pub url: Option<String>,
}

/// Project links published alongside the pair
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenSocials {
    pub twitter_handle: Option<String>,
    pub website: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
}

/// Output of the market collector
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketData {
    pub base_name: Option<String>,
    pub base_symbol: Option<String>,
    pub price_usd: Option<f64>,
    pub market_cap: Option<f64>,
    pub fdv: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub price_change_1h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub dex_url: Option<String>,
    pub best_pair: Option<PairSummary>,
    /// Sorted by liquidity, highest first
    pub pairs: Vec<PairSummary>,
    pub socials: TokenSocials,
}

// ============================================
// SOCIAL
// ============================================

/// Which search produced a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Contract,
    Ticker,
    Name,
    Deployer,
    Community,
    DevAccount,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::Ticker => "ticker",
            Self::Name => "name",
            Self::Deployer => "deployer",
            Self::Community => "community",
            Self::DevAccount => "dev_account",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account metadata, either a full profile lookup or the snapshot embedded
/// in a search result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthorProfile {
    pub username: String,
    pub name: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub post_count: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: AuthorProfile,
    pub likes: u64,
    pub replies: u64,
    pub reposts: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub kind: QueryKind,
}

impl Post {
    pub fn engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.replies)
            .saturating_add(self.reposts)
    }
}

/// Search request sent to the post-search provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub kind: QueryKind,
    pub limit: u32,
}

/// Posts returned by one search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBatch {
    pub query: String,
    pub kind: QueryKind,
    pub posts: Vec<Post>,
}

/// Output of the social collector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialData {
    /// Collection time; account ages are measured against it
    pub as_of: DateTime<Utc>,
    pub contract_address: String,
    pub symbol: Option<String>,
    pub twitter_handle: Option<String>,
    pub searches: Vec<SearchBatch>,
    /// Resolved profiles keyed by lowercase username
    pub profiles: BTreeMap<String, AuthorProfile>,
    pub dev_candidates: Vec<String>,
    pub influencer_candidates: Vec<String>,
}

impl SocialData {
    pub fn empty(as_of: DateTime<Utc>, contract_address: impl Into<String>) -> Self {
        Self {
            as_of,
            contract_address: contract_address.into(),
            symbol: None,
            twitter_handle: None,
            searches: Vec::new(),
            profiles: BTreeMap::new(),
            dev_candidates: Vec::new(),
            influencer_candidates: Vec::new(),
        }
    }
}

// ============================================
// WEB
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub age: Option<String>,
}

/// Output of the web collector
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebData {
    pub query: String,
    pub total_results: usize,
    pub website: Option<String>,
    pub audits: Vec<WebHit>,
    pub news: Vec<WebHit>,
}
