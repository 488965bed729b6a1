//! DexScreener API Client
//!
//! ✅ USED FOR:
//! - Trading pairs of the token on the analysed chain
//! - Price, market cap, FDV, 24h volume, liquidity, price change
//! - Project links published with the pair (twitter, website)
//! - Token name/symbol as fallback when on-chain reads fail
//!
//! DexScreener has a 5-30 second delay; values are informational only.
//!
//! API: https://api.dexscreener.com/latest/dex/tokens/{tokenAddress}
//! Free, no API key required

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::client::Endpoint;
use super::http::send_json;
use crate::models::config::Chain;
use crate::models::errors::CallError;
use crate::models::records::{PairSummary, TokenSocials};
use crate::models::types::ProviderId;
use crate::utils::constants::DEXSCREENER_BASE_URL;

/// DexScreener API response
#[derive(Debug, Deserialize)]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

/// A trading pair from DexScreener
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    /// Chain ID (e.g., "ethereum", "bsc", "base")
    pub chain_id: String,
    /// DEX identifier (e.g., "uniswap", "aerodrome")
    pub dex_id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub pair_address: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub base_token: DexToken,
    pub quote_token: DexToken,
    /// Price in USD (DexScreener sends a string)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_usd: Option<f64>,
    pub liquidity: Option<DexLiquidity>,
    pub volume: Option<DexWindow>,
    pub price_change: Option<DexWindow>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fdv: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub info: Option<DexInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexLiquidity {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
}

/// Values per time window (volume, price change)
#[derive(Debug, Clone, Deserialize)]
pub struct DexWindow {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexInfo {
    #[serde(default)]
    pub websites: Vec<DexWebsite>,
    #[serde(default)]
    pub socials: Vec<DexSocial>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexWebsite {
    #[serde(default)]
    pub label: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexSocial {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: String,
}

/// Accept numbers, numeric strings and null
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

impl DexPair {
    pub fn liquidity_usd(&self) -> Option<f64> {
        self.liquidity.as_ref().and_then(|l| l.usd)
    }

    pub fn to_summary(&self) -> PairSummary {
        PairSummary {
            dex_id: dex_id_to_name(&self.dex_id),
            pair_address: self.pair_address.to_lowercase(),
            base_symbol: self.base_token.symbol.clone(),
            quote_symbol: self.quote_token.symbol.clone(),
            price_usd: self.price_usd,
            liquidity_usd: self.liquidity_usd(),
            volume_24h: self.volume.as_ref().and_then(|v| v.h24),
            url: self.url.clone(),
        }
    }

    /// Twitter handle and website published with the pair
    pub fn socials(&self) -> TokenSocials {
        let mut out = TokenSocials::default();
        let Some(info) = &self.info else {
            return out;
        };

        for social in &info.socials {
            match social.kind.to_lowercase().as_str() {
                "twitter" | "x" => {
                    if out.twitter_handle.is_none() {
                        out.twitter_handle = twitter_handle_from_url(&social.url);
                    }
                }
                "telegram" => out.telegram = out.telegram.take().or(Some(social.url.clone())),
                "discord" => out.discord = out.discord.take().or(Some(social.url.clone())),
                _ => {}
            }
        }
        out.website = info.websites.first().map(|w| w.url.clone());
        out
    }
}

/// "https://x.com/handle?s=20" -> "handle"
pub fn twitter_handle_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let path = trimmed
        .split_once("twitter.com/")
        .or_else(|| trimmed.split_once("x.com/"))
        .map(|(_, rest)| rest)?;
    let handle = path
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('@');
    if handle.is_empty() || handle.len() > 15 || !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    // x.com/i/..., x.com/intent/... are not profiles
    if matches!(
        handle.to_lowercase().as_str(),
        "i" | "home" | "intent" | "search" | "hashtag" | "share"
    ) {
        return None;
    }
    Some(handle.to_string())
}

/// Map dex_id to human-readable name
pub fn dex_id_to_name(dex_id: &str) -> String {
    match dex_id.to_lowercase().as_str() {
        "uniswap" => "Uniswap".to_string(),
        "sushiswap" => "SushiSwap".to_string(),
        "pancakeswap" => "PancakeSwap".to_string(),
        "quickswap" => "QuickSwap".to_string(),
        "camelot" => "Camelot".to_string(),
        "velodrome" => "Velodrome".to_string(),
        "aerodrome" => "Aerodrome".to_string(),
        "baseswap" => "BaseSwap".to_string(),
        _ => dex_id.to_string(),
    }
}

/// DexScreener API client for one chain
#[derive(Clone)]
pub struct DexScreenerProvider {
    client: reqwest::Client,
    base_url: String,
    chain: Chain,
}

impl DexScreenerProvider {
    pub fn new(client: reqwest::Client, chain: Chain) -> Self {
        Self {
            client,
            base_url: DEXSCREENER_BASE_URL.to_string(),
            chain,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Keep pairs on `chain`, highest liquidity first
pub fn pairs_for_chain(pairs: Vec<DexPair>, chain: Chain) -> Vec<DexPair> {
    let chain_name = chain.dexscreener_name();
    let mut pairs: Vec<DexPair> = pairs
        .into_iter()
        .filter(|p| p.chain_id.eq_ignore_ascii_case(chain_name))
        .collect();

    // Sort by liquidity (highest first); stable so API order breaks ties
    pairs.sort_by(|a, b| {
        let liq_a = a.liquidity_usd().unwrap_or(0.0);
        let liq_b = b.liquidity_usd().unwrap_or(0.0);
        liq_b.partial_cmp(&liq_a).unwrap_or(std::cmp::Ordering::Equal)
    });
    pairs
}

#[async_trait]
impl Endpoint<String, Vec<DexPair>> for DexScreenerProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::DEXSCREENER
    }

    /// Fetch all pairs for a token address on this provider's chain.
    /// No pairs is a valid (empty) answer.
    async fn fetch(&self, token_address: &String) -> Result<Vec<DexPair>, CallError> {
        let url = format!("{}/tokens/{}", self.base_url, token_address);
        info!("🔍 DexScreener: Fetching pairs for {}", token_address);

        let data: DexScreenerResponse = send_json(self.client.get(&url)).await?;
        let pairs = pairs_for_chain(data.pairs.unwrap_or_default(), self.chain);

        info!(
            "📊 DexScreener: {} pairs on {}",
            pairs.len(),
            self.chain.dexscreener_name()
        );
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "base",
                "dexId": "uniswap",
                "url": "https://dexscreener.com/base/0xsmall",
                "pairAddress": "0xSMALL",
                "labels": ["v3"],
                "baseToken": {"address": "0xtoken", "name": "Test Token", "symbol": "TEST"},
                "quoteToken": {"address": "0xweth", "name": "Wrapped Ether", "symbol": "WETH"},
                "priceUsd": "0.0123",
                "volume": {"h24": 1000.5, "h1": 10},
                "priceChange": {"h1": -1.5, "h24": 12.25},
                "liquidity": {"usd": 5000, "base": 1, "quote": 2},
                "fdv": 123000,
                "marketCap": 120000
            },
            {
                "chainId": "base",
                "dexId": "aerodrome",
                "url": "https://dexscreener.com/base/0xbig",
                "pairAddress": "0xBIG",
                "baseToken": {"address": "0xtoken", "name": "Test Token", "symbol": "TEST"},
                "quoteToken": {"address": "0xusdc", "name": "USD Coin", "symbol": "USDC"},
                "priceUsd": "0.0124",
                "liquidity": {"usd": 90000},
                "info": {
                    "websites": [{"label": "Website", "url": "https://test.xyz"}],
                    "socials": [
                        {"type": "twitter", "url": "https://x.com/testtoken"},
                        {"type": "telegram", "url": "https://t.me/testtoken"}
                    ]
                }
            },
            {
                "chainId": "ethereum",
                "dexId": "uniswap",
                "pairAddress": "0xOTHERCHAIN",
                "baseToken": {"address": "0xtoken", "symbol": "TEST"},
                "quoteToken": {"address": "0xweth", "symbol": "WETH"},
                "liquidity": {"usd": 999999}
            }
        ]
    }"#;

    #[test]
    fn test_pairs_filtered_and_sorted() {
        let resp: DexScreenerResponse = serde_json::from_str(FIXTURE).unwrap();
        let pairs = pairs_for_chain(resp.pairs.unwrap(), Chain::Base);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].pair_address, "0xBIG");
        assert_eq!(pairs[1].price_usd, Some(0.0123));
        assert_eq!(pairs[1].price_change.as_ref().and_then(|p| p.h24), Some(12.25));
        assert_eq!(pairs[1].market_cap, Some(120000.0));
    }

    #[test]
    fn test_socials_from_info_block() {
        let resp: DexScreenerResponse = serde_json::from_str(FIXTURE).unwrap();
        let pairs = pairs_for_chain(resp.pairs.unwrap(), Chain::Base);
        let socials = pairs[0].socials();

        assert_eq!(socials.twitter_handle.as_deref(), Some("testtoken"));
        assert_eq!(socials.website.as_deref(), Some("https://test.xyz"));
        assert_eq!(socials.telegram.as_deref(), Some("https://t.me/testtoken"));
        assert!(pairs[1].socials().twitter_handle.is_none());
    }

    #[test]
    fn test_null_pairs() {
        let resp: DexScreenerResponse =
            serde_json::from_str(r#"{"schemaVersion":"1.0.0","pairs":null}"#).unwrap();
        assert!(resp.pairs.is_none());
    }

    #[test]
    fn test_twitter_handle_from_url() {
        assert_eq!(
            twitter_handle_from_url("https://twitter.com/SomeProject/").as_deref(),
            Some("SomeProject")
        );
        assert_eq!(
            twitter_handle_from_url("https://x.com/abc_123?s=21").as_deref(),
            Some("abc_123")
        );
        assert!(twitter_handle_from_url("https://x.com/i/communities/123").is_none());
        assert!(twitter_handle_from_url("https://example.com").is_none());
    }

    #[test]
    fn test_summary_uses_display_name() {
        let resp: DexScreenerResponse = serde_json::from_str(FIXTURE).unwrap();
        let summary = resp.pairs.unwrap()[1].to_summary();
        assert_eq!(summary.dex_id, "Aerodrome");
        assert_eq!(summary.pair_address, "0xbig");
    }
}
