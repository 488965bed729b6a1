//! Configuration module
//!
//! Everything the pipeline reads is loaded once, before a run, from the
//! environment. Defaults come from `utils/constants.rs`.
//! API keys are NEVER logged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult};
use super::types::ProviderId;
use crate::utils::constants::{
    build_alchemy_url, chain_id_to_dexscreener_name, chain_slug_to_id, get_blockscout_url,
    get_chain_name, get_public_rpc_fallback, CHAIN_ID_ARBITRUM, CHAIN_ID_BASE, CHAIN_ID_BSC,
    CHAIN_ID_ETHEREUM, CHAIN_ID_OPTIMISM, CHAIN_ID_POLYGON, DEFAULT_BASE_RETRY_MS,
    DEFAULT_COLLECTOR_TIMEOUT_SECS, DEFAULT_HOLDER_FETCH_LIMIT, DEFAULT_JITTER_PERCENT,
    DEFAULT_LABEL_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_MS,
    DEFAULT_PROVIDER_CONCURRENCY, DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_RATE_LIMIT_RETRY_MS,
    DEFAULT_RUN_DEADLINE_SECS,
};

// ============================================
// CHAINS
// ============================================

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Bsc,
    Polygon,
    Arbitrum,
    Optimism,
    Base,
}

impl Chain {
    /// Get chain from numeric ID
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            CHAIN_ID_ETHEREUM => Some(Self::Ethereum),
            CHAIN_ID_BSC => Some(Self::Bsc),
            CHAIN_ID_POLYGON => Some(Self::Polygon),
            CHAIN_ID_ARBITRUM => Some(Self::Arbitrum),
            CHAIN_ID_OPTIMISM => Some(Self::Optimism),
            CHAIN_ID_BASE => Some(Self::Base),
            _ => None,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Self::Ethereum => CHAIN_ID_ETHEREUM,
            Self::Bsc => CHAIN_ID_BSC,
            Self::Polygon => CHAIN_ID_POLYGON,
            Self::Arbitrum => CHAIN_ID_ARBITRUM,
            Self::Optimism => CHAIN_ID_OPTIMISM,
            Self::Base => CHAIN_ID_BASE,
        }
    }

    /// Lowercase slug, also used as the registry key
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Bsc => "bsc",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
            Self::Base => "base",
        }
    }

    /// Get chain name (delegates to constants)
    pub fn name(&self) -> &'static str {
        get_chain_name(self.id())
    }

    pub fn dexscreener_name(&self) -> &'static str {
        chain_id_to_dexscreener_name(self.id())
    }

    pub fn blockscout_url(&self) -> Option<&'static str> {
        get_blockscout_url(self.id())
    }

    /// Env var holding an explicit RPC URL for this chain
    fn rpc_env_key(&self) -> &'static str {
        match self {
            Self::Ethereum => "ETHEREUM_RPC_URL",
            Self::Bsc => "BSC_RPC_URL",
            Self::Polygon => "POLYGON_RPC_URL",
            Self::Arbitrum => "ARBITRUM_RPC_URL",
            Self::Optimism => "OPTIMISM_RPC_URL",
            Self::Base => "BASE_RPC_URL",
        }
    }

    pub fn all() -> [Chain; 6] {
        [
            Self::Ethereum,
            Self::Bsc,
            Self::Polygon,
            Self::Arbitrum,
            Self::Optimism,
            Self::Base,
        ]
    }
}

impl FromStr for Chain {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = match s.trim().parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => chain_slug_to_id(s),
        };
        id.and_then(Chain::from_id)
            .ok_or_else(|| AppError::unsupported_chain(s))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// ============================================
// PROVIDER SETTINGS
// ============================================

/// Retry/backoff/timeout policy for one provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Timeout of a single attempt
    pub timeout: Duration,
    /// Additional attempts after the first
    pub max_retries: u32,
    /// First retry delay; doubles on each retry
    pub base_backoff: Duration,
    /// First retry delay after a rate-limit response
    pub rate_limit_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Random jitter applied to each delay, in percent
    pub jitter_percent: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: Duration::from_millis(DEFAULT_BASE_RETRY_MS),
            rate_limit_backoff: Duration::from_millis(DEFAULT_RATE_LIMIT_RETRY_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_RETRY_MS),
            jitter_percent: DEFAULT_JITTER_PERCENT,
        }
    }
}

impl RetryPolicy {
    /// Policy without delays, for tests and local mocks
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries,
            base_backoff: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter_percent: 0,
        }
    }
}

/// Policy plus concurrency cap for one provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderSettings {
    pub policy: RetryPolicy,
    /// Maximum in-flight requests to this provider across a run
    pub concurrency: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            concurrency: DEFAULT_PROVIDER_CONCURRENCY,
        }
    }
}

// ============================================
// CREDENTIALS
// ============================================

/// Provider credentials. Debug output masks every key.
#[derive(Clone, Default)]
pub struct Credentials {
    pub etherscan_api_key: Option<String>,
    pub rapidapi_key: Option<String>,
    pub brave_api_key: Option<String>,
    pub alchemy_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(k: &Option<String>) -> &'static str {
            if k.is_some() {
                "***HIDDEN***"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("etherscan_api_key", &mask(&self.etherscan_api_key))
            .field("rapidapi_key", &mask(&self.rapidapi_key))
            .field("brave_api_key", &mask(&self.brave_api_key))
            .field("alchemy_api_key", &mask(&self.alchemy_api_key))
            .finish()
    }
}

/// Read a key from the first set, non-placeholder env var
fn env_key(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != "YOUR_API_KEY")
    })
}

fn env_parse<T: FromStr>(name: &str) -> AppResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::invalid_config(format!("{} has an invalid value: {}", name, raw))),
        _ => Ok(None),
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        let creds = Self {
            etherscan_api_key: env_key(&["ETHERSCAN_API_KEY", "BASESCAN_API_KEY"]),
            rapidapi_key: env_key(&["RAPIDAPI_KEY"]),
            brave_api_key: env_key(&["BRAVE_SEARCH_API_KEY"]),
            alchemy_api_key: env_key(&["ALCHEMY_API_KEY"]),
        };
        if creds.alchemy_api_key.is_some() {
            info!("🔑 ALCHEMY_API_KEY configured (key hidden for security)");
        }
        creds
    }
}

// ============================================
// REDUCTION
// ============================================

/// Thresholds of the organic-vs-bot author heuristic.
///
/// A signal whose input is unknown (no follower data, no creation date)
/// never fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BotHeuristic {
    /// Accounts younger than this are suspicious
    pub min_account_age_days: i64,
    /// following / followers above this is suspicious
    pub max_following_ratio: f64,
    /// Lifetime posts per day above this is suspicious
    pub max_posts_per_day: f64,
    /// Signals required to call an author a bot
    pub min_signals: u8,
}

impl Default for BotHeuristic {
    fn default() -> Self {
        Self {
            min_account_age_days: 30,
            max_following_ratio: 10.0,
            max_posts_per_day: 100.0,
            min_signals: 2,
        }
    }
}

/// Size caps applied by the reduction layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReductionConfig {
    pub max_holders: usize,
    pub max_pairs: usize,
    pub max_news: usize,
    pub max_audits: usize,
    pub max_influencers: usize,
    pub max_posts: usize,
    pub max_post_chars: usize,
    pub max_linked_accounts: usize,
    pub max_dev_accounts: usize,
    pub bot: BotHeuristic,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            max_holders: 20,
            max_pairs: 10,
            max_news: 10,
            max_audits: 5,
            max_influencers: 5,
            max_posts: 5,
            max_post_chars: 280,
            max_linked_accounts: 20,
            max_dev_accounts: 5,
            bot: BotHeuristic::default(),
        }
    }
}

/// Result limits and fan-out widths of the social cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocialSearchConfig {
    pub contract_limit: u32,
    pub ticker_limit: u32,
    pub name_limit: u32,
    pub deployer_limit: u32,
    pub community_limit: u32,
    pub dev_search_limit: u32,
    /// Dev/project candidates looked up in batch 2
    pub max_dev_candidates: usize,
    /// Influencer candidates looked up in batch 2
    pub max_influencer_candidates: usize,
    /// Dev accounts searched in batch 3
    pub max_dev_searches: usize,
    /// Followers an author needs to count as an influencer candidate
    pub influencer_min_followers: u64,
}

impl Default for SocialSearchConfig {
    fn default() -> Self {
        Self {
            contract_limit: 10,
            ticker_limit: 20,
            name_limit: 10,
            deployer_limit: 10,
            community_limit: 10,
            dev_search_limit: 5,
            max_dev_candidates: 5,
            max_influencer_candidates: 3,
            max_dev_searches: 2,
            influencer_min_followers: 1000,
        }
    }
}

// ============================================
// ANALYSIS CONFIG
// ============================================

/// Complete configuration of an analysis run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub credentials: Credentials,
    /// Explicit RPC URLs per chain; public fallbacks used otherwise
    pub rpc_urls: HashMap<Chain, String>,
    /// Per-provider overrides of `default_provider`
    pub providers: HashMap<ProviderId, ProviderSettings>,
    pub default_provider: ProviderSettings,
    pub label_concurrency: usize,
    pub collector_timeout: Duration,
    pub run_deadline: Duration,
    pub holder_fetch_limit: usize,
    pub launchpad_registry_path: Option<PathBuf>,
    pub reduction: ReductionConfig,
    pub social: SocialSearchConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            rpc_urls: HashMap::new(),
            providers: HashMap::new(),
            default_provider: ProviderSettings::default(),
            label_concurrency: DEFAULT_LABEL_CONCURRENCY,
            collector_timeout: Duration::from_secs(DEFAULT_COLLECTOR_TIMEOUT_SECS),
            run_deadline: Duration::from_secs(DEFAULT_RUN_DEADLINE_SECS),
            holder_fetch_limit: DEFAULT_HOLDER_FETCH_LIMIT,
            launchpad_registry_path: None,
            reduction: ReductionConfig::default(),
            social: SocialSearchConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self {
            credentials: Credentials::from_env(),
            ..Self::default()
        };

        for chain in Chain::all() {
            if let Some(url) = env_key(&[chain.rpc_env_key()]) {
                config.rpc_urls.insert(chain, url);
            }
        }

        config.launchpad_registry_path = std::env::var("LAUNCHPAD_REGISTRY_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        if let Some(secs) = env_parse::<u64>("ANALYSIS_DEADLINE_SECS")? {
            config.run_deadline = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("COLLECTOR_TIMEOUT_SECS")? {
            config.collector_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env_parse::<usize>("LABEL_CONCURRENCY")? {
            config.label_concurrency = n;
        }
        if let Some(n) = env_parse::<usize>("PROVIDER_CONCURRENCY")? {
            config.default_provider.concurrency = n;
        }
        if let Some(n) = env_parse::<u32>("PROVIDER_MAX_RETRIES")? {
            config.default_provider.policy.max_retries = n;
        }

        // Etherscan free tier is tight: keep fewer requests in flight
        config.providers.insert(
            ProviderId::ETHERSCAN,
            ProviderSettings {
                concurrency: 2,
                ..config.default_provider
            },
        );

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations a run cannot start with.
    ///
    /// API keys are optional: a missing key only degrades the domain
    /// behind it.
    pub fn validate(&self) -> AppResult<()> {
        if self.label_concurrency == 0 || self.default_provider.concurrency == 0 {
            return Err(AppError::invalid_config("concurrency caps must be at least 1"));
        }
        if self.providers.values().any(|s| s.concurrency == 0) {
            return Err(AppError::invalid_config("provider concurrency must be at least 1"));
        }
        if self.reduction.max_influencers == 0 {
            return Err(AppError::invalid_config("max_influencers must be at least 1"));
        }
        Ok(())
    }

    /// RPC URL for a chain: explicit URL, then Alchemy, then public fallback
    pub fn rpc_url(&self, chain: Chain) -> Option<String> {
        self.rpc_urls
            .get(&chain)
            .cloned()
            .or_else(|| {
                self.credentials
                    .alchemy_api_key
                    .as_ref()
                    .and_then(|k| build_alchemy_url(chain.id(), k))
            })
            .or_else(|| get_public_rpc_fallback(chain.id()).map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_credentials() -> Credentials {
        Credentials {
            etherscan_api_key: Some("e".into()),
            rapidapi_key: Some("r".into()),
            brave_api_key: Some("b".into()),
            alchemy_api_key: None,
        }
    }

    #[test]
    fn test_chain_parsing() {
        assert_eq!("base".parse::<Chain>().unwrap(), Chain::Base);
        assert_eq!("8453".parse::<Chain>().unwrap(), Chain::Base);
        assert_eq!("ETH".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert!("solana".parse::<Chain>().is_err());
    }

    #[test]
    fn test_chain_roundtrip_ids() {
        for chain in Chain::all() {
            assert_eq!(Chain::from_id(chain.id()), Some(chain));
        }
    }

    #[test]
    fn test_validate_accepts_missing_credentials() {
        assert!(AnalysisConfig::default().validate().is_ok());

        let config = AnalysisConfig {
            credentials: full_credentials(),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = AnalysisConfig {
            credentials: full_credentials(),
            ..AnalysisConfig::default()
        };
        config.label_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rpc_url_fallback_order() {
        let mut config = AnalysisConfig::default();
        assert_eq!(config.rpc_url(Chain::Base).as_deref(), Some("https://mainnet.base.org"));

        config.credentials.alchemy_api_key = Some("key".into());
        assert_eq!(
            config.rpc_url(Chain::Base).as_deref(),
            Some("https://base-mainnet.g.alchemy.com/v2/key")
        );

        config.rpc_urls.insert(Chain::Base, "http://localhost:8545".into());
        assert_eq!(config.rpc_url(Chain::Base).as_deref(), Some("http://localhost:8545"));
    }

    #[test]
    fn test_credentials_debug_masks_keys() {
        let debug = format!("{:?}", full_credentials());
        assert!(!debug.contains("\"e\""));
        assert!(debug.contains("***HIDDEN***"));
    }
}
