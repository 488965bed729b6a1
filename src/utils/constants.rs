//! Constants Module - Single Source of Truth
//!
//! Chain mappings, provider endpoints and default tunables used across the
//! pipeline. Other modules read from here instead of hardcoding values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "RusterDiligence";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for provider HTTP requests
pub const USER_AGENT: &str = "RusterDiligence/0.1.0";

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// BNB Smart Chain
pub const CHAIN_ID_BSC: u64 = 56;
/// Polygon
pub const CHAIN_ID_POLYGON: u64 = 137;
/// Arbitrum One
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
/// Optimism
pub const CHAIN_ID_OPTIMISM: u64 = 10;
/// Base
pub const CHAIN_ID_BASE: u64 = 8453;

/// Zero address, excluded from holder analysis (mint/burn sink)
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// ============================================
// PROVIDER ENDPOINTS
// ============================================

/// Etherscan V2 unified endpoint (chain selected via `chainid` param)
pub const ETHERSCAN_V2_URL: &str = "https://api.etherscan.io/v2/api";

/// DexScreener public API
pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";

/// RapidAPI host for the twitter154 API
pub const RAPIDAPI_TWITTER_HOST: &str = "twitter154.p.rapidapi.com";

/// Brave Search API
pub const BRAVE_SEARCH_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Routescan Etherscan-compatible endpoint for a chain
pub fn routescan_url(chain_id: u64) -> String {
    format!(
        "https://api.routescan.io/v2/network/mainnet/evm/{}/etherscan/api",
        chain_id
    )
}

/// Blockscout v2 API base URL (address labels)
pub fn get_blockscout_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("https://eth.blockscout.com/api/v2"),
        CHAIN_ID_BASE => Some("https://base.blockscout.com/api/v2"),
        CHAIN_ID_ARBITRUM => Some("https://arbitrum.blockscout.com/api/v2"),
        CHAIN_ID_OPTIMISM => Some("https://optimism.blockscout.com/api/v2"),
        CHAIN_ID_POLYGON => Some("https://polygon.blockscout.com/api/v2"),
        _ => None,
    }
}

/// Public RPC fallback URL for a chain
pub fn get_public_rpc_fallback(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("https://eth.llamarpc.com"),
        CHAIN_ID_BSC => Some("https://bsc-dataseed.binance.org"),
        CHAIN_ID_POLYGON => Some("https://polygon-rpc.com"),
        CHAIN_ID_ARBITRUM => Some("https://arb1.arbitrum.io/rpc"),
        CHAIN_ID_OPTIMISM => Some("https://mainnet.optimism.io"),
        CHAIN_ID_BASE => Some("https://mainnet.base.org"),
        _ => None,
    }
}

/// Alchemy subdomain for a chain
pub fn get_alchemy_subdomain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("eth-mainnet"),
        CHAIN_ID_BSC => Some("bnb-mainnet"),
        CHAIN_ID_POLYGON => Some("polygon-mainnet"),
        CHAIN_ID_ARBITRUM => Some("arb-mainnet"),
        CHAIN_ID_OPTIMISM => Some("opt-mainnet"),
        CHAIN_ID_BASE => Some("base-mainnet"),
        _ => None,
    }
}

/// Build Alchemy URL for a chain
pub fn build_alchemy_url(chain_id: u64, api_key: &str) -> Option<String> {
    get_alchemy_subdomain(chain_id)
        .map(|subdomain| format!("https://{}.g.alchemy.com/v2/{}", subdomain, api_key))
}

// ============================================
// CHAIN METADATA
// ============================================

/// Get chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_BSC => "BNB Smart Chain",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_BASE => "Base",
        _ => "Unknown",
    }
}

/// Convert numeric chain ID to DexScreener chain name
pub fn chain_id_to_dexscreener_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "ethereum",
        CHAIN_ID_BSC => "bsc",
        CHAIN_ID_POLYGON => "polygon",
        CHAIN_ID_ARBITRUM => "arbitrum",
        CHAIN_ID_OPTIMISM => "optimism",
        CHAIN_ID_BASE => "base",
        _ => "ethereum",
    }
}

/// Convert a chain slug ("base", "ethereum", "eth", ...) to a numeric chain ID
pub fn chain_slug_to_id(slug: &str) -> Option<u64> {
    match slug.trim().to_lowercase().as_str() {
        "ethereum" | "eth" | "mainnet" => Some(CHAIN_ID_ETHEREUM),
        "bsc" | "bnb" => Some(CHAIN_ID_BSC),
        "polygon" | "matic" => Some(CHAIN_ID_POLYGON),
        "arbitrum" | "arb" => Some(CHAIN_ID_ARBITRUM),
        "optimism" | "op" => Some(CHAIN_ID_OPTIMISM),
        "base" => Some(CHAIN_ID_BASE),
        _ => None,
    }
}

// ============================================
// DEFAULT TUNABLES
// ============================================

/// Default per-attempt provider timeout (seconds)
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 15;

/// Default retry count after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds (doubles each retry)
pub const DEFAULT_BASE_RETRY_MS: u64 = 500;

/// Base retry delay after a rate-limit response
pub const DEFAULT_RATE_LIMIT_RETRY_MS: u64 = 2000;

/// Retry delay cap
pub const DEFAULT_MAX_RETRY_MS: u64 = 16_000;

/// Jitter percentage applied to retry delays
pub const DEFAULT_JITTER_PERCENT: u64 = 20;

/// Default concurrent in-flight requests per provider
pub const DEFAULT_PROVIDER_CONCURRENCY: usize = 8;

/// Concurrent label lookups inside the on-chain collector
pub const DEFAULT_LABEL_CONCURRENCY: usize = 5;

/// Per-collector time budget (seconds)
pub const DEFAULT_COLLECTOR_TIMEOUT_SECS: u64 = 60;

/// Whole-run deadline when the caller does not supply one (seconds)
pub const DEFAULT_RUN_DEADLINE_SECS: u64 = 180;

/// Holders requested from explorers
pub const DEFAULT_HOLDER_FETCH_LIMIT: usize = 20;

/// Maximum characters of verified source kept in the summary
pub const SOURCE_SNIPPET_CHARS: usize = 2000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_slug_mapping() {
        assert_eq!(chain_slug_to_id("Base"), Some(CHAIN_ID_BASE));
        assert_eq!(chain_slug_to_id("eth"), Some(CHAIN_ID_ETHEREUM));
        assert_eq!(chain_slug_to_id("solana"), None);
    }

    #[test]
    fn test_routescan_url() {
        assert_eq!(
            routescan_url(8453),
            "https://api.routescan.io/v2/network/mainnet/evm/8453/etherscan/api"
        );
    }

    #[test]
    fn test_alchemy_url() {
        assert_eq!(
            build_alchemy_url(1, "k").as_deref(),
            Some("https://eth-mainnet.g.alchemy.com/v2/k")
        );
        assert!(build_alchemy_url(999, "k").is_none());
    }
}
