//! Domain collectors
//!
//! A collector runs its sub-tasks concurrently under a time budget and
//! always returns a `CollectorResult`, however many fields failed.

pub mod market;
pub mod onchain;
pub mod social;
pub mod web;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::label_resolver::LabelResolver;
use crate::core::launchpad::LaunchpadRegistry;
use crate::models::config::{AnalysisConfig, Chain};
use crate::models::errors::{AppError, AppResult};
use crate::models::records::{MarketData, OnchainData, SocialData, WebData};
use crate::models::types::{CollectorKind, CollectorResult, TokenContext};
use crate::providers::blockscout::BlockscoutProvider;
use crate::providers::brave::BraveProvider;
use crate::providers::client::{Endpoint, ProviderClient, ProviderLimits};
use crate::providers::dexscreener::DexScreenerProvider;
use crate::providers::explorer::ExplorerProvider;
use crate::providers::fallback::FallbackChain;
use crate::providers::rpc::RpcProvider;
use crate::providers::twitter::TwitterProvider;

pub use market::MarketCollector;
pub use onchain::{OnchainCollector, OnchainSources};
pub use social::SocialCollector;
pub use web::WebCollector;

#[async_trait]
pub trait Collector: Send + Sync {
    type Output: Send;

    fn kind(&self) -> CollectorKind;

    /// Collect this domain. Never fails: failures are recorded per field.
    async fn collect(
        &self,
        ctx: Arc<TokenContext>,
        cancel: &CancellationToken,
    ) -> CollectorResult<Self::Output>;
}

// ============================================
// BUDGET
// ============================================

/// Child cancellation token that fires when the collector's budget expires
pub struct Budget {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl Budget {
    pub fn start(parent: &CancellationToken, limit: Duration) -> Self {
        let token = parent.child_token();
        let timer_token = token.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = timer_token.cancelled() => {}
                _ = tokio::time::sleep(limit) => timer_token.cancel(),
            }
        });
        Self { token, timer }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Budget {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

// ============================================
// COLLECTOR SET
// ============================================

/// The four collectors of one run
pub struct CollectorSet {
    pub onchain: Arc<dyn Collector<Output = OnchainData>>,
    pub market: Arc<dyn Collector<Output = MarketData>>,
    pub web: Arc<dyn Collector<Output = WebData>>,
    pub social: Arc<dyn Collector<Output = SocialData>>,
}

/// Builds the collectors for a run on `chain`
pub trait CollectorFactory: Send + Sync {
    fn build(&self, chain: Chain, limits: &ProviderLimits) -> AppResult<CollectorSet>;
}

/// Wrap a concrete provider as a client for one of its capabilities
pub fn client_for<Q, T, E>(limits: &ProviderLimits, endpoint: &Arc<E>) -> ProviderClient<Q, T>
where
    Q: Send + Sync + 'static,
    T: Send + 'static,
    E: Endpoint<Q, T> + 'static,
{
    let endpoint: Arc<dyn Endpoint<Q, T>> = endpoint.clone();
    limits.client(endpoint)
}

/// Production factory: real HTTP providers built from configuration
pub struct HttpCollectorFactory {
    config: Arc<AnalysisConfig>,
    client: reqwest::Client,
    registry: Arc<LaunchpadRegistry>,
}

impl HttpCollectorFactory {
    pub fn new(
        config: Arc<AnalysisConfig>,
        client: reqwest::Client,
        registry: Arc<LaunchpadRegistry>,
    ) -> Self {
        Self {
            config,
            client,
            registry,
        }
    }
}

impl CollectorFactory for HttpCollectorFactory {
    fn build(&self, chain: Chain, limits: &ProviderLimits) -> AppResult<CollectorSet> {
        let cfg = &self.config;
        let creds = &cfg.credentials;
        let http = self.client.clone();

        let rpc_url = cfg
            .rpc_url(chain)
            .ok_or_else(|| AppError::unsupported_chain(chain.slug()))?;

        let rpc = Arc::new(RpcProvider::new(http.clone(), rpc_url, chain));
        let routescan = Arc::new(ExplorerProvider::routescan(
            http.clone(),
            chain,
            cfg.holder_fetch_limit,
        ));
        let dex = Arc::new(DexScreenerProvider::new(http.clone(), chain));

        // Routescan is free; the metered Etherscan key is the backup
        let mut sources = OnchainSources {
            token_info: FallbackChain::single(client_for(limits, &rpc)),
            source: FallbackChain::single(client_for(limits, &routescan)),
            holders: FallbackChain::single(client_for(limits, &routescan)),
            creation: FallbackChain::single(client_for(limits, &routescan)),
            code: FallbackChain::single(client_for(limits, &rpc)),
        };
        match creds.etherscan_api_key.clone() {
            Some(key) => {
                let etherscan = Arc::new(ExplorerProvider::etherscan(
                    http.clone(),
                    key,
                    chain,
                    cfg.holder_fetch_limit,
                ));
                // Verified source: Etherscan first
                sources.source = FallbackChain::single(client_for(limits, &etherscan))
                    .with(client_for(limits, &routescan));
                sources.holders = sources.holders.with(client_for(limits, &etherscan));
                sources.creation = sources.creation.with(client_for(limits, &etherscan));
            }
            None => warn!("⚠️ ETHERSCAN_API_KEY not set, explorer reads use Routescan only"),
        }

        let (search, profiles) = match creds.rapidapi_key.clone() {
            Some(key) => {
                let twitter = Arc::new(TwitterProvider::new(http.clone(), key));
                (
                    FallbackChain::single(client_for(limits, &twitter)),
                    FallbackChain::single(client_for(limits, &twitter)),
                )
            }
            None => {
                warn!("⚠️ RAPIDAPI_KEY not set, social collector has no provider");
                (FallbackChain::default(), FallbackChain::default())
            }
        };

        let web = match creds.brave_api_key.clone() {
            Some(key) => {
                let brave = Arc::new(BraveProvider::new(http.clone(), key));
                FallbackChain::single(client_for(limits, &brave))
            }
            None => {
                warn!("⚠️ BRAVE_SEARCH_API_KEY not set, web collector has no provider");
                FallbackChain::default()
            }
        };

        let mut label_chain = FallbackChain::default();
        if let Some(url) = chain.blockscout_url() {
            let blockscout = Arc::new(BlockscoutProvider::new(http, url));
            label_chain = label_chain.with(client_for(limits, &blockscout));
        }

        Ok(CollectorSet {
            onchain: Arc::new(OnchainCollector::new(
                sources,
                LabelResolver::new(label_chain, cfg.label_concurrency),
                Arc::clone(&self.registry),
                cfg.collector_timeout,
            )),
            market: Arc::new(MarketCollector::new(
                FallbackChain::single(client_for(limits, &dex)),
                cfg.collector_timeout,
            )),
            web: Arc::new(WebCollector::new(web, cfg.collector_timeout)),
            social: Arc::new(SocialCollector::new(
                search,
                profiles,
                cfg.social,
                cfg.collector_timeout,
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::FailureKind;
    use crate::models::types::FieldStatus;
    use crate::providers::fallback::UNCONFIGURED;

    #[tokio::test]
    async fn test_budget_cancels_child_only() {
        let parent = CancellationToken::new();
        let budget = Budget::start(&parent, Duration::from_millis(10));
        budget.token().cancelled().await;
        assert!(budget.token().is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_budget_follows_parent() {
        let parent = CancellationToken::new();
        let budget = Budget::start(&parent, Duration::from_secs(60));
        parent.cancel();
        assert!(budget.token().is_cancelled());
    }

    fn credentials() -> crate::models::config::Credentials {
        crate::models::config::Credentials {
            etherscan_api_key: Some("e".into()),
            rapidapi_key: Some("r".into()),
            brave_api_key: Some("b".into()),
            alchemy_api_key: None,
        }
    }

    fn factory(credentials: crate::models::config::Credentials) -> HttpCollectorFactory {
        let config = Arc::new(AnalysisConfig {
            credentials,
            ..AnalysisConfig::default()
        });
        HttpCollectorFactory::new(
            config,
            reqwest::Client::new(),
            Arc::new(LaunchpadRegistry::empty()),
        )
    }

    #[test]
    fn test_factory_builds_all_collectors() {
        let set = factory(credentials())
            .build(Chain::Base, &ProviderLimits::default())
            .unwrap();
        assert_eq!(set.onchain.kind(), CollectorKind::Onchain);
        assert_eq!(set.social.kind(), CollectorKind::Social);
    }

    #[tokio::test]
    async fn test_missing_keys_leave_domains_unconfigured() {
        let creds = crate::models::config::Credentials {
            etherscan_api_key: None,
            rapidapi_key: None,
            brave_api_key: None,
            alchemy_api_key: None,
        };
        let set = factory(creds)
            .build(Chain::Base, &ProviderLimits::default())
            .unwrap();
        let ctx = Arc::new(
            TokenContext::seed("0x4200000000000000000000000000000000000006", Chain::Base).unwrap(),
        );
        let cancel = CancellationToken::new();

        let web = set.web.collect(Arc::clone(&ctx), &cancel).await;
        assert!(web.is_total_failure());
        match web.status("search") {
            Some(FieldStatus::Failed { kind, provider, .. }) => {
                assert_eq!(*kind, FailureKind::NotFound);
                assert_eq!(*provider, UNCONFIGURED);
            }
            other => panic!("expected an unconfigured failure, got {:?}", other),
        }

        let social = set.social.collect(ctx, &cancel).await;
        assert!(social.is_total_failure());
        assert!(social.data.searches.is_empty());
    }
}
