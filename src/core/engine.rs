//! Orchestration Engine
//!
//! ```text
//! Init -> Phase1Running -> Phase1Settled -> Phase2Running -> Settled -> Reducing -> Complete
//! ```
//!
//! Phase 1 (onchain, market, web) runs concurrently. Its results are merged
//! into a new `TokenContext` at the barrier, then Phase 2 (social) runs
//! against that context. Cancellation or a deadline never aborts the run:
//! the summary comes back with `complete = false`.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::collectors::{Collector, CollectorFactory, HttpCollectorFactory};
use super::consumer::AnalysisConsumer;
use super::launchpad::LaunchpadRegistry;
use super::reduce::{build_summary, domain_status, RunRecords};
use crate::models::config::{AnalysisConfig, Chain};
use crate::models::errors::AppResult;
use crate::models::records::{MarketData, OnchainData, WebData};
use crate::models::summary::{AnalysisSummary, DomainStatus, Verdict};
use crate::models::types::{CollectorKind, CollectorResult, ContextUpdate, TokenContext};
use crate::providers::client::ProviderLimits;
use crate::providers::http::build_client;

/// Capacity of the progress channel; slow subscribers lose old events
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Init,
    Phase1Running,
    Phase1Settled,
    Phase2Running,
    Settled,
    Reducing,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    StateChanged {
        run_id: Uuid,
        state: EngineState,
    },
    CollectorStarted {
        run_id: Uuid,
        collector: CollectorKind,
    },
    CollectorSettled {
        run_id: Uuid,
        collector: CollectorKind,
        status: DomainStatus,
        elapsed_ms: u64,
    },
    PhaseComplete {
        run_id: Uuid,
        phase: u8,
        /// Collectors that did not come back complete
        degraded: Vec<CollectorKind>,
    },
}

pub struct Engine {
    config: Arc<AnalysisConfig>,
    factory: Arc<dyn CollectorFactory>,
    events: broadcast::Sender<ProgressEvent>,
}

impl Engine {
    /// Engine with real HTTP providers. Loads the launchpad registry.
    pub fn new(config: AnalysisConfig) -> AppResult<Self> {
        let registry = match &config.launchpad_registry_path {
            Some(path) => LaunchpadRegistry::load(path)?,
            None => LaunchpadRegistry::empty(),
        };
        let config = Arc::new(config);
        let factory = HttpCollectorFactory::new(
            Arc::clone(&config),
            build_client()?,
            Arc::new(registry),
        );
        Ok(Self::with_factory(config, Arc::new(factory)))
    }

    pub fn with_factory(config: Arc<AnalysisConfig>, factory: Arc<dyn CollectorFactory>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            factory,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    /// Never blocks; no subscribers is fine
    fn emit(&self, event: ProgressEvent) {
        let _ = self.events.send(event);
    }

    fn set_state(&self, run_id: Uuid, state: EngineState) {
        info!("⚙️ Run {}: {:?}", run_id, state);
        self.emit(ProgressEvent::StateChanged { run_id, state });
    }

    /// Run one analysis under `deadline` (config default when `None`)
    pub async fn run_analysis(
        &self,
        address: &str,
        chain: Chain,
        deadline: Option<Duration>,
    ) -> AppResult<AnalysisSummary> {
        let deadline = deadline.unwrap_or(self.config.run_deadline);
        let cancel = CancellationToken::new();

        let timer_token = cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            warn!("⏰ Run deadline of {}s reached, cancelling", deadline.as_secs());
            timer_token.cancel();
        });

        let result = self.run_with_cancel(address, chain, cancel).await;
        timer.abort();
        result
    }

    /// Run one analysis until done or until `cancel` fires
    pub async fn run_with_cancel(
        &self,
        address: &str,
        chain: Chain,
        cancel: CancellationToken,
    ) -> AppResult<AnalysisSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let seed = Arc::new(TokenContext::seed(address, chain)?);
        let limits = ProviderLimits::from_config(&self.config);
        let collectors = self.factory.build(chain, &limits)?;

        self.set_state(run_id, EngineState::Init);
        info!("🔎 Analysis {} of {} on {}", run_id, seed.address, chain);

        // Phase 1
        self.set_state(run_id, EngineState::Phase1Running);
        let (onchain, market, web) = tokio::join!(
            self.run_collector(run_id, collectors.onchain.as_ref(), &seed, &cancel),
            self.run_collector(run_id, collectors.market.as_ref(), &seed, &cancel),
            self.run_collector(run_id, collectors.web.as_ref(), &seed, &cancel),
        );
        self.set_state(run_id, EngineState::Phase1Settled);

        let phase1_degraded = degraded(&[
            (CollectorKind::Onchain, domain_status(&onchain)),
            (CollectorKind::Market, domain_status(&market)),
            (CollectorKind::Web, domain_status(&web)),
        ]);
        if onchain.is_total_failure() && market.is_total_failure() && web.is_total_failure() {
            warn!("⚠️ Run {}: every Phase 1 collector failed, continuing degraded", run_id);
        }
        self.emit(ProgressEvent::PhaseComplete {
            run_id,
            phase: 1,
            degraded: phase1_degraded,
        });

        // Barrier: merge Phase 1 facts into a new context
        let ctx = Arc::new(seed.enriched(context_update(&onchain, &market, &web)));

        // Phase 2
        self.set_state(run_id, EngineState::Phase2Running);
        let social = self
            .run_collector(run_id, collectors.social.as_ref(), &ctx, &cancel)
            .await;
        self.set_state(run_id, EngineState::Settled);
        self.emit(ProgressEvent::PhaseComplete {
            run_id,
            phase: 2,
            degraded: degraded(&[(CollectorKind::Social, domain_status(&social))]),
        });

        self.set_state(run_id, EngineState::Reducing);
        let complete = !cancel.is_cancelled();
        let summary = build_summary(
            RunRecords {
                run_id,
                started_at,
                complete,
                context: ctx.as_ref(),
                onchain: &onchain,
                market: &market,
                social: &social,
                web: &web,
            },
            &self.config.reduction,
        );
        self.set_state(run_id, EngineState::Complete);

        if !complete {
            warn!("⚠️ Run {} cancelled, summary is partial", run_id);
        }
        let degraded_domains = summary.degraded_domains();
        if !degraded_domains.is_empty() {
            info!("📉 Run {}: degraded domains {:?}", run_id, degraded_domains);
        }
        Ok(summary)
    }

    /// Run the analysis, then hand the summary to `consumer`
    pub async fn run_and_assess<C>(
        &self,
        address: &str,
        chain: Chain,
        consumer: &C,
    ) -> eyre::Result<(AnalysisSummary, Verdict)>
    where
        C: AnalysisConsumer + ?Sized,
    {
        let summary = self.run_analysis(address, chain, None).await?;
        let verdict = consumer.assess(&summary).await?;
        Ok((summary, verdict))
    }

    async fn run_collector<D>(
        &self,
        run_id: Uuid,
        collector: &dyn Collector<Output = D>,
        ctx: &Arc<TokenContext>,
        cancel: &CancellationToken,
    ) -> CollectorResult<D>
    where
        D: Send + 'static,
    {
        let kind = collector.kind();
        self.emit(ProgressEvent::CollectorStarted {
            run_id,
            collector: kind,
        });

        let result = collector.collect(Arc::clone(ctx), cancel).await;
        let status = domain_status(&result);
        if status != DomainStatus::Complete {
            warn!("⚠️ {} collector settled {:?}", kind, status);
        }
        self.emit(ProgressEvent::CollectorSettled {
            run_id,
            collector: kind,
            status,
            elapsed_ms: result.elapsed_ms,
        });
        result
    }
}

fn degraded(statuses: &[(CollectorKind, DomainStatus)]) -> Vec<CollectorKind> {
    statuses
        .iter()
        .filter(|(_, s)| *s != DomainStatus::Complete)
        .map(|(k, _)| *k)
        .collect()
}

/// Facts Phase 2 needs. On-chain wins; DexScreener fills the gaps.
pub fn context_update(
    onchain: &CollectorResult<OnchainData>,
    market: &CollectorResult<MarketData>,
    web: &CollectorResult<WebData>,
) -> ContextUpdate {
    let token = onchain.data.token_info.as_ref();
    let socials = &market.data.socials;

    ContextUpdate {
        name: token
            .and_then(|t| t.name.clone())
            .or_else(|| market.data.base_name.clone()),
        symbol: token
            .and_then(|t| t.symbol.clone())
            .or_else(|| market.data.base_symbol.clone()),
        deployer: onchain.data.deployer.as_ref().map(|d| d.address.clone()),
        twitter_handle: socials.twitter_handle.clone(),
        website: socials.website.clone().or_else(|| web.data.website.clone()),
        launchpad: onchain.data.launchpad.as_ref().map(|l| l.name.clone()),
    }
}
