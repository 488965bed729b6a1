//! Market collector (DexScreener pairs)

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Budget, Collector};
use crate::models::records::MarketData;
use crate::models::types::{CollectorKind, CollectorResult, FieldLog, TokenContext};
use crate::providers::dexscreener::DexPair;
use crate::providers::fallback::FallbackChain;

pub struct MarketCollector {
    pairs: FallbackChain<String, Vec<DexPair>>,
    budget: Duration,
}

impl MarketCollector {
    pub fn new(pairs: FallbackChain<String, Vec<DexPair>>, budget: Duration) -> Self {
        Self { pairs, budget }
    }
}

/// Derive market metrics; the deepest pool is the reference pair
pub fn market_from_pairs(mut pairs: Vec<DexPair>) -> MarketData {
    pairs.sort_by(|a, b| {
        let liq_a = a.liquidity_usd().unwrap_or(0.0);
        let liq_b = b.liquidity_usd().unwrap_or(0.0);
        liq_b.partial_cmp(&liq_a).unwrap_or(std::cmp::Ordering::Equal)
    });

    let Some(best) = pairs.first() else {
        return MarketData::default();
    };

    // Socials: first pair that publishes them
    let mut socials = best.socials();
    for pair in pairs.iter().skip(1) {
        if socials.twitter_handle.is_some() && socials.website.is_some() {
            break;
        }
        let other = pair.socials();
        socials.twitter_handle = socials.twitter_handle.or(other.twitter_handle);
        socials.website = socials.website.or(other.website);
        socials.telegram = socials.telegram.or(other.telegram);
        socials.discord = socials.discord.or(other.discord);
    }

    MarketData {
        base_name: best.base_token.name.clone(),
        base_symbol: best.base_token.symbol.clone(),
        price_usd: best.price_usd,
        market_cap: best.market_cap,
        fdv: best.fdv,
        volume_24h: best.volume.as_ref().and_then(|v| v.h24),
        liquidity_usd: best.liquidity_usd(),
        price_change_1h: best.price_change.as_ref().and_then(|p| p.h1),
        price_change_24h: best.price_change.as_ref().and_then(|p| p.h24),
        dex_url: best.url.clone(),
        best_pair: Some(best.to_summary()),
        pairs: pairs.iter().map(DexPair::to_summary).collect(),
        socials,
    }
}

#[async_trait]
impl Collector for MarketCollector {
    type Output = MarketData;

    fn kind(&self) -> CollectorKind {
        CollectorKind::Market
    }

    async fn collect(
        &self,
        ctx: Arc<TokenContext>,
        cancel: &CancellationToken,
    ) -> CollectorResult<MarketData> {
        let started = Instant::now();
        let budget = Budget::start(cancel, self.budget);

        let mut log = FieldLog::default();
        let pairs = log.record("pairs", self.pairs.resolve(&ctx.address, budget.token()).await);
        let data = pairs.map(market_from_pairs).unwrap_or_default();

        if let Some(best) = &data.best_pair {
            info!(
                "💹 Market: {} pairs, best {} liquidity ${:.0}",
                data.pairs.len(),
                best.dex_id,
                best.liquidity_usd.unwrap_or(0.0)
            );
        }
        CollectorResult::new(
            CollectorKind::Market,
            data,
            log,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        )
    }
}
