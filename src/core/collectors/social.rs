//! Social collector (Phase 2)
//!
//! Three dependency-ordered batches, concurrent within a batch:
//! 1. searches built from the merged context
//! 2. profile lookups for dev/influencer candidates and the project handle
//! 3. `from:<dev> $SYMBOL` searches for resolved dev accounts

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Budget, Collector};
use crate::models::config::SocialSearchConfig;
use crate::models::records::{AuthorProfile, Post, QueryKind, SearchBatch, SearchQuery, SocialData};
use crate::models::types::{CollectorKind, CollectorResult, FieldLog, TokenContext};
use crate::providers::fallback::FallbackChain;

pub struct SocialCollector {
    search: FallbackChain<SearchQuery, Vec<Post>>,
    profiles: FallbackChain<String, AuthorProfile>,
    config: SocialSearchConfig,
    budget: Duration,
}

impl SocialCollector {
    pub fn new(
        search: FallbackChain<SearchQuery, Vec<Post>>,
        profiles: FallbackChain<String, AuthorProfile>,
        config: SocialSearchConfig,
        budget: Duration,
    ) -> Self {
        Self {
            search,
            profiles,
            config,
            budget,
        }
    }

    async fn run_searches(
        &self,
        queries: Vec<(String, SearchQuery)>,
        log: &mut FieldLog,
        cancel: &CancellationToken,
    ) -> Vec<SearchBatch> {
        let results = join_all(
            queries
                .iter()
                .map(|(_, q)| self.search.resolve(q, cancel)),
        )
        .await;

        queries
            .into_iter()
            .zip(results)
            .filter_map(|((field, q), result)| {
                log.record(field, result).map(|posts| SearchBatch {
                    query: q.query,
                    kind: q.kind,
                    posts,
                })
            })
            .collect()
    }
}

/// Batch 1 queries, in a fixed order
pub fn initial_queries(ctx: &TokenContext, cfg: &SocialSearchConfig) -> Vec<SearchQuery> {
    let mut queries = vec![SearchQuery {
        query: ctx.address.clone(),
        kind: QueryKind::Contract,
        limit: cfg.contract_limit,
    }];

    if let Some(symbol) = &ctx.symbol {
        queries.push(SearchQuery {
            query: format!("${}", symbol),
            kind: QueryKind::Ticker,
            limit: cfg.ticker_limit,
        });
    }
    if let Some(name) = &ctx.name {
        let same_as_symbol = ctx
            .symbol
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(name));
        if !same_as_symbol {
            queries.push(SearchQuery {
                query: format!("{} crypto", name),
                kind: QueryKind::Name,
                limit: cfg.name_limit,
            });
        }
    }
    if let Some(deployer) = &ctx.deployer {
        queries.push(SearchQuery {
            query: deployer.clone(),
            kind: QueryKind::Deployer,
            limit: cfg.deployer_limit,
        });
    }
    if let Some(term) = ctx.name.as_ref().or(ctx.symbol.as_ref()) {
        queries.push(SearchQuery {
            query: format!("{} discord OR telegram OR community", term),
            kind: QueryKind::Community,
            limit: cfg.community_limit,
        });
    }
    queries
}

/// Dev candidates (contract posters or repeat authors) and influencer
/// candidates (large accounts), both lowercase
pub fn pick_candidates(batches: &[SearchBatch], cfg: &SocialSearchConfig) -> (Vec<String>, Vec<String>) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut followers: BTreeMap<String, u64> = BTreeMap::new();
    let mut contract_posters: BTreeSet<String> = BTreeSet::new();

    for batch in batches {
        for post in &batch.posts {
            let user = post.author.username.to_lowercase();
            if user.is_empty() {
                continue;
            }
            *counts.entry(user.clone()).or_default() += 1;
            if let Some(f) = post.author.followers {
                let entry = followers.entry(user.clone()).or_default();
                *entry = (*entry).max(f);
            }
            if batch.kind == QueryKind::Contract {
                contract_posters.insert(user);
            }
        }
    }

    let mut ranked: Vec<(&String, &usize)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let devs: Vec<String> = ranked
        .into_iter()
        .filter(|(user, count)| contract_posters.contains(*user) || **count >= 2)
        .take(cfg.max_dev_candidates)
        .map(|(user, _)| user.clone())
        .collect();

    let mut big: Vec<(&String, &u64)> = followers
        .iter()
        .filter(|(_, f)| **f > cfg.influencer_min_followers)
        .collect();
    big.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let influencers = big
        .into_iter()
        .take(cfg.max_influencer_candidates)
        .map(|(user, _)| user.clone())
        .collect();

    (devs, influencers)
}

#[async_trait]
impl Collector for SocialCollector {
    type Output = SocialData;

    fn kind(&self) -> CollectorKind {
        CollectorKind::Social
    }

    async fn collect(
        &self,
        ctx: Arc<TokenContext>,
        cancel: &CancellationToken,
    ) -> CollectorResult<SocialData> {
        let started = Instant::now();
        let budget = Budget::start(cancel, self.budget);
        let cancel = budget.token();
        let mut log = FieldLog::default();

        let mut data = SocialData::empty(Utc::now(), ctx.address.clone());
        data.symbol = ctx.symbol.clone();
        data.twitter_handle = ctx.twitter_handle.clone();

        // Batch 1: searches
        let queries = initial_queries(&ctx, &self.config)
            .into_iter()
            .map(|q| (format!("search.{}", q.kind), q))
            .collect();
        data.searches = self.run_searches(queries, &mut log, cancel).await;
        let posts: usize = data.searches.iter().map(|b| b.posts.len()).sum();
        info!("🐦 Social: {} posts across {} searches", posts, data.searches.len());

        // Batch 2: profiles
        let (devs, influencers) = pick_candidates(&data.searches, &self.config);
        let mut lookups: Vec<String> = Vec::new();
        let handle = ctx.twitter_handle.as_ref().map(|h| h.to_lowercase());
        for user in devs.iter().chain(influencers.iter()).chain(handle.iter()) {
            if !lookups.contains(user) {
                lookups.push(user.clone());
            }
        }
        let results = join_all(lookups.iter().map(|u| self.profiles.resolve(u, cancel))).await;
        for (user, result) in lookups.iter().zip(results) {
            if let Some(profile) = log.record(format!("profile.{}", user), result) {
                data.profiles.insert(user.clone(), profile);
            }
        }
        debug!("🐦 Social: {}/{} profiles resolved", data.profiles.len(), lookups.len());

        // Batch 3: dev searches
        if let Some(symbol) = &ctx.symbol {
            let queries: Vec<(String, SearchQuery)> = devs
                .iter()
                .filter(|d| data.profiles.contains_key(*d))
                .take(self.config.max_dev_searches)
                .map(|dev| {
                    (
                        format!("dev_search.{}", dev),
                        SearchQuery {
                            query: format!("from:{} ${}", dev, symbol),
                            kind: QueryKind::DevAccount,
                            limit: self.config.dev_search_limit,
                        },
                    )
                })
                .collect();
            let batches = self.run_searches(queries, &mut log, cancel).await;
            data.searches.extend(batches);
        }

        data.dev_candidates = devs;
        data.influencer_candidates = influencers;

        CollectorResult::new(
            CollectorKind::Social,
            data,
            log,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::Chain;
    use crate::models::types::ContextUpdate;

    fn post(id: &str, user: &str, followers: u64, kind: QueryKind) -> Post {
        Post {
            id: id.into(),
            text: String::new(),
            author: AuthorProfile {
                username: user.into(),
                followers: Some(followers),
                ..AuthorProfile::default()
            },
            likes: 0,
            replies: 0,
            reposts: 0,
            created_at: None,
            kind,
        }
    }

    fn ctx(update: ContextUpdate) -> TokenContext {
        TokenContext::seed("0x4200000000000000000000000000000000000006", Chain::Base)
            .unwrap()
            .enriched(update)
    }

    #[test]
    fn test_initial_queries_full_context() {
        let ctx = ctx(ContextUpdate {
            name: Some("Wrapped Ether".into()),
            symbol: Some("WETH".into()),
            deployer: Some("0xdead".into()),
            ..Default::default()
        });
        let queries = initial_queries(&ctx, &SocialSearchConfig::default());
        let kinds: Vec<QueryKind> = queries.iter().map(|q| q.kind).collect();
        assert_eq!(
            kinds,
            vec![
                QueryKind::Contract,
                QueryKind::Ticker,
                QueryKind::Name,
                QueryKind::Deployer,
                QueryKind::Community
            ]
        );
        assert_eq!(queries[1].query, "$WETH");
        assert_eq!(queries[1].limit, 20);
        assert_eq!(queries[4].query, "Wrapped Ether discord OR telegram OR community");
    }

    #[test]
    fn test_initial_queries_bare_context() {
        let queries = initial_queries(&ctx(ContextUpdate::default()), &SocialSearchConfig::default());
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].kind, QueryKind::Contract);
    }

    #[test]
    fn test_name_equal_to_symbol_skips_name_search() {
        let ctx = ctx(ContextUpdate {
            name: Some("PEPE".into()),
            symbol: Some("pepe".into()),
            ..Default::default()
        });
        let queries = initial_queries(&ctx, &SocialSearchConfig::default());
        assert!(queries.iter().all(|q| q.kind != QueryKind::Name));
    }

    #[test]
    fn test_pick_candidates() {
        let batches = vec![
            SearchBatch {
                query: "0xabc".into(),
                kind: QueryKind::Contract,
                posts: vec![post("1", "Deployer", 10, QueryKind::Contract)],
            },
            SearchBatch {
                query: "$TKN".into(),
                kind: QueryKind::Ticker,
                posts: vec![
                    post("2", "whale", 50_000, QueryKind::Ticker),
                    post("3", "repeat", 5, QueryKind::Ticker),
                    post("4", "repeat", 5, QueryKind::Ticker),
                    post("5", "once", 5, QueryKind::Ticker),
                    post("6", "mid", 2_000, QueryKind::Ticker),
                ],
            },
        ];
        let (devs, influencers) = pick_candidates(&batches, &SocialSearchConfig::default());
        assert_eq!(devs, vec!["repeat", "deployer"]);
        assert_eq!(influencers, vec!["whale", "mid"]);
    }
}
