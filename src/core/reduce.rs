//! Aggregation / Reduction
//!
//! Pure functions from raw collector records to bounded summaries. No I/O,
//! no clock: identical input gives identical output, down to the bytes of
//! the serialized summary. Every list is capped by `ReductionConfig`.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::config::{BotHeuristic, ReductionConfig};
use crate::models::records::{
    AuthorProfile, LabelCategory, LabeledHolder, MarketData, OnchainData, Post, QueryKind,
    SocialData, WebData,
};
use crate::models::summary::{
    AggregatedSocialMetrics, AnalysisSummary, CommunityLinks, DevAccount, DomainReport,
    DomainStatus, FieldFailure, FirstPoster, InfluencerEntry, MarketSummary, OnchainSummary,
    SearchCount, TickerSentiment, TopPost, WebSummary,
};
use crate::models::types::{CollectorResult, FieldStatus, TokenContext};
use crate::providers::rpc::format_units;

// ============================================
// DOMAIN STATUS
// ============================================

pub fn domain_status<D>(result: &CollectorResult<D>) -> DomainStatus {
    if result.fields.is_empty() {
        DomainStatus::Complete
    } else if result.was_cancelled() {
        DomainStatus::Cancelled
    } else if result.is_total_failure() {
        DomainStatus::Failed
    } else if result.is_partial() {
        DomainStatus::Partial
    } else {
        DomainStatus::Complete
    }
}

/// Wrap reduced data with status, failures and per-field sources
pub fn domain_report<D, T>(result: &CollectorResult<D>, reduced: T) -> DomainReport<T> {
    let failures = result
        .fields
        .iter()
        .filter_map(|(field, status)| FieldFailure::from_status(field, status))
        .collect();
    let sources = result
        .fields
        .iter()
        .filter_map(|(field, status)| match status {
            FieldStatus::Success { provider } => Some((field.clone(), *provider)),
            _ => None,
        })
        .collect();

    DomainReport {
        status: domain_status(result),
        data: reduced,
        failures,
        sources,
        elapsed_ms: result.elapsed_ms,
    }
}

// ============================================
// ON-CHAIN
// ============================================

fn quantity(raw: &str) -> U256 {
    U256::from_str(raw).unwrap_or(U256::ZERO)
}

/// Sum of known shares; `None` when no share is known
fn sum_shares<'a>(holders: impl Iterator<Item = &'a LabeledHolder>) -> Option<f64> {
    holders
        .filter_map(|h| h.share_pct)
        .fold(None, |acc, pct| Some(acc.unwrap_or(0.0) + pct))
}

pub fn reduce_onchain(data: &OnchainData, cfg: &ReductionConfig) -> OnchainSummary {
    let token = data.token_info.clone().unwrap_or_default();

    let mut holders: Vec<&LabeledHolder> = data.holders.iter().collect();
    holders.sort_by(|a, b| {
        quantity(&b.quantity)
            .cmp(&quantity(&a.quantity))
            .then_with(|| a.address.cmp(&b.address))
    });

    let top10_share_pct = sum_shares(holders.iter().copied().take(10));
    let pool_share_pct = sum_shares(
        holders
            .iter()
            .copied()
            .filter(|h| h.category == LabelCategory::Pool),
    );

    let total_supply_display = match (&token.total_supply, token.decimals) {
        (Some(raw), Some(decimals)) => format_units(raw, decimals),
        _ => None,
    };

    OnchainSummary {
        name: token.name,
        symbol: token.symbol,
        decimals: token.decimals,
        total_supply: token.total_supply,
        total_supply_display,
        verified: data.source.as_ref().map(|s| s.verified),
        contract_name: data.source.as_ref().and_then(|s| s.contract_name.clone()),
        proxy: data.source.as_ref().map(|s| s.proxy),
        implementation: data.source.as_ref().and_then(|s| s.implementation.clone()),
        source_snippet: data.source.as_ref().and_then(|s| s.source_snippet.clone()),
        deployer: data.deployer.as_ref().map(|d| d.address.clone()),
        deployer_is_contract: data.deployer.as_ref().and_then(|d| d.is_contract),
        creation_tx: data.creation.as_ref().and_then(|c| c.tx_hash.clone()),
        holders_fetched: data.holders.len(),
        top_holders: holders
            .into_iter()
            .take(cfg.max_holders)
            .cloned()
            .collect(),
        top10_share_pct,
        pool_share_pct,
    }
}

// ============================================
// MARKET / WEB
// ============================================

pub fn reduce_market(data: &MarketData, cfg: &ReductionConfig) -> MarketSummary {
    MarketSummary {
        price_usd: data.price_usd,
        market_cap: data.market_cap,
        fdv: data.fdv,
        volume_24h: data.volume_24h,
        liquidity_usd: data.liquidity_usd,
        price_change_1h: data.price_change_1h,
        price_change_24h: data.price_change_24h,
        dex_url: data.dex_url.clone(),
        pair_count: data.pairs.len(),
        top_pairs: data.pairs.iter().take(cfg.max_pairs).cloned().collect(),
        twitter_handle: data.socials.twitter_handle.clone(),
        website: data.socials.website.clone(),
    }
}

pub fn reduce_web(data: &WebData, cfg: &ReductionConfig) -> WebSummary {
    WebSummary {
        total_results: data.total_results,
        website: data.website.clone(),
        audits: data.audits.iter().take(cfg.max_audits).cloned().collect(),
        news: data.news.iter().take(cfg.max_news).cloned().collect(),
    }
}

// ============================================
// SOCIAL
// ============================================

/// Deduplicate posts across searches; first occurrence wins
pub fn dedupe_posts(data: &SocialData) -> Vec<&Post> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::new();
    for batch in &data.searches {
        for post in &batch.posts {
            let key = if post.id.is_empty() {
                format!("{}\n{}", post.author.username.to_lowercase(), post.text)
            } else {
                post.id.clone()
            };
            if seen.insert(key) {
                out.push(post);
            }
        }
    }
    out
}

fn age_days(profile: &AuthorProfile, as_of: DateTime<Utc>) -> Option<i64> {
    profile.created_at.map(|c| (as_of - c).num_days())
}

/// Count the bot signals that fire for one author
pub fn bot_signals(profile: &AuthorProfile, as_of: DateTime<Utc>, h: &BotHeuristic) -> u8 {
    let mut signals = 0;
    let age = age_days(profile, as_of);

    if age.is_some_and(|a| a < h.min_account_age_days) {
        signals += 1;
    }

    if let (Some(followers), Some(following)) = (profile.followers, profile.following) {
        let suspicious = if followers == 0 {
            following > 0
        } else {
            following as f64 / followers as f64 > h.max_following_ratio
        };
        if suspicious {
            signals += 1;
        }
    }

    if let (Some(posts), Some(age)) = (profile.post_count, age) {
        if posts as f64 / age.max(1) as f64 > h.max_posts_per_day {
            signals += 1;
        }
    }
    signals
}

pub fn is_bot(profile: &AuthorProfile, as_of: DateTime<Utc>, h: &BotHeuristic) -> bool {
    bot_signals(profile, as_of, h) >= h.min_signals
}

/// `@handle` mentions, lowercase, 1-15 word characters
pub fn scan_mentions(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '@' {
            continue;
        }
        let mut handle = String::new();
        while let Some((_, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || *next == '_' {
                if handle.len() < 15 {
                    handle.push(next.to_ascii_lowercase());
                }
                chars.next();
            } else {
                break;
            }
        }
        if !handle.is_empty() {
            out.push(handle);
        }
    }
    out
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn community_links(posts: &[&Post]) -> CommunityLinks {
    let mut links = CommunityLinks::default();
    for post in posts.iter().filter(|p| p.kind == QueryKind::Community) {
        let text = post.text.to_lowercase();
        if text.contains("discord.gg/") || text.contains("discord.com/") {
            links.discord = true;
        }
        if text.contains("t.me/") || text.contains("telegram") {
            links.telegram = true;
        }
    }
    links
}

fn ticker_sentiment(data: &SocialData) -> Option<TickerSentiment> {
    let batch = data.searches.iter().find(|b| b.kind == QueryKind::Ticker)?;
    let posts = batch.posts.len();
    let authors: BTreeSet<String> = batch
        .posts
        .iter()
        .map(|p| p.author.username.to_lowercase())
        .filter(|u| !u.is_empty())
        .collect();
    let likes: u64 = batch.posts.iter().map(|p| p.likes).sum();
    let reposts: u64 = batch.posts.iter().map(|p| p.reposts).sum();
    let total: u64 = batch.posts.iter().map(Post::engagement).sum();

    Some(TickerSentiment {
        posts,
        unique_authors: authors.len(),
        likes,
        reposts,
        avg_engagement: if posts == 0 { 0.0 } else { total as f64 / posts as f64 },
        organic: authors.len() as f64 > posts as f64 * 0.5,
    })
}

fn cmp_followers_desc(a: (&str, u64), b: (&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

pub fn reduce_social(data: &SocialData, cfg: &ReductionConfig) -> AggregatedSocialMetrics {
    let posts = dedupe_posts(data);
    let contract = data.contract_address.to_lowercase();

    // Best-known profile per author: resolved lookup, else search snapshot
    let mut authors: BTreeMap<String, &AuthorProfile> = BTreeMap::new();
    let mut posts_by_author: BTreeMap<String, usize> = BTreeMap::new();
    for post in &posts {
        let user = post.author.username.to_lowercase();
        if user.is_empty() {
            continue;
        }
        *posts_by_author.entry(user.clone()).or_default() += 1;
        let profile = data.profiles.get(&user).unwrap_or(&post.author);
        authors.entry(user).or_insert(profile);
    }

    let bots: BTreeSet<&str> = authors
        .iter()
        .filter(|(_, p)| is_bot(p, data.as_of, &cfg.bot))
        .map(|(user, _)| user.as_str())
        .collect();
    let bot_authors = bots.len();
    let organic_authors = authors.len() - bot_authors;

    // Engagement and influence count organic authors only
    let rates: Vec<f64> = posts
        .iter()
        .filter_map(|p| {
            let user = p.author.username.to_lowercase();
            if bots.contains(user.as_str()) {
                return None;
            }
            let followers = authors
                .get(&user)
                .and_then(|a| a.followers)
                .or(p.author.followers)?;
            (followers > 0).then(|| p.engagement() as f64 / followers as f64)
        })
        .collect();
    let engagement_rate = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    let first_poster = posts
        .iter()
        .filter(|p| p.kind == QueryKind::Contract || p.text.to_lowercase().contains(&contract))
        .filter_map(|p| p.created_at.map(|t| (t, p)))
        .min_by(|(ta, a), (tb, b)| {
            ta.cmp(tb)
                .then_with(|| a.author.username.cmp(&b.author.username))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|(posted_at, p)| FirstPoster::Known {
            username: p.author.username.clone(),
            post_id: p.id.clone(),
            posted_at,
        })
        .unwrap_or(FirstPoster::None);

    let mut ranked: Vec<(&String, &&AuthorProfile)> = authors
        .iter()
        .filter(|(user, p)| p.followers.is_some() && !bots.contains(user.as_str()))
        .collect();
    ranked.sort_by(|a, b| {
        cmp_followers_desc(
            (a.0.as_str(), a.1.followers.unwrap_or(0)),
            (b.0.as_str(), b.1.followers.unwrap_or(0)),
        )
    });
    let top_influencers = ranked
        .into_iter()
        .take(cfg.max_influencers)
        .map(|(_, p)| InfluencerEntry {
            username: p.username.clone(),
            followers: p.followers.unwrap_or(0),
            verified: p.verified,
        })
        .collect();

    let mut by_engagement = posts.clone();
    by_engagement.sort_by(|a, b| b.engagement().cmp(&a.engagement()).then_with(|| a.id.cmp(&b.id)));
    let top_posts = by_engagement
        .into_iter()
        .take(cfg.max_posts)
        .map(|p| TopPost {
            id: p.id.clone(),
            author: p.author.username.clone(),
            text: truncate_chars(&p.text, cfg.max_post_chars),
            engagement: p.engagement(),
            posted_at: p.created_at,
        })
        .collect();

    let dev_accounts: Vec<DevAccount> = data
        .dev_candidates
        .iter()
        .filter_map(|user| {
            let profile = data.profiles.get(&user.to_lowercase())?;
            Some(DevAccount {
                username: profile.username.clone(),
                followers: profile.followers,
                verified: profile.verified,
                account_age_days: age_days(profile, data.as_of),
                posts_found: posts_by_author.get(&user.to_lowercase()).copied().unwrap_or(0),
            })
        })
        .take(cfg.max_dev_accounts)
        .collect();

    let official_account = data
        .twitter_handle
        .as_ref()
        .and_then(|h| data.profiles.get(&h.to_lowercase()))
        .map(|p| p.username.clone())
        .or_else(|| {
            dev_accounts
                .iter()
                .min_by(|a, b| {
                    cmp_followers_desc(
                        (a.username.as_str(), a.followers.unwrap_or(0)),
                        (b.username.as_str(), b.followers.unwrap_or(0)),
                    )
                })
                .map(|d| d.username.clone())
        });

    let linked_accounts: Vec<String> = posts
        .iter()
        .flat_map(|p| scan_mentions(&p.text))
        .collect::<BTreeSet<String>>()
        .into_iter()
        .take(cfg.max_linked_accounts)
        .collect();

    let searches = data
        .searches
        .iter()
        .map(|b| SearchCount {
            kind: b.kind,
            query: b.query.clone(),
            posts: b.posts.len(),
        })
        .collect();

    AggregatedSocialMetrics {
        total_posts: posts.len(),
        unique_authors: authors.len(),
        engagement_rate,
        organic_authors,
        bot_authors,
        organic_ratio: if authors.is_empty() {
            0.0
        } else {
            organic_authors as f64 / authors.len() as f64
        },
        first_poster,
        top_influencers,
        top_posts,
        dev_accounts,
        official_account,
        community: community_links(&posts),
        linked_accounts,
        searches,
        ticker: ticker_sentiment(data),
    }
}

// ============================================
// SUMMARY
// ============================================

/// Raw results of one run, as handed to the reducer
pub struct RunRecords<'a> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub complete: bool,
    pub context: &'a TokenContext,
    pub onchain: &'a CollectorResult<OnchainData>,
    pub market: &'a CollectorResult<MarketData>,
    pub social: &'a CollectorResult<SocialData>,
    pub web: &'a CollectorResult<WebData>,
}

pub fn build_summary(records: RunRecords<'_>, cfg: &ReductionConfig) -> AnalysisSummary {
    AnalysisSummary {
        run_id: records.run_id,
        address: records.context.address.clone(),
        chain: records.context.chain,
        started_at: records.started_at,
        complete: records.complete,
        context: records.context.clone(),
        onchain: domain_report(records.onchain, reduce_onchain(&records.onchain.data, cfg)),
        market: domain_report(records.market, reduce_market(&records.market.data, cfg)),
        social: domain_report(records.social, reduce_social(&records.social.data, cfg)),
        web: domain_report(records.web, reduce_web(&records.web.data, cfg)),
        launchpad: records.onchain.data.launchpad.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::{LabelConfidence, SearchBatch};
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn author(name: &str, followers: Option<u64>) -> AuthorProfile {
        AuthorProfile {
            username: name.into(),
            followers,
            ..AuthorProfile::default()
        }
    }

    fn post(id: &str, user: &str, text: &str, kind: QueryKind, likes: u64) -> Post {
        Post {
            id: id.into(),
            text: text.into(),
            author: author(user, Some(100)),
            likes,
            replies: 0,
            reposts: 0,
            created_at: None,
            kind,
        }
    }

    fn social(batches: Vec<SearchBatch>) -> SocialData {
        let mut data = SocialData::empty(as_of(), "0xabc");
        data.searches = batches;
        data
    }

    #[test]
    fn test_bot_signals() {
        let h = BotHeuristic::default();
        let fresh_spammer = AuthorProfile {
            username: "spam".into(),
            followers: Some(10),
            following: Some(5000),
            post_count: Some(10_000),
            created_at: Some(as_of() - Duration::days(5)),
            ..AuthorProfile::default()
        };
        assert_eq!(bot_signals(&fresh_spammer, as_of(), &h), 3);
        assert!(is_bot(&fresh_spammer, as_of(), &h));

        let veteran = AuthorProfile {
            username: "vet".into(),
            followers: Some(5000),
            following: Some(300),
            post_count: Some(20_000),
            created_at: Some(as_of() - Duration::days(2000)),
            ..AuthorProfile::default()
        };
        assert_eq!(bot_signals(&veteran, as_of(), &h), 0);

        // nothing known, nothing fires
        assert_eq!(bot_signals(&author("ghost", None), as_of(), &h), 0);
    }

    #[test]
    fn test_bot_authors_excluded_from_influence() {
        let mut farm = post("1", "farm", "$TKN to the moon", QueryKind::Ticker, 900_000);
        farm.author = AuthorProfile {
            username: "farm".into(),
            followers: Some(900_000),
            following: Some(50),
            post_count: Some(50_000),
            created_at: Some(as_of() - Duration::days(3)),
            ..AuthorProfile::default()
        };
        let mut analyst = post("2", "analyst", "$TKN thread", QueryKind::Ticker, 20);
        analyst.author = AuthorProfile {
            username: "analyst".into(),
            followers: Some(2_000),
            following: Some(400),
            post_count: Some(3_000),
            created_at: Some(as_of() - Duration::days(1500)),
            ..AuthorProfile::default()
        };

        let organic_only = social(vec![SearchBatch {
            query: "$TKN".into(),
            kind: QueryKind::Ticker,
            posts: vec![analyst.clone()],
        }]);
        let with_farm = social(vec![SearchBatch {
            query: "$TKN".into(),
            kind: QueryKind::Ticker,
            posts: vec![farm, analyst],
        }]);
        let cfg = ReductionConfig::default();
        let baseline = reduce_social(&organic_only, &cfg);
        let m = reduce_social(&with_farm, &cfg);

        assert_eq!(m.bot_authors, 1);
        assert_eq!(m.organic_authors, 1);
        assert_eq!(m.unique_authors, 2);
        let names: Vec<&str> = m.top_influencers.iter().map(|i| i.username.as_str()).collect();
        assert_eq!(names, vec!["analyst"]);
        assert!((m.engagement_rate - 0.01).abs() < 1e-9);
        assert_eq!(m.engagement_rate, baseline.engagement_rate);
    }

    #[test]
    fn test_scan_mentions() {
        let got = scan_mentions("gm @Alice and @bob_99! email a@b, @ alone, @averyveryverylonghandle");
        assert_eq!(got, vec!["alice", "bob_99", "b", "averyveryverylo"]);
    }

    #[test]
    fn test_dedupe_and_first_poster() {
        let mut early = post("2", "early", "0xABC is live", QueryKind::Ticker, 0);
        early.created_at = Some(as_of() - Duration::hours(5));
        let mut late = post("1", "late", "contract", QueryKind::Contract, 0);
        late.created_at = Some(as_of() - Duration::hours(1));
        let unrelated = {
            let mut p = post("3", "first_but_unrelated", "gm", QueryKind::Ticker, 0);
            p.created_at = Some(as_of() - Duration::hours(10));
            p
        };

        let data = social(vec![
            SearchBatch {
                query: "0xabc".into(),
                kind: QueryKind::Contract,
                posts: vec![late.clone()],
            },
            SearchBatch {
                query: "$TKN".into(),
                kind: QueryKind::Ticker,
                posts: vec![early, unrelated, late],
            },
        ]);
        let m = reduce_social(&data, &ReductionConfig::default());
        assert_eq!(m.total_posts, 3);
        match m.first_poster {
            FirstPoster::Known { username, post_id, .. } => {
                assert_eq!(username, "early");
                assert_eq!(post_id, "2");
            }
            FirstPoster::None => panic!("expected a first poster"),
        }
    }

    #[test]
    fn test_zero_posts() {
        let m = reduce_social(&social(Vec::new()), &ReductionConfig::default());
        assert_eq!(m.unique_authors, 0);
        assert_eq!(m.first_poster, FirstPoster::None);
        assert_eq!(m.engagement_rate, 0.0);
        assert!(m.ticker.is_none());
    }

    #[test]
    fn test_caps_hold_for_large_input() {
        let posts: Vec<Post> = (0..10_000)
            .map(|i| {
                let mut p = post(
                    &i.to_string(),
                    &format!("user{}", i),
                    &format!("{} @mention{}", "x".repeat(500), i),
                    QueryKind::Ticker,
                    i as u64,
                );
                p.author.followers = Some(i as u64);
                p
            })
            .collect();
        let data = social(vec![SearchBatch {
            query: "$TKN".into(),
            kind: QueryKind::Ticker,
            posts,
        }]);
        let cfg = ReductionConfig::default();
        let m = reduce_social(&data, &cfg);

        assert_eq!(m.total_posts, 10_000);
        assert_eq!(m.top_influencers.len(), cfg.max_influencers);
        assert_eq!(m.top_influencers[0].username, "user9999");
        assert_eq!(m.top_posts.len(), cfg.max_posts);
        assert!(m.top_posts.iter().all(|p| p.text.chars().count() <= cfg.max_post_chars));
        assert_eq!(m.linked_accounts.len(), cfg.max_linked_accounts);
        let ticker = m.ticker.unwrap();
        assert!(ticker.organic);
        assert_eq!(ticker.unique_authors, 10_000);
    }

    #[test]
    fn test_reduce_social_is_deterministic() {
        let data = social(vec![SearchBatch {
            query: "$TKN".into(),
            kind: QueryKind::Community,
            posts: vec![
                post("1", "a", "join discord.gg/tkn @Proj", QueryKind::Community, 3),
                post("2", "b", "t.me/tkn", QueryKind::Community, 3),
            ],
        }]);
        let cfg = ReductionConfig::default();
        let first = serde_json::to_string(&reduce_social(&data, &cfg)).unwrap();
        let second = serde_json::to_string(&reduce_social(&data, &cfg)).unwrap();
        assert_eq!(first, second);

        let m = reduce_social(&data, &cfg);
        assert!(m.community.discord && m.community.telegram);
        assert_eq!(m.linked_accounts, vec!["proj"]);
        // equal engagement, id breaks the tie
        assert_eq!(m.top_posts[0].id, "1");
    }

    #[test]
    fn test_official_account_prefers_market_handle() {
        let mut data = social(Vec::new());
        data.twitter_handle = Some("Project".into());
        data.profiles.insert("project".into(), author("Project", Some(10)));
        data.profiles.insert("dev".into(), author("dev", Some(99_999)));
        data.dev_candidates = vec!["dev".into()];
        let m = reduce_social(&data, &ReductionConfig::default());
        assert_eq!(m.official_account.as_deref(), Some("Project"));

        data.profiles.remove("project");
        let m = reduce_social(&data, &ReductionConfig::default());
        assert_eq!(m.official_account.as_deref(), Some("dev"));
        assert_eq!(m.dev_accounts.len(), 1);
    }

    #[test]
    fn test_reduce_onchain_orders_and_caps_holders() {
        let holder = |addr: &str, qty: &str, pct: f64, category| LabeledHolder {
            address: addr.into(),
            quantity: qty.into(),
            share_pct: Some(pct),
            category,
            confidence: LabelConfidence::High,
            name: None,
            is_contract: None,
        };
        let data = OnchainData {
            holders: vec![
                holder("0x1", "100", 10.0, LabelCategory::Unlabeled),
                holder("0x2", "500", 50.0, LabelCategory::Pool),
                holder("0x3", "400", 40.0, LabelCategory::Vesting),
            ],
            ..OnchainData::default()
        };
        let cfg = ReductionConfig {
            max_holders: 2,
            ..ReductionConfig::default()
        };
        let s = reduce_onchain(&data, &cfg);
        assert_eq!(s.holders_fetched, 3);
        assert_eq!(s.top_holders.len(), 2);
        assert_eq!(s.top_holders[0].address, "0x2");
        assert_eq!(s.top10_share_pct, Some(100.0));
        assert_eq!(s.pool_share_pct, Some(50.0));
    }
}
