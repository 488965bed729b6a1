//! Provider Client - retry, backoff, timeout and concurrency cap around one
//! external data provider.
//!
//! Backoff follows the Alchemy retry guide the RPC layer was first written
//! against: `base * 2^(n-1)` capped at `max_backoff`, with ±jitter so that
//! parallel callers do not retry in lockstep.

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::config::{AnalysisConfig, ProviderSettings, RetryPolicy};
use crate::models::errors::{CallError, FailureKind};
use crate::models::types::{ProviderFailure, ProviderId, ProviderResult};

// ============================================
// ENDPOINT SEAM
// ============================================

/// One capability of one provider: turns a query into a typed value.
///
/// Implementations do a single attempt and classify failures; retries,
/// timeouts and concurrency are the client's job.
#[async_trait]
pub trait Endpoint<Q, T>: Send + Sync
where
    Q: Send + Sync,
    T: Send,
{
    fn provider(&self) -> ProviderId;

    async fn fetch(&self, query: &Q) -> Result<T, CallError>;
}

// ============================================
// CONCURRENCY LIMITS
// ============================================

/// Per-provider semaphores shared by every client of a run
#[derive(Debug, Default)]
pub struct ProviderLimits {
    permits: DashMap<ProviderId, Arc<Semaphore>>,
    settings: DashMap<ProviderId, ProviderSettings>,
    default_settings: ProviderSettings,
}

impl ProviderLimits {
    pub fn new(default_settings: ProviderSettings) -> Self {
        Self {
            permits: DashMap::new(),
            settings: DashMap::new(),
            default_settings,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        let limits = Self::new(config.default_provider);
        for (id, settings) in &config.providers {
            limits.settings.insert(*id, *settings);
        }
        limits
    }

    pub fn settings(&self, id: ProviderId) -> ProviderSettings {
        self.settings
            .get(&id)
            .map(|s| *s)
            .unwrap_or(self.default_settings)
    }

    /// Semaphore for a provider, created on first use
    pub fn semaphore(&self, id: ProviderId) -> Arc<Semaphore> {
        let permits = self.settings(id).concurrency.max(1);
        self.permits
            .entry(id)
            .or_insert_with(|| Arc::new(Semaphore::new(permits)))
            .clone()
    }

    /// Wrap an endpoint in a client using this registry's settings
    pub fn client<Q, T>(&self, endpoint: Arc<dyn Endpoint<Q, T>>) -> ProviderClient<Q, T>
    where
        Q: Send + Sync,
        T: Send,
    {
        let id = endpoint.provider();
        ProviderClient::new(endpoint, self.settings(id).policy, self.semaphore(id))
    }
}

// ============================================
// BACKOFF
// ============================================

/// Delay before retry number `retry` (1-based) after a failure of `kind`
pub fn backoff_delay(policy: &RetryPolicy, retry: u32, kind: FailureKind) -> Duration {
    let base = if kind == FailureKind::RateLimited {
        policy.rate_limit_backoff
    } else {
        policy.base_backoff
    };

    let base_ms = base.as_millis() as u64;
    let factor = 2_u64.saturating_pow(retry.saturating_sub(1));
    let capped = base_ms
        .saturating_mul(factor)
        .min(policy.max_backoff.as_millis() as u64);

    // ±jitter to prevent thundering herd
    let jitter_range = (capped * policy.jitter_percent) / 100;
    let jitter: i64 = if jitter_range == 0 {
        0
    } else {
        rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64))
    };

    Duration::from_millis((capped as i64 + jitter).max(0) as u64)
}

// ============================================
// PROVIDER CLIENT
// ============================================

/// Retrying wrapper around one `Endpoint`
pub struct ProviderClient<Q, T> {
    endpoint: Arc<dyn Endpoint<Q, T>>,
    policy: RetryPolicy,
    limiter: Arc<Semaphore>,
}

impl<Q, T> Clone for ProviderClient<Q, T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
            policy: self.policy,
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<Q, T> ProviderClient<Q, T>
where
    Q: Send + Sync,
    T: Send,
{
    pub fn new(endpoint: Arc<dyn Endpoint<Q, T>>, policy: RetryPolicy, limiter: Arc<Semaphore>) -> Self {
        Self {
            endpoint,
            policy,
            limiter,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.endpoint.provider()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call the provider, retrying transient failures.
    ///
    /// Never panics and never returns early without a typed outcome. A
    /// cancelled token yields `Failure(Cancelled)` as soon as it is observed.
    pub async fn call(&self, query: &Q, cancel: &CancellationToken) -> ProviderResult<T> {
        let provider = self.provider();
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return cancelled(provider, attempts);
            }
            attempts += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CallError::cancelled()),
                result = self.attempt(query) => result,
            };

            let err = match outcome {
                Ok(value) => return ProviderResult::success(value, provider),
                Err(err) => err,
            };

            if err.kind == FailureKind::Cancelled {
                return cancelled(provider, attempts);
            }

            if !err.kind.is_retryable() || attempts > self.policy.max_retries {
                debug!(
                    "❌ {}: giving up after {} attempt(s): {}",
                    provider, attempts, err
                );
                return ProviderResult::Failure(ProviderFailure::new(
                    err.kind,
                    provider,
                    attempts,
                    err.message,
                ));
            }

            let delay = backoff_delay(&self.policy, attempts, err.kind);
            if err.kind == FailureKind::RateLimited {
                warn!(
                    "⏳ {}: rate limited, backing off {}ms (attempt {}/{})",
                    provider,
                    delay.as_millis(),
                    attempts,
                    self.policy.max_retries + 1
                );
            } else {
                debug!(
                    "⏳ {}: retry {}/{} after {}ms ({})",
                    provider,
                    attempts,
                    self.policy.max_retries,
                    delay.as_millis(),
                    err
                );
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(provider, attempts),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One attempt: permit, then fetch under the per-attempt timeout
    async fn attempt(&self, query: &Q) -> Result<T, CallError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| CallError::unreachable("provider limiter closed"))?;

        match tokio::time::timeout(self.policy.timeout, self.endpoint.fetch(query)).await {
            Ok(result) => result,
            Err(_) => Err(CallError::unreachable(format!(
                "Request timeout after {}ms",
                self.policy.timeout.as_millis()
            ))),
        }
    }
}

fn cancelled<T>(provider: ProviderId, attempts: u32) -> ProviderResult<T> {
    ProviderResult::Failure(ProviderFailure::new(
        FailureKind::Cancelled,
        provider,
        attempts,
        "Cancelled before completion",
    ))
}
