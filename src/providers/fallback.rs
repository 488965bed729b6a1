//! Fallback Chain - ordered provider clients for one capability.
//!
//! First success wins. On total failure the last failure is returned with
//! every provider tried listed in `attempted`.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::client::ProviderClient;
use crate::models::errors::FailureKind;
use crate::models::types::{ProviderFailure, ProviderId, ProviderResult};

/// Placeholder provider for a chain with no clients
pub const UNCONFIGURED: ProviderId = ProviderId::new("unconfigured");

pub struct FallbackChain<Q, T> {
    clients: Vec<ProviderClient<Q, T>>,
}

impl<Q, T> Clone for FallbackChain<Q, T> {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
        }
    }
}

impl<Q, T> Default for FallbackChain<Q, T> {
    fn default() -> Self {
        Self {
            clients: Vec::new(),
        }
    }
}

impl<Q, T> FallbackChain<Q, T>
where
    Q: Send + Sync,
    T: Send,
{
    pub fn new(clients: Vec<ProviderClient<Q, T>>) -> Self {
        Self { clients }
    }

    pub fn single(client: ProviderClient<Q, T>) -> Self {
        Self {
            clients: vec![client],
        }
    }

    /// Append a lower-priority client
    pub fn with(mut self, client: ProviderClient<Q, T>) -> Self {
        self.clients.push(client);
        self
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Providers in priority order
    pub fn providers(&self) -> Vec<ProviderId> {
        self.clients.iter().map(|c| c.provider()).collect()
    }

    /// Try each client in order until one succeeds
    pub async fn resolve(&self, query: &Q, cancel: &CancellationToken) -> ProviderResult<T> {
        let mut attempted = Vec::with_capacity(self.clients.len());
        let mut last: Option<ProviderFailure> = None;

        for (idx, client) in self.clients.iter().enumerate() {
            if cancel.is_cancelled() {
                let mut failure = ProviderFailure::new(
                    FailureKind::Cancelled,
                    client.provider(),
                    0,
                    "Cancelled before completion",
                );
                failure.attempted = attempted;
                return ProviderResult::Failure(failure);
            }

            attempted.push(client.provider());
            match client.call(query, cancel).await {
                ProviderResult::Success { value, provider } => {
                    if idx > 0 {
                        info!("🔄 Fallback: {} answered after {} failed", provider, idx);
                    }
                    return ProviderResult::Success { value, provider };
                }
                ProviderResult::Failure(mut failure) => {
                    if failure.is_cancelled() {
                        failure.attempted = attempted;
                        return ProviderResult::Failure(failure);
                    }
                    debug!("⚠️ {} failed ({}), trying next", failure.provider, failure.kind);
                    last = Some(failure);
                }
            }
        }

        let mut failure = last.unwrap_or_else(|| {
            ProviderFailure::new(FailureKind::NotFound, UNCONFIGURED, 0, "No provider configured")
        });
        if !attempted.is_empty() {
            failure.attempted = attempted;
        }
        ProviderResult::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::RetryPolicy;
    use crate::models::errors::CallError;
    use crate::providers::client::Endpoint;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    struct Fixed {
        id: ProviderId,
        outcome: Result<&'static str, FailureKind>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Endpoint<(), &'static str> for Fixed {
        fn provider(&self) -> ProviderId {
            self.id
        }

        async fn fetch(&self, _query: &()) -> Result<&'static str, CallError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.map_err(|kind| CallError::new(kind, "fixed failure"))
        }
    }

    fn fixed(name: &'static str, outcome: Result<&'static str, FailureKind>) -> Arc<Fixed> {
        Arc::new(Fixed {
            id: ProviderId::new(name),
            outcome,
            calls: AtomicU32::new(0),
        })
    }

    fn client(endpoint: Arc<Fixed>) -> ProviderClient<(), &'static str> {
        ProviderClient::new(endpoint, RetryPolicy::immediate(0), Arc::new(Semaphore::new(4)))
    }

    #[tokio::test]
    async fn test_nth_provider_wins_with_provenance() {
        let chain = FallbackChain::new(vec![
            client(fixed("a", Err(FailureKind::Unreachable))),
            client(fixed("b", Err(FailureKind::NotFound))),
            client(fixed("c", Ok("third"))),
        ]);

        match chain.resolve(&(), &CancellationToken::new()).await {
            ProviderResult::Success { value, provider } => {
                assert_eq!(value, "third");
                assert_eq!(provider.as_str(), "c");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let backup = fixed("backup", Ok("backup"));
        let chain = FallbackChain::single(client(fixed("primary", Ok("primary"))))
            .with(client(backup.clone()));

        let result = chain.resolve(&(), &CancellationToken::new()).await;
        assert_eq!(result.value(), Some(&"primary"));
        assert_eq!(backup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_fail_lists_attempted() {
        let chain = FallbackChain::new(vec![
            client(fixed("a", Err(FailureKind::RateLimited))),
            client(fixed("b", Err(FailureKind::InvalidResponse))),
        ]);

        let result = chain.resolve(&(), &CancellationToken::new()).await;
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::InvalidResponse);
        assert_eq!(failure.provider.as_str(), "b");
        let names: Vec<_> = failure.attempted.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_cancel_stops_chain() {
        let second = fixed("b", Ok("never"));
        let chain = FallbackChain::single(client(fixed("a", Ok("never"))))
            .with(client(second.clone()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = chain.resolve(&(), &cancel).await;
        assert!(result.failure().unwrap().is_cancelled());
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain: FallbackChain<(), &'static str> = FallbackChain::default();
        let result = chain.resolve(&(), &CancellationToken::new()).await;
        assert_eq!(result.failure().unwrap().provider, UNCONFIGURED);
    }
}
