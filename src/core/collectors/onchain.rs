//! On-chain collector
//!
//! Independent reads first (token info, verification, holders, creation),
//! then the steps that need them: deployer bytecode for the launchpad match
//! and labels for the holder addresses.

use alloy_primitives::U256;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Budget, Collector};
use crate::core::label_resolver::LabelResolver;
use crate::core::launchpad::LaunchpadRegistry;
use crate::models::errors::FailureKind;
use crate::models::records::{
    CodeInfo, ContractCreation, DeployerInfo, HolderEntry, LabeledAddress, LabeledHolder,
    OnchainData, SourceInfo, TokenInfo,
};
use crate::models::types::{
    CollectorKind, CollectorResult, FieldLog, FieldStatus, ProviderId, TokenContext,
};
use crate::providers::fallback::{FallbackChain, UNCONFIGURED};
use crate::utils::constants::ZERO_ADDRESS;

/// Provider chains the on-chain collector reads from
pub struct OnchainSources {
    pub token_info: FallbackChain<String, TokenInfo>,
    pub source: FallbackChain<String, SourceInfo>,
    pub holders: FallbackChain<String, Vec<HolderEntry>>,
    pub creation: FallbackChain<String, ContractCreation>,
    /// Runtime bytecode of the deployer
    pub code: FallbackChain<String, CodeInfo>,
}

pub struct OnchainCollector {
    sources: OnchainSources,
    labels: LabelResolver,
    registry: Arc<LaunchpadRegistry>,
    budget: Duration,
}

impl OnchainCollector {
    pub fn new(
        sources: OnchainSources,
        labels: LabelResolver,
        registry: Arc<LaunchpadRegistry>,
        budget: Duration,
    ) -> Self {
        Self {
            sources,
            labels,
            registry,
            budget,
        }
    }
}

#[async_trait]
impl Collector for OnchainCollector {
    type Output = OnchainData;

    fn kind(&self) -> CollectorKind {
        CollectorKind::Onchain
    }

    async fn collect(
        &self,
        ctx: Arc<TokenContext>,
        cancel: &CancellationToken,
    ) -> CollectorResult<OnchainData> {
        let started = Instant::now();
        let budget = Budget::start(cancel, self.budget);
        let cancel = budget.token();
        let token = ctx.address.clone();

        info!("⛓️ Onchain: collecting {} on {}", token, ctx.chain);

        let (token_info, source, holders, creation) = tokio::join!(
            self.sources.token_info.resolve(&token, cancel),
            self.sources.source.resolve(&token, cancel),
            self.sources.holders.resolve(&token, cancel),
            self.sources.creation.resolve(&token, cancel),
        );

        let mut log = FieldLog::default();
        let mut data = OnchainData {
            token_info: log.record("token_info", token_info),
            source: log.record("source", source),
            ..OnchainData::default()
        };
        let holders: Vec<HolderEntry> = log
            .record("holders", holders)
            .unwrap_or_default()
            .into_iter()
            .filter(|h| h.address != ZERO_ADDRESS)
            .collect();
        data.creation = log.record("creation", creation);

        // Dependent step: deployer bytecode and holder labels
        let deployer = data.creation.as_ref().map(|c| c.creator.clone());
        let holder_set: BTreeSet<String> = holders.iter().map(|h| h.address.clone()).collect();

        let code_fut = async {
            match &deployer {
                Some(addr) => Some(self.sources.code.resolve(addr, cancel).await),
                None => None,
            }
        };
        let labels_fut = async {
            if holder_set.is_empty() {
                None
            } else {
                Some(self.labels.label_all(&holder_set, cancel).await)
            }
        };
        let (code, labels) = tokio::join!(code_fut, labels_fut);

        let code = code.and_then(|result| log.record("deployer_code", result));
        if let Some(creation) = &data.creation {
            data.deployer = Some(DeployerInfo {
                address: creation.creator.clone(),
                creation_tx: creation.tx_hash.clone(),
                is_contract: code.as_ref().map(|c| c.is_contract),
                code_signature: code.and_then(|c| c.code_signature),
            });
        }

        let labels = match labels {
            Some(labels) => {
                log.set("labels", labels_status(&labels, &self.labels.providers()));
                labels
            }
            None => BTreeMap::new(),
        };

        let total_supply = data
            .token_info
            .as_ref()
            .and_then(|t| t.total_supply.as_deref());
        data.holders = join_labels(holders, &labels, total_supply);

        data.launchpad = data.deployer.as_ref().and_then(|d| {
            self.registry
                .lookup(ctx.chain, Some(&d.address), d.code_signature.as_deref())
        });
        if let Some(pad) = &data.launchpad {
            info!("🚀 Onchain: deployer matches launchpad {}", pad.name);
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            "⛓️ Onchain: {} holders, deployer={:?} in {}ms",
            data.holders.len(),
            data.deployer.as_ref().map(|d| d.address.as_str()),
            elapsed_ms
        );
        CollectorResult::new(CollectorKind::Onchain, data, log, elapsed_ms)
    }
}

/// Field status for a batch of label lookups
fn labels_status(labels: &BTreeMap<String, LabeledAddress>, providers: &[ProviderId]) -> FieldStatus {
    if let Some(provider) = labels.values().find_map(|l| l.source) {
        return FieldStatus::Success { provider };
    }

    let provider = providers.last().copied().unwrap_or(UNCONFIGURED);
    let failures: Vec<FailureKind> = labels.values().filter_map(|l| l.failure).collect();
    if failures.contains(&FailureKind::Cancelled) {
        return FieldStatus::Cancelled { provider };
    }
    FieldStatus::Failed {
        kind: failures.first().copied().unwrap_or(FailureKind::NotFound),
        provider,
        attempts: 0,
        attempted: providers.to_vec(),
        message: format!("{} label lookups failed", failures.len()),
    }
}

/// Holder share of supply in percent
pub fn share_pct(quantity: &str, total_supply: Option<&str>) -> Option<f64> {
    let qty = U256::from_str(quantity).ok()?;
    let supply = U256::from_str(total_supply?).ok()?;
    if supply.is_zero() {
        return None;
    }
    let qty: f64 = qty.to_string().parse().ok()?;
    let supply: f64 = supply.to_string().parse().ok()?;
    Some(qty / supply * 100.0)
}

fn join_labels(
    holders: Vec<HolderEntry>,
    labels: &BTreeMap<String, LabeledAddress>,
    total_supply: Option<&str>,
) -> Vec<LabeledHolder> {
    holders
        .into_iter()
        .map(|h| {
            let label = labels
                .get(&h.address)
                .cloned()
                .unwrap_or_else(|| LabeledAddress::unresolved(h.address.clone(), FailureKind::NotFound));
            LabeledHolder {
                share_pct: share_pct(&h.quantity, total_supply),
                address: h.address,
                quantity: h.quantity,
                category: label.category,
                confidence: label.confidence,
                name: label.name,
                is_contract: label.is_contract,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::{LabelCategory, LabelConfidence};

    #[test]
    fn test_share_pct() {
        let pct = share_pct("250", Some("1000")).unwrap();
        assert!((pct - 25.0).abs() < 1e-9);
        assert!(share_pct("1", Some("0")).is_none());
        assert!(share_pct("1", None).is_none());
        assert!(share_pct("abc", Some("10")).is_none());
    }

    #[test]
    fn test_labels_status_success_when_any_resolved() {
        let mut labels = BTreeMap::new();
        labels.insert(
            "0xa".to_string(),
            LabeledAddress::unresolved("0xa", FailureKind::Unreachable),
        );
        labels.insert(
            "0xb".to_string(),
            LabeledAddress {
                address: "0xb".into(),
                category: LabelCategory::Pool,
                confidence: LabelConfidence::High,
                source: Some(ProviderId::BLOCKSCOUT),
                name: Some("Pool".into()),
                is_contract: Some(true),
                failure: None,
            },
        );
        assert!(labels_status(&labels, &[ProviderId::BLOCKSCOUT]).is_success());
    }

    #[test]
    fn test_labels_status_all_failed() {
        let mut labels = BTreeMap::new();
        labels.insert(
            "0xa".to_string(),
            LabeledAddress::unresolved("0xa", FailureKind::Unreachable),
        );
        let status = labels_status(&labels, &[ProviderId::BLOCKSCOUT]);
        assert!(matches!(
            status,
            FieldStatus::Failed {
                kind: FailureKind::Unreachable,
                ..
            }
        ));
    }
}
