//! Label Resolver
//!
//! Turns holder addresses into semantic labels (Pool / Vesting / Multisig)
//! using the address-metadata fallback chain. Lookups run with bounded
//! parallelism; a failed lookup never fails the batch.

use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::records::{AddressLabel, LabelCategory, LabelConfidence, LabeledAddress};
use crate::models::types::{ProviderId, ProviderResult};
use crate::providers::fallback::FallbackChain;

/// Keyword table, checked in order; first hit wins
const CATEGORY_KEYWORDS: &[(LabelCategory, &[&str])] = &[
    (
        LabelCategory::Pool,
        &["pool", "pair", "position manager", "positionmanager", "lp token"],
    ),
    (LabelCategory::Vesting, &["vesting", "timelock", "lock"]),
    (LabelCategory::Multisig, &["multisig", "gnosis safe", "safe"]),
];

/// Classify provider metadata by case-insensitive keyword match
pub fn classify(label: &AddressLabel) -> (LabelCategory, LabelConfidence) {
    let mut haystack = label.name.clone().unwrap_or_default().to_lowercase();
    for tag in &label.tags {
        haystack.push(' ');
        haystack.push_str(&tag.to_lowercase());
    }

    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| haystack.contains(k)) {
            return (*category, LabelConfidence::High);
        }
    }
    (LabelCategory::Unlabeled, LabelConfidence::Low)
}

pub struct LabelResolver {
    chain: FallbackChain<String, AddressLabel>,
    concurrency: usize,
}

impl LabelResolver {
    pub fn new(chain: FallbackChain<String, AddressLabel>, concurrency: usize) -> Self {
        Self {
            chain,
            concurrency: concurrency.max(1),
        }
    }

    /// Label providers in priority order
    pub fn providers(&self) -> Vec<ProviderId> {
        self.chain.providers()
    }

    /// Resolve one address; never fails
    pub async fn label(&self, address: &str, cancel: &CancellationToken) -> LabeledAddress {
        let key = address.to_lowercase();
        match self.chain.resolve(&key, cancel).await {
            ProviderResult::Success { value, provider } => {
                let (category, confidence) = classify(&value);
                LabeledAddress {
                    address: key,
                    category,
                    confidence,
                    source: Some(provider),
                    name: value.name,
                    is_contract: value.is_contract,
                    failure: None,
                }
            }
            ProviderResult::Failure(f) => {
                debug!("🏷️ Label lookup failed for {}: {}", key, f.kind);
                LabeledAddress::unresolved(key, f.kind)
            }
        }
    }

    /// Resolve every address with at most `concurrency` lookups in flight
    pub async fn label_all(
        &self,
        addresses: &BTreeSet<String>,
        cancel: &CancellationToken,
    ) -> BTreeMap<String, LabeledAddress> {
        stream::iter(addresses.iter().cloned())
            .map(|address| async move {
                let labeled = self.label(&address, cancel).await;
                (labeled.address.clone(), labeled)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: Option<&str>, tags: &[&str]) -> AddressLabel {
        AddressLabel {
            address: "0xabc".into(),
            name: name.map(String::from),
            is_contract: Some(true),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_classify_keywords() {
        assert_eq!(
            classify(&label(Some("UniswapV3Pool"), &[])).0,
            LabelCategory::Pool
        );
        assert_eq!(
            classify(&label(Some("NonfungiblePositionManager"), &[])).0,
            LabelCategory::Pool
        );
        assert_eq!(
            classify(&label(Some("TokenVesting"), &[])).0,
            LabelCategory::Vesting
        );
        assert_eq!(
            classify(&label(None, &["Team Finance: Lock"])).0,
            LabelCategory::Vesting
        );
        assert_eq!(
            classify(&label(Some("GnosisSafeProxy"), &[])),
            (LabelCategory::Multisig, LabelConfidence::High)
        );
    }

    #[test]
    fn test_named_but_unmatched_is_low_confidence() {
        assert_eq!(
            classify(&label(Some("StakingRewards"), &[])),
            (LabelCategory::Unlabeled, LabelConfidence::Low)
        );
        assert_eq!(
            classify(&label(None, &[])),
            (LabelCategory::Unlabeled, LabelConfidence::Low)
        );
    }
}
