//! Launchpad Matcher
//!
//! Static registry of known token factories. Lookups are pure: by
//! `(chain, deployer)` first, then by the deployer's bytecode signature.
//!
//! Registry file format:
//! ```json
//! {"launchpads": [{"id": "clanker", "name": "Clanker", "chain": "base",
//!   "factory_addresses": ["0x..."], "code_signatures": ["0x..."]}]}
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::models::config::Chain;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::records::{LaunchpadInfo, LaunchpadMatch};

#[derive(Debug, Clone, Deserialize)]
pub struct LaunchpadEntry {
    pub id: String,
    pub name: String,
    pub chain: Chain,
    #[serde(default)]
    pub factory_addresses: Vec<String>,
    #[serde(default)]
    pub code_signatures: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    launchpads: Vec<LaunchpadEntry>,
}

/// Index into `entries` plus the matched factory address
#[derive(Debug, Clone)]
struct Slot {
    entry: usize,
    factory_address: String,
}

#[derive(Debug, Clone, Default)]
pub struct LaunchpadRegistry {
    entries: Vec<LaunchpadEntry>,
    by_deployer: HashMap<(Chain, String), Slot>,
    by_signature: HashMap<(Chain, String), Slot>,
}

impl LaunchpadRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(entries: Vec<LaunchpadEntry>) -> Self {
        let mut by_deployer = HashMap::new();
        let mut by_signature = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            let first_factory = entry
                .factory_addresses
                .first()
                .map(|a| a.to_lowercase())
                .unwrap_or_default();

            for factory in &entry.factory_addresses {
                let factory = factory.to_lowercase();
                by_deployer.insert(
                    (entry.chain, factory.clone()),
                    Slot {
                        entry: idx,
                        factory_address: factory,
                    },
                );
            }
            for sig in &entry.code_signatures {
                by_signature.insert(
                    (entry.chain, sig.to_lowercase()),
                    Slot {
                        entry: idx,
                        factory_address: first_factory.clone(),
                    },
                );
            }
        }

        Self {
            entries,
            by_deployer,
            by_signature,
        }
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        let file: RegistryFile = serde_json::from_str(raw).map_err(|e| {
            AppError::with_source(ErrorCode::ConfigRegistryInvalid, "Invalid launchpad registry", e)
        })?;
        Ok(Self::new(file.launchpads))
    }

    /// Load from disk. An unreadable file is a configuration error.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorCode::ConfigRegistryInvalid,
                format!("Cannot read launchpad registry {}", path.display()),
                e,
            )
        })?;
        let registry = Self::from_json(&raw)?;
        info!(
            "🚀 Launchpad registry: {} entries from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(
        &self,
        chain: Chain,
        deployer: Option<&str>,
        code_signature: Option<&str>,
    ) -> Option<LaunchpadInfo> {
        if let Some(deployer) = deployer {
            if let Some(slot) = self.by_deployer.get(&(chain, deployer.to_lowercase())) {
                return Some(self.info(slot, LaunchpadMatch::Deployer));
            }
        }
        let sig = code_signature?;
        self.by_signature
            .get(&(chain, sig.to_lowercase()))
            .map(|slot| self.info(slot, LaunchpadMatch::CodeSignature))
    }

    fn info(&self, slot: &Slot, matched_by: LaunchpadMatch) -> LaunchpadInfo {
        let entry = &self.entries[slot.entry];
        LaunchpadInfo {
            factory_id: entry.id.clone(),
            name: entry.name.clone(),
            factory_address: slot.factory_address.clone(),
            matched_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"{
        "launchpads": [
            {
                "id": "testpad",
                "name": "Test Pad",
                "chain": "base",
                "factory_addresses": ["0xABCDEF0000000000000000000000000000000001"],
                "code_signatures": ["0xAAAA"]
            }
        ]
    }"#;

    #[test]
    fn test_lookup_by_deployer_is_case_insensitive() {
        let reg = LaunchpadRegistry::from_json(REGISTRY).unwrap();
        let hit = reg
            .lookup(Chain::Base, Some("0xabcdef0000000000000000000000000000000001"), None)
            .unwrap();
        assert_eq!(hit.factory_id, "testpad");
        assert_eq!(hit.matched_by, LaunchpadMatch::Deployer);
    }

    #[test]
    fn test_lookup_by_signature() {
        let reg = LaunchpadRegistry::from_json(REGISTRY).unwrap();
        let hit = reg.lookup(Chain::Base, Some("0x2222"), Some("0xaaaa")).unwrap();
        assert_eq!(hit.matched_by, LaunchpadMatch::CodeSignature);
        assert_eq!(hit.factory_address, "0xabcdef0000000000000000000000000000000001");
    }

    #[test]
    fn test_miss_and_wrong_chain() {
        let reg = LaunchpadRegistry::from_json(REGISTRY).unwrap();
        assert!(reg.lookup(Chain::Base, Some("0x2222"), None).is_none());
        assert!(reg
            .lookup(Chain::Ethereum, Some("0xabcdef0000000000000000000000000000000001"), None)
            .is_none());
        assert!(LaunchpadRegistry::empty().lookup(Chain::Base, None, None).is_none());
    }

    #[test]
    fn test_invalid_registry_is_config_error() {
        let err = LaunchpadRegistry::from_json("{\"launchpads\": 3}").unwrap_err();
        assert_eq!(err.code_str(), "CFG_REGISTRY_INVALID");
        let err = LaunchpadRegistry::load(Path::new("/nonexistent/registry.json")).unwrap_err();
        assert_eq!(err.code_str(), "CFG_REGISTRY_INVALID");
    }
}
