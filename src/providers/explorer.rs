//! Block explorer provider (Etherscan V2 and Routescan)
//!
//! Both speak the Etherscan API: `?module=..&action=..`, answering
//! `{"status": "1", "message": "OK", "result": ...}`. Errors come back as
//! `status: "0"` with a string `result`, so the envelope is parsed loosely
//! and classified before the typed payload is decoded.
//!
//! API: https://docs.etherscan.io/etherscan-v2
//! Etherscan requires an API key; Routescan works without one.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::client::Endpoint;
use super::http::send_json;
use crate::models::config::Chain;
use crate::models::errors::{CallError, FailureKind};
use crate::models::records::{ContractCreation, HolderEntry, SourceInfo};
use crate::models::types::ProviderId;
use crate::utils::constants::{routescan_url, ETHERSCAN_V2_URL, SOURCE_SNIPPET_CHARS};

// ============================================
// WIRE TYPES
// ============================================

/// Loose Etherscan envelope
#[derive(Debug, Deserialize)]
pub struct ExplorerEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceRecord {
    #[serde(default)]
    pub source_code: String,
    #[serde(default)]
    pub contract_name: String,
    #[serde(default)]
    pub compiler_version: String,
    #[serde(default)]
    pub license_type: String,
    #[serde(default)]
    pub proxy: String,
    #[serde(default)]
    pub implementation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HolderRecord {
    pub token_holder_address: String,
    pub token_holder_quantity: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationRecord {
    #[serde(default)]
    pub contract_address: String,
    pub contract_creator: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

impl ExplorerEnvelope {
    /// Classify the envelope and decode `result` into `T`
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, CallError> {
        if self.status != "1" {
            let detail = self.result.as_str().unwrap_or_default().to_string();
            let text = format!("{} {}", self.message, detail).to_lowercase();

            if text.contains("rate limit") || text.contains("max calls per sec") {
                return Err(CallError::rate_limited());
            }
            if text.contains("no data found")
                || text.contains("no records found")
                || text.contains("no transactions found")
                || text.contains("no token holder")
            {
                return Err(CallError::not_found(self.message));
            }
            return Err(CallError::invalid(format!(
                "Explorer error: {} {}",
                self.message, detail
            )));
        }
        serde_json::from_value(self.result).map_err(CallError::from)
    }
}

impl From<SourceRecord> for SourceInfo {
    fn from(r: SourceRecord) -> Self {
        let verified = !r.source_code.is_empty();
        let snippet = if verified {
            Some(r.source_code.chars().take(SOURCE_SNIPPET_CHARS).collect())
        } else {
            None
        };
        let non_empty = |s: String| if s.trim().is_empty() { None } else { Some(s) };

        SourceInfo {
            verified,
            contract_name: non_empty(r.contract_name),
            compiler: non_empty(r.compiler_version),
            license: non_empty(r.license_type),
            proxy: r.proxy == "1",
            implementation: non_empty(r.implementation).map(|s| s.to_lowercase()),
            source_snippet: snippet,
        }
    }
}

// ============================================
// PROVIDER
// ============================================

/// One Etherscan-compatible explorer
#[derive(Clone)]
pub struct ExplorerProvider {
    id: ProviderId,
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    /// Sent as `chainid` (Etherscan V2 only; Routescan encodes it in the URL)
    chain_param: Option<u64>,
    holder_limit: usize,
}

impl ExplorerProvider {
    /// Etherscan V2 unified endpoint (metered)
    pub fn etherscan(client: reqwest::Client, api_key: String, chain: Chain, holder_limit: usize) -> Self {
        Self {
            id: ProviderId::ETHERSCAN,
            client,
            base_url: ETHERSCAN_V2_URL.to_string(),
            api_key: Some(api_key),
            chain_param: Some(chain.id()),
            holder_limit,
        }
    }

    /// Routescan (free)
    pub fn routescan(client: reqwest::Client, chain: Chain, holder_limit: usize) -> Self {
        Self {
            id: ProviderId::ROUTESCAN,
            client,
            base_url: routescan_url(chain.id()),
            api_key: None,
            chain_param: None,
            holder_limit,
        }
    }

    /// Point at a different base URL (local mocks)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T, CallError> {
        let mut query: Vec<(&str, String)> = params.to_vec();
        if let Some(chain_id) = self.chain_param {
            query.push(("chainid", chain_id.to_string()));
        }
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }

        let request = self.client.get(&self.base_url).query(&query);
        let envelope: ExplorerEnvelope = send_json(request).await?;
        envelope.into_result()
    }
}

#[async_trait]
impl Endpoint<String, SourceInfo> for ExplorerProvider {
    fn provider(&self) -> ProviderId {
        self.id
    }

    async fn fetch(&self, address: &String) -> Result<SourceInfo, CallError> {
        let records: Vec<SourceRecord> = self
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getsourcecode".to_string()),
                ("address", address.clone()),
            ])
            .await?;

        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| CallError::not_found("Empty getsourcecode result"))?;
        let info = SourceInfo::from(record);
        info!(
            "📜 {}: verified={} proxy={} for {}",
            self.id, info.verified, info.proxy, address
        );
        Ok(info)
    }
}

#[async_trait]
impl Endpoint<String, Vec<HolderEntry>> for ExplorerProvider {
    fn provider(&self) -> ProviderId {
        self.id
    }

    async fn fetch(&self, address: &String) -> Result<Vec<HolderEntry>, CallError> {
        let result: Result<Vec<HolderRecord>, CallError> = self
            .get(&[
                ("module", "token".to_string()),
                ("action", "tokenholderlist".to_string()),
                ("contractaddress", address.clone()),
                ("page", "1".to_string()),
                ("offset", self.holder_limit.to_string()),
            ])
            .await;

        let records = match result {
            Ok(records) => records,
            // A token nobody holds is an answer, not a failure
            Err(e) if e.kind == FailureKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };

        let holders: Vec<HolderEntry> = records
            .into_iter()
            .map(|r| HolderEntry {
                address: r.token_holder_address.to_lowercase(),
                quantity: r.token_holder_quantity,
            })
            .collect();
        debug!("👥 {}: {} holders for {}", self.id, holders.len(), address);
        Ok(holders)
    }
}

#[async_trait]
impl Endpoint<String, ContractCreation> for ExplorerProvider {
    fn provider(&self) -> ProviderId {
        self.id
    }

    async fn fetch(&self, address: &String) -> Result<ContractCreation, CallError> {
        let records: Vec<CreationRecord> = self
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getcontractcreation".to_string()),
                ("contractaddresses", address.clone()),
            ])
            .await?;

        records
            .into_iter()
            .next()
            .map(|r| ContractCreation {
                creator: r.contract_creator.to_lowercase(),
                tx_hash: r.tx_hash,
            })
            .ok_or_else(|| CallError::not_found("Empty getcontractcreation result"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_record_parsing() {
        let json = r#"{
            "status": "1",
            "message": "OK",
            "result": [{
                "SourceCode": "pragma solidity ^0.8.0; contract Token {}",
                "ABI": "[]",
                "ContractName": "Token",
                "CompilerVersion": "v0.8.19+commit.7dd6d404",
                "LicenseType": "MIT",
                "Proxy": "1",
                "Implementation": "0xABCDEF0000000000000000000000000000000001"
            }]
        }"#;
        let envelope: ExplorerEnvelope = serde_json::from_str(json).unwrap();
        let records: Vec<SourceRecord> = envelope.into_result().unwrap();
        let info = SourceInfo::from(records.into_iter().next().unwrap());

        assert!(info.verified);
        assert!(info.proxy);
        assert_eq!(info.contract_name.as_deref(), Some("Token"));
        assert_eq!(
            info.implementation.as_deref(),
            Some("0xabcdef0000000000000000000000000000000001")
        );
    }

    #[test]
    fn test_unverified_source_has_no_snippet() {
        let record = SourceRecord {
            source_code: String::new(),
            contract_name: String::new(),
            compiler_version: String::new(),
            license_type: String::new(),
            proxy: "0".into(),
            implementation: String::new(),
        };
        let info = SourceInfo::from(record);
        assert!(!info.verified);
        assert!(info.source_snippet.is_none());
        assert!(info.implementation.is_none());
    }

    #[test]
    fn test_snippet_is_capped() {
        let record = SourceRecord {
            source_code: "x".repeat(SOURCE_SNIPPET_CHARS * 2),
            contract_name: "Big".into(),
            compiler_version: String::new(),
            license_type: String::new(),
            proxy: String::new(),
            implementation: String::new(),
        };
        let info = SourceInfo::from(record);
        assert_eq!(info.source_snippet.unwrap().chars().count(), SOURCE_SNIPPET_CHARS);
    }

    #[test]
    fn test_holder_list_parsing() {
        let json = r#"{
            "status": "1",
            "message": "OK",
            "result": [
                {"TokenHolderAddress": "0xAAA", "TokenHolderQuantity": "1000"},
                {"TokenHolderAddress": "0xbbb", "TokenHolderQuantity": "5"}
            ]
        }"#;
        let envelope: ExplorerEnvelope = serde_json::from_str(json).unwrap();
        let records: Vec<HolderRecord> = envelope.into_result().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].token_holder_quantity, "1000");
    }

    #[test]
    fn test_creation_parsing() {
        let json = r#"{
            "status": "1",
            "message": "OK",
            "result": [{
                "contractAddress": "0x1",
                "contractCreator": "0xDEADBEEF",
                "txHash": "0xabc"
            }]
        }"#;
        let envelope: ExplorerEnvelope = serde_json::from_str(json).unwrap();
        let records: Vec<CreationRecord> = envelope.into_result().unwrap();
        assert_eq!(records[0].contract_creator, "0xDEADBEEF");
        assert_eq!(records[0].tx_hash.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_envelope_error_classification() {
        let rate = r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#;
        let env: ExplorerEnvelope = serde_json::from_str(rate).unwrap();
        let err = env.into_result::<Vec<HolderRecord>>().unwrap_err();
        assert_eq!(err.kind, FailureKind::RateLimited);

        let empty = r#"{"status":"0","message":"No data found","result":[]}"#;
        let env: ExplorerEnvelope = serde_json::from_str(empty).unwrap();
        let err = env.into_result::<Vec<HolderRecord>>().unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);

        let bad_key = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        let env: ExplorerEnvelope = serde_json::from_str(bad_key).unwrap();
        let err = env.into_result::<Vec<HolderRecord>>().unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
    }
}
