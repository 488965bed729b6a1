//! Blockscout v2 API - address metadata used for holder labels
//!
//! API: `GET {base}/addresses/{address}` (free, no key)

use async_trait::async_trait;
use serde::Deserialize;

use super::client::Endpoint;
use super::http::send_json;
use crate::models::errors::CallError;
use crate::models::records::AddressLabel;
use crate::models::types::ProviderId;

#[derive(Debug, Deserialize)]
pub struct BlockscoutAddress {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub is_contract: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public_tags: Vec<BlockscoutTag>,
    #[serde(default)]
    pub metadata: Option<BlockscoutMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct BlockscoutTag {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BlockscoutMetadata {
    #[serde(default)]
    pub tags: Vec<BlockscoutMetaTag>,
}

#[derive(Debug, Deserialize)]
pub struct BlockscoutMetaTag {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl BlockscoutAddress {
    pub fn into_label(self, requested: &str) -> AddressLabel {
        let mut tags: Vec<String> = self
            .public_tags
            .into_iter()
            .filter_map(|t| t.display_name.or(t.label))
            .collect();
        if let Some(meta) = self.metadata {
            tags.extend(meta.tags.into_iter().filter_map(|t| t.name.or(t.slug)));
        }
        tags.retain(|t| !t.trim().is_empty());

        AddressLabel {
            address: self
                .hash
                .unwrap_or_else(|| requested.to_string())
                .to_lowercase(),
            name: self.name.filter(|n| !n.trim().is_empty()),
            is_contract: self.is_contract,
            tags,
        }
    }
}

#[derive(Clone)]
pub struct BlockscoutProvider {
    client: reqwest::Client,
    base_url: String,
}

impl BlockscoutProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Endpoint<String, AddressLabel> for BlockscoutProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::BLOCKSCOUT
    }

    async fn fetch(&self, address: &String) -> Result<AddressLabel, CallError> {
        let url = format!("{}/addresses/{}", self.base_url, address);
        let raw: BlockscoutAddress = send_json(self.client.get(&url)).await?;
        Ok(raw.into_label(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_fixture() {
        let json = r#"{
            "hash": "0x498581fF718922c3f8e6A244956aF099B2652b2b",
            "is_contract": true,
            "name": "PoolManager",
            "public_tags": [{"display_name": "Uniswap V4: Pool Manager", "label": "uniswap-v4"}],
            "metadata": {"tags": [{"name": "DEX", "slug": "dex"}]},
            "coin_balance": "0"
        }"#;
        let raw: BlockscoutAddress = serde_json::from_str(json).unwrap();
        let label = raw.into_label("0x498581ff718922c3f8e6a244956af099b2652b2b");

        assert_eq!(label.address, "0x498581ff718922c3f8e6a244956af099b2652b2b");
        assert_eq!(label.name.as_deref(), Some("PoolManager"));
        assert_eq!(label.is_contract, Some(true));
        assert_eq!(label.tags, vec!["Uniswap V4: Pool Manager", "DEX"]);
    }

    #[test]
    fn test_plain_eoa() {
        let json = r#"{"hash": "0xabc", "is_contract": false, "name": null}"#;
        let raw: BlockscoutAddress = serde_json::from_str(json).unwrap();
        let label = raw.into_label("0xabc");
        assert!(label.name.is_none());
        assert!(label.tags.is_empty());
    }
}
