//! RPC Provider - JSON-RPC reads against an EVM node
//!
//! 1. URL from `<CHAIN>_RPC_URL`, else Alchemy from `ALCHEMY_API_KEY`, else public RPC
//! 2. ERC-20 metadata via `eth_call` (name, symbol, decimals, totalSupply)
//! 3. Runtime bytecode via `eth_getCode`, reduced to a keccak256 signature
//! 4. Rate limits (HTTP 429 or code -32005) surface as `RateLimited`
//!
//! One request per attempt; retries live in the provider client.

use alloy_primitives::{keccak256, Address, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use super::client::Endpoint;
use super::http::{classify_status, masked_url};
use crate::models::config::Chain;
use crate::models::errors::{CallError, FailureKind};
use crate::models::records::{CodeInfo, TokenInfo};
use crate::models::types::ProviderId;

sol! {
    function name() external view returns (string);
    function symbol() external view returns (string);
    function decimals() external view returns (uint8);
    function totalSupply() external view returns (uint256);
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Check if this is a rate limit error (HTTP 429 equivalent or code -32005)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }

    /// Execution reverted (code 3, or a node that only says so in the message)
    pub fn is_revert(&self) -> bool {
        self.code == 3 || self.message.to_lowercase().contains("revert")
    }

    pub fn into_call_error(self) -> CallError {
        if self.is_rate_limit() {
            CallError::rate_limited()
        } else {
            CallError::invalid(format!("RPC error: {} (code: {})", self.message, self.code))
        }
    }
}

/// JSON-RPC endpoint for one chain
#[derive(Clone)]
pub struct RpcProvider {
    client: reqwest::Client,
    url: String,
    chain: Chain,
}

impl RpcProvider {
    pub fn new(client: reqwest::Client, url: impl Into<String>, chain: Chain) -> Self {
        let url = url.into();
        debug!("🔌 RPC for {} at {}", chain.name(), masked_url(&url));
        Self { client, url, chain }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        masked_url(&self.url)
    }

    /// Execute a single JSON-RPC call
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, CallError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }

        let body = response.text().await?;
        let json: RpcResponse<T> = serde_json::from_str(&body)?;

        if let Some(error) = json.error {
            return Err(error.into_call_error());
        }
        json.result
            .ok_or_else(|| CallError::invalid("No result in response"))
    }

    /// Execute eth_call and return raw return data
    pub async fn eth_call(&self, to: &str, data: Vec<u8>) -> Result<Vec<u8>, CallError> {
        let data = format!("0x{}", hex::encode(data));
        let params = serde_json::json!([{ "to": to, "data": data }, "latest"]);
        let raw: String = self.call("eth_call", params).await?;
        decode_hex(&raw)
    }

    /// Get bytecode
    pub async fn get_code(&self, address: &str) -> Result<Vec<u8>, CallError> {
        let params = serde_json::json!([address, "latest"]);
        let raw: String = self.call("eth_getCode", params).await?;
        decode_hex(&raw)
    }

    /// eth_call where a revert or undecodable answer means "absent"
    async fn optional_call(&self, to: &str, data: Vec<u8>) -> Result<Option<Vec<u8>>, CallError> {
        match self.eth_call(to, data).await {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind == FailureKind::InvalidResponse => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, CallError> {
    hex::decode(raw.trim_start_matches("0x"))
        .map_err(|e| CallError::invalid(format!("Bad hex in RPC result: {}", e)))
}

/// Decode a string return, tolerating legacy tokens that return bytes32
pub fn decode_string_return(data: &[u8]) -> Option<String> {
    let decoded = nameCall::abi_decode_returns(data, false)
        .map(|r| r._0)
        .ok()
        .or_else(|| {
            if data.len() == 32 {
                let trimmed: Vec<u8> = data.iter().copied().take_while(|b| *b != 0).collect();
                String::from_utf8(trimmed).ok()
            } else {
                None
            }
        })?;

    let cleaned = decoded.trim_matches(char::from(0)).trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// 0x-prefixed keccak256 of runtime bytecode
pub fn code_signature(code: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(code)))
}

#[async_trait]
impl Endpoint<String, TokenInfo> for RpcProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::RPC
    }

    async fn fetch(&self, token: &String) -> Result<TokenInfo, CallError> {
        let (name, symbol, decimals, supply) = tokio::join!(
            self.optional_call(token, nameCall {}.abi_encode()),
            self.optional_call(token, symbolCall {}.abi_encode()),
            self.optional_call(token, decimalsCall {}.abi_encode()),
            self.optional_call(token, totalSupplyCall {}.abi_encode()),
        );

        let info = TokenInfo {
            name: name?.as_deref().and_then(decode_string_return),
            symbol: symbol?.as_deref().and_then(decode_string_return),
            decimals: decimals?.and_then(|d| {
                decimalsCall::abi_decode_returns(&d, false).ok().map(|r| r._0)
            }),
            total_supply: supply?.and_then(|s| {
                totalSupplyCall::abi_decode_returns(&s, false)
                    .ok()
                    .map(|r| r._0.to_string())
            }),
        };

        if info.name.is_none()
            && info.symbol.is_none()
            && info.decimals.is_none()
            && info.total_supply.is_none()
        {
            return Err(CallError::not_found(format!("{} exposes no ERC-20 metadata", token)));
        }

        debug!(
            "🪙 RPC: {} = {} ({})",
            token,
            info.name.as_deref().unwrap_or("?"),
            info.symbol.as_deref().unwrap_or("?")
        );
        Ok(info)
    }
}

#[async_trait]
impl Endpoint<String, CodeInfo> for RpcProvider {
    fn provider(&self) -> ProviderId {
        ProviderId::RPC
    }

    async fn fetch(&self, address: &String) -> Result<CodeInfo, CallError> {
        Address::from_str(address)
            .map_err(|e| CallError::invalid(format!("Bad address {}: {}", address, e)))?;

        let code = self.get_code(address).await?;
        if code.is_empty() {
            return Ok(CodeInfo {
                is_contract: false,
                code_signature: None,
            });
        }
        Ok(CodeInfo {
            is_contract: true,
            code_signature: Some(code_signature(&code)),
        })
    }
}

/// Format a raw token amount with `decimals`, for display only
pub fn format_units(raw: &str, decimals: u8) -> Option<String> {
    let value = U256::from_str(raw).ok()?;
    let scale = U256::from(10u64).checked_pow(U256::from(decimals))?;
    let whole = value / scale;
    let frac = value % scale;
    if frac.is_zero() || decimals == 0 {
        return Some(whole.to_string());
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    Some(format!("{}.{}", whole, frac.trim_end_matches('0')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    #[test]
    fn test_rpc_error_classification() {
        let rate_limit = RpcError {
            code: -32005,
            message: "Rate limit exceeded".to_string(),
        };
        assert!(rate_limit.is_rate_limit());
        assert_eq!(rate_limit.into_call_error().kind, FailureKind::RateLimited);

        let revert = RpcError {
            code: 3,
            message: "execution reverted".to_string(),
        };
        assert!(revert.is_revert());
        assert_eq!(revert.into_call_error().kind, FailureKind::InvalidResponse);
    }

    #[test]
    fn test_rpc_response_with_error() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit"}}"#;
        let resp: RpcResponse<String> = serde_json::from_str(json).unwrap();
        assert!(resp.result.is_none());
        assert!(resp.error.unwrap().is_rate_limit());
    }

    #[test]
    fn test_decode_string_return_abi() {
        let encoded = (String::from("Wrapped Ether"),).abi_encode_params();
        assert_eq!(decode_string_return(&encoded).as_deref(), Some("Wrapped Ether"));
    }

    #[test]
    fn test_decode_string_return_bytes32() {
        let mut raw = [0u8; 32];
        raw[..3].copy_from_slice(b"MKR");
        assert_eq!(decode_string_return(&raw).as_deref(), Some("MKR"));
    }

    #[test]
    fn test_code_signature_is_keccak() {
        // keccak256 of empty input
        assert_eq!(
            code_signature(&[]),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units("1500000000000000000", 18).as_deref(), Some("1.5"));
        assert_eq!(format_units("42", 0).as_deref(), Some("42"));
        assert!(format_units("not-a-number", 18).is_none());
    }
}
