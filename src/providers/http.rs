//! Shared HTTP plumbing for REST providers.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::models::errors::{AppError, AppResult, CallError, ErrorCode};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// HTTP client with User-Agent and gzip enabled.
///
/// Per-attempt timeouts are applied by the provider client, not here.
pub fn build_client() -> AppResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    reqwest::Client::builder()
        .default_headers(headers)
        .gzip(true)
        .build()
        .map_err(|e| AppError::with_source(ErrorCode::ConfigInvalidValue, "Failed to build HTTP client", e))
}

/// Map a non-success status to a call error
pub fn classify_status(status: StatusCode) -> Option<CallError> {
    if status.is_success() {
        return None;
    }
    Some(match status.as_u16() {
        429 => CallError::rate_limited(),
        404 => CallError::not_found("HTTP 404"),
        s if s >= 500 => CallError::unreachable(format!("HTTP error: {}", status)),
        _ => CallError::invalid(format!("HTTP error: {}", status)),
    })
}

/// Send a request and decode a JSON body
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CallError> {
    let response = request.send().await?;
    if let Some(err) = classify_status(response.status()) {
        return Err(err);
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(CallError::from)
}

/// Hide API keys embedded in a URL before logging it
pub fn masked_url(url: &str) -> String {
    if let Some((head, _)) = url.split_once("/v2/") {
        if head.contains("alchemy.com") {
            return format!("{}/v2/***HIDDEN***", head);
        }
    }
    match url.find("apikey=") {
        Some(pos) => {
            let key_start = pos + "apikey=".len();
            let key_end = url[key_start..]
                .find('&')
                .map(|i| key_start + i)
                .unwrap_or(url.len());
            format!("{}***HIDDEN***{}", &url[..key_start], &url[key_end..])
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::FailureKind;

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::OK).is_none());
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS).unwrap().kind,
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND).unwrap().kind,
            FailureKind::NotFound
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY).unwrap().kind,
            FailureKind::Unreachable
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN).unwrap().kind,
            FailureKind::InvalidResponse
        );
    }

    #[test]
    fn test_masked_url() {
        assert_eq!(
            masked_url("https://base-mainnet.g.alchemy.com/v2/secret"),
            "https://base-mainnet.g.alchemy.com/v2/***HIDDEN***"
        );
        assert_eq!(
            masked_url("https://api.etherscan.io/v2/api?chainid=1&apikey=secret&module=x"),
            "https://api.etherscan.io/v2/api?chainid=1&apikey=***HIDDEN***&module=x"
        );
        assert_eq!(masked_url("https://mainnet.base.org"), "https://mainnet.base.org");
    }
}
