//! Error types
//!
//! Two layers of failure live here:
//! - `AppError` aborts a whole analysis run (bad configuration, bad input)
//!   and carries an `ErrorCode` that log monitoring can match on.
//! - `CallError` / `FailureKind` describe a single provider call. These are
//!   never thrown past a collector; they end up recorded as field statuses.
//!
//! Codes read CATEGORY_SPECIFIC_ERROR: `CFG_` for configuration, `TOKEN_`
//! for the analysed input.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

// ============================================
// Run-level errors
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A configuration value did not parse or is out of range
    ConfigInvalidValue,
    ConfigUnsupportedChain,
    /// Launchpad registry file unreadable or malformed
    ConfigRegistryInvalid,
    TokenInvalidAddress,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigUnsupportedChain => "CFG_UNSUPPORTED_CHAIN",
            Self::ConfigRegistryInvalid => "CFG_REGISTRY_INVALID",
            Self::TokenInvalidAddress => "TOKEN_INVALID_ADDRESS",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error that stops a run before or while it starts
#[derive(Debug)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(code, message)
        }
    }

    /// Code string for log lines
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenInvalidAddress, msg)
    }

    pub fn unsupported_chain(chain: &str) -> Self {
        Self::new(
            ErrorCode::ConfigUnsupportedChain,
            format!("Unsupported chain: {}", chain),
        )
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ConfigInvalidValue, "JSON parse error", err)
    }
}

// ============================================
// Provider call failures
// ============================================

/// Why a provider call did not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// HTTP 429 or a JSON-RPC rate-limit code
    RateLimited,
    /// Network error or timeout
    Unreachable,
    /// Payload did not match the expected schema
    InvalidResponse,
    /// Expected absence (no such record at this provider)
    NotFound,
    /// Deadline or cancel signal fired
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Unreachable => "unreachable",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
        }
    }

    /// Only transient failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Unreachable)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from a single provider attempt
#[derive(Debug, Clone, PartialEq)]
pub struct CallError {
    pub kind: FailureKind,
    pub message: String,
}

impl CallError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited() -> Self {
        Self::new(FailureKind::RateLimited, "Rate limited (HTTP 429)")
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::new(FailureKind::Unreachable, msg)
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidResponse, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, msg)
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Cancelled before completion")
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for CallError {}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::unreachable("Request timeout")
        } else if err.is_connect() {
            Self::unreachable("Connection failed")
        } else if err.is_decode() {
            Self::invalid(format!("Failed to decode response: {}", err))
        } else if err.status().map(|s| s.as_u16()) == Some(429) {
            Self::rate_limited()
        } else {
            Self::unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid(format!("JSON parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_code() {
        let err = AppError::unsupported_chain("solana");
        assert_eq!(err.code, ErrorCode::ConfigUnsupportedChain);
        assert_eq!(err.to_string(), "[CFG_UNSUPPORTED_CHAIN] Unsupported chain: solana");
    }

    #[test]
    fn test_with_source_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "registry.json");
        let err: AppError = io.into();
        assert_eq!(err.code_str(), "UNKNOWN_ERROR");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_failure_kind_retryable() {
        assert!(FailureKind::RateLimited.is_retryable());
        assert!(FailureKind::Unreachable.is_retryable());
        assert!(!FailureKind::InvalidResponse.is_retryable());
        assert!(!FailureKind::NotFound.is_retryable());
        assert!(!FailureKind::Cancelled.is_retryable());
    }

    #[test]
    fn test_failure_kind_serialization() {
        let json = serde_json::to_string(&FailureKind::RateLimited).unwrap();
        assert_eq!(json, "\"rate_limited\"");
    }
}
