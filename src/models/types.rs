//! Pipeline types shared by providers, collectors and the engine.
//!
//! Provenance is never dropped: every value produced by a provider carries
//! the `ProviderId` that answered, and every failure carries the providers
//! that were tried.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;

use super::config::Chain;
use super::errors::{AppError, AppResult, FailureKind};

// ============================================
// PROVIDER IDENTITY
// ============================================

/// Identifier of an external data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(&'static str);

impl ProviderId {
    pub const RPC: ProviderId = ProviderId("rpc");
    pub const ETHERSCAN: ProviderId = ProviderId("etherscan");
    pub const ROUTESCAN: ProviderId = ProviderId("routescan");
    pub const BLOCKSCOUT: ProviderId = ProviderId("blockscout");
    pub const DEXSCREENER: ProviderId = ProviderId("dexscreener");
    pub const TWITTER: ProviderId = ProviderId("twitter");
    pub const BRAVE: ProviderId = ProviderId("brave");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for ProviderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

// ============================================
// PROVIDER RESULT
// ============================================

/// Terminal failure of a provider call (or of a whole fallback chain)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    /// Provider that produced this failure (the last one tried)
    pub provider: ProviderId,
    /// Attempts made against `provider`
    pub attempts: u32,
    /// Every provider tried, in priority order
    pub attempted: Vec<ProviderId>,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, provider: ProviderId, attempts: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider,
            attempts,
            attempted: vec![provider],
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

/// Tagged outcome of a provider call
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult<T> {
    Success { value: T, provider: ProviderId },
    Failure(ProviderFailure),
}

impl<T> ProviderResult<T> {
    pub fn success(value: T, provider: ProviderId) -> Self {
        Self::Success { value, provider }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Provider that answered, or the last one that failed
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Success { provider, .. } => *provider,
            Self::Failure(f) => f.provider,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProviderFailure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(f) => Some(f),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderResult<U> {
        match self {
            Self::Success { value, provider } => ProviderResult::Success {
                value: f(value),
                provider,
            },
            Self::Failure(e) => ProviderResult::Failure(e),
        }
    }

    /// Provenance record for this outcome
    pub fn status(&self) -> FieldStatus {
        match self {
            Self::Success { provider, .. } => FieldStatus::Success {
                provider: *provider,
            },
            Self::Failure(f) => FieldStatus::from_failure(f),
        }
    }
}

// ============================================
// FIELD PROVENANCE
// ============================================

/// Outcome of one collector field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldStatus {
    Success {
        provider: ProviderId,
    },
    Failed {
        kind: FailureKind,
        provider: ProviderId,
        attempts: u32,
        attempted: Vec<ProviderId>,
        message: String,
    },
    Cancelled {
        provider: ProviderId,
    },
}

impl FieldStatus {
    pub fn from_failure(f: &ProviderFailure) -> Self {
        if f.is_cancelled() {
            Self::Cancelled {
                provider: f.provider,
            }
        } else {
            Self::Failed {
                kind: f.kind,
                provider: f.provider,
                attempts: f.attempts,
                attempted: f.attempted.clone(),
                message: f.message.clone(),
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Per-field provenance log a collector fills while it runs
#[derive(Debug, Clone, Default)]
pub struct FieldLog {
    fields: BTreeMap<String, FieldStatus>,
}

impl FieldLog {
    /// Record the outcome under `field` and hand back the value, if any
    pub fn record<T>(&mut self, field: impl Into<String>, result: ProviderResult<T>) -> Option<T> {
        self.fields.insert(field.into(), result.status());
        result.into_value()
    }

    pub fn set(&mut self, field: impl Into<String>, status: FieldStatus) {
        self.fields.insert(field.into(), status);
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldStatus> {
        self.fields
    }
}

// ============================================
// COLLECTOR RESULT
// ============================================

/// Domain collectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    Onchain,
    Market,
    Social,
    Web,
}

impl CollectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onchain => "onchain",
            Self::Market => "market",
            Self::Social => "social",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collector's typed record plus per-field provenance.
///
/// A result with failed fields is still a valid result: it is "partial",
/// and partial results propagate to the summary instead of aborting.
#[derive(Debug, Clone, Serialize)]
pub struct CollectorResult<D> {
    pub collector: CollectorKind,
    pub data: D,
    pub fields: BTreeMap<String, FieldStatus>,
    pub elapsed_ms: u64,
}

impl<D> CollectorResult<D> {
    pub fn new(collector: CollectorKind, data: D, log: FieldLog, elapsed_ms: u64) -> Self {
        Self {
            collector,
            data,
            fields: log.into_inner(),
            elapsed_ms,
        }
    }

    /// At least one field did not succeed
    pub fn is_partial(&self) -> bool {
        self.fields.values().any(|s| !s.is_success())
    }

    /// Every attempted field failed (or nothing could be attempted)
    pub fn is_total_failure(&self) -> bool {
        self.fields.values().all(|s| !s.is_success())
    }

    /// At least one field was cut short by cancellation
    pub fn was_cancelled(&self) -> bool {
        self.fields.values().any(FieldStatus::is_cancelled)
    }

    pub fn status(&self, field: &str) -> Option<&FieldStatus> {
        self.fields.get(field)
    }
}

// ============================================
// TOKEN CONTEXT
// ============================================

/// Identity of the token under analysis plus facts discovered along the way.
///
/// Never mutated in place: the engine builds a new instance with
/// [`TokenContext::enriched`] at the phase barrier and hands collectors an
/// `Arc` to read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenContext {
    /// Lowercase 0x-prefixed address
    pub address: String,
    pub chain: Chain,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub deployer: Option<String>,
    pub twitter_handle: Option<String>,
    pub website: Option<String>,
    pub launchpad: Option<String>,
}

/// Facts produced by Phase 1, merged at the barrier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextUpdate {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub deployer: Option<String>,
    pub twitter_handle: Option<String>,
    pub website: Option<String>,
    pub launchpad: Option<String>,
}

impl TokenContext {
    /// Create the identity-only context for a run
    pub fn seed(address: &str, chain: Chain) -> AppResult<Self> {
        let parsed = Address::from_str(address.trim())
            .map_err(|e| AppError::invalid_address(format!("{}: {}", address, e)))?;

        Ok(Self {
            address: parsed.to_string().to_lowercase(),
            chain,
            name: None,
            symbol: None,
            deployer: None,
            twitter_handle: None,
            website: None,
            launchpad: None,
        })
    }

    /// New context with `update` merged in; fields already known are kept
    pub fn enriched(&self, update: ContextUpdate) -> Self {
        fn pick(current: &Option<String>, new: Option<String>) -> Option<String> {
            current
                .clone()
                .or_else(|| new.filter(|v| !v.trim().is_empty()))
        }

        Self {
            address: self.address.clone(),
            chain: self.chain,
            name: pick(&self.name, update.name),
            symbol: pick(&self.symbol, update.symbol),
            deployer: pick(&self.deployer, update.deployer),
            twitter_handle: pick(&self.twitter_handle, update.twitter_handle),
            website: pick(&self.website, update.website),
            launchpad: pick(&self.launchpad, update.launchpad),
        }
    }
}
