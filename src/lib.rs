//! Ruster Diligence Library
//!
//! Token due-diligence collection and reduction pipeline:
//! - Provider clients with retry, backoff, timeout and fallback chains
//! - On-chain, market, web and social collectors
//! - Two-phase orchestration with cancellation and progress events
//! - Bounded, deterministic reduction into an `AnalysisSummary`

pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    AnalysisConsumer, Collector, CollectorFactory, CollectorSet, Engine, EngineState,
    HttpCollectorFactory, LaunchpadRegistry, ProgressEvent,
};
pub use models::{
    AnalysisConfig, AnalysisSummary, AppError, AppResult, Chain, ErrorCode, FailureKind,
    TokenContext, Verdict,
};
