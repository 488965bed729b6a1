//! Downstream consumer seam
//!
//! The risk-scoring step is external. It receives the bounded summary and
//! returns a `Verdict`, which the engine passes through uninterpreted.

use async_trait::async_trait;
use eyre::WrapErr;

use crate::models::summary::{AnalysisSummary, Verdict};

#[async_trait]
pub trait AnalysisConsumer: Send + Sync {
    async fn assess(&self, summary: &AnalysisSummary) -> eyre::Result<Verdict>;
}

/// Parse a verdict from model output, tolerating a ```json fence
pub fn parse_verdict(raw: &str) -> eyre::Result<Verdict> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start_matches("json").trim_start();
        text = text.strip_suffix("```").unwrap_or(text).trim_end();
    }
    serde_json::from_str(text).wrap_err("Consumer returned an invalid verdict")
}
