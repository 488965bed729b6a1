//! Ruster Diligence - token due-diligence collector
//!
//! Usage: `ruster_diligence <token_address> [chain]` (chain defaults to base)
//!
//! Runs one analysis and prints the bounded summary as JSON on stdout.
//! Ctrl+C cancels in-flight calls; the partial summary is still printed.

use ruster_diligence::utils::constants::{APP_NAME, APP_VERSION};
use ruster_diligence::{AnalysisConfig, Chain, Engine, ProgressEvent};

use eyre::{eyre, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout stays pure JSON)
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut args = std::env::args().skip(1);
    let address = args
        .next()
        .ok_or_else(|| eyre!("usage: ruster_diligence <token_address> [chain]"))?;
    let chain = parse_chain(args.next())?;

    info!("🚀 {} v{} starting", APP_NAME, APP_VERSION);

    let config = AnalysisConfig::from_env()?;
    let deadline = config.run_deadline;
    let engine = Engine::new(config)?;

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ProgressEvent::CollectorSettled {
                collector,
                status,
                elapsed_ms,
                ..
            } = &event
            {
                info!("📦 {} settled: {:?} in {}ms", collector, status, elapsed_ms);
            } else {
                debug!("{:?}", event);
            }
        }
    });

    // Deadline and Ctrl+C both cancel the same token
    let cancel = CancellationToken::new();
    let watchdog = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                warn!("⏰ Deadline of {}s reached", deadline.as_secs());
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("🛑 Interrupted, collecting partial results...");
            }
        }
        watchdog.cancel();
    });

    let summary = engine.run_with_cancel(&address, chain, cancel).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !summary.complete {
        warn!("⚠️ Summary is partial (run was cancelled)");
    }
    Ok(())
}

/// Chain argument, base when omitted
fn parse_chain(arg: Option<String>) -> Result<Chain> {
    match arg {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(Chain::Base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_defaults_to_base() {
        assert_eq!(parse_chain(None).unwrap(), Chain::Base);
        assert_eq!(parse_chain(Some("ethereum".into())).unwrap(), Chain::Ethereum);
        assert!(parse_chain(Some("solana".into())).is_err());
    }
}
