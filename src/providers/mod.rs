//! Providers Module - External Data Sources
//!
//! Each provider implements one or more `Endpoint<Q, T>` capabilities.
//! `ProviderClient` adds retry/timeout, `FallbackChain` orders them.

pub mod blockscout;
pub mod brave;
pub mod client;
pub mod dexscreener;
pub mod explorer;
pub mod fallback;
pub mod http;
pub mod rpc;
pub mod twitter;

pub use blockscout::BlockscoutProvider;
pub use brave::BraveProvider;
pub use client::{backoff_delay, Endpoint, ProviderClient, ProviderLimits};
pub use dexscreener::{DexPair, DexScreenerProvider};
pub use explorer::ExplorerProvider;
pub use fallback::FallbackChain;
pub use http::{build_client, masked_url};
pub use rpc::RpcProvider;
pub use twitter::TwitterProvider;
