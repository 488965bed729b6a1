//! Core Module - collection, orchestration and reduction
//!
//! Collectors gather raw records through provider fallback chains, the
//! engine sequences them in two phases, and `reduce` bounds the output.

pub mod collectors;
pub mod consumer;
pub mod engine;
pub mod label_resolver;
pub mod launchpad;
pub mod reduce;

pub use collectors::{Collector, CollectorFactory, CollectorSet, HttpCollectorFactory};
pub use consumer::{parse_verdict, AnalysisConsumer};
pub use engine::{Engine, EngineState, ProgressEvent};
pub use label_resolver::LabelResolver;
pub use launchpad::LaunchpadRegistry;
