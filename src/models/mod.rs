//! Models Module - Data Structures & Configuration
//!
//! Single source of truth for pipeline types and configuration.

pub mod config;
pub mod errors;
pub mod records;
pub mod summary;
pub mod types;

pub use config::*;
pub use errors::*;
pub use records::*;
pub use summary::*;
pub use types::*;
