//! Utils Module - Helper Functions & Shared Utilities
//!
//! Single source of truth for chain mappings and default tunables.

pub mod constants;

pub use constants::*;
