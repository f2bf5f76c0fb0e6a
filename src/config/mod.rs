//! Configuration module for discovery sessions
//!
//! This module provides the `DiscoveryConfig` struct, its type-safe builder
//! and file/environment loading with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod loader;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{DiscoveryConfigBuilder, WithSeedUrl, compile_glob_pattern};
pub use types::{CrawlPolicy, DiscoveryConfig, ResolutionOptions, SynthesisOptions};
