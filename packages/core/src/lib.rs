// ABOUTME: Core types and utilities for Collector
// ABOUTME: Foundational package providing shared functionality across all Collector packages

pub mod constants;
pub mod events;
pub mod urls;
pub mod utils;

// Re-export constants
pub use constants::{
    collector_dir, default_database_url, DEFAULT_LIMIT_COUNT, DEFAULT_PENDING_LIST_LIMIT,
    MAX_LIMIT_COUNT, MIN_LIMIT_COUNT,
};

// Re-export events
pub use events::{Invalidation, InvalidationBus, Resource};

// Re-export utilities
pub use urls::{contains_url, extract_urls};
pub use utils::generate_id;
