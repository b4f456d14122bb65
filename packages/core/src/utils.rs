// ABOUTME: Shared utility functions for Collector
// ABOUTME: Prefixed ID generation for stored entities

/// Generate a unique, prefixed entity ID such as `run-V1StGXR8_Z5jdHi6B-myT`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}
