use std::env;
use std::path::PathBuf;

/// Default batch size for a run when the caller does not supply one
pub const DEFAULT_LIMIT_COUNT: i64 = 5;

/// Smallest batch a run may be created with
pub const MIN_LIMIT_COUNT: i64 = 1;

/// Largest batch a run may be created with
pub const MAX_LIMIT_COUNT: i64 = 50;

/// Default number of entries rendered by the pending list endpoint
pub const DEFAULT_PENDING_LIST_LIMIT: i64 = 5;

/// Get the path to the Collector directory (~/.collector)
pub fn collector_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".collector")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".collector")
    }
}

/// Connection URL of the default on-disk database (~/.collector/collector.db)
pub fn default_database_url() -> String {
    format!("sqlite:{}", collector_dir().join("collector.db").display())
}
