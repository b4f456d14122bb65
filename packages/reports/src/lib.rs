// ABOUTME: Report finalization for Collector
// ABOUTME: Markdown reports over a set of entries, with transactional status changes

pub mod storage;
pub mod types;

pub use storage::ReportStorage;
pub use types::{Report, ReportCreateInput, ReportStatus, ReportWithEntries, Sources};
