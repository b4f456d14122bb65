// ABOUTME: Research Hub intake queue
// ABOUTME: Validates free-text research notes, extracts their URLs, and queues them as PENDING

pub mod storage;
pub mod types;

pub use storage::ResearchStorage;
pub use types::{
    ResearchInput, ResearchItem, ResearchSubmission, ResearchType, MAX_NOTES_CHARS,
    MIN_NOTES_CHARS, PENDING_STATUS,
};
