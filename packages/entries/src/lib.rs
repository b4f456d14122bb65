// ABOUTME: Entry and type repository for Collector
// ABOUTME: CRUD over content entries, their classifying types, and the pending queue

pub mod storage;
pub mod types;

pub use storage::{row_to_entry, EntryStorage, TypeStorage, ENTRY_COLUMNS};
pub use types::{
    Entry, EntryCreateInput, EntryFilter, EntryStatus, EntryType, EntryUpdateInput,
};
