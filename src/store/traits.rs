//! Storage traits and error types
//!
//! This module defines the trait interface for state backends and the
//! associated error type.

use crate::catalog::{AvailabilityMap, ItemId, Region, ThumbnailMap, TitleMap};
use crate::crawler::PassReport;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed state file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for state backend implementations
///
/// Every `save_*` call must be durable when it returns: the passes flush one
/// unit of work at a time and rely on that to resume after an interruption.
/// State that has never been saved loads as empty.
pub trait Storage {
    // ===== Region Id Sets =====

    /// Loads the ids observed so far from `region`, sorted and deduplicated
    fn load_region_ids(&self, region: &Region) -> StorageResult<Vec<ItemId>>;

    /// Replaces the region's id set; the ids are normalized before writing
    fn save_region_ids(&mut self, region: &Region, ids: &[ItemId]) -> StorageResult<()>;

    // ===== Aggregates =====

    fn load_global_ids(&self) -> StorageResult<Vec<ItemId>>;

    fn save_global_ids(&mut self, ids: &[ItemId]) -> StorageResult<()>;

    fn load_availability(&self) -> StorageResult<AvailabilityMap>;

    fn save_availability(&mut self, availability: &AvailabilityMap) -> StorageResult<()>;

    // ===== Item Records =====

    fn load_titles(&self) -> StorageResult<TitleMap>;

    fn save_titles(&mut self, titles: &TitleMap) -> StorageResult<()>;

    fn load_thumbnails(&self) -> StorageResult<ThumbnailMap>;

    fn save_thumbnails(&mut self, thumbnails: &ThumbnailMap) -> StorageResult<()>;

    // ===== Run Journal =====

    /// Loads every pass report recorded so far, oldest first
    fn load_runs(&self) -> StorageResult<Vec<PassReport>>;

    /// Appends a finished pass to the journal
    fn append_run(&mut self, report: &PassReport) -> StorageResult<()>;
}
