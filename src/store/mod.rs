//! Incremental store for the catalog state
//!
//! This module handles all persisted state, including:
//! - Per-region id sets (sorted, deduplicated, append-only)
//! - The global id set and the availability map
//! - Title and thumbnail records
//! - The pass journal
//!
//! The pure diff and merge operations live in `ops` and are used by the
//! passes to derive the remaining work from what is already stored.

mod json_store;
mod ops;
mod traits;

pub use json_store::JsonStore;
pub(crate) use json_store::write_json;
pub use ops::{clean_id_set, merge_availability, missing_against, union_id_sets};
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens (creating if needed) the JSON state directory at `path`
pub fn open_store(path: &Path) -> StorageResult<JsonStore> {
    JsonStore::open(path)
}
