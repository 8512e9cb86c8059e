//! Exhaustive list extraction
//!
//! Catalog lists load more items as they are scrolled and never say when
//! they are complete. This module enumerates such a list by repeatedly
//! triggering more content and waiting for the content to grow; a wait that
//! times out is what marks the end of the list.

mod exhaustive;

pub use exhaustive::{extract_all, wait_for_growth, ExtractSettings, LoadOutcome};

use crate::catalog::ItemId;
use crate::reader::ReaderError;
use async_trait::async_trait;

/// A lazily loaded list view inside an open browsing session
#[async_trait]
pub trait ListView: Send {
    /// Ids of every item currently rendered
    async fn rendered_ids(&mut self) -> Result<Vec<ItemId>, ReaderError>;

    /// Current size of the scrollable content
    async fn content_extent(&mut self) -> Result<u64, ReaderError>;

    /// Asks the view to load more items (e.g. scroll to the bottom)
    async fn trigger_load_more(&mut self) -> Result<(), ReaderError>;
}
