//! Catalog data model
//!
//! Regions, genres, item ids and the per-item records collected by the
//! three acquisition passes.
//!
//! # Components
//!
//! - `Region`: a network partition with its own catalog view
//! - `Genre`: a region-independent catalog taxonomy entry
//! - `ItemRecord`: the best-effort field bag scraped from an item page
//! - `Thumbnail`: display code and image source of an item
//! - `CatalogInputs`: the read-only input files

mod inputs;

pub use inputs::{write_genres, CatalogInputs, SessionCookie};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Globally unique catalog item identifier
pub type ItemId = u64;

/// Item id → scraped title record
pub type TitleMap = BTreeMap<ItemId, ItemRecord>;

/// Item id → thumbnail reference
pub type ThumbnailMap = BTreeMap<ItemId, Thumbnail>;

/// Item id → regions the item was observed in, in region enumeration order
pub type AvailabilityMap = BTreeMap<ItemId, Vec<Region>>;

/// Opaque region identifier (e.g. `"united-kingdom"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A catalog genre, identified by the catalog's own genre id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
}

/// Thumbnail reference of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Catalog code of the matched search result
    pub code: String,
    /// Image URI
    pub source: String,
}

/// Everything the page reader could find about one item
///
/// Every field is optional: a field that is not present on the detail page is
/// simply left out. Tag sections (cast, genres, moods, ...) are keyed by the
/// label the catalog shows for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_definition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_film: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_episode_duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_audio_description: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl ItemRecord {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Display name, if the reader found one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }

    /// Merges a fresher scrape into this record
    ///
    /// Populated fields of `fresher` overwrite this record's values; fields
    /// `fresher` lacks are kept as they are. A field is never cleared.
    pub fn merge_from(&mut self, fresher: ItemRecord) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.name, fresher.name);
        take(&mut self.release, fresher.release);
        take(&mut self.content_rating, fresher.content_rating);
        take(&mut self.duration, fresher.duration);
        take(&mut self.image_definition, fresher.image_definition);
        take(&mut self.description, fresher.description);
        take(&mut self.rating_reason, fresher.rating_reason);
        take(&mut self.maturity_description, fresher.maturity_description);
        take(&mut self.is_film, fresher.is_film);
        take(
            &mut self.average_episode_duration,
            fresher.average_episode_duration,
        );
        take(&mut self.has_audio_description, fresher.has_audio_description);
        self.tags.extend(fresher.tags);
    }
}

/// Parses an item id as rendered in a catalog link
///
/// Returns None for anything that is not a plain unsigned integer.
pub fn parse_item_id(raw: &str) -> Option<ItemId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
