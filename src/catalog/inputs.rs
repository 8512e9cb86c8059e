//! Read-only input files
//!
//! The input directory holds four JSON documents:
//!
//! | File | Shape |
//! |------|-------|
//! | `regions.json` | `["united-kingdom", "japan", ...]` |
//! | `genres.json` | `[{"id": "5763", "name": "Dramas"}, ...]` |
//! | `cookies.json` | `[{"name": "...", "value": "...", "domain": "..."}]` (optional) |
//! | `unaltered_addresses.json` | `["203.0.113.7", ...]` |
//!
//! `genres.json` is the one input the crawler can produce itself, through
//! genre discovery.

use crate::catalog::{Genre, Region};
use crate::store::write_json;
use crate::CatalogError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const REGIONS_FILE: &str = "regions.json";
pub const GENRES_FILE: &str = "genres.json";
pub const COOKIES_FILE: &str = "cookies.json";
pub const UNALTERED_ADDRESSES_FILE: &str = "unaltered_addresses.json";

/// An authentication cookie installed in every browser session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Everything the passes read but never write
#[derive(Debug, Clone, Default)]
pub struct CatalogInputs {
    /// Regions in the order they are visited
    pub regions: Vec<Region>,
    pub genres: Vec<Genre>,
    pub cookies: Vec<SessionCookie>,
    /// Addresses observed while no regional identity is active
    pub unaltered_addresses: HashSet<String>,
}

impl CatalogInputs {
    /// Loads the input files from `dir`
    ///
    /// `cookies.json` and `genres.json` may be absent; every other file is
    /// required.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let regions: Vec<Region> = read_json(&dir.join(REGIONS_FILE))?;

        let genres_path = dir.join(GENRES_FILE);
        let genres = if genres_path.exists() {
            read_json(&genres_path)?
        } else {
            tracing::debug!("No {} found, genres must be discovered first", GENRES_FILE);
            Vec::new()
        };

        let cookies_path = dir.join(COOKIES_FILE);
        let cookies = if cookies_path.exists() {
            read_json(&cookies_path)?
        } else {
            tracing::debug!("No {} found, sessions start without cookies", COOKIES_FILE);
            Vec::new()
        };

        let unaltered: Vec<String> = read_json(&dir.join(UNALTERED_ADDRESSES_FILE))?;

        Ok(Self {
            regions: dedup_regions(regions),
            genres,
            cookies,
            unaltered_addresses: unaltered.into_iter().map(|a| a.trim().to_string()).collect(),
        })
    }
}

/// Replaces `genres.json` in `dir` with `genres`
pub fn write_genres(dir: &Path, genres: &[Genre]) -> Result<(), CatalogError> {
    write_json(&dir.join(GENRES_FILE), genres)?;
    tracing::info!("Wrote {} genres to {}", genres.len(), dir.join(GENRES_FILE).display());
    Ok(())
}

/// Drops repeated regions, keeping the first occurrence
fn dedup_regions(regions: Vec<Region>) -> Vec<Region> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(regions.len());
    for region in regions {
        if seen.insert(region.clone()) {
            ordered.push(region);
        } else {
            tracing::warn!("Region {} is listed more than once, ignoring repeat", region);
        }
    }
    ordered
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Input {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CatalogError::Input {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
