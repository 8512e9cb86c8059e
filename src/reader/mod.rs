//! Page reader: browsing sessions and field extraction
//!
//! The crawl only depends on the [`CatalogSession`] and [`SessionLauncher`]
//! traits. This module also provides:
//! - `html`: selector-based extraction from rendered catalog pages
//! - `urls`: catalog URL construction
//! - `browser`: a Chromium-backed session

mod browser;
pub mod html;
mod urls;

pub use browser::{ChromeLauncher, ChromeSession};
pub use urls::CatalogUrls;

use crate::catalog::{Genre, ItemId, ItemRecord, Thumbnail};
use crate::extract::{extract_all, ExtractSettings, ListView};
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// Landing genres whose menus list every other genre, with the suffix
/// appended to the names found there
pub const GENRE_INDEXES: [(&str, &str); 2] = [("34399", " Films"), ("83", " Programmes")];

/// Errors raised by a browsing session
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Page evaluation failed: {0}")]
    Evaluation(String),

    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

/// One open browsing session on the catalog
///
/// Every scrape navigates the session itself and returns a best-effort
/// result: a field missing from the page is left out of the record rather
/// than failing the call.
#[async_trait]
pub trait CatalogSession: ListView {
    /// Navigates to a genre's list view
    async fn open_genre(&mut self, genre: &Genre) -> Result<(), ReaderError>;

    /// Opens the genre menu of the landing genre `landing_id` and reads it
    ///
    /// Every entry's name gets `suffix` appended.
    async fn scrape_genre_menu(
        &mut self,
        landing_id: &str,
        suffix: &str,
    ) -> Result<Vec<Genre>, ReaderError>;

    /// Reads the detail record of one item
    async fn scrape_title(&mut self, id: ItemId) -> Result<ItemRecord, ReaderError>;

    /// Looks up the thumbnail of the item displayed as `name`
    ///
    /// `Ok(None)` means the lookup found no matching result.
    async fn scrape_thumbnail(&mut self, name: &str) -> Result<Option<Thumbnail>, ReaderError>;

    /// Releases the session
    async fn close(&mut self) -> Result<(), ReaderError>;
}

/// Opens browsing sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: CatalogSession;

    async fn launch(&self) -> Result<Self::Session, ReaderError>;
}

/// Enumerates every item id listed under `genre`
pub async fn scrape_ids<S>(
    session: &mut S,
    genre: &Genre,
    settings: &ExtractSettings,
) -> Result<Vec<ItemId>, ReaderError>
where
    S: CatalogSession + ?Sized,
{
    tracing::debug!("Scraping ids from genre {} ({})...", genre.id, genre.name);
    session.open_genre(genre).await?;
    extract_all(session, settings).await
}

/// Lists every genre reachable from the landing genres' menus
///
/// Genres are returned in menu order. A genre id listed under more than one
/// landing genre keeps its first name.
pub async fn discover_genres<S>(session: &mut S) -> Result<Vec<Genre>, ReaderError>
where
    S: CatalogSession + ?Sized,
{
    let mut seen = HashSet::new();
    let mut genres = Vec::new();
    for (landing_id, suffix) in GENRE_INDEXES {
        tracing::info!("Scraping{} genres...", suffix.to_lowercase());
        for genre in session.scrape_genre_menu(landing_id, suffix).await? {
            if seen.insert(genre.id.clone()) {
                genres.push(genre);
            }
        }
    }
    Ok(genres)
}
