//! Catalog-Atlas: a region-rotating catalog mapper
//!
//! This crate builds a cross-region catalog of items from a geo-restricted
//! online catalog. It rotates its network identity per region, exhaustively
//! enumerates the lazily loaded catalog lists visible from each region and
//! merges everything into a resumable set of JSON state files.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod identity;
pub mod output;
pub mod reader;
pub mod state;
pub mod store;

use thiserror::Error;

/// Main error type for Catalog-Atlas operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network identity error: {0}")]
    Identity(#[from] identity::IdentityError),

    #[error("Storage error: {0}")]
    Storage(#[from] store::StorageError),

    #[error("Page reader error: {0}")]
    Reader(#[from] reader::ReaderError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PassState,
        to: state::PassState,
    },

    #[error("Region {0} is not listed in the regions input")]
    UnknownRegion(String),

    #[error("Failed to read input file {path}: {message}")]
    Input { path: String, message: String },

    #[error("No genres are listed; run discover-genres or fill in genres.json")]
    NoGenres,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Catalog-Atlas operations
pub type Result<T> = std::result::Result<T, CatalogError>;

// Re-export commonly used types
pub use catalog::{Genre, ItemId, ItemRecord, Region, Thumbnail};
pub use config::Config;
pub use crawler::{Coordinator, PassReport};
pub use state::{PassKind, PassState};
pub use store::{clean_id_set, merge_availability, missing_against, JsonStore};
