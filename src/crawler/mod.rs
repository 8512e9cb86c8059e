//! Crawler module for the acquisition passes
//!
//! This module contains the core crawl logic:
//! - `Coordinator`, which runs the ids, titles and thumbnails passes
//! - `PassReport`, the per-pass outcome recorded in the pass journal
//! - `build_coordinator`, which wires the configured adapters together

mod coordinator;
mod report;

pub use coordinator::Coordinator;
pub use report::PassReport;

use crate::catalog::CatalogInputs;
use crate::config::Config;
use crate::extract::ExtractSettings;
use crate::identity::build_identity_controller;
use crate::reader::ChromeLauncher;
use crate::store::{open_store, JsonStore};
use crate::Result;

/// Coordinator backed by the JSON store and a Chromium browser
pub type CatalogCoordinator = Coordinator<JsonStore, ChromeLauncher>;

/// Builds a coordinator from the configuration
///
/// This loads the input files, opens (creating if needed) the state
/// directory, and sets up the configured identity and browser adapters.
pub fn build_coordinator(config: &Config) -> Result<CatalogCoordinator> {
    let inputs = CatalogInputs::load(&config.paths.input_dir)?;
    tracing::info!(
        "Loaded {} regions and {} genres",
        inputs.regions.len(),
        inputs.genres.len()
    );

    let identity =
        build_identity_controller(&config.identity, inputs.unaltered_addresses.clone())?;
    let launcher = ChromeLauncher::new(&config.browser, inputs.cookies.clone())?;
    let store = open_store(&config.paths.output_dir)?;

    Ok(Coordinator::new(
        inputs,
        identity,
        launcher,
        store,
        ExtractSettings::from(&config.browser),
    ))
}
