//! Output module for reporting on the catalog state
//!
//! This module handles:
//! - Summarizing the state files into catalog statistics
//! - Printing statistics and the latest pass journal entries

pub mod stats;

pub use stats::{load_statistics, print_statistics, CatalogStatistics};
