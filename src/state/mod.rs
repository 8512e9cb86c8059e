//! State module for tracking pass progress
//!
//! # Components
//!
//! - `PassKind`: which of the three acquisition passes is running
//! - `PassState`: the per-region state machine every pass walks through

mod pass_state;

pub use pass_state::{PassKind, PassState};
