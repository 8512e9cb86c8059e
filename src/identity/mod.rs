//! Network identity rotation
//!
//! This module owns the one resource the whole crawl is serialized around:
//! the active regional network identity. It contains:
//! - The `VpnClient` and `AddressProbe` seams
//! - `IdentityController`, which confirms every identity change by polling
//! - Command-line and HTTP implementations of both seams

mod client;
mod controller;
mod probe;

pub use client::CommandVpnClient;
pub use controller::{IdentityController, IdentitySettings, PollOutcome};
pub use probe::{parse_interface_address, HttpProbe, InterfaceProbe};

use crate::catalog::Region;
use crate::config::{IdentityConfig, ProbeKind};
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while changing or observing the network identity
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No IPv4 address found in interface output")]
    NoAddress,

    #[error("Address probe failed: {0}")]
    Probe(String),

    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

/// Requests regional identities from a VPN client
#[async_trait]
pub trait VpnClient: Send + Sync {
    /// Asks the client to drop every regional identity
    async fn disconnect_all(&self) -> Result<(), IdentityError>;

    /// Asks the client to establish `region`'s identity
    ///
    /// Returning `Ok` only means the request was accepted; the identity
    /// change itself is confirmed by polling an [`AddressProbe`].
    async fn connect(&self, region: &Region) -> Result<(), IdentityError>;
}

/// Observes the current network address
#[async_trait]
pub trait AddressProbe: Send + Sync {
    async fn current_address(&self) -> Result<String, IdentityError>;
}

/// Builds the identity controller described by the configuration
pub fn build_identity_controller(
    config: &IdentityConfig,
    unaltered_addresses: HashSet<String>,
) -> Result<IdentityController, IdentityError> {
    let client = CommandVpnClient::new(
        config.connect_command.clone(),
        config.disconnect_command.clone(),
    );

    let probe: Box<dyn AddressProbe> = match config.probe {
        ProbeKind::Interface => Box::new(InterfaceProbe::new(config.interface_command.clone())),
        ProbeKind::Http => Box::new(HttpProbe::new(&config.probe_url)?),
    };

    Ok(IdentityController::new(
        Box::new(client),
        probe,
        unaltered_addresses,
        IdentitySettings::from(config),
    ))
}
