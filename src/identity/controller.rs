//! Identity controller
//!
//! Connection establishment is asynchronous and the VPN client offers no
//! notification, so every identity change is confirmed by polling the
//! current address against the set of addresses seen without any regional
//! identity. Every poll is bounded.

use crate::catalog::Region;
use crate::config::IdentityConfig;
use crate::identity::{AddressProbe, IdentityError, VpnClient};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;

/// Timing and budget of the identity polls
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// Region served without any identity change
    pub home_region: Region,
    pub connect_attempts: u32,
    pub disconnect_attempts: u32,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl From<&IdentityConfig> for IdentitySettings {
    fn from(config: &IdentityConfig) -> Self {
        Self {
            home_region: Region::new(config.home_region.clone()),
            connect_attempts: config.connect_attempts,
            disconnect_attempts: config.disconnect_attempts,
            poll_interval: config.poll_interval(),
            settle_delay: config.settle_delay(),
        }
    }
}

/// Result of a bounded address poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The address reached the awaited condition
    Converged,
    /// The attempt budget ran out first
    Exhausted,
}

/// Establishes, confirms and tears down regional identities
pub struct IdentityController {
    client: Box<dyn VpnClient>,
    probe: Box<dyn AddressProbe>,
    unaltered: HashSet<String>,
    settings: IdentitySettings,
}

impl IdentityController {
    pub fn new(
        client: Box<dyn VpnClient>,
        probe: Box<dyn AddressProbe>,
        unaltered: HashSet<String>,
        settings: IdentitySettings,
    ) -> Self {
        Self {
            client,
            probe,
            unaltered,
            settings,
        }
    }

    /// Tears down any regional identity and waits for the home address
    ///
    /// Safe to call with no identity active. Not converging within the
    /// budget is only logged; the caller proceeds either way.
    ///
    /// # Errors
    ///
    /// Only when the current address cannot be observed at all.
    pub async fn disconnect(&self) -> Result<PollOutcome, IdentityError> {
        self.release().await;

        let outcome = self
            .poll(self.settings.disconnect_attempts, |address| {
                self.unaltered.contains(address)
            })
            .await?;

        if outcome == PollOutcome::Exhausted {
            tracing::warn!(
                "Address did not return to a known home address after {} checks",
                self.settings.disconnect_attempts
            );
        }
        Ok(outcome)
    }

    /// Switches to `region`'s identity
    ///
    /// Always disconnects first. The home region succeeds right after the
    /// disconnect. Any other region succeeds once the observed address is no
    /// longer a home address and the settle delay has passed.
    ///
    /// # Arguments
    ///
    /// * `region` - The region whose identity to establish
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Identity confirmed
    /// * `Ok(false)` - The region could not be reached within the budget
    /// * `Err(IdentityError)` - The current address cannot be observed
    pub async fn connect(&self, region: &Region) -> Result<bool, IdentityError> {
        self.disconnect().await?;

        tracing::info!("Connecting to {}...", region);

        if *region == self.settings.home_region {
            tracing::debug!("{} is the home region, no identity change needed", region);
            return Ok(true);
        }

        if let Err(e) = self.client.connect(region).await {
            tracing::warn!("Connection request for {} was refused: {}", region, e);
            return Ok(false);
        }

        let outcome = self
            .poll(self.settings.connect_attempts, |address| {
                !self.unaltered.contains(address)
            })
            .await?;

        match outcome {
            PollOutcome::Converged => {
                sleep(self.settings.settle_delay).await;
                tracing::info!("Connected to {}", region);
                Ok(true)
            }
            PollOutcome::Exhausted => {
                tracing::warn!("Connection to {} is no longer available", region);
                Ok(false)
            }
        }
    }

    /// Asks the client to drop any identity without waiting for it
    pub async fn release(&self) {
        if let Err(e) = self.client.disconnect_all().await {
            tracing::debug!("Disconnect request failed: {}", e);
        }
    }

    /// Checks the address up to `attempts` times until `accept` holds
    ///
    /// The interval is only slept between checks, so an address that already
    /// satisfies the condition returns immediately. A lookup error on the
    /// first check is returned. Once an address has been observed, a failed
    /// lookup counts as a check that did not match.
    async fn poll<F>(&self, attempts: u32, accept: F) -> Result<PollOutcome, IdentityError>
    where
        F: Fn(&str) -> bool,
    {
        let mut observed = false;
        for attempt in 1..=attempts {
            match self.probe.current_address().await {
                Ok(address) => {
                    observed = true;
                    if accept(&address) {
                        tracing::trace!("Address {} accepted after {} checks", address, attempt);
                        return Ok(PollOutcome::Converged);
                    }
                }
                Err(e) if observed => {
                    tracing::debug!("Address check {} failed: {}", attempt, e);
                }
                Err(e) => return Err(e),
            }
            if attempt < attempts {
                sleep(self.settings.poll_interval).await;
            }
        }
        Ok(PollOutcome::Exhausted)
    }
}

impl std::fmt::Debug for IdentityController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityController")
            .field("unaltered", &self.unaltered)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
