//! Address probes
//!
//! - `InterfaceProbe` reads the local interface listing (e.g. `ipconfig`)
//! - `HttpProbe` asks a remote echo service for the public address

use crate::identity::client::run_command;
use crate::identity::{AddressProbe, IdentityError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Extracts the address from the first `IPv4` line of an interface listing
///
/// The address is whatever follows the first `:` on that line, with a
/// trailing `(Preferred)` marker removed.
///
/// # Example
///
/// ```
/// use catalog_atlas::identity::parse_interface_address;
///
/// let output = "Ethernet adapter:\n   IPv4 Address. . . . . . : 192.168.1.20\n";
/// assert_eq!(parse_interface_address(output), Some("192.168.1.20".to_string()));
/// ```
pub fn parse_interface_address(output: &str) -> Option<String> {
    let line = output.lines().find(|line| line.contains("IPv4"))?;
    let (_, value) = line.split_once(':')?;
    let address = value.trim().trim_end_matches("(Preferred)").trim();
    if address.is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}

/// Reads the current address from a local interface listing command
#[derive(Debug, Clone)]
pub struct InterfaceProbe {
    command: Vec<String>,
}

impl InterfaceProbe {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl AddressProbe for InterfaceProbe {
    async fn current_address(&self) -> Result<String, IdentityError> {
        let output = run_command(&self.command).await?;
        parse_interface_address(&output).ok_or(IdentityError::NoAddress)
    }
}

/// Reads the current public address from an HTTP echo service
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: &str) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| IdentityError::Probe(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl AddressProbe for HttpProbe {
    async fn current_address(&self) -> Result<String, IdentityError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| IdentityError::Probe(format!("{}: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Probe(format!(
                "{} answered HTTP {}",
                self.url,
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Probe(format!("{}: {}", self.url, e)))?;

        let address = body.trim();
        if address.is_empty() {
            return Err(IdentityError::NoAddress);
        }
        Ok(address.to_string())
    }
}
