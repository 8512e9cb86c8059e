//! VPN client driven through its command-line interface

use crate::catalog::Region;
use crate::config::REGION_PLACEHOLDER;
use crate::identity::{IdentityError, VpnClient};
use async_trait::async_trait;
use tokio::process::Command;

/// Drives a VPN client by running its connect and disconnect commands
#[derive(Debug, Clone)]
pub struct CommandVpnClient {
    connect_command: Vec<String>,
    disconnect_command: Vec<String>,
}

impl CommandVpnClient {
    pub fn new(connect_command: Vec<String>, disconnect_command: Vec<String>) -> Self {
        Self {
            connect_command,
            disconnect_command,
        }
    }

    /// The connect command with `{region}` substituted
    pub fn connect_args(&self, region: &Region) -> Vec<String> {
        self.connect_command
            .iter()
            .map(|arg| arg.replace(REGION_PLACEHOLDER, region.as_str()))
            .collect()
    }
}

#[async_trait]
impl VpnClient for CommandVpnClient {
    async fn disconnect_all(&self) -> Result<(), IdentityError> {
        run_command(&self.disconnect_command).await.map(|_| ())
    }

    async fn connect(&self, region: &Region) -> Result<(), IdentityError> {
        run_command(&self.connect_args(region)).await.map(|_| ())
    }
}

/// Runs a command to completion and returns its standard output
///
/// A command that cannot be spawned or exits unsuccessfully is an error.
pub(crate) async fn run_command(args: &[String]) -> Result<String, IdentityError> {
    let (program, rest) = args.split_first().ok_or_else(|| IdentityError::Command {
        command: String::new(),
        message: "empty command".to_string(),
    })?;

    let output = Command::new(program)
        .args(rest)
        .output()
        .await
        .map_err(|e| IdentityError::Command {
            command: args.join(" "),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(IdentityError::Command {
            command: args.join(" "),
            message: format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
