use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Catalog-Atlas
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub identity: IdentityConfig,
    pub browser: BrowserConfig,
    pub paths: PathsConfig,
}

/// Which mechanism is used to observe the current network address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeKind {
    /// Parse the output of a local interface listing command
    Interface,
    /// Ask a remote echo service over HTTP
    Http,
}

/// Network identity rotation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Region that needs no identity change at all
    #[serde(rename = "home-region")]
    pub home_region: String,

    /// Maximum address polls while waiting for a regional identity
    #[serde(rename = "connect-attempts", default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Maximum address polls while waiting for the home identity
    #[serde(rename = "disconnect-attempts", default = "default_disconnect_attempts")]
    pub disconnect_attempts: u32,

    /// Interval between address polls (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after a confirmed identity change before it is used (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Address lookup mechanism
    #[serde(default = "default_probe")]
    pub probe: ProbeKind,

    /// Echo service queried by the HTTP probe
    #[serde(rename = "probe-url", default = "default_probe_url")]
    pub probe_url: String,

    /// Command listing network interfaces, used by the interface probe
    #[serde(rename = "interface-command", default = "default_interface_command")]
    pub interface_command: Vec<String>,

    /// Command requesting a regional identity; `{region}` is substituted
    #[serde(rename = "connect-command")]
    pub connect_command: Vec<String>,

    /// Command tearing down every regional identity
    #[serde(rename = "disconnect-command")]
    pub disconnect_command: Vec<String>,
}

impl IdentityConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Root URL of the catalog site
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(rename = "window-width", default = "default_window_width")]
    pub window_width: u32,

    #[serde(rename = "window-height", default = "default_window_height")]
    pub window_height: u32,

    /// How long to wait for a list to grow after a load-more trigger (milliseconds)
    #[serde(rename = "load-timeout-ms", default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Interval between content extent checks while waiting (milliseconds)
    #[serde(rename = "load-poll-interval-ms", default = "default_load_poll_interval_ms")]
    pub load_poll_interval_ms: u64,

    /// Pause after the list grew, before the next snapshot (milliseconds)
    #[serde(rename = "scroll-delay-ms", default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Upper bound on load-more rounds for a single list
    #[serde(rename = "max-scroll-rounds", default = "default_max_scroll_rounds")]
    pub max_scroll_rounds: u32,

    /// How long to wait for a search result when looking up a thumbnail (milliseconds)
    #[serde(rename = "thumbnail-timeout-ms", default = "default_thumbnail_timeout_ms")]
    pub thumbnail_timeout_ms: u64,
}

/// Input and state file locations
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding regions.json, genres.json, cookies.json and
    /// unaltered_addresses.json
    #[serde(rename = "input-dir")]
    pub input_dir: PathBuf,

    /// Directory receiving every state file
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,
}

fn default_connect_attempts() -> u32 {
    180
}

fn default_disconnect_attempts() -> u32 {
    60
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_settle_delay_ms() -> u64 {
    5000
}

fn default_probe() -> ProbeKind {
    ProbeKind::Interface
}

fn default_probe_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_interface_command() -> Vec<String> {
    vec!["ipconfig".to_string()]
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    800
}

fn default_load_timeout_ms() -> u64 {
    3000
}

fn default_load_poll_interval_ms() -> u64 {
    100
}

fn default_scroll_delay_ms() -> u64 {
    1000
}

fn default_max_scroll_rounds() -> u32 {
    10_000
}

fn default_thumbnail_timeout_ms() -> u64 {
    30_000
}
