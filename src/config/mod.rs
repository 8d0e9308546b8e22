//! Configuration module

use serde::Deserialize;

/// Lower bound for the poll interval (seconds)
pub const MIN_SCAN_INTERVAL: u64 = 5;
/// Lower bound for the presence window (seconds)
pub const MIN_AWAY_TIME: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pihole: PiholeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PiholeConfig {
    #[serde(default = "default_pihole_host")]
    pub host: String,
    /// Seconds between refresh cycles
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    /// Seconds since the last DNS query after which a device counts as away
    #[serde(default = "default_away_time")]
    pub away_time: u64,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for PiholeConfig {
    fn default() -> Self {
        Self {
            host: default_pihole_host(),
            scan_interval: default_scan_interval(),
            away_time: default_away_time(),
            request_timeout: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_pihole_host() -> String {
    "http://pi.hole".to_string()
}

fn default_scan_interval() -> u64 {
    30
}

fn default_away_time() -> u64 {
    900
}

fn default_request_timeout() -> u64 {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

impl PiholeConfig {
    /// Base URL with any trailing slash removed, so endpoint paths can be appended directly
    pub fn base_url(&self) -> String {
        self.host.trim().trim_end_matches('/').to_string()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let base = self.base_url();
        let parsed = url::Url::parse(&base)
            .map_err(|e| anyhow::anyhow!("Invalid pihole.host '{}': {}", self.host, e))?;
        anyhow::ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            "pihole.host must use http or https, got '{}'",
            parsed.scheme()
        );
        anyhow::ensure!(
            self.scan_interval >= MIN_SCAN_INTERVAL,
            "pihole.scan_interval must be at least {} seconds (got {})",
            MIN_SCAN_INTERVAL,
            self.scan_interval
        );
        anyhow::ensure!(
            self.away_time >= MIN_AWAY_TIME,
            "pihole.away_time must be at least {} seconds (got {})",
            MIN_AWAY_TIME,
            self.away_time
        );
        anyhow::ensure!(
            self.request_timeout >= 1,
            "pihole.request_timeout must be at least 1 second"
        );
        Ok(())
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("PIHOLE_PRESENCE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.pihole.validate()?;

        Ok(config)
    }
}
