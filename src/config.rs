//! Configuration for the SanketaCNC endpoint
//!
//! Loads configuration from a TOML file with the minimal parameters needed
//! by the protocol engine and the driver factories.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub hub: HubConfig,
    pub sensor: SensorConfig,
    pub timeouts: TimeoutConfig,
    pub logging: LoggingConfig,
}

/// Network configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// UDP bind address for advertisement and session traffic
    ///
    /// Discovery broadcasts embed this address, so a routable local IP
    /// (not `0.0.0.0`) should be configured on multi-homed nodes.
    ///
    /// Examples:
    /// - `192.168.4.1:7777` - Station address on the robot's network
    /// - `127.0.0.1:7777` - Localhost only (testing)
    pub bind_address: String,
}

impl NetworkConfig {
    /// Parse the configured bind address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .map_err(|e| Error::Other(format!("Invalid bind address {:?}: {}", self.bind_address, e)))
    }
}

/// Motor hub driver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HubConfig {
    /// Hub driver type (currently only `mock`)
    #[serde(rename = "type")]
    pub hub_type: String,
}

/// Distance sensor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorConfig {
    /// Whether a distance sensor is present at all
    pub enabled: bool,
    /// Sensor driver type (currently only `mock`)
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Trigger GPIO pin (hardware drivers; the mock ignores it)
    pub trigger_pin: u32,
    /// Echo GPIO pin (hardware drivers; the mock ignores it)
    pub echo_pin: u32,
}

/// Protocol timing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    /// Per-read budget for session traffic, in milliseconds (300)
    pub read_ms: u64,
    /// Overall budget for a hub connect attempt, in milliseconds (7000)
    pub connect_ms: u64,
    /// Interval between connect polls, in milliseconds (100)
    pub connect_poll_ms: u64,
}

impl TimeoutConfig {
    /// Bounded-reader budget as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    /// Dispatcher timing policy derived from this configuration
    ///
    /// Motor hold durations are a fixed protocol policy and stay at their
    /// defaults.
    pub fn timings(&self) -> crate::server::dispatch::Timings {
        crate::server::dispatch::Timings {
            connect_timeout: Duration::from_millis(self.connect_ms),
            connect_poll: Duration::from_millis(self.connect_poll_ms),
            ..Default::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration using mock drivers
    ///
    /// Suitable for testing and development. Deployments on a real node
    /// should use a proper TOML configuration file.
    pub fn mock_defaults() -> Self {
        Self {
            network: NetworkConfig {
                bind_address: "0.0.0.0:7777".to_string(),
            },
            hub: HubConfig {
                hub_type: "mock".to_string(),
            },
            sensor: SensorConfig {
                enabled: true,
                sensor_type: "mock".to_string(),
                trigger_pin: 5,
                echo_pin: 18,
            },
            timeouts: TimeoutConfig {
                read_ms: 300,
                connect_ms: 7000,
                connect_poll_ms: 100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::mock_defaults()
    }
}
