//! Gateway configuration
//!
//! Bind address for the local CoAP engine, the Resource Directory location,
//! protocol debug verbosity, and the tunables that were hard-coded in older
//! deployments (housekeeping interval, URI staging buffer size).

use crate::error::{GatewayError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default CoAP UDP port (RFC 7252)
pub const COAP_DEFAULT_PORT: u16 = 5683;

/// Gateway service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Local address the CoAP engine binds to
    pub bind_addr: String,
    /// Local port the CoAP engine binds to (0 = ephemeral)
    pub bind_port: u16,
    /// Protocol debug verbosity (0 = quiet, higher = chattier engine logs)
    pub debug_level: u8,
    /// Resource Directory host (hostname or literal address)
    pub rd_addr: String,
    /// Resource Directory port
    pub rd_port: u16,
    /// Interval between engine housekeeping runs, in seconds
    pub timer_interval_secs: u64,
    /// Upper bound on decoded URI path/query bytes during compilation
    pub uri_buffer_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            bind_port: 0,
            debug_level: 0,
            rd_addr: "127.0.0.1".to_string(),
            rd_port: COAP_DEFAULT_PORT,
            timer_interval_secs: 5,
            uri_buffer_limit: 40,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Housekeeping interval as a [`Duration`]
    pub fn timer_interval(&self) -> Duration {
        Duration::from_secs(self.timer_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.rd_port, COAP_DEFAULT_PORT);
        assert_eq!(config.timer_interval(), Duration::from_secs(5));
        assert_eq!(config.uri_buffer_limit, 40);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rd_addr": "rd.example.org", "rd_port": 61616, "debug_level": 2}}"#
        )
        .unwrap();

        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rd_addr, "rd.example.org");
        assert_eq!(config.rd_port, 61616);
        assert_eq!(config.debug_level, 2);
        // unspecified fields keep their defaults
        assert_eq!(config.bind_addr, "0.0.0.0");
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = GatewayConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
