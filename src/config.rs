//! Configuration management for the endpoint monitor

use crate::errors::{MonitorError, Result};
use crate::types::ConfiguredEndpoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One endpoint entry as written in the YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub url: Option<String>,
    pub method: Option<String>,
    /// Scalar values of any YAML type; they are sent as their text form
    pub headers: Option<HashMap<String, serde_yaml::Value>>,
    /// Textual YAML/JSON payload, parsed into the request body
    pub body: Option<String>,
}

/// Longest accepted interval between cycle starts
pub const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted per-request timeout
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Runtime settings for the monitor loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Time between scheduled cycle starts
    pub check_interval: Duration,

    /// Hard limit on a single request
    pub request_timeout: Duration,

    /// Slowest response still classified as UP
    pub latency_threshold: Duration,

    /// Durable log sink
    pub log_file: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(15),
            request_timeout: Duration::from_millis(500),
            latency_threshold: Duration::from_millis(500),
            log_file: PathBuf::from("monitor.log"),
        }
    }
}

impl MonitorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.check_interval.is_zero() {
            return Err("check_interval must be greater than 0".to_string());
        }

        if self.check_interval > MAX_CHECK_INTERVAL {
            return Err(format!(
                "check_interval cannot exceed {}s",
                MAX_CHECK_INTERVAL.as_secs()
            ));
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be greater than 0".to_string());
        }

        if self.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(format!(
                "request_timeout cannot exceed {}ms",
                MAX_REQUEST_TIMEOUT.as_millis()
            ));
        }

        if self.log_file.as_os_str().is_empty() {
            return Err("log_file cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Load the endpoint list from a YAML file
pub fn load_endpoints(path: &Path) -> Result<Vec<ConfiguredEndpoint>> {
    let content = std::fs::read_to_string(path)?;
    parse_endpoints(&content)
}

/// Parse an endpoint list; the document must be a YAML sequence
pub fn parse_endpoints(content: &str) -> Result<Vec<ConfiguredEndpoint>> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)?;

    if !document.is_sequence() {
        return Err(MonitorError::Config(
            "Invalid YAML structure: Expected a list of endpoints".to_string(),
        ));
    }

    let specs: Vec<EndpointSpec> = serde_yaml::from_value(document)?;

    Ok(specs
        .into_iter()
        .enumerate()
        .map(|(position, spec)| ConfiguredEndpoint::from_spec(position, spec))
        .collect())
}
