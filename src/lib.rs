//! HTTP Endpoint Availability Monitor Library
//!
//! This library probes a list of HTTP endpoints on a fixed, drift-corrected
//! interval, classifies each probe as UP or DOWN, and reports cumulative
//! availability per domain after every cycle.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod monitor;
pub mod prober;
pub mod stats;
pub mod transport;
pub mod types;

pub use config::{EndpointSpec, MonitorConfig, load_endpoints};
pub use domain::{DomainKey, extract_domain};
pub use errors::{MonitorError, Result};
pub use monitor::{CycleSummary, Monitor, Schedule};
pub use prober::{Prober, classify};
pub use stats::{DomainAvailability, DomainStats, StatsAggregator};
pub use transport::{HttpTransport, ProbeRequest, Transport, TransportResponse};
pub use types::{ConfiguredEndpoint, Endpoint, Payload, ProbeOutcome, ProbeResult, Verdict};
