//! Single-endpoint probing and UP/DOWN classification

use crate::transport::{ProbeRequest, Transport};
use crate::types::{Endpoint, ProbeOutcome, ProbeResult, Verdict, as_millis_f64};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, instrument};

/// UP requires a 2xx status *and* a response no slower than `latency_threshold`.
///
/// The two checks are independent of the transport timeout.
pub fn classify(status_code: u16, elapsed: Duration, latency_threshold: Duration) -> bool {
    (200..300).contains(&status_code) && elapsed <= latency_threshold
}

/// Probes endpoints through an injected transport
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
    latency_threshold: Duration,
}

impl Prober {
    pub fn new(
        transport: Arc<dyn Transport>,
        request_timeout: Duration,
        latency_threshold: Duration,
    ) -> Self {
        Self {
            transport,
            request_timeout,
            latency_threshold,
        }
    }

    /// Probe one endpoint. Never fails: every problem becomes a DOWN result.
    #[instrument(skip_all, fields(url = %endpoint.url))]
    pub async fn probe(&self, endpoint: &Endpoint) -> ProbeResult {
        if let Some(reason) = endpoint.config_error() {
            error!("Cannot probe {}: {}", endpoint.url, reason);
            return ProbeResult {
                url: endpoint.url.clone(),
                status_code: None,
                elapsed_ms: 0.0,
                is_up: false,
                outcome: ProbeOutcome::ConfigError { reason },
            };
        }

        let request = ProbeRequest {
            method: &endpoint.method,
            url: &endpoint.url,
            headers: &endpoint.headers,
            payload: endpoint.payload.as_json(),
            timeout: self.request_timeout,
        };

        let started = Instant::now();
        match self.transport.send(request).await {
            Ok(response) => {
                let is_up = classify(response.status_code, response.elapsed, self.latency_threshold);
                let elapsed_ms = as_millis_f64(response.elapsed);

                info!(
                    "Checked {} [{}] - Status: {}, Time: {:.2}ms",
                    endpoint.url,
                    Verdict::from(is_up),
                    response.status_code,
                    elapsed_ms
                );

                ProbeResult {
                    url: endpoint.url.clone(),
                    status_code: Some(response.status_code),
                    elapsed_ms,
                    is_up,
                    outcome: ProbeOutcome::Response {
                        status_code: response.status_code,
                        elapsed: response.elapsed,
                    },
                }
            }
            Err(e) => {
                error!("Error checking {}: {}", endpoint.url, e);

                ProbeResult {
                    url: endpoint.url.clone(),
                    status_code: None,
                    elapsed_ms: as_millis_f64(started.elapsed()),
                    is_up: false,
                    outcome: ProbeOutcome::TransportFailure {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}
