//! HTTP transport used to probe endpoints

use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::debug;

/// Everything needed to issue one probe request
#[derive(Debug, Clone, Copy)]
pub struct ProbeRequest<'a> {
    pub method: &'a Method,
    pub url: &'a str,
    pub headers: &'a HashMap<String, String>,
    pub payload: Option<&'a Value>,
    pub timeout: Duration,
}

/// Status line of a completed exchange and how long it took to arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    pub status_code: u16,
    pub elapsed: Duration,
}

/// Capability to perform a single HTTP request.
///
/// Any error returned is treated as a transport-level failure by the prober.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ProbeRequest<'_>) -> Result<TransportResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport. `default_timeout` applies to the client;
    /// each request still carries its own limit.
    pub fn new(default_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(default_timeout)
            .user_agent(format!("endpoint_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ProbeRequest<'_>) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url)
            .timeout(request.timeout);

        for (name, value) in request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(payload) = request.payload {
            builder = builder.json(payload);
        }

        debug!("Sending {} {}", request.method, request.url);

        let start = Instant::now();
        let response = timeout(request.timeout, builder.send())
            .await
            .map_err(|_| MonitorError::Timeout(request.timeout))?
            .map_err(|e| {
                if e.is_timeout() {
                    MonitorError::Timeout(request.timeout)
                } else if e.is_connect() {
                    MonitorError::Transport(format!("connection failed: {}", e))
                } else {
                    MonitorError::Http(e)
                }
            })?;
        let elapsed = start.elapsed();

        Ok(TransportResponse {
            status_code: response.status().as_u16(),
            elapsed,
        })
    }
}
