//! Endpoint and probe data structures

use crate::config::EndpointSpec;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Request payload parsed from an endpoint's textual `body`
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    None,
    Json(Value),
    /// The body could not be parsed; holds the parser message
    Invalid(String),
}

impl Payload {
    /// Parse a YAML (or JSON, which is a YAML subset) body into a JSON payload.
    ///
    /// Blank bodies and documents that evaluate to `null` carry no payload.
    pub fn parse(body: Option<&str>) -> Self {
        let Some(text) = body.filter(|b| !b.trim().is_empty()) else {
            return Payload::None;
        };

        let parsed = serde_yaml::from_str::<serde_yaml::Value>(text)
            .map_err(|e| e.to_string())
            .and_then(|yaml| serde_json::to_value(yaml).map_err(|e| e.to_string()));

        match parsed {
            Ok(Value::Null) => Payload::None,
            Ok(value) => Payload::Json(value),
            Err(reason) => Payload::Invalid(reason),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// A validated endpoint, built once at load time
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub payload: Payload,
    invalid_method: Option<String>,
    invalid_header: Option<String>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: HashMap::new(),
            payload: Payload::None,
            invalid_method: None,
            invalid_header: None,
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        match Method::from_bytes(method.trim().to_uppercase().as_bytes()) {
            Ok(parsed) => {
                self.method = parsed;
                self.invalid_method = None;
            }
            Err(_) => self.invalid_method = Some(method.to_string()),
        }
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a header written as any YAML scalar; numbers and booleans keep their
    /// textual form. Sequences and mappings make the endpoint misconfigured.
    pub fn with_yaml_header(mut self, key: impl Into<String>, value: &serde_yaml::Value) -> Self {
        let key = key.into();
        let text = match value {
            serde_yaml::Value::String(text) => text.clone(),
            serde_yaml::Value::Number(number) => number.to_string(),
            serde_yaml::Value::Bool(flag) => flag.to_string(),
            serde_yaml::Value::Null => String::new(),
            _ => {
                self.invalid_header.get_or_insert(key);
                return self;
            }
        };
        self.headers.insert(key, text);
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.payload = Payload::parse(Some(body));
        self
    }

    /// Describe why this endpoint cannot be probed, if it is misconfigured
    pub fn config_error(&self) -> Option<String> {
        if let Some(method) = &self.invalid_method {
            return Some(format!("invalid HTTP method '{}'", method));
        }
        if let Some(header) = &self.invalid_header {
            return Some(format!("invalid value for header '{}'", header));
        }
        if let Payload::Invalid(reason) = &self.payload {
            return Some(format!("malformed request body: {}", reason));
        }
        None
    }
}

/// One entry of the endpoint list, in configured order
#[derive(Clone, Debug)]
pub enum ConfiguredEndpoint {
    Ready(Endpoint),
    /// Entry without a usable `url`; skipped with a warning every cycle
    MissingUrl { position: usize },
}

impl ConfiguredEndpoint {
    pub fn from_spec(position: usize, spec: EndpointSpec) -> Self {
        let url = match spec.url {
            Some(url) if !url.trim().is_empty() => url,
            _ => return ConfiguredEndpoint::MissingUrl { position },
        };

        let mut endpoint = Endpoint::new(url);
        if let Some(method) = spec.method.as_deref() {
            endpoint = endpoint.with_method(method);
        }
        for (key, value) in spec.headers.unwrap_or_default() {
            endpoint = endpoint.with_yaml_header(key, &value);
        }
        endpoint.payload = Payload::parse(spec.body.as_deref());

        ConfiguredEndpoint::Ready(endpoint)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Up,
    Down,
}

impl From<bool> for Verdict {
    fn from(is_up: bool) -> Self {
        if is_up { Verdict::Up } else { Verdict::Down }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Up => write!(f, "UP"),
            Verdict::Down => write!(f, "DOWN"),
        }
    }
}

/// What happened when an endpoint was probed
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeOutcome {
    Response { status_code: u16, elapsed: Duration },
    TransportFailure { reason: String },
    ConfigError { reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    pub status_code: Option<u16>,
    pub elapsed_ms: f64,
    pub is_up: bool,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn verdict(&self) -> Verdict {
        Verdict::from(self.is_up)
    }
}

/// Convert a duration to fractional milliseconds
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
