//! Transport: executes an `HttpRequest` and returns the raw response.
//!
//! Any status code is returned as data; the connector decides what counts as
//! failure. Only network-level problems are errors here.

use std::io::ErrorKind;

use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round trip. Implementations must be safe to share
/// between threads.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport over a pooled `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request
            .body
            .as_ref()
            .map(|b| b.to_bytes())
            .transpose()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        let result = match request.method {
            HttpMethod::Get => {
                let mut rb = self.agent.get(url);
                for (k, v) in &request.headers {
                    rb = rb.header(k.as_str(), v.as_str());
                }
                rb.call()
            }
            HttpMethod::Delete => {
                let mut rb = self.agent.delete(url);
                for (k, v) in &request.headers {
                    rb = rb.header(k.as_str(), v.as_str());
                }
                rb.call()
            }
            HttpMethod::Post => {
                let mut rb = self.agent.post(url);
                for (k, v) in &request.headers {
                    rb = rb.header(k.as_str(), v.as_str());
                }
                match body {
                    Some(bytes) => rb.send(&bytes[..]),
                    None => rb.send_empty(),
                }
            }
        };

        let mut response = result.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.body_mut().read_to_vec().map_err(map_error)?;
        debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::ConnectionFailed => TransportError::ConnectionRefused,
        ureq::Error::Io(e) if e.kind() == ErrorKind::ConnectionRefused => {
            TransportError::ConnectionRefused
        }
        ureq::Error::Io(e) if e.kind() == ErrorKind::TimedOut => TransportError::Timeout,
        other => TransportError::Other(other.to_string()),
    }
}
