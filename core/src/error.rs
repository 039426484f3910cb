//! Error types for the Graph connector.
//!
//! # Design
//! Every failure belongs to one invocation and is returned synchronously;
//! nothing is retried. Parameter and credential problems are caught by the
//! request builder before any network I/O. Non-2xx responses keep their raw
//! body and, when the body is a Graph error envelope, a parsed
//! `GraphErrorDetail`.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the connector.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// A required path, query, form or multipart parameter was not supplied.
    #[error("missing parameter '{parameter}' for {operation}")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },

    /// The operation authenticates but the call context carries no token.
    #[error("missing access token for {operation}")]
    MissingCredential { operation: &'static str },

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed response for {operation}: {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
    },

    #[error("image encoding failed: {0}")]
    ImageEncoding(String),

    #[error("{operation} returns {actual}, not {expected}")]
    ShapeMismatch {
        operation: &'static str,
        expected: String,
        actual: String,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A query string or form body could not be url-encoded.
    #[error("cannot encode request: {0}")]
    Encoding(String),
}

impl ApiError {
    /// HTTP status for `Non2xxStatus` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport(TransportError::Non2xxStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// Network or remote failures.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("HTTP {status}: {body}")]
    Non2xxStatus {
        status: u16,
        body: String,
        graph: Option<GraphErrorDetail>,
    },

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Build a `Non2xxStatus`, lifting the Graph error envelope out of `body`
    /// when there is one.
    pub fn status(status: u16, body: String) -> Self {
        let graph = GraphErrorDetail::parse(&body);
        TransportError::Non2xxStatus {
            status,
            body,
            graph,
        }
    }
}

/// The `error` object of a Graph API failure response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    error: GraphErrorDetail,
}

impl GraphErrorDetail {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<Envelope>(body).ok().map(|e| e.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_2xx_keeps_body_and_envelope() {
        let body = r#"{"error":{"message":"Invalid OAuth","type":"OAuthException","code":190}}"#;
        let err = TransportError::status(400, body.to_string());
        match err {
            TransportError::Non2xxStatus {
                status,
                body: kept,
                graph,
            } => {
                assert_eq!(status, 400);
                assert_eq!(kept, body);
                let graph = graph.unwrap();
                assert_eq!(graph.message, "Invalid OAuth");
                assert_eq!(graph.kind.as_deref(), Some("OAuthException"));
                assert_eq!(graph.code, Some(190));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_has_no_envelope() {
        let err = TransportError::status(502, "Bad Gateway".to_string());
        assert!(matches!(
            err,
            TransportError::Non2xxStatus { graph: None, .. }
        ));
    }

    #[test]
    fn api_error_exposes_status() {
        let err = ApiError::from(TransportError::status(404, String::new()));
        assert_eq!(err.status(), Some(404));
        assert_eq!(ApiError::ImageEncoding("x".into()).status(), None);
    }
}
