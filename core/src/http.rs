//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The request builder renders an
//! `HttpRequest` from an endpoint descriptor without touching the network;
//! whoever executes it (the bundled ureq transport, or a hosting runtime
//! through the FFI crate) hands back an `HttpResponse` for mapping.
//!
//! Bodies are kept structured (`Body::Form`, `Body::Multipart`) until the
//! moment they are serialized, so callers and tests can inspect exactly which
//! fields an operation sends.

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A binary attachment carried by a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/octet-stream".to_string(),
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Field { name: String, value: String },
    File { name: String, attachment: Attachment },
}

/// A `multipart/form-data` body with its boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    pub boundary: String,
    pub parts: Vec<Part>,
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: format!("fbgraph-{}", uuid::Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            Part::Field { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn file(&self, name: &str) -> Option<&Attachment> {
        self.parts.iter().find_map(|p| match p {
            Part::File { name: n, attachment } if n == name => Some(attachment),
            _ => None,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part {
                Part::Field { name, value } => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                Part::File { name, attachment } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n\
                             Content-Type: {}\r\n\r\n",
                            quoted(&attachment.filename),
                            header_value(&attachment.content_type)
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(&attachment.bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

/// Strip line breaks so a value cannot start a new header line.
fn header_value(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

/// `header_value` plus escaped quotes, for `filename="..."`.
fn quoted(s: &str) -> String {
    header_value(s).replace('\\', "\\\\").replace('"', "\\\"")
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

/// A request body, kept structured until it is put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// `application/x-www-form-urlencoded` field/value pairs, in send order.
    Form(Vec<(String, String)>),
    Multipart(Multipart),
}

impl Body {
    pub fn content_type(&self) -> String {
        match self {
            Body::Form(_) => "application/x-www-form-urlencoded".to_string(),
            Body::Multipart(m) => format!("multipart/form-data; boundary={}", m.boundary),
        }
    }

    /// Serialize the body to the bytes sent on the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ApiError> {
        match self {
            Body::Form(fields) => serde_urlencoded::to_string(fields)
                .map(String::into_bytes)
                .map_err(|e| ApiError::Encoding(e.to_string())),
            Body::Multipart(m) => Ok(m.to_bytes()),
        }
    }

    /// Field value of a form body.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match self {
            Body::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Body::Multipart(m) => m.field(name),
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the rendered query string. The
/// access token may be part of it, so never log `url` directly; use
/// `redacted_url`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl HttpRequest {
    /// The query string portion of `url`, without the leading `?`.
    pub fn query(&self) -> &str {
        self.url.split_once('?').map(|(_, q)| q).unwrap_or("")
    }

    /// The URL without its query string.
    pub fn path(&self) -> &str {
        self.url.split_once('?').map(|(p, _)| p).unwrap_or(&self.url)
    }

    /// Query pairs decoded back into owned strings, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_str(self.query()).unwrap_or_default()
    }

    /// The URL with any `access_token` value masked, for logs.
    pub fn redacted_url(&self) -> String {
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            return self.path().to_string();
        }
        let masked: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| {
                if k == crate::descriptor::ACCESS_TOKEN {
                    (k.as_str(), "***")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        format!(
            "{}?{}",
            self.path(),
            serde_urlencoded::to_string(masked).unwrap_or_default()
        )
    }
}

/// An HTTP response described as plain data.
///
/// Bodies are raw bytes since picture endpoints answer with image data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
