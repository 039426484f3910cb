//! Per-invocation call context.

use std::collections::HashMap;
use std::fmt;

use crate::http::Attachment;

/// OAuth bearer token supplied by the host's credential provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl<T: Into<String>> From<T> for AccessToken {
    fn from(v: T) -> Self {
        Self::new(v)
    }
}

/// The token and argument values for one call. Created per invocation and
/// dropped once the response is mapped.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub access_token: Option<AccessToken>,
    pub args: HashMap<String, String>,
    pub files: HashMap<String, Attachment>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<AccessToken>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn file(mut self, name: impl Into<String>, attachment: Attachment) -> Self {
        self.files.insert(name.into(), attachment);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }
}
