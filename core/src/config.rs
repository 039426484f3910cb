//! Connector configuration.
//!
//! Supplied once at construction and never mutated afterwards.

use std::fmt;

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_SCOPE: &str = "email,read_stream,publish_stream";

/// A string that never reveals its contents in `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

/// Application credentials and endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    /// The application identifier as registered with Facebook.
    pub app_id: String,
    pub app_secret: Secret,
    /// Comma-separated permission list requested during authorization.
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_base_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

impl ConnectorConfig {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: Secret::new(app_secret),
            scope: default_scope(),
            base_url: default_base_url(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Point the connector at another origin (a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read `FACEBOOK_APP_ID`, `FACEBOOK_APP_SECRET` and the optional
    /// `FACEBOOK_SCOPE` / `FACEBOOK_GRAPH_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        let app_id = std::env::var("FACEBOOK_APP_ID")
            .map_err(|_| ApiError::InvalidConfig("FACEBOOK_APP_ID is not set".into()))?;
        let app_secret = std::env::var("FACEBOOK_APP_SECRET")
            .map_err(|_| ApiError::InvalidConfig("FACEBOOK_APP_SECRET is not set".into()))?;
        let mut config = Self::new(app_id, app_secret);
        if let Ok(scope) = std::env::var("FACEBOOK_SCOPE") {
            config.scope = scope;
        }
        if let Ok(url) = std::env::var("FACEBOOK_GRAPH_URL") {
            config.base_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.app_id.trim().is_empty() {
            return Err(ApiError::InvalidConfig("app_id is empty".into()));
        }
        if self.app_secret.expose().trim().is_empty() {
            return Err(ApiError::InvalidConfig("app_secret is empty".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ApiError::InvalidConfig("base_url is empty".into()));
        }
        Ok(())
    }

    /// The individual permissions in `scope`.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub(crate) fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_deserializing() {
        let config: ConnectorConfig =
            serde_json::from_str(r#"{"app_id":"42","app_secret":"s3cr3t"}"#).unwrap();
        assert_eq!(config.scope, DEFAULT_SCOPE);
        assert_eq!(config.base_url, DEFAULT_GRAPH_URL);
        assert_eq!(config.app_secret.expose(), "s3cr3t");
    }

    #[test]
    fn scopes_split_and_trim() {
        let config = ConnectorConfig::new("1", "2").with_scope("email, read_stream,,publish_stream ");
        assert_eq!(config.scopes(), vec!["email", "read_stream", "publish_stream"]);
    }

    #[test]
    fn secret_is_not_printed() {
        let config = ConnectorConfig::new("1", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<secret>"));
    }

    #[test]
    fn validate_rejects_empty_fields() {
        assert!(ConnectorConfig::new("", "x").validate().is_err());
        assert!(ConnectorConfig::new("x", " ").validate().is_err());
        assert!(ConnectorConfig::new("x", "y").with_base_url("").validate().is_err());
        assert!(ConnectorConfig::new("x", "y").validate().is_ok());
    }

    #[test]
    fn origin_strips_trailing_slash() {
        let config = ConnectorConfig::new("x", "y").with_base_url("http://localhost:3000/");
        assert_eq!(config.origin(), "http://localhost:3000");
    }
}
