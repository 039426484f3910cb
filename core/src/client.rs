//! The Graph connector: one generic dispatcher for every catalog operation.
//!
//! # Design
//! `GraphConnector` holds the immutable config and a shared transport and
//! nothing else, so one instance can serve any number of concurrent calls.
//! Each operation is split the same way: `build` renders the request,
//! `parse` maps the response, and `invoke` runs both around a single
//! transport round trip. Hosts that do their own I/O use `build`/`parse`
//! directly.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{self, Catalog};
use crate::config::ConnectorConfig;
use crate::context::CallContext;
use crate::descriptor::{EndpointDescriptor, ResponseShape};
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::mapper::{self, Output};
use crate::request;
use crate::transport::{Transport, UreqTransport};
use crate::types::GraphEntity;

#[derive(Clone)]
pub struct GraphConnector {
    config: Arc<ConnectorConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for GraphConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConnector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GraphConnector {
    /// Connector over the default blocking transport.
    pub fn new(config: ConnectorConfig) -> Result<Self, ApiError> {
        Self::with_transport(config, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(
        config: ConnectorConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn operations(&self) -> &'static Catalog {
        catalog::catalog()
    }

    pub fn descriptor(&self, operation: &str) -> Result<&'static EndpointDescriptor, ApiError> {
        catalog::lookup(operation).ok_or_else(|| ApiError::UnknownOperation(operation.to_string()))
    }

    /// Render `operation` into a request against the configured origin.
    pub fn build(&self, operation: &str, ctx: &CallContext) -> Result<HttpRequest, ApiError> {
        let op = self.descriptor(operation)?;
        request::build(self.config.origin(), op, ctx)
    }

    /// Check the status of `response` and map its body.
    pub fn parse(&self, operation: &str, response: HttpResponse) -> Result<Output, ApiError> {
        let op = self.descriptor(operation)?;
        check_status(op, &response)?;
        mapper::map(op.name, &response.body, op.response)
    }

    /// Build, execute and parse `operation`.
    pub fn invoke(&self, operation: &str, ctx: &CallContext) -> Result<Output, ApiError> {
        let request = self.build(operation, ctx)?;
        let response = self.transport.execute(&request)?;
        self.parse(operation, response)
    }

    /// Invoke an operation that yields one `T`.
    pub fn single<T: GraphEntity>(&self, operation: &str, ctx: &CallContext) -> Result<T, ApiError> {
        let op = self.descriptor(operation)?;
        if op.response != ResponseShape::Single(T::KIND) {
            return Err(mismatch(op, ResponseShape::Single(T::KIND)));
        }
        self.invoke(operation, ctx)?
            .into_entity()
            .ok_or_else(|| mismatch(op, ResponseShape::Single(T::KIND)))
    }

    /// Invoke an operation that yields a list of `T`.
    pub fn list<T: GraphEntity>(&self, operation: &str, ctx: &CallContext) -> Result<Vec<T>, ApiError> {
        let op = self.descriptor(operation)?;
        if op.response != ResponseShape::List(T::KIND) {
            return Err(mismatch(op, ResponseShape::List(T::KIND)));
        }
        self.invoke(operation, ctx)?
            .into_list()
            .ok_or_else(|| mismatch(op, ResponseShape::List(T::KIND)))
    }

    /// Invoke a picture operation; returns JPEG bytes.
    pub fn picture(&self, operation: &str, ctx: &CallContext) -> Result<Vec<u8>, ApiError> {
        let op = self.descriptor(operation)?;
        if op.response != ResponseShape::Image {
            return Err(mismatch(op, ResponseShape::Image));
        }
        self.invoke(operation, ctx)?
            .into_image()
            .ok_or_else(|| mismatch(op, ResponseShape::Image))
    }

    /// Invoke an operation for its side effect, discarding any body.
    pub fn execute(&self, operation: &str, ctx: &CallContext) -> Result<(), ApiError> {
        self.invoke(operation, ctx).map(|_| ())
    }
}

/// Map non-2xx responses to `TransportError::Non2xxStatus`.
fn check_status(op: &EndpointDescriptor, response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        debug!(operation = op.name, status = response.status, "graph call succeeded");
        return Ok(());
    }
    let err = TransportError::status(response.status, response.text());
    if let TransportError::Non2xxStatus { graph: Some(detail), .. } = &err {
        warn!(
            operation = op.name,
            status = response.status,
            message = %detail.message,
            "graph call failed"
        );
    } else {
        warn!(operation = op.name, status = response.status, "graph call failed");
    }
    Err(err.into())
}

fn mismatch(op: &EndpointDescriptor, expected: ResponseShape) -> ApiError {
    ApiError::ShapeMismatch {
        operation: op.name,
        expected: expected.to_string(),
        actual: op.response.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::http::HttpMethod;
    use crate::types::{Created, Post, User};

    /// Returns a canned response and records every request it sees.
    struct CannedTransport {
        status: u16,
        body: Vec<u8>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.as_bytes().to_vec(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for CannedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(HttpResponse::new(self.status, self.body.clone()))
        }
    }

    fn connector(transport: Arc<CannedTransport>) -> GraphConnector {
        GraphConnector::with_transport(ConnectorConfig::new("app", "secret"), transport).unwrap()
    }

    #[test]
    fn get_user_maps_mock_response() {
        let transport = CannedTransport::new(200, r#"{"id":"123","name":"Ann"}"#);
        let c = connector(transport.clone());
        let ctx = CallContext::new().arg("user", "123").arg("metadata", "0");
        let user: User = c.single("get_user", &ctx).unwrap();
        assert_eq!(user.id, "123");
        assert_eq!(user.name.as_deref(), Some("Ann"));
        assert!(user.email.is_none());

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[0].url, "https://graph.facebook.com/123?metadata=0");
    }

    #[test]
    fn non_2xx_surfaces_status_and_body() {
        let body = r#"{"error":{"message":"Invalid OAuth"}}"#;
        let c = connector(CannedTransport::new(400, body));
        let ctx = CallContext::new().with_token("bad").arg("user", "me");
        let err = c.invoke("get_user_wall", &ctx).unwrap_err();
        match err {
            ApiError::Transport(TransportError::Non2xxStatus {
                status,
                body: kept,
                graph,
            }) => {
                assert_eq!(status, 400);
                assert_eq!(kept, body);
                assert_eq!(graph.unwrap().message, "Invalid OAuth");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parameter_errors_happen_before_any_request() {
        let transport = CannedTransport::new(200, "{}");
        let c = connector(transport.clone());
        let err = c.invoke("get_user_wall", &CallContext::new().arg("user", "me")).unwrap_err();
        assert!(matches!(err, ApiError::MissingCredential { .. }));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let c = connector(CannedTransport::new(200, "{}"));
        let err = c.invoke("get_everything", &CallContext::new()).unwrap_err();
        assert!(matches!(err, ApiError::UnknownOperation(name) if name == "get_everything"));
    }

    #[test]
    fn typed_accessor_checks_declared_shape() {
        let transport = CannedTransport::new(200, r#"{"id":"1"}"#);
        let c = connector(transport.clone());
        let err = c
            .list::<Post>("get_user", &CallContext::new().arg("user", "1"))
            .unwrap_err();
        assert!(matches!(err, ApiError::ShapeMismatch { operation: "get_user", .. }));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn publish_message_returns_created_id() {
        let transport = CannedTransport::new(200, r#"{"id":"1_99"}"#);
        let c = connector(transport.clone());
        let ctx = CallContext::new()
            .with_token("tok")
            .arg("profile_id", "me")
            .arg("msg", "hi");
        let created: Created = c.single("publish_message", &ctx).unwrap();
        assert_eq!(created.id, "1_99");
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].body.as_ref().unwrap().form_field("message"), Some("hi"));
    }

    #[test]
    fn build_uses_configured_origin() {
        let c = GraphConnector::with_transport(
            ConnectorConfig::new("app", "secret").with_base_url("http://127.0.0.1:9/"),
            CannedTransport::new(200, "{}"),
        )
        .unwrap();
        let req = c.build("get_page", &CallContext::new().arg("page", "p")).unwrap();
        assert_eq!(req.url, "http://127.0.0.1:9/p?metadata=0");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = GraphConnector::with_transport(
            ConnectorConfig::new("", "secret"),
            CannedTransport::new(200, "{}"),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig(_)));
    }

    #[test]
    fn connector_is_shareable_across_threads() {
        let c = connector(CannedTransport::new(200, r#"[{"id":"1"},{"id":"2"}]"#));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    c.list::<Post>("search_posts", &CallContext::new().arg("q", "x"))
                        .unwrap()
                        .len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 2);
        }
    }
}
