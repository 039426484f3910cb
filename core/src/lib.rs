//! Facebook Graph API connector core.
//!
//! # Overview
//! Every Graph operation is a static `EndpointDescriptor` in the catalog.
//! One generic pipeline turns a descriptor plus a `CallContext` into an
//! `HttpRequest`, sends it through a `Transport`, and maps the response
//! into typed records, JPEG bytes or nothing.
//!
//! # Design
//! - The request builder and response mapper are pure; only the transport
//!   touches the network. Hosts that do their own I/O call
//!   `GraphConnector::build` and `GraphConnector::parse` directly.
//! - `GraphConnector` holds only immutable configuration and a shared
//!   transport, so it is `Send + Sync` and needs no locking.
//! - Record types are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod catalog;
pub mod client;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod mapper;
pub mod request;
pub mod transport;
pub mod types;

pub use catalog::{catalog, lookup, Catalog};
pub use client::GraphConnector;
pub use config::ConnectorConfig;
pub use context::{AccessToken, CallContext};
pub use descriptor::{AuthPlacement, EndpointDescriptor, ParamSource, ParamSpec, ResponseShape};
pub use error::{ApiError, GraphErrorDetail, TransportError};
pub use http::{Attachment, Body, HttpMethod, HttpRequest, HttpResponse};
pub use mapper::Output;
pub use transport::{Transport, UreqTransport};
pub use types::{Entity, EntityKind, GraphEntity};
