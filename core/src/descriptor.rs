//! Endpoint descriptors: one immutable value per operation.
//!
//! # Design
//! A descriptor is data only. It names the path template, verb, where the
//! access token travels, every parameter with its source and default, and
//! the shape of the response. The request builder and response mapper are
//! generic over it, so adding an endpoint never touches code.

use crate::http::HttpMethod;
use crate::types::EntityKind;

/// Name of the credential parameter on the wire.
pub const ACCESS_TOKEN: &str = "access_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Path,
    Query,
    Form,
    Multipart,
}

/// Where the access token is sent, if the operation authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlacement {
    None,
    Query,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Single(EntityKind),
    List(EntityKind),
    /// Image bytes, re-encoded to JPEG.
    Image,
    /// The body is ignored.
    None,
}

impl std::fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseShape::Single(k) => write!(f, "{k}"),
            ResponseShape::List(k) => write!(f, "list of {k}"),
            ResponseShape::Image => f.write_str("image"),
            ResponseShape::None => f.write_str("nothing"),
        }
    }
}

/// One declared parameter.
///
/// `name` is what callers pass; `key` is what goes on the wire (a path
/// placeholder, query key, form field or multipart part name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub key: &'static str,
    pub source: ParamSource,
    pub required: bool,
    pub default: Option<&'static str>,
}

impl ParamSpec {
    const fn new(name: &'static str, source: ParamSource, required: bool) -> Self {
        Self {
            name,
            key: name,
            source,
            required,
            default: None,
        }
    }

    pub const fn path(name: &'static str) -> Self {
        Self::new(name, ParamSource::Path, true)
    }

    pub const fn query(name: &'static str) -> Self {
        Self::new(name, ParamSource::Query, true)
    }

    /// Optional query parameter sent with `default` when the caller omits it.
    pub const fn query_or(name: &'static str, default: &'static str) -> Self {
        let mut spec = Self::new(name, ParamSource::Query, false);
        spec.default = Some(default);
        spec
    }

    pub const fn form(name: &'static str) -> Self {
        Self::new(name, ParamSource::Form, true)
    }

    /// Optional form field, left out of the body when absent.
    pub const fn form_opt(name: &'static str) -> Self {
        Self::new(name, ParamSource::Form, false)
    }

    /// Multipart part: a binary part when the call carries an attachment
    /// under `name`, a text field otherwise.
    pub const fn multipart(name: &'static str) -> Self {
        Self::new(name, ParamSource::Multipart, true)
    }

    pub const fn wire(mut self, key: &'static str) -> Self {
        self.key = key;
        self
    }
}

pub const SINCE: ParamSpec = ParamSpec::query_or("since", "last week");
pub const UNTIL: ParamSpec = ParamSpec::query_or("until", "yesterday");
pub const LIMIT: ParamSpec = ParamSpec::query_or("limit", "3");
pub const OFFSET: ParamSpec = ParamSpec::query_or("offset", "2");
pub const METADATA: ParamSpec = ParamSpec::query_or("metadata", "0");
pub const PICTURE_TYPE: ParamSpec = ParamSpec::query_or("type", "small");

/// Everything needed to render and decode one operation.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path_template: &'static str,
    pub auth: AuthPlacement,
    pub params: Vec<ParamSpec>,
    /// Query pairs sent on every call, after the declared parameters.
    pub fixed_query: Vec<(&'static str, &'static str)>,
    pub response: ResponseShape,
}

impl EndpointDescriptor {
    fn new(name: &'static str, method: HttpMethod, path_template: &'static str) -> Self {
        Self {
            name,
            method,
            path_template,
            auth: AuthPlacement::None,
            params: Vec::new(),
            fixed_query: Vec::new(),
            response: ResponseShape::None,
        }
    }

    pub fn get(name: &'static str, path_template: &'static str) -> Self {
        Self::new(name, HttpMethod::Get, path_template)
    }

    pub fn post(name: &'static str, path_template: &'static str) -> Self {
        Self::new(name, HttpMethod::Post, path_template)
    }

    pub fn delete(name: &'static str, path_template: &'static str) -> Self {
        Self::new(name, HttpMethod::Delete, path_template)
    }

    pub fn auth(mut self, placement: AuthPlacement) -> Self {
        self.auth = placement;
        self
    }

    /// Token in the query string.
    pub fn authenticated(self) -> Self {
        self.auth(AuthPlacement::Query)
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// `since`, `until`, `limit`, `offset` with their defaults.
    pub fn paging(self) -> Self {
        self.param(SINCE).param(UNTIL).param(LIMIT).param(OFFSET)
    }

    pub fn metadata(self) -> Self {
        self.param(METADATA)
    }

    pub fn fixed(mut self, key: &'static str, value: &'static str) -> Self {
        self.fixed_query.push((key, value));
        self
    }

    pub fn single(mut self, kind: EntityKind) -> Self {
        self.response = ResponseShape::Single(kind);
        self
    }

    pub fn list(mut self, kind: EntityKind) -> Self {
        self.response = ResponseShape::List(kind);
        self
    }

    /// Picture endpoint: optional `type` and an image response.
    pub fn picture(mut self) -> Self {
        self.params.push(PICTURE_TYPE);
        self.response = ResponseShape::Image;
        self
    }

    pub fn requires_token(&self) -> bool {
        self.auth != AuthPlacement::None
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Placeholder names in `path_template`, in order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut rest = self.path_template;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            out.push(&rest[open + 1..open + close]);
            rest = &rest[open + close + 1..];
        }
        out
    }

    /// Check the descriptor's internal consistency.
    ///
    /// Every placeholder must be backed by a path parameter and every path
    /// parameter must appear in the template; parameter names are unique.
    pub fn validate(&self) -> Result<(), String> {
        let placeholders = self.placeholders();
        for ph in &placeholders {
            let backed = self
                .params
                .iter()
                .any(|p| p.source == ParamSource::Path && p.key == *ph);
            if !backed {
                return Err(format!("{}: placeholder {{{ph}}} has no path parameter", self.name));
            }
        }
        for p in self.params.iter().filter(|p| p.source == ParamSource::Path) {
            if !placeholders.contains(&p.key) {
                return Err(format!("{}: path parameter '{}' is not in the template", self.name, p.name));
            }
            if !p.required {
                return Err(format!("{}: path parameter '{}' must be required", self.name, p.name));
            }
        }
        for (i, p) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|q| q.name == p.name) {
                return Err(format!("{}: duplicate parameter '{}'", self.name, p.name));
            }
            if p.required && p.default.is_some() {
                return Err(format!("{}: required parameter '{}' has a default", self.name, p.name));
            }
        }
        let has_body_params = self
            .params
            .iter()
            .any(|p| matches!(p.source, ParamSource::Form | ParamSource::Multipart));
        if has_body_params && self.method == HttpMethod::Get {
            return Err(format!("{}: GET cannot carry a body", self.name));
        }
        if self.auth == AuthPlacement::Form && self.method == HttpMethod::Get {
            return Err(format!("{}: GET cannot carry a form token", self.name));
        }
        Ok(())
    }
}
