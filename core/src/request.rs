//! Request builder: descriptor + call context -> `HttpRequest`.
//!
//! Pure function of its inputs; no I/O. Values are only checked for
//! presence, the Graph API validates their meaning.

use tracing::debug;

use crate::context::CallContext;
use crate::descriptor::{AuthPlacement, EndpointDescriptor, ParamSource, ACCESS_TOKEN};
use crate::error::ApiError;
use crate::http::{Body, HttpRequest, Multipart, Part};

/// Render `op` against `origin` (scheme and host, no trailing slash).
pub fn build(
    origin: &str,
    op: &EndpointDescriptor,
    ctx: &CallContext,
) -> Result<HttpRequest, ApiError> {
    let token = match op.auth {
        AuthPlacement::None => None,
        _ => Some(
            ctx.access_token
                .as_ref()
                .ok_or(ApiError::MissingCredential { operation: op.name })?
                .expose(),
        ),
    };

    let mut path = op.path_template.to_string();
    let mut query: Vec<(&str, &str)> = Vec::new();
    let mut form: Vec<(String, String)> = Vec::new();
    let mut multipart: Option<Multipart> = None;

    if op.auth == AuthPlacement::Query {
        query.extend(token.map(|t| (ACCESS_TOKEN, t)));
    }
    if op.auth == AuthPlacement::Form {
        form.extend(token.map(|t| (ACCESS_TOKEN.to_string(), t.to_string())));
    }

    for spec in &op.params {
        let missing = || ApiError::MissingParameter {
            operation: op.name,
            parameter: spec.name,
        };
        match spec.source {
            ParamSource::Path => {
                // An empty segment would address a different endpoint.
                let value = ctx
                    .get(spec.name)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(missing)?;
                let placeholder = format!("{{{}}}", spec.key);
                path = path.replace(&placeholder, &urlencoding::encode(value));
            }
            ParamSource::Query => match ctx.get(spec.name).or(spec.default) {
                Some(value) => query.push((spec.key, value)),
                None if spec.required => return Err(missing()),
                None => {}
            },
            ParamSource::Form => match ctx.get(spec.name) {
                Some(value) => form.push((spec.key.to_string(), value.to_string())),
                None if spec.required => return Err(missing()),
                None => {}
            },
            ParamSource::Multipart => {
                let part = if let Some(attachment) = ctx.files.get(spec.name) {
                    Part::File {
                        name: spec.key.to_string(),
                        attachment: attachment.clone(),
                    }
                } else if let Some(value) = ctx.get(spec.name) {
                    Part::Field {
                        name: spec.key.to_string(),
                        value: value.to_string(),
                    }
                } else if spec.required {
                    return Err(missing());
                } else {
                    continue;
                };
                multipart.get_or_insert_with(Multipart::new).parts.push(part);
            }
        }
    }

    query.extend(op.fixed_query.iter().copied());

    let mut url = format!("{origin}/{path}");
    if !query.is_empty() {
        url.push('?');
        let encoded = serde_urlencoded::to_string(&query)
            .map_err(|e| ApiError::Encoding(e.to_string()))?;
        url.push_str(&encoded);
    }

    let body = match multipart {
        Some(m) => Some(Body::Multipart(m)),
        None if !form.is_empty() => Some(Body::Form(form)),
        None => None,
    };
    let headers = body
        .iter()
        .map(|b| ("content-type".to_string(), b.content_type()))
        .collect();

    let request = HttpRequest {
        method: op.method,
        url,
        headers,
        body,
    };
    debug!(
        operation = op.name,
        method = op.method.as_str(),
        url = %request.redacted_url(),
        "built request"
    );
    Ok(request)
}
