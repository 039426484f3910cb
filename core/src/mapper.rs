//! Response mapper: raw body + response shape -> typed output.
//!
//! Mapping is all-or-nothing. Invalid JSON, an unexpected top-level shape,
//! a missing required field or a bad timestamp anywhere in the payload fails
//! the whole call with `MalformedResponse`.

use std::io::Cursor;

use serde::Serialize;
use serde_json::Value;

use crate::descriptor::ResponseShape;
use crate::error::ApiError;
use crate::types::{Entity, EntityKind, GraphEntity};

/// The mapped result of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Entity(Entity),
    /// Records in response order.
    List(Vec<Entity>),
    /// JPEG bytes.
    Image(Vec<u8>),
    Empty,
}

impl Output {
    pub fn into_entity<T: GraphEntity>(self) -> Option<T> {
        match self {
            Output::Entity(e) => T::from_entity(e),
            _ => None,
        }
    }

    pub fn into_list<T: GraphEntity>(self) -> Option<Vec<T>> {
        match self {
            Output::List(items) => items.into_iter().map(T::from_entity).collect(),
            _ => None,
        }
    }

    pub fn into_image(self) -> Option<Vec<u8>> {
        match self {
            Output::Image(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Map `body` according to `shape`.
pub fn map(operation: &'static str, body: &[u8], shape: ResponseShape) -> Result<Output, ApiError> {
    match shape {
        ResponseShape::Single(kind) => {
            let value = parse_json(operation, body)?;
            if !value.is_object() {
                return Err(malformed(operation, format!("expected a {kind} object")));
            }
            decode(operation, kind, value).map(Output::Entity)
        }
        ResponseShape::List(kind) => {
            let items = match parse_json(operation, body)? {
                Value::Array(items) => items,
                Value::Object(mut obj) => match obj.remove("data") {
                    Some(Value::Array(items)) => items,
                    _ => return Err(malformed(operation, "expected a \"data\" array".into())),
                },
                _ => return Err(malformed(operation, format!("expected a list of {kind}"))),
            };
            items
                .into_iter()
                .map(|item| decode(operation, kind, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Output::List)
        }
        ResponseShape::Image => to_jpeg(operation, body).map(Output::Image),
        ResponseShape::None => Ok(Output::Empty),
    }
}

/// Decode any supported image format and re-encode it as JPEG, so every
/// picture operation returns the same byte format.
pub fn to_jpeg(operation: &'static str, body: &[u8]) -> Result<Vec<u8>, ApiError> {
    let image = image::load_from_memory(body)
        .map_err(|e| malformed(operation, format!("not an image: {e}")))?;
    // JPEG has no alpha channel.
    let rgb = image::DynamicImage::ImageRgb8(image.to_rgb8());
    let mut out = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .map_err(|e| ApiError::ImageEncoding(e.to_string()))?;
    Ok(out)
}

fn parse_json(operation: &'static str, body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| malformed(operation, format!("invalid JSON: {e}")))
}

fn decode(operation: &'static str, kind: EntityKind, value: Value) -> Result<Entity, ApiError> {
    kind.decode(value)
        .map_err(|e| malformed(operation, format!("{kind}: {e}")))
}

fn malformed(operation: &'static str, reason: String) -> ApiError {
    ApiError::MalformedResponse { operation, reason }
}
