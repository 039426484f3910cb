//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` for text, pointer plus length for byte buffers, and enums
//! with explicit discriminants. Conversions live here so `lib.rs` stays
//! focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use fbgraph_core::error::{ApiError, TransportError};
use fbgraph_core::http::HttpMethod;
use fbgraph_core::mapper::Output;

/// Opaque handle to a `GraphConnector`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiConnector {
    pub(crate) inner: fbgraph_core::GraphConnector,
}

/// Owned C string; interior NULs are dropped rather than failing.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Leak `bytes` as a raw buffer; null when empty. Freed by `free_bytes`.
pub(crate) fn leak_bytes(bytes: Vec<u8>) -> (*mut u8, usize) {
    if bytes.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = bytes.len();
    (Box::into_raw(bytes.into_boxed_slice()) as *mut u8, len)
}

/// Reclaim a buffer produced by `leak_bytes`.
///
/// # Safety
/// `ptr`/`len` must come from a single `leak_bytes` call.
pub(crate) unsafe fn free_bytes(ptr: *mut u8, len: usize) {
    if !ptr.is_null() {
        let slice = std::ptr::slice_from_raw_parts_mut(ptr, len);
        drop(unsafe { Box::from_raw(slice) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Delete = 2,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `fb_build`. The C caller executes the request and passes the
/// response back through `fb_parse`. `body` is binary-safe since multipart
/// uploads carry raw file bytes.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: fbgraph_core::HttpRequest) -> Result<*mut Self, ApiError> {
        let bytes = req.body.map(|b| b.to_bytes()).transpose()?;
        let (body, body_len) = leak_bytes(bytes.unwrap_or_default());

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Ok(Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body,
            body_len,
        })))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing a request, then passes a
/// pointer to `fb_parse`. The FFI layer reads but does not free the body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    UnknownOperation = 1,
    MissingParameter = 2,
    MissingCredential = 3,
    /// Timeout, refused connection or another network failure.
    Transport = 4,
    /// Non-2xx status; `http_status` is set and the message holds the body.
    Http = 5,
    MalformedResponse = 6,
    ImageEncoding = 7,
    InvalidConfig = 8,
    InvalidArgument = 9,
    NullArg = 10,
    Panic = 11,
    Internal = 12,
}

/// Tag that tells `fb_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiHttpRequest`.
    Request = 1,
    /// `data` is a NUL-terminated JSON document: one record or an array.
    Json = 2,
    /// `data` is an `FfiBytes` holding JPEG image data.
    Bytes = 3,
}

/// An owned byte buffer.
#[repr(C)]
pub struct FfiBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

/// Result envelope for every fallible FFI call.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload tagged by `data_tag`. On failure `error_code`
/// names the category, `error_message` is a C string, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            http_status,
            data_tag,
            data,
        }))
    }

    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, data_tag, data)
    }

    fn error(code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Self::boxed(code, c_string(msg), http_status, FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn ok_request(req: fbgraph_core::HttpRequest) -> *mut Self {
        match FfiHttpRequest::from_core(req) {
            Ok(ffi) => Self::ok(FfiDataTag::Request, ffi as *mut c_void),
            Err(e) => Self::from_error(e),
        }
    }

    /// Build a success result from a mapped `Output`.
    pub(crate) fn ok_output(output: Output) -> *mut Self {
        match output {
            Output::Empty => Self::ok(FfiDataTag::None, std::ptr::null_mut()),
            Output::Image(bytes) => {
                let (ptr, len) = leak_bytes(bytes);
                let buf = Box::new(FfiBytes { ptr, len });
                Self::ok(FfiDataTag::Bytes, Box::into_raw(buf) as *mut c_void)
            }
            other => match serde_json::to_string(&other) {
                Ok(json) => Self::ok(FfiDataTag::Json, c_string(json) as *mut c_void),
                Err(e) => Self::error(FfiErrorCode::Internal, 0, e.to_string()),
            },
        }
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let msg = err.to_string();
        let (code, status) = match &err {
            ApiError::UnknownOperation(_) => (FfiErrorCode::UnknownOperation, 0),
            ApiError::MissingParameter { .. } => (FfiErrorCode::MissingParameter, 0),
            ApiError::MissingCredential { .. } => (FfiErrorCode::MissingCredential, 0),
            ApiError::Transport(TransportError::Non2xxStatus { status, .. }) => {
                (FfiErrorCode::Http, *status)
            }
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::MalformedResponse { .. } => (FfiErrorCode::MalformedResponse, 0),
            ApiError::ImageEncoding(_) => (FfiErrorCode::ImageEncoding, 0),
            ApiError::InvalidConfig(_) => (FfiErrorCode::InvalidConfig, 0),
            _ => (FfiErrorCode::Internal, 0),
        };
        Self::error(code, status, msg)
    }

    pub(crate) fn invalid_argument(msg: String) -> *mut Self {
        Self::error(FfiErrorCode::InvalidArgument, 0, msg)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }
}
