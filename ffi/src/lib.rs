//! C-ABI wrapper around `fbgraph-core`.
//!
//! # Overview
//! Exposes the Graph connector through `extern "C"` functions so any
//! language with a C FFI can render requests and map responses by operation
//! name. The host runs the HTTP round trip itself (`fb_build` / `fb_parse`)
//! or lets the library do it (`fb_invoke`).
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Arguments travel as a JSON object of name to value; scalars are
//!   stringified, since every Graph parameter is text on the wire.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys requests, mapped records, image bytes and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `fb_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use fbgraph_core::{CallContext, ConnectorConfig, GraphConnector, HttpResponse};
use serde_json::Value;

use types::*;

/// Borrow a C string as UTF-8; `None` for null or invalid UTF-8.
fn str_arg<'a>(p: *const c_char) -> Option<&'a str> {
    if p.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(p) }.to_str().ok()
}

/// Build a `CallContext` from an optional token and a JSON argument object.
fn call_context(token: *const c_char, args_json: *const c_char) -> Result<CallContext, String> {
    let mut ctx = CallContext::new();
    if let Some(token) = str_arg(token).filter(|t| !t.is_empty()) {
        ctx = ctx.with_token(token);
    }
    let Some(raw) = str_arg(args_json) else {
        return Ok(ctx);
    };
    let args: serde_json::Map<String, Value> =
        serde_json::from_str(raw).map_err(|e| format!("args must be a JSON object: {e}"))?;
    for (name, value) in args {
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            other => return Err(format!("argument '{name}' must be a scalar, got {other}")),
        };
        ctx = ctx.arg(name, value);
    }
    Ok(ctx)
}

fn panic_result(payload: Box<dyn std::any::Any + Send>) -> *mut FfiResult {
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic in fbgraph".to_string());
    FfiResult::panic(&msg)
}

// ---------------------------------------------------------------------------
// Connector lifecycle
// ---------------------------------------------------------------------------

/// Create a connector for the given app credentials.
///
/// `base_url` may be null to target the public Graph API. Returns null if
/// a credential is null or the configuration is invalid. The caller must
/// free the returned pointer with `fb_connector_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fb_connector_new(
    app_id: *const c_char,
    app_secret: *const c_char,
    base_url: *const c_char,
) -> *mut FfiConnector {
    catch_unwind(|| {
        let (Some(id), Some(secret)) = (str_arg(app_id), str_arg(app_secret)) else {
            return std::ptr::null_mut();
        };
        let mut config = ConnectorConfig::new(id, secret);
        if let Some(url) = str_arg(base_url) {
            config = config.with_base_url(url);
        }
        match GraphConnector::new(config) {
            Ok(inner) => Box::into_raw(Box::new(FfiConnector { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a connector created by `fb_connector_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fb_connector_free(connector: *mut FfiConnector) {
    if !connector.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(connector) });
        }));
    }
}

/// Names of every catalog operation as a JSON array.
///
/// The caller must free the returned string with `fb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn fb_operations() -> *mut c_char {
    catch_unwind(|| {
        let names: Vec<&str> = fbgraph_core::catalog().iter().map(|op| op.name).collect();
        match serde_json::to_string(&names) {
            Ok(json) => c_string(json),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Build / parse / invoke
// ---------------------------------------------------------------------------

/// Render `operation` into an HTTP request.
///
/// `access_token` and `args_json` may be null. On success the result has
/// `data_tag = Request`; free it with `fb_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn fb_build(
    connector: *const FfiConnector,
    operation: *const c_char,
    access_token: *const c_char,
    args_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if connector.is_null() {
            return FfiResult::null_arg("connector");
        }
        let Some(operation) = str_arg(operation) else {
            return FfiResult::null_arg("operation");
        };
        let connector = unsafe { &*connector };
        let ctx = match call_context(access_token, args_json) {
            Ok(ctx) => ctx,
            Err(msg) => return FfiResult::invalid_argument(msg),
        };
        match connector.inner.build(operation, &ctx) {
            Ok(req) => FfiResult::ok_request(req),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(panic_result)
}

/// Map the response to a request built for `operation`.
///
/// Records come back as JSON (`data_tag = Json`), pictures as JPEG bytes
/// (`data_tag = Bytes`), and side-effect operations with no data.
#[unsafe(no_mangle)]
pub extern "C" fn fb_parse(
    connector: *const FfiConnector,
    operation: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if connector.is_null() {
            return FfiResult::null_arg("connector");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let Some(operation) = str_arg(operation) else {
            return FfiResult::null_arg("operation");
        };
        let connector = unsafe { &*connector };
        let resp = unsafe { &*response };
        match connector.inner.parse(operation, ffi_response_to_core(resp)) {
            Ok(output) => FfiResult::ok_output(output),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(panic_result)
}

/// Build, execute and parse `operation` using the library's own transport.
#[unsafe(no_mangle)]
pub extern "C" fn fb_invoke(
    connector: *const FfiConnector,
    operation: *const c_char,
    access_token: *const c_char,
    args_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if connector.is_null() {
            return FfiResult::null_arg("connector");
        }
        let Some(operation) = str_arg(operation) else {
            return FfiResult::null_arg("operation");
        };
        let connector = unsafe { &*connector };
        let ctx = match call_context(access_token, args_json) {
            Ok(ctx) => ctx,
            Err(msg) => return FfiResult::invalid_argument(msg),
        };
        match connector.inner.invoke(operation, &ctx) {
            Ok(output) => FfiResult::ok_output(output),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(panic_result)
}

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() || resp.body_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len) }.to_vec()
    };
    HttpResponse::new(resp.status, body)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_request(req: *mut FfiHttpRequest) {
    let req = unsafe { Box::from_raw(req) };
    if !req.url.is_null() {
        drop(unsafe { std::ffi::CString::from_raw(req.url) });
    }
    unsafe { free_bytes(req.body, req.body_len) };
    if !req.headers.is_null() && req.headers_len > 0 {
        let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
        let headers = unsafe { Box::from_raw(slice) };
        for h in headers.iter() {
            if !h.key.is_null() {
                drop(unsafe { std::ffi::CString::from_raw(h.key) });
            }
            if !h.value.is_null() {
                drop(unsafe { std::ffi::CString::from_raw(h.value) });
            }
        }
    }
}

/// Free an `FfiResult` returned by any `fb_*` call. Safe to call with null.
/// Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn fb_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { std::ffi::CString::from_raw(result.error_message) });
        }
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Request => free_request(result.data as *mut FfiHttpRequest),
            FfiDataTag::Json => {
                drop(unsafe { std::ffi::CString::from_raw(result.data as *mut c_char) });
            }
            FfiDataTag::Bytes => {
                let buf = unsafe { Box::from_raw(result.data as *mut FfiBytes) };
                unsafe { free_bytes(buf.ptr, buf.len) };
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fb_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { std::ffi::CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn connector(base_url: Option<&str>) -> *mut FfiConnector {
        let id = CString::new("app").unwrap();
        let secret = CString::new("secret").unwrap();
        let url = base_url.map(|u| CString::new(u).unwrap());
        fb_connector_new(
            id.as_ptr(),
            secret.as_ptr(),
            url.as_ref().map_or(std::ptr::null(), |u| u.as_ptr()),
        )
    }

    fn build(c: *const FfiConnector, op: &str, token: Option<&str>, args: &str) -> *mut FfiResult {
        let op = CString::new(op).unwrap();
        let token = token.map(|t| CString::new(t).unwrap());
        let args = CString::new(args).unwrap();
        fb_build(
            c,
            op.as_ptr(),
            token.as_ref().map_or(std::ptr::null(), |t| t.as_ptr()),
            args.as_ptr(),
        )
    }

    fn parse(c: *const FfiConnector, op: &str, status: u16, body: &[u8]) -> *mut FfiResult {
        let op = CString::new(op).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
            body_len: body.len(),
        };
        fb_parse(c, op.as_ptr(), &resp)
    }

    fn json_data(result: &FfiResult) -> Value {
        assert_eq!(result.data_tag, FfiDataTag::Json);
        let s = unsafe { CStr::from_ptr(result.data as *const c_char) }.to_str().unwrap();
        serde_json::from_str(s).unwrap()
    }

    fn message(result: &FfiResult) -> String {
        unsafe { CStr::from_ptr(result.error_message) }
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn connector_new_and_free() {
        let c = connector(None);
        assert!(!c.is_null());
        fb_connector_free(c);
    }

    #[test]
    fn connector_new_null_credentials_returns_null() {
        let c = fb_connector_new(std::ptr::null(), std::ptr::null(), std::ptr::null());
        assert!(c.is_null());
    }

    #[test]
    fn connector_new_empty_app_id_returns_null() {
        let id = CString::new("").unwrap();
        let secret = CString::new("secret").unwrap();
        let c = fb_connector_new(id.as_ptr(), secret.as_ptr(), std::ptr::null());
        assert!(c.is_null());
    }

    #[test]
    fn connector_free_null_is_safe() {
        fb_connector_free(std::ptr::null_mut());
        fb_free_result(std::ptr::null_mut());
        fb_free_string(std::ptr::null_mut());
    }

    #[test]
    fn operations_lists_catalog() {
        let s = fb_operations();
        let names: Vec<String> =
            serde_json::from_str(unsafe { CStr::from_ptr(s) }.to_str().unwrap()).unwrap();
        assert!(names.iter().any(|n| n == "search_posts"));
        assert!(names.len() >= 100);
        fb_free_string(s);
    }

    #[test]
    fn build_search_posts_returns_request() {
        let c = connector(None);
        let result = build(c, "search_posts", None, r#"{"q":"concert","limit":10}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::Request);

        let req = unsafe { &*(r.data as *const FfiHttpRequest) };
        assert_eq!(req.method, FfiHttpMethod::Get);
        let url = unsafe { CStr::from_ptr(req.url) }.to_str().unwrap();
        assert_eq!(
            url,
            "https://graph.facebook.com/search?q=concert&since=last+week&until=yesterday&limit=10&offset=2"
        );
        assert!(req.body.is_null());
        assert_eq!(req.headers_len, 0);

        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn build_publish_message_has_form_body() {
        let c = connector(None);
        let result = build(c, "publish_message", Some("tok"), r#"{"profile_id":"me","msg":"hi there"}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);

        let req = unsafe { &*(r.data as *const FfiHttpRequest) };
        assert_eq!(req.method, FfiHttpMethod::Post);
        assert_eq!(req.headers_len, 1);
        let body = unsafe { std::slice::from_raw_parts(req.body, req.body_len) };
        assert_eq!(body, b"access_token=tok&message=hi+there");

        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn body_length_is_not_truncated() {
        let c = connector(None);
        let msg = "x".repeat(70_000);
        let args = serde_json::json!({"profile_id": "me", "msg": msg}).to_string();
        let result = build(c, "publish_message", Some("tok"), &args);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);

        let req = unsafe { &*(r.data as *const FfiHttpRequest) };
        let expected = format!("access_token=tok&message={msg}");
        assert_eq!(req.body_len, expected.len());
        let body = unsafe { std::slice::from_raw_parts(req.body, req.body_len) };
        assert_eq!(body, expected.as_bytes());

        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn build_missing_token_reports_code() {
        let c = connector(None);
        let result = build(c, "get_user_wall", None, r#"{"user":"me"}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::MissingCredential);
        assert!(r.data.is_null());
        assert!(message(r).contains("get_user_wall"));
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn build_rejects_non_object_args() {
        let c = connector(None);
        let result = build(c, "get_user", None, r#"["user"]"#);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::InvalidArgument);
        fb_free_result(result);

        let result = build(c, "get_user", None, r#"{"user":{"id":1}}"#);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::InvalidArgument);
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn build_null_connector_reports_null_arg() {
        let result = build(std::ptr::null(), "get_user", None, "{}");
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        fb_free_result(result);
    }

    #[test]
    fn build_unknown_operation() {
        let c = connector(None);
        let result = build(c, "getUser", None, "{}");
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::UnknownOperation);
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn parse_user_returns_json() {
        let c = connector(None);
        let result = parse(c, "get_user", 200, br#"{"id":"1","name":"Ann"}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        let user = json_data(r);
        assert_eq!(user["id"], "1");
        assert_eq!(user["name"], "Ann");
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn parse_list_returns_json_array() {
        let c = connector(None);
        let result = parse(c, "get_user_friends", 200, br#"{"data":[{"id":"2"},{"id":"3"}]}"#);
        let list = json_data(unsafe { &*result });
        assert_eq!(list.as_array().unwrap().len(), 2);
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn parse_non_2xx_sets_http_status() {
        let c = connector(None);
        let body = br#"{"error":{"message":"Invalid OAuth access token.","code":190}}"#;
        let result = parse(c, "get_user_wall", 400, body);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Http);
        assert_eq!(r.http_status, 400);
        assert!(message(r).contains("Invalid OAuth access token."));
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn parse_like_has_no_data() {
        let c = connector(None);
        let result = parse(c, "like", 200, b"true");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::None);
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn parse_malformed_body() {
        let c = connector(None);
        let result = parse(c, "get_user", 200, b"{");
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::MalformedResponse);
        fb_free_result(result);
        fb_connector_free(c);
    }

    #[test]
    fn parse_picture_returns_jpeg_bytes() {
        let c = connector(None);
        let png = mock_graph::picture("small").unwrap();
        let result = parse(c, "get_user_picture", 200, &png);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::Bytes);
        let buf = unsafe { &*(r.data as *const FfiBytes) };
        let bytes = unsafe { std::slice::from_raw_parts(buf.ptr, buf.len) };
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        fb_free_result(result);
        fb_connector_free(c);
    }

    /// Host-does-IO loop: build through the FFI, execute with ureq against
    /// the mock server, parse through the FFI.
    #[test]
    fn host_round_trip_against_mock_server() {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_graph::run(listener).await
            })
            .unwrap();
        });

        let c = connector(Some(&format!("http://{addr}")));
        let built = build(c, "get_user_friends", Some("tok"), r#"{"user":"me","offset":0}"#);
        let req = unsafe { &*((*built).data as *const FfiHttpRequest) };
        assert_eq!(req.method, FfiHttpMethod::Get);
        let url = unsafe { CStr::from_ptr(req.url) }.to_str().unwrap();

        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        let mut response = agent.get(url).call().unwrap();
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec().unwrap();
        fb_free_result(built);

        let result = parse(c, "get_user_friends", status, &body);
        let friends = json_data(unsafe { &*result });
        let names: Vec<_> = friends
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Bo Mule", "Cy Mule"]);
        fb_free_result(result);

        let result = {
            let op = CString::new("get_user").unwrap();
            let args = CString::new(r#"{"user":"cocacola"}"#).unwrap();
            fb_invoke(c, op.as_ptr(), std::ptr::null(), args.as_ptr())
        };
        assert_eq!(json_data(unsafe { &*result })["likes"], 12345);
        fb_free_result(result);
        fb_connector_free(c);
    }
}
