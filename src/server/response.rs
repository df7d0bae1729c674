use may_minihttp::Response;
use serde_json::Value;

use crate::dispatcher::HandlerResponse;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Add a dynamically-valued header to the response.
///
/// The underlying response only accepts `'static` header lines, so the
/// formatted line is leaked; header values here are small and bounded per
/// request.
pub fn push_header(res: &mut Response, name: &str, value: &str) {
    let header = format!("{name}: {value}").into_boxed_str();
    res.header(Box::leak(header));
}

/// Write a JSON body with the given status.
pub fn write_json(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

/// Write a plain-text body with the given status (used by `/metrics`).
pub fn write_text(res: &mut Response, status: u16, body: String) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: text/plain");
    res.body_vec(body.into_bytes());
}

/// Write a dispatched handler response: status, headers, then the body as
/// JSON, text, or empty depending on its shape.
pub fn write_handler_response(res: &mut Response, hr: &HandlerResponse) {
    res.status_code(hr.status as usize, status_reason(hr.status));
    for (name, value) in &hr.headers {
        push_header(res, name, value);
    }
    let has_content_type = hr.get_header("content-type").is_some();
    match &hr.body {
        Value::Null => {
            res.body_vec(Vec::new());
        }
        Value::String(s) => {
            if !has_content_type {
                res.header("Content-Type: text/plain");
            }
            res.body_vec(s.clone().into_bytes());
        }
        other => {
            if !has_content_type {
                res.header("Content-Type: application/json");
            }
            res.body_vec(other.to_string().into_bytes());
        }
    }
}
