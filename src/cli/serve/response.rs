//! HTTP response handlers.

use anyhow::Result;
use serde_json::Value;
use tiny_http::{Header, Request, Response, StatusCode};

const JSON: &str = "application/json";
const PLAIN: &str = "text/plain";

/// Respond with a resolved metadata record as a JSON body.
pub fn respond_json(request: Request, record: &Value) -> Result<()> {
    let body = serde_json::to_vec(record)?;
    send_body(request, 200, JSON, body)
}

/// Respond with 404 for unconfigured routes and missing records alike.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 400 (invalid x-bc-source header or malformed path).
pub fn respond_bad_request(request: Request, message: &str) -> Result<()> {
    send_body(request, 400, PLAIN, message.as_bytes().to_vec())
}

/// Respond with 200 OK on the health endpoint.
pub fn respond_health(request: Request) -> Result<()> {
    send_body(request, 200, PLAIN, b"ok".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
