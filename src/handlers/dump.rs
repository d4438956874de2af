//! `GET /printJSONReq`: log the incoming request in wire format

use axum::{
    body::{to_bytes, Bytes},
    extract::Request,
    http::{request::Parts, StatusCode},
};
use tracing::{info, warn};

/// Largest body that will be read into the dump
pub const MAX_DUMP_BODY: usize = 1 << 20;

/// Render a request as it would appear on the wire (HTTP/1 style)
pub fn dump_request(parts: &Parts, body: &[u8]) -> String {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut out = format!("{} {} {:?}\r\n", parts.method, target, parts.version);
    for (name, value) in &parts.headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
    out
}

pub async fn print_request(request: Request) -> StatusCode {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_DUMP_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to read request body for dump");
            Bytes::new()
        }
    };
    info!(request = %dump_request(&parts, &body), "Request dump");
    StatusCode::OK
}
