//! Request handlers other than the probes and the metrics scrape
//!
//! - `/` - echo hostname, request count and time
//! - `/checkrest` - random failure simulator
//! - `/uuid` - fresh identifier
//! - `/printJSONReq` - log a dump of the request
//! - `/getAlbums` - list rows from the album store

pub mod albums;
pub mod checkrest;
pub mod dump;
pub mod echo;
pub mod identifier;

use axum::{
    http::{
        header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};

pub use checkrest::{FailureSource, RandomFailures};
pub use echo::RequestCounter;

/// Plain text response with the headers every text endpoint sends
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        body.into(),
    )
        .into_response()
}

/// 405 for a known path hit with the wrong method
pub async fn method_not_allowed() -> Response {
    plain_text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n")
}

/// 404 for anything the router doesn't know
pub async fn not_found() -> Response {
    plain_text(StatusCode::NOT_FOUND, "Not Found\n")
}
