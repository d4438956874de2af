//! `GET /uuid`

use axum::{
    http::{header::X_CONTENT_TYPE_OPTIONS, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

/// Return a fresh random (v4) UUID as a JSON string
pub async fn uuid() -> Response {
    let id = Uuid::new_v4();
    info!(uuid = %id, "Generated UUID");
    (
        [(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"))],
        Json(id),
    )
        .into_response()
}
