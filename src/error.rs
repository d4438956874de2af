//! Handler errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors a handler can report instead of a response
///
/// Every variant maps to a 500; the detail goes to the log, not the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to resolve hostname: {0}")]
    Hostname(#[from] std::io::Error),

    #[error("database settings incomplete")]
    DatabaseNotConfigured,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Static message sent to the client
    fn public_message(&self) -> &'static str {
        match self {
            AppError::Hostname(_) => "Internal Server Error\n",
            AppError::DatabaseNotConfigured | AppError::Database(_) => {
                "Error while retrieving albums\n"
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_map_to_500() {
        let response = AppError::DatabaseNotConfigured.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.public_message(), "Error while retrieving albums\n");
        assert!(err.to_string().contains("database error"));
    }
}
