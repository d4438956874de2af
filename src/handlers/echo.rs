//! Echo endpoint: who am I, how many requests so far, what time is it

use crate::error::AppError;
use crate::handlers::plain_text;
use crate::server::router::AppState;
use axum::{extract::State, http::StatusCode, response::Response};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// RFC 1123 date, always rendered in GMT
const RFC1123: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Number of echo requests served
///
/// Increment and read happen under one lock acquisition, so two concurrent
/// requests can never report the same value.
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    count: Arc<Mutex<u64>>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one and return the new total
    pub fn increment(&self) -> u64 {
        // A panic while holding this lock can't leave the integer torn
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        *count
    }

    /// Current total
    pub fn value(&self) -> u64 {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn render(host: &str, count: u64, now: DateTime<Utc>) -> String {
    format!(
        "I am: {}\nRequests: {}\nTime: {}\n",
        host,
        count,
        now.format(RFC1123)
    )
}

/// `GET /`
pub async fn echo(State(state): State<AppState>) -> Result<Response, AppError> {
    let host = hostname::get()?.to_string_lossy().into_owned();
    let count = state.requests().increment();
    Ok(plain_text(StatusCode::OK, render(&host, count, Utc::now())))
}
