//! `GET /getAlbums`: read every row of the `albums` table
//!
//! Opens one MySQL connection per request, as the endpoint is a smoke test
//! for database reachability rather than a real listing API.

use crate::config::DbConfig;
use crate::error::AppError;
use crate::server::router::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::{info, warn};

pub const DEFAULT_DB_PORT: u16 = 3306;

const ALBUMS_QUERY: &str = "SELECT id, title, artist, year FROM albums";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Album {
    pub id: i32,
    pub title: String,
    pub artist: String,
    #[serde(rename = "price")]
    pub year: i32,
}

/// Split an optional `:port` suffix off the configured host
fn host_and_port(host: &str) -> (&str, u16) {
    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse() {
            Ok(port) => (name, port),
            Err(_) => (host, DEFAULT_DB_PORT),
        },
        None => (host, DEFAULT_DB_PORT),
    }
}

fn connect_options(db: &DbConfig) -> MySqlConnectOptions {
    let (host, port) = host_and_port(&db.host);
    MySqlConnectOptions::new()
        .host(host)
        .port(port)
        .username(&db.user)
        .password(&db.password)
        .database(&db.name)
}

/// Query all albums
pub async fn fetch_albums(db: &DbConfig) -> Result<Vec<Album>, AppError> {
    if !db.is_complete() {
        return Err(AppError::DatabaseNotConfigured);
    }

    let mut conn = MySqlConnection::connect_with(&connect_options(db)).await?;
    let albums = sqlx::query_as::<_, Album>(ALBUMS_QUERY)
        .fetch_all(&mut conn)
        .await?;

    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close database connection");
    }
    Ok(albums)
}

pub async fn list_albums(State(state): State<AppState>) -> Result<Json<Vec<Album>>, AppError> {
    let albums = fetch_albums(state.db()).await?;
    for album in &albums {
        info!(
            id = album.id,
            title = %album.title,
            artist = %album.artist,
            year = album.year,
            "Album"
        );
    }
    Ok(Json(albums))
}
