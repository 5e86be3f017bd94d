// src/routes/devices.rs
//! Device registry.
//!
//! Devices must be registered before their readings are accepted; the
//! ingestion endpoints reject samples from unknown device ids.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::{AppResult, Config, Device};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new().route("/devices", get(list).post(register))
}

#[derive(Debug, Deserialize)]
struct NewDevice {
    // ---
    location: String,
}

/// Handle `POST /devices`: register a device, returning its record.
async fn register(
    State((pool, _config)): State<(PgPool, Config)>,
    Json(payload): Json<NewDevice>,
) -> AppResult<impl IntoResponse> {
    // ---
    info!("POST /devices - location={}", payload.location);

    let device = sqlx::query_as::<_, Device>(
        r#"
        INSERT INTO devices (location)
        VALUES ($1)
        RETURNING id, location
        "#,
    )
    .bind(&payload.location)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(device)))
}

/// Handle `GET /devices`: all registered devices.
async fn list(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let devices =
        sqlx::query_as::<_, Device>("SELECT id, location FROM devices ORDER BY id")
            .fetch_all(&pool)
            .await?;

    Ok((StatusCode::OK, Json(devices)))
}
