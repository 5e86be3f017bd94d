// src/routes/dht.rs
//! DHT temperature/humidity ingestion and retrieval.
//!
//! Pure storage: samples are persisted unconditionally with no
//! classification and no case linkage at ingestion time. Linkage happens
//! only when the case aggregator pulls in the most recent sample as
//! environmental context.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use crate::{AppError, AppResult, Config, EnvPayload, EnvReading};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/dht", get(latest).post(ingest))
        .route("/dhtlist", get(list))
}

/// Handle `POST /dht`.
async fn ingest(
    State((pool, _config)): State<(PgPool, Config)>,
    Json(payload): Json<EnvPayload>,
) -> AppResult<impl IntoResponse> {
    // ---
    info!(
        "POST /dht - device={} temperature={} humidity={}",
        payload.device_id, payload.temperature, payload.humidity
    );

    let device_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM devices WHERE id = $1")
        .bind(payload.device_id)
        .fetch_optional(&pool)
        .await?;

    if device_exists.is_none() {
        return Err(AppError::NotFound {
            entity: "Device",
            id: payload.device_id,
        });
    }

    sqlx::query(
        r#"
        INSERT INTO dht_data (recorded_at, temperature, humidity, device_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Utc::now())
    .bind(payload.temperature)
    .bind(payload.humidity)
    .bind(payload.device_id)
    .execute(&pool)
    .await?;

    Ok(StatusCode::OK)
}

/// Handle `GET /dht`: the most recently stored sample, 204 when the table
/// is empty.
async fn latest(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let reading = sqlx::query_as::<_, EnvReading>(
        r#"
        SELECT id, recorded_at, temperature, humidity, device_id, case_id
        FROM dht_data
        ORDER BY recorded_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(&pool)
    .await?;

    Ok(match reading {
        Some(reading) => (StatusCode::OK, Json(reading)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Handle `GET /dhtlist`: all stored samples, oldest first.
async fn list(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let readings = sqlx::query_as::<_, EnvReading>(
        r#"
        SELECT id, recorded_at, temperature, humidity, device_id, case_id
        FROM dht_data
        ORDER BY recorded_at, id
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok((StatusCode::OK, Json(readings)))
}
