// src/routes/logs.rs
//! Camera registry and object-recognition log records.
//!
//! The detection pipeline runs outside this service and posts what it
//! recognized; this module stores and serves those records. Log listings
//! carry the camera location alongside each record, the way the dashboard
//! displays them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::{AppError, AppResult, Camera, Config, RecognitionLog};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/logs", get(list).post(ingest))
        .route("/logs/{log_id}", get(detail))
        .route("/cameras", get(list_cameras).post(register_camera))
}

#[derive(Debug, Deserialize)]
struct NewLog {
    // ---
    camera_id: i64,
    recognized_objects: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewCamera {
    // ---
    location: String,
}

/// A log record joined with the location of the camera that produced it.
#[derive(Debug, Serialize, sqlx::FromRow)]
struct LogWithLocation {
    // ---
    id: i64,
    recorded_at: DateTime<Utc>,
    camera_id: i64,
    recognized_objects: Option<String>,
    location: String,
}

// ---

/// Handle `POST /logs`: store one recognition result.
async fn ingest(
    State((pool, _config)): State<(PgPool, Config)>,
    Json(payload): Json<NewLog>,
) -> AppResult<impl IntoResponse> {
    // ---
    info!(
        "POST /logs - camera={} objects={:?}",
        payload.camera_id, payload.recognized_objects
    );

    let camera_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM cameras WHERE id = $1")
        .bind(payload.camera_id)
        .fetch_optional(&pool)
        .await?;

    if camera_exists.is_none() {
        return Err(AppError::NotFound {
            entity: "Camera",
            id: payload.camera_id,
        });
    }

    let log = sqlx::query_as::<_, RecognitionLog>(
        r#"
        INSERT INTO logs (recorded_at, camera_id, recognized_objects)
        VALUES ($1, $2, $3)
        RETURNING id, recorded_at, camera_id, recognized_objects
        "#,
    )
    .bind(Utc::now())
    .bind(payload.camera_id)
    .bind(&payload.recognized_objects)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(log)))
}

/// Handle `GET /logs`: all log records, newest first, with camera location.
async fn list(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let logs = sqlx::query_as::<_, LogWithLocation>(
        r#"
        SELECT l.id, l.recorded_at, l.camera_id, l.recognized_objects, c.location
        FROM logs l
        JOIN cameras c ON c.id = l.camera_id
        ORDER BY l.recorded_at DESC, l.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok((StatusCode::OK, Json(logs)))
}

/// Handle `GET /logs/{id}`.
async fn detail(
    State((pool, _config)): State<(PgPool, Config)>,
    Path(log_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    // ---
    let log = sqlx::query_as::<_, RecognitionLog>(
        r#"
        SELECT id, recorded_at, camera_id, recognized_objects
        FROM logs
        WHERE id = $1
        "#,
    )
    .bind(log_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound {
        entity: "Log",
        id: log_id,
    })?;

    Ok((StatusCode::OK, Json(log)))
}

// ---

/// Handle `POST /cameras`: register a camera.
async fn register_camera(
    State((pool, _config)): State<(PgPool, Config)>,
    Json(payload): Json<NewCamera>,
) -> AppResult<impl IntoResponse> {
    // ---
    info!("POST /cameras - location={}", payload.location);

    let camera = sqlx::query_as::<_, Camera>(
        r#"
        INSERT INTO cameras (location)
        VALUES ($1)
        RETURNING id, location
        "#,
    )
    .bind(&payload.location)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(camera)))
}

/// Handle `GET /cameras`: all registered cameras.
async fn list_cameras(
    State((pool, _config)): State<(PgPool, Config)>,
) -> AppResult<impl IntoResponse> {
    // ---
    let cameras =
        sqlx::query_as::<_, Camera>("SELECT id, location FROM cameras ORDER BY id")
            .fetch_all(&pool)
            .await?;

    Ok((StatusCode::OK, Json(cameras)))
}
