// src/routes/reports.rs
//! Report records.
//!
//! A report is a content snapshot referencing a case or a log. PDF/chart
//! rendering and mail delivery are external collaborators; this module only
//! stores and serves the records they work from.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::{AppError, AppResult, Config, Report};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/reports", get(list).post(create))
        .route("/reports/{report_id}", get(detail))
}

#[derive(Debug, Deserialize)]
struct NewReport {
    // ---
    content: String,
    case_id: Option<i64>,
    log_id: Option<i64>,
}

/// Handle `POST /reports`: create a report record, optionally referencing a
/// case or a log. Referenced ids must exist.
async fn create(
    State((pool, _config)): State<(PgPool, Config)>,
    Json(payload): Json<NewReport>,
) -> AppResult<impl IntoResponse> {
    // ---
    info!(
        "POST /reports - case_id={:?} log_id={:?}",
        payload.case_id, payload.log_id
    );

    if let Some(case_id) = payload.case_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM cases WHERE id = $1")
            .bind(case_id)
            .fetch_optional(&pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound {
                entity: "Case",
                id: case_id,
            });
        }
    }

    if let Some(log_id) = payload.log_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM logs WHERE id = $1")
            .bind(log_id)
            .fetch_optional(&pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound {
                entity: "Log",
                id: log_id,
            });
        }
    }

    let report = sqlx::query_as::<_, Report>(
        r#"
        INSERT INTO reports (created_at, content, case_id, log_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, created_at, content, case_id, log_id
        "#,
    )
    .bind(Utc::now())
    .bind(&payload.content)
    .bind(payload.case_id)
    .bind(payload.log_id)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

/// Handle `GET /reports`: all report records, newest first.
async fn list(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let reports = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, created_at, content, case_id, log_id
        FROM reports
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok((StatusCode::OK, Json(reports)))
}

/// Handle `GET /reports/{id}`.
async fn detail(
    State((pool, _config)): State<(PgPool, Config)>,
    Path(report_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    // ---
    let report = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, created_at, content, case_id, log_id
        FROM reports
        WHERE id = $1
        "#,
    )
    .bind(report_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound {
        entity: "Report",
        id: report_id,
    })?;

    Ok((StatusCode::OK, Json(report)))
}
