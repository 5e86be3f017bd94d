// src/routes/cases.rs
//! Case (incident) retrieval.
//!
//! Cases are created and extended exclusively by the MQ2 ingestion path;
//! this module only reads them back, newest first, with their attached
//! gas and environment readings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::{AppError, AppResult, Case, Config, EnvReading, GasReading};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/cases", get(list))
        .route("/cases/{case_id}", get(detail))
}

/// One case plus its attached readings, as returned by `GET /cases/{id}`.
#[derive(Debug, Serialize)]
struct CaseDetail {
    // ---
    case: Case,
    mq2_data_list: Vec<GasReading>,
    dht_data_list: Vec<EnvReading>,
}

/// Handle `GET /cases`: all cases, newest first.
async fn list(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let cases = sqlx::query_as::<_, Case>(
        r#"
        SELECT id, opened_at, note, level
        FROM cases
        ORDER BY opened_at DESC, id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok((StatusCode::OK, Json(cases)))
}

/// Handle `GET /cases/{id}`: the case with its gas and environment readings
/// in recording order.
async fn detail(
    State((pool, _config)): State<(PgPool, Config)>,
    Path(case_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    // ---
    let case = sqlx::query_as::<_, Case>(
        r#"
        SELECT id, opened_at, note, level
        FROM cases
        WHERE id = $1
        "#,
    )
    .bind(case_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound {
        entity: "Case",
        id: case_id,
    })?;

    let mq2_data_list = sqlx::query_as::<_, GasReading>(
        r#"
        SELECT id, recorded_at, lpg, co, smoke, device_id, case_id
        FROM mq2_data
        WHERE case_id = $1
        ORDER BY recorded_at, id
        "#,
    )
    .bind(case_id)
    .fetch_all(&pool)
    .await?;

    let dht_data_list = sqlx::query_as::<_, EnvReading>(
        r#"
        SELECT id, recorded_at, temperature, humidity, device_id, case_id
        FROM dht_data
        WHERE case_id = $1
        ORDER BY recorded_at, id
        "#,
    )
    .bind(case_id)
    .fetch_all(&pool)
    .await?;

    Ok((
        StatusCode::OK,
        Json(CaseDetail {
            case,
            mq2_data_list,
            dht_data_list,
        }),
    ))
}
