// src/routes/mq2.rs
//! MQ2 gas sensor ingestion and retrieval.
//!
//! `POST /mq2` is the heart of the service: classify the incoming sample,
//! store it, and either open a new case or extend the current one. The
//! classification and the aggregation decision live in `level.rs` and
//! `aggregate.rs` as pure functions; this module owns the storage side
//! effects and runs them in a single transaction so a stored case can never
//! be left without its triggering reading.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::{
    classify, decide_case, notify, warning_note, AppError, AppResult, CaseAction, Config,
    DangerLevel, Device, GasPayload, GasReading,
};

// Advisory lock key serializing case creation across concurrent ingestions.
// Two near-simultaneous postings must not both observe a gap and open
// duplicate cases.
const CASE_LOCK_KEY: i64 = 0x6761_7364_6e77; // "gasdnw"

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/mq2", get(latest).post(ingest))
        .route("/mq2list", get(list))
}

/// Handle `POST /mq2`.
///
/// The payload is validated by the typed extractor before anything runs; a
/// missing field is a client error, not a 500. The reading is stored
/// unconditionally; only case creation/extension depends on the classified
/// level.
async fn ingest(
    State((pool, config)): State<(PgPool, Config)>,
    Json(payload): Json<GasPayload>,
) -> AppResult<impl IntoResponse> {
    // ---
    info!(
        "POST /mq2 - device={} lpg={} co={} smoke={}",
        payload.device_id, payload.lpg, payload.co, payload.smoke
    );

    let device = fetch_device(&pool, payload.device_id)
        .await?
        .ok_or(AppError::NotFound {
            entity: "Device",
            id: payload.device_id,
        })?;

    let level = classify(payload.lpg, payload.co, payload.smoke);
    let now = Utc::now();

    debug!("POST /mq2 - classified as {:?}", level);

    let mut tx = pool.begin().await?;

    // Serialize the gap check and case creation; concurrent devices would
    // otherwise race the "latest case" lookup.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(CASE_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let previous_at = latest_reading_at(&mut tx).await?;
    let latest_case = latest_case_id(&mut tx).await?;

    let reading_id = insert_reading(&mut tx, &payload, now).await?;

    let action = decide_case(level, previous_at, now, latest_case, config.case_window());
    let mut opened: Option<(i64, String)> = None;

    match action {
        CaseAction::Ignore => {
            debug!("POST /mq2 - level {:?}, no case touched", level);
        }
        CaseAction::Open => {
            let note = warning_note(&device.location, payload.lpg, payload.co, payload.smoke);
            let case_id = insert_case(&mut tx, now, &note, level).await?;

            attach_reading(&mut tx, case_id, reading_id).await?;
            attach_latest_env_reading(&mut tx, case_id).await?;

            info!("POST /mq2 - opened case {case_id} at level {:?}", level);
            opened = Some((case_id, note));
        }
        CaseAction::Extend(case_id) => {
            // Level and note of the case stay as they were at creation.
            attach_reading(&mut tx, case_id, reading_id).await?;
            attach_latest_env_reading(&mut tx, case_id).await?;

            info!("POST /mq2 - extended case {case_id}");
        }
    }

    tx.commit().await?;

    // Push dispatch only when a case was opened; fire-and-forget relative
    // to the HTTP response.
    if let Some((case_id, note)) = opened {
        tokio::spawn(notify::dispatch_warning(pool.clone(), case_id, note));
    }

    Ok(StatusCode::OK)
}

/// Handle `GET /mq2`: the most recently stored gas reading, 204 when the
/// table is empty.
async fn latest(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let reading = sqlx::query_as::<_, GasReading>(
        r#"
        SELECT id, recorded_at, lpg, co, smoke, device_id, case_id
        FROM mq2_data
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

/// Handle `GET /mq2list`: all stored gas readings, oldest first.
async fn list(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let readings = sqlx::query_as::<_, GasReading>(
        r#"
        SELECT id, recorded_at, lpg, co, smoke, device_id, case_id
        FROM mq2_data
        ORDER BY recorded_at, id
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok((StatusCode::OK, Json(readings)))
}

// ---

async fn fetch_device(pool: &PgPool, device_id: i64) -> Result<Option<Device>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, Device>("SELECT id, location FROM devices WHERE id = $1")
        .bind(device_id)
        .fetch_optional(pool)
        .await
}

/// Timestamp of the most recent reading stored before this one. `None` on an
/// empty table, which the decision treats as an infinite gap.
async fn latest_reading_at(conn: &mut PgConnection) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    // ---
    sqlx::query_scalar(
        r#"
        SELECT recorded_at FROM mq2_data
        ORDER BY recorded_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(conn)
    .await
}

/// Id of the most recently opened case, if any.
async fn latest_case_id(conn: &mut PgConnection) -> Result<Option<i64>, sqlx::Error> {
    // ---
    sqlx::query_scalar(
        r#"
        SELECT id FROM cases
        ORDER BY opened_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(conn)
    .await
}

async fn insert_reading(
    conn: &mut PgConnection,
    payload: &GasPayload,
    recorded_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    // ---
    sqlx::query_scalar(
        r#"
        INSERT INTO mq2_data (recorded_at, lpg, co, smoke, device_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(recorded_at)
    .bind(payload.lpg)
    .bind(payload.co)
    .bind(payload.smoke)
    .bind(payload.device_id)
    .fetch_one(conn)
    .await
}

async fn insert_case(
    conn: &mut PgConnection,
    opened_at: DateTime<Utc>,
    note: &str,
    level: DangerLevel,
) -> Result<i64, sqlx::Error> {
    // ---
    sqlx::query_scalar(
        r#"
        INSERT INTO cases (opened_at, note, level)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(opened_at)
    .bind(note)
    .bind(level)
    .fetch_one(conn)
    .await
}

async fn attach_reading(
    conn: &mut PgConnection,
    case_id: i64,
    reading_id: i64,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query("UPDATE mq2_data SET case_id = $1 WHERE id = $2")
        .bind(case_id)
        .bind(reading_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Attach the most recent DHT sample to the case as environmental context.
/// Context pairing only: the sample is whatever was last stored, not
/// necessarily time-aligned with the gas reading. No-op when no DHT sample
/// exists yet.
async fn attach_latest_env_reading(
    conn: &mut PgConnection,
    case_id: i64,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        UPDATE dht_data SET case_id = $1
        WHERE id = (
            SELECT id FROM dht_data
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
        )
        "#,
    )
    .bind(case_id)
    .execute(conn)
    .await?;

    Ok(())
}
