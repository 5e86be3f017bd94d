//! Database schema management for `gasdnw-backend`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the device/camera registries, the reading tables fed by the
/// sensors, the case table the aggregator writes, and the report,
/// notification and subscriber tables. Safe to call on every startup; no-op
/// if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            id       BIGSERIAL PRIMARY KEY,
            location TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Incident records opened by the case aggregator. `level` is the
    // DangerLevel discriminant (1..4); level 0 never produces a row.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cases (
            id        BIGSERIAL PRIMARY KEY,
            opened_at TIMESTAMPTZ NOT NULL,
            note      TEXT        NOT NULL,
            level     SMALLINT    NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // MQ2 gas samples. Append-only; case_id is set when a sample is
    // attached to a case.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mq2_data (
            id          BIGSERIAL PRIMARY KEY,
            recorded_at TIMESTAMPTZ NOT NULL,
            lpg         BIGINT      NOT NULL,
            co          BIGINT      NOT NULL,
            smoke       BIGINT      NOT NULL,
            device_id   BIGINT      NOT NULL REFERENCES devices (id),
            case_id     BIGINT      REFERENCES cases (id)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // DHT temperature/humidity samples.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dht_data (
            id          BIGSERIAL PRIMARY KEY,
            recorded_at TIMESTAMPTZ NOT NULL,
            temperature BIGINT      NOT NULL,
            humidity    BIGINT      NOT NULL,
            device_id   BIGINT      NOT NULL REFERENCES devices (id),
            case_id     BIGINT      REFERENCES cases (id)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cameras (
            id       BIGSERIAL PRIMARY KEY,
            location TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            id                 BIGSERIAL PRIMARY KEY,
            recorded_at        TIMESTAMPTZ NOT NULL,
            camera_id          BIGINT      NOT NULL REFERENCES cameras (id),
            recognized_objects TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id         BIGSERIAL PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL,
            content    TEXT        NOT NULL,
            case_id    BIGINT      REFERENCES cases (id),
            log_id     BIGINT      REFERENCES logs (id)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id      BIGSERIAL PRIMARY KEY,
            sent_at TIMESTAMPTZ NOT NULL,
            content TEXT        NOT NULL,
            case_id BIGINT      REFERENCES cases (id)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscribers (
            id              BIGSERIAL PRIMARY KEY,
            subscribed_at   TIMESTAMPTZ NOT NULL,
            endpoint        TEXT        NOT NULL,
            expiration_time TEXT,
            p256dh          TEXT        NOT NULL,
            auth            TEXT        NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for the "latest" lookups the aggregator performs on
    // every ingestion, and for case detail queries.
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_mq2_data_recorded_at
            ON mq2_data (recorded_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_dht_data_recorded_at
            ON dht_data (recorded_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_cases_opened_at
            ON cases (opened_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_mq2_data_case_id
            ON mq2_data (case_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_dht_data_case_id
            ON dht_data (case_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
