// src/routes/notifications.rs
//! Dispatched-notification history.
//!
//! Rows are written by the push dispatcher (`notify.rs`) when a case opens;
//! this endpoint serves the history for the dashboard.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use sqlx::PgPool;

use crate::{AppResult, Config, Notification};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new().route("/notifications", get(list))
}

/// Handle `GET /notifications`: all dispatched warnings, newest first.
async fn list(State((pool, _config)): State<(PgPool, Config)>) -> AppResult<impl IntoResponse> {
    // ---
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, sent_at, content, case_id
        FROM notifications
        ORDER BY sent_at DESC, id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok((StatusCode::OK, Json(notifications)))
}
