// src/routes/subscribers.rs
//! Push subscription registration.
//!
//! Browsers post their `PushSubscription` here; the dispatcher in
//! `notify.rs` delivers warnings to every registered endpoint when a case
//! opens.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use crate::{AppError, AppResult, Config, Subscriber, SubscriptionPayload};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new().route("/subscribe", post(subscribe))
}

/// Handle `POST /subscribe`: store one push subscription.
async fn subscribe(
    State((pool, _config)): State<(PgPool, Config)>,
    Json(payload): Json<SubscriptionPayload>,
) -> AppResult<impl IntoResponse> {
    // ---
    info!("POST /subscribe - endpoint={}", payload.endpoint);

    if payload.endpoint.is_empty() {
        return Err(AppError::BadRequest("endpoint must not be empty".into()));
    }

    let subscriber = sqlx::query_as::<_, Subscriber>(
        r#"
        INSERT INTO subscribers (subscribed_at, endpoint, expiration_time, p256dh, auth)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, subscribed_at, endpoint, expiration_time, p256dh, auth
        "#,
    )
    .bind(Utc::now())
    .bind(&payload.endpoint)
    .bind(&payload.expiration_time)
    .bind(&payload.keys.p256dh)
    .bind(&payload.keys.auth)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(subscriber)))
}
