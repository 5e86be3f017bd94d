//! Best-effort push notification dispatch.
//!
//! When a new case opens, the warning is recorded in the `notifications`
//! table and posted to every registered subscriber endpoint. Delivery is
//! fire-and-forget relative to the ingestion request: the caller spawns
//! [`dispatch_warning`] on the runtime and does not await it. A failure for
//! one subscriber is logged and skipped; it never aborts the remaining
//! subscribers, and nothing here can fail the ingestion request itself.

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::Subscriber;

// ---

/// Record the warning and push it to all subscribers.
pub async fn dispatch_warning(pool: PgPool, case_id: i64, message: String) {
    // ---
    if let Err(e) = record_notification(&pool, case_id, &message).await {
        warn!("Failed to record notification for case {case_id}: {e}");
    }

    let subscribers = match fetch_subscribers(&pool).await {
        Ok(subs) => subs,
        Err(e) => {
            warn!("Failed to load subscribers, skipping push dispatch: {e}");
            return;
        }
    };

    if subscribers.is_empty() {
        debug!("No push subscribers registered, nothing to dispatch");
        return;
    }

    let client = reqwest::Client::new();
    let mut delivered = 0usize;

    for subscriber in &subscribers {
        match push_to_subscriber(&client, subscriber, &message).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                // Per-subscriber failures are logged and skipped.
                warn!(
                    "Push delivery to subscriber {} ({}) failed: {}",
                    subscriber.id, subscriber.endpoint, e
                );
            }
        }
    }

    info!(
        "Dispatched warning for case {case_id} to {delivered}/{} subscribers",
        subscribers.len()
    );
}

// ---

async fn record_notification(pool: &PgPool, case_id: i64, message: &str) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO notifications (sent_at, content, case_id)
        VALUES (now(), $1, $2)
        "#,
    )
    .bind(message)
    .bind(case_id)
    .execute(pool)
    .await?;

    Ok(())
}

async fn fetch_subscribers(pool: &PgPool) -> Result<Vec<Subscriber>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, Subscriber>(
        r#"
        SELECT id, subscribed_at, endpoint, expiration_time, p256dh, auth
        FROM subscribers
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// POST the message to one subscriber endpoint.
async fn push_to_subscriber(
    client: &reqwest::Client,
    subscriber: &Subscriber,
    message: &str,
) -> Result<(), reqwest::Error> {
    // ---
    client
        .post(&subscriber.endpoint)
        .json(&serde_json::json!({ "message": message }))
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}
