use axum::Router;
use sqlx::PgPool;

use crate::Config;

mod cases;
mod devices;
mod dht;
mod health;
mod logs;
mod mq2;
mod notifications;
mod reports;
mod subscribers;

// ---

pub fn router(pool: PgPool, config: Config) -> Router {
    // ---
    Router::new()
        .merge(mq2::router())
        .merge(dht::router())
        .merge(cases::router())
        .merge(devices::router())
        .merge(logs::router())
        .merge(reports::router())
        .merge(notifications::router())
        .merge(subscribers::router())
        .merge(health::router())
        .with_state((pool, config))
}
