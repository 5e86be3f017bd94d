//! Data models for the GasDnW backend: persisted entities and the typed
//! ingestion payloads accepted from sensor firmware.
//!
//! Payload structs are deliberately strict: a missing field is rejected at
//! deserialization time with a client error instead of surfacing later as a
//! server error inside the classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DangerLevel;

// ---

/// A registered sensor device and where it is installed.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Device {
    // ---
    pub id: i64,
    pub location: String,
}

/// One stored MQ2 gas sample. Immutable once persisted; `case_id` is the
/// only column ever updated, when the sample is attached to a case.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct GasReading {
    // ---
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub lpg: i64,
    pub co: i64,
    pub smoke: i64,
    pub device_id: i64,
    pub case_id: Option<i64>,
}

/// One stored DHT temperature/humidity sample.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnvReading {
    // ---
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub temperature: i64,
    pub humidity: i64,
    pub device_id: i64,
    pub case_id: Option<i64>,
}

/// An incident: a group of temporally adjacent dangerous readings.
/// `level` and `note` are fixed at creation and never recomputed when later
/// readings are attached.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Case {
    // ---
    pub id: i64,
    pub opened_at: DateTime<Utc>,
    pub note: String,
    pub level: DangerLevel,
}

/// A registered camera.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Camera {
    // ---
    pub id: i64,
    pub location: String,
}

/// A camera-derived object-recognition log record. The detection pipeline
/// itself is an external collaborator; only its output is stored here.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecognitionLog {
    // ---
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub camera_id: i64,
    pub recognized_objects: Option<String>,
}

/// A report record referencing a case or a log. Rendering and mail delivery
/// happen outside this service.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Report {
    // ---
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub case_id: Option<i64>,
    pub log_id: Option<i64>,
}

/// Record of one dispatched warning.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Notification {
    // ---
    pub id: i64,
    pub sent_at: DateTime<Utc>,
    pub content: String,
    pub case_id: Option<i64>,
}

/// A browser push subscription registered via `POST /subscribe`.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    // ---
    pub id: i64,
    pub subscribed_at: DateTime<Utc>,
    pub endpoint: String,
    pub expiration_time: Option<String>,
    pub p256dh: String,
    pub auth: String,
}

// ---

/// MQ2 ingestion payload. Field names match what the deployed firmware
/// posts.
#[derive(Debug, Deserialize)]
pub struct GasPayload {
    // ---
    #[serde(rename = "LPG")]
    pub lpg: i64,
    #[serde(rename = "CO")]
    pub co: i64,
    #[serde(rename = "Smoke")]
    pub smoke: i64,
    pub device_id: i64,
}

/// DHT ingestion payload. `Hudimity` is accepted as an alias because the
/// original firmware ships with that spelling.
#[derive(Debug, Deserialize)]
pub struct EnvPayload {
    // ---
    #[serde(rename = "Temperature")]
    pub temperature: i64,
    #[serde(rename = "Humidity", alias = "Hudimity")]
    pub humidity: i64,
    pub device_id: i64,
}

/// Push subscription payload, in the shape browsers produce from
/// `PushSubscription.toJSON()`.
#[derive(Debug, Deserialize)]
pub struct SubscriptionPayload {
    // ---
    pub endpoint: String,
    #[serde(rename = "expirationTime")]
    pub expiration_time: Option<String>,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
    // ---
    pub p256dh: String,
    pub auth: String,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_gas_payload_uses_firmware_field_names() {
        // ---
        let raw = r#"{"LPG": 5600, "CO": 12, "Smoke": 8, "device_id": 1}"#;
        let payload: GasPayload = serde_json::from_str(raw).unwrap();

        assert_eq!(payload.lpg, 5600);
        assert_eq!(payload.co, 12);
        assert_eq!(payload.smoke, 8);
        assert_eq!(payload.device_id, 1);
    }

    #[test]
    fn test_gas_payload_rejects_missing_fields() {
        // ---
        let raw = r#"{"LPG": 5600, "CO": 12, "device_id": 1}"#;
        assert!(serde_json::from_str::<GasPayload>(raw).is_err());
    }

    #[test]
    fn test_env_payload_accepts_legacy_hudimity_spelling() {
        // ---
        let raw = r#"{"Temperature": 23, "Hudimity": 41, "device_id": 2}"#;
        let payload: EnvPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.humidity, 41);

        let raw = r#"{"Temperature": 23, "Humidity": 44, "device_id": 2}"#;
        let payload: EnvPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.humidity, 44);
    }

    #[test]
    fn test_subscription_payload_browser_shape() {
        // ---
        let raw = r#"{
            "endpoint": "https://push.example/send/abc",
            "expirationTime": null,
            "keys": {"p256dh": "pk", "auth": "tok"}
        }"#;
        let sub: SubscriptionPayload = serde_json::from_str(raw).unwrap();

        assert_eq!(sub.endpoint, "https://push.example/send/abc");
        assert!(sub.expiration_time.is_none());
        assert_eq!(sub.keys.p256dh, "pk");
        assert_eq!(sub.keys.auth, "tok");
    }

    #[test]
    fn test_gas_reading_round_trip() {
        // ---
        let reading = GasReading {
            id: 5,
            recorded_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            lpg: 5600,
            co: 12,
            smoke: 8,
            device_id: 1,
            case_id: Some(2),
        };

        let json = serde_json::to_string(&reading).unwrap();
        let back: GasReading = serde_json::from_str(&json).unwrap();

        // Persist-then-reread fidelity: every field survives unchanged.
        assert_eq!(back.id, reading.id);
        assert_eq!(back.recorded_at, reading.recorded_at);
        assert_eq!(back.lpg, reading.lpg);
        assert_eq!(back.co, reading.co);
        assert_eq!(back.smoke, reading.smoke);
        assert_eq!(back.device_id, reading.device_id);
        assert_eq!(back.case_id, reading.case_id);
    }
}
