//! Representative request bodies.

use serde_json::{json, Value};

pub fn open_incident() -> Value {
    json!({
        "incident": {
            "incident_id": "0.ntest123",
            "scoping_project_id": "prod-project",
            "state": "open",
            "started_at": 1700000000,
            "ended_at": null,
            "policy_name": "Uptime check",
            "condition_name": "HTTP 5xx rate",
            "url": "https://console.cloud.google.com/monitoring/alerting/incidents/0.ntest123",
            "summary": "Error rate above threshold"
        },
        "version": "1.2"
    })
}

pub fn closed_incident() -> Value {
    json!({
        "incident": {
            "incident_id": "0.ntest123",
            "scoping_project_id": "prod-project",
            "state": "closed",
            "started_at": 1700000000,
            "ended_at": 1700003600,
            "policy_name": "Uptime check",
            "condition_name": "HTTP 5xx rate",
            "summary": "Error rate back to normal"
        },
        "version": "1.2"
    })
}

/// The flat shape with an `event_properties` bag.
pub fn subscription_started() -> Value {
    json!({
        "profile_id": "00000000-0000-0000-0000-000000000001",
        "customer_user_id": "user-42",
        "email": "user@example.com",
        "event_type": "subscription_started",
        "event_datetime": "2024-05-01T10:00:00.000000+0000",
        "event_properties": {
            "store": "app_store",
            "environment": "Production",
            "vendor_product_id": "premium_monthly",
            "vendor_transaction_id": "1000000123456789",
            "price_usd": 9.99,
            "proceeds_usd": 8.49,
            "profile_has_access_level": true,
            "will_renew": true,
            "purchase_date": "2024-05-01T10:00:00.000000+0000",
            "subscription_expires_at": "2024-06-01T10:00:00.000000+0000"
        }
    })
}

/// A subscription event whose price is string-encoded, which only the
/// lenient reading accepts.
pub fn loose_subscription_renewed() -> Value {
    json!({
        "customer_user_id": "user-7",
        "event_type": "subscription_renewed",
        "event_properties": {
            "price_usd": "4.99",
            "will_renew": "true",
            "store": "play_store"
        }
    })
}
