//! Classification and rendering through the public dispatcher API.

#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::{DateTime, TimeZone, Utc};
use helpers::payloads;
use hookrelay::core::Source;
use hookrelay::dispatch;
use hookrelay::render::incident::{CLOSED_COLOR, OPEN_COLOR};
use hookrelay::render::subscription::{event_color, palette};
use hookrelay::sources::{self, PayloadError, PayloadKind};
use hookrelay::verification::{self, VerificationReply};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[test]
fn test_incident_state_drives_color_and_title() {
    let open = dispatch::process_value(&payloads::open_incident(), now()).unwrap();
    assert_eq!(open.embeds[0].color, OPEN_COLOR);
    assert!(open.embeds[0].title.contains("opened"));

    let closed = dispatch::process_value(&payloads::closed_incident(), now()).unwrap();
    assert_eq!(closed.embeds[0].color, CLOSED_COLOR);
    assert!(closed.embeds[0].title.contains("closed"));

    let no_state = json!({ "incident": { "incident_id": "x" } });
    let rendered = dispatch::process_value(&no_state, now()).unwrap();
    assert_eq!(rendered.embeds[0].color, CLOSED_COLOR);
}

#[test]
fn test_incident_missing_names_render_placeholders() {
    let body = json!({ "incident": { "incident_id": "only-id", "state": "open" } });
    let message = dispatch::process_value(&body, now()).unwrap();
    let embed = &message.embeds[0];

    assert_eq!(embed.field("Project ID"), Some("-"));
    assert_eq!(embed.field("Condition"), Some("-"));
    assert_eq!(embed.title, "\"-\" - Incident opened for \"-\"");
    assert_eq!(embed.description, "No summary available.");
}

#[test]
fn test_incident_null_fields_render_placeholders() {
    let body = json!({
        "version": null,
        "incident": {
            "incident_id": "null-fields",
            "state": "open",
            "policy_name": null,
            "summary": null,
            "url": null,
            "started_at": null
        }
    });
    let message = dispatch::process_value(&body, now()).unwrap();
    let embed = &message.embeds[0];

    assert_eq!(embed.field("Condition"), Some("-"));
    assert_eq!(embed.description, "No summary available.");
    assert_eq!(embed.title, "\"-\" - Incident opened for \"-\"");
}

#[test]
fn test_incident_with_both_project_keys_uses_scoping_project() {
    let body = json!({
        "incident": {
            "incident_id": "i-2",
            "state": "open",
            "scoping_project_id": "a",
            "project_id": "b",
            "policy_name": "p"
        }
    });
    let message = dispatch::process_value(&body, now()).unwrap();
    assert_eq!(message.embeds[0].title, "\"a\" - Incident opened for \"p\"");
    assert_eq!(message.embeds[0].field("Project ID"), Some("a"));
}

#[test]
fn test_arrays_are_not_incidents() {
    assert!(matches!(
        sources::classify_value(&json!([{ "incident_id": "x" }])),
        PayloadKind::Unrecognized
    ));
    assert!(matches!(
        sources::classify_value(&json!({ "incident": ["x"] })),
        PayloadKind::Unrecognized
    ));
}

#[test]
fn test_null_expiry_keeps_nested_subscription_fields() {
    let body = json!({
        "event_type": "subscription_renewed",
        "data": {
            "profile_id": "prof-1",
            "subscription": {
                "product_id": "premium_monthly",
                "store": "app_store",
                "expires_at": null
            }
        }
    });
    assert_eq!(sources::classify_value(&body).name(), "subscription_strict");

    let embed = &dispatch::process_value(&body, now()).unwrap().embeds[0];
    assert_eq!(embed.field("Profile ID"), Some("prof-1"));
    assert_eq!(embed.field("Product"), Some("premium_monthly"));
    assert_eq!(embed.field("Store"), Some("app_store"));
    assert!(embed.field("Expires").is_none());
}

#[test]
fn test_unparseable_timestamp_does_not_change_the_rendering() {
    let body = json!({
        "event_type": "access_level_updated",
        "profile_id": "p",
        "access_level": "premium",
        "product_id": "monthly",
        "store": "app_store"
    });
    let mut loose = body.clone();
    loose["timestamp"] = json!("x");
    assert_eq!(sources::classify_value(&body).name(), "subscription_strict");
    assert_eq!(sources::classify_value(&loose).name(), "subscription_map");

    let strict = dispatch::process_value(&body, now()).unwrap();
    let map = dispatch::process_value(&loose, now()).unwrap();
    assert_eq!(strict.embeds[0].fields, map.embeds[0].fields);
    assert_eq!(strict.embeds[0].description, map.embeds[0].description);
    assert_eq!(
        strict.embeds[0].description,
        "Access level changed to **premium**."
    );
}

#[test]
fn test_incident_duration_field() {
    let closed = dispatch::process_value(&payloads::closed_incident(), now()).unwrap();
    let ended = closed.embeds[0].field("Ended at").unwrap();
    assert!(ended.contains("2023-11-14T23:13:20Z"), "{}", ended);
    assert!(ended.contains("1 hour"), "{}", ended);
    assert_eq!(
        closed.embeds[0].field("Started at"),
        Some("2023-11-14T22:13:20Z")
    );

    let open = dispatch::process_value(&payloads::open_incident(), now()).unwrap();
    assert!(open.embeds[0].field("Started at").is_some());
    assert!(open.embeds[0].field("Ended at").is_none());
}

#[test]
fn test_subscription_colors_follow_palette() {
    let cases = [
        ("subscription_started", palette::GREEN),
        ("subscription_expired", palette::YELLOW),
        ("subscription_canceled", palette::RED),
        ("trial_started", palette::PURPLE),
        ("non_subscription_purchase", palette::GREEN),
        ("some_future_event", palette::GRAY),
    ];
    for (event_type, color) in cases {
        let message = dispatch::process_value(&json!({ "event_type": event_type }), now()).unwrap();
        assert_eq!(message.embeds[0].color, color, "{}", event_type);
        assert_eq!(event_color(event_type), color);
    }
}

#[test]
fn test_full_subscription_event_renders_fields_in_order() {
    let message = dispatch::process_value(&payloads::subscription_started(), now()).unwrap();
    let embed = &message.embeds[0];

    assert_eq!(Source::from_sender(&message.username), Some(Source::Subscriptions));
    assert_eq!(embed.title, "Adapty: Subscription Started");
    assert_eq!(
        embed.description,
        "A new subscription to **premium_monthly** has started."
    );

    let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "User",
            "Email",
            "Profile ID",
            "Transaction ID",
            "Product",
            "Store",
            "Environment",
            "Revenue",
            "Has Access",
            "Will Renew",
            "Purchased",
            "Expires",
        ]
    );
    assert_eq!(embed.field("Environment"), Some("Production"));
    assert_eq!(embed.field("Revenue"), Some("9.99 USD (net 8.49 USD)"));
    assert_eq!(embed.field("Purchased"), Some("May 1, 2024 10:00 UTC"));
    assert_eq!(embed.field("Expires"), Some("Jun 1, 2024 10:00 UTC"));
}

#[test]
fn test_rendering_is_deterministic_apart_from_timestamp() {
    let body = payloads::subscription_started();
    let first = dispatch::process_value(&body, now()).unwrap();
    let same = dispatch::process_value(&body, now()).unwrap();
    assert_eq!(first, same);

    let later = dispatch::process_value(&body, now() + chrono::Duration::hours(1)).unwrap();
    assert_ne!(first.embeds[0].timestamp, later.embeds[0].timestamp);

    let mut normalized = later.clone();
    normalized.embeds[0].timestamp = first.embeds[0].timestamp.clone();
    assert_eq!(first, normalized);
}

#[test]
fn test_classification_priority() {
    // Carries both an incident and subscription markers; the incident wins.
    let both = json!({
        "incident": { "incident_id": "i-1", "state": "open" },
        "event_type": "subscription_started"
    });
    assert_eq!(sources::classify_value(&both).name(), "incident");

    assert_eq!(
        sources::classify_value(&payloads::subscription_started()).name(),
        "subscription_strict"
    );
    assert_eq!(
        sources::classify_value(&payloads::loose_subscription_renewed()).name(),
        "subscription_map"
    );
    assert_eq!(
        sources::classify_value(&json!({ "event": "trial_started", "timestamp": "soon" })).name(),
        "subscription_minimal"
    );
    assert!(matches!(
        sources::classify_value(&json!({ "foo": "bar" })),
        PayloadKind::Unrecognized
    ));
}

#[test]
fn test_malformed_and_unrecognized_errors() {
    assert!(matches!(
        dispatch::process(b"\x00not json", now()),
        Err(PayloadError::Malformed(_))
    ));
    assert!(matches!(
        dispatch::process(br#"{"foo": "bar"}"#, now()),
        Err(PayloadError::Unrecognized)
    ));
}

#[test]
fn test_verification_replies() {
    let check = verification::verify(&json!({ "adapty_check": "xyz123" })).unwrap();
    assert_eq!(check.to_json(), json!({ "adapty_check_response": "xyz123" }));

    for mount in [json!({ "event": "isMount" }), json!({ "data": { "event": "isMount" } })] {
        assert_eq!(verification::verify(&mount), Some(VerificationReply::Mounted));
    }

    assert!(verification::verify(&payloads::subscription_started()).is_none());
}
