//! The classification pipeline: matchers in priority order, then the
//! renderer for whichever schema matched.
//!
//! The dispatcher is delivery-agnostic. Callers decide where a message goes
//! by looking at its sender label (see [`crate::core::Source::from_sender`]).

use crate::core::OutputMessage;
use crate::render::Render;
use crate::sources::{self, subscription, PayloadError, PayloadKind};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

/// Classifies and renders a raw request body.
pub fn process(body: &[u8], now: DateTime<Utc>) -> Result<OutputMessage, PayloadError> {
    let value: Value = serde_json::from_slice(body)?;
    process_value(&value, now)
}

/// Classifies and renders an already parsed document.
pub fn process_value(value: &Value, now: DateTime<Utc>) -> Result<OutputMessage, PayloadError> {
    let kind = sources::classify_value(value);
    metrics::counter!("payloads_classified_total", "kind" => kind.name()).increment(1);
    render_kind(kind, now)
}

/// Renders a classification result.
pub fn render_kind(kind: PayloadKind, now: DateTime<Utc>) -> Result<OutputMessage, PayloadError> {
    let kind_name = kind.name();
    let message = match kind {
        PayloadKind::Incident(incident) => {
            info!(incident_id = %incident.incident_id, state = %incident.state, "Processing as monitoring incident");
            incident.render(now)
        }
        PayloadKind::SubscriptionStrict(strict, raw) => {
            let event = subscription::from_strict(strict, &raw);
            info!(event_type = %event.event_type, "Processing as subscription event");
            event.render(now)
        }
        PayloadKind::SubscriptionMap(map) => {
            let event = subscription::from_map(&map);
            info!(event_type = %event.event_type, "Processing as loosely typed subscription event");
            event.render(now)
        }
        PayloadKind::SubscriptionMinimal(event) => {
            info!(event_type = %event.event_type, "Processing as bare subscription event");
            event.render(now)
        }
        PayloadKind::Unrecognized => {
            debug!("Payload matched no known schema");
            return Err(PayloadError::Unrecognized);
        }
    };
    debug!(kind = kind_name, username = %message.username, "Rendered notification");
    Ok(message)
}
