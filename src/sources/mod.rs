//! Schema matchers for the supported upstream sources.
//!
//! [`classify`] tries each known schema in a fixed priority order and
//! returns an explicit tag naming the one that matched. Monitoring incidents
//! are checked first: `incident_id` is a strong signal, and a payload that
//! happens to satisfy both shapes must not be read as a subscription event.

pub mod monitoring;
pub mod subscription;

pub use monitoring::{IncidentNotification, MonitoringIncident};
pub use subscription::{StrictSubscriptionEvent, SubscriptionEvent};

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reads `null` as the type's default, the same as an absent key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors that end processing of a single payload.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload does not match any known source schema")]
    Unrecognized,
}

/// The outcome of classifying a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadKind {
    /// A monitoring incident with a non-empty `incident_id`.
    Incident(MonitoringIncident),
    /// A subscription event that passed the strict typed decode, with the
    /// object it came from for the keys the typed form does not cover.
    SubscriptionStrict(StrictSubscriptionEvent, Map<String, Value>),
    /// A subscription event read leniently from a JSON object.
    SubscriptionMap(Map<String, Value>),
    /// Only a top-level `event` string could be recovered.
    SubscriptionMinimal(SubscriptionEvent),
    Unrecognized,
}

impl PayloadKind {
    /// Short, stable name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Incident(_) => "incident",
            Self::SubscriptionStrict(..) => "subscription_strict",
            Self::SubscriptionMap(_) => "subscription_map",
            Self::SubscriptionMinimal(_) => "subscription_minimal",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Parses raw bytes and classifies them.
pub fn classify(body: &[u8]) -> Result<PayloadKind, PayloadError> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(classify_value(&value))
}

/// Classifies an already parsed JSON document.
pub fn classify_value(value: &Value) -> PayloadKind {
    if let Some(incident) = monitoring::match_incident(value) {
        return PayloadKind::Incident(incident);
    }
    if let (Some(event), Some(raw)) = (subscription::match_strict(value), value.as_object()) {
        return PayloadKind::SubscriptionStrict(event, raw.clone());
    }
    if let Some(map) = subscription::match_map(value) {
        return PayloadKind::SubscriptionMap(map.clone());
    }
    if let Some(event) = subscription::match_bare_event(value) {
        return PayloadKind::SubscriptionMinimal(event);
    }
    PayloadKind::Unrecognized
}
