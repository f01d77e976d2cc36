//! Wire types for cloud monitoring incident notifications.

use super::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The envelope posted by the monitoring webhook channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IncidentNotification {
    #[serde(default)]
    pub incident: MonitoringIncident,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

/// A single monitoring incident. All fields degrade to empty/zero when
/// absent or `null`; only `incident_id` is required for a positive match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MonitoringIncident {
    #[serde(deserialize_with = "null_as_default")]
    pub scoping_project_id: String,
    /// Older payloads carry the project under this key.
    #[serde(deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub incident_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resource_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resource_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    /// Epoch seconds, 0 when absent.
    #[serde(deserialize_with = "null_as_default")]
    pub started_at: i64,
    /// Epoch seconds, 0 when absent. Still-open incidents send `null`.
    #[serde(deserialize_with = "null_as_default")]
    pub ended_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub policy_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub condition_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
}

impl MonitoringIncident {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }

    /// The project the incident belongs to, `scoping_project_id` first.
    pub fn project(&self) -> &str {
        if self.scoping_project_id.is_empty() {
            &self.project_id
        } else {
            &self.scoping_project_id
        }
    }
}

/// Attempts to read `value` as a monitoring incident notification.
///
/// Returns `None` unless `incident` is a JSON object, the decode succeeds and
/// it carries a non-empty `incident_id`; an unrelated document that merely
/// decodes into the all-default shape is not an incident.
pub fn match_incident(value: &Value) -> Option<MonitoringIncident> {
    if !value.get("incident").is_some_and(Value::is_object) {
        return None;
    }
    let notification = IncidentNotification::deserialize(value).ok()?;
    if notification.incident.incident_id.is_empty() {
        return None;
    }
    Some(notification.incident)
}
