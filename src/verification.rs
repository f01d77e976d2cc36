//! Answers the liveness checks upstream platforms send when a webhook is
//! registered. These take priority over classification and are never
//! delivered downstream.

use serde_json::{json, Map, Value};

/// Key carrying the check token sent by the subscription platform.
pub const CHECK_KEY: &str = "adapty_check";
/// Event identifier used by the mount check.
pub const MOUNT_SENTINEL: &str = "isMount";

/// A fixed reply to a verification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationReply {
    /// Echoes the check token back under `<key>_response`.
    CheckToken(String),
    /// Plain acknowledgement for mount checks.
    Mounted,
}

impl VerificationReply {
    /// The JSON body to send back to the probing platform.
    pub fn to_json(&self) -> Value {
        match self {
            Self::CheckToken(token) => {
                let mut body = Map::new();
                body.insert(format!("{}_response", CHECK_KEY), Value::String(token.clone()));
                Value::Object(body)
            }
            Self::Mounted => json!({
                "status": "ok",
                "message": "Webhook verification successful",
            }),
        }
    }
}

/// Returns a reply if `payload` is a verification request.
pub fn verify(payload: &Value) -> Option<VerificationReply> {
    if let Some(token) = payload.get(CHECK_KEY).and_then(Value::as_str) {
        return Some(VerificationReply::CheckToken(token.to_string()));
    }

    let is_mount = |v: Option<&Value>| v.and_then(Value::as_str) == Some(MOUNT_SENTINEL);
    let top_level = payload.get("event");
    let nested = payload.get("data").and_then(|data| data.get("event"));
    if is_mount(top_level) || is_mount(nested) {
        return Some(VerificationReply::Mounted);
    }

    None
}
