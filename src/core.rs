//! Core domain types shared by the renderers, the dispatcher and the
//! delivery client.
//!
//! The output shape mirrors a Discord webhook execution body. Empty optional
//! members are left out of the serialized JSON so the payload forwarded
//! downstream stays minimal.

use serde::{Deserialize, Serialize};

/// A chat message ready to be posted to a Discord webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OutputMessage {
    /// Sender label shown in the channel. Also selects the delivery target.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    /// Plain-text content. Never set by the renderers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

/// The structured part of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Embed {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Decimal RGB.
    pub color: u32,
    /// Display order matters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// RFC 3339 timestamp of rendering.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
}

impl Embed {
    /// Appends an inline field.
    pub fn push_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.push(EmbedField {
            name: name.to_string(),
            value: value.into(),
            inline: true,
        });
    }

    /// Looks up a field value by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EmbedFooter {
    pub text: String,
}

/// The upstream system a rendered message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Cloud infrastructure monitoring incidents.
    Monitoring,
    /// Subscription-management platform events.
    Subscriptions,
}

impl Source {
    pub const MONITORING_SENDER: &'static str = "GCP Monitoring";
    pub const SUBSCRIPTIONS_SENDER: &'static str = "Adapty";

    /// Maps a rendered message's sender label back to its source.
    pub fn from_sender(username: &str) -> Option<Self> {
        match username {
            Self::MONITORING_SENDER => Some(Self::Monitoring),
            Self::SUBSCRIPTIONS_SENDER => Some(Self::Subscriptions),
            _ => None,
        }
    }

    /// Short, stable name used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monitoring => "monitoring",
            Self::Subscriptions => "subscriptions",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
