//! Renders monitoring incidents.

use super::Render;
use crate::core::{Embed, EmbedFooter, OutputMessage, Source};
use crate::formatting::{epoch_to_datetime, format_duration};
use crate::sources::MonitoringIncident;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

/// #F5222D
pub const OPEN_COLOR: u32 = 16_007_725;
/// #18B73B
pub const CLOSED_COLOR: u32 = 1_619_771;

const AVATAR_URL: &str = "https://www.gstatic.com/images/branding/product/2x/stackdriver_64dp.png";
const FOOTER: &str = "GCP Monitoring Alert";
const NO_SUMMARY: &str = "No summary available.";
const PLACEHOLDER: &str = "-";

fn or_placeholder<'a>(value: &'a str, name: &str) -> &'a str {
    if value.is_empty() {
        warn!(field = name, "Empty incident field received");
        PLACEHOLDER
    } else {
        value
    }
}

impl Render for MonitoringIncident {
    fn render(&self, now: DateTime<Utc>) -> OutputMessage {
        let project_id = or_placeholder(self.project(), "project_id");
        let policy_name = or_placeholder(&self.policy_name, "policy_name");
        let condition_name = or_placeholder(&self.condition_name, "condition_name");

        let (verb, color) = if self.is_open() {
            ("opened", OPEN_COLOR)
        } else {
            ("closed", CLOSED_COLOR)
        };
        let title = format!(
            "\"{}\" - Incident {} for \"{}\"",
            project_id, verb, policy_name
        );

        let description = if self.summary.is_empty() {
            warn!(field = "summary", "Empty incident field received");
            NO_SUMMARY.to_string()
        } else {
            self.summary.clone()
        };

        let mut embed = Embed {
            title,
            description,
            url: (!self.url.is_empty()).then(|| self.url.clone()),
            color,
            footer: Some(EmbedFooter {
                text: FOOTER.to_string(),
            }),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            ..Default::default()
        };

        embed.push_field("Project ID", project_id);
        embed.push_field("Incident ID", or_placeholder(&self.incident_id, "incident_id"));
        embed.push_field("Condition", condition_name);

        if let Some(started) = epoch_to_datetime(self.started_at) {
            embed.push_field("Started at", rfc3339(started));
            if let Some(ended) = epoch_to_datetime(self.ended_at) {
                embed.push_field(
                    "Ended at",
                    format!("{} ({})", rfc3339(ended), format_duration(started, ended)),
                );
            }
        }

        OutputMessage {
            username: Source::MONITORING_SENDER.to_string(),
            avatar_url: AVATAR_URL.to_string(),
            content: None,
            embeds: vec![embed],
        }
    }
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
