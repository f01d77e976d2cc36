//! Renders subscription platform events.

use super::Render;
use crate::core::{Embed, EmbedFooter, OutputMessage, Source};
use crate::formatting::{format_date, format_event_type, format_money, yes_no};
use crate::sources::SubscriptionEvent;
use chrono::{DateTime, SecondsFormat, Utc};

const AVATAR_URL: &str = "https://avatars.githubusercontent.com/u/55606573";
const FOOTER: &str = "Adapty Subscription Management";

/// The fixed color palette, decimal RGB.
pub mod palette {
    pub const GREEN: u32 = 3_066_993;
    pub const BLUE: u32 = 3_447_003;
    pub const YELLOW: u32 = 16_776_960;
    pub const ORANGE: u32 = 15_105_570;
    pub const RED: u32 = 15_158_332;
    pub const PURPLE: u32 = 10_181_046;
    pub const TEAL: u32 = 1_752_220;
    pub const GRAY: u32 = 7_506_394;
}

/// Color for an event type. Unknown types are gray.
pub fn event_color(event_type: &str) -> u32 {
    use palette::*;
    match event_type {
        "subscription_started" => GREEN,
        "subscription_renewed" => BLUE,
        "subscription_renewal_cancelled" => ORANGE,
        "subscription_renewal_reactivated" => GREEN,
        "subscription_expired" => YELLOW,
        "subscription_canceled" => RED,
        "subscription_paused" => TEAL,
        "subscription_deferred" => PURPLE,
        "subscription_refunded" => RED,
        "trial_started" => PURPLE,
        "trial_converted" => GREEN,
        "trial_renewal_cancelled" => ORANGE,
        "trial_renewal_reactivated" => GREEN,
        "trial_expired" => RED,
        "non_subscription_purchase" => GREEN,
        "non_subscription_purchase_refunded" => RED,
        "billing_issue_detected" => ORANGE,
        "entered_grace_period" => YELLOW,
        "access_level_updated" => BLUE,
        "transaction_completed" => GREEN,
        "transaction_restored" => BLUE,
        "transaction_refunded" => RED,
        _ => GRAY,
    }
}

fn product_description(event_type: &str, product: &str) -> Option<String> {
    let text = match event_type {
        "subscription_started" => format!("A new subscription to **{}** has started.", product),
        "subscription_renewed" => format!("The subscription to **{}** has been renewed.", product),
        "subscription_renewal_cancelled" => {
            format!("Auto-renewal for **{}** has been turned off.", product)
        }
        "subscription_renewal_reactivated" => {
            format!("Auto-renewal for **{}** has been turned back on.", product)
        }
        "subscription_expired" => format!("The subscription to **{}** has expired.", product),
        "subscription_canceled" => format!("The subscription to **{}** has been canceled.", product),
        "subscription_paused" => format!("The subscription to **{}** has been paused.", product),
        "subscription_deferred" => {
            format!("The next charge for **{}** has been deferred.", product)
        }
        "subscription_refunded" => format!("The subscription to **{}** has been refunded.", product),
        "trial_started" => format!("A trial of **{}** has started.", product),
        "trial_converted" => format!("The trial of **{}** converted to a paid subscription.", product),
        "trial_renewal_cancelled" => {
            format!("The trial of **{}** will not convert to a paid subscription.", product)
        }
        "trial_renewal_reactivated" => {
            format!("The trial of **{}** will convert to a paid subscription again.", product)
        }
        "trial_expired" => format!("The trial of **{}** has expired.", product),
        "non_subscription_purchase" => format!("**{}** was purchased.", product),
        "non_subscription_purchase_refunded" => {
            format!("The purchase of **{}** has been refunded.", product)
        }
        "billing_issue_detected" => {
            format!("A billing issue was detected for **{}**.", product)
        }
        "entered_grace_period" => {
            format!("The subscription to **{}** entered its grace period.", product)
        }
        "transaction_completed" => format!("A transaction for **{}** completed.", product),
        "transaction_restored" => format!("A transaction for **{}** was restored.", product),
        "transaction_refunded" => format!("A transaction for **{}** was refunded.", product),
        _ => return None,
    };
    Some(text)
}

fn price_description(event_type: &str, price: &str) -> Option<String> {
    let text = match event_type {
        "subscription_started" => format!("A new subscription has started for {}.", price),
        "subscription_renewed" => format!("A subscription has been renewed for {}.", price),
        "trial_converted" => format!("A trial converted to a paid subscription for {}.", price),
        "non_subscription_purchase" | "transaction_completed" => {
            format!("A purchase of {} has been completed.", price)
        }
        "subscription_refunded"
        | "non_subscription_purchase_refunded"
        | "transaction_refunded" => format!("A refund of {} has been issued.", price),
        _ => return None,
    };
    Some(text)
}

fn generic_description(event_type: &str) -> Option<&'static str> {
    let text = match event_type {
        "subscription_started" => "A new subscription has been started.",
        "subscription_renewed" => "A subscription has been successfully renewed.",
        "subscription_renewal_cancelled" => "A subscription will not renew.",
        "subscription_renewal_reactivated" => "A subscription will renew again.",
        "subscription_expired" => "A subscription has expired.",
        "subscription_canceled" => "A subscription has been canceled.",
        "subscription_paused" => "A subscription has been paused.",
        "subscription_deferred" => "A subscription charge has been deferred.",
        "subscription_refunded" => "A subscription has been refunded.",
        "trial_started" => "A new trial period has started.",
        "trial_converted" => "A trial has been converted to a paid subscription.",
        "trial_renewal_cancelled" => "A trial will not convert to a paid subscription.",
        "trial_renewal_reactivated" => "A trial will convert to a paid subscription again.",
        "trial_expired" => "A trial period has expired.",
        "non_subscription_purchase" => "A one-time purchase has been made.",
        "non_subscription_purchase_refunded" => "A one-time purchase has been refunded.",
        "billing_issue_detected" => "A billing issue has been detected.",
        "entered_grace_period" => "A subscription has entered its grace period.",
        "access_level_updated" => "A user's access level has been updated.",
        "transaction_completed" => "A transaction has been completed successfully.",
        "transaction_restored" => "A transaction has been restored.",
        "transaction_refunded" => "A transaction has been refunded.",
        _ => return None,
    };
    Some(text)
}

/// Picks the most specific description the event supports.
pub fn describe(event: &SubscriptionEvent) -> String {
    let event_type = event.event_type.as_str();

    if let Some(text) = event
        .product_id
        .as_deref()
        .and_then(|product| product_description(event_type, product))
    {
        return text;
    }

    if let Some(text) = revenue_text(event)
        .as_deref()
        .and_then(|price| price_description(event_type, price))
    {
        return text;
    }

    if event_type == "access_level_updated" {
        if let Some(level) = &event.access_level {
            return format!("Access level changed to **{}**.", level);
        }
    }

    match generic_description(event_type) {
        Some(text) => text.to_string(),
        None => format!("Received event: {}", event_type),
    }
}

fn revenue_text(event: &SubscriptionEvent) -> Option<String> {
    let price = event.price.filter(|p| *p != 0.0)?;
    Some(format_money(price, event.currency.as_deref().unwrap_or_default()))
}

impl Render for SubscriptionEvent {
    fn render(&self, now: DateTime<Utc>) -> OutputMessage {
        let mut embed = Embed {
            title: format!("Adapty: {}", format_event_type(&self.event_type)),
            description: describe(self),
            color: event_color(&self.event_type),
            footer: Some(EmbedFooter {
                text: FOOTER.to_string(),
            }),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            ..Default::default()
        };

        let text_fields = [
            ("User", &self.customer_user_id),
            ("Email", &self.email),
            ("Profile ID", &self.profile_id),
            ("Transaction ID", &self.transaction_id),
            ("Product", &self.product_id),
            ("Base Plan", &self.base_plan_id),
            ("Store", &self.store),
            ("Status", &self.status),
        ];
        for (name, value) in text_fields {
            push_text(&mut embed, name, value);
        }

        if let Some(sandbox) = self.is_sandbox {
            embed.push_field("Environment", if sandbox { "Sandbox" } else { "Production" });
        }

        if let Some(revenue) = revenue_text(self) {
            let value = match self.proceeds.filter(|p| *p != 0.0) {
                Some(net) => format!(
                    "{} (net {})",
                    revenue,
                    format_money(net, self.currency.as_deref().unwrap_or_default())
                ),
                None => revenue,
            };
            embed.push_field("Revenue", value);
        }

        if let Some(access) = self.has_access {
            embed.push_field("Has Access", yes_no(access));
        }
        if let Some(renew) = self.will_renew {
            embed.push_field("Will Renew", yes_no(renew));
        }
        if self.is_restored == Some(true) {
            embed.push_field("Restored", "Yes");
        }

        let date_fields = [
            ("Purchased", &self.purchase_date),
            ("Expires", &self.expires_at),
            ("Paused At", &self.paused_at),
            ("Auto Resume", &self.auto_resume_at),
            ("Deferred Until", &self.deferred_expires_at),
        ];
        for (name, value) in date_fields {
            if let Some(raw) = value.as_deref().filter(|s| !s.is_empty()) {
                embed.push_field(name, format_date(raw));
            }
        }

        let trailing_fields = [
            ("Cancellation Reason", &self.cancellation_reason),
            ("Billing Error", &self.billing_error),
            ("Paywall", &self.paywall_name),
            ("A/B Test", &self.ab_test_name),
            ("Access Level", &self.access_level),
        ];
        for (name, value) in trailing_fields {
            push_text(&mut embed, name, value);
        }

        OutputMessage {
            username: Source::SUBSCRIPTIONS_SENDER.to_string(),
            avatar_url: AVATAR_URL.to_string(),
            content: None,
            embeds: vec![embed],
        }
    }
}

fn push_text(embed: &mut Embed, name: &str, value: &Option<String>) {
    if let Some(text) = value.as_deref().filter(|s| !s.trim().is_empty()) {
        embed.push_field(name, text);
    }
}
