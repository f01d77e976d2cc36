// src/formatting.rs

//! Small, pure helpers that turn raw payload values into text a human reads
//! in a chat channel. None of them fail: unparseable input degrades to
//! something printable.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

/// Layout used by the subscription platform: microseconds and a numeric
/// offset without a colon, e.g. `2024-01-15T10:30:00.000000+0000`.
const MICROS_OFFSET_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Output layout for human-readable dates.
const HUMAN_LAYOUT: &str = "%b %-d, %Y %H:%M UTC";

/// Formats an ISO-8601 timestamp as `"Mon D, YYYY HH:MM UTC"`.
///
/// Returns the input unchanged if no known layout matches.
pub fn format_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format(HUMAN_LAYOUT).to_string(),
        None => raw.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, MICROS_OFFSET_LAYOUT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Converts epoch seconds to an RFC 3339 UTC timestamp.
///
/// Zero and negative values mean "absent" on the wire and yield `None`.
pub fn format_epoch(secs: i64) -> Option<String> {
    epoch_to_datetime(secs).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub(crate) fn epoch_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

/// Maps an `event_type` token to a title-cased label.
pub fn format_event_type(event_type: &str) -> String {
    let known = match event_type {
        "subscription_started" => "Subscription Started",
        "subscription_renewed" => "Subscription Renewed",
        "subscription_renewal_cancelled" => "Subscription Renewal Cancelled",
        "subscription_renewal_reactivated" => "Subscription Renewal Reactivated",
        "subscription_expired" => "Subscription Expired",
        "subscription_canceled" => "Subscription Canceled",
        "subscription_paused" => "Subscription Paused",
        "subscription_deferred" => "Subscription Deferred",
        "subscription_refunded" => "Subscription Refunded",
        "trial_started" => "Trial Started",
        "trial_converted" => "Trial Converted",
        "trial_renewal_cancelled" => "Trial Renewal Cancelled",
        "trial_renewal_reactivated" => "Trial Renewal Reactivated",
        "trial_expired" => "Trial Expired",
        "non_subscription_purchase" => "One-Time Purchase",
        "non_subscription_purchase_refunded" => "One-Time Purchase Refunded",
        "billing_issue_detected" => "Billing Issue Detected",
        "entered_grace_period" => "Entered Grace Period",
        "access_level_updated" => "Access Level Updated",
        "transaction_completed" => "Transaction Completed",
        "transaction_restored" => "Transaction Restored",
        "transaction_refunded" => "Transaction Refunded",
        _ => return title_case(event_type),
    };
    known.to_string()
}

fn title_case(token: &str) -> String {
    token
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Describes the time between `start` and `end` as a relative phrase, e.g.
/// `"1 hour"` or `"3 days"`. The order of the arguments does not matter.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let diff = if end >= start { end - start } else { start - end };
    humanize(diff)
}

fn humanize(diff: Duration) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 12 * MONTH;
    const LONG_TIME: i64 = 37 * YEAR;

    let secs = diff.num_seconds();
    let plural = |n: i64, unit: &str| format!("{} {}s", n, unit);

    match secs {
        s if s < 1 => "now".to_string(),
        s if s < 2 => "1 second".to_string(),
        s if s < MINUTE => plural(s, "second"),
        s if s < 2 * MINUTE => "1 minute".to_string(),
        s if s < HOUR => plural(s / MINUTE, "minute"),
        s if s < 2 * HOUR => "1 hour".to_string(),
        s if s < DAY => plural(s / HOUR, "hour"),
        s if s < 2 * DAY => "1 day".to_string(),
        s if s < WEEK => plural(s / DAY, "day"),
        s if s < 2 * WEEK => "1 week".to_string(),
        s if s < MONTH => plural(s / WEEK, "week"),
        s if s < 2 * MONTH => "1 month".to_string(),
        s if s < YEAR => plural(s / MONTH, "month"),
        s if s < 18 * MONTH => "1 year".to_string(),
        s if s < 2 * YEAR => "2 years".to_string(),
        s if s < LONG_TIME => plural(s / YEAR, "year"),
        _ => "a long while".to_string(),
    }
}

/// Formats a monetary amount with two decimals, e.g. `"9.99 USD"`.
pub fn format_money(amount: f64, currency: &str) -> String {
    let currency = currency.trim();
    if currency.is_empty() {
        format!("{:.2}", amount)
    } else {
        format!("{:.2} {}", amount, currency)
    }
}

/// Renders a boolean as `Yes`/`No`.
pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}
