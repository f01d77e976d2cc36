//! Subscription platform events.
//!
//! The platform has posted two shapes over time: an older one nesting
//! subscription and transaction objects under `data` with epoch dates, and a
//! flatter one carrying an `event_properties` bag with ISO-8601 dates. Both
//! are read into the canonical [`SubscriptionEvent`], either through a strict
//! typed decode ([`StrictSubscriptionEvent`]) or through lenient key-by-key
//! extraction from a JSON map ([`from_map`]).

use super::null_as_default;
use crate::formatting::format_epoch;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level keys that mark an object as a subscription platform payload.
pub const MARKER_KEYS: &[&str] = &[
    "event_type",
    "event_properties",
    "profile_id",
    "customer_user_id",
];

/// The canonical subscription event consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubscriptionEvent {
    pub event_type: String,

    pub customer_user_id: Option<String>,
    pub email: Option<String>,
    pub profile_id: Option<String>,
    pub transaction_id: Option<String>,
    pub product_id: Option<String>,
    pub base_plan_id: Option<String>,
    pub store: Option<String>,
    pub status: Option<String>,

    pub price: Option<f64>,
    pub currency: Option<String>,
    pub proceeds: Option<f64>,

    pub is_sandbox: Option<bool>,
    pub has_access: Option<bool>,
    pub will_renew: Option<bool>,
    pub is_restored: Option<bool>,

    pub purchase_date: Option<String>,
    pub expires_at: Option<String>,
    pub paused_at: Option<String>,
    pub auto_resume_at: Option<String>,
    pub deferred_expires_at: Option<String>,

    pub cancellation_reason: Option<String>,
    pub billing_error: Option<String>,
    pub paywall_name: Option<String>,
    pub ab_test_name: Option<String>,
    pub access_level: Option<String>,
}

impl SubscriptionEvent {
    /// An event that carries nothing but its type.
    pub fn minimal(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// Sets every field that is still unset from `other`. `event_type` is
    /// left alone.
    pub fn fill_missing(&mut self, other: SubscriptionEvent) {
        let SubscriptionEvent {
            event_type: _,
            customer_user_id,
            email,
            profile_id,
            transaction_id,
            product_id,
            base_plan_id,
            store,
            status,
            price,
            currency,
            proceeds,
            is_sandbox,
            has_access,
            will_renew,
            is_restored,
            purchase_date,
            expires_at,
            paused_at,
            auto_resume_at,
            deferred_expires_at,
            cancellation_reason,
            billing_error,
            paywall_name,
            ab_test_name,
            access_level,
        } = other;

        fill(&mut self.customer_user_id, customer_user_id);
        fill(&mut self.email, email);
        fill(&mut self.profile_id, profile_id);
        fill(&mut self.transaction_id, transaction_id);
        fill(&mut self.product_id, product_id);
        fill(&mut self.base_plan_id, base_plan_id);
        fill(&mut self.store, store);
        fill(&mut self.status, status);
        // Price, currency and proceeds travel together.
        if self.price.is_none() {
            self.price = price;
            self.currency = currency;
            self.proceeds = proceeds;
        }
        fill(&mut self.is_sandbox, is_sandbox);
        fill(&mut self.has_access, has_access);
        fill(&mut self.will_renew, will_renew);
        fill(&mut self.is_restored, is_restored);
        fill(&mut self.purchase_date, purchase_date);
        fill(&mut self.expires_at, expires_at);
        fill(&mut self.paused_at, paused_at);
        fill(&mut self.auto_resume_at, auto_resume_at);
        fill(&mut self.deferred_expires_at, deferred_expires_at);
        fill(&mut self.cancellation_reason, cancellation_reason);
        fill(&mut self.billing_error, billing_error);
        fill(&mut self.paywall_name, paywall_name);
        fill(&mut self.ab_test_name, ab_test_name);
        fill(&mut self.access_level, access_level);
    }
}

// =============================================================================
// Strict typed form
// =============================================================================

/// Strictly typed decode of a subscription event. Unknown keys are ignored
/// and `null` reads as absent, but every recognized key must otherwise carry
/// the expected JSON type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StrictSubscriptionEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
    pub profile_id: Option<String>,
    pub customer_user_id: Option<String>,
    pub email: Option<String>,
    pub data: Option<EventData>,
    pub event_properties: Option<EventProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EventData {
    #[serde(deserialize_with = "null_as_default")]
    pub profile_id: String,
    pub customer_user_id: Option<String>,
    pub subscription: Option<SubscriptionInfo>,
    pub transaction: Option<TransactionInfo>,
    pub product: Option<ProductInfo>,
    pub new_status: Option<String>,
    pub previous_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SubscriptionInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub store: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub expires_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub canceled_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub started_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub renewed_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_sandbox: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TransactionInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub offer_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub product_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub purchased_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_restored: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub value: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub store: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_sandbox: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ProductInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub vendor_product_id: String,
    pub base_plan_id: Option<String>,
}

/// The flat property bag of the newer payload shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EventProperties {
    pub store: Option<String>,
    pub environment: Option<String>,
    pub vendor_product_id: Option<String>,
    pub base_plan_id: Option<String>,
    pub vendor_transaction_id: Option<String>,
    pub transaction_id: Option<String>,
    pub price_usd: Option<f64>,
    pub proceeds_usd: Option<f64>,
    pub net_revenue_usd: Option<f64>,
    pub price_local: Option<f64>,
    pub currency: Option<String>,
    pub profile_has_access_level: Option<bool>,
    pub will_renew: Option<bool>,
    pub is_sandbox: Option<bool>,
    pub is_restored: Option<bool>,
    pub purchase_date: Option<String>,
    pub subscription_expires_at: Option<String>,
    pub pause_start_date: Option<String>,
    pub auto_resume_date: Option<String>,
    pub deferred_expiration_date: Option<String>,
    pub cancellation_reason: Option<String>,
    pub billing_error: Option<String>,
    pub paywall_name: Option<String>,
    pub ab_test_name: Option<String>,
    pub access_level_id: Option<String>,
}

impl StrictSubscriptionEvent {
    /// The effective event type: `event_type`, falling back to `event`.
    pub fn effective_type(&self) -> &str {
        if self.event_type.is_empty() {
            &self.event
        } else {
            &self.event_type
        }
    }
}

/// Attempts a strict typed decode. Accepts only if `event` or `event_type`
/// is non-empty.
pub fn match_strict(value: &Value) -> Option<StrictSubscriptionEvent> {
    if !value.is_object() {
        return None;
    }
    let event = StrictSubscriptionEvent::deserialize(value).ok()?;
    if event.effective_type().is_empty() {
        return None;
    }
    Some(event)
}

impl From<StrictSubscriptionEvent> for SubscriptionEvent {
    fn from(strict: StrictSubscriptionEvent) -> Self {
        let mut event = SubscriptionEvent::minimal(strict.effective_type());
        event.profile_id = non_empty(strict.profile_id);
        event.customer_user_id = non_empty(strict.customer_user_id);
        event.email = non_empty(strict.email);

        if let Some(data) = strict.data {
            apply_event_data(&mut event, data);
        }
        if let Some(props) = strict.event_properties {
            apply_event_properties(&mut event, props);
        }
        event
    }
}

/// Builds the canonical event from a strict decode, then fills whatever the
/// typed form left unset from a lenient read of the same object, so both
/// readings see the same keys.
pub fn from_strict(strict: StrictSubscriptionEvent, raw: &Map<String, Value>) -> SubscriptionEvent {
    let mut event = SubscriptionEvent::from(strict);
    event.fill_missing(from_map(raw));
    event
}

fn apply_event_data(event: &mut SubscriptionEvent, data: EventData) {
    event.profile_id = event.profile_id.take().or_else(|| non_empty(Some(data.profile_id)));
    event.customer_user_id = event
        .customer_user_id
        .take()
        .or_else(|| non_empty(data.customer_user_id));
    event.status = non_empty(data.new_status);

    if let Some(sub) = data.subscription {
        event.product_id = non_empty(Some(sub.product_id));
        event.store = non_empty(Some(sub.store));
        event.status = non_empty(Some(sub.status)).or(event.status.take());
        event.is_sandbox = Some(sub.is_sandbox);
        event.purchase_date = format_epoch(sub.started_at);
        event.expires_at = format_epoch(sub.expires_at);
    }

    if let Some(tx) = data.transaction {
        event.transaction_id = non_empty(Some(tx.id));
        event.product_id = event.product_id.take().or_else(|| non_empty(Some(tx.product_id)));
        event.store = event.store.take().or_else(|| non_empty(Some(tx.store)));
        if tx.value > 0.0 {
            event.price = Some(tx.value);
            event.currency = non_empty(Some(tx.currency));
        }
        // A sandbox transaction wins over a production subscription flag.
        event.is_sandbox = match event.is_sandbox {
            Some(true) => Some(true),
            _ => Some(tx.is_sandbox),
        };
        if tx.is_restored {
            event.is_restored = Some(true);
        }
        event.purchase_date = format_epoch(tx.purchased_at).or(event.purchase_date.take());
    }

    if let Some(product) = data.product {
        event.product_id = event
            .product_id
            .take()
            .or_else(|| non_empty(Some(product.vendor_product_id)));
        event.base_plan_id = non_empty(product.base_plan_id);
    }
}

fn apply_event_properties(event: &mut SubscriptionEvent, props: EventProperties) {
    fn prefer<T>(new: Option<T>, old: &mut Option<T>) -> Option<T> {
        new.or_else(|| old.take())
    }

    event.store = prefer(non_empty(props.store), &mut event.store);
    event.product_id = prefer(non_empty(props.vendor_product_id), &mut event.product_id);
    event.base_plan_id = prefer(non_empty(props.base_plan_id), &mut event.base_plan_id);
    event.transaction_id = prefer(
        non_empty(props.vendor_transaction_id).or_else(|| non_empty(props.transaction_id)),
        &mut event.transaction_id,
    );

    if let Some(usd) = props.price_usd {
        event.price = Some(usd);
        event.currency = Some("USD".to_string());
        event.proceeds = props.proceeds_usd.or(props.net_revenue_usd);
    } else if let Some(local) = props.price_local {
        event.price = Some(local);
        event.currency = prefer(non_empty(props.currency), &mut event.currency);
    }

    let environment_sandbox = props
        .environment
        .as_deref()
        .map(|env| env.eq_ignore_ascii_case("sandbox"));
    event.is_sandbox = prefer(props.is_sandbox.or(environment_sandbox), &mut event.is_sandbox);
    event.has_access = props.profile_has_access_level;
    event.will_renew = props.will_renew;
    event.is_restored = prefer(props.is_restored, &mut event.is_restored);

    event.purchase_date = prefer(non_empty(props.purchase_date), &mut event.purchase_date);
    event.expires_at = prefer(non_empty(props.subscription_expires_at), &mut event.expires_at);
    event.paused_at = non_empty(props.pause_start_date);
    event.auto_resume_at = non_empty(props.auto_resume_date);
    event.deferred_expires_at = non_empty(props.deferred_expiration_date);

    event.cancellation_reason = non_empty(props.cancellation_reason);
    event.billing_error = non_empty(props.billing_error);
    event.paywall_name = non_empty(props.paywall_name);
    event.ab_test_name = non_empty(props.ab_test_name);
    event.access_level = non_empty(props.access_level_id);
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// =============================================================================
// Loose map form
// =============================================================================

/// Returns the object if it carries at least one subscription marker key.
pub fn match_map(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    MARKER_KEYS
        .iter()
        .any(|key| map.contains_key(*key))
        .then_some(map)
}

/// Builds a canonical event from a loosely shaped JSON object.
///
/// Values are looked up in `event_properties` first, then at the top level,
/// then in the nested `data` object. Numbers may be encoded as strings and
/// booleans as `"true"`/`"false"`.
pub fn from_map(map: &Map<String, Value>) -> SubscriptionEvent {
    let mut event = from_flat_map(map);
    if let Some(data) = map.get("data").and_then(Value::as_object) {
        fill_from_data(&mut event, data);
    }
    event
}

fn from_flat_map(map: &Map<String, Value>) -> SubscriptionEvent {
    let lookup = Lookup {
        props: map.get("event_properties").and_then(Value::as_object),
        top: map,
    };

    let event_type = lookup
        .string("event_type")
        .or_else(|| lookup.string("event"))
        .unwrap_or_default();

    let (price, currency, proceeds) = match lookup.number("price_usd") {
        Some(usd) => (
            Some(usd),
            Some("USD".to_string()),
            lookup.number("proceeds_usd").or_else(|| lookup.number("net_revenue_usd")),
        ),
        None => (
            lookup.number("price_local").or_else(|| lookup.number("price")),
            lookup.string("currency"),
            lookup.number("proceeds"),
        ),
    };

    let is_sandbox = lookup.boolean("is_sandbox").or_else(|| {
        lookup
            .string("environment")
            .map(|env| env.eq_ignore_ascii_case("sandbox"))
    });

    SubscriptionEvent {
        event_type,
        customer_user_id: lookup.string("customer_user_id"),
        email: lookup.string("email"),
        profile_id: lookup.string("profile_id"),
        transaction_id: lookup
            .string("vendor_transaction_id")
            .or_else(|| lookup.string("transaction_id")),
        product_id: lookup
            .string("vendor_product_id")
            .or_else(|| lookup.string("product_id")),
        base_plan_id: lookup.string("base_plan_id"),
        store: lookup.string("store"),
        status: lookup.string("status"),
        price,
        currency,
        proceeds,
        is_sandbox,
        has_access: lookup.boolean("profile_has_access_level"),
        will_renew: lookup.boolean("will_renew"),
        is_restored: lookup.boolean("is_restored"),
        purchase_date: lookup.string("purchase_date"),
        expires_at: lookup.string("subscription_expires_at"),
        paused_at: lookup.string("pause_start_date"),
        auto_resume_at: lookup.string("auto_resume_date"),
        deferred_expires_at: lookup.string("deferred_expiration_date"),
        cancellation_reason: lookup.string("cancellation_reason"),
        billing_error: lookup.string("billing_error"),
        paywall_name: lookup.string("paywall_name"),
        ab_test_name: lookup.string("ab_test_name"),
        access_level: lookup
            .string("access_level_id")
            .or_else(|| lookup.string("access_level")),
    }
}

/// Lenient read of the nested `data` form. Only fills what is still unset.
fn fill_from_data(event: &mut SubscriptionEvent, data: &Map<String, Value>) {
    let nested = |key: &str| data.get(key).and_then(Value::as_object).map(Lookup::flat);

    let top = Lookup::flat(data);
    let subscription = nested("subscription");
    let transaction = nested("transaction");
    let product = nested("product");

    fill(&mut event.profile_id, top.string("profile_id"));
    fill(&mut event.customer_user_id, top.string("customer_user_id"));

    if let Some(sub) = &subscription {
        fill(&mut event.product_id, sub.string("product_id"));
        fill(&mut event.store, sub.string("store"));
        fill(&mut event.status, sub.string("status"));
        fill(&mut event.expires_at, sub.date("expires_at"));
    }
    fill(&mut event.status, top.string("new_status"));

    if let Some(tx) = &transaction {
        fill(&mut event.transaction_id, tx.string("id"));
        fill(&mut event.product_id, tx.string("product_id"));
        fill(&mut event.store, tx.string("store"));
        if event.price.is_none() {
            if let Some(value) = tx.number("value").filter(|v| *v > 0.0) {
                event.price = Some(value);
                event.currency = tx.string("currency");
            }
        }
        if tx.boolean("is_restored") == Some(true) {
            fill(&mut event.is_restored, Some(true));
        }
        fill(&mut event.purchase_date, tx.date("purchased_at"));
    }
    if let Some(sub) = &subscription {
        fill(&mut event.purchase_date, sub.date("started_at"));
    }

    // A sandbox transaction wins over a production subscription flag.
    let sandbox_flags = [&subscription, &transaction]
        .into_iter()
        .flatten()
        .filter_map(|lookup| lookup.boolean("is_sandbox"));
    fill(&mut event.is_sandbox, sandbox_flags.reduce(|a, b| a || b));

    if let Some(product) = &product {
        fill(&mut event.product_id, product.string("vendor_product_id"));
        fill(&mut event.base_plan_id, product.string("base_plan_id"));
    }
}

struct Lookup<'a> {
    props: Option<&'a Map<String, Value>>,
    top: &'a Map<String, Value>,
}

impl<'a> Lookup<'a> {
    fn flat(map: &'a Map<String, Value>) -> Self {
        Self {
            props: None,
            top: map,
        }
    }

    /// Epoch seconds (a number or a numeric string) become RFC 3339. Other
    /// strings pass through unchanged.
    fn date(&self, key: &str) -> Option<String> {
        match self.number(key) {
            Some(secs) => format_epoch(secs as i64),
            None => self.string(key),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.props
            .and_then(|props| props.get(key))
            .filter(|v| !v.is_null())
            .or_else(|| self.top.get(key).filter(|v| !v.is_null()))
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }
}

/// Reads a top-level string `event` field for the best-effort fallback.
pub fn match_bare_event(value: &Value) -> Option<SubscriptionEvent> {
    value
        .get("event")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(SubscriptionEvent::minimal)
}
