//! # Webhook Server
//!
//! The `axum` HTTP boundary around the classification pipeline. It checks
//! the request method and content type, authenticates the caller, answers
//! verification requests, runs the dispatcher, and forwards the rendered
//! message to the delivery target configured for its source.
//!
//! The server shuts down gracefully when the watch channel it was given
//! flips to `true`, letting in-flight requests finish.

use crate::config::Config;
use crate::core::Source;
use crate::dispatch;
use crate::internal_metrics::record_request;
use crate::notification::DiscordClientTrait;
use crate::sources::PayloadError;
use crate::verification;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub delivery: Arc<dyn DiscordClientTrait>,
}

/// Builds the router. `/metrics` is only mounted when a Prometheus handle
/// is supplied.
pub fn router(state: AppState, prom_handle: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .route("/", any(handle_webhook))
        .route("/healthz", get(|| async { "ok" }));

    if let Some(handle) = prom_handle {
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router.with_state(state)
}

/// A server that accepts webhook notifications.
pub struct WebhookServer {
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
}

impl WebhookServer {
    /// Creates a new `WebhookServer` but does not spawn it.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound to an address.
    /// * `router` - The fully configured router, see [`router`].
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(listener: TcpListener, router: Router, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            listener,
            router,
            shutdown_rx,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a future that runs the server until a shutdown signal is received.
    pub fn run(self) -> impl Future<Output = ()> {
        let mut shutdown_rx = self.shutdown_rx;
        let shutdown = async move {
            // A dropped sender also ends the wait.
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
            debug!("Webhook server received shutdown signal.");
        };

        async move {
            let result = axum::serve(self.listener, self.router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await;
            if let Err(e) = result {
                error!("Webhook server error: {}", e);
            }
            debug!("Webhook server task finished.");
        }
    }
}

fn plain(status: StatusCode, text: &'static str) -> Response {
    (status, text).into_response()
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

fn token_matches(expected: Option<&str>, received: Option<&str>) -> bool {
    match (expected, received) {
        (Some(expected), Some(received)) if !expected.is_empty() => expected == received,
        _ => false,
    }
}

/// The subscription platform authenticates with the `Authorization` header,
/// the monitoring channel with an `auth_token` query parameter.
fn is_authenticated(config: &Config, headers: &HeaderMap, params: &HashMap<String, String>) -> bool {
    let header_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if token_matches(config.subscriptions.auth_token.as_deref(), header_token) {
        debug!("Authenticated via Authorization header");
        return true;
    }

    let query_token = params.get("auth_token").map(String::as_str);
    if token_matches(config.monitoring.auth_token.as_deref(), query_token) {
        debug!("Authenticated via auth_token query parameter");
        return true;
    }

    false
}

#[instrument(skip_all, fields(method = %method))]
async fn handle_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    if method != Method::POST || !is_json_content_type(&headers) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        warn!(content_type, "Invalid method / content-type");
        record_request("invalid_request");
        return plain(StatusCode::BAD_REQUEST, "invalid request");
    }

    if !is_authenticated(&state.config, &headers, &params) {
        warn!("Authentication failed");
        record_request("unauthorized");
        return plain(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            let err = PayloadError::from(e);
            warn!(error = %err, "Error processing payload");
            record_request("malformed");
            return plain(StatusCode::BAD_REQUEST, "invalid payload format");
        }
    };

    if let Some(reply) = verification::verify(&payload) {
        info!(?reply, "Answered verification request");
        record_request("verification");
        return (StatusCode::OK, Json(reply.to_json())).into_response();
    }

    let message = match dispatch::process_value(&payload, Utc::now()) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Error processing payload");
            record_request("unrecognized");
            return plain(StatusCode::BAD_REQUEST, "invalid payload format");
        }
    };

    let Some(source) = Source::from_sender(&message.username) else {
        error!(username = %message.username, "Unrecognized webhook username");
        record_request("unroutable");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let webhook_url = &state.config.source(source).webhook_url;
    debug!(%source, "Delivering notification");
    if let Err(e) = state.delivery.send(webhook_url, &message).await {
        error!(%source, error = %e, "Error posting to Discord");
        metrics::counter!("delivery_failures_total", "source" => source.as_str()).increment(1);
        record_request("delivery_failed");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    metrics::counter!("notifications_delivered_total", "source" => source.as_str()).increment(1);
    record_request("delivered");
    (StatusCode::OK, Json(message)).into_response()
}
