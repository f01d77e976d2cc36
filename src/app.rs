//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    notification::{DiscordClient, DiscordClientTrait},
    server::{self, AppState, WebhookServer},
};
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, instrument};

/// A handle to the running application.
pub struct App {
    server: WebhookServer,
    local_addr: SocketAddr,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the server actually bound, useful when the configured
    /// port is `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests until the shutdown signal is received and in-flight
    /// requests have drained.
    pub async fn run(self) -> Result<()> {
        info!(addr = %self.local_addr, "Listening for webhooks");
        self.server.run().await;
        info!("Server shut down.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates constructing the components from running them, and lets tests
/// swap the delivery client for a recording one.
pub struct AppBuilder {
    config: Config,
    delivery_override: Option<Arc<dyn DiscordClientTrait>>,
    prom_handle: Option<PrometheusHandle>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            delivery_override: None,
            prom_handle: None,
        }
    }

    /// Overrides the Discord client for testing.
    pub fn delivery_override(mut self, client: Arc<dyn DiscordClientTrait>) -> Self {
        self.delivery_override = Some(client);
        self
    }

    /// Serves `/metrics` from the given Prometheus handle.
    pub fn prometheus_handle(mut self, handle: PrometheusHandle) -> Self {
        self.prom_handle = Some(handle);
        self
    }

    /// Validates the configuration, binds the listener and wires the router,
    /// returning a runnable `App`.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        config.validate()?;

        let delivery: Arc<dyn DiscordClientTrait> = match self.delivery_override {
            Some(client) => client,
            None => Arc::new(DiscordClient::new(Duration::from_secs(
                config.delivery.timeout_seconds,
            ))?),
        };

        let listener = TcpListener::bind(&config.server.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
        let local_addr = listener.local_addr()?;

        let state = AppState {
            config: Arc::new(config),
            delivery,
        };
        let router = server::router(state, self.prom_handle);

        Ok(App {
            server: WebhookServer::new(listener, router, shutdown_rx),
            local_addr,
        })
    }
}
