//! hookrelay - relays monitoring alerts and subscription events to Discord.

use anyhow::Result;
use clap::Parser;
use hookrelay::{app::App, cli::Cli, config::Config, internal_metrics};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn configured(token: &Option<String>) -> &'static str {
    match token.as_deref() {
        Some(t) if !t.is_empty() => "Configured",
        _ => "Not configured",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Logging is not set up yet; use a plain subscriber for this one error.
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("error"))
            .with_writer(std::io::stderr)
            .init();
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("hookrelay starting up...");

    // Secrets are never logged, only whether they are present.
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Listen Address: {}", config.server.listen_addr);
    info!("Delivery Timeout: {}s", config.delivery.timeout_seconds);
    info!(
        "Monitoring Webhook: {}",
        if config.monitoring.webhook_url.is_empty() { "Not configured" } else { "Configured" }
    );
    info!("Monitoring Auth Token: {}", configured(&config.monitoring.auth_token));
    info!(
        "Subscriptions Webhook: {}",
        if config.subscriptions.webhook_url.is_empty() { "Not configured" } else { "Configured" }
    );
    info!("Subscriptions Auth Token: {}", configured(&config.subscriptions.auth_token));
    info!(
        "Metrics Endpoint: {}",
        if config.metrics.enabled { "Enabled" } else { "Disabled" }
    );
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut builder = App::builder(config.clone());
    if config.metrics.enabled {
        builder = builder.prometheus_handle(internal_metrics::install_prometheus()?);
    }

    let app = match builder.build(shutdown_rx).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {:#}", e);
            std::process::exit(1);
        }
    };

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received. Shutting down gracefully...");
        let _ = shutdown_tx.send(true);
    });

    app.run().await?;

    info!("Exiting.");
    Ok(())
}
