//! Configuration management for hookrelay
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an optional
//! `hookrelay.toml` file, environment variables and command-line flags.
//!
//! Besides the prefixed `HOOKRELAY_*` variables, the unprefixed variable
//! names used by existing deployments (`GCP_DISCORD_WEBHOOK_URL` and
//! friends) are honoured.

use crate::cli::Cli;
use crate::core::Source;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file, read if present.
pub const DEFAULT_CONFIG_FILE: &str = "hookrelay.toml";

/// Deployment variables and the config keys they map onto.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("GCP_DISCORD_WEBHOOK_URL", "monitoring.webhook_url"),
    ("GCP_AUTH_TOKEN", "monitoring.auth_token"),
    ("ADAPTY_DISCORD_WEBHOOK_URL", "subscriptions.webhook_url"),
    ("ADAPTY_AUTH_TOKEN", "subscriptions.auth_token"),
];

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Outbound delivery settings.
    pub delivery: DeliveryConfig,
    /// Delivery target and credentials for monitoring incidents.
    pub monitoring: SourceConfig,
    /// Delivery target and credentials for subscription events.
    pub subscriptions: SourceConfig,
    /// Prometheus metrics settings.
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub listen_addr: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeliveryConfig {
    /// Timeout for a single webhook POST, in seconds.
    pub timeout_seconds: u64,
}

/// Per-source settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SourceConfig {
    /// The Discord webhook URL messages from this source are posted to.
    #[serde(default)]
    pub webhook_url: String,
    /// Shared secret the source presents. Unset means the source cannot
    /// authenticate.
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics on `/metrics`.
    pub enabled: bool,
}

impl Config {
    /// Loads the configuration, layering defaults, the TOML file, the
    /// environment and finally the command-line flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found at specified path: {}", path.display());
                }
                path.clone()
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config: Config = Self::figment(config_path)
            .merge(cli)
            .extract()
            .context("Failed to extract configuration")?;
        Ok(config)
    }

    /// The provider stack without command-line flags.
    pub fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(legacy_env())
            // e.g. HOOKRELAY_SERVER__LISTEN_ADDR=127.0.0.1:9000
            .merge(Env::prefixed("HOOKRELAY_").split("__"))
    }

    /// Checks the settings the service cannot run without.
    pub fn validate(&self) -> Result<()> {
        for (source, settings) in [
            (Source::Monitoring, &self.monitoring),
            (Source::Subscriptions, &self.subscriptions),
        ] {
            if settings.webhook_url.trim().is_empty() {
                bail!("No webhook URL configured for {}", source);
            }
            let url = reqwest::Url::parse(&settings.webhook_url)
                .with_context(|| format!("Invalid webhook URL configured for {}", source))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Webhook URL for {} must be http(s), got {}", source, url.scheme());
            }
        }
        if self.delivery.timeout_seconds == 0 {
            bail!("delivery.timeout_seconds must be greater than zero");
        }
        Ok(())
    }

    /// Settings for a given source.
    pub fn source(&self, source: Source) -> &SourceConfig {
        match source {
            Source::Monitoring => &self.monitoring,
            Source::Subscriptions => &self.subscriptions,
        }
    }
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, mapped)| *mapped)
            .unwrap_or("unmapped")
            .into()
    })
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig {
                listen_addr: "0.0.0.0:8080".to_string(),
            },
            delivery: DeliveryConfig { timeout_seconds: 10 },
            monitoring: SourceConfig::default(),
            subscriptions: SourceConfig::default(),
            metrics: MetricsConfig { enabled: false },
        }
    }
}
