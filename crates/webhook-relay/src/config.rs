//! Process configuration
//!
//! Read once from the environment at startup:
//!
//! | Variable              | Meaning                              | Default                 |
//! |-----------------------|--------------------------------------|-------------------------|
//! | `BP_URL`              | Alert sink ingestion endpoint        | production alerts API   |
//! | `BP_TOKEN`            | Bearer token for the sink            | required                |
//! | `BP_APP_KEY`          | Sink application key                 | required                |
//! | `BP_TIMEOUT_SECS`     | Delivery timeout                     | 30                      |
//! | `BP_STRICT_DELIVERY`  | Answer 502 when delivery fails       | false                   |
//! | `CIQ_WEBHOOK_SECRET`  | Enables webhook signature checks     | unset                   |
//! | `PORT` / `BIND_HOST`  | Listen address                       | 8080 / 0.0.0.0          |

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use alert_forwarder::{ForwarderConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use ::config::{Config, Environment};
use serde::Deserialize;
use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Missing required setting {0}")]
    Missing(&'static str),
}

/// Relay settings
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Alert sink ingestion endpoint
    pub url: String,
    /// Bearer token for the sink API
    #[serde(default)]
    pub token: String,
    /// Sink application key
    #[serde(default)]
    pub app_key: String,
    /// Delivery timeout in seconds
    pub timeout_secs: u64,
    /// Surface delivery failures to the webhook caller as 502
    pub strict_delivery: bool,
    /// Shared secret for webhook signatures
    #[serde(default)]
    pub webhook_secret: Option<String>,
    pub bind_host: String,
    pub port: u16,
}

impl Settings {
    /// Load settings from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Load settings from an explicit set of environment variables
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = vars.get("PORT").cloned();
        let bind_host = vars.get("BIND_HOST").cloned();

        let settings: Settings = Config::builder()
            .set_default("url", DEFAULT_ENDPOINT)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("strict_delivery", false)?
            .set_default("bind_host", "0.0.0.0")?
            .set_default("port", 8080)?
            .add_source(Environment::with_prefix("BP").source(Some(vars.clone())))
            .add_source(Environment::with_prefix("CIQ").source(Some(vars)))
            .set_override_option("port", port)?
            .set_override_option("bind_host", bind_host)?
            .build()?
            .try_deserialize()?;

        settings.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::Missing("BP_TOKEN"));
        }
        if self.app_key.is_empty() {
            return Err(ConfigError::Missing("BP_APP_KEY"));
        }
        if self.url.is_empty() {
            self.url = DEFAULT_ENDPOINT.to_string();
        }
        if self.webhook_secret.as_deref().is_some_and(str::is_empty) {
            self.webhook_secret = None;
        }
        Ok(self)
    }

    /// Address to listen on
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Forwarder settings derived from this configuration
    pub fn forwarder_config(&self) -> ForwarderConfig {
        ForwarderConfig {
            endpoint: self.url.clone(),
            token: self.token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("app_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("strict_delivery", &self.strict_delivery)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .finish()
    }
}
