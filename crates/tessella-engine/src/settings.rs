//! Engine configuration: outbound timeouts, SMTP parameters, and the
//! automation chain budget.

use serde::Deserialize;
use std::time::Duration;

/// SMTP delivery parameters for the email adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "noreply@tessella.local".to_string(),
        }
    }
}

/// Tunables for automation dispatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Bound on a single webhook call.
    pub webhook_timeout_secs: u64,
    /// Bound on a single email hand-off.
    pub email_timeout_secs: u64,
    /// Maximum depth of update_field automation chains; the same-value guard
    /// stops direct loops, this budget stops longer cycles.
    pub max_chain_depth: u32,
    pub smtp: SmtpSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            webhook_timeout_secs: 30,
            email_timeout_secs: 30,
            max_chain_depth: 5,
            smtp: SmtpSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Loads settings from an optional `tessella.toml` plus `TESSELLA_*`
    /// environment overrides (e.g. `TESSELLA_WEBHOOK_TIMEOUT_SECS=10`,
    /// `TESSELLA_SMTP__HOST=smtp.example.com`).
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("tessella").required(false))
            .add_source(config::Environment::with_prefix("TESSELLA").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    pub fn email_timeout(&self) -> Duration {
        Duration::from_secs(self.email_timeout_secs)
    }
}
