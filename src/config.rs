//! Service configuration
//!
//! Everything the service needs from its deployment is extracted once at
//! startup into an [`AppConfig`] and handed to the components that need it.
//! Nothing below the binary entry point reads the environment.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use figment::error::Kind;
use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_REFERENCE_LENGTH: usize = 6;
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
pub const DEFAULT_IDENTITY_LOOKUP_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// Environment variables and the config key each one lands on.
const ENV_KEYS: [(&str, &str); 13] = [
    ("PAYMENT_GATEWAY_URL", "gateway.submit_url"),
    ("PAYMENT_STATUS_URL", "gateway.status_base_url"),
    ("PAYMENT_CLIENT_ID", "gateway.client_id"),
    ("PAYMENT_CLIENT_SECRET", "gateway.client_secret"),
    ("PAYMENT_WALLET", "gateway.wallet"),
    ("PAYMENT_PORTFOLIO", "gateway.portfolio"),
    ("PAYMENT_DISBURSEMENT", "gateway.disbursement"),
    ("PAYMENT_POLL_MAX_ATTEMPTS", "polling.max_attempts"),
    ("PAYMENT_POLL_DELAY_MS", "polling.delay_ms"),
    ("PAYMENT_REFERENCE_LENGTH", "reference_length"),
    ("IDENTITY_LOOKUP_URL", "identity.lookup_url"),
    ("IDENTITY_API_KEY", "identity.api_key"),
    ("BIND_ADDR", "bind_addr"),
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        let mut path = e.path.join(".");
        if let Kind::MissingField(field) = &e.kind {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(field);
            return ConfigError::Missing(env_name(&path));
        }
        ConfigError::Invalid {
            name: env_name(&path),
            reason: e.kind.to_string(),
        }
    }
}

/// Environment variable behind a config key. A section name resolves to its
/// first variable and a bare field name to the variable ending in it.
fn env_name(path: &str) -> &'static str {
    ENV_KEYS
        .iter()
        .find(|(_, key)| *key == path)
        .or_else(|| {
            ENV_KEYS
                .iter()
                .find(|(_, key)| key.strip_prefix(path).is_some_and(|rest| rest.starts_with('.')))
        })
        .or_else(|| {
            ENV_KEYS
                .iter()
                .find(|(_, key)| key.rsplit('.').next() == Some(path))
        })
        .map(|(name, _)| *name)
        .unwrap_or("configuration")
}

/// Credentials and endpoints of the mobile-money gateway.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    pub submit_url: String,
    /// Base URL of the status endpoint; the transaction id is appended verbatim.
    pub status_base_url: String,
    #[serde(deserialize_with = "text")]
    pub client_id: String,
    #[serde(deserialize_with = "text")]
    pub client_secret: String,
    #[serde(deserialize_with = "text")]
    pub wallet: String,
    /// Sent as `portefeuille` in the debit payload.
    #[serde(deserialize_with = "text")]
    pub portfolio: String,
    #[serde(deserialize_with = "text")]
    pub disbursement: String,
}

impl GatewayConfig {
    pub fn status_url(&self, transaction_id: &str) -> String {
        format!("{}{}", self.status_base_url, transaction_id)
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("submit_url", &self.submit_url)
            .field("status_base_url", &self.status_base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("wallet", &self.wallet)
            .field("portfolio", &self.portfolio)
            .field("disbursement", &self.disbursement)
            .finish()
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_poll_delay() -> Duration {
    DEFAULT_POLL_DELAY
}

fn default_reference_length() -> usize {
    DEFAULT_REFERENCE_LENGTH
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
}

fn default_lookup_url() -> String {
    DEFAULT_IDENTITY_LOOKUP_URL.to_string()
}

/// Fixed-interval polling contract for the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(
        rename = "delay_ms",
        default = "default_poll_delay",
        deserialize_with = "millis"
    )]
    pub delay: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_POLL_DELAY,
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
    #[serde(deserialize_with = "text")]
    pub api_key: String,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("lookup_url", &self.lookup_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default = "default_reference_length")]
    pub reference_length: usize,
    pub identity: IdentityConfig,
}

impl AppConfig {
    /// Environment variables mapped onto the nested config keys.
    pub fn figment() -> Figment {
        let names: Vec<&str> = ENV_KEYS.iter().map(|(name, _)| *name).collect();
        Figment::new().merge(Env::raw().only(&names).map(|name| {
            ENV_KEYS
                .iter()
                .find(|(env, _)| name.as_str().eq_ignore_ascii_case(env))
                .map(|(_, key)| (*key).into())
                .unwrap_or_else(|| name.as_str().to_string().into())
        }))
    }

    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("PAYMENT_GATEWAY_URL", &self.gateway.submit_url),
            ("PAYMENT_STATUS_URL", &self.gateway.status_base_url),
            ("PAYMENT_CLIENT_ID", &self.gateway.client_id),
            ("PAYMENT_CLIENT_SECRET", &self.gateway.client_secret),
            ("PAYMENT_WALLET", &self.gateway.wallet),
            ("PAYMENT_PORTFOLIO", &self.gateway.portfolio),
            ("PAYMENT_DISBURSEMENT", &self.gateway.disbursement),
            ("IDENTITY_API_KEY", &self.identity.api_key),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Missing(*name));
        }
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "PAYMENT_POLL_MAX_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.reference_length == 0 {
            return Err(ConfigError::Invalid {
                name: "PAYMENT_REFERENCE_LENGTH",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Env values that look numeric arrive as numbers; ids and secrets stay text.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(value) => value,
        Scalar::Unsigned(value) => value.to_string(),
        Scalar::Signed(value) => value.to_string(),
        Scalar::Float(value) => value.to_string(),
        Scalar::Flag(value) => value.to_string(),
    })
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
