//! Environment configuration.
//!
//! All configuration is read once at startup from environment variables;
//! there is no config file and no reloading. Missing required variables or
//! unparseable values fail startup so a misconfigured instance never
//! serves traffic.
//!
//! # Variables
//!
//! | Variable | Required | Meaning |
//! | --- | --- | --- |
//! | `INSTAGRAM_WEBHOOK_VERIFY_TOKEN` | yes | subscription handshake token |
//! | `INSTAGRAM_ACCESS_TOKEN` | yes | Graph API access token |
//! | `FACEBOOK_APP_SECRET` | no | enables delivery signature auth |
//! | `GRAPH_API_BASE_URL` | no | Graph API endpoint override |
//! | `RULES_PATH` | no | rule file path, default `rules.json` |
//! | `DEDUPE_TTL_HOURS` | no | enables the redelivery guard with this TTL |
//! | `BIND_ADDR` | no | listen address, default `0.0.0.0:3000` |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::instagram::client::DEFAULT_BASE_URL;

const DEFAULT_RULES_PATH: &str = "rules.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Errors produced while reading the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Token Meta must present during the subscription handshake.
    pub verify_token: String,

    /// Graph API access token the platform client authenticates with.
    pub access_token: String,

    /// App secret for delivery signature verification. `None` disables
    /// signature auth and deliveries are accepted on structure alone.
    pub app_secret: Option<Vec<u8>>,

    /// Graph API endpoint, overridable for staging and tests.
    pub graph_base_url: String,

    /// Where the rule store persists its JSON file.
    pub rules_path: PathBuf,

    /// Redelivery-guard TTL. `None` disables deduplication, matching the
    /// behavior of the system this one replaces.
    pub dedupe_ttl_hours: Option<i64>,

    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Tests use this with a closure over a map, so they never mutate the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let verify_token = require(&lookup, "INSTAGRAM_WEBHOOK_VERIFY_TOKEN")?;
        let access_token = require(&lookup, "INSTAGRAM_ACCESS_TOKEN")?;
        let app_secret = non_empty(&lookup, "FACEBOOK_APP_SECRET").map(String::into_bytes);

        let graph_base_url =
            non_empty(&lookup, "GRAPH_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let rules_path = non_empty(&lookup, "RULES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_PATH));

        let dedupe_ttl_hours = match non_empty(&lookup, "DEDUPE_TTL_HOURS") {
            Some(raw) => Some(parse_ttl_hours(&raw)?),
            None => None,
        };

        let bind_addr = non_empty(&lookup, "BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_addr
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: err.to_string(),
            })?;

        Ok(Config {
            verify_token,
            access_token,
            app_secret,
            graph_base_url,
            rules_path,
            dedupe_ttl_hours,
            bind_addr,
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    non_empty(lookup, name).ok_or(ConfigError::Missing(name))
}

/// Treats unset and empty-string variables identically.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.is_empty())
}

fn parse_ttl_hours(raw: &str) -> Result<i64, ConfigError> {
    let hours: i64 = raw.parse().map_err(|_| ConfigError::Invalid {
        name: "DEDUPE_TTL_HOURS",
        reason: format!("expected a whole number of hours, got {raw:?}"),
    })?;
    if hours <= 0 {
        return Err(ConfigError::Invalid {
            name: "DEDUPE_TTL_HOURS",
            reason: format!("TTL must be positive, got {hours}"),
        });
    }
    Ok(hours)
}
