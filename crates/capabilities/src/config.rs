//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Settings for the HTTP transport and the capability caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout
    pub http_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Cache entry lifetime; `None` keeps entries for the process lifetime
    pub cache_ttl_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            cache_ttl_secs: None,
            user_agent: concat!("ogc-capabilities/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - CAPABILITIES_HTTP_TIMEOUT_SECS (default: 30)
    /// - CAPABILITIES_CONNECT_TIMEOUT_SECS (default: 10)
    /// - CAPABILITIES_CACHE_TTL_SECS (default: unset, 0 also means never expire)
    /// - CAPABILITIES_USER_AGENT
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key = key, value = %raw, "Ignoring non-numeric configuration value");
                    None
                }
            }
        };

        Self {
            http_timeout_secs: number("CAPABILITIES_HTTP_TIMEOUT_SECS")
                .unwrap_or(defaults.http_timeout_secs),
            connect_timeout_secs: number("CAPABILITIES_CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.connect_timeout_secs),
            cache_ttl_secs: number("CAPABILITIES_CACHE_TTL_SECS").filter(|ttl| *ttl > 0),
            user_agent: lookup("CAPABILITIES_USER_AGENT")
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or(defaults.user_agent),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs
            .filter(|ttl| *ttl > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.cache_ttl(), None);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_reads_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAPABILITIES_HTTP_TIMEOUT_SECS", "5"),
            ("CAPABILITIES_CACHE_TTL_SECS", "600"),
            ("CAPABILITIES_USER_AGENT", "probe/1.0"),
        ]));
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.user_agent, "probe/1.0");
    }

    #[test]
    fn test_zero_ttl_and_garbage_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAPABILITIES_CACHE_TTL_SECS", "0"),
            ("CAPABILITIES_CONNECT_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config.cache_ttl(), None);
        assert_eq!(config.connect_timeout_secs, 10);
    }
}
