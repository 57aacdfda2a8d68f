//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so the message center starts with zero
//! configuration.

use std::path::PathBuf;

use msgcenter_shared::constants::DEFAULT_PUSH_BUFFER;

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "msgcenter_client=debug,msgcenter_store=info,warn";

/// Message center configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite file for message state, remarks and analytics.
    /// Env: `MSGCENTER_DB_PATH`
    /// Default: `None` (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Capacity of the push channel.
    /// Env: `MSGCENTER_PUSH_BUFFER`
    /// Default: `64`
    pub push_buffer: usize,

    /// Fallback tracing filter used when `RUST_LOG` is unset.
    /// Env: `MSGCENTER_LOG`
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            push_buffer: DEFAULT_PUSH_BUFFER,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("MSGCENTER_DB_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("MSGCENTER_PUSH_BUFFER") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.push_buffer = n,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid MSGCENTER_PUSH_BUFFER, using default"
                    );
                }
            }
        }

        if let Some(filter) = lookup("MSGCENTER_LOG") {
            if !filter.is_empty() {
                config.log_filter = filter;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> ClientConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.database_path, None);
        assert_eq!(config.push_buffer, 64);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(from_pairs(&[]), config);
    }

    #[test]
    fn test_env_overrides() {
        let config = from_pairs(&[
            ("MSGCENTER_DB_PATH", "/tmp/msgs.sqlite"),
            ("MSGCENTER_PUSH_BUFFER", "8"),
            ("MSGCENTER_LOG", "debug"),
        ]);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/msgs.sqlite")));
        assert_eq!(config.push_buffer, 8);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_invalid_push_buffer_keeps_default() {
        assert_eq!(from_pairs(&[("MSGCENTER_PUSH_BUFFER", "lots")]).push_buffer, 64);
        assert_eq!(from_pairs(&[("MSGCENTER_PUSH_BUFFER", "0")]).push_buffer, 64);
    }
}
