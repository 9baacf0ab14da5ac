//! Server configuration, read once from the environment.
//!
//! | Variable            | Default     |
//! |---------------------|-------------|
//! | `HOST`              | `127.0.0.1` |
//! | `PORT`              | `3000`      |
//! | `DEV_MODE`          | `false`     |
//! | `DATA_DIR`          | `./data`    |
//! | `JWT_SECRET`        | unset       |
//! | `VAULT_LIMIT`       | `10`        |
//! | `DEFAULT_PAGE_SIZE` | `10`        |

use std::path::PathBuf;

use anyhow::Context;

use crate::expense::MAX_PAGE_SIZE;
use crate::ledger::LedgerSettings;

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider that issues tokens.
    pub jwt_secret: Option<String>,
}

impl AuthConfig {
    pub fn auth_required(&self, dev_mode: bool) -> bool {
        !dev_mode
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Skip token verification and trust `X-Dev-User` headers.
    pub dev_mode: bool,
    pub data_dir: PathBuf,
    pub auth: AuthConfig,
    pub vault_limit: usize,
    pub default_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            dev_mode: false,
            data_dir: PathBuf::from("./data"),
            auth: AuthConfig::default(),
            vault_limit: 10,
            default_page_size: 10,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.trim().parse().context("PORT must be a valid port number")?,
            None => defaults.port,
        };
        let dev_mode = match lookup("DEV_MODE") {
            Some(v) => parse_bool(&v).with_context(|| format!("DEV_MODE has invalid value '{}'", v))?,
            None => defaults.dev_mode,
        };
        let vault_limit = match lookup("VAULT_LIMIT") {
            Some(v) => v.trim().parse().context("VAULT_LIMIT must be a positive integer")?,
            None => defaults.vault_limit,
        };
        let default_page_size: u32 = match lookup("DEFAULT_PAGE_SIZE") {
            Some(v) => v
                .trim()
                .parse()
                .context("DEFAULT_PAGE_SIZE must be a positive integer")?,
            None => defaults.default_page_size,
        };
        if default_page_size == 0 || default_page_size > MAX_PAGE_SIZE {
            anyhow::bail!("DEFAULT_PAGE_SIZE must be between 1 and {}", MAX_PAGE_SIZE);
        }

        Ok(Self {
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port,
            dev_mode,
            data_dir: lookup("DATA_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            auth: AuthConfig {
                jwt_secret: lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()),
            },
            vault_limit,
            default_page_size,
        })
    }

    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            vault_limit: self.vault_limit,
            default_page_size: self.default_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(!config.dev_mode);
        assert!(config.auth.auth_required(config.dev_mode));
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.vault_limit, 10);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("DEV_MODE", "true"),
            ("JWT_SECRET", "s3cret"),
            ("VAULT_LIMIT", "3"),
            ("DEFAULT_PAGE_SIZE", "25"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.dev_mode);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.ledger_settings().vault_limit, 3);
        assert_eq!(config.ledger_settings().default_page_size, 25);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("DEV_MODE", "maybe")]).is_err());
        assert!(config(&[("DEFAULT_PAGE_SIZE", "500")]).is_err());
    }
}
