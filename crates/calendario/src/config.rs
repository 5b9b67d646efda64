//! Settings loaded from environment variables.

use anyhow::{bail, Result};
use tracing::warn;

/// Password used when `CALENDARIO_ADMIN_PASSWORD` is not set
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub admin_password: String,
    /// Append a `v=<timestamp>` query parameter when fetching remote sources
    pub cache_bust: bool,
}

/// Load a `.env` file if present
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

impl Settings {
    /// Read settings from the process environment (and `.env`).
    ///
    /// Recognises `CALENDARIO_ADMIN_PASSWORD` and `CALENDARIO_CACHE_BUST`.
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let admin_password = match lookup("CALENDARIO_ADMIN_PASSWORD") {
            Some(password) if !password.is_empty() => password,
            _ => {
                warn!("CALENDARIO_ADMIN_PASSWORD not set, using the default admin password");
                DEFAULT_ADMIN_PASSWORD.to_string()
            }
        };

        let cache_bust = match lookup("CALENDARIO_CACHE_BUST") {
            Some(raw) => parse_flag(&raw)?,
            None => true,
        };

        Ok(Self {
            admin_password,
            cache_bust,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("CALENDARIO_CACHE_BUST must be a boolean, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(|_| None).unwrap();
        assert_eq!(settings.admin_password, DEFAULT_ADMIN_PASSWORD);
        assert!(settings.cache_bust);
    }

    #[test]
    fn test_values_from_vars() {
        let env = vars(&[
            ("CALENDARIO_ADMIN_PASSWORD", "s3cret"),
            ("CALENDARIO_CACHE_BUST", "off"),
        ]);
        let settings = Settings::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.admin_password, "s3cret");
        assert!(!settings.cache_bust);
    }

    #[test]
    fn test_empty_password_falls_back_to_default() {
        let env = vars(&[("CALENDARIO_ADMIN_PASSWORD", "")]);
        let settings = Settings::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.admin_password, DEFAULT_ADMIN_PASSWORD);
    }

    #[test]
    fn test_invalid_flag_is_an_error() {
        let env = vars(&[("CALENDARIO_CACHE_BUST", "sometimes")]);
        let err = Settings::from_vars(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("CALENDARIO_CACHE_BUST"));
    }

    #[test]
    fn test_parse_flag_variants() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag(" yes ").unwrap());
        assert!(!parse_flag("0").unwrap());
    }
}
