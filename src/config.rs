use anyhow::{bail, Context};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::models::Currency;
use crate::services::ledger::LedgerSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub default_currency: Currency,
    pub min_transfer_amount: Decimal,
    pub max_transfer_amount: Decimal,
    pub audit_initial_balance: bool,
    /// Requests per window and client; 0 disables rate limiting.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        let ledger = LedgerSettings::default();
        Self {
            port: 3000,
            app_name: "Wallet Service".to_string(),
            app_version: "1.0.0".to_string(),
            environment: Environment::Development,
            default_currency: ledger.default_currency,
            min_transfer_amount: ledger.min_transfer_amount,
            max_transfer_amount: ledger.max_transfer_amount,
            audit_initial_balance: ledger.audit_initial_balance,
            rate_limit_max: 100,
            rate_limit_window_secs: 60,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys take their defaults; present
    /// but malformed values are an error.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_currency = match get("DEFAULT_CURRENCY") {
            Some(code) => Currency::parse(&code).with_context(|| {
                format!(
                    "DEFAULT_CURRENCY '{}' is not supported (expected {})",
                    code,
                    Currency::supported_codes()
                )
            })?,
            None => defaults.default_currency,
        };

        let environment = match get("APP_ENV") {
            Some(raw) => Environment::parse(&raw)
                .with_context(|| format!("APP_ENV '{}' is not one of development, production, test", raw))?,
            None => defaults.environment,
        };

        let log_format = match get("LOG_FORMAT").map(|f| f.trim().to_lowercase()) {
            None => defaults.log_format,
            Some(f) if f == "text" => LogFormat::Text,
            Some(f) if f == "json" => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT '{}' is not one of text, json", other),
        };

        let config = Self {
            port: parse_or(&get, "PORT", defaults.port)?,
            app_name: get("APP_NAME").unwrap_or(defaults.app_name),
            app_version: get("APP_VERSION").unwrap_or(defaults.app_version),
            environment,
            default_currency,
            min_transfer_amount: parse_or(&get, "MIN_TRANSFER_AMOUNT", defaults.min_transfer_amount)?,
            max_transfer_amount: parse_or(&get, "MAX_TRANSFER_AMOUNT", defaults.max_transfer_amount)?,
            audit_initial_balance: parse_or(&get, "AUDIT_INITIAL_BALANCE", defaults.audit_initial_balance)?,
            rate_limit_max: parse_or(&get, "RATE_LIMIT_MAX", defaults.rate_limit_max)?,
            rate_limit_window_secs: parse_or(&get, "RATE_LIMIT_TTL", defaults.rate_limit_window_secs)?,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
        };

        if config.port == 0 {
            bail!("PORT must be between 1 and 65535");
        }
        if config.rate_limit_max > 0 && config.rate_limit_window_secs == 0 {
            bail!("RATE_LIMIT_TTL must be at least 1 second");
        }
        config
            .ledger_settings()
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid transfer limits: {}", e))?;

        Ok(config)
    }

    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            min_transfer_amount: self.min_transfer_amount,
            max_transfer_amount: self.max_transfer_amount,
            default_currency: self.default_currency,
            audit_initial_balance: self.audit_initial_balance,
        }
    }
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.min_transfer_amount, Decimal::from(10));
        assert_eq!(config.max_transfer_amount, Decimal::from(1_000_000));
        assert_eq!(config.default_currency, Currency::USD);
        assert_eq!(config.rate_limit_max, 100);
        assert!(!config.audit_initial_balance);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("MIN_TRANSFER_AMOUNT", "0.01"),
            ("MAX_TRANSFER_AMOUNT", "5000"),
            ("AUDIT_INITIAL_BALANCE", "true"),
            ("APP_ENV", "production"),
            ("LOG_FORMAT", "JSON"),
            ("DEFAULT_CURRENCY", "usd"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.min_transfer_amount, Decimal::new(1, 2));
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.default_currency, Currency::USD);
        assert!(config.ledger_settings().audit_initial_balance);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("PORT", "abc")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DEFAULT_CURRENCY", "XYZ")])).is_err());
        assert!(Config::from_lookup(lookup(&[("MIN_TRANSFER_AMOUNT", "100"), ("MAX_TRANSFER_AMOUNT", "10")])).is_err());
        assert!(Config::from_lookup(lookup(&[("APP_ENV", "staging")])).is_err());
    }
}
