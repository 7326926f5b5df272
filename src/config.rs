use std::env;
use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub delivery_charge: BigDecimal,
    pub table_poll_interval: Duration,
    /// Carts untouched for this long are dropped.
    pub cart_idle_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        let db_pool_size = parse_or(&lookup, "DB_POOL_SIZE", 10u32)?;
        let delivery_charge = parse_or(&lookup, "DELIVERY_CHARGE", BigDecimal::from(40))?;
        let poll_secs = parse_or(&lookup, "TABLE_POLL_INTERVAL_SECS", 30u64)?;
        let cart_ttl_secs = parse_or(&lookup, "CART_IDLE_TTL_SECS", 7200u64)?;

        if db_pool_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_POOL_SIZE",
                value: "0".to_string(),
            });
        }
        if delivery_charge < BigDecimal::from(0) {
            return Err(ConfigError::Invalid {
                name: "DELIVERY_CHARGE",
                value: delivery_charge.to_string(),
            });
        }
        if cart_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "CART_IDLE_TTL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            host,
            port,
            db_pool_size,
            delivery_charge,
            table_poll_interval: Duration::from_secs(poll_secs),
            cart_idle_ttl: Duration::from_secs(cart_ttl_secs),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/food")]))
                .expect("valid config");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_pool_size, 10);
        assert_eq!(config.delivery_charge, BigDecimal::from(40));
        assert_eq!(config.table_poll_interval, Duration::from_secs(30));
        assert_eq!(config.cart_idle_ttl, Duration::from_secs(7200));
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
        assert_eq!(err.to_string(), "DATABASE_URL must be set");
    }

    #[test]
    fn unparsable_port_is_reported_with_its_value() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/food"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();

        assert_eq!(err.to_string(), "PORT has an invalid value 'eighty'");
    }

    #[test]
    fn negative_delivery_charge_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/food"),
            ("DELIVERY_CHARGE", "-5"),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "DELIVERY_CHARGE",
                ..
            }
        ));
    }

    #[test]
    fn zero_cart_ttl_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/food"),
            ("CART_IDLE_TTL_SECS", "0"),
        ]))
        .unwrap_err();

        assert_eq!(err.to_string(), "CART_IDLE_TTL_SECS has an invalid value '0'");
    }
}
