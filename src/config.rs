use std::net::SocketAddr;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::core::Variant;
use crate::error::ConfigError;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub variant: Variant,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads `POCKET_*` variables, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr =
            lookup("POCKET_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::ListenAddr {
                value: raw_addr.clone(),
                source,
            })?;
        let variant = match lookup("POCKET_VARIANT") {
            Some(raw) => raw.parse::<Variant>()?,
            None => Variant::Pocket,
        };
        let log_format = match lookup("POCKET_LOG_FORMAT") {
            Some(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            variant,
            log_format,
        })
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).expect("valid config");
        assert_eq!(
            config.listen_addr,
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.variant, Variant::Pocket);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn environment_overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("POCKET_LISTEN_ADDR", "127.0.0.1:9090"),
            ("POCKET_VARIANT", "interchange"),
            ("POCKET_LOG_FORMAT", "JSON"),
        ]))
        .expect("valid config");
        assert_eq!(config.listen_addr.port(), 9090);
        assert_eq!(config.variant, Variant::Interchange);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_listen_addr_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("POCKET_LISTEN_ADDR", "nowhere")]))
            .expect_err("must reject");
        assert!(err.to_string().contains("POCKET_LISTEN_ADDR"));
    }

    #[test]
    fn unknown_variant_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("POCKET_VARIANT", "deluxe")]))
            .expect_err("must reject");
        assert!(matches!(err, ConfigError::Variant(_)));
    }
}
