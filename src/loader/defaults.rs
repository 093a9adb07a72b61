//! Declared defaults, applied once as the lowest-precedence source.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Bool(bool),
}

impl From<DefaultValue> for Value {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Str(s) => Value::from(s),
            DefaultValue::Int(n) => Value::from(n),
            DefaultValue::Bool(b) => Value::from(b),
        }
    }
}

/// Dotted field path to default value. Fields not listed here fall back to
/// their zero value.
pub const DEFAULTS: &[(&str, DefaultValue)] = &[
    ("run_mode", DefaultValue::Str("release")),
    ("http.host", DefaultValue::Str("0.0.0.0")),
    ("http.port", DefaultValue::Int(80)),
    ("http.context_path", DefaultValue::Str("api")),
    ("logging.version", DefaultValue::Int(1212)),
    ("logging.level", DefaultValue::Str("info")),
    ("logging.syslog_network", DefaultValue::Str("udp")),
    ("jwt_auth.enable", DefaultValue::Bool(true)),
    ("jwt_auth.limit_time", DefaultValue::Int(0)),
    ("jwt_auth.limit_expired", DefaultValue::Int(7200)),
    ("jwt_auth.limit_refresh", DefaultValue::Int(86400)),
    ("www.index", DefaultValue::Str("index.html")),
    ("www.root_dir", DefaultValue::Str("www")),
    ("i18n.db_enable", DefaultValue::Bool(false)),
];

pub fn lookup(key: &str) -> Option<DefaultValue> {
    DEFAULTS
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, value)| *value)
}

/// Register every entry of [`DEFAULTS`] on the builder.
pub fn apply(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (key, value) in DEFAULTS {
        builder = builder.set_default(*key, *value)?;
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::Config;

    #[test]
    fn keys_are_unique() {
        for (i, (key, _)) in DEFAULTS.iter().enumerate() {
            assert!(
                DEFAULTS[i + 1..].iter().all(|(other, _)| other != key),
                "duplicate default for {key}"
            );
        }
    }

    #[test]
    fn lookup_finds_declared_defaults() {
        assert_eq!(lookup("http.port"), Some(DefaultValue::Int(80)));
        assert_eq!(lookup("jwt_auth.enable"), Some(DefaultValue::Bool(true)));
        assert_eq!(lookup("redis.addr"), None);
    }

    #[test]
    fn applied_defaults_deserialize_into_config() {
        let config: Config = apply(config::Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.run_mode, "release");
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 80);
        assert_eq!(config.http.context_path, "api");
        assert_eq!(config.logging.version, 1212);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.syslog_network, "udp");
        assert!(config.jwt_auth.enable);
        assert_eq!(config.jwt_auth.limit_time, 0);
        assert_eq!(config.jwt_auth.limit_expired, 7200);
        assert_eq!(config.jwt_auth.limit_refresh, 86400);
        assert_eq!(config.www.index, "index.html");
        assert_eq!(config.www.root_dir, "www");
        assert!(!config.i18n.db_enable);
        assert_eq!(config.mysql.port, 0);
    }
}
