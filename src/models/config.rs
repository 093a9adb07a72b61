//! Configuration model loaded from external sources.
//!
//! Every group deserializes with `#[serde(default)]`, so a missing field takes
//! its zero value. Declared defaults are layered in by [`crate::loader`].

use serde::{Deserialize, Serialize};

use crate::models::database::{MySqlConfig, PostgresConfig, Sqlite3Config};

const REDACTED: &str = "***";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
/// Root of the settings tree shared across the service.
#[serde(default)]
pub struct Config {
    /// `debug`, `test` or `release`.
    pub run_mode: String,
    pub swagger: bool,
    pub print_config: bool,
    pub http: HttpConfig,
    pub casbin: CasbinConfig,
    pub logging: LoggingConfig,
    pub jwt_auth: JwtAuthConfig,
    pub redis: RedisConfig,
    pub mysql: MySqlConfig,
    /// Secondary MySQL database, independent of `mysql`.
    pub mysql2: MySqlConfig,
    pub postgres: PostgresConfig,
    pub sqlite3: Sqlite3Config,
    pub www: WwwConfig,
    pub i18n: I18nConfig,
    pub cors: CorsConfig,
    pub gzip: GzipConfig,
    pub rate_limiter: RateLimiterConfig,
    pub middle_config: MiddleConfig,
}

impl Config {
    pub fn is_debug_mode(&self) -> bool {
        self.run_mode == "debug"
    }

    /// Copy of the tree with credentials masked, suitable for logging.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        for secret in [
            &mut copy.mysql.password,
            &mut copy.mysql2.password,
            &mut copy.postgres.password,
            &mut copy.redis.password,
            &mut copy.jwt_auth.signing_key,
            &mut copy.jwt_auth.signing_secret,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        copy
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
/// Toggles for the request-handling middleware.
#[serde(default)]
pub struct MiddleConfig {
    /// Access log for every request.
    pub logger: bool,
    /// Turn handler panics into `500` responses.
    pub recover: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Graceful shutdown window in seconds; `0` keeps the server default.
    pub shutdown_timeout: u64,
    /// Request body limit in bytes; `0` keeps the server default.
    pub max_content_length: u64,
    pub context_path: String,
    pub prefixes: Vec<String>,
}

impl HttpConfig {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    /// Context path as a mount point: `"api"` becomes `"/api"`, an empty
    /// path mounts at the root.
    pub fn api_path(&self) -> String {
        let trimmed = self.context_path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CasbinConfig {
    pub enable: bool,
    pub debug: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub version: i32,
    pub level: String,
    /// `json` or `text`.
    pub format: String,
    /// `stdout`, `stderr` or `file`.
    pub output: String,
    pub output_file: String,
    pub enable_syslog_hook: bool,
    pub syslog_network: String,
    pub syslog_addr: String,
    pub syslog_tag: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enable: bool,
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    /// Preflight cache age in seconds.
    pub max_age: i64,
}

impl CorsConfig {
    pub fn max_age_secs(&self) -> Option<usize> {
        usize::try_from(self.max_age).ok().filter(|age| *age > 0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GzipConfig {
    pub enable: bool,
    pub excluded_extensions: Vec<String>,
    pub excluded_paths: Vec<String>,
}

impl GzipConfig {
    /// Whether responses for `path` must be sent uncompressed.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self
            .excluded_paths
            .iter()
            .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
        {
            return true;
        }

        let file_name = path.rsplit('/').next().unwrap_or(path);
        let Some((_, extension)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.excluded_extensions.iter().any(|excluded| {
            let excluded = excluded.trim_start_matches('.');
            !excluded.is_empty() && excluded.eq_ignore_ascii_case(extension)
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
/// Token issuing settings consumed by the authentication layer.
#[serde(default)]
pub struct JwtAuthConfig {
    pub enable: bool,
    pub signing_method: String,
    pub signing_key: String,
    pub signing_secret: String,
    pub expired: i64,
    /// Token store backend, e.g. `file` or `redis`.
    pub store: String,
    pub file_path: String,
    pub redis_db: i32,
    pub redis_prefix: String,
    /// Window in seconds during which the same access token is handed out
    /// again; `<= 0` disables the reuse cache.
    pub limit_time: i64,
    /// Access token lifetime in seconds.
    pub limit_expired: i64,
    /// Refresh token lifetime in seconds.
    pub limit_refresh: i64,
    pub authz_server: String,
    pub authx_server: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    pub enable: bool,
    pub count: i64,
    pub redis_db: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub addr: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
/// Static assets served outside the API scope.
#[serde(default)]
pub struct WwwConfig {
    pub index: String,
    pub root_dir: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct I18nConfig {
    pub db_enable: bool,
}
