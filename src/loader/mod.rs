//! Assembles a [`Config`] from defaults, YAML files and the environment.
use std::env;
use std::path::PathBuf;

use config::{Environment, File, Map};
use log::debug;

use crate::models::config::Config;

pub mod defaults;

/// Keys whose environment values are split on `,` into lists. Every other
/// variable is kept as the literal string.
const LIST_KEYS: &[&str] = &[
    "http.prefixes",
    "cors.allow_origins",
    "cors.allow_methods",
    "cors.allow_headers",
    "gzip.excluded_extensions",
    "gzip.excluded_paths",
];

/// Errors surfaced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to read configuration sources: {0}")]
    Build(#[source] config::ConfigError),
    #[error("failed to map configuration onto settings: {0}")]
    Deserialize(#[source] config::ConfigError),
}

/// Layered configuration source.
///
/// Precedence, lowest first: declared defaults, `{dir}/default`,
/// `{dir}/{profile}` (optional), then `{PREFIX}_SECTION__FIELD` variables.
#[derive(Clone, Debug)]
pub struct ConfigLoader {
    dir: PathBuf,
    profile: Option<String>,
    env_prefix: String,
    env_source: Option<Map<String, String>>,
}

impl ConfigLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            profile: None,
            env_prefix: "APP".to_string(),
            env_source: None,
        }
    }

    /// Loader for `./config`, with the profile taken from `APP_ENV`
    /// (defaults to `local`).
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());
        Self::new("config").profile(app_env)
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Read variables from `source` instead of the process environment.
    pub fn env_source(mut self, source: Map<String, String>) -> Self {
        self.env_source = Some(source);
        self
    }

    fn file_name(&self, name: &str) -> String {
        self.dir.join(name).to_string_lossy().into_owned()
    }

    fn environment(&self) -> Environment {
        Environment::with_prefix(&self.env_prefix)
            .prefix_separator("_")
            .separator("__")
            .source(self.env_source.clone())
    }

    fn env_vars(&self) -> Vec<(String, String)> {
        match &self.env_source {
            Some(source) => source.clone().into_iter().collect(),
            None => env::vars_os()
                .filter_map(|(key, value)| {
                    Some((key.into_string().ok()?, value.into_string().ok()?))
                })
                .collect(),
        }
    }

    /// Comma-separated list values for [`LIST_KEYS`] found in the environment.
    fn list_overrides(&self) -> Vec<(&'static str, Vec<String>)> {
        let vars = self.env_vars();
        LIST_KEYS
            .iter()
            .filter_map(|key| {
                let name = format!("{}_{}", self.env_prefix, key.replace('.', "__"));
                let (_, value) = vars.iter().find(|(var, _)| var.eq_ignore_ascii_case(&name))?;
                let items = value
                    .split(',')
                    .filter(|item| !item.is_empty())
                    .map(str::to_owned)
                    .collect();
                Some((*key, items))
            })
            .collect()
    }

    pub fn load(&self) -> Result<Config, LoaderError> {
        debug!(
            "Loading configuration from {} (profile: {})",
            self.dir.display(),
            self.profile.as_deref().unwrap_or("-")
        );

        let mut builder =
            defaults::apply(config::Config::builder()).map_err(LoaderError::Build)?;
        builder = builder.add_source(File::with_name(&self.file_name("default")));
        if let Some(profile) = &self.profile {
            builder =
                builder.add_source(File::with_name(&self.file_name(profile)).required(false));
        }
        builder = builder.add_source(self.environment());
        for (key, items) in self.list_overrides() {
            builder = builder.set_override(key, items).map_err(LoaderError::Build)?;
        }
        let settings = builder.build().map_err(LoaderError::Build)?;

        settings
            .try_deserialize::<Config>()
            .map_err(LoaderError::Deserialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn no_env() -> Map<String, String> {
        Map::new()
    }

    #[test]
    fn empty_file_yields_declared_defaults() {
        let dir = config_dir(&[("default.yaml", "{}\n")]);

        let config = ConfigLoader::new(dir.path())
            .env_source(no_env())
            .load()
            .unwrap();

        assert_eq!(config.run_mode, "release");
        assert!(!config.is_debug_mode());
        assert_eq!(config.http.bind_address(), ("0.0.0.0".to_string(), 80));
        assert_eq!(config.http.api_path(), "/api");
        assert_eq!(config.logging.level, "info");
        assert!(config.jwt_auth.enable);
        assert_eq!(config.www.index, "index.html");
        assert_eq!(config.sqlite3.dsn(), "");
        assert_eq!(config.mysql.dsn(), ":@tcp(:0)/?");
    }

    #[test]
    fn file_values_override_defaults() {
        let yaml = r"
run_mode: debug
http:
  port: 8080
  prefixes: [/api, /swagger]
mysql:
  host: 127.0.0.1
  port: 3306
  user: root
  password: secret
  db_name: admin
  parameters: charset=utf8mb4
postgres:
  host: db
  port: 5432
  user: admin
  db_name: admin
  password: pw
  ssl_mode: disable
sqlite3:
  path: data/admin.db
";
        let dir = config_dir(&[("default.yaml", yaml)]);

        let config = ConfigLoader::new(dir.path())
            .env_source(no_env())
            .load()
            .unwrap();

        assert!(config.is_debug_mode());
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.prefixes, vec!["/api", "/swagger"]);
        assert_eq!(
            config.mysql.dsn(),
            "root:secret@tcp(127.0.0.1:3306)/admin?charset=utf8mb4"
        );
        assert_eq!(config.mysql2.dsn(), ":@tcp(:0)/?");
        assert_eq!(
            config.postgres.dsn(),
            "host=db port=5432 user=admin dbname=admin password=pw sslmode=disable"
        );
        assert_eq!(config.sqlite3.dsn(), "data/admin.db");
    }

    #[test]
    fn profile_overrides_base_file() {
        let dir = config_dir(&[
            ("default.yaml", "http:\n  port: 8080\n  host: 127.0.0.1\n"),
            ("staging.yaml", "http:\n  port: 9000\n"),
        ]);

        let config = ConfigLoader::new(dir.path())
            .profile("staging")
            .env_source(no_env())
            .load()
            .unwrap();

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.host, "127.0.0.1");
    }

    #[test]
    fn missing_profile_is_ignored() {
        let dir = config_dir(&[("default.yaml", "http:\n  port: 8080\n")]);

        let config = ConfigLoader::new(dir.path())
            .profile("local")
            .env_source(no_env())
            .load()
            .unwrap();

        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn environment_overrides_files() {
        let dir = config_dir(&[
            ("default.yaml", "http:\n  port: 8080\n"),
            ("local.yaml", "run_mode: test\n"),
        ]);
        let env = Map::from([
            ("APP_RUN_MODE".to_string(), "debug".to_string()),
            ("APP_HTTP__PORT".to_string(), "9090".to_string()),
            ("APP_MYSQL2__HOST".to_string(), "replica".to_string()),
            ("APP_MYSQL2__PASSWORD".to_string(), "1234".to_string()),
            (
                "APP_CORS__ALLOW_ORIGINS".to_string(),
                "https://a.example,https://b.example".to_string(),
            ),
            ("APP_JWT_AUTH__ENABLE".to_string(), "false".to_string()),
            ("OTHER_HTTP__PORT".to_string(), "1".to_string()),
        ]);

        let config = ConfigLoader::new(dir.path())
            .profile("local")
            .env_source(env)
            .load()
            .unwrap();

        assert!(config.is_debug_mode());
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.mysql2.host, "replica");
        assert_eq!(config.mysql2.password, "1234");
        assert_eq!(config.mysql.host, "");
        assert_eq!(
            config.cors.allow_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.jwt_auth.enable);
    }

    #[test]
    fn environment_strings_are_kept_verbatim() {
        let dir = config_dir(&[("default.yaml", "{}\n")]);
        let env = Map::from([
            ("APP_MYSQL__PASSWORD".to_string(), "007".to_string()),
            ("APP_MYSQL__USER".to_string(), "true".to_string()),
            ("APP_POSTGRES__PASSWORD".to_string(), "1.50".to_string()),
            ("APP_REDIS__PASSWORD".to_string(), "1e3".to_string()),
            ("APP_SQLITE3__PATH".to_string(), "data/a,b.db".to_string()),
            ("APP_HTTP__PREFIXES".to_string(), "/api".to_string()),
            ("APP_GZIP__EXCLUDED_EXTENSIONS".to_string(), String::new()),
        ]);

        let config = ConfigLoader::new(dir.path())
            .env_source(env)
            .load()
            .unwrap();

        assert_eq!(config.mysql.password, "007");
        assert_eq!(config.mysql.user, "true");
        assert_eq!(config.postgres.password, "1.50");
        assert_eq!(config.redis.password, "1e3");
        assert_eq!(config.sqlite3.dsn(), "data/a,b.db");
        assert_eq!(config.mysql.dsn(), "true:007@tcp(:0)/?");
        assert_eq!(config.http.prefixes, vec!["/api"]);
        assert!(config.gzip.excluded_extensions.is_empty());
    }

    #[test]
    fn custom_prefix_is_respected() {
        let dir = config_dir(&[("default.yaml", "{}\n")]);
        let env = Map::from([
            ("ADMIN_HTTP__PORT".to_string(), "7000".to_string()),
            ("APP_HTTP__PORT".to_string(), "1".to_string()),
        ]);

        let config = ConfigLoader::new(dir.path())
            .env_prefix("ADMIN")
            .env_source(env)
            .load()
            .unwrap();

        assert_eq!(config.http.port, 7000);
    }

    #[test]
    fn missing_base_file_is_a_build_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = ConfigLoader::new(dir.path()).env_source(no_env()).load();

        assert!(matches!(result, Err(LoaderError::Build(_))));
    }

    #[test]
    fn type_mismatch_is_a_deserialize_error() {
        let dir = config_dir(&[("default.yaml", "http:\n  port: not-a-port\n")]);

        let result = ConfigLoader::new(dir.path()).env_source(no_env()).load();

        assert!(matches!(result, Err(LoaderError::Deserialize(_))));
    }
}
