//! Database connection settings and their connection strings.
//!
//! Values are substituted verbatim: nothing is escaped, validated or
//! defaulted here. Drivers reject malformed strings at connect time.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
/// MySQL connection parameters. Used for both the primary and the
/// secondary database.
#[serde(default)]
pub struct MySqlConfig {
    pub host: String,
    pub port: i32,
    pub user: String,
    pub password: String,
    pub db_name: String,
    /// Extra driver parameters, e.g. `charset=utf8mb4&parseTime=True`.
    pub parameters: String,
}

impl MySqlConfig {
    /// `user:password@tcp(host:port)/db_name?parameters`
    ///
    /// The `?` is always present, even with no parameters.
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}?{}",
            self.user, self.password, self.host, self.port, self.db_name, self.parameters
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
/// PostgreSQL connection parameters.
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: i32,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub ssl_mode: String,
}

impl PostgresConfig {
    /// Key/value connection string understood by libpq-compatible drivers.
    pub fn dsn(&self) -> String {
        format!(
            "host={} port={} user={} dbname={} password={} sslmode={}",
            self.host, self.port, self.user, self.db_name, self.password, self.ssl_mode
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Sqlite3Config {
    pub path: String,
}

impl Sqlite3Config {
    pub fn dsn(&self) -> String {
        self.path.clone()
    }
}
