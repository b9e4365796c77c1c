//! Settings of the `moneta` binary.
//!
//! Read from an optional `settings.toml` in the working directory, then
//! overridden by `MONETA__<SECTION>__<KEY>` environment variables. See
//! `settings.example.toml`.
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

/// Where the engine stores its data.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// Throwaway in-memory database, lost on exit.
    Memory,
    /// Path of a SQLite file, created when missing.
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            database: Database::Sqlite("moneta.db".to_string()),
        }
    }
}

impl Server {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(File::with_name("settings").required(false)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix("MONETA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(raw: &str) -> Settings {
        Settings::from_builder(Config::builder().add_source(File::from_str(raw, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.addr(), "127.0.0.1:3000");
        assert_eq!(
            settings.server.database,
            Database::Sqlite("moneta.db".to_string())
        );
    }

    #[test]
    fn database_accepts_memory_and_sqlite_path() {
        let settings = parse(
            r#"
            [server]
            port = 8080
            database = "memory"
            "#,
        );
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.database.url(), "sqlite::memory:");

        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            database = { sqlite = "/var/lib/moneta/data.db" }
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(
            settings.server.database.url(),
            "sqlite:/var/lib/moneta/data.db?mode=rwc"
        );
    }
}
