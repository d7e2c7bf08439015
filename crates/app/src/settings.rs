//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, overridden by `HENHOUSE_*` environment variables
//! (`HENHOUSE_APP__LEVEL=debug`, `HENHOUSE_AUTOSAVE__QUIET_MS=500`).
//!
//! See `settings.toml` at the repository root for an example.
use config::{Config, ConfigError, Environment, File};
use engine::DEFAULT_QUIET_PERIOD;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite("henhouse.db".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    /// IANA time zone for calendar windows; host local time when unset.
    pub timezone: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Autosave {
    pub quiet_ms: u64,
}

impl Default for Autosave {
    fn default() -> Self {
        Self {
            quiet_ms: u64::try_from(DEFAULT_QUIET_PERIOD.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub autosave: Autosave,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Self::layered(path, environment())
    }

    fn layered(path: &str, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

/// `HENHOUSE_<SECTION>__<KEY>`, e.g. `HENHOUSE_APP__LEVEL`.
fn environment() -> Environment {
    Environment::with_prefix("HENHOUSE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use config::FileFormat;

    use super::*;

    fn from_toml(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.app.timezone, None);
        assert_eq!(settings.database, Database::Sqlite("henhouse.db".to_string()));
        assert_eq!(
            Duration::from_millis(settings.autosave.quiet_ms),
            DEFAULT_QUIET_PERIOD
        );
    }

    #[test]
    fn database_variants() {
        let settings = from_toml("database = \"memory\"");
        assert_eq!(settings.database, Database::Memory);

        let settings = from_toml(
            "[app]\nlevel = \"debug\"\ntimezone = \"Europe/Rome\"\n[database]\nsqlite = \"/tmp/coop.db\"",
        );
        assert_eq!(settings.database, Database::Sqlite("/tmp/coop.db".to_string()));
        assert_eq!(settings.app.timezone.as_deref(), Some("Europe/Rome"));
    }

    #[test]
    fn environment_overrides_use_a_single_underscore_after_the_prefix() {
        let vars = HashMap::from([
            ("HENHOUSE_APP__LEVEL".to_string(), "debug".to_string()),
            ("HENHOUSE_AUTOSAVE__QUIET_MS".to_string(), "250".to_string()),
        ]);
        let env = environment().source(Some(vars));
        let settings = Settings::layered("does-not-exist", env).unwrap();
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.autosave.quiet_ms, 250);
        assert_eq!(settings.database, Database::default());
    }
}
