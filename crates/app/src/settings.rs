//! Handles settings for the application. Configuration is written in
//! `settings.toml`.
//!
//! See `settings.toml` for the configuration.

use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, File};
use engine::database::{DEFAULT_MAX_CONNECTIONS, Storage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn storage(&self) -> Storage {
        match self {
            Self::Memory => Storage::Memory,
            Self::Sqlite(path) => Storage::File(PathBuf::from(path)),
        }
    }
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Pool size for file databases; memory databases always use one.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sweep {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub inactive_days: i64,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            interval_secs: server::sweep::DEFAULT_INTERVAL.as_secs(),
            timeout_secs: server::sweep::DEFAULT_TIMEOUT.as_secs(),
            inactive_days: server::sweep::DEFAULT_INACTIVE_DAYS,
        }
    }
}

impl Sweep {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn inactive_for(&self) -> chrono::Duration {
        chrono::Duration::days(self.inactive_days)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub sweep: Sweep,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep.inactive_days <= 0 {
            return Err(ConfigError::Message(format!(
                "sweep.inactive_days must be positive, got {}",
                self.sweep.inactive_days
            )));
        }
        if self.sweep.interval_secs == 0 {
            return Err(ConfigError::Message(
                "sweep.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn sweep_defaults_when_section_missing() {
        let settings = parse(
            r#"
            [app]
            level = "info"

            [server]
            port = 3000
            database = "memory"
            "#,
        );
        assert_eq!(settings.sweep.interval(), Duration::from_secs(3600));
        assert_eq!(settings.sweep.timeout(), Duration::from_secs(15));
        assert_eq!(settings.sweep.inactive_for(), chrono::Duration::days(7));
        settings.validate().unwrap();
        let server = settings.server.unwrap();
        assert!(matches!(server.database, Database::Memory));
        assert!(server.bind.is_none());
        assert_eq!(server.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(server.database.storage(), Storage::Memory);
    }

    #[test]
    fn sqlite_path_and_partial_sweep() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 8080
            database = { sqlite = "tally.db" }

            [sweep]
            inactive_days = 3
            "#,
        );
        let server = settings.server.unwrap();
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "tally.db"));
        assert_eq!(settings.sweep.inactive_days, 3);
        assert_eq!(settings.sweep.interval_secs, 3600);
        assert_eq!(
            server.database.storage(),
            Storage::File(PathBuf::from("tally.db"))
        );
    }

    #[test]
    fn non_positive_inactivity_is_rejected() {
        for days in ["0", "-2"] {
            let settings = parse(&format!(
                r#"
                [app]
                level = "info"

                [sweep]
                inactive_days = {days}
                "#
            ));
            assert!(matches!(settings.validate(), Err(ConfigError::Message(_))));
        }
    }
}
