use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use ink_core::ScheduleHint;
use ink_core::db::DbConfig;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "inkbook.toml";

/// Contents of `inkbook.toml`. Every section and key is optional.
///
/// ```toml
/// [database]
/// backend = "sqlite"
/// connection_string = "inkbook.db"
///
/// [logging]
/// level = "info"
/// file = "inkbook.log"
///
/// [reminders]
/// lead_hours = 24
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DbConfig,
    pub logging: LoggingConfig,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Any `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReminderConfig {
    pub lead_hours: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            lead_hours: ScheduleHint::DEFAULT_LEAD_HOURS,
        }
    }
}

impl ReminderConfig {
    pub fn lead(&self) -> Result<Duration> {
        if self.lead_hours < 0 {
            anyhow::bail!(
                "reminders.lead_hours must not be negative (got {})",
                self.lead_hours
            );
        }
        Duration::try_hours(self.lead_hours).with_context(|| {
            format!("reminders.lead_hours is too large (got {})", self.lead_hours)
        })
    }
}

impl Config {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.reminders.lead()?;
        Ok(config)
    }

    /// Command-line flags beat the file.
    pub fn with_overrides(
        mut self,
        backend: Option<String>,
        db: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.database.backend = backend;
        }
        if let Some(db) = db {
            self.database.connection_string = db;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, "inkbook.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.reminders.lead().unwrap(), Duration::hours(24));
    }

    #[test]
    fn full_file_parses() {
        let config = Config::parse(
            r#"
            [database]
            backend = "memory"
            connection_string = ""

            [logging]
            level = "debug"
            file = "/tmp/inkbook.log"

            [reminders]
            lead_hours = 48
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, "memory");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/inkbook.log")));
        assert_eq!(config.reminders.lead_hours, 48);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = Config::parse("[database]\nconnection_string = \"tattoos.db\"\n").unwrap();

        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, "tattoos.db");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[reminders]\nlead_minutes = 5\n").is_err());
    }

    #[test]
    fn negative_lead_is_rejected() {
        assert!(Config::parse("[reminders]\nlead_hours = -1\n").is_err());
    }

    #[test]
    fn lead_beyond_duration_range_is_rejected() {
        assert!(Config::parse("[reminders]\nlead_hours = 3000000000000\n").is_err());

        let reminders = ReminderConfig {
            lead_hours: i64::MAX,
        };
        assert!(reminders.lead().is_err());
    }

    #[test]
    fn missing_file_is_defaults() {
        let config = Config::load(Path::new("/definitely/not/here/inkbook.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_override_file() {
        let config = Config::default().with_overrides(Some("memory".into()), None);

        assert_eq!(config.database.backend, "memory");
        assert_eq!(config.database.connection_string, "inkbook.db");
    }
}
