//! User configuration at ~/.config/cadence/config.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_core::View;
use chrono::Weekday;
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

fn default_week_start() -> Weekday {
    Weekday::Mon
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// IANA zone rules are written in and views are shown in.
    /// Falls back to the system zone, then UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_week_start")]
    pub week_start: Weekday,

    #[serde(default)]
    pub default_view: View,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        CadenceConfig {
            timezone: None,
            week_start: default_week_start(),
            default_view: View::default(),
        }
    }
}

impl CadenceConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("cadence");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, with `CADENCE_*` environment overrides on top.
    /// A missing file means defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("CADENCE"))
            .build()
            .with_context(|| format!("Could not read config file {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// The zone to work in.
    pub fn timezone(&self) -> Result<Tz> {
        match &self.timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Unknown time zone '{name}' in config: {e}")),
            None => Ok(system_timezone()),
        }
    }

    /// Write the config to `path`, replacing any comments in it.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Could not serialize config")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, content).context("Could not write config file")?;

        Ok(())
    }

    /// Update one setting by its file key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "timezone" => {
                value
                    .parse::<Tz>()
                    .map_err(|e| anyhow::anyhow!("Unknown time zone '{value}': {e}"))?;
                self.timezone = Some(value.to_string());
            }
            "week_start" => {
                self.week_start = value
                    .parse::<Weekday>()
                    .map_err(|_| anyhow::anyhow!("Unknown weekday '{value}'"))?;
            }
            "default_view" => {
                self.default_view = value.parse::<View>()?;
            }
            other => anyhow::bail!(
                "Unknown setting '{other}'. Expected timezone, week_start or default_view"
            ),
        }
        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# cadence configuration

# Time zone for new rules and calendar views (defaults to the system zone):
# timezone = \"{}\"

# First day of the week:
# week_start = \"monday\"

# View used when no --from/--to is given (day, week or month):
# default_view = \"month\"
",
            system_timezone().name()
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, contents).context("Could not write config file")?;

        Ok(())
    }
}

fn system_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}
