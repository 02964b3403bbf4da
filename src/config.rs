use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::navigation::{NavMode, TriggerBand};

const CONFIG_FILE: &str = "config.yaml";

/// Settings from `config.yaml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub decks_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub default_mode: NavMode,
    pub trigger_band: TriggerBand,
    /// Rows moved per frame while a smooth scroll is in flight.
    pub scroll_step: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decks_dir: None,
            data_dir: None,
            default_mode: NavMode::Focused,
            trigger_band: TriggerBand::default(),
            scroll_step: 3,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Read the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let TriggerBand { start, end } = self.trigger_band;
        if !(0.0..1.0).contains(&start) || end <= start || end > 1.0 {
            return Err(ConfigError::TriggerBand { start, end });
        }
        Ok(())
    }

    pub fn decks_dir(&self) -> PathBuf {
        self.decks_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("decks"))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn attempts_dir(&self) -> PathBuf {
        self.data_dir().join("attempts")
    }

    pub fn progress_path(&self) -> PathBuf {
        self.data_dir().join("progress.yaml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("termdrill.log")
    }

    pub fn scroll_step(&self) -> usize {
        self.scroll_step.max(1)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "termdrill")
}

pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".termdrill"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        Config::parse(content, Path::new("config.yaml"))
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("").unwrap(), Config::default());
        assert_eq!(Config::default().scroll_step(), 3);
    }

    #[test]
    fn reads_keys() {
        let config = parse(
            "decks_dir: /srv/decks\ndata_dir: /tmp/td\ndefault_mode: continuous\ntrigger_band:\n  start: 0.1\n  end: 0.4\nscroll_step: 5\nlog_level: debug\n",
        )
        .unwrap();
        assert_eq!(config.decks_dir(), PathBuf::from("/srv/decks"));
        assert_eq!(config.progress_path(), PathBuf::from("/tmp/td/progress.yaml"));
        assert_eq!(config.default_mode, NavMode::Continuous);
        assert_eq!(config.trigger_band, TriggerBand { start: 0.1, end: 0.4 });
        assert_eq!(config.scroll_step, 5);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn decks_default_under_data_dir() {
        let config = parse("data_dir: /tmp/td\n").unwrap();
        assert_eq!(config.decks_dir(), PathBuf::from("/tmp/td/decks"));
        assert_eq!(config.attempts_dir(), PathBuf::from("/tmp/td/attempts"));
    }

    #[test]
    fn rejects_bad_band_and_unknown_keys() {
        assert!(matches!(
            parse("trigger_band:\n  start: 0.5\n  end: 0.3\n"),
            Err(ConfigError::TriggerBand { .. })
        ));
        assert!(matches!(
            parse("colour: blue\n"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
