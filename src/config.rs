use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::FrequencyModel;
use crate::secure::LayoutMode;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scroll_interval_ms")]
    pub scroll_interval_ms: u64,
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_layout_mode")]
    pub layout_mode: String,
    #[serde(default)]
    pub frequency_model: Option<PathBuf>,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_message_count")]
    pub message_count: usize,
}

fn default_scroll_interval_ms() -> u64 {
    100
}
fn default_tick_rate_ms() -> u64 {
    25
}
fn default_layout_mode() -> String {
    LayoutMode::Standard.as_str().to_string()
}
fn default_log_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("veiltext")
        .join("veiltext.log")
}
fn default_message_count() -> usize {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scroll_interval_ms: default_scroll_interval_ms(),
            tick_rate_ms: default_tick_rate_ms(),
            layout_mode: default_layout_mode(),
            frequency_model: None,
            log_file: default_log_file(),
            message_count: default_message_count(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            config.normalize_layout_mode();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// The TOML written by [`Config::save_to`].
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("veiltext")
            .join("config.toml")
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms.max(1))
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn layout_mode(&self) -> LayoutMode {
        LayoutMode::parse(&self.layout_mode)
    }

    /// Rewrite `layout_mode` to its canonical spelling. Unknown values become
    /// `STANDARD`.
    pub fn normalize_layout_mode(&mut self) {
        self.layout_mode = self.layout_mode().as_str().to_string();
    }

    /// The configured custom model, or the built-in tables when none is set.
    pub fn frequency_model(&self) -> Result<FrequencyModel> {
        match &self.frequency_model {
            Some(path) => FrequencyModel::load(path)
                .with_context(|| format!("loading frequency model from {}", path.display())),
            None => Ok(FrequencyModel::shared().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scroll_interval_ms, 100);
        assert_eq!(config.tick_rate_ms, 25);
        assert_eq!(config.layout_mode, "STANDARD");
        assert!(config.frequency_model.is_none());
        assert!(config.log_file.ends_with("veiltext.log"));
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
scroll_interval_ms = 250
layout_mode = "more"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scroll_interval(), Duration::from_millis(250));
        assert_eq!(config.layout_mode(), LayoutMode::More);
        assert_eq!(config.message_count, 24);
    }

    #[test]
    fn test_load_from_normalizes_layout_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "layout_mode = \"garbled\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.layout_mode, "STANDARD");

        fs::write(&path, "layout_mode = \"max\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.layout_mode, "MAX");
    }

    #[test]
    fn test_load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.message_count, 24);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.scroll_interval_ms = 75;
        config.layout_mode = "LESS".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scroll_interval_ms, 75);
        assert_eq!(loaded.layout_mode(), LayoutMode::Less);
    }

    #[test]
    fn test_to_toml_reflects_overrides_and_matches_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.scroll_interval_ms = 40;
        config.message_count = 3;
        config.frequency_model = Some(PathBuf::from("model.toml"));

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("scroll_interval_ms = 40"));
        assert!(rendered.contains("message_count = 3"));
        assert!(rendered.contains("model.toml"));

        config.save_to(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), rendered);
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let mut config = Config::default();
        config.scroll_interval_ms = 0;
        config.tick_rate_ms = 0;
        assert_eq!(config.scroll_interval(), Duration::from_millis(1));
        assert_eq!(config.tick_rate(), Duration::from_millis(1));
    }

    #[test]
    fn test_frequency_model_defaults_to_builtin() {
        let config = Config::default();
        assert_eq!(config.frequency_model().unwrap(), FrequencyModel::build());
    }

    #[test]
    fn test_frequency_model_from_bad_path_errors() {
        let mut config = Config::default();
        config.frequency_model = Some(PathBuf::from("/definitely/not/here.toml"));
        let err = config.frequency_model().unwrap_err();
        assert!(format!("{err:#}").contains("here.toml"));
    }
}
