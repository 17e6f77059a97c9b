use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Sampling interval for watch mode, in milliseconds.
    pub interval_ms: u64,
    /// Number of processes shown in the text report.
    pub top: usize,
    /// Process table order: "memory", "cpu", or "pid".
    pub sort: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            interval_ms: 2000,
            top: 15,
            sort: "memory".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// "text" or "json".
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: "text".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hostsnap").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.interval_ms, 2000);
        assert_eq!(config.general.top, 15);
        assert_eq!(config.general.sort, "memory");
        assert_eq!(config.output.format, "text");
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[general]
interval_ms = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.interval_ms, 500);
        // Other fields should be defaults
        assert_eq!(config.general.top, 15);
        assert_eq!(config.output.format, "text");
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[general]
interval_ms = 1000
top = 30
sort = "cpu"

[output]
format = "json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.interval_ms, 1000);
        assert_eq!(config.general.top, 30);
        assert_eq!(config.general.sort, "cpu");
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.general.interval_ms, 2000);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("hostsnap_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.general.interval_ms, 2000);
        let _ = std::fs::remove_file(&temp);
    }
}
