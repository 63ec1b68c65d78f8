use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub symbol_map: SymbolMapConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub template: Option<PathBuf>, // built-in page when absent
    pub datasets: Option<PathBuf>, // JSON override of the built-in portfolio
    pub base_map_url: String,
    pub base_map_object: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            template: None,
            datasets: None,
            base_map_url: "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json".to_string(),
            base_map_object: "countries".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub dotmap_width: f64,
    pub symbolmap_width: f64,
    pub graph_width: f64,
    pub graph_height: f64,
    pub timeline_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dotmap_width: 960.0,
            symbolmap_width: 960.0,
            graph_width: 900.0,
            graph_height: 700.0,
            timeline_width: 1100.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SymbolMapConfig {
    pub lifespan_ms: u64,
    pub interval_ms: u64,
    pub marker_radius: f64,
    pub enter_ms: u64,
    pub exit_ms: u64,
}

impl Default for SymbolMapConfig {
    fn default() -> Self {
        Self {
            lifespan_ms: 15_000,
            interval_ms: 2_000,
            marker_radius: 5.0,
            enter_ms: 500,
            exit_ms: 1_000,
        }
    }
}

impl SymbolMapConfig {
    pub fn lifespan(&self) -> Duration {
        Duration::from_millis(self.lifespan_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub site_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [output]
            site_dir = "site"

            [server]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.symbol_map.lifespan(), Duration::from_secs(15));
        assert_eq!(config.symbol_map.interval(), Duration::from_secs(2));
        assert_eq!(config.input.base_map_object, "countries");
        assert_eq!(config.layout.dotmap_width, 960.0);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_toml(
            r#"
            [symbol_map]
            lifespan_ms = 4000

            [output]
            site_dir = "out"

            [server]
            port = 3000
            "#,
        )
        .unwrap();
        assert_eq!(config.symbol_map.lifespan_ms, 4000);
        assert_eq!(config.symbol_map.interval_ms, 2000);
    }

    #[test]
    fn sample_config_parses() {
        let config = AppConfig::from_toml(include_str!("../config.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.layout.graph_height, 700.0);
        assert!(config.input.template.is_none());
    }

    #[test]
    fn missing_output_section_is_rejected() {
        assert!(AppConfig::from_toml("[server]\nport = 1").is_err());
    }
}
