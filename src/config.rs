//! Configuration loading, merging and validation.
//!
//! Precedence is CLI > config file > defaults. Files may be YAML, JSON or
//! TOML; the extension decides, YAML otherwise.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::{Args, ConfigFormat};
use crate::logging::LogLevel;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::sampler::ProcessOrder;

pub const DEFAULT_DISK_PATH: &str = "/";

const DEFAULT_LOCATIONS: [&str; 8] = [
    "/etc/procdash/procdash.yaml",
    "/etc/procdash/procdash.yml",
    "/etc/procdash/procdash.json",
    "/etc/procdash/procdash.toml",
    "./procdash.yaml",
    "./procdash.yml",
    "./procdash.json",
    "./procdash.toml",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Display
    #[serde(alias = "page-size")]
    pub page_size: Option<usize>,
    #[serde(alias = "process-order")]
    pub process_order: Option<ProcessOrder>,

    // Metrics collection
    #[serde(alias = "disk-path")]
    pub disk_path: Option<PathBuf>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<LogLevel>,
    #[serde(alias = "log-file")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            process_order: Some(ProcessOrder::default()),
            disk_path: Some(PathBuf::from(DEFAULT_DISK_PATH)),
            log_level: Some(LogLevel::Info),
            log_file: None,
        }
    }
}

impl Config {
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn process_order(&self) -> ProcessOrder {
        self.process_order.unwrap_or_default()
    }

    pub fn disk_path(&self) -> PathBuf {
        self.disk_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DISK_PATH))
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or(LogLevel::Info)
    }

    /// Fills fields the file left out with the defaults.
    fn with_defaults(self) -> Self {
        let defaults = Config::default();
        Self {
            page_size: self.page_size.or(defaults.page_size),
            process_order: self.process_order.or(defaults.process_order),
            disk_path: self.disk_path.or(defaults.disk_path),
            log_level: self.log_level.or(defaults.log_level),
            log_file: self.log_file,
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<()> {
    if cfg.page_size() == 0 {
        bail!("page_size must be at least 1");
    }

    if cfg.disk_path().as_os_str().is_empty() {
        bail!("disk_path must not be empty");
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(page_size) = args.page_size {
        config.page_size = Some(page_size);
    }
    if let Some(path) = &args.disk_path {
        config.disk_path = Some(path.clone());
    }
    if let Some(order) = args.process_order {
        config.process_order = Some(order);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level);
    }
    if let Some(path) = &args.log_file {
        config.log_file = Some(path.clone());
    }

    Ok(config)
}

/// Loads the explicit path if given, otherwise the first existing default
/// location. No file at all yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_LOCATIONS.iter().map(Path::new).find(|p| p.exists()) {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(config.with_defaults())
}

pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.page_size(), 10);
        assert_eq!(cfg.disk_path(), PathBuf::from("/"));
        assert_eq!(cfg.process_order(), ProcessOrder::Pid);
        assert_eq!(cfg.log_level(), LogLevel::Info);
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_load_yaml_with_dashed_keys() {
        let file = write_config(".yaml", "page-size: 25\ndisk_path: /data\n");
        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.page_size(), 25);
        assert_eq!(cfg.disk_path(), PathBuf::from("/data"));
        assert_eq!(cfg.process_order(), ProcessOrder::Pid);
    }

    #[test]
    fn test_load_json_and_toml() {
        let json = write_config(".json", r#"{"process_order": "acquisition", "log_level": "debug"}"#);
        let cfg = load_config(Some(json.path())).unwrap();
        assert_eq!(cfg.process_order(), ProcessOrder::Acquisition);
        assert_eq!(cfg.log_level(), LogLevel::Debug);

        let toml = write_config(".toml", "page_size = 3\nlog_file = \"/tmp/procdash.log\"\n");
        let cfg = load_config(Some(toml.path())).unwrap();
        assert_eq!(cfg.page_size(), 3);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/procdash.log")));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let file = write_config(".json", "{ not json");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config(".yaml", "page_size: 25\ndisk_path: /data\n");
        let path = file.path().to_str().unwrap();
        let args = Args::parse_from(["procdash", "-c", path, "--page-size", "5"]);

        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.page_size(), 5);
        assert_eq!(cfg.disk_path(), PathBuf::from("/data"));
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let args = Args::parse_from(["procdash", "--no-config", "--process-order", "acquisition"]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.process_order(), ProcessOrder::Acquisition);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cfg = Config {
            page_size: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            disk_path: Some(PathBuf::new()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_render_config_formats() {
        let cfg = Config::default();
        assert!(render_config(&cfg, ConfigFormat::Yaml)
            .unwrap()
            .contains("page_size: 10"));
        assert!(render_config(&cfg, ConfigFormat::Json)
            .unwrap()
            .contains("\"page_size\": 10"));
        assert!(render_config(&cfg, ConfigFormat::Toml)
            .unwrap()
            .contains("page_size = 10"));
    }
}
