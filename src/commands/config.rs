//! Config command implementation.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files
pub fn command_config(output: Option<PathBuf>, format: ConfigFormat, commented: bool) -> Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| {
        PathBuf::from(match format {
            ConfigFormat::Yaml => "procdash.yaml",
            ConfigFormat::Json => "procdash.json",
            ConfigFormat::Toml => "procdash.toml",
        })
    });

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write config to {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration
pub fn add_config_comments(yaml: String) -> String {
    let comments = r#"# procdash Configuration
# ======================
#
# Display
# -------
# page_size: 10                # Process rows per page (>= 1)
# process_order: "pid"         # "pid" (ascending) or "acquisition" (as listed by the OS)
#
# Metrics Collection
# ------------------
# disk_path: "/"               # Mount point shown in the disk panel
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
# log_file: null               # Log file path (null = no logs while the dashboard runs)
"#;

    format!("{comments}\n{yaml}")
}
