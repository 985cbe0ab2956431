//! CLI arguments and subcommands for procdash.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogLevel;
use crate::sampler::ProcessOrder;

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procdash",
    about = "Live terminal dashboard for CPU, memory, disk and process metrics",
    long_about = "Live terminal dashboard for CPU, memory, disk and process metrics.\n\n\
                  Samples the host once per second and shows per-core CPU usage, memory and \
                  disk usage next to a paginated process table. Use Left/Right to page \
                  and Ctrl+Q to quit.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Log level [default: info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Process rows per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Mount point shown in the disk panel
    #[arg(long)]
    pub disk_path: Option<PathBuf>,

    /// Ordering of process rows
    #[arg(long, value_enum)]
    pub process_order: Option<ProcessOrder>,

    /// Path to JSON test data file (uses fixture data instead of the live host)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query every metric source once and report availability
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Render frames headlessly to stdout
    Test {
        /// Number of ticks to sample
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Print every page of the process table, not just the first
        #[arg(long)]
        verbose: bool,
    },

    /// Generate synthetic test data JSON file
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "testdata.json")]
        output: PathBuf,

        /// Number of processes to generate
        #[arg(long, default_value_t = 40)]
        processes: usize,

        /// Number of CPU cores to generate
        #[arg(long, default_value_t = 4)]
        cores: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_dashboard_options() {
        let args = Args::parse_from([
            "procdash",
            "--page-size",
            "20",
            "--process-order",
            "acquisition",
            "--log-level",
            "debug",
            "-t",
            "fixture.json",
        ]);
        assert!(args.command.is_none());
        assert_eq!(args.page_size, Some(20));
        assert_eq!(args.process_order, Some(ProcessOrder::Acquisition));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.test_data_file, Some(PathBuf::from("fixture.json")));
    }

    #[test]
    fn test_parses_subcommands() {
        let args = Args::parse_from(["procdash", "test", "-n", "3", "--verbose"]);
        assert!(matches!(
            args.command,
            Some(Commands::Test {
                iterations: 3,
                verbose: true
            })
        ));

        let args = Args::parse_from(["procdash", "generate-testdata", "--cores", "8"]);
        assert!(matches!(
            args.command,
            Some(Commands::GenerateTestdata {
                processes: 40,
                cores: 8,
                ..
            })
        ));
    }
}
