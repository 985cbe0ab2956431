//! CLI command implementations for procdash.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Metric source and configuration validation
//! - `config`: Configuration file generation
//! - `test`: Headless frame rendering
//! - `generate`: Test data generation

pub mod check;
pub mod config;
pub mod generate;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use test::command_test;
