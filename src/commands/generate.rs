//! Generate testdata command implementation.
//!
//! Writes a synthetic fixture JSON file that `--test-data-file` can replay.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::fixture::generate_fixture;

/// Generates synthetic test data JSON file for testing purposes.
pub fn command_generate_testdata(output: PathBuf, processes: usize, cores: usize) -> Result<()> {
    debug!(
        "Generating test data: processes={}, cores={}, output={}",
        processes,
        cores,
        output.display()
    );

    let mut rng = rand::thread_rng();
    let fixture = generate_fixture(&mut rng, processes, cores);

    let json_content = serde_json::to_string_pretty(&fixture)?;
    fs::write(&output, &json_content)
        .with_context(|| format!("Failed to write test data to {}", output.display()))?;

    println!(
        "✅ Generated test data: {} processes, {} cores in {}",
        processes,
        cores.max(1),
        output.display()
    );

    Ok(())
}
