//! Check command implementation.
//!
//! Queries every metric category once and reports which ones are available.

use std::path::Path;

use anyhow::Result;

use crate::config::{validate_effective_config, Config};
use crate::error::{MetricError, MetricKind};
use crate::provider::MetricsProvider;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

/// Queries each category once; the `Ok` text is a one-line summary.
pub fn check_sources<P: MetricsProvider + ?Sized>(
    provider: &mut P,
    disk_path: &Path,
) -> Vec<(MetricKind, Result<String, MetricError>)> {
    MetricKind::ALL
        .iter()
        .map(|&kind| {
            let outcome = match kind {
                MetricKind::Cpu => provider
                    .cpu_percent_per_core()
                    .map(|cores| format!("{} cores reported", cores.len())),
                MetricKind::Memory => provider.memory_stats().map(|m| {
                    format!(
                        "{:.2}% of {} MB used",
                        m.used_percent,
                        m.total_bytes / MIB
                    )
                }),
                MetricKind::Disk => provider.disk_stats(disk_path).map(|d| {
                    format!(
                        "{:.2}% of {} GB used on {}",
                        d.used_percent,
                        d.total_bytes / GIB,
                        disk_path.display()
                    )
                }),
                MetricKind::Processes => provider
                    .list_processes()
                    .map(|rows| format!("{} processes listed", rows.len())),
            };
            (kind, outcome)
        })
        .collect()
}

/// Validates configuration and metric sources. Returns `false` if anything
/// is unavailable.
pub fn command_check<P: MetricsProvider + ?Sized>(provider: &mut P, config: &Config) -> Result<bool> {
    println!("🔍 procdash - System Check");
    println!("==========================");

    let mut all_ok = true;

    println!("\n📊 Checking metric sources...");
    for (kind, outcome) in check_sources(provider, &config.disk_path()) {
        match outcome {
            Ok(summary) => println!("   ✅ {}: {}", kind, summary),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
    } else {
        println!("   ❌ Some checks failed - affected panels will show n/a");
    }

    Ok(all_ok)
}
