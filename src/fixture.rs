//! Fixture files: recorded or synthetic metrics served instead of the host.
//!
//! A missing section makes that metric category fail on every call, which
//! drives the unavailable placeholders end to end.

use std::fs;
use std::path::Path;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FixtureError, MetricError, MetricKind};
use crate::model::{ProcessRow, UsageStats};
use crate::provider::MetricsProvider;

pub const FIXTURE_VERSION: &str = "1.0";

/// Root structure of a fixture JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub version: String,
    pub generated_at: String,
    #[serde(default)]
    pub cpu_per_core: Option<Vec<f32>>,
    #[serde(default)]
    pub memory: Option<UsageStats>,
    #[serde(default)]
    pub disk: Option<UsageStats>,
    #[serde(default)]
    pub processes: Option<Vec<ProcessRow>>,
}

/// Load a fixture from a JSON file.
pub fn load_fixture(path: &Path) -> Result<Fixture, FixtureError> {
    debug!("Loading fixture from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fixture: Fixture = serde_json::from_str(&content).map_err(|source| FixtureError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Loaded fixture version {} generated at {}",
        fixture.version, fixture.generated_at
    );
    Ok(fixture)
}

/// Serves the same fixture on every tick.
pub struct FixtureProvider {
    fixture: Fixture,
}

impl FixtureProvider {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }

    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        load_fixture(path).map(Self::new)
    }
}

fn missing(kind: MetricKind) -> MetricError {
    MetricError::new(kind, "not present in fixture")
}

impl MetricsProvider for FixtureProvider {
    fn cpu_percent_per_core(&mut self) -> Result<Vec<f32>, MetricError> {
        self.fixture
            .cpu_per_core
            .clone()
            .ok_or_else(|| missing(MetricKind::Cpu))
    }

    fn memory_stats(&mut self) -> Result<UsageStats, MetricError> {
        self.fixture.memory.ok_or_else(|| missing(MetricKind::Memory))
    }

    fn disk_stats(&mut self, _path: &Path) -> Result<UsageStats, MetricError> {
        self.fixture.disk.ok_or_else(|| missing(MetricKind::Disk))
    }

    fn list_processes(&mut self) -> Result<Vec<ProcessRow>, MetricError> {
        self.fixture
            .processes
            .clone()
            .ok_or_else(|| missing(MetricKind::Processes))
    }
}

/// Builds a synthetic fixture with random but plausible values.
pub fn generate_fixture(rng: &mut impl Rng, processes: usize, cores: usize) -> Fixture {
    let cpu_per_core = (0..cores.max(1))
        .map(|_| rng.gen_range(0.0..100.0))
        .collect();

    // RAM: 4 GB - 64 GB, disk: 64 GB - 2 TB
    let memory = random_usage(rng, 4 << 30, 64 << 30);
    let disk = random_usage(rng, 64 << 30, 2 << 40);

    let mut pid: u32 = 1;
    let processes = (0..processes)
        .map(|i| {
            let row = generate_random_process(rng, pid, format!("process-{}", i + 1));
            pid += rng.gen_range(1..40);
            row
        })
        .collect();

    Fixture {
        version: FIXTURE_VERSION.to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        cpu_per_core: Some(cpu_per_core),
        memory: Some(memory),
        disk: Some(disk),
        processes: Some(processes),
    }
}

fn random_usage(rng: &mut impl Rng, min_total: u64, max_total: u64) -> UsageStats {
    let total = rng.gen_range(min_total..max_total);
    let used_ratio: f64 = rng.gen_range(0.05..0.95);
    let used = (total as f64 * used_ratio) as u64;
    UsageStats::new(total, used, total - used)
}

/// Generates a random process row. Roughly one in twenty rows has a field
/// marked unavailable, as happens for short-lived or protected processes.
fn generate_random_process(rng: &mut impl Rng, pid: u32, name: String) -> ProcessRow {
    let cpu_percent: f32 = rng.gen_range(0.0..100.0);
    let mem_percent: f32 = rng.gen_range(0.0..10.0);

    ProcessRow {
        pid,
        name: (!rng.gen_bool(0.05)).then_some(name),
        cpu_percent: (!rng.gen_bool(0.05)).then_some(cpu_percent),
        mem_percent: (!rng.gen_bool(0.05)).then_some(mem_percent),
    }
}
