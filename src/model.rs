//! Snapshot data model shared by the sampler, the view state and the renderer.
//!
//! Every value here is built once per sampling tick and never mutated after
//! it has been published. A metric that could not be acquired is `None`,
//! which the renderer shows as a placeholder instead of a misleading zero.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Capacity usage of a memory pool or a filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub used_percent: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl UsageStats {
    /// Builds usage from absolute byte counts; `used_percent` is derived.
    pub fn new(total_bytes: u64, used_bytes: u64, free_bytes: u64) -> Self {
        let used_percent = if total_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / total_bytes as f64 * 100.0
        };
        Self {
            used_percent,
            total_bytes,
            used_bytes,
            free_bytes,
        }
    }
}

/// Host-wide statistics for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemStats {
    /// Usage percentage per logical core, in core order.
    pub cpu_per_core: Option<Vec<f32>>,
    pub memory: Option<UsageStats>,
    pub disk: Option<UsageStats>,
    /// Wall-clock time the tick started. `None` until the first sample.
    pub sampled_at: Option<DateTime<Local>>,
}

/// One line of the process table.
///
/// Fields that could not be read are `None`; the row is kept regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: Option<String>,
    pub cpu_percent: Option<f32>,
    pub mem_percent: Option<f32>,
}

/// The process list captured in one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessTable {
    rows: Vec<ProcessRow>,
    total_count: usize,
}

impl ProcessTable {
    pub fn new(rows: Vec<ProcessRow>) -> Self {
        let total_count = rows.len();
        Self { rows, total_count }
    }

    pub fn rows(&self) -> &[ProcessRow] {
        &self.rows
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }
}

/// Everything one sampling tick produced. Published as a single unit so the
/// stats panel and the process table always come from the same tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Monotonic tick number, starting at 1. Zero is the startup placeholder.
    pub tick: u64,
    pub stats: SystemStats,
    /// `None` when the process list could not be acquired.
    pub processes: Option<ProcessTable>,
}

impl Snapshot {
    /// Placeholder shown before the first tick has been published.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn total_count(&self) -> usize {
        self.processes.as_ref().map_or(0, ProcessTable::total_count)
    }

    pub fn rows(&self) -> &[ProcessRow] {
        self.processes.as_ref().map_or(&[], ProcessTable::rows)
    }
}
