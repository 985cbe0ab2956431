//! Error types for procdash.
//!
//! Metric failures are recoverable and end up as unavailable markers in the
//! published snapshot. Render failures are fatal and stop the dashboard.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metric category acquired independently on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
    Processes,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Disk,
        MetricKind::Processes,
    ];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Disk => "disk",
            MetricKind::Processes => "process list",
        };
        f.write_str(name)
    }
}

/// A single metric category could not be acquired this tick.
#[derive(Debug, Clone, Error)]
#[error("{kind} unavailable: {reason}")]
pub struct MetricError {
    pub kind: MetricKind,
    pub reason: String,
}

impl MetricError {
    pub fn new(kind: MetricKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// The display surface could not draw a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("display surface has zero size ({width}x{height})")]
    ZeroSize { width: u16, height: u16 },

    #[error("terminal I/O failed")]
    Io(#[from] io::Error),
}

/// Loading a fixture file failed.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse fixture file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
