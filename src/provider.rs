//! Host metrics acquisition.
//!
//! `MetricsProvider` is the seam between the sampler and the operating
//! system. Each category is fetched on its own so a failure in one never
//! hides the others. `SysinfoProvider` is the live implementation.

use std::path::Path;

use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, System,
};

use crate::error::{MetricError, MetricKind};
use crate::model::{ProcessRow, UsageStats};

/// Source of host metrics. Calls may block on OS queries.
pub trait MetricsProvider {
    fn cpu_percent_per_core(&mut self) -> Result<Vec<f32>, MetricError>;
    fn memory_stats(&mut self) -> Result<UsageStats, MetricError>;
    fn disk_stats(&mut self, path: &Path) -> Result<UsageStats, MetricError>;
    fn list_processes(&mut self) -> Result<Vec<ProcessRow>, MetricError>;
}

impl<P: MetricsProvider + ?Sized> MetricsProvider for Box<P> {
    fn cpu_percent_per_core(&mut self) -> Result<Vec<f32>, MetricError> {
        (**self).cpu_percent_per_core()
    }

    fn memory_stats(&mut self) -> Result<UsageStats, MetricError> {
        (**self).memory_stats()
    }

    fn disk_stats(&mut self, path: &Path) -> Result<UsageStats, MetricError> {
        (**self).disk_stats(path)
    }

    fn list_processes(&mut self) -> Result<Vec<ProcessRow>, MetricError> {
        (**self).list_processes()
    }
}

/// Live metrics from the host via `sysinfo`.
///
/// CPU percentages are deltas between refreshes, so the first tick after
/// construction reports usage since `new()`.
pub struct SysinfoProvider {
    system: System,
    disks: Disks,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_specifics(CpuRefreshKind::nothing().with_cpu_usage());
        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for SysinfoProvider {
    fn cpu_percent_per_core(&mut self) -> Result<Vec<f32>, MetricError> {
        self.system
            .refresh_cpu_specifics(CpuRefreshKind::nothing().with_cpu_usage());

        let readings: Vec<f32> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| cpu.cpu_usage())
            .collect();
        core_percentages(&readings)
    }

    fn memory_stats(&mut self) -> Result<UsageStats, MetricError> {
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        let total = self.system.total_memory();
        if total == 0 {
            return Err(MetricError::new(MetricKind::Memory, "total memory reported as 0"));
        }
        Ok(UsageStats::new(
            total,
            self.system.used_memory(),
            self.system.free_memory(),
        ))
    }

    fn disk_stats(&mut self, path: &Path) -> Result<UsageStats, MetricError> {
        self.disks.refresh(true);

        let mounts: Vec<&Path> = self.disks.iter().map(|d| d.mount_point()).collect();
        let index = select_mount(&mounts, path).ok_or_else(|| {
            MetricError::new(
                MetricKind::Disk,
                format!("no mounted filesystem contains {}", path.display()),
            )
        })?;

        let disk = &self.disks.list()[index];
        let total = disk.total_space();
        if total == 0 {
            return Err(MetricError::new(
                MetricKind::Disk,
                format!("{} reports a size of 0", disk.mount_point().display()),
            ));
        }
        let free = disk.available_space();
        Ok(UsageStats::new(total, total.saturating_sub(free), free))
    }

    fn list_processes(&mut self) -> Result<Vec<ProcessRow>, MetricError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        if self.system.total_memory() == 0 {
            self.system
                .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        }
        let total_memory = self.system.total_memory();

        let rows: Vec<ProcessRow> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let name = process.name().to_string_lossy();
                ProcessRow {
                    pid: pid.as_u32(),
                    name: (!name.is_empty()).then(|| name.into_owned()),
                    cpu_percent: finite(process.cpu_usage()),
                    mem_percent: memory_percent(process.memory(), total_memory),
                }
            })
            .collect();

        if rows.is_empty() {
            return Err(MetricError::new(MetricKind::Processes, "process table is empty"));
        }
        Ok(rows)
    }
}

/// Picks the mount point that contains `path` with the most path components.
pub fn select_mount(mounts: &[&Path], path: &Path) -> Option<usize> {
    mounts
        .iter()
        .enumerate()
        .filter(|(_, mount)| path.starts_with(mount))
        .max_by_key(|(_, mount)| mount.components().count())
        .map(|(index, _)| index)
}

/// Per-core usage clamped to 0..=100. A non-finite reading fails the whole
/// category rather than showing up as a plausible number.
fn core_percentages(readings: &[f32]) -> Result<Vec<f32>, MetricError> {
    if readings.is_empty() {
        return Err(MetricError::new(MetricKind::Cpu, "no logical cores reported"));
    }
    readings
        .iter()
        .enumerate()
        .map(|(core, &value)| {
            finite(value).map(|v| v.clamp(0.0, 100.0)).ok_or_else(|| {
                MetricError::new(
                    MetricKind::Cpu,
                    format!("core {} reported a non-finite usage", core),
                )
            })
        })
        .collect()
}

fn finite(value: f32) -> Option<f32> {
    value.is_finite().then_some(value)
}

/// Resident memory of a process as a percentage of total RAM.
fn memory_percent(process_bytes: u64, total_bytes: u64) -> Option<f32> {
    if total_bytes == 0 {
        return None;
    }
    Some((process_bytes as f64 / total_bytes as f64 * 100.0) as f32)
}
