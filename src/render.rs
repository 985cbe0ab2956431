//! Frame rendering.
//!
//! The renderer reads the view state and writes to a display surface; it
//! never mutates the model. Unavailable metrics render as [`PLACEHOLDER`].

use std::fmt::Write as FmtWrite;

use crate::error::RenderError;
use crate::model::{ProcessRow, SystemStats, UsageStats};
use crate::surface::{DisplaySurface, TableRow, COLUMNS};
use crate::view::{PageView, ViewState};

pub const PLACEHOLDER: &str = "n/a";

pub const HEADER: [&str; COLUMNS] = ["PID", "Name", "CPU %", "Mem %"];

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug)]
pub struct Renderer {
    accepting: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self { accepting: true }
    }

    /// Stops accepting redraws for the rest of the run.
    pub fn halt(&mut self) {
        self.accepting = false;
    }

    /// Draws one full frame. Returns `Ok(false)` without touching the
    /// surface once halted.
    pub fn draw<S: DisplaySurface + ?Sized>(
        &self,
        view: &ViewState,
        surface: &mut S,
    ) -> Result<bool, RenderError> {
        if !self.accepting {
            return Ok(false);
        }
        let page = view.page();

        surface.begin_frame()?;
        surface.draw_panel(&stats_panel(page.stats, page.tick))?;
        surface.draw_table(&HEADER, &table_rows(page.rows), &footer(&page))?;
        surface.present()?;
        Ok(true)
    }
}

pub fn stats_panel(stats: &SystemStats, tick: u64) -> String {
    let mut out = String::new();

    match stats.sampled_at {
        Some(at) => writeln!(out, "Sampled at {} (tick {})", at.format("%H:%M:%S"), tick).ok(),
        None => writeln!(out, "Waiting for first sample...").ok(),
    };
    writeln!(out).ok();

    match &stats.cpu_per_core {
        Some(cores) => {
            writeln!(out, "CPU Usage:").ok();
            for (i, percent) in cores.iter().enumerate() {
                writeln!(out, "Core {}: {:.2}%", i, percent).ok();
            }
        }
        None => {
            writeln!(out, "CPU Usage: {}", PLACEHOLDER).ok();
        }
    }
    writeln!(out).ok();

    write_usage(&mut out, "Memory", stats.memory.as_ref(), MIB, "MB");
    writeln!(out).ok();
    write_usage(&mut out, "Disk", stats.disk.as_ref(), GIB, "GB");

    out
}

fn write_usage(out: &mut String, label: &str, usage: Option<&UsageStats>, unit: u64, suffix: &str) {
    match usage {
        Some(u) => {
            writeln!(out, "{} Usage: {:.2}%", label, u.used_percent).ok();
            writeln!(out, "Total: {} {}", u.total_bytes / unit, suffix).ok();
            writeln!(out, "Used: {} {}", u.used_bytes / unit, suffix).ok();
            writeln!(out, "Free: {} {}", u.free_bytes / unit, suffix).ok();
        }
        None => {
            writeln!(out, "{} Usage: {}", label, PLACEHOLDER).ok();
        }
    }
}

fn percent_cell(value: Option<f32>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{:.2}", v))
}

pub fn table_rows(rows: &[ProcessRow]) -> Vec<TableRow> {
    rows.iter()
        .map(|row| {
            [
                row.pid.to_string(),
                row.name.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
                percent_cell(row.cpu_percent),
                percent_cell(row.mem_percent),
            ]
        })
        .collect()
}

pub fn footer(page: &PageView<'_>) -> String {
    if page.processes_available {
        format!(
            "Page {}/{} | {} Processes Total",
            page.page + 1,
            page.page_count,
            page.total_count
        )
    } else {
        format!("Page 1/1 | Process list {}", PLACEHOLDER)
    }
}
