//! The view state owned by the dashboard task.
//!
//! Only the dashboard loop holds a `ViewState`, so publishes and pagination
//! commands are serialized by ownership. A publish swaps the whole snapshot
//! and re-clamps the cursor against the new total in the same call.

use tracing::debug;

use crate::model::{ProcessRow, Snapshot, SystemStats};
use crate::pagination::{page_count, visible_rows, PageCommand, Pagination};

#[derive(Debug, Default)]
pub struct ViewState {
    snapshot: Snapshot,
    pagination: Pagination,
}

/// Borrowed, already-paginated projection used for one frame.
#[derive(Debug)]
pub struct PageView<'a> {
    pub tick: u64,
    pub stats: &'a SystemStats,
    pub rows: &'a [ProcessRow],
    pub page: usize,
    pub page_count: usize,
    pub total_count: usize,
    pub processes_available: bool,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            snapshot: Snapshot::placeholder(),
            pagination: Pagination::new(page_size),
        }
    }

    /// Replaces the current snapshot. The cursor is clamped strictly from
    /// the incoming total. Returns `true` if the cursor was reset.
    pub fn publish(&mut self, snapshot: Snapshot) -> bool {
        let total = snapshot.total_count();
        self.snapshot = snapshot;
        let reset = self.pagination.clamp(total);
        if reset {
            debug!(
                tick = self.snapshot.tick,
                total, "process list shrank below cursor, reset to first page"
            );
        }
        reset
    }

    /// Applies a pagination command. Returns `true` if the cursor moved.
    pub fn apply(&mut self, command: PageCommand) -> bool {
        self.pagination.apply(command, self.snapshot.total_count())
    }

    #[cfg(test)]
    pub fn current_page(&self) -> usize {
        self.pagination.current_page()
    }

    pub fn tick(&self) -> u64 {
        self.snapshot.tick
    }

    pub fn page(&self) -> PageView<'_> {
        let total = self.snapshot.total_count();
        let page_size = self.pagination.page_size();
        let (rows, page) = visible_rows(
            self.snapshot.rows(),
            total,
            page_size,
            self.pagination.current_page(),
        );

        PageView {
            tick: self.snapshot.tick,
            stats: &self.snapshot.stats,
            rows,
            page,
            page_count: page_count(total, page_size),
            total_count: total,
            processes_available: self.snapshot.processes.is_some(),
        }
    }
}
