//! Pagination over a process list that changes between ticks.
//!
//! All functions here are pure. The cursor invariant is
//! `current_page * page_size < total_count` whenever `total_count > 0`;
//! every path that could break it clamps back to page 0 instead.

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Pagination command produced by the input dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
    Next,
    Prev,
}

/// Returns the rows of `current_page` and the page actually shown.
///
/// When the page starts at or past the end of the data the cursor clamps to
/// page 0. A `page_size` of zero is treated as one, and `total_count` never
/// reaches beyond `rows`.
pub fn visible_rows<T>(
    rows: &[T],
    total_count: usize,
    page_size: usize,
    current_page: usize,
) -> (&[T], usize) {
    let page_size = page_size.max(1);
    let total = total_count.min(rows.len());

    let mut page = current_page;
    let mut start = page.saturating_mul(page_size);
    if start >= total {
        page = 0;
        start = 0;
    }
    let end = start.saturating_add(page_size).min(total);

    (&rows[start..end], page)
}

/// Number of pages reported in the footer: `total / page_size + 1`.
pub fn page_count(total_count: usize, page_size: usize) -> usize {
    total_count / page_size.max(1) + 1
}

/// Pagination cursor owned by the view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    current_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Applies a command against `total_count`. Returns `true` if the cursor
    /// moved; out-of-range commands are no-ops.
    pub fn apply(&mut self, command: PageCommand, total_count: usize) -> bool {
        match command {
            PageCommand::Next => {
                let next_start = (self.current_page + 1).saturating_mul(self.page_size);
                if next_start < total_count {
                    self.current_page += 1;
                    return true;
                }
            }
            PageCommand::Prev => {
                if self.current_page > 0 {
                    self.current_page -= 1;
                    return true;
                }
            }
        }
        false
    }

    /// Resets the cursor to page 0 if it no longer points into the data.
    /// Returns `true` if a reset happened.
    pub fn clamp(&mut self, total_count: usize) -> bool {
        if self.current_page == 0 {
            return false;
        }
        if self.current_page.saturating_mul(self.page_size) >= total_count {
            self.current_page = 0;
            return true;
        }
        false
    }
}
