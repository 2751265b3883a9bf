//! Page cursor and window arithmetic.
//!
//! `page` counts the windows already rendered. It is never an index: the
//! next window starts at `page * page_size`.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn first_window(&self) -> Range<usize> {
        0..self.page_size
    }

    pub fn next_window(&self) -> Range<usize> {
        let start = self.page.saturating_mul(self.page_size);
        start..start.saturating_add(self.page_size)
    }

    pub fn advance(&mut self) {
        self.page += 1;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}

/// Clamp a window to a result set of `len` items.
pub fn clip(window: Range<usize>, len: usize) -> Range<usize> {
    let start = window.start.min(len);
    let end = window.end.min(len).max(start);
    start..end
}

pub fn show_more_disabled(len: usize, page_size: usize) -> bool {
    len <= page_size
}

pub fn remaining(len: usize, rendered: usize) -> usize {
    len.saturating_sub(rendered)
}
