//! Card grid geometry and click hit testing.

use bookconnect_application::{Element, PreviewFieldKind, PreviewList};
use ratatui::layout::Rect;

pub(crate) const CARD_MIN_WIDTH: u16 = 30;
pub(crate) const CARD_HEIGHT: u16 = 6;
pub(crate) const COVER_WIDTH: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GridLayout {
    pub area: Rect,
    pub columns: usize,
    pub card_width: u16,
}

impl GridLayout {
    pub fn new(area: Rect) -> Self {
        let columns = (area.width / CARD_MIN_WIDTH).max(1);
        let card_width = area.width / columns;
        Self {
            area,
            columns: usize::from(columns),
            card_width,
        }
    }

    pub fn visible_rows(&self) -> usize {
        usize::from(self.area.height / CARD_HEIGHT).max(1)
    }

    pub fn row_of(&self, idx: usize) -> usize {
        idx / self.columns
    }

    /// Adjusts `scroll_row` so the row holding `idx` is on screen.
    pub fn scroll_to_show(&self, idx: usize, scroll_row: usize) -> usize {
        let row = self.row_of(idx);
        let visible = self.visible_rows();
        if row < scroll_row {
            row
        } else if row >= scroll_row + visible {
            row + 1 - visible
        } else {
            scroll_row
        }
    }

    pub fn card_rect(&self, idx: usize, scroll_row: usize) -> Option<Rect> {
        let row = self.row_of(idx);
        if row < scroll_row || row >= scroll_row + self.visible_rows() {
            return None;
        }
        let col = (idx % self.columns) as u16;
        let rel_row = (row - scroll_row) as u16;
        let rect = Rect::new(
            self.area.x + col * self.card_width,
            self.area.y + rel_row * CARD_HEIGHT,
            self.card_width,
            CARD_HEIGHT.min(self.area.height),
        );
        Some(rect)
    }

    pub fn index_at(&self, column: u16, row: u16, scroll_row: usize) -> Option<usize> {
        if !contains(self.area, column, row) || self.card_width == 0 {
            return None;
        }
        let col = usize::from((column - self.area.x) / self.card_width);
        if col >= self.columns {
            return None;
        }
        let rel_row = usize::from((row - self.area.y) / CARD_HEIGHT);
        Some((scroll_row + rel_row) * self.columns + col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CardParts {
    pub cover: Rect,
    pub title: Rect,
    pub author: Rect,
}

/// Splits a bordered card into cover, title and author regions.
pub(crate) fn card_parts(card: Rect) -> CardParts {
    let inner = Rect::new(
        card.x.saturating_add(1),
        card.y.saturating_add(1),
        card.width.saturating_sub(2),
        card.height.saturating_sub(2),
    );
    let cover_width = COVER_WIDTH.min(inner.width);
    let text_x = inner.x + cover_width + 1;
    let text_width = inner.width.saturating_sub(cover_width + 1);
    let title_height = inner.height.saturating_sub(1);
    CardParts {
        cover: Rect::new(inner.x, inner.y, cover_width, inner.height),
        title: Rect::new(text_x, inner.y, text_width, title_height),
        author: Rect::new(text_x, inner.y + title_height, text_width, inner.height.min(1)),
    }
}

/// Ancestry of whatever sits under a click inside the list area, innermost
/// first. Empty when the click is outside the list.
pub(crate) fn target_at(
    layout: &GridLayout,
    scroll_row: usize,
    previews: &PreviewList,
    column: u16,
    row: u16,
) -> Vec<Element> {
    if !contains(layout.area, column, row) {
        return Vec::new();
    }

    let mut path = Vec::with_capacity(3);
    let hit = layout
        .index_at(column, row, scroll_row)
        .and_then(|idx| previews.get(idx).map(|preview| (idx, preview)));
    if let Some((idx, preview)) = hit
        && let Some(card) = layout.card_rect(idx, scroll_row)
        && contains(card, column, row)
    {
        let parts = card_parts(card);
        if contains(parts.cover, column, row) {
            path.push(Element::PreviewPart(PreviewFieldKind::Image));
        } else if contains(parts.title, column, row) {
            path.push(Element::PreviewPart(PreviewFieldKind::Title));
        } else if contains(parts.author, column, row) {
            path.push(Element::PreviewPart(PreviewFieldKind::Author));
        }
        path.push(Element::Preview(preview.id().clone()));
    }
    path.push(Element::ListContainer);
    path
}

pub(crate) fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && row >= rect.y
        && u32::from(column) < u32::from(rect.x) + u32::from(rect.width)
        && u32::from(row) < u32::from(rect.y) + u32::from(rect.height)
}
