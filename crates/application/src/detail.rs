//! Click resolution and the book detail overlay.

use bookconnect_core::{AuthorMap, Book, BookId};

use crate::preview::{PreviewFieldKind, UNDEFINED_AUTHOR};

/// One node on the path from a click target up to the list container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    ListContainer,
    Preview(BookId),
    PreviewPart(PreviewFieldKind),
    Other,
}

/// Walks the ancestry (innermost first) to the nearest preview and returns
/// its book id.
pub fn resolve_clicked_book_id<'a>(
    ancestry: impl IntoIterator<Item = &'a Element>,
) -> Option<&'a BookId> {
    ancestry.into_iter().find_map(|element| match element {
        Element::Preview(id) => Some(id),
        _ => None,
    })
}

/// `"<author> (<year>)"`.
pub fn subtitle(author: Option<&str>, year: Option<i32>) -> String {
    let author = author.unwrap_or(UNDEFINED_AUTHOR);
    match year {
        Some(year) => format!("{author} ({year})"),
        None => format!("{author} (unknown)"),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailOverlay {
    pub open: bool,
    pub book: Option<BookId>,
    pub blur: String,
    pub image: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
}

impl DetailOverlay {
    pub fn show(&mut self, book: &Book, authors: &AuthorMap) {
        self.open = true;
        self.book = Some(book.id.clone());
        self.blur = book.image.clone();
        self.image = book.image.clone();
        self.title = book.title.clone();
        self.subtitle = subtitle(authors.get(&book.author), book.published_year());
        self.description = book.description.clone();
    }

    /// Hides the overlay; the populated fields stay until the next `show`.
    pub fn close(&mut self) {
        self.open = false;
    }
}
