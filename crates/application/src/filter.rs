//! Filter engine: title, author and genre predicates over the full catalog.

use bookconnect_core::{Book, FilterCriteria};

/// All three predicates must hold. The title check is a case-insensitive
/// substring match and is skipped when the submitted title is blank.
pub fn matches(book: &Book, criteria: &FilterCriteria) -> bool {
    let genre = criteria.genre.admits(|genre| book.has_genre(genre));
    let title = criteria.title.trim().is_empty()
        || book
            .title
            .to_lowercase()
            .contains(&criteria.title.to_lowercase());
    let author = criteria.author.admits(|author| *author == book.author);
    genre && title && author
}

/// Positions of the matching books, in catalog order.
pub fn filter_catalog(books: &[Book], criteria: &FilterCriteria) -> Vec<usize> {
    books
        .iter()
        .enumerate()
        .filter(|(_, book)| matches(book, criteria))
        .map(|(idx, _)| idx)
        .collect()
}
