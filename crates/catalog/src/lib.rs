//! JSON catalog loading.
//!
//! The catalog is the read-only data boundary of the browser: books, the
//! author and genre name maps, and the page size. Nothing is ever written back.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bookconnect_core::{AuthorMap, Book, BookId, Catalog, DEFAULT_BOOKS_PER_PAGE, GenreMap};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("read catalog {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate book id `{0}`")]
    DuplicateBookId(BookId),
    #[error("books_per_page must be at least 1")]
    EmptyPage,
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_books_per_page")]
    books_per_page: usize,
    #[serde(default)]
    authors: AuthorMap,
    #[serde(default)]
    genres: GenreMap,
    #[serde(default)]
    books: Vec<Book>,
}

fn default_books_per_page() -> usize {
    DEFAULT_BOOKS_PER_PAGE
}

/// The catalog compiled into the binary. It ships no cover files, so every
/// `image` is empty and cards show the missing-cover glyph.
pub fn builtin() -> Result<Catalog> {
    from_json_str(BUILTIN_CATALOG)
}

pub fn load(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = from_json_str(&json)?;
    debug!(path = %path.display(), books = catalog.len(), "catalog file loaded");
    Ok(catalog)
}

pub fn from_json_str(json: &str) -> Result<Catalog> {
    let file: CatalogFile = serde_json::from_str(json)?;
    validate(file)
}

fn validate(file: CatalogFile) -> Result<Catalog> {
    if file.books_per_page == 0 {
        return Err(CatalogError::EmptyPage);
    }

    let mut seen = HashSet::new();
    for book in &file.books {
        if !seen.insert(&book.id) {
            return Err(CatalogError::DuplicateBookId(book.id.clone()));
        }
        if !file.authors.contains(&book.author) {
            warn!(book = %book.id, author = %book.author, "book references unknown author");
        }
        for genre in &book.genres {
            if !file.genres.contains(genre) {
                warn!(book = %book.id, genre = %genre, "book references unknown genre");
            }
        }
    }

    Ok(Catalog {
        books: file.books,
        authors: file.authors,
        genres: file.genres,
        books_per_page: file.books_per_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookconnect_core::{AuthorId, GenreId};

    const SMALL: &str = r#"{
        "books_per_page": 2,
        "authors": {"a2": "Second", "a1": "First"},
        "genres": {"g1": "Fantasy"},
        "books": [
            {"id": "b1", "title": "One", "author": "a1", "image": "one.png",
             "description": "d1", "published": "2001-01-01T00:00:00.000Z", "genres": ["g1"]},
            {"id": "b2", "title": "Two", "author": "a2", "image": "two.png",
             "description": "d2", "published": "2002-01-01T00:00:00.000Z", "genres": []}
        ]
    }"#;

    #[test]
    fn builtin_catalog_is_valid() -> anyhow::Result<()> {
        let catalog = builtin()?;
        assert_eq!(catalog.books_per_page, DEFAULT_BOOKS_PER_PAGE);
        assert!(catalog.len() > catalog.books_per_page);
        for book in &catalog.books {
            assert!(catalog.author_name(&book.author).is_some(), "{}", book.id);
            assert!(book.published_year().is_some(), "{}", book.id);
            assert!(book.image.is_empty(), "{}", book.id);
        }
        Ok(())
    }

    #[test]
    fn parses_small_catalog_in_order() -> anyhow::Result<()> {
        let catalog = from_json_str(SMALL)?;
        assert_eq!(catalog.books_per_page, 2);
        let ids: Vec<_> = catalog.books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        let authors: Vec<_> = catalog.authors.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(authors, vec!["a2", "a1"]);
        assert_eq!(catalog.books[0].genres, vec![GenreId::from("g1")]);
        Ok(())
    }

    #[test]
    fn page_size_defaults_when_absent() -> anyhow::Result<()> {
        let catalog = from_json_str(r#"{"books": []}"#)?;
        assert_eq!(catalog.books_per_page, DEFAULT_BOOKS_PER_PAGE);
        assert!(catalog.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = from_json_str(r#"{"books_per_page": 0}"#).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyPage));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"{"books": [
            {"id": "x", "title": "A", "author": "a", "image": "", "description": "", "published": "2000"},
            {"id": "x", "title": "B", "author": "a", "image": "", "description": "", "published": "2000"}
        ]}"#;
        let err = from_json_str(json).unwrap_err();
        match err {
            CatalogError::DuplicateBookId(id) => assert_eq!(id, BookId::from("x")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tolerates_dangling_author() -> anyhow::Result<()> {
        let json = r#"{"books": [
            {"id": "x", "title": "A", "author": "ghost", "image": "", "description": "", "published": "2000"}
        ]}"#;
        let catalog = from_json_str(json)?;
        assert!(catalog.author_name(&AuthorId::from("ghost")).is_none());
        Ok(())
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("bookconnect-missing-catalog.json");
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("bookconnect-missing-catalog.json"));
    }
}
