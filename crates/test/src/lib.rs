//! Test helpers and fixtures.

use bookconnect_core::{AuthorId, AuthorMap, Book, BookId, Catalog, GenreId, GenreMap};

pub fn make_book(id: &str, title: &str, author: &str, genres: &[&str]) -> Book {
    Book {
        id: BookId::from(id),
        title: title.to_string(),
        author: AuthorId::from(author),
        image: format!("covers/{id}.jpg"),
        description: format!("About {title}."),
        published: "2004-05-06T00:00:00.000Z".to_string(),
        genres: genres.iter().map(|g| GenreId::from(*g)).collect(),
    }
}

/// `count` books; the first `fantasy` of them are tagged `fantasy`, the rest
/// `drama`. Authors alternate between `a1` and `a2`.
pub fn make_catalog(count: usize, fantasy: usize, books_per_page: usize) -> Catalog {
    let books = (0..count)
        .map(|idx| {
            let genre = if idx < fantasy { "fantasy" } else { "drama" };
            let author = if idx % 2 == 0 { "a1" } else { "a2" };
            make_book(&format!("book-{idx}"), &format!("Volume {idx}"), author, &[genre])
        })
        .collect();
    Catalog {
        books,
        authors: make_authors(),
        genres: make_genres(),
        books_per_page,
    }
}

pub fn make_authors() -> AuthorMap {
    [
        (AuthorId::from("a1"), "Ursula Vale"),
        (AuthorId::from("a2"), "Tomas Reed"),
    ]
    .into_iter()
    .collect()
}

pub fn make_genres() -> GenreMap {
    [
        (GenreId::from("fantasy"), "Fantasy"),
        (GenreId::from("drama"), "Drama"),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_catalog() {
        let catalog = make_catalog(25, 3, 10);
        assert_eq!(catalog.len(), 25);
        assert_eq!(catalog.books_per_page, 10);
        let fantasy = catalog
            .books
            .iter()
            .filter(|b| b.has_genre(&GenreId::from("fantasy")))
            .count();
        assert_eq!(fantasy, 3);
    }
}
