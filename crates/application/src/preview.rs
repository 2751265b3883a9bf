//! Book preview component.
//!
//! A preview carries its book id plus three observed fields. Updates go
//! through [`PreviewField`], one variant per field, and only the addressed
//! field changes.

use bookconnect_core::{AuthorMap, Book, BookId};

/// Label shown when a book's author id is missing from the author map.
pub const UNDEFINED_AUTHOR: &str = "undefined";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewFieldKind {
    Author,
    Image,
    Title,
}

impl PreviewFieldKind {
    pub const ALL: [PreviewFieldKind; 3] = [
        PreviewFieldKind::Author,
        PreviewFieldKind::Image,
        PreviewFieldKind::Title,
    ];

    pub fn attribute(&self) -> &'static str {
        match self {
            PreviewFieldKind::Author => "author",
            PreviewFieldKind::Image => "image",
            PreviewFieldKind::Title => "title",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewField {
    Author(String),
    Image(String),
    Title(String),
}

impl PreviewField {
    pub fn kind(&self) -> PreviewFieldKind {
        match self {
            PreviewField::Author(_) => PreviewFieldKind::Author,
            PreviewField::Image(_) => PreviewFieldKind::Image,
            PreviewField::Title(_) => PreviewFieldKind::Title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    id: BookId,
    author: String,
    image: String,
    title: String,
}

impl Preview {
    pub fn new(id: BookId) -> Self {
        Self {
            id,
            author: String::new(),
            image: String::new(),
            title: String::new(),
        }
    }

    pub fn from_book(book: &Book, authors: &AuthorMap) -> Self {
        let author = authors.get(&book.author).unwrap_or(UNDEFINED_AUTHOR);
        let mut preview = Self::new(book.id.clone());
        preview.apply(PreviewField::Author(author.to_string()));
        preview.apply(PreviewField::Image(book.image.clone()));
        preview.apply(PreviewField::Title(book.title.clone()));
        preview
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    /// Returns `true` when the field's visible value changed.
    pub fn apply(&mut self, field: PreviewField) -> bool {
        let (slot, value) = match field {
            PreviewField::Author(value) => (&mut self.author, value),
            PreviewField::Image(value) => (&mut self.image, value),
            PreviewField::Title(value) => (&mut self.title, value),
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn get(&self, kind: PreviewFieldKind) -> &str {
        match kind {
            PreviewFieldKind::Author => &self.author,
            PreviewFieldKind::Image => &self.image,
            PreviewFieldKind::Title => &self.title,
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// The list container the previews are appended into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewList {
    items: Vec<Preview>,
}

impl PreviewList {
    pub fn append(&mut self, batch: impl IntoIterator<Item = Preview>) {
        self.items.extend(batch);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Preview> {
        self.items.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preview> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &BookId> {
        self.items.iter().map(Preview::id)
    }

    pub fn position(&self, id: &BookId) -> Option<usize> {
        self.items.iter().position(|p| p.id() == id)
    }
}
