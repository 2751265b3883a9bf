//! Core domain types for Book Connect.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Page size used when a catalog does not declare one.
pub const DEFAULT_BOOKS_PER_PAGE: usize = 36;

/// Wire value of the "any" option in the author and genre selectors.
pub const ANY_VALUE: &str = "any";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identity of a book, unique across a catalog.
    BookId
);
string_id!(AuthorId);
string_id!(GenreId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: AuthorId,
    pub image: String,
    pub description: String,
    pub published: String,
    #[serde(default)]
    pub genres: Vec<GenreId>,
}

impl Book {
    /// Calendar year from the leading digits of `published` (`1997-06-26...` -> 1997).
    pub fn published_year(&self) -> Option<i32> {
        let digits = self
            .published
            .trim()
            .split(|c: char| !c.is_ascii_digit())
            .next()?;
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }

    pub fn has_genre(&self, genre: &GenreId) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

/// Id to display-name mapping that keeps input order.
///
/// Iteration order drives dropdown order, so the map is a plain vector of
/// entries rather than a hash map. Inserting an existing id replaces its name
/// in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdNameMap<K> {
    entries: Vec<(K, String)>,
}

pub type AuthorMap = IdNameMap<AuthorId>;
pub type GenreMap = IdNameMap<GenreId>;

impl<K> Default for IdNameMap<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> IdNameMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: K, name: impl Into<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == id) {
            Some(entry) => entry.1 = name,
            None => self.entries.push((id, name)),
        }
    }

    pub fn get(&self, id: &K) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, name)| name.as_str())
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.iter().any(|(key, _)| key == id)
    }
}

impl<K> IdNameMap<K> {
    pub fn iter(&self) -> impl Iterator<Item = (&K, &str)> {
        self.entries.iter().map(|(key, name)| (key, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: PartialEq, N: Into<String>> FromIterator<(K, N)> for IdNameMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, N)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, name) in iter {
            map.insert(id, name);
        }
        map
    }
}

impl<K: Serialize> Serialize for IdNameMap<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(key, name)| (key, name)))
    }
}

impl<'de, K> Deserialize<'de> for IdNameMap<K>
where
    K: Deserialize<'de> + PartialEq,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<K>(PhantomData<K>);

        impl<'de, K> Visitor<'de> for EntriesVisitor<K>
        where
            K: Deserialize<'de> + PartialEq,
        {
            type Value = IdNameMap<K>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of ids to display names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = IdNameMap::new();
                while let Some((id, name)) = access.next_entry::<K, String>()? {
                    map.insert(id, name);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// The read-only dataset the browser works over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub books: Vec<Book>,
    pub authors: AuthorMap,
    pub genres: GenreMap,
    pub books_per_page: usize,
}

impl Catalog {
    pub fn find(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|book| &book.id == id)
    }

    pub fn author_name(&self, id: &AuthorId) -> Option<&str> {
        self.authors.get(id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// A selector value: either the "any" sentinel or one concrete id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection<K> {
    Any,
    Only(K),
}

impl<K> Default for Selection<K> {
    fn default() -> Self {
        Self::Any
    }
}

impl<K> Selection<K> {
    pub fn is_any(&self) -> bool {
        matches!(self, Selection::Any)
    }

    pub fn admits(&self, pred: impl FnOnce(&K) -> bool) -> bool {
        match self {
            Selection::Any => true,
            Selection::Only(id) => pred(id),
        }
    }
}

impl<K: AsRef<str>> Selection<K> {
    pub fn as_value(&self) -> &str {
        match self {
            Selection::Any => ANY_VALUE,
            Selection::Only(id) => id.as_ref(),
        }
    }
}

impl<K: From<String>> Selection<K> {
    pub fn from_value(value: &str) -> Self {
        if value == ANY_VALUE {
            Selection::Any
        } else {
            Selection::Only(K::from(value.to_string()))
        }
    }
}

/// Search form values, constructed fresh for each submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub title: String,
    pub author: Selection<AuthorId>,
    pub genre: Selection<GenreId>,
}

impl FilterCriteria {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<AuthorId>) -> Self {
        self.author = Selection::Only(author.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<GenreId>) -> Self {
        self.genre = Selection::Only(genre.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Day,
    Night,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Day => "day",
            Theme::Night => "night",
        }
    }

    /// Settings selector semantics: only `"night"` selects night.
    pub fn from_selector(value: &str) -> Self {
        if value == "night" {
            Theme::Night
        } else {
            Theme::Day
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Day => Theme::Night,
            Theme::Night => Theme::Day,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Theme::Day),
            "night" => Ok(Theme::Night),
            _ => Err("unknown theme"),
        }
    }
}
