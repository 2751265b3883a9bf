//! Application orchestration layer for Book Connect.
//!
//! [`AppContext`] owns the mutable browser state (result set, page cursor,
//! rendered previews, theme, detail overlay) and exposes one method per user
//! action. It has no terminal dependency, so every flow can be driven from
//! tests.

use std::ops::Range;

use bookconnect_core::{AuthorId, Book, BookId, Catalog, FilterCriteria, GenreId, Theme};
use tracing::{debug, info};

pub mod detail;
pub mod dropdown;
pub mod filter;
pub mod pagination;
pub mod preview;
pub mod theme;

pub use detail::{DetailOverlay, Element, resolve_clicked_book_id};
pub use dropdown::{ALL_AUTHORS_LABEL, ALL_GENRES_LABEL, Select, SelectOption, build_options};
pub use filter::filter_catalog;
pub use pagination::Pagination;
pub use preview::{Preview, PreviewField, PreviewFieldKind, PreviewList};
pub use theme::{ColorTriple, ThemeVars};

#[derive(Debug, Clone)]
pub struct AppContext {
    catalog: Catalog,
    matches: Vec<usize>,
    pagination: Pagination,
    list: PreviewList,
    list_message_visible: bool,
    show_more_disabled: bool,
    genre_options: Vec<SelectOption<GenreId>>,
    author_options: Vec<SelectOption<AuthorId>>,
    theme: Theme,
    theme_vars: ThemeVars,
    detail: DetailOverlay,
}

impl AppContext {
    /// Runs the initialization pass: first window, dropdown batches, theme.
    pub fn new(catalog: Catalog, theme: Theme) -> Self {
        let matches = (0..catalog.books.len()).collect::<Vec<_>>();
        let pagination = Pagination::new(catalog.books_per_page);
        let genre_options = build_options(&catalog.genres, ALL_GENRES_LABEL);
        let author_options = build_options(&catalog.authors, ALL_AUTHORS_LABEL);
        let show_more_disabled =
            pagination::show_more_disabled(matches.len(), pagination.page_size());

        let mut ctx = Self {
            catalog,
            matches,
            pagination,
            list: PreviewList::default(),
            list_message_visible: false,
            show_more_disabled,
            genre_options,
            author_options,
            theme,
            theme_vars: ThemeVars::for_theme(theme),
            detail: DetailOverlay::default(),
        };
        ctx.render_window(ctx.pagination.first_window());
        info!(
            books = ctx.catalog.len(),
            page_size = ctx.pagination.page_size(),
            theme = %theme,
            "browser initialized"
        );
        ctx
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matches(&self) -> impl Iterator<Item = &Book> {
        self.matches.iter().filter_map(|idx| self.catalog.books.get(*idx))
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn page(&self) -> usize {
        self.pagination.page()
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size()
    }

    pub fn previews(&self) -> &PreviewList {
        &self.list
    }

    pub fn list_message_visible(&self) -> bool {
        self.list_message_visible
    }

    pub fn show_more_disabled(&self) -> bool {
        self.show_more_disabled
    }

    /// Matches not yet rendered; shown on the show-more button.
    pub fn show_more_remaining(&self) -> usize {
        pagination::remaining(self.matches.len(), self.list.len())
    }

    pub fn genre_options(&self) -> &[SelectOption<GenreId>] {
        &self.genre_options
    }

    pub fn author_options(&self) -> &[SelectOption<AuthorId>] {
        &self.author_options
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn theme_vars(&self) -> ThemeVars {
        self.theme_vars
    }

    pub fn detail(&self) -> &DetailOverlay {
        &self.detail
    }

    /// Appends a preview for each match in the half-open `window`.
    pub fn render_window(&mut self, window: Range<usize>) {
        let window = pagination::clip(window, self.matches.len());
        debug!(start = window.start, end = window.end, "render window");
        let catalog = &self.catalog;
        let batch = self.matches[window]
            .iter()
            .filter_map(|idx| catalog.books.get(*idx))
            .map(|book| Preview::from_book(book, &catalog.authors))
            .collect::<Vec<_>>();
        self.list.append(batch);
    }

    /// Replaces the result set from the full catalog and re-renders the first
    /// window. Returns the number of matches.
    pub fn submit_search(&mut self, criteria: &FilterCriteria) -> usize {
        let result = filter_catalog(&self.catalog.books, criteria);
        info!(
            title = %criteria.title,
            author = criteria.author.as_value(),
            genre = criteria.genre.as_value(),
            matches = result.len(),
            "search submitted"
        );

        self.pagination.reset();
        self.matches = result;
        self.list.clear();
        self.render_window(self.pagination.first_window());
        self.list_message_visible = self.matches.is_empty();
        self.show_more_disabled =
            pagination::show_more_disabled(self.matches.len(), self.pagination.page_size());
        self.matches.len()
    }

    /// Appends the next window. The disabled flag is left untouched; it only
    /// changes on init and search.
    pub fn show_more(&mut self) {
        let window = self.pagination.next_window();
        self.render_window(window);
        self.pagination.advance();
        debug!(page = self.pagination.page(), rendered = self.list.len(), "show more");
    }

    /// Opens the detail overlay for the preview the click landed in, if any.
    pub fn click_list(&mut self, ancestry: &[Element]) -> bool {
        let Some(id) = resolve_clicked_book_id(ancestry) else {
            debug!("list click outside any preview");
            return false;
        };
        let id = id.clone();
        self.open_detail(&id)
    }

    /// Looks the book up in the unfiltered catalog. Unknown ids are ignored.
    pub fn open_detail(&mut self, id: &BookId) -> bool {
        let Some(book) = self.catalog.find(id) else {
            debug!(book = %id, "detail requested for unknown book");
            return false;
        };
        self.detail.show(book, &self.catalog.authors);
        debug!(book = %id, "detail opened");
        true
    }

    pub fn close_detail(&mut self) {
        self.detail.close();
    }

    pub fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.theme_vars.apply(theme);
        info!(theme = %theme, "theme applied");
    }

    /// Settings form submission; the selector value is read leniently.
    pub fn submit_settings(&mut self, selector_value: &str) {
        self.apply_theme(Theme::from_selector(selector_value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookconnect_core::{AuthorMap, GenreMap};

    fn book(idx: usize, genres: &[&str]) -> Book {
        Book {
            id: BookId::new(format!("b{idx}")),
            title: format!("Book {idx}"),
            author: AuthorId::from(if idx % 2 == 0 { "even" } else { "odd" }),
            image: format!("covers/{idx}.jpg"),
            description: format!("Description {idx}"),
            published: format!("{}-01-01T00:00:00.000Z", 1900 + idx),
            genres: genres.iter().map(|g| GenreId::from(*g)).collect(),
        }
    }

    fn catalog(count: usize, page_size: usize) -> Catalog {
        let books = (0..count)
            .map(|idx| book(idx, if idx < 3 { &["fantasy"] } else { &["drama"] }))
            .collect();
        let authors: AuthorMap = [
            (AuthorId::from("even"), "Eve"),
            (AuthorId::from("odd"), "Otto"),
        ]
        .into_iter()
        .collect();
        let genres: GenreMap = [
            (GenreId::from("fantasy"), "Fantasy"),
            (GenreId::from("drama"), "Drama"),
        ]
        .into_iter()
        .collect();
        Catalog {
            books,
            authors,
            genres,
            books_per_page: page_size,
        }
    }

    #[test]
    fn init_renders_first_window() {
        let ctx = AppContext::new(catalog(25, 10), Theme::Day);
        assert_eq!(ctx.previews().len(), 10);
        assert_eq!(ctx.page(), 1);
        assert!(!ctx.show_more_disabled());
        assert!(!ctx.list_message_visible());
        assert_eq!(ctx.show_more_remaining(), 15);
        assert_eq!(ctx.genre_options().len(), 3);
        assert_eq!(ctx.author_options()[0].label, ALL_AUTHORS_LABEL);
    }

    #[test]
    fn init_disables_show_more_for_single_page() {
        let ctx = AppContext::new(catalog(10, 10), Theme::Day);
        assert!(ctx.show_more_disabled());
        assert_eq!(ctx.previews().len(), 10);
    }

    #[test]
    fn show_more_appends_next_window() {
        let mut ctx = AppContext::new(catalog(25, 10), Theme::Day);
        ctx.show_more();
        assert_eq!(ctx.previews().len(), 20);
        assert_eq!(ctx.page(), 2);
        ctx.show_more();
        assert_eq!(ctx.previews().len(), 25);
        assert_eq!(ctx.page(), 3);
        // Enabled state is only recomputed by a search.
        assert!(!ctx.show_more_disabled());
        ctx.show_more();
        assert_eq!(ctx.previews().len(), 25);
        assert_eq!(ctx.page(), 4);
        assert_eq!(ctx.show_more_remaining(), 0);
    }

    #[test]
    fn search_resets_cursor_and_list() {
        let mut ctx = AppContext::new(catalog(25, 10), Theme::Day);
        ctx.show_more();
        let found = ctx.submit_search(&FilterCriteria::default().with_genre("fantasy"));
        assert_eq!(found, 3);
        assert_eq!(ctx.page(), 1);
        assert_eq!(ctx.previews().len(), 3);
        assert!(ctx.show_more_disabled());
        assert!(!ctx.list_message_visible());
        let ids: Vec<_> = ctx.previews().ids().map(BookId::as_str).collect();
        assert_eq!(ids, vec!["b0", "b1", "b2"]);
    }

    #[test]
    fn search_always_filters_the_full_catalog() {
        let mut ctx = AppContext::new(catalog(25, 10), Theme::Day);
        ctx.submit_search(&FilterCriteria::default().with_genre("fantasy"));
        let found = ctx.submit_search(&FilterCriteria::default().with_author("odd"));
        assert_eq!(found, 12);
        assert_eq!(ctx.previews().len(), 10);
        assert!(!ctx.show_more_disabled());
    }

    #[test]
    fn empty_search_shows_message() {
        let mut ctx = AppContext::new(catalog(25, 10), Theme::Day);
        assert_eq!(ctx.submit_search(&FilterCriteria::title("zzzznotfound")), 0);
        assert!(ctx.list_message_visible());
        assert!(ctx.show_more_disabled());
        assert!(ctx.previews().is_empty());
    }

    #[test]
    fn click_opens_detail_from_unfiltered_catalog() {
        let mut ctx = AppContext::new(catalog(25, 10), Theme::Day);
        ctx.submit_search(&FilterCriteria::default().with_genre("fantasy"));

        assert!(ctx.open_detail(&BookId::from("b20")));
        assert_eq!(ctx.detail().title, "Book 20");
        assert_eq!(ctx.detail().subtitle, "Eve (1920)");
        ctx.close_detail();
        assert!(!ctx.detail().open);
    }

    #[test]
    fn click_without_preview_changes_nothing() {
        let mut ctx = AppContext::new(catalog(5, 10), Theme::Day);
        let before = ctx.detail().clone();
        assert!(!ctx.click_list(&[Element::ListContainer]));
        assert!(!ctx.click_list(&[Element::Preview(BookId::from("missing"))]));
        assert_eq!(ctx.detail(), &before);
    }

    #[test]
    fn click_on_preview_part_bubbles_to_preview() {
        let mut ctx = AppContext::new(catalog(5, 10), Theme::Day);
        let path = [
            Element::PreviewPart(PreviewFieldKind::Image),
            Element::Preview(BookId::from("b3")),
            Element::ListContainer,
        ];
        assert!(ctx.click_list(&path));
        assert!(ctx.detail().open);
        assert_eq!(ctx.detail().image, "covers/3.jpg");
        assert_eq!(ctx.detail().description, "Description 3");
    }

    #[test]
    fn settings_submission_switches_theme() {
        let mut ctx = AppContext::new(catalog(1, 10), Theme::Day);
        ctx.submit_settings("night");
        assert_eq!(ctx.theme(), Theme::Night);
        assert_eq!(ctx.theme_vars(), ThemeVars::for_theme(Theme::Night));
        ctx.submit_settings("bogus");
        assert_eq!(ctx.theme(), Theme::Day);
    }
}
