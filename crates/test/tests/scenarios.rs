use bookconnect_application::{AppContext, Element, PreviewFieldKind, ThemeVars};
use bookconnect_core::{BookId, FilterCriteria, Theme};
use bookconnect_test::{make_book, make_catalog};

#[test]
fn paging_then_genre_search() {
    let mut ctx = AppContext::new(make_catalog(25, 3, 10), Theme::Day);
    assert_eq!(ctx.previews().len(), 10);
    assert!(!ctx.show_more_disabled());

    ctx.show_more();
    assert_eq!(ctx.previews().len(), 20);
    assert!(!ctx.show_more_disabled());

    ctx.submit_search(&FilterCriteria::default().with_genre("fantasy"));
    assert_eq!(ctx.previews().len(), 3);
    assert!(ctx.show_more_disabled());
    assert!(!ctx.list_message_visible());
}

#[test]
fn search_without_matches() {
    let mut ctx = AppContext::new(make_catalog(25, 3, 10), Theme::Day);
    ctx.submit_search(&FilterCriteria::title("zzzznotfound"));
    assert_eq!(ctx.match_count(), 0);
    assert!(ctx.list_message_visible());
    assert!(ctx.show_more_disabled());
    assert!(ctx.previews().is_empty());
}

#[test]
fn rendered_count_follows_show_more_clicks() {
    for clicks in 0..4 {
        let mut ctx = AppContext::new(make_catalog(25, 3, 10), Theme::Day);
        ctx.submit_search(&FilterCriteria::default());
        assert_eq!(ctx.previews().len(), 10);
        for _ in 0..clicks {
            ctx.show_more();
        }
        assert_eq!(ctx.previews().len(), ((clicks + 1) * 10).min(25));
    }
}

#[test]
fn clicking_preview_opens_detail() {
    let mut catalog = make_catalog(5, 0, 10);
    let mut book = make_book("abc123", "The Long Road", "a2", &["drama"]);
    book.published = "1987-03-14T00:00:00.000Z".to_string();
    book.description = "Two travellers and one map.".to_string();
    catalog.books.push(book);

    let mut ctx = AppContext::new(catalog, Theme::Day);
    let path = [
        Element::PreviewPart(PreviewFieldKind::Title),
        Element::Preview(BookId::from("abc123")),
        Element::ListContainer,
    ];
    assert!(ctx.click_list(&path));

    let detail = ctx.detail();
    assert!(detail.open);
    assert_eq!(detail.image, "covers/abc123.jpg");
    assert_eq!(detail.blur, "covers/abc123.jpg");
    assert_eq!(detail.title, "The Long Road");
    assert_eq!(detail.subtitle, "Tomas Reed (1987)");
    assert_eq!(detail.description, "Two travellers and one map.");
}

#[test]
fn clicking_empty_container_space_does_nothing() {
    let mut ctx = AppContext::new(make_catalog(5, 0, 10), Theme::Day);
    assert!(!ctx.click_list(&[Element::ListContainer]));
    assert!(!ctx.detail().open);
    assert!(ctx.detail().title.is_empty());
}

#[test]
fn theme_round_trip() {
    let mut ctx = AppContext::new(make_catalog(1, 0, 10), Theme::Day);
    let day = ctx.theme_vars();

    ctx.apply_theme(Theme::Night);
    let night = ctx.theme_vars();
    assert_eq!(night.color_dark.to_string(), "255, 255, 255");
    assert_eq!(night.color_light.to_string(), "10, 10, 20");

    ctx.apply_theme(Theme::Day);
    assert_eq!(ctx.theme_vars(), day);
    assert_eq!(day, ThemeVars::for_theme(Theme::Day));
}

#[test]
fn builtin_catalog_browses() -> anyhow::Result<()> {
    let catalog = bookconnect_catalog::builtin()?;
    let total = catalog.len();
    let page_size = catalog.books_per_page;
    let mut ctx = AppContext::new(catalog, Theme::Night);
    assert_eq!(ctx.previews().len(), page_size.min(total));
    assert_eq!(ctx.show_more_disabled(), total <= page_size);

    let found = ctx.submit_search(&FilterCriteria::title("the").with_genre("mystery"));
    assert!(found > 0);
    assert!(ctx.matches().all(|b| b.title.to_lowercase().contains("the")));
    Ok(())
}
