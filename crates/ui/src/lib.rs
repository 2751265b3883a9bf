//! ratatui-based UI.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use bookconnect_application::{AppContext, ColorTriple, Preview, Select, ThemeVars};
use bookconnect_core::{AuthorId, FilterCriteria, GenreId, Theme};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui_image::Image as ImageWidget;
use ratatui_image::picker::Picker;
use tracing::{debug, info};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

mod cover;
mod graphics;
mod grid;

use cover::{CoverStore, CoverVariant};
use grid::{GridLayout, card_parts, contains, target_at};

const APP_TITLE: &str = "Book Connect";
const NO_RESULTS_MESSAGE: &str = "No results found. Your filters might be too narrow.";
const BROKEN_COVER: &str = "▧";
const DETAIL_COVER_WIDTH: u16 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiExit {
    Quit,
}

pub struct Ui {
    ctx: AppContext,
    search_panel: SearchPanel,
    settings_panel: SettingsPanel,
    grid: GridState,
    hits: HitAreas,
    covers: CoverStore,
    image_picker: Picker,
}

impl Ui {
    /// `cover_dir` is where relative cover paths resolve, normally the
    /// catalog file's directory.
    pub fn new(ctx: AppContext, cover_dir: Option<PathBuf>) -> Self {
        let search_panel = SearchPanel::new(&ctx);
        let settings_panel = SettingsPanel {
            open: false,
            theme: ctx.theme(),
        };
        Self {
            ctx,
            search_panel,
            settings_panel,
            grid: GridState::default(),
            hits: HitAreas::default(),
            covers: CoverStore::new(cover_dir),
            image_picker: Picker::halfblocks(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = setup_terminal()?;
        self.image_picker = graphics::build_picker(picker_background(self.ctx.theme_vars()));
        terminal.clear().ok();
        info!(rendered = self.ctx.previews().len(), "ui started");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Err(err)), Ok(())) => Err(err),
            (Ok(_), Err(err)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(250);
        let mut needs_redraw = true;

        loop {
            if needs_redraw {
                terminal
                    .draw(|frame| self.draw(frame.area(), frame))
                    .context("draw frame")?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate).context("poll terminal events")? {
                continue;
            }

            let event = event::read().context("read terminal event")?;
            needs_redraw = true;
            if let Some(UiExit::Quit) = self.handle_event(event) {
                info!("ui quit");
                return Ok(());
            }
        }
    }

    fn accent_color(&self) -> Color {
        match self.ctx.theme() {
            Theme::Day => Color::Blue,
            Theme::Night => Color::Yellow,
        }
    }

    fn palette(&self) -> Palette {
        let vars = self.ctx.theme_vars();
        let muted = match self.ctx.theme() {
            Theme::Day => Color::DarkGray,
            Theme::Night => Color::Gray,
        };
        Palette {
            fg: rgb(vars.color_dark),
            bg: rgb(vars.color_light),
            accent: self.accent_color(),
            muted,
        }
    }

    fn overlay_open(&self) -> bool {
        self.settings_panel.open || self.search_panel.open || self.ctx.detail().open
    }

    fn handle_event(&mut self, event: Event) -> Option<UiExit> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                None
            }
            _ => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(UiExit::Quit);
        }

        if self.settings_panel.open {
            self.handle_settings_panel_key(key);
            None
        } else if self.search_panel.open {
            self.handle_search_panel_key(key);
            None
        } else if self.ctx.detail().open {
            self.handle_detail_key(key);
            None
        } else {
            self.handle_main_key(key)
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        let columns = self.grid.layout.map_or(1, |layout| layout.columns);
        let visible_rows = self.grid.layout.map_or(1, |layout| layout.visible_rows());
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(UiExit::Quit),
            KeyCode::Char('/') => self.open_search_panel(),
            KeyCode::Char('s') => self.open_settings_panel(),
            KeyCode::Char('m') => self.request_show_more(),
            KeyCode::Left => self.move_selection(-1),
            KeyCode::Right => self.move_selection(1),
            KeyCode::Up => self.move_selection(-(columns as isize)),
            KeyCode::Down => self.move_selection(columns as isize),
            KeyCode::Home => self.move_selection(isize::MIN),
            KeyCode::End => self.move_selection(isize::MAX),
            KeyCode::PageUp => self.scroll_by(-(visible_rows as isize)),
            KeyCode::PageDown => self.scroll_by(visible_rows as isize),
            KeyCode::Enter => self.open_selected(),
            _ => {}
        }
        None
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q')
        ) {
            self.ctx.close_detail();
        }
    }

    fn handle_search_panel_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && let KeyCode::Char('u') = key.code
        {
            self.search_panel.reset();
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.search_panel.open = false;
                return;
            }
            KeyCode::Enter => {
                self.submit_search_panel();
                return;
            }
            _ => {}
        }

        let panel = &mut self.search_panel;
        match key.code {
            KeyCode::Tab | KeyCode::Down => panel.focus = panel.focus.next(),
            KeyCode::BackTab | KeyCode::Up => panel.focus = panel.focus.prev(),
            KeyCode::Left => match panel.focus {
                SearchFocus::Title => {}
                SearchFocus::Genre => panel.genre.select_prev(),
                SearchFocus::Author => panel.author.select_prev(),
            },
            KeyCode::Right => match panel.focus {
                SearchFocus::Title => {}
                SearchFocus::Genre => panel.genre.select_next(),
                SearchFocus::Author => panel.author.select_next(),
            },
            KeyCode::Backspace => {
                if panel.focus == SearchFocus::Title {
                    panel.title.pop();
                }
            }
            KeyCode::Char(ch) => {
                if panel.focus == SearchFocus::Title {
                    panel.title.push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_settings_panel_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.settings_panel.open = false,
            KeyCode::Enter => self.submit_settings_panel(),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char(' ') => {
                self.settings_panel.theme = self.settings_panel.theme.toggle();
            }
            KeyCode::Char('d') => self.settings_panel.theme = Theme::Day,
            KeyCode::Char('n') => self.settings_panel.theme = Theme::Night,
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.handle_click(mouse.column, mouse.row),
            MouseEventKind::ScrollDown if !self.overlay_open() => self.scroll_by(1),
            MouseEventKind::ScrollUp if !self.overlay_open() => self.scroll_by(-1),
            _ => {}
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        let hits = self.hits;
        let clicked = |rect: Option<Rect>| rect.is_some_and(|rect| contains(rect, column, row));

        if self.settings_panel.open {
            if clicked(hits.settings_day) {
                self.settings_panel.theme = Theme::Day;
            } else if clicked(hits.settings_night) {
                self.settings_panel.theme = Theme::Night;
            } else if clicked(hits.settings_submit) {
                self.submit_settings_panel();
            } else if clicked(hits.settings_cancel) {
                self.settings_panel.open = false;
            }
            return;
        }

        if self.search_panel.open {
            if clicked(hits.search_submit) {
                self.submit_search_panel();
            } else if clicked(hits.search_cancel) {
                self.search_panel.open = false;
            }
            return;
        }

        if self.ctx.detail().open {
            if clicked(hits.detail_close) {
                self.ctx.close_detail();
            }
            return;
        }

        if clicked(hits.search_button) {
            self.open_search_panel();
        } else if clicked(hits.settings_button) {
            self.open_settings_panel();
        } else if clicked(hits.show_more) {
            self.request_show_more();
        } else if let Some(layout) = self.grid.layout {
            let ancestry = target_at(&layout, self.grid.scroll_row, self.ctx.previews(), column, row);
            if ancestry.is_empty() {
                return;
            }
            if self.ctx.click_list(&ancestry)
                && let Some(id) = self.ctx.detail().book.as_ref()
                && let Some(idx) = self.ctx.previews().position(id)
            {
                self.grid.selected = idx;
            }
        }
    }

    fn open_search_panel(&mut self) {
        self.search_panel.open = true;
        self.search_panel.focus = SearchFocus::Title;
    }

    fn open_settings_panel(&mut self) {
        self.settings_panel.open = true;
    }

    fn submit_search_panel(&mut self) {
        let criteria = self.search_panel.criteria();
        let count = self.ctx.submit_search(&criteria);
        self.search_panel.open = false;
        self.grid.selected = 0;
        self.grid.scroll_row = 0;
        debug!(matches = count, "search panel submitted");
    }

    fn submit_settings_panel(&mut self) {
        let before = self.ctx.theme();
        self.ctx.submit_settings(self.settings_panel.theme.as_str());
        self.settings_panel.open = false;
        if self.ctx.theme() != before {
            // Transparent cover pixels are flattened onto the picker background.
            self.image_picker
                .set_background_color(picker_background(self.ctx.theme_vars()));
            self.covers.clear_protocols();
        }
    }

    /// The button is disabled exactly when the context says so; the click is
    /// dropped rather than forwarded.
    fn request_show_more(&mut self) {
        if self.ctx.show_more_disabled() {
            debug!("show more ignored while disabled");
            return;
        }
        self.ctx.show_more();
    }

    fn open_selected(&mut self) {
        let Some(id) = self.ctx.previews().get(self.grid.selected).map(|p| p.id().clone()) else {
            return;
        };
        self.ctx.open_detail(&id);
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.ctx.previews().len();
        if len == 0 {
            return;
        }
        let last = (len - 1) as isize;
        self.grid.selected = (self.grid.selected as isize)
            .saturating_add(delta)
            .clamp(0, last) as usize;
        self.grid.follow_selection = true;
    }

    fn scroll_by(&mut self, delta: isize) {
        let Some(layout) = self.grid.layout else {
            return;
        };
        let total_rows = self.ctx.previews().len().div_ceil(layout.columns);
        let max_scroll = total_rows.saturating_sub(layout.visible_rows()) as isize;
        self.grid.scroll_row = (self.grid.scroll_row as isize)
            .saturating_add(delta)
            .clamp(0, max_scroll) as usize;
        self.grid.follow_selection = false;
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        self.hits = HitAreas::default();
        let palette = self.palette();
        frame.render_widget(Clear, area);
        frame.render_widget(Block::default().style(palette.base()), area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        self.draw_header(layout[0], frame, palette);
        self.draw_list(layout[1], frame, palette);
        self.draw_footer(layout[2], frame, palette);

        if self.ctx.detail().open {
            self.draw_detail(area, frame, palette);
        }

        if self.search_panel.open {
            self.draw_search_panel(area, frame, palette);
        }

        if self.settings_panel.open {
            self.draw_settings_panel(area, frame, palette);
        }
    }

    fn draw_header(&mut self, area: Rect, frame: &mut ratatui::Frame, palette: Palette) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(palette.muted));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                APP_TITLE,
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} of {} books", self.ctx.previews().len(), self.ctx.match_count()),
                Style::default().fg(palette.muted),
            ),
        ]))
        .alignment(Alignment::Left);
        frame.render_widget(title, inner);

        let [search, settings] = right_aligned_buttons(inner, ["[/] Search", "[s] Settings"]);
        render_button(frame, search, "[/] Search", palette.button());
        render_button(frame, settings, "[s] Settings", palette.button());
        self.hits.search_button = Some(search);
        self.hits.settings_button = Some(settings);
    }

    fn draw_list(&mut self, area: Rect, frame: &mut ratatui::Frame, palette: Palette) {
        if self.ctx.list_message_visible() {
            self.grid.layout = None;
            let message = Paragraph::new(NO_RESULTS_MESSAGE)
                .alignment(Alignment::Center)
                .style(Style::default().fg(palette.muted))
                .wrap(Wrap { trim: true });
            frame.render_widget(message, centered_rect(90, 30, area));
            return;
        }

        let layout = GridLayout::new(area);
        self.grid.layout = Some(layout);
        let len = self.ctx.previews().len();
        if len == 0 {
            return;
        }

        self.grid.selected = self.grid.selected.min(len - 1);
        if self.grid.follow_selection {
            self.grid.scroll_row = layout.scroll_to_show(self.grid.selected, self.grid.scroll_row);
            self.grid.follow_selection = false;
        }
        let max_scroll = len.div_ceil(layout.columns).saturating_sub(layout.visible_rows());
        self.grid.scroll_row = self.grid.scroll_row.min(max_scroll);

        let first = self.grid.scroll_row * layout.columns;
        let last = (first + layout.visible_rows() * layout.columns).min(len);
        for idx in first..last {
            let Some(preview) = self.ctx.previews().get(idx) else {
                break;
            };
            let Some(card) = layout.card_rect(idx, self.grid.scroll_row) else {
                continue;
            };
            draw_card(
                frame,
                card,
                preview,
                idx == self.grid.selected,
                palette,
                &mut self.covers,
                &self.image_picker,
            );
        }
    }

    fn draw_footer(&mut self, area: Rect, frame: &mut ratatui::Frame, palette: Palette) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(palette.muted));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = format!("[m] Show more ({})", self.ctx.show_more_remaining());
        let style = if self.ctx.show_more_disabled() {
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
        } else {
            palette.button()
        };
        let width = (UnicodeWidthStr::width(label.as_str()) as u16 + 2).min(inner.width);
        let button = Rect {
            width,
            height: inner.height.min(1),
            ..inner
        };
        render_button(frame, button, &label, style);
        self.hits.show_more = Some(button);

        let help_area = Rect {
            x: inner.x.saturating_add(width + 2),
            width: inner.width.saturating_sub(width + 2),
            ..inner
        };
        let key_style = Style::default().fg(palette.fg).add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(palette.muted);
        let help = Paragraph::new(Line::from(vec![
            Span::styled("←↑↓→", key_style),
            Span::styled(" move  ", text_style),
            Span::styled("Enter", key_style),
            Span::styled(" details  ", text_style),
            Span::styled("PgUp/PgDn", key_style),
            Span::styled(" scroll  ", text_style),
            Span::styled("q", key_style),
            Span::styled(" quit", text_style),
        ]))
        .alignment(Alignment::Right);
        frame.render_widget(help, help_area);
    }

    fn draw_detail(&mut self, area: Rect, frame: &mut ratatui::Frame, palette: Palette) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .style(palette.base())
            .border_style(Style::default().fg(palette.accent))
            .title(Span::styled(
                "Details",
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(DETAIL_COVER_WIDTH.min(inner.width / 2)),
                Constraint::Min(0),
            ])
            .split(inner);

        let detail = self.ctx.detail();
        let backdrop = columns[0];
        if let Some(protocol) =
            self.covers
                .protocol(&self.image_picker, &detail.blur, CoverVariant::Blurred, backdrop)
        {
            frame.render_widget(ImageWidget::new(protocol), backdrop);
        }
        draw_cover(
            frame,
            backdrop.inner(Margin::new(2, 1)),
            &detail.image,
            CoverVariant::Full,
            palette,
            &mut self.covers,
            &self.image_picker,
        );

        let text_area = columns[1].inner(Margin::new(2, 0));
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(text_area);

        let title = Paragraph::new(detail.title.as_str())
            .style(
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(title, sections[0]);

        let subtitle = Paragraph::new(detail.subtitle.as_str())
            .style(Style::default().fg(palette.muted))
            .wrap(Wrap { trim: true });
        frame.render_widget(subtitle, sections[1]);

        let description = Paragraph::new(detail.description.as_str())
            .style(Style::default().fg(palette.fg))
            .wrap(Wrap { trim: true });
        frame.render_widget(description, sections[2]);

        let [close] = right_aligned_buttons(sections[3], ["[Esc] Close"]);
        render_button(frame, close, "[Esc] Close", palette.button());
        self.hits.detail_close = Some(close);
    }

    fn draw_search_panel(&mut self, area: Rect, frame: &mut ratatui::Frame, palette: Palette) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .style(palette.base())
            .border_style(Style::default().fg(palette.accent))
            .title(Span::styled(
                "Search",
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup_area).inner(Margin::new(1, 0));
        frame.render_widget(block, popup_area);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let panel = &self.search_panel;
        let label_style = |focus: SearchFocus| {
            if panel.focus == focus {
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            }
        };

        let input_width = usize::from(sections[0].width.saturating_sub(9));
        let title_value = if panel.focus == SearchFocus::Title {
            Span::styled(
                format!("{}█", tail_to_width(&panel.title, input_width.saturating_sub(1))),
                Style::default().fg(palette.fg),
            )
        } else if panel.title.is_empty() {
            Span::styled("(any title)", Style::default().fg(palette.muted))
        } else {
            Span::styled(
                truncate_to_width(&panel.title, input_width),
                Style::default().fg(palette.fg),
            )
        };
        let title_line = Line::from(vec![
            Span::styled("Title:  ", label_style(SearchFocus::Title)),
            title_value,
        ]);
        frame.render_widget(Paragraph::new(title_line), sections[0]);

        let select_line = |label: &'static str, focus: SearchFocus, current: &str| {
            let focused = panel.focus == focus;
            Line::from(vec![
                Span::styled(label, label_style(focus)),
                Span::raw("‹ "),
                option_chip(current, true, focused, palette.accent),
                Span::raw(" ›"),
            ])
        };
        let genre_label = panel.genre.selected().map_or("", |option| option.label.as_str());
        frame.render_widget(
            Paragraph::new(select_line("Genre:  ", SearchFocus::Genre, genre_label)),
            sections[1],
        );
        let author_label = panel.author.selected().map_or("", |option| option.label.as_str());
        frame.render_widget(
            Paragraph::new(select_line("Author: ", SearchFocus::Author, author_label)),
            sections[2],
        );

        let key_style = Style::default().add_modifier(Modifier::BOLD);
        let help = Paragraph::new(Line::from(vec![
            Span::styled("Tab", key_style),
            Span::raw(" focus  "),
            Span::styled("←/→", key_style),
            Span::raw(" choose  "),
            Span::styled("Ctrl+u", key_style),
            Span::raw(" clear"),
        ]))
        .style(Style::default().fg(palette.muted));
        frame.render_widget(help, sections[4]);

        let [cancel, submit] = right_aligned_buttons(sections[5], ["[Esc] Cancel", "[Enter] Search"]);
        render_button(frame, cancel, "[Esc] Cancel", Style::default().fg(palette.muted));
        render_button(frame, submit, "[Enter] Search", palette.button());
        self.hits.search_cancel = Some(cancel);
        self.hits.search_submit = Some(submit);
    }

    fn draw_settings_panel(&mut self, area: Rect, frame: &mut ratatui::Frame, palette: Palette) {
        let popup_area = centered_rect(45, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .style(palette.base())
            .border_style(Style::default().fg(palette.accent))
            .title(Span::styled(
                "Settings",
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup_area).inner(Margin::new(1, 0));
        frame.render_widget(block, popup_area);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(7),
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Length(7),
                Constraint::Min(0),
            ])
            .split(Rect {
                height: sections[0].height.min(1),
                ..sections[0]
            });
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Theme: ",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            row[0],
        );
        let theme = self.settings_panel.theme;
        frame.render_widget(
            Paragraph::new(option_chip(" day ", theme == Theme::Day, true, palette.accent)),
            row[1],
        );
        frame.render_widget(
            Paragraph::new(option_chip(" night ", theme == Theme::Night, true, palette.accent)),
            row[3],
        );
        self.hits.settings_day = Some(row[1]);
        self.hits.settings_night = Some(row[3]);

        let key_style = Style::default().add_modifier(Modifier::BOLD);
        let help = Paragraph::new(Line::from(vec![
            Span::styled("←/→", key_style),
            Span::raw(" toggle  "),
            Span::styled("d/n", key_style),
            Span::raw(" day/night"),
        ]))
        .style(Style::default().fg(palette.muted));
        frame.render_widget(help, sections[2]);

        let [cancel, submit] = right_aligned_buttons(sections[3], ["[Esc] Cancel", "[Enter] Save"]);
        render_button(frame, cancel, "[Esc] Cancel", Style::default().fg(palette.muted));
        render_button(frame, submit, "[Enter] Save", palette.button());
        self.hits.settings_cancel = Some(cancel);
        self.hits.settings_submit = Some(submit);
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    muted: Color,
}

impl Palette {
    fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    fn button(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}

fn rgb(color: ColorTriple) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

fn picker_background(vars: ThemeVars) -> image::Rgba<u8> {
    let ColorTriple(r, g, b) = vars.color_light;
    image::Rgba([r, g, b, 255])
}

#[derive(Debug, Clone, Copy, Default)]
struct GridState {
    selected: usize,
    scroll_row: usize,
    follow_selection: bool,
    layout: Option<GridLayout>,
}

/// Clickable regions recorded by the last draw.
#[derive(Debug, Clone, Copy, Default)]
struct HitAreas {
    search_button: Option<Rect>,
    settings_button: Option<Rect>,
    show_more: Option<Rect>,
    detail_close: Option<Rect>,
    search_submit: Option<Rect>,
    search_cancel: Option<Rect>,
    settings_day: Option<Rect>,
    settings_night: Option<Rect>,
    settings_submit: Option<Rect>,
    settings_cancel: Option<Rect>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum SearchFocus {
    #[default]
    Title,
    Genre,
    Author,
}

impl SearchFocus {
    fn next(self) -> Self {
        match self {
            SearchFocus::Title => SearchFocus::Genre,
            SearchFocus::Genre => SearchFocus::Author,
            SearchFocus::Author => SearchFocus::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            SearchFocus::Title => SearchFocus::Author,
            SearchFocus::Genre => SearchFocus::Title,
            SearchFocus::Author => SearchFocus::Genre,
        }
    }
}

/// Search form. Values outlive the overlay so reopening shows the last input.
#[derive(Debug, Clone, Default)]
struct SearchPanel {
    open: bool,
    focus: SearchFocus,
    title: String,
    genre: Select<GenreId>,
    author: Select<AuthorId>,
}

impl SearchPanel {
    fn new(ctx: &AppContext) -> Self {
        let mut panel = Self::default();
        panel.genre.attach(ctx.genre_options().to_vec());
        panel.author.attach(ctx.author_options().to_vec());
        panel
    }

    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            title: self.title.clone(),
            author: self.author.value(),
            genre: self.genre.value(),
        }
    }

    fn reset(&mut self) {
        self.title.clear();
        self.genre.select(0);
        self.author.select(0);
    }
}

#[derive(Debug, Clone, Copy)]
struct SettingsPanel {
    open: bool,
    theme: Theme,
}

fn draw_card(
    frame: &mut ratatui::Frame,
    card: Rect,
    preview: &Preview,
    selected: bool,
    palette: Palette,
    covers: &mut CoverStore,
    picker: &Picker,
) {
    let border_style = if selected {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.muted)
    };
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
        card,
    );

    let parts = card_parts(card);
    draw_cover(
        frame,
        parts.cover,
        preview.image(),
        CoverVariant::Thumbnail,
        palette,
        covers,
        picker,
    );

    let title_width = usize::from(parts.title.width);
    let title_lines = fit_lines(
        wrap_text(preview.title(), title_width),
        usize::from(parts.title.height),
        title_width,
    );
    let title_style = if selected {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.fg).add_modifier(Modifier::BOLD)
    };
    let title = Paragraph::new(Text::from(
        title_lines.into_iter().map(Line::from).collect::<Vec<_>>(),
    ))
    .style(title_style);
    frame.render_widget(title, parts.title);

    let author = Paragraph::new(truncate_to_width(
        preview.author(),
        usize::from(parts.author.width),
    ))
    .style(Style::default().fg(palette.muted));
    frame.render_widget(author, parts.author);
}

fn draw_cover(
    frame: &mut ratatui::Frame,
    area: Rect,
    image: &str,
    variant: CoverVariant,
    palette: Palette,
    covers: &mut CoverStore,
    picker: &Picker,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    match covers.protocol(picker, image, variant, area) {
        Some(protocol) => frame.render_widget(ImageWidget::new(protocol), area),
        None => {
            let glyph = Paragraph::new(BROKEN_COVER)
                .alignment(Alignment::Center)
                .style(Style::default().fg(palette.muted));
            let row = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
            frame.render_widget(glyph, row);
        }
    }
}

fn render_button(frame: &mut ratatui::Frame, area: Rect, label: &str, style: Style) {
    let button = Paragraph::new(format!(" {label} "))
        .alignment(Alignment::Center)
        .style(style);
    frame.render_widget(button, area);
}

/// Lays buttons out right-to-left along the first row of `area`, one cell apart.
fn right_aligned_buttons<const N: usize>(area: Rect, labels: [&str; N]) -> [Rect; N] {
    let mut rects = [Rect::default(); N];
    let mut right = area.x.saturating_add(area.width);
    for (idx, label) in labels.iter().enumerate().rev() {
        let width = (UnicodeWidthStr::width(*label) as u16 + 2).min(right.saturating_sub(area.x));
        let x = right.saturating_sub(width);
        rects[idx] = Rect::new(x, area.y, width, area.height.min(1));
        right = x.saturating_sub(1);
    }
    rects
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)
        .context("leave alt screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn option_chip(label: &str, selected: bool, row_selected: bool, accent: Color) -> Span<'static> {
    let base = if selected && row_selected {
        Style::default()
            .fg(Color::Black)
            .bg(accent)
            .add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    Span::styled(label.to_string(), base)
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let sep_width = if current.is_empty() { 0 } else { 1 };

        if current_width + sep_width + word_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        let mut chunk = String::new();
        let mut chunk_width = 0usize;
        for ch in word.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if chunk_width + w > max_width && !chunk.is_empty() {
                lines.push(std::mem::take(&mut chunk));
                chunk_width = 0;
            }
            chunk.push(ch);
            chunk_width += w;
        }
        current = chunk;
        current_width = chunk_width;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Keeps at most `max_lines`, marking the cut on the last kept line.
fn fit_lines(mut lines: Vec<String>, max_lines: usize, width: usize) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        *last = truncate_to_width(&format!("{last}…"), width);
    }
    lines
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// The rightmost part of `text` that fits in `width` columns.
fn tail_to_width(text: &str, width: usize) -> String {
    let mut used = 0usize;
    let mut start = text.len();
    for (idx, ch) in text.char_indices().rev() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    text[start..].to_string()
}
