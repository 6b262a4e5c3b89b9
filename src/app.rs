use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, info};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Paragraph},
};

use crate::event_source::{
    Event, EventSource, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind,
};
use crate::geometry::CellSize;
use crate::renderer::{DocumentRenderer, DocumentSource};
use crate::session::ViewerSession;
use crate::settings;
use crate::theme::{current_theme, parse_color};
use crate::widget::{DataPanel, DataPanelState, DocumentView, HeaderLayout, PageHeader};

/// Wake-up interval while page rendering or a scroll task is in flight
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

struct PendingDocument {
    renderer: Box<dyn DocumentRenderer>,
    source: DocumentSource,
}

pub struct App {
    pub session: ViewerSession,
    pub panel_state: DataPanelState,
    pending_document: Option<PendingDocument>,
    cell: CellSize,
    scroll_step: f64,
    fallback_color: Color,

    header_area: Rect,
    document_area: Rect,
}

impl App {
    pub fn new(session: ViewerSession) -> Self {
        let fallback_color =
            parse_color(&settings::get_highlight_color()).unwrap_or(current_theme().base_0d);
        Self {
            session,
            panel_state: DataPanelState::default(),
            pending_document: None,
            cell: settings::get_cell_size(),
            scroll_step: settings::get_scroll_step(),
            fallback_color,
            header_area: Rect::default(),
            document_area: Rect::default(),
        }
    }

    /// Document to open after the first frame, so the skeleton shows while
    /// the backend works.
    #[must_use]
    pub fn with_document(mut self, renderer: Box<dyn DocumentRenderer>, source: DocumentSource) -> Self {
        self.pending_document = Some(PendingDocument { renderer, source });
        self
    }

    #[must_use]
    pub fn with_cell_size(mut self, cell: CellSize) -> Self {
        self.cell = cell;
        self
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell
    }

    pub fn has_pending_document(&self) -> bool {
        self.pending_document.is_some()
    }

    pub fn load_pending_document(&mut self) {
        if let Some(PendingDocument { renderer, source }) = self.pending_document.take() {
            info!("Opening {}", source.describe());
            self.session.load_document(renderer, &source);
        }
    }

    pub fn has_pending_work(&self) -> bool {
        self.pending_document.is_some() || self.session.has_pending_work()
    }

    /// How long the loop may sleep before pending work wants to run
    pub fn wait_timeout(&self, now: Instant) -> Duration {
        match self.session.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now).min(FRAME_INTERVAL),
            None => FRAME_INTERVAL,
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.session.tick(now)
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) -> Option<AppAction> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('c') if ctrl => return Some(AppAction::Quit),
            KeyCode::Char('d') if ctrl => self.scroll(self.half_screen()),
            KeyCode::Char('u') if ctrl => self.scroll(-self.half_screen()),
            KeyCode::Char('j') | KeyCode::Down => {
                self.panel_state.move_down(self.session.fields().len());
            }
            KeyCode::Char('k') | KeyCode::Up => self.panel_state.move_up(),
            KeyCode::Char('J') => self.scroll(self.scroll_step),
            KeyCode::Char('K') => self.scroll(-self.scroll_step),
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.session.select_field(self.panel_state.cursor, now);
            }
            KeyCode::Esc => self.session.clear_selection(),
            KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
                self.session.next_page();
            }
            KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
                self.session.prev_page();
            }
            _ => {}
        }
        None
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent, now: Instant) {
        let in_document = contains(self.document_area, mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::ScrollDown if in_document => self.scroll(self.scroll_step),
            MouseEventKind::ScrollUp if in_document => self.scroll(-self.scroll_step),
            MouseEventKind::Down(_) => self.handle_click(mouse.column, mouse.row, now),
            _ => {}
        }
    }

    fn handle_click(&mut self, column: u16, row: u16, now: Instant) {
        let label = self.session.tracker().label();
        let header = HeaderLayout::compute(self.header_area, &label);
        if contains(header.prev, column, row) {
            self.session.prev_page();
        } else if contains(header.next, column, row) {
            self.session.next_page();
        } else if let Some(index) = self.panel_state.button_at(column, row) {
            debug!("Highlight button clicked for field #{index}");
            self.panel_state.cursor = index;
            self.session.select_field(index, now);
        }
    }

    fn half_screen(&self) -> f64 {
        (self.session.container().viewport_height() / 2.0).max(self.scroll_step)
    }

    fn scroll(&mut self, delta: f64) {
        if self.session.scroll_by(delta) {
            self.session.render_pass();
            self.session.scroll_ended();
        }
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = current_theme();
        f.render_widget(
            Block::default().style(Style::default().bg(palette.base_00)),
            f.area(),
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(3, 5), Constraint::Ratio(2, 5)])
            .split(chunks[0]);
        let viewer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(columns[0]);

        self.header_area = viewer[0];
        self.sync_document_area(viewer[1]);

        f.render_widget(PageHeader::new(self.session.tracker(), palette), viewer[0]);
        f.render_widget(
            DocumentView::new(&self.session, palette, self.cell).fallback_color(self.fallback_color),
            viewer[1],
        );
        f.render_stateful_widget(
            DataPanel::new(&self.session, palette),
            columns[1],
            &mut self.panel_state,
        );
        self.render_help_bar(f, chunks[1]);
    }

    /// Feed a changed document area to the session as a container resize
    fn sync_document_area(&mut self, area: Rect) {
        if area == self.document_area {
            return;
        }
        self.document_area = area;
        let width = self.cell.px_width(area.width);
        let height = self.cell.px_height(area.height);
        debug!("Document area {}x{} cells ({width}x{height} px)", area.width, area.height);
        self.session.resize(width, height);
    }

    fn render_help_bar(&self, f: &mut Frame, area: Rect) {
        let palette = current_theme();
        let text = if self.session.is_scroll_pending() {
            "Locating highlight..."
        } else {
            "j/k: Field | Enter: Highlight | Esc: Clear | n/p: Page | J/K, Ctrl+d/u: Scroll | q: Quit"
        };
        f.render_widget(
            Paragraph::new(Line::from(text))
                .style(Style::default().fg(palette.base_03).bg(palette.base_00)),
            area,
        );
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}

fn handle_event(app: &mut App, event: Event) -> Option<AppAction> {
    let now = Instant::now();
    match event {
        Event::Key(key) => app.handle_key_event(key, now),
        Event::Mouse(mouse) => {
            match mouse.kind {
                // horizontal scrolling has no meaning here
                MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {}
                _ => app.handle_mouse_event(mouse, now),
            }
            None
        }
        _ => None,
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    // skeleton first, then open the document
    terminal.draw(|f| app.draw(f))?;
    if app.has_pending_document() {
        app.load_pending_document();
        terminal.draw(|f| app.draw(f))?;
    }

    loop {
        let mut needs_redraw = false;
        let mut events_processed = 0;
        while events_processed < 50 && event_source.poll(Duration::ZERO)? {
            let event = event_source.read()?;
            events_processed += 1;
            if matches!(event, Event::Resize(_, _)) {
                needs_redraw = true;
            }
            if handle_event(app, event) == Some(AppAction::Quit) {
                return Ok(());
            }
        }
        needs_redraw |= events_processed > 0;

        if app.tick(Instant::now()) {
            needs_redraw = true;
        }
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if app.has_pending_work() {
            let _ = event_source.poll(app.wait_timeout(Instant::now()))?;
        } else if events_processed == 0 {
            // idle: block on the next input
            let event = event_source.read()?;
            if handle_event(app, event) == Some(AppAction::Quit) {
                return Ok(());
            }
            terminal.draw(|f| app.draw(f))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_source::SimulatedEventSource;
    use crate::model::{Field, FieldValue, Highlight};
    use crate::renderer::BlankRenderer;
    use crate::session::ViewerConfig;
    use std::path::PathBuf;

    fn app() -> App {
        let highlights = vec![
            Highlight::new("h1", 1, 0.1, 0.1, 0.3, 0.05),
            Highlight::new("h2", 3, 0.1, 0.8, 0.3, 0.05),
        ];
        let fields = vec![
            Field::new("f1", "Invoice", Some(FieldValue::Text("INV-7".into())), "h1"),
            Field::new("f2", "Total", Some(FieldValue::Number(42.0)), "h2"),
        ];
        let session = ViewerSession::new(highlights, fields, ViewerConfig::default());
        App::new(session)
            .with_cell_size(CellSize::default())
            .with_document(
                Box::new(BlankRenderer::new(3)),
                DocumentSource::Path(PathBuf::from("invoice.pdf")),
            )
    }

    fn key(c: char) -> KeyEvent {
        match SimulatedEventSource::char_key(c) {
            Event::Key(key) => key,
            _ => unreachable!(),
        }
    }

    fn open(app: &mut App) {
        app.sync_document_area(Rect::new(0, 1, 60, 30));
        app.load_pending_document();
    }

    #[test]
    fn keys_move_cursor_and_select() {
        let mut app = app();
        open(&mut app);
        let now = Instant::now();

        app.handle_key_event(key('j'), now);
        app.handle_key_event(key('j'), now);
        assert_eq!(app.panel_state.cursor, 1);

        let enter = SimulatedEventSource::key_event(KeyCode::Enter, KeyModifiers::empty());
        let Event::Key(enter) = enter else { unreachable!() };
        app.handle_key_event(enter, now);
        assert_eq!(app.session.active_highlight_id(), Some("h2"));

        let esc = SimulatedEventSource::key_event(KeyCode::Esc, KeyModifiers::empty());
        let Event::Key(esc) = esc else { unreachable!() };
        app.handle_key_event(esc, now);
        assert_eq!(app.session.active_highlight_id(), None);

        assert_eq!(app.handle_key_event(key('q'), now), Some(AppAction::Quit));
    }

    #[test]
    fn page_keys_follow_tracker() {
        let mut app = app();
        open(&mut app);
        let now = Instant::now();

        app.handle_key_event(key('n'), now);
        assert_eq!(app.session.tracker().current_page(), 2);
        app.handle_key_event(key('p'), now);
        assert_eq!(app.session.tracker().current_page(), 1);
        app.handle_key_event(key('p'), now);
        assert_eq!(app.session.tracker().current_page(), 1);
    }

    #[test]
    fn wheel_scrolls_only_inside_document() {
        let mut app = app();
        open(&mut app);
        let now = Instant::now();

        let Event::Mouse(outside) = SimulatedEventSource::wheel(true, 70, 5) else {
            unreachable!()
        };
        app.handle_mouse_event(outside, now);
        assert_eq!(app.session.container().scroll_top(), 0.0);

        let Event::Mouse(inside) = SimulatedEventSource::wheel(true, 10, 5) else {
            unreachable!()
        };
        app.handle_mouse_event(inside, now);
        assert_eq!(app.session.container().scroll_top(), app.scroll_step);
    }

    #[test]
    #[serial_test::serial]
    fn configured_color_reaches_document_view() {
        settings::set_settings(settings::Settings {
            highlight_color: "FF8800".to_string(),
            ..settings::Settings::default()
        });
        let mut app = app();
        settings::set_settings(settings::Settings::default());
        assert_eq!(app.fallback_color, Color::Rgb(255, 136, 0));

        open(&mut app);
        app.session.select_highlight(Some("h1".into()), Instant::now());
        let cells = app
            .session
            .active_overlay_rect()
            .unwrap()
            .to_cells(app.cell);

        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let area = app.document_area;
        let buf = terminal.backend().buffer();
        let cell = &buf[(area.x + cells.x as u16, area.y + cells.y as u16)];
        assert_eq!(cell.bg, Color::Rgb(255, 136, 0));
    }
}
