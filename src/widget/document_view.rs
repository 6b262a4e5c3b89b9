//! Scrollable document pane: page frames, page text and the active overlay

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
};

use crate::geometry::{CellSize, PixelRect};
use crate::model::DEFAULT_HIGHLIGHT_COLOR;
use crate::session::{DocumentState, ViewerSession};
use crate::theme::{Base16Palette, parse_color};

pub struct DocumentView<'a> {
    session: &'a ViewerSession,
    palette: &'a Base16Palette,
    cell: CellSize,
    fallback_color: Color,
}

impl<'a> DocumentView<'a> {
    pub fn new(session: &'a ViewerSession, palette: &'a Base16Palette, cell: CellSize) -> Self {
        Self {
            session,
            palette,
            cell,
            fallback_color: parse_color(DEFAULT_HIGHLIGHT_COLOR).unwrap_or(palette.base_0d),
        }
    }

    /// Overlay color for highlights without a usable color of their own
    #[must_use]
    pub fn fallback_color(mut self, color: Color) -> Self {
        self.fallback_color = color;
        self
    }

    fn scroll_rows(&self) -> u32 {
        let ch = f64::from(self.cell.height.max(1));
        (self.session.container().scroll_top() / ch).floor().max(0.0) as u32
    }

    fn place(&self, rect: &PixelRect, area: Rect) -> Option<Rect> {
        rect.to_cells(self.cell).clip_to(area, self.scroll_rows())
    }

    fn render_skeleton(&self, area: Rect, buf: &mut Buffer) {
        let frame_style = Style::default().fg(self.palette.base_02);
        for rect in self.session.skeleton() {
            let Some(frame) = self.place(&rect, area) else {
                continue;
            };
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(frame_style)
                .render(frame, buf);

            let inner = inset(frame);
            for row in (inner.y..inner.bottom()).step_by(2) {
                let bar = inner.width.saturating_sub(2) as usize;
                buf.set_stringn(inner.x + 1, row, "░".repeat(bar), bar, frame_style);
            }
        }

        let message = Line::from("Loading PDF content...")
            .style(
                Style::default()
                    .fg(self.palette.base_04)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center);
        let row = Rect::new(area.x, area.y + area.height / 2, area.width, 1.min(area.height));
        message.render(row, buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let height = 3.min(area.height);
        let row = Rect::new(
            area.x,
            area.y + area.height.saturating_sub(height) / 2,
            area.width,
            height,
        );
        Paragraph::new(vec![
            Line::from("Failed to load PDF").style(
                Style::default()
                    .fg(self.palette.base_08)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::from(message.to_string()).style(Style::default().fg(self.palette.base_04)),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(row, buf);
    }

    fn render_pages(&self, area: Rect, buf: &mut Buffer) {
        let frame_style = Style::default().fg(self.palette.base_03);
        let text_style = Style::default().fg(self.palette.base_05);

        for (page, rect) in self.session.page_elements() {
            let Some(frame) = self.place(&rect, area) else {
                continue;
            };
            Block::default()
                .borders(Borders::ALL)
                .border_style(frame_style)
                .title_bottom(Line::from(format!(" {page} ")).right_aligned())
                .render(frame, buf);
            let inner = inset(frame);

            let Some(lines) = self.session.page_lines(page) else {
                let row = Rect::new(inner.x, inner.y, inner.width, 1.min(inner.height));
                Line::from("Rendering…")
                    .style(Style::default().fg(self.palette.base_03))
                    .alignment(Alignment::Center)
                    .render(row, buf);
                continue;
            };

            for line in lines {
                let line_rect = PixelRect::new(
                    rect.x + line.x0,
                    rect.y + line.y0,
                    (line.x1 - line.x0).max(1.0),
                    (line.y1 - line.y0).max(1.0),
                );
                let Some(cells) = self.place(&line_rect, area) else {
                    continue;
                };
                let x = cells.x.max(inner.x);
                if !contains_row(inner, cells.y) || x >= inner.right() {
                    continue;
                }
                let width = inner.right() - x;
                buf.set_stringn(x, cells.y, &line.text, width as usize, text_style);
            }
        }
    }

    fn render_overlay(&self, area: Rect, buf: &mut Buffer) {
        let (Some(highlight), Some(rect)) = (
            self.session.active_highlight(),
            self.session.active_overlay_rect(),
        ) else {
            return;
        };
        let Some(cells) = self.place(&rect, area) else {
            return;
        };

        let color = highlight
            .color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(self.fallback_color);
        buf.set_style(cells, Style::default().bg(color).fg(self.palette.base_00));

        if let Some(caption) = highlight.caption() {
            let caption_style = Style::default()
                .fg(self.palette.base_07)
                .bg(color)
                .add_modifier(Modifier::BOLD);
            // above the box when there is room, like a tag
            let y = if cells.y > area.y {
                cells.y - 1
            } else {
                cells.y
            };
            let text = format!(" {caption} ");
            let width = area.right().saturating_sub(cells.x);
            buf.set_stringn(cells.x, y, text, width as usize, caption_style);
        }
    }
}

impl Widget for DocumentView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        buf.set_style(area, Style::default().bg(self.palette.base_00));

        match self.session.document_state() {
            DocumentState::Loading => self.render_skeleton(area, buf),
            DocumentState::Failed(message) => self.render_error(message, area, buf),
            DocumentState::Ready(_) => {
                self.render_pages(area, buf);
                self.render_overlay(area, buf);
            }
        }
    }
}

fn inset(rect: Rect) -> Rect {
    Rect::new(
        rect.x.saturating_add(1),
        rect.y.saturating_add(1),
        rect.width.saturating_sub(2),
        rect.height.saturating_sub(2),
    )
}

fn contains_row(rect: Rect, row: u16) -> bool {
    row >= rect.y && row < rect.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Highlight;
    use crate::layout::PageSize;
    use crate::renderer::{
        BlankRenderer, DocumentInfo, DocumentRenderer, DocumentSource, RenderFault, TextLine,
    };
    use crate::session::ViewerConfig;
    use std::path::PathBuf;
    use std::time::Instant;

    struct Unreadable;

    impl DocumentRenderer for Unreadable {
        fn open(&mut self, _source: &DocumentSource) -> Result<DocumentInfo, RenderFault> {
            Err(RenderFault::generic("not a PDF"))
        }

        fn page_lines(&self, _page: usize) -> Result<Vec<TextLine>, RenderFault> {
            Err(RenderFault::NotOpen)
        }

        fn page_size(&self, _page: usize) -> Result<PageSize, RenderFault> {
            Err(RenderFault::NotOpen)
        }
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    fn render(session: &ViewerSession, area: Rect) -> Buffer {
        let mut buf = Buffer::empty(area);
        DocumentView::new(session, crate::theme::current_theme(), CellSize::default())
            .render(area, &mut buf);
        buf
    }

    #[test]
    fn loading_shows_message() {
        let mut session = ViewerSession::new(Vec::new(), Vec::new(), ViewerConfig::default());
        session.resize(480.0, 320.0);
        let buf = render(&session, Rect::new(0, 0, 60, 20));
        let all: String = (0..20).map(|y| row_text(&buf, y)).collect();
        assert!(all.contains("Loading PDF content..."));
    }

    #[test]
    fn failure_shows_reason() {
        let mut session = ViewerSession::new(Vec::new(), Vec::new(), ViewerConfig::default());
        session.resize(480.0, 320.0);
        session.load_document(
            Box::new(Unreadable),
            &DocumentSource::Path(PathBuf::from("empty.pdf")),
        );
        let buf = render(&session, Rect::new(0, 0, 60, 20));
        let all: String = (0..20).map(|y| row_text(&buf, y)).collect();
        assert!(all.contains("Failed to load PDF"), "{all}");
        assert!(all.contains("not a PDF"), "{all}");
    }

    #[test]
    fn overlay_fills_highlight_cells() {
        let highlight = Highlight::new("h1", 1, 0.1, 0.1, 0.2, 0.05).with_label("Total");
        let mut session =
            ViewerSession::new(vec![highlight], Vec::new(), ViewerConfig::default());
        session.resize(480.0, 640.0);
        session.load_document(
            Box::new(BlankRenderer::new(2)),
            &DocumentSource::Path(PathBuf::from("doc.pdf")),
        );
        let now = Instant::now();
        session.select_highlight(Some("h1".into()), now);

        let overlay = session.active_overlay_rect().unwrap();
        let cells = overlay.to_cells(CellSize::default());
        let buf = render(&session, Rect::new(0, 0, 60, 40));

        let cell = &buf[(cells.x as u16, cells.y as u16)];
        assert_eq!(cell.bg, Color::Rgb(99, 102, 241));
        assert!(row_text(&buf, cells.y as u16 - 1).contains("Total"));
    }

    fn ready_session(highlights: Vec<Highlight>) -> ViewerSession {
        let mut session = ViewerSession::new(highlights, Vec::new(), ViewerConfig::default());
        session.resize(480.0, 640.0);
        session.load_document(
            Box::new(BlankRenderer::new(2)),
            &DocumentSource::Path(PathBuf::from("doc.pdf")),
        );
        session
    }

    fn overlay_bg(session: &ViewerSession, fallback: Color) -> Color {
        let cells = session
            .active_overlay_rect()
            .unwrap()
            .to_cells(CellSize::default());
        let area = Rect::new(0, 0, 60, 40);
        let mut buf = Buffer::empty(area);
        DocumentView::new(session, crate::theme::current_theme(), CellSize::default())
            .fallback_color(fallback)
            .render(area, &mut buf);
        buf[(cells.x as u16, cells.y as u16)].bg
    }

    #[test]
    fn colorless_highlight_uses_configured_color() {
        let mut session = ready_session(vec![Highlight::new("plain", 1, 0.1, 0.1, 0.2, 0.05)]);
        session.select_highlight(Some("plain".into()), Instant::now());

        let configured = parse_color("FF8800").unwrap();
        assert_eq!(overlay_bg(&session, configured), Color::Rgb(255, 136, 0));
    }

    #[test]
    fn own_color_beats_configured_color() {
        let mut own = Highlight::new("own", 1, 0.1, 0.1, 0.2, 0.05);
        own.color = Some("#99C794".to_string());
        let mut unparsable = Highlight::new("bad", 1, 0.1, 0.3, 0.2, 0.05);
        unparsable.color = Some("chartreuse-ish".to_string());
        let mut session = ready_session(vec![own, unparsable]);
        let configured = Color::Rgb(255, 136, 0);

        session.select_highlight(Some("own".into()), Instant::now());
        assert_eq!(overlay_bg(&session, configured), Color::Rgb(0x99, 0xC7, 0x94));

        session.select_highlight(Some("bad".into()), Instant::now());
        assert_eq!(overlay_bg(&session, configured), configured);
    }

    #[test]
    fn far_off_page_highlight_renders_without_panicking() {
        let far = Highlight::new("far", 1, 10.0, 1e11, 20.0, 20.0).in_pixels();
        assert!(crate::geometry::is_valid(&far));
        let mut session = ready_session(vec![far]);
        let start = Instant::now();
        session.select_highlight(Some("far".into()), start);
        assert!(session.active_overlay_rect().is_some());

        let area = Rect::new(0, 0, 60, 40);
        let mut buf = Buffer::empty(area);
        DocumentView::new(&session, crate::theme::current_theme(), CellSize::default())
            .render(area, &mut buf);

        // the scroll clamps at the document end, far short of the overlay
        session.tick(start + std::time::Duration::from_millis(50));
        let mut buf = Buffer::empty(area);
        DocumentView::new(&session, crate::theme::current_theme(), CellSize::default())
            .render(area, &mut buf);
        let painted = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .any(|pos| buf[pos].bg == Color::Rgb(99, 102, 241));
        assert!(!painted);
    }
}
