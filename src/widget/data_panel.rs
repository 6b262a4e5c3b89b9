//! Field list with a highlight button per field

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::model::Field;
use crate::session::ViewerSession;
use crate::theme::Base16Palette;

const BUTTON: &str = "[Highlight]";
const DEFAULT_TITLE: &str = "Data Panel";

/// Cursor, scroll offset and the button hit areas of the last render
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataPanelState {
    pub cursor: usize,
    pub offset: usize,
    buttons: Vec<(Rect, usize)>,
}

impl DataPanelState {
    pub fn move_down(&mut self, field_count: usize) {
        if self.cursor + 1 < field_count {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Field index of the button under a mouse position
    pub fn button_at(&self, column: u16, row: u16) -> Option<usize> {
        self.buttons
            .iter()
            .find(|(rect, _)| {
                column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
            })
            .map(|(_, index)| *index)
    }
}

enum PanelRow<'a> {
    Heading(&'a str),
    Label(usize, &'a Field),
    Value(usize, String),
    Spacer,
}

impl PanelRow<'_> {
    fn field_index(&self) -> Option<usize> {
        match self {
            PanelRow::Label(index, _) | PanelRow::Value(index, _) => Some(*index),
            _ => None,
        }
    }
}

pub struct DataPanel<'a> {
    session: &'a ViewerSession,
    palette: &'a Base16Palette,
}

impl<'a> DataPanel<'a> {
    pub fn new(session: &'a ViewerSession, palette: &'a Base16Palette) -> Self {
        Self { session, palette }
    }

    fn rows(&self, width: usize) -> Vec<PanelRow<'a>> {
        let grouped = self.session.grouped_fields();
        let mut rows = Vec::new();
        let mut index = 0;

        let mut push_field = |rows: &mut Vec<PanelRow<'a>>, field: &'a Field| {
            rows.push(PanelRow::Label(index, field));
            let value = field.display_value();
            for part in textwrap::wrap(&value, width.max(1)) {
                rows.push(PanelRow::Value(index, part.into_owned()));
            }
            rows.push(PanelRow::Spacer);
            index += 1;
        };

        for group in &grouped.groups {
            rows.push(PanelRow::Heading(group.name));
            for field in group.fields.iter().copied() {
                push_field(&mut rows, field);
            }
        }
        if !grouped.ungrouped.is_empty() && !grouped.groups.is_empty() {
            rows.push(PanelRow::Heading("Other"));
        }
        for field in grouped.ungrouped.iter().copied() {
            push_field(&mut rows, field);
        }
        rows
    }
}

impl StatefulWidget for DataPanel<'_> {
    type State = DataPanelState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.buttons.clear();
        let title = self.session.title().unwrap_or(DEFAULT_TITLE);
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(self.palette.base_02))
            .title(Line::from(Span::styled(
                format!(" {title} "),
                Style::default()
                    .fg(self.palette.base_0a)
                    .add_modifier(Modifier::BOLD),
            )))
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.is_empty() {
            return;
        }

        let rows = self.rows(inner.width.saturating_sub(2) as usize);
        if rows.is_empty() {
            Line::from("No fields")
                .style(Style::default().fg(self.palette.base_03))
                .render(inner, buf);
            return;
        }

        let field_count = self.session.fields().len();
        state.cursor = state.cursor.min(field_count.saturating_sub(1));

        // keep the cursor's field fully on screen
        let height = inner.height as usize;
        let first = rows
            .iter()
            .position(|row| row.field_index() == Some(state.cursor))
            .unwrap_or(0);
        let last = rows
            .iter()
            .rposition(|row| row.field_index() == Some(state.cursor))
            .unwrap_or(first);
        if first < state.offset {
            state.offset = first;
        } else if last >= state.offset + height {
            state.offset = last + 1 - height;
        }
        state.offset = state.offset.min(rows.len().saturating_sub(1));

        let active = self.session.active_highlight_id();
        let cursor_bg = Style::default().bg(self.palette.base_01);

        for (row, y) in rows
            .iter()
            .skip(state.offset)
            .zip(inner.y..inner.bottom())
        {
            let line_area = Rect::new(inner.x, y, inner.width, 1);
            let on_cursor = row.field_index() == Some(state.cursor);
            if on_cursor {
                buf.set_style(line_area, cursor_bg);
            }

            match row {
                PanelRow::Heading(name) => {
                    buf.set_stringn(
                        inner.x,
                        y,
                        name.to_uppercase(),
                        inner.width as usize,
                        Style::default()
                            .fg(self.palette.base_0d)
                            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    );
                }
                PanelRow::Label(index, field) => {
                    let is_active = active == Some(field.highlight_id.as_str());
                    let button_w = BUTTON.width() as u16;
                    let label_w = inner.width.saturating_sub(button_w + 1);
                    buf.set_stringn(
                        inner.x,
                        y,
                        format!("{}:", field.label),
                        label_w as usize,
                        Style::default().fg(self.palette.base_04),
                    );

                    if inner.width > button_w {
                        let button = Rect::new(inner.right() - button_w, y, button_w, 1);
                        let style = if is_active {
                            Style::default()
                                .fg(self.palette.base_00)
                                .bg(self.palette.base_0d)
                                .add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(self.palette.base_0d)
                        };
                        buf.set_stringn(button.x, y, BUTTON, button_w as usize, style);
                        state.buttons.push((button, *index));
                    }
                }
                PanelRow::Value(_, text) => {
                    buf.set_stringn(
                        inner.x + 2,
                        y,
                        text,
                        inner.width.saturating_sub(2) as usize,
                        Style::default()
                            .fg(self.palette.base_06)
                            .add_modifier(Modifier::BOLD),
                    );
                }
                PanelRow::Spacer => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, FieldValue};
    use crate::session::ViewerConfig;

    fn session() -> ViewerSession {
        let fields = vec![
            Field::new("f1", "Vendor", Some(FieldValue::Text("Acme".into())), "h1")
                .in_group("Header"),
            Field::new("f2", "Total", Some(FieldValue::Number(1200.0)), "h2"),
            Field::new("f3", "Due", None, "h3").in_group("Header"),
        ];
        ViewerSession::new(Vec::new(), fields, ViewerConfig::default())
    }

    fn text(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn renders_groups_then_ungrouped() {
        let session = session();
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        let mut state = DataPanelState::default();
        DataPanel::new(&session, crate::theme::current_theme()).render(area, &mut buf, &mut state);

        let lines = text(&buf);
        let find = |needle: &str| lines.iter().position(|l| l.contains(needle));
        assert!(lines[0].contains("Data Panel"));
        assert!(find("HEADER").unwrap() < find("Vendor:").unwrap());
        assert!(find("Due:").unwrap() < find("Total:").unwrap());
        assert!(find("1200").is_some());
        assert!(find("—").is_some());
    }

    #[test]
    fn buttons_are_hit_testable() {
        let session = session();
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        let mut state = DataPanelState::default();
        DataPanel::new(&session, crate::theme::current_theme()).render(area, &mut buf, &mut state);

        assert_eq!(state.buttons.len(), 3);
        let (rect, index) = state.buttons[1];
        assert_eq!(index, 1);
        assert_eq!(state.button_at(rect.x + 1, rect.y), Some(1));
        assert_eq!(state.button_at(0, rect.y), None);
    }

    #[test]
    fn cursor_scrolls_into_view() {
        let session = session();
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        let mut state = DataPanelState::default();
        state.move_down(3);
        state.move_down(3);
        state.move_down(3);
        assert_eq!(state.cursor, 2);

        DataPanel::new(&session, crate::theme::current_theme()).render(area, &mut buf, &mut state);
        assert!(state.offset > 0);
        assert!(text(&buf).iter().any(|l| l.contains("Total:")));
    }
}
