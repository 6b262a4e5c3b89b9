//! Page navigation bar above the document

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::Base16Palette;
use crate::tracker::PageTracker;

const PREV_BUTTON: &str = " ◀ ";
const NEXT_BUTTON: &str = " ▶ ";

/// Where the header's parts land for a given area and label
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeaderLayout {
    pub prev: Rect,
    pub label: Rect,
    pub next: Rect,
}

impl HeaderLayout {
    pub fn compute(area: Rect, label: &str) -> Self {
        let button_w = PREV_BUTTON.width() as u16;
        let label_w = (label.width() as u16 + 2).min(area.width.saturating_sub(2 * button_w));
        let x = area.x.saturating_add(1);

        let prev = Rect::new(x, area.y, button_w.min(area.width), 1.min(area.height));
        let label = Rect::new(prev.right(), area.y, label_w, prev.height);
        let next = Rect::new(label.right(), area.y, button_w, prev.height);
        Self {
            prev,
            label,
            next,
        }
        .clipped(area)
    }

    fn clipped(self, area: Rect) -> Self {
        Self {
            prev: self.prev.intersection(area),
            label: self.label.intersection(area),
            next: self.next.intersection(area),
        }
    }
}

pub struct PageHeader<'a> {
    tracker: &'a PageTracker,
    palette: &'a Base16Palette,
}

impl<'a> PageHeader<'a> {
    pub fn new(tracker: &'a PageTracker, palette: &'a Base16Palette) -> Self {
        Self { tracker, palette }
    }

    fn button_style(&self, enabled: bool) -> Style {
        if enabled {
            Style::default()
                .fg(self.palette.base_06)
                .bg(self.palette.base_02)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(self.palette.base_03)
                .bg(self.palette.base_01)
                .add_modifier(Modifier::DIM)
        }
    }
}

impl Widget for PageHeader<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        buf.set_style(area, Style::default().bg(self.palette.base_01));

        let label = self.tracker.label();
        let layout = HeaderLayout::compute(area, &label);

        buf.set_stringn(
            layout.prev.x,
            layout.prev.y,
            PREV_BUTTON,
            layout.prev.width as usize,
            self.button_style(self.tracker.can_go_prev()),
        );
        buf.set_stringn(
            layout.label.x + 1,
            layout.label.y,
            &label,
            layout.label.width.saturating_sub(2) as usize,
            Style::default()
                .fg(self.palette.base_05)
                .bg(self.palette.base_01),
        );
        buf.set_stringn(
            layout.next.x,
            layout.next.y,
            NEXT_BUTTON,
            layout.next.width as usize,
            self.button_style(self.tracker.can_go_next()),
        );
    }
}
