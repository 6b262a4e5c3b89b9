//! Scroll container over the laid-out document

use crate::geometry::PixelRect;

/// Vertical scroll state of the document pane, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollContainer {
    scroll_top: f64,
    viewport_height: f64,
    content_height: f64,
}

impl ScrollContainer {
    pub fn new(viewport_height: f64, content_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            viewport_height: viewport_height.max(0.0),
            content_height: content_height.max(0.0),
        }
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    /// Update the dimensions, keeping the scroll position in range.
    pub fn set_dimensions(&mut self, viewport_height: f64, content_height: f64) {
        self.viewport_height = viewport_height.max(0.0);
        self.content_height = content_height.max(0.0);
        self.scroll_to(self.scroll_top);
    }

    /// Scroll so `top` is at the top of the viewport, clamped to the content.
    /// Returns true if the position changed.
    pub fn scroll_to(&mut self, top: f64) -> bool {
        let clamped = if top.is_finite() {
            top.clamp(0.0, self.max_scroll())
        } else {
            0.0
        };
        let changed = (clamped - self.scroll_top).abs() > f64::EPSILON;
        self.scroll_top = clamped;
        changed
    }

    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.scroll_to(self.scroll_top + delta)
    }

    /// Visible vertical band `(top, bottom)` in content coordinates
    pub fn visible_bounds(&self) -> (f64, f64) {
        (self.scroll_top, self.scroll_top + self.viewport_height)
    }

    /// Fraction of `rect`'s height that lies inside the viewport.
    /// Zero for empty or off-screen rects.
    pub fn intersection_ratio(&self, rect: &PixelRect) -> f64 {
        if rect.height <= 0.0 {
            return 0.0;
        }
        let (top, bottom) = self.visible_bounds();
        rect.intersection_height(top, bottom) / rect.height
    }

    /// True if the rect's vertical extent is entirely inside the viewport.
    pub fn fully_visible(&self, rect: &PixelRect) -> bool {
        let (top, bottom) = self.visible_bounds();
        rect.y >= top && rect.bottom() <= bottom
    }

    /// Put the rect's top edge at the top of the viewport.
    pub fn scroll_into_view_start(&mut self, rect: &PixelRect) -> bool {
        self.scroll_to(rect.y)
    }

    /// Put the rect's vertical center at the center of the viewport.
    pub fn scroll_into_view_center(&mut self, rect: &PixelRect) -> bool {
        self.scroll_to(rect.y - self.viewport_height / 2.0 + rect.height / 2.0)
    }
}
