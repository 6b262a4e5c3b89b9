//! Highlight coordinate mapping
//!
//! Converts highlight coordinates (page fractions or page pixels) into
//! pixel rectangles on a rendered page, and pixel rectangles into
//! terminal cells.

use ratatui::layout::Rect;

use crate::model::Highlight;

/// Padding added around normalized overlays, in pixels
pub const OVERLAY_PAD: f64 = 4.0;

/// Axis-aligned rectangle in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    #[must_use]
    pub fn inflate(&self, pad: f64) -> Self {
        Self::new(
            self.x - pad,
            self.y - pad,
            self.width + 2.0 * pad,
            self.height + 2.0 * pad,
        )
    }

    /// Height of the overlap with the band `[top, bottom)`.
    pub fn intersection_height(&self, top: f64, bottom: f64) -> f64 {
        (self.bottom().min(bottom) - self.y.max(top)).max(0.0)
    }

    /// Cells covered by this rect. The origin is floored and the far edge
    /// ceiled, so any non-empty rect covers at least one cell. Negative
    /// coordinates are cut off at zero.
    pub fn to_cells(&self, cell: CellSize) -> CellRect {
        let cw = f64::from(cell.width.max(1));
        let ch = f64::from(cell.height.max(1));
        let x0 = (self.x / cw).floor().max(0.0);
        let y0 = (self.y / ch).floor().max(0.0);
        let x1 = (self.right() / cw).ceil().max(x0);
        let y1 = (self.bottom() / ch).ceil().max(y0);
        let (x1, y1) = if self.is_empty() {
            (x0, y0)
        } else {
            (x1.max(x0 + 1.0), y1.max(y0 + 1.0))
        };
        CellRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        }
    }
}

/// Size of one terminal cell in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSize {
    pub width: u16,
    pub height: u16,
}

impl CellSize {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Pixel width of `cols` cells
    pub fn px_width(&self, cols: u16) -> f64 {
        f64::from(cols) * f64::from(self.width)
    }

    /// Pixel height of `rows` cells
    pub fn px_height(&self, rows: u16) -> f64 {
        f64::from(rows) * f64::from(self.height)
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(8, 16)
    }
}

/// Rectangle in terminal cells, relative to some origin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Place this rect inside `area`, shifted up by `scroll_rows`, and clip
    /// it to the area. Returns `None` when nothing remains visible.
    pub fn clip_to(&self, area: Rect, scroll_rows: u32) -> Option<Rect> {
        // u64 so rects far off the page never overflow
        let scroll = u64::from(scroll_rows);
        let top = u64::from(self.y);
        let bottom = top + u64::from(self.height);
        if bottom <= scroll {
            return None;
        }
        let y0 = top.saturating_sub(scroll);
        let y1 = (bottom - scroll).min(u64::from(area.height));
        let x0 = u64::from(self.x);
        let x1 = (x0 + u64::from(self.width)).min(u64::from(area.width));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect::new(
            area.x.saturating_add(x0 as u16),
            area.y.saturating_add(y0 as u16),
            (x1 - x0) as u16,
            (y1 - y0) as u16,
        ))
    }
}

/// Pixel rectangle of a highlight on a page rendered at the given size.
///
/// Pixel-mode highlights come back unchanged. No clamping is applied, so
/// out-of-range input maps off-page.
pub fn pixel_rect(highlight: &Highlight, page_width_px: f64, page_height_px: f64) -> PixelRect {
    if !highlight.is_normalized() {
        return PixelRect::new(highlight.x, highlight.y, highlight.width, highlight.height);
    }

    PixelRect::new(
        highlight.x * page_width_px,
        highlight.y * page_height_px,
        highlight.width * page_width_px,
        highlight.height * page_height_px,
    )
}

/// Rectangle actually drawn for a highlight. Normalized overlays get
/// `pad` pixels of breathing room on every side.
pub fn overlay_rect(
    highlight: &Highlight,
    page_width_px: f64,
    page_height_px: f64,
    pad: f64,
) -> PixelRect {
    let rect = pixel_rect(highlight, page_width_px, page_height_px);
    if highlight.is_normalized() {
        rect.inflate(pad)
    } else {
        rect
    }
}

/// Check that a highlight's coordinates are in range for its mode.
pub fn is_valid(highlight: &Highlight) -> bool {
    let Highlight {
        x,
        y,
        width,
        height,
        ..
    } = *highlight;

    if !highlight.is_normalized() {
        return x >= 0.0 && y >= 0.0 && width > 0.0 && height > 0.0;
    }

    let unit = 0.0..=1.0;
    unit.contains(&x)
        && unit.contains(&y)
        && width > 0.0
        && width <= 1.0
        && height > 0.0
        && height <= 1.0
}

/// Highlights on `page`, in input order.
pub fn highlights_for_page(highlights: &[Highlight], page: usize) -> Vec<&Highlight> {
    highlights.iter().filter(|h| h.page == page).collect()
}
