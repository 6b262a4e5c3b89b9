//! Continuous-scroll page layout
//!
//! Pages are stacked vertically at a common display width derived from
//! the container width. All values are pixels in content coordinates
//! (origin at the top-left of the scrollable content).

use crate::geometry::PixelRect;

/// Natural size of a source page, in points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// A4 portrait
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Height over width; falls back to A4 for degenerate sizes.
    pub fn aspect(&self) -> f64 {
        if self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
        {
            self.height / self.width
        } else {
            Self::A4.height / Self::A4.width
        }
    }
}

/// Spacing used when laying out pages
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    /// Padding around the page column
    pub padding: f64,
    /// Horizontal space taken from the container width before sizing pages
    pub page_inset: f64,
    /// Vertical gap between consecutive pages
    pub page_gap: f64,
    /// Height/width ratio of loading placeholders
    pub skeleton_aspect: f64,
    /// Widest a loading placeholder gets
    pub skeleton_max_width: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            padding: 16.0,
            page_inset: 32.0,
            page_gap: 32.0,
            skeleton_aspect: 1.414,
            skeleton_max_width: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentLayout {
    metrics: LayoutMetrics,
    page_sizes: Vec<PageSize>,
    container_width: f64,
    page_rects: Vec<PixelRect>,
}

impl DocumentLayout {
    pub fn new(page_sizes: Vec<PageSize>, container_width: f64, metrics: LayoutMetrics) -> Self {
        let mut layout = Self {
            metrics,
            page_sizes,
            container_width: 0.0,
            page_rects: Vec::new(),
        };
        layout.resize(container_width);
        layout
    }

    /// Recompute every page rect for a new container width.
    pub fn resize(&mut self, container_width: f64) {
        self.container_width = container_width.max(0.0);
        let width = self.display_width();
        let mut top = self.metrics.padding;

        self.page_rects.clear();
        for size in &self.page_sizes {
            let height = width * size.aspect();
            self.page_rects
                .push(PixelRect::new(self.metrics.padding, top, width, height));
            top += height + self.metrics.page_gap;
        }
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    /// Width every page is rendered at
    pub fn display_width(&self) -> f64 {
        (self.container_width - self.metrics.page_inset).max(0.0)
    }

    pub fn page_count(&self) -> usize {
        self.page_rects.len()
    }

    /// Rect of a 1-indexed page
    pub fn page_rect(&self, page: usize) -> Option<PixelRect> {
        page.checked_sub(1)
            .and_then(|idx| self.page_rects.get(idx))
            .copied()
    }

    /// `(page number, rect)` pairs in page order
    pub fn pages(&self) -> impl Iterator<Item = (usize, PixelRect)> + '_ {
        self.page_rects
            .iter()
            .enumerate()
            .map(|(idx, rect)| (idx + 1, *rect))
    }

    /// Total scrollable height, including padding at both ends
    pub fn content_height(&self) -> f64 {
        match self.page_rects.last() {
            Some(last) => last.bottom() + self.metrics.padding,
            None => 0.0,
        }
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }
}

/// Placeholder pages shown while the document is loading: at most three,
/// capped in width, with a fixed aspect ratio.
pub fn skeleton_pages(container_width: f64, page_count: usize, metrics: &LayoutMetrics) -> Vec<PixelRect> {
    let width = (container_width - metrics.page_inset)
        .min(metrics.skeleton_max_width)
        .max(0.0);
    let height = (width * metrics.skeleton_aspect).floor();
    let mut top = metrics.padding;

    (0..page_count.clamp(1, 3))
        .map(|_| {
            let rect = PixelRect::new(metrics.padding, top, width, height);
            top += height + metrics.page_gap;
            rect
        })
        .collect()
}
