//! Document rendering backends
//!
//! The viewer needs three things from a backend: the page count and page
//! sizes once the document opens, each page's text laid out at a given
//! display width, and an error value when the document cannot be opened.

use std::path::PathBuf;

use crate::layout::PageSize;

#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("no document is open")]
    NotOpen,

    #[error("page {page} is out of range (document has {count})")]
    NoSuchPage { page: usize, count: usize },

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Where the document bytes come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl DocumentSource {
    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Path(path) => path.display().to_string(),
            DocumentSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

/// Metadata reported when a document opens
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentInfo {
    pub page_sizes: Vec<PageSize>,
    pub title: Option<String>,
}

impl DocumentInfo {
    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }
}

/// A line of text with its bounding box
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub text: String,
}

impl TextLine {
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x0: self.x0 * factor,
            y0: self.y0 * factor,
            x1: self.x1 * factor,
            y1: self.y1 * factor,
            text: self.text.clone(),
        }
    }
}

/// A page laid out at a specific display width
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPage {
    /// Page number (1-indexed)
    pub page: usize,
    pub width_px: f64,
    pub height_px: f64,
    pub lines: Vec<TextLine>,
}

pub trait DocumentRenderer {
    /// Open the document and report its pages
    fn open(&mut self, source: &DocumentSource) -> Result<DocumentInfo, RenderFault>;

    /// Text lines of a 1-indexed page, in page points
    fn page_lines(&self, page: usize) -> Result<Vec<TextLine>, RenderFault>;

    /// Natural size of a 1-indexed page
    fn page_size(&self, page: usize) -> Result<PageSize, RenderFault>;

    /// Lay out a page at `width_px`
    fn render_page(&self, page: usize, width_px: f64) -> Result<RenderedPage, RenderFault> {
        let size = self.page_size(page)?;
        let factor = if size.width > 0.0 {
            width_px / size.width
        } else {
            0.0
        };
        let lines = self
            .page_lines(page)?
            .iter()
            .map(|line| line.scaled(factor))
            .collect();
        Ok(RenderedPage {
            page,
            width_px,
            height_px: width_px * size.aspect(),
            lines,
        })
    }
}

/// Backend with a fixed number of empty pages. Used when no PDF is
/// available; highlights still map onto the page frames.
#[derive(Clone, Debug)]
pub struct BlankRenderer {
    page_count: usize,
    page_size: PageSize,
    opened: bool,
}

impl BlankRenderer {
    pub fn new(page_count: usize) -> Self {
        Self::with_page_size(page_count, PageSize::A4)
    }

    pub fn with_page_size(page_count: usize, page_size: PageSize) -> Self {
        Self {
            page_count,
            page_size,
            opened: false,
        }
    }

    fn check_page(&self, page: usize) -> Result<(), RenderFault> {
        if !self.opened {
            return Err(RenderFault::NotOpen);
        }
        if page == 0 || page > self.page_count {
            return Err(RenderFault::NoSuchPage {
                page,
                count: self.page_count,
            });
        }
        Ok(())
    }
}

impl DocumentRenderer for BlankRenderer {
    fn open(&mut self, _source: &DocumentSource) -> Result<DocumentInfo, RenderFault> {
        self.opened = true;
        Ok(DocumentInfo {
            page_sizes: vec![self.page_size; self.page_count],
            title: None,
        })
    }

    fn page_lines(&self, page: usize) -> Result<Vec<TextLine>, RenderFault> {
        self.check_page(page)?;
        Ok(Vec::new())
    }

    fn page_size(&self, page: usize) -> Result<PageSize, RenderFault> {
        self.check_page(page)?;
        Ok(self.page_size)
    }
}

#[cfg(feature = "pdf")]
pub use self::mupdf_backend::MupdfRenderer;

#[cfg(feature = "pdf")]
mod mupdf_backend {
    use log::{debug, info};
    use mupdf::text_page::TextBlockType;
    use mupdf::{Document, TextPageFlags};

    use super::{DocumentInfo, DocumentRenderer, DocumentSource, RenderFault, TextLine};
    use crate::layout::PageSize;

    /// MuPDF-backed renderer
    #[derive(Default)]
    pub struct MupdfRenderer {
        doc: Option<Document>,
        page_sizes: Vec<PageSize>,
    }

    impl MupdfRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        fn load_page(&self, page: usize) -> Result<mupdf::Page, RenderFault> {
            let doc = self.doc.as_ref().ok_or(RenderFault::NotOpen)?;
            if page == 0 || page > self.page_sizes.len() {
                return Err(RenderFault::NoSuchPage {
                    page,
                    count: self.page_sizes.len(),
                });
            }
            Ok(doc.load_page(page as i32 - 1)?)
        }
    }

    impl DocumentRenderer for MupdfRenderer {
        fn open(&mut self, source: &DocumentSource) -> Result<DocumentInfo, RenderFault> {
            let doc = match source {
                DocumentSource::Path(path) => Document::open(path.to_string_lossy().as_ref())?,
                DocumentSource::Bytes(bytes) => Document::from_bytes(bytes, "application/pdf")?,
            };

            let page_count = doc.page_count()?.max(0) as usize;
            let mut page_sizes = Vec::with_capacity(page_count);
            for page_idx in 0..page_count {
                let page = doc.load_page(page_idx as i32)?;
                let bounds = page.bounds()?;
                page_sizes.push(PageSize::new(
                    f64::from(bounds.x1 - bounds.x0),
                    f64::from(bounds.y1 - bounds.y0),
                ));
            }
            info!("Opened {} ({page_count} pages)", source.describe());

            self.doc = Some(doc);
            self.page_sizes = page_sizes.clone();
            Ok(DocumentInfo {
                page_sizes,
                title: None,
            })
        }

        fn page_lines(&self, page: usize) -> Result<Vec<TextLine>, RenderFault> {
            let page_ref = self.load_page(page)?;
            let text_page = page_ref.to_text_page(TextPageFlags::empty())?;

            let mut lines = Vec::new();
            for block in text_page.blocks() {
                if block.r#type() != TextBlockType::Text {
                    continue;
                }
                for line in block.lines() {
                    let bbox = line.bounds();
                    let text: String = line.chars().filter_map(|ch| ch.char()).collect();
                    if text.trim().is_empty() {
                        continue;
                    }
                    lines.push(TextLine {
                        x0: f64::from(bbox.x0),
                        y0: f64::from(bbox.y0),
                        x1: f64::from(bbox.x1),
                        y1: f64::from(bbox.y1),
                        text,
                    });
                }
            }
            debug!("Page {page}: {} text lines", lines.len());
            Ok(lines)
        }

        fn page_size(&self, page: usize) -> Result<PageSize, RenderFault> {
            page.checked_sub(1)
                .and_then(|idx| self.page_sizes.get(idx))
                .copied()
                .ok_or(RenderFault::NoSuchPage {
                    page,
                    count: self.page_sizes.len(),
                })
        }
    }
}
