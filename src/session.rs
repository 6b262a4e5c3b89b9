//! Viewer session
//!
//! Ties the page tracker, layout, scroll container and element registries
//! together for one document and one set of highlights/fields. Everything
//! runs on the UI thread; each handler runs to completion before the next.

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};

use crate::fields::{GroupedFields, group_fields};
use crate::geometry::{OVERLAY_PAD, PixelRect, overlay_rect};
use crate::layout::{DocumentLayout, LayoutMetrics, PageSize, skeleton_pages};
use crate::model::{Field, Highlight};
use crate::registry::Registry;
use crate::renderer::{DocumentInfo, DocumentRenderer, DocumentSource, TextLine};
use crate::scroll_task::{HighlightScrollTask, RetryPolicy, ScrollOutcome};
use crate::settings;
use crate::tracker::{Command, Effect, PageTracker};
use crate::viewport::ScrollContainer;

/// Pages whose text is fetched per render pass
const PAGES_PER_PASS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerConfig {
    pub metrics: LayoutMetrics,
    pub overlay_pad: f64,
    pub retry: RetryPolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            metrics: LayoutMetrics::default(),
            overlay_pad: OVERLAY_PAD,
            retry: RetryPolicy::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_settings() -> Self {
        Self {
            metrics: settings::get_layout_metrics(),
            overlay_pad: settings::get_overlay_pad(),
            retry: settings::get_retry_policy(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DocumentState {
    Loading,
    Ready(DocumentInfo),
    Failed(String),
}

pub struct ViewerSession {
    config: ViewerConfig,
    title: Option<String>,
    highlights: Vec<Highlight>,
    fields: Vec<Field>,

    document: DocumentState,
    renderer: Option<Box<dyn DocumentRenderer>>,
    /// Text of rendered pages, in page points; absent until the page renders
    page_text: HashMap<usize, Vec<TextLine>>,

    layout: DocumentLayout,
    container: ScrollContainer,
    tracker: PageTracker,

    page_elements: Registry<usize, PixelRect>,
    highlight_elements: Registry<String, PixelRect>,

    active_highlight_id: Option<String>,
    scroll_task: Option<HighlightScrollTask>,
}

impl ViewerSession {
    pub fn new(highlights: Vec<Highlight>, fields: Vec<Field>, config: ViewerConfig) -> Self {
        Self {
            config,
            title: None,
            highlights,
            fields,
            document: DocumentState::Loading,
            renderer: None,
            page_text: HashMap::new(),
            layout: DocumentLayout::new(Vec::new(), 0.0, config.metrics),
            container: ScrollContainer::default(),
            tracker: PageTracker::new(),
            page_elements: Registry::new(),
            highlight_elements: Registry::new(),
            active_highlight_id: None,
            scroll_task: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    // ------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------

    /// Open the document through `renderer`. A failure is kept as the
    /// session's document state; nothing is retried.
    pub fn load_document(&mut self, mut renderer: Box<dyn DocumentRenderer>, source: &DocumentSource) {
        match renderer.open(source) {
            Ok(info) => {
                info!(
                    "Document {} loaded: {} pages",
                    source.describe(),
                    info.page_count()
                );
                let count = info.page_count();
                self.layout = DocumentLayout::new(
                    info.page_sizes.clone(),
                    self.layout.container_width(),
                    self.config.metrics,
                );
                self.container
                    .set_dimensions(self.container.viewport_height(), self.layout.content_height());
                self.document = DocumentState::Ready(info);
                self.renderer = Some(renderer);
                self.page_text.clear();

                self.render_pass();
                let effects = self.tracker.apply(Command::DocumentLoaded(count));
                self.run_effects(effects);
            }
            Err(e) => {
                warn!("Failed to load document {}: {e}", source.describe());
                let message = e.to_string();
                self.document = DocumentState::Failed(message.clone());
                self.renderer = None;
                self.page_elements.clear();
                self.highlight_elements.clear();
                let effects = self.tracker.apply(Command::DocumentFailed(message));
                self.run_effects(effects);
            }
        }
    }

    pub fn document_state(&self) -> &DocumentState {
        &self.document
    }

    pub fn load_error(&self) -> Option<&str> {
        self.tracker.load_error()
    }

    // ------------------------------------------------------------------
    // Container events
    // ------------------------------------------------------------------

    /// New container size. Page rects are recomputed before the render
    /// pass that repositions the overlays.
    pub fn resize(&mut self, container_width: f64, viewport_height: f64) {
        let width_changed = (container_width - self.layout.container_width()).abs() > f64::EPSILON;
        if width_changed {
            self.layout.resize(container_width);
        }
        self.container
            .set_dimensions(viewport_height, self.layout.content_height());
        self.render_pass();

        let effects = self.tracker.apply(Command::Resized);
        self.run_effects(effects);
    }

    /// Move the document by `delta` pixels. Call [`Self::scroll_ended`] once
    /// the gesture is over.
    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.container.scroll_by(delta)
    }

    pub fn scroll_ended(&mut self) {
        let effects = self.tracker.apply(Command::ScrollEnded);
        self.run_effects(effects);
    }

    pub fn next_page(&mut self) {
        let effects = self.tracker.apply(Command::Next);
        self.run_effects(effects);
    }

    pub fn prev_page(&mut self) {
        let effects = self.tracker.apply(Command::Prev);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Rescan => self.rescan_visibility(),
                Effect::ScrollToPageTop(page) => {
                    let Some(rect) = self.page_elements.get(&page).copied() else {
                        debug!("Page {page} is not mounted, not scrolling");
                        continue;
                    };
                    if self.container.scroll_into_view_start(&rect) {
                        self.scroll_ended();
                    }
                }
            }
        }
    }

    /// One-shot visibility scan over the mounted pages
    fn rescan_visibility(&mut self) {
        let entries: Vec<(usize, f64)> = self
            .page_elements
            .iter()
            .map(|(page, rect)| (*page, self.container.intersection_ratio(rect)))
            .collect();
        let effects = self.tracker.apply(Command::Visibility(entries));
        self.run_effects(effects);
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Mount page elements for the current layout, fetch text for a few
    /// not-yet-rendered pages (the active highlight's page, then visible
    /// ones) and mount the overlay of the active highlight once its page
    /// has rendered.
    pub fn render_pass(&mut self) {
        if !matches!(self.document, DocumentState::Ready(_)) {
            return;
        }

        let page_count = self.layout.page_count();
        self.page_elements.retain(|page| *page <= page_count);
        for (page, rect) in self.layout.pages() {
            self.page_elements.mount(page, rect);
        }

        self.render_pending_pages();
        self.mount_active_overlay();
    }

    fn render_pending_pages(&mut self) {
        let target_page = self.active_highlight().map(|h| h.page);
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };

        let mut pending: Vec<(usize, f64)> = self
            .layout
            .pages()
            .filter(|(page, _)| !self.page_text.contains_key(page))
            .map(|(page, rect)| (page, self.container.intersection_ratio(&rect)))
            .collect();
        // the active highlight's page, then visible pages, then document order
        pending.sort_by_key(|&(page, ratio)| {
            (Some(page) != target_page, ratio <= 0.0, page)
        });

        for (page, _) in pending.into_iter().take(PAGES_PER_PASS) {
            let lines = match renderer.page_lines(page) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!("Failed to render page {page}: {e}");
                    Vec::new()
                }
            };
            self.page_text.insert(page, lines);
        }
    }

    fn mount_active_overlay(&mut self) {
        let active = self.active_highlight_id.clone();
        self.highlight_elements
            .retain(|id| active.as_deref() == Some(id.as_str()));

        let Some(highlight) = self.active_highlight() else {
            return;
        };
        if !self.page_text.contains_key(&highlight.page) {
            return;
        }
        let Some(page_rect) = self.page_elements.get(&highlight.page).copied() else {
            return;
        };

        let rect = overlay_rect(
            highlight,
            page_rect.width,
            page_rect.height,
            self.config.overlay_pad,
        )
        .translate(page_rect.x, page_rect.y);
        let id = highlight.id.clone();
        self.highlight_elements.mount(id, rect);
    }

    pub fn is_page_rendered(&self, page: usize) -> bool {
        self.page_text.contains_key(&page)
    }

    /// Text of a rendered page, scaled to its current display size
    pub fn page_lines(&self, page: usize) -> Option<Vec<TextLine>> {
        let lines = self.page_text.get(&page)?;
        let factor = self.page_scale(page)?;
        Some(lines.iter().map(|line| line.scaled(factor)).collect())
    }

    fn page_scale(&self, page: usize) -> Option<f64> {
        let DocumentState::Ready(info) = &self.document else {
            return None;
        };
        let size: &PageSize = info.page_sizes.get(page.checked_sub(1)?)?;
        if size.width <= 0.0 {
            return Some(0.0);
        }
        Some(self.layout.display_width() / size.width)
    }

    /// Placeholder rects to draw while the document is loading
    pub fn skeleton(&self) -> Vec<PixelRect> {
        skeleton_pages(self.layout.container_width(), 1, &self.config.metrics)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Make `id` the active highlight. Selecting the already-active id does
    /// nothing; a new id starts a fresh scroll task.
    pub fn select_highlight(&mut self, id: Option<String>, now: Instant) {
        if id == self.active_highlight_id {
            return;
        }
        debug!("Active highlight: {id:?}");
        self.active_highlight_id = id;
        self.scroll_task = self
            .active_highlight_id
            .as_ref()
            .map(|id| HighlightScrollTask::new(id.clone(), now, self.config.retry));
        self.render_pass();
    }

    /// Activate the highlight linked to the field at `index` in display order.
    pub fn select_field(&mut self, index: usize, now: Instant) {
        let Some(highlight_id) = self
            .grouped_fields()
            .iter()
            .nth(index)
            .map(|field| field.highlight_id.clone())
        else {
            return;
        };
        self.select_highlight(Some(highlight_id), now);
    }

    pub fn clear_selection(&mut self) {
        self.active_highlight_id = None;
        self.scroll_task = None;
        self.highlight_elements.clear();
    }

    /// Advance pending work: incremental page rendering and the highlight
    /// scroll task. Returns true if anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let rendered_before = self.page_text.len();
        let overlay_before = self.active_overlay_rect();
        self.render_pass();
        let mut changed =
            self.page_text.len() != rendered_before || self.active_overlay_rect() != overlay_before;

        if let Some(task) = self.scroll_task.as_mut() {
            let elements = &self.highlight_elements;
            let outcome = task.poll(now, |id| elements.get(id).copied(), &mut self.container);
            if outcome.is_finished() {
                self.scroll_task = None;
            }
            if outcome == ScrollOutcome::Scrolled {
                changed = true;
                self.render_pass();
                self.scroll_ended();
            }
        }

        changed
    }

    /// When the scroll task next wants to run
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scroll_task.as_ref().map(HighlightScrollTask::next_attempt_at)
    }

    pub fn has_pending_work(&self) -> bool {
        self.scroll_task.is_some()
            || (matches!(self.document, DocumentState::Ready(_))
                && self.page_text.len() < self.layout.page_count())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn grouped_fields(&self) -> GroupedFields<'_> {
        group_fields(&self.fields)
    }

    pub fn active_highlight_id(&self) -> Option<&str> {
        self.active_highlight_id.as_deref()
    }

    /// The active highlight record, if the id matches one
    pub fn active_highlight(&self) -> Option<&Highlight> {
        let id = self.active_highlight_id.as_deref()?;
        self.highlights.iter().find(|h| h.id == id)
    }

    /// Mounted overlay of the active highlight, in content coordinates
    pub fn active_overlay_rect(&self) -> Option<PixelRect> {
        let id = self.active_highlight_id.as_deref()?;
        self.highlight_elements.get(id).copied()
    }

    pub fn is_scroll_pending(&self) -> bool {
        self.scroll_task.is_some()
    }

    pub fn tracker(&self) -> &PageTracker {
        &self.tracker
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn container(&self) -> &ScrollContainer {
        &self.container
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Mounted pages with their rects, in page order
    pub fn page_elements(&self) -> impl Iterator<Item = (usize, PixelRect)> + '_ {
        self.page_elements.iter().map(|(page, rect)| (*page, *rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::BlankRenderer;
    use std::path::PathBuf;
    use std::time::Duration;

    const WIDTH: f64 = 1032.0;
    const HEIGHT: f64 = 800.0;

    fn source() -> DocumentSource {
        DocumentSource::Path(PathBuf::from("doc.pdf"))
    }

    fn session(pages: usize) -> ViewerSession {
        let highlights = vec![
            Highlight::new("h1", 2, 0.1, 0.2, 0.3, 0.1),
            Highlight::new("top", 1, 0.1, 0.05, 0.2, 0.05),
        ];
        let fields = vec![
            Field::new("f1", "Total", None, "h1"),
            Field::new("f2", "Ghost", None, "nope"),
        ];
        let mut session = ViewerSession::new(highlights, fields, ViewerConfig::default());
        session.resize(WIDTH, HEIGHT);
        session.load_document(
            Box::new(BlankRenderer::with_page_size(pages, PageSize::new(100.0, 141.4))),
            &source(),
        );
        session
    }

    fn run_until_idle(session: &mut ViewerSession, start: Instant) -> Instant {
        let mut now = start;
        for _ in 0..100 {
            session.tick(now);
            if session.scroll_task.is_none() {
                break;
            }
            now += Duration::from_millis(16);
        }
        now
    }

    #[test]
    fn starts_loading_then_reports_pages() {
        let mut s = ViewerSession::new(Vec::new(), Vec::new(), ViewerConfig::default());
        assert_eq!(s.document_state(), &DocumentState::Loading);
        assert_eq!(s.tracker().label(), "Page 1 of --");

        s.resize(WIDTH, HEIGHT);
        s.load_document(Box::new(BlankRenderer::new(5)), &source());
        assert_eq!(s.tracker().label(), "Page 1 of 5");
        assert_eq!(s.page_elements().count(), 5);
    }

    #[test]
    fn next_page_scrolls_page_to_top() {
        let mut s = session(5);
        s.next_page();
        assert_eq!(s.tracker().current_page(), 2);
        let page2 = s.layout().page_rect(2).unwrap();
        assert_eq!(s.container().scroll_top(), page2.y);
    }

    #[test]
    fn scrolling_updates_current_page_on_scroll_end() {
        let mut s = session(5);
        let page3 = s.layout().page_rect(3).unwrap();
        s.scroll_by(page3.y);
        assert_eq!(s.tracker().current_page(), 1);
        s.scroll_ended();
        assert_eq!(s.tracker().current_page(), 3);
    }

    #[test]
    fn selecting_field_scrolls_overlay_into_center() {
        let mut s = session(5);
        let start = Instant::now();
        s.select_field(0, start);
        assert_eq!(s.active_highlight_id(), Some("h1"));

        run_until_idle(&mut s, start);
        let overlay = s.active_overlay_rect().expect("overlay mounted");

        // page 2 is 1414px tall at 1000px wide; overlay is padded by 4px
        let page2 = s.layout().page_rect(2).unwrap();
        assert!((overlay.x - (page2.x + 96.0)).abs() < 1e-6);
        assert!((overlay.y - (page2.y + 278.8)).abs() < 1e-6);
        assert!(s.container().fully_visible(&overlay));

        let center = s.container().scroll_top() + HEIGHT / 2.0;
        assert!((center - (overlay.y + overlay.height / 2.0)).abs() < 1e-6);
        assert_eq!(s.tracker().current_page(), 2);
    }

    #[test]
    fn visible_overlay_does_not_move_the_document() {
        let mut s = session(3);
        let start = Instant::now();
        s.select_highlight(Some("top".into()), start);
        run_until_idle(&mut s, start);
        assert_eq!(s.container().scroll_top(), 0.0);
        assert!(s.active_overlay_rect().is_some());
    }

    #[test]
    fn dangling_reference_is_a_silent_no_op() {
        let mut s = session(3);
        let start = Instant::now();
        s.select_field(1, start);
        assert_eq!(s.active_highlight_id(), Some("nope"));

        run_until_idle(&mut s, start);
        assert_eq!(s.active_overlay_rect(), None);
        assert!(!s.is_scroll_pending());
        assert_eq!(s.container().scroll_top(), 0.0);
    }

    #[test]
    fn reselecting_same_highlight_starts_nothing() {
        let mut s = session(3);
        let start = Instant::now();
        s.select_highlight(Some("h1".into()), start);
        run_until_idle(&mut s, start);
        s.scroll_by(-10_000.0);

        s.select_highlight(Some("h1".into()), start);
        assert!(!s.is_scroll_pending());

        s.clear_selection();
        assert_eq!(s.active_overlay_rect(), None);
    }

    #[test]
    fn resize_moves_overlay_with_page() {
        let mut s = session(3);
        let start = Instant::now();
        s.select_highlight(Some("h1".into()), start);
        run_until_idle(&mut s, start);
        let before = s.active_overlay_rect().unwrap();

        s.resize(532.0, HEIGHT);
        let after = s.active_overlay_rect().unwrap();
        assert!(after.width < before.width);
        assert!((after.width - (0.3 * 500.0 + 8.0)).abs() < 1e-6);
    }

    #[test]
    fn highlight_deep_in_long_document_is_reached() {
        let highlights = vec![Highlight::new("deep", 90, 0.1, 0.2, 0.3, 0.1)];
        let fields = vec![Field::new("f", "Deep", None, "deep")];
        let mut s = ViewerSession::new(highlights, fields, ViewerConfig::default());
        s.resize(WIDTH, HEIGHT);
        s.load_document(
            Box::new(BlankRenderer::with_page_size(100, PageSize::new(100.0, 141.4))),
            &source(),
        );
        assert!(!s.is_page_rendered(90));

        let start = Instant::now();
        s.select_field(0, start);
        assert!(s.is_page_rendered(90));
        assert!(s.active_overlay_rect().is_some());

        run_until_idle(&mut s, start);
        let overlay = s.active_overlay_rect().expect("overlay mounted");
        assert!(s.container().fully_visible(&overlay));
        assert_eq!(s.tracker().current_page(), 90);
    }

    #[test]
    fn load_failure_blocks_rendering() {
        struct Broken;
        impl DocumentRenderer for Broken {
            fn open(&mut self, _: &DocumentSource) -> Result<DocumentInfo, crate::renderer::RenderFault> {
                Err(crate::renderer::RenderFault::generic("not a PDF"))
            }
            fn page_lines(&self, _: usize) -> Result<Vec<TextLine>, crate::renderer::RenderFault> {
                Ok(Vec::new())
            }
            fn page_size(&self, _: usize) -> Result<PageSize, crate::renderer::RenderFault> {
                Ok(PageSize::A4)
            }
        }

        let mut s = ViewerSession::new(Vec::new(), Vec::new(), ViewerConfig::default());
        s.resize(WIDTH, HEIGHT);
        s.load_document(Box::new(Broken), &source());
        assert_eq!(s.document_state(), &DocumentState::Failed("not a PDF".into()));
        assert_eq!(s.load_error(), Some("not a PDF"));
        assert_eq!(s.page_elements().count(), 0);

        s.next_page();
        assert_eq!(s.tracker().current_page(), 1);
    }

    #[test]
    fn pages_render_a_few_at_a_time() {
        let mut s = session(10);
        assert_eq!(s.page_text.len(), PAGES_PER_PASS);
        assert!(s.is_page_rendered(1));
        assert!(s.has_pending_work());

        let now = Instant::now();
        s.tick(now);
        s.tick(now);
        assert_eq!(s.page_text.len(), 10);
        assert!(!s.has_pending_work());
    }
}
