//! Current-page tracking
//!
//! The tracker owns `current_page` and `num_pages`. Callers feed it
//! commands and carry out the effects it returns (rescanning visibility,
//! scrolling a page into view).

use log::debug;

/// Next page, clamped to the last one
pub fn next_page(current: usize, total: usize) -> usize {
    (current + 1).min(total)
}

/// Previous page, clamped to the first one
pub fn prev_page(current: usize) -> usize {
    current.saturating_sub(1).max(1)
}

/// Page with the strictly greatest positive visibility ratio.
///
/// Entries are `(page, ratio)`. On equal ratios the first one seen wins;
/// callers should not rely on which that is. `None` when nothing is visible.
pub fn most_visible_page(entries: impl IntoIterator<Item = (usize, f64)>) -> Option<usize> {
    let mut best_ratio = 0.0;
    let mut best = None;
    for (page, ratio) in entries {
        if ratio > best_ratio {
            best_ratio = ratio;
            best = Some(page);
        }
    }
    best
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageTracker {
    current_page: usize,
    num_pages: Option<usize>,
    load_error: Option<String>,
}

impl Default for PageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_page: 1,
            num_pages: None,
            load_error: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn num_pages(&self) -> Option<usize> {
        self.num_pages
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.num_pages.is_some_and(|n| self.current_page < n)
    }

    /// "Page 2 of 5", or "Page 1 of --" before the document has loaded
    pub fn label(&self) -> String {
        match self.num_pages {
            Some(n) if n > 0 => format!("Page {} of {}", self.current_page, n),
            _ => format!("Page {} of --", self.current_page),
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::DocumentLoaded(count) => {
                self.num_pages = Some(count);
                self.load_error = None;
                if count > 0 && self.current_page > count {
                    self.current_page = count;
                }
                vec![Effect::Rescan]
            }

            Command::DocumentFailed(message) => {
                self.load_error = Some(message);
                vec![]
            }

            Command::Visibility(entries) => {
                if let Some(page) = most_visible_page(entries) {
                    if page != self.current_page {
                        debug!("Current page {} -> {page}", self.current_page);
                        self.current_page = page;
                    }
                }
                vec![]
            }

            Command::Next => {
                let Some(total) = self.num_pages else {
                    return vec![];
                };
                self.current_page = next_page(self.current_page, total.max(1));
                vec![Effect::ScrollToPageTop(self.current_page)]
            }

            Command::Prev => {
                self.current_page = prev_page(self.current_page);
                vec![Effect::ScrollToPageTop(self.current_page)]
            }

            Command::ScrollEnded | Command::Resized => {
                if self.num_pages.is_some() {
                    vec![Effect::Rescan]
                } else {
                    vec![]
                }
            }
        }
    }
}

/// Inputs to the tracker
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// The renderer reported the total page count
    DocumentLoaded(usize),
    /// The renderer failed to open the document
    DocumentFailed(String),
    /// Result of a visibility scan: `(page, intersection ratio)` per rendered page
    Visibility(Vec<(usize, f64)>),
    /// Next-page button
    Next,
    /// Previous-page button
    Prev,
    /// A scroll gesture finished
    ScrollEnded,
    /// The container changed size
    Resized,
}

/// Work the caller must do after a command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Measure page visibility once and report it back as `Command::Visibility`
    Rescan,
    /// Scroll the given page's top edge to the top of the viewport
    ScrollToPageTop(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(pages: usize, current: usize) -> PageTracker {
        let mut tracker = PageTracker::new();
        let _ = tracker.apply(Command::DocumentLoaded(pages));
        tracker.current_page = current;
        tracker
    }

    #[test]
    fn page_helpers_clamp() {
        assert_eq!(prev_page(1), 1);
        assert_eq!(next_page(5, 5), 5);
        assert_eq!(next_page(3, 5), 4);
        assert_eq!(prev_page(3), 2);
    }

    #[test]
    fn initial_state() {
        let tracker = PageTracker::new();
        assert_eq!(tracker.current_page(), 1);
        assert_eq!(tracker.num_pages(), None);
        assert_eq!(tracker.label(), "Page 1 of --");
        assert!(!tracker.can_go_prev());
        assert!(!tracker.can_go_next());
    }

    #[test]
    fn load_triggers_rescan() {
        let mut tracker = PageTracker::new();
        let effects = tracker.apply(Command::DocumentLoaded(5));
        assert_eq!(effects, vec![Effect::Rescan]);
        assert_eq!(tracker.label(), "Page 1 of 5");
        assert!(tracker.can_go_next());
    }

    #[test]
    fn navigation_scrolls_to_page() {
        let mut tracker = loaded(5, 1);
        assert_eq!(tracker.apply(Command::Prev), vec![Effect::ScrollToPageTop(1)]);
        assert_eq!(tracker.current_page(), 1);

        let mut tracker = loaded(5, 5);
        assert_eq!(tracker.apply(Command::Next), vec![Effect::ScrollToPageTop(5)]);
        assert_eq!(tracker.current_page(), 5);
        assert!(!tracker.can_go_next());

        let mut tracker = loaded(5, 3);
        assert_eq!(tracker.apply(Command::Next), vec![Effect::ScrollToPageTop(4)]);
        assert_eq!(tracker.current_page(), 4);
    }

    #[test]
    fn next_before_load_is_ignored() {
        let mut tracker = PageTracker::new();
        assert!(tracker.apply(Command::Next).is_empty());
        assert_eq!(tracker.current_page(), 1);
        assert!(tracker.apply(Command::ScrollEnded).is_empty());
    }

    #[test]
    fn visibility_picks_largest_ratio() {
        let mut tracker = loaded(4, 1);
        let _ = tracker.apply(Command::Visibility(vec![(1, 0.2), (2, 0.9), (3, 0.4)]));
        assert_eq!(tracker.current_page(), 2);

        // nothing intersecting leaves the page alone
        let _ = tracker.apply(Command::Visibility(vec![(1, 0.0), (4, 0.0)]));
        assert_eq!(tracker.current_page(), 2);
    }

    #[test]
    fn equal_ratios_keep_first_seen() {
        assert_eq!(most_visible_page([(3, 0.5), (4, 0.5)]), Some(3));
        assert_eq!(most_visible_page(Vec::<(usize, f64)>::new()), None);
    }

    #[test]
    fn failure_is_recorded_and_cleared_by_load() {
        let mut tracker = PageTracker::new();
        let effects = tracker.apply(Command::DocumentFailed("bad xref".into()));
        assert!(effects.is_empty());
        assert_eq!(tracker.load_error(), Some("bad xref"));

        let _ = tracker.apply(Command::DocumentLoaded(2));
        assert_eq!(tracker.load_error(), None);
    }
}
