//! Scrolling the active highlight into view
//!
//! The overlay for a newly selected highlight may not exist yet (its page
//! has not been laid out or rendered), so the lookup is retried on a
//! bounded schedule. The task is polled from the UI loop and never blocks.

use std::time::{Duration, Instant};

use log::debug;

use crate::geometry::PixelRect;
use crate::viewport::ScrollContainer;

/// Retry schedule for the overlay lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before the first lookup, giving layout a chance to settle
    pub initial_delay: Duration,
    /// Wait between lookups (one frame)
    pub frame_interval: Duration,
    /// Lookups allowed after the first one fails
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(50),
            frame_interval: Duration::from_millis(16),
            max_retries: 10,
        }
    }
}

/// Result of one poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Not due yet, or not found yet with retries left
    Pending,
    /// Found and centered in the viewport
    Scrolled,
    /// Found, already fully visible; scroll position untouched
    AlreadyVisible,
    /// Never found within the retry budget
    GaveUp,
}

impl ScrollOutcome {
    pub fn is_finished(self) -> bool {
        self != ScrollOutcome::Pending
    }
}

#[derive(Clone, Debug)]
pub struct HighlightScrollTask {
    highlight_id: String,
    policy: RetryPolicy,
    next_attempt_at: Instant,
    attempts: u32,
}

impl HighlightScrollTask {
    pub fn new(highlight_id: impl Into<String>, now: Instant, policy: RetryPolicy) -> Self {
        Self {
            highlight_id: highlight_id.into(),
            policy,
            next_attempt_at: now + policy.initial_delay,
            attempts: 0,
        }
    }

    pub fn highlight_id(&self) -> &str {
        &self.highlight_id
    }

    /// When the next lookup is due
    pub fn next_attempt_at(&self) -> Instant {
        self.next_attempt_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run a lookup if one is due. `lookup` maps a highlight id to its
    /// overlay rect in content coordinates.
    pub fn poll<F>(&mut self, now: Instant, lookup: F, container: &mut ScrollContainer) -> ScrollOutcome
    where
        F: FnOnce(&str) -> Option<PixelRect>,
    {
        if now < self.next_attempt_at {
            return ScrollOutcome::Pending;
        }
        self.attempts += 1;

        if let Some(rect) = lookup(&self.highlight_id) {
            if container.fully_visible(&rect) {
                return ScrollOutcome::AlreadyVisible;
            }
            container.scroll_into_view_center(&rect);
            debug!(
                "Scrolled highlight {} into view after {} lookup(s)",
                self.highlight_id, self.attempts
            );
            return ScrollOutcome::Scrolled;
        }

        if self.attempts > self.policy.max_retries {
            debug!(
                "Highlight {} never rendered, giving up after {} lookups",
                self.highlight_id, self.attempts
            );
            return ScrollOutcome::GaveUp;
        }

        self.next_attempt_at = now + self.policy.frame_interval;
        ScrollOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: PixelRect = PixelRect::new(0.0, 2000.0, 100.0, 40.0);

    fn container() -> ScrollContainer {
        ScrollContainer::new(400.0, 10_000.0)
    }

    #[test]
    fn waits_for_initial_delay() {
        let start = Instant::now();
        let mut task = HighlightScrollTask::new("h1", start, RetryPolicy::default());
        let mut sc = container();

        let outcome = task.poll(start + Duration::from_millis(10), |_| Some(RECT), &mut sc);
        assert_eq!(outcome, ScrollOutcome::Pending);
        assert_eq!(task.attempts(), 0);

        let outcome = task.poll(start + Duration::from_millis(50), |_| Some(RECT), &mut sc);
        assert_eq!(outcome, ScrollOutcome::Scrolled);
        assert_eq!(sc.scroll_top(), 2000.0 - 200.0 + 20.0);
    }

    #[test]
    fn visible_target_is_left_alone() {
        let start = Instant::now();
        let mut task = HighlightScrollTask::new("h1", start, RetryPolicy::default());
        let mut sc = container();
        sc.scroll_to(1900.0);

        let outcome = task.poll(start + Duration::from_secs(1), |_| Some(RECT), &mut sc);
        assert_eq!(outcome, ScrollOutcome::AlreadyVisible);
        assert_eq!(sc.scroll_top(), 1900.0);
    }

    #[test]
    fn retries_until_found() {
        let policy = RetryPolicy::default();
        let mut now = Instant::now();
        let mut task = HighlightScrollTask::new("h1", now, policy);
        let mut sc = container();

        now += policy.initial_delay;
        for _ in 0..3 {
            assert_eq!(task.poll(now, |_| None, &mut sc), ScrollOutcome::Pending);
            // not due again until a frame has passed
            assert_eq!(task.poll(now, |_| Some(RECT), &mut sc), ScrollOutcome::Pending);
            now += policy.frame_interval;
        }
        assert_eq!(task.poll(now, |_| Some(RECT), &mut sc), ScrollOutcome::Scrolled);
        assert_eq!(task.attempts(), 4);
    }

    #[test]
    fn gives_up_after_budget() {
        let policy = RetryPolicy::default();
        let mut now = Instant::now() + policy.initial_delay;
        let mut task = HighlightScrollTask::new("missing", now - policy.initial_delay, policy);
        let mut sc = container();

        let mut outcome = ScrollOutcome::Pending;
        while !outcome.is_finished() {
            outcome = task.poll(now, |_| None, &mut sc);
            now += policy.frame_interval;
        }
        assert_eq!(outcome, ScrollOutcome::GaveUp);
        assert_eq!(task.attempts(), policy.max_retries + 1);
        assert_eq!(sc.scroll_top(), 0.0);
    }
}
