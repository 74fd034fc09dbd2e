//! Debounced status-change notifications
//!
//! A label change is held for one quiet window before it is announced.
//! Further changes inside that window are coalesced, and whatever label is
//! current when the window closes is the one announced. A change that reverts
//! to the announced label inside the window is dropped.

use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct ChangeNotifier {
    last_label: Option<String>,
    /// When the label first differed from `last_label` in the current burst
    pending_since: Option<Instant>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label most recently recorded or announced.
    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    /// Whether a change is waiting for its window to close.
    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Observe the current label; returns it when a notification is due.
    ///
    /// The first observation is recorded silently so startup never toasts.
    /// With notifications disabled, labels are tracked but never returned.
    pub fn observe(
        &mut self,
        label: &str,
        now: Instant,
        min_interval: Duration,
        enabled: bool,
    ) -> Option<String> {
        let Some(last_label) = self.last_label.as_deref() else {
            self.last_label = Some(label.to_string());
            return None;
        };

        if last_label == label {
            self.pending_since = None;
            return None;
        }

        if !enabled {
            self.last_label = Some(label.to_string());
            self.pending_since = None;
            return None;
        }

        let since = *self.pending_since.get_or_insert(now);
        if now.saturating_duration_since(since) < min_interval {
            return None;
        }

        self.last_label = Some(label.to_string());
        self.pending_since = None;
        Some(label.to_string())
    }
}
