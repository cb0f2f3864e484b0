//! Transient notifications shown in the corner of the dashboard.
//!
//! Items are kept in insertion order and identified by an incrementing id.
//! Each item either expires after its duration or stays until dismissed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a notification stays up unless told otherwise
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Success => "✓",
            NotificationKind::Error => "✗",
            NotificationKind::Warning => "⚠",
            NotificationKind::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// `None` for sticky notifications
    pub expires_at: Option<Instant>,
}

#[derive(Debug)]
pub struct NotificationQueue {
    items: VecDeque<Notification>,
    next_id: u64,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
        }
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notification. A zero duration makes it sticky.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration: Duration,
    ) -> u64 {
        self.push_at(Instant::now(), kind, title, message, duration)
    }

    pub fn push_at(
        &mut self,
        now: Instant,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration: Duration,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let expires_at = (!duration.is_zero()).then(|| now + duration);
        self.items.push_back(Notification {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            expires_at,
        });
        id
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Info, title, message, DEFAULT_NOTIFICATION_DURATION)
    }

    pub fn warning(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Warning, title, message, DEFAULT_NOTIFICATION_DURATION)
    }

    pub fn error(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, title, message, DEFAULT_NOTIFICATION_DURATION)
    }

    pub fn success(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, title, message, DEFAULT_NOTIFICATION_DURATION)
    }

    /// Remove a notification. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop the oldest notification, if any
    pub fn dismiss_oldest(&mut self) -> Option<Notification> {
        self.items.pop_front()
    }

    /// Drop every notification whose time is up
    pub fn prune_expired(&mut self, now: Instant) {
        self.items
            .retain(|n| n.expires_at.map(|at| now < at).unwrap_or(true));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increment_from_one() {
        let mut queue = NotificationQueue::new();
        assert_eq!(queue.info("a", "first"), 1);
        assert_eq!(queue.error("b", "second"), 2);
        let ids: Vec<u64> = queue.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_prune_expired_keeps_sticky() {
        let now = Instant::now();
        let mut queue = NotificationQueue::new();
        queue.push_at(now, NotificationKind::Info, "short", "", Duration::from_secs(1));
        let sticky = queue.push_at(now, NotificationKind::Warning, "sticky", "", Duration::ZERO);
        queue.push_at(now, NotificationKind::Success, "long", "", Duration::from_secs(10));

        queue.prune_expired(now + Duration::from_secs(1));
        let titles: Vec<&str> = queue.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["sticky", "long"]);

        queue.prune_expired(now + Duration::from_secs(3600));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().map(|n| n.id), Some(sticky));
    }

    #[test]
    fn test_dismiss() {
        let mut queue = NotificationQueue::new();
        let id = queue.warning("w", "careful");
        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_dismiss() {
        let mut queue = NotificationQueue::new();
        let first = queue.info("a", "");
        queue.dismiss(first);
        assert_eq!(queue.info("b", ""), 2);
    }
}
