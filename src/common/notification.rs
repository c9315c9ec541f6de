//! # Notifications
//!
//! A single-slot, transient status message shown to the user. Showing a new
//! notification replaces whatever was visible; dismissing hides it.
//!
//! [`NotificationCenter`] owns the slot and fans every change out on a
//! broadcast channel so a front-end (or a test) can observe the full sequence,
//! e.g. `pending -> success`.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Capacity of the change feed. Slow observers lose the oldest changes first.
const FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Pending,
}

/// What the user currently sees in the notification slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Notification {
    Hidden,
    Visible {
        message: String,
        details: String,
        kind: NotificationKind,
    },
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Notification::Visible {
            message: message.into(),
            details: String::new(),
            kind,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn pending(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Pending, message)
    }

    pub fn with_details(self, details: impl Into<String>) -> Self {
        match self {
            Notification::Visible { message, kind, .. } => Notification::Visible {
                message,
                details: details.into(),
                kind,
            },
            Notification::Hidden => Notification::Hidden,
        }
    }

    pub fn kind(&self) -> Option<NotificationKind> {
        match self {
            Notification::Visible { kind, .. } => Some(*kind),
            Notification::Hidden => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Notification::Visible { message, .. } => Some(message),
            Notification::Hidden => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, Notification::Visible { .. })
    }
}

impl Default for Notification {
    fn default() -> Self {
        Notification::Hidden
    }
}

/// Owner of the notification slot.
///
/// Cloning shares the same slot and feed.
#[derive(Clone)]
pub struct NotificationCenter {
    slot: Arc<Mutex<Notification>>,
    feed: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            slot: Arc::new(Mutex::new(Notification::Hidden)),
            feed,
        }
    }

    /// Replace the current notification.
    pub fn show(&self, notification: Notification) {
        {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            *slot = notification.clone();
        }
        // no receivers is fine
        let _ = self.feed.send(notification);
    }

    /// Hide whatever is showing. Always leaves the slot `Hidden`.
    pub fn dismiss(&self) {
        self.show(Notification::Hidden);
    }

    pub fn current(&self) -> Notification {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Subscribe to every subsequent change, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.feed.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_notification_replaces_previous() {
        let center = NotificationCenter::new();
        center.show(Notification::pending("Uploading file..."));
        center.show(Notification::success("File uploaded successfully!"));

        assert_eq!(center.current().kind(), Some(NotificationKind::Success));
        assert_eq!(center.current().message(), Some("File uploaded successfully!"));
    }

    #[test]
    fn dismiss_always_hides() {
        let center = NotificationCenter::new();
        for n in [
            Notification::success("ok"),
            Notification::error("bad"),
            Notification::info("fyi"),
            Notification::pending("wait"),
            Notification::Hidden,
        ] {
            center.show(n);
            center.dismiss();
            assert_eq!(center.current(), Notification::Hidden);
        }
    }

    #[tokio::test]
    async fn subscribers_see_every_change() {
        let center = NotificationCenter::new();
        let mut rx = center.subscribe();

        center.show(Notification::pending("Uploading file..."));
        center.dismiss();

        assert_eq!(rx.recv().await.unwrap().kind(), Some(NotificationKind::Pending));
        assert_eq!(rx.recv().await.unwrap(), Notification::Hidden);
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_value(Notification::error("Error uploading file.")).unwrap();
        assert_eq!(json["state"], "visible");
        assert_eq!(json["kind"], "error");
        assert_eq!(json["details"], "");
    }
}
