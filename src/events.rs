//! Outbound component events.

use tokio::sync::mpsc;

/// Events delivered to the component's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An external picker returned a selection, already resolved to a path.
    Selected { path: String },
    /// A compression request finished and its output was written.
    Saved { id: i32, path: String },
    /// A compression request failed.
    Error { message: String },
}

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
