//! Change notifications for the appointment collection.

use tokio::sync::broadcast;

use crate::models::{AppointmentId, ArtistId, ShopId};

/// Emitted after a mutation has been committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    Added(AppointmentId),
    Edited(AppointmentId),
    Deleted(Vec<AppointmentId>),
    /// An artist was removed; the listed appointments lost their artist.
    ArtistRemoved {
        artist: ArtistId,
        detached: Vec<AppointmentId>,
    },
    /// A shop was removed; the listed appointments lost their shop.
    ShopRemoved {
        shop: ShopId,
        detached: Vec<AppointmentId>,
    },
}

/// Broadcast channel for [`CollectionEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<CollectionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn emit(
        &self,
        event: CollectionEvent,
    ) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
