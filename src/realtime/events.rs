use serde::{Deserialize, Serialize};

/// Status change carried by a `notification_changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChange {
    Read,
    Unread,
    Archive,
}

/// Server-side change pushed by the realtime channel.
///
/// Events are serialized using serde's adjacently tagged representation:
/// `{"type": "event_name", "payload": {...}}`. Unit events carry no payload.
/// Delivery is at-least-once, so handlers must tolerate duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum RealtimeEvent {
    #[serde(rename = "notification_created")]
    NotificationCreated { id: String },

    #[serde(rename = "notification_deleted")]
    NotificationDeleted { id: String },

    #[serde(rename = "notification_changed")]
    NotificationChanged {
        id: String,
        change: NotificationChange,
    },

    #[serde(rename = "all_read")]
    AllRead,

    #[serde(rename = "all_seen")]
    AllSeen,

    #[serde(rename = "reload")]
    Reload,
}

impl RealtimeEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            RealtimeEvent::NotificationCreated { .. } => "notification_created",
            RealtimeEvent::NotificationDeleted { .. } => "notification_deleted",
            RealtimeEvent::NotificationChanged { .. } => "notification_changed",
            RealtimeEvent::AllRead => "all_read",
            RealtimeEvent::AllSeen => "all_seen",
            RealtimeEvent::Reload => "reload",
        }
    }
}
