//! Catalog event types, envelope schema, and event bus for list-change
//! notifications.
//!
//! The catalog emits an event whenever the note list or an open surface
//! changes state. Downstream consumers (the sidebar view, host status bars,
//! telemetry) subscribe independently via a broadcast channel; the catalog
//! never calls back into the UI directly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Versioned event envelope wrapping a domain event.
///
/// The `event_type` field uses dot-namespaced names (e.g. `"list.changed"`,
/// `"surface.force_closed"`). `payload_version` starts at `1` and increments
/// on breaking payload changes; consumers should ignore unknown fields.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type (e.g. `"list.changed"`).
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Payload schema version.
    pub payload_version: u32,
    /// Domain-specific event data.
    pub payload: CatalogEvent,
}

impl EventEnvelope {
    pub fn new(event: CatalogEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            payload_version: 1,
            payload: event,
        }
    }
}

/// Catalog domain events.
///
/// Serialized as JSON with a `type` tag field, e.g.
/// `{"type":"ListChanged","note_count":3,"filter_text":""}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// The reconciled note list changed (reload, add, delete, rename,
    /// tag-edit, pin-toggle, or filter change).
    ListChanged {
        note_count: usize,
        filter_text: String,
    },
    /// An editor surface was opened or revealed for a note.
    NoteOpened { title: String },
    /// An editor surface was closed.
    NoteClosed { title: String },
    /// A surface was force-closed because its backing file vanished.
    SurfaceForceClosed { title: String },
}

impl CatalogEvent {
    /// Returns the namespaced event type for the envelope.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ListChanged { .. } => "list.changed",
            CatalogEvent::NoteOpened { .. } => "note.opened",
            CatalogEvent::NoteClosed { .. } => "note.closed",
            CatalogEvent::SurfaceForceClosed { .. } => "surface.force_closed",
        }
    }

    /// Returns the note title this event relates to, if any.
    pub fn title(&self) -> Option<&str> {
        match self {
            CatalogEvent::ListChanged { .. } => None,
            CatalogEvent::NoteOpened { title }
            | CatalogEvent::NoteClosed { title }
            | CatalogEvent::SurfaceForceClosed { title } => Some(title),
        }
    }
}

/// Broadcast-based event bus distributing catalog events to subscribers.
///
/// Slow receivers that fall behind receive a `Lagged` error and miss events;
/// the list view recovers by re-reading the catalog, so freshness matters
/// more than completeness here.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl Default for EventBus {
    /// An event bus with the standard capacity,
    /// [`crate::defaults::EVENT_BUS_CAPACITY`].
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity. Tests use a
    /// small capacity; hosts use `EventBus::default()`.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// The event is wrapped in an [`EventEnvelope`] with a UUIDv7 event ID.
    /// If there are no active subscribers, the event is silently dropped.
    pub fn emit(&self, event: CatalogEvent) {
        let envelope = EventEnvelope::new(event);
        let subscriber_count = self.tx.receiver_count();
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count,
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events. Each subscriber gets its own
    /// independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(32);
        let mut rx = bus.subscribe();

        bus.emit(CatalogEvent::ListChanged {
            note_count: 3,
            filter_text: String::new(),
        });

        let envelope = rx.recv().await.unwrap();
        assert!(matches!(
            envelope.payload,
            CatalogEvent::ListChanged { note_count: 3, .. }
        ));
        assert_eq!(envelope.event_type, "list.changed");
        assert_eq!(envelope.payload_version, 1);
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(32);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(CatalogEvent::NoteOpened {
            title: "Alpha".to_string(),
        });

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert!(matches!(e1.payload, CatalogEvent::NoteOpened { .. }));
        assert!(matches!(e2.payload, CatalogEvent::NoteOpened { .. }));
        assert_eq!(e1.event_type, "note.opened");
        assert_eq!(e1.payload.title(), Some("Alpha"));
    }

    #[tokio::test]
    async fn test_event_bus_default_capacity_delivers() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(CatalogEvent::ListChanged {
            note_count: 1,
            filter_text: String::new(),
        });
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_event_bus_no_subscribers_ok() {
        let bus = EventBus::new(32);
        // Should not panic even with no subscribers
        bus.emit(CatalogEvent::NoteClosed {
            title: "Alpha".to_string(),
        });
    }

    #[tokio::test]
    async fn test_event_bus_subscriber_count() {
        let bus = EventBus::new(32);
        assert_eq!(bus.subscriber_count(), 0);

        let _rx1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(_rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_catalog_event_json_serialization() {
        let event = CatalogEvent::SurfaceForceClosed {
            title: "Alpha".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"SurfaceForceClosed""#));
        assert!(json.contains(r#""title":"Alpha""#));
    }

    #[test]
    fn test_envelope_event_ids_are_time_ordered() {
        let a = EventEnvelope::new(CatalogEvent::ListChanged {
            note_count: 0,
            filter_text: String::new(),
        });
        let b = EventEnvelope::new(CatalogEvent::ListChanged {
            note_count: 0,
            filter_text: String::new(),
        });
        assert!(a.event_id <= b.event_id);
    }
}
