//! Event bus — republishes session [`FlowEvent`]s to any number of listeners.
//!
//! A `tokio::sync::broadcast` channel. The session only queues events; the
//! flow drivers drain them into the bus after every step. When no
//! subscribers exist, events are silently dropped.

use dyi_capture::{FlowEvent, Session};
use serde::Serialize;
use tokio::sync::broadcast;

/// A flow event stamped with the time it was published.
#[derive(Clone, Debug, Serialize)]
pub struct BusEvent {
    pub timestamp: String,
    #[serde(flatten)]
    pub event: FlowEvent,
}

/// The event bus for one CLI run.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: FlowEvent) {
        tracing::debug!("event: {event:?}");
        let _ = self.sender.send(BusEvent {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event,
        });
    }

    /// Move everything the session has queued onto the bus.
    pub fn publish_from(&self, session: &mut Session) {
        for event in session.drain_events() {
            self.emit(event);
        }
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyi_capture::{NavigationEvent, Stage};

    #[test]
    fn test_event_bus_emit_no_subscribers() {
        let bus = EventBus::new(16);
        // Should not panic when no subscribers
        bus.emit(FlowEvent::AnalysisSucceeded { metric_count: 3 });
    }

    #[test]
    fn test_publish_from_drains_session() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let mut session = Session::new();
        session.set_username("someone");
        session.start_download_flow().unwrap();
        session.observe(&NavigationEvent::new("https://bigzipfiles.instagram.com/d/1"));
        bus.publish_from(&mut session);

        let first = rx.try_recv().unwrap();
        assert_eq!(
            first.event,
            FlowEvent::StageChanged {
                from: Stage::Home,
                to: Stage::DownloadFlow
            }
        );
        assert!(matches!(
            rx.try_recv().unwrap().event,
            FlowEvent::LinkCaptured { .. }
        ));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_bus_event_serializes_flat() {
        let event = BusEvent {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            event: FlowEvent::AnalysisFailed {
                error: "Transport error: refused".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AnalysisFailed");
        assert_eq!(json["timestamp"], "2026-01-01T00:00:00+00:00");
        assert_eq!(json["error"], "Transport error: refused");
    }
}
