//! Typed change notifications.
//!
//! # Responsibility
//! - Describe every observable state change as one `Event` variant.
//! - Fan events out to an explicit list of subscribers.
//!
//! # Invariants
//! - Events are published only after the change is durable in memory
//!   and, for store mutations, persisted.
//! - Subscribers run synchronously, in registration order.

use crate::auth::session::Session;
use crate::model::document::Document;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// Kind of change applied to one stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordEventKind {
    Created,
    Updated,
    Deleted,
}

impl RecordEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// Every notification the core can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A document was created, updated or deleted in `collection`.
    Record {
        collection: String,
        kind: RecordEventKind,
        document: Document,
    },
    /// A pending bill was settled.
    PaymentRecorded { bill: Document },
    /// A member edited their own profile.
    ProfileUpdated { member: Document },
    SignedIn { session: Session },
    SignedOut { email: String },
}

impl Event {
    /// Stable event name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Record { kind, .. } => match kind {
                RecordEventKind::Created => "record_created",
                RecordEventKind::Updated => "record_updated",
                RecordEventKind::Deleted => "record_deleted",
            },
            Self::PaymentRecorded { .. } => "payment_recorded",
            Self::ProfileUpdated { .. } => "profile_updated",
            Self::SignedIn { .. } => "signed_in",
            Self::SignedOut { .. } => "signed_out",
        }
    }
}

/// Capability for publishing events.
pub trait Notifier: Send + Sync {
    fn publish(&self, event: &Event);
}

/// Shared notifier handle given to every component at construction.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn publish(&self, _event: &Event) {}
}

/// Returns a shared no-op notifier.
pub fn noop_notifier() -> SharedNotifier {
    Arc::new(NoopNotifier)
}

type Subscriber = Arc<dyn Fn(&Event) + Send + Sync>;

/// In-process fan-out to registered subscribers.
///
/// Subscribers run outside the registry lock, so they may publish or
/// subscribe again (directly or through the store).
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscriber; it sees every event published afterwards.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Notifier for EventBus {
    fn publish(&self, event: &Event) {
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        log::debug!(
            "event=event_publish module=event status=ok name={} subscribers={}",
            event.name(),
            subscribers.len()
        );
        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }
}

impl Debug for EventBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Subscriber helper that records every event it sees.
///
/// Handy for wiring assertions and audit trails.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers this log on `bus`.
    pub fn attach(&self, bus: &EventBus) {
        let events = Arc::clone(&self.events);
        bus.subscribe(move |event| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        });
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.snapshot().iter().map(Event::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventBus, EventLog, Notifier};
    use crate::auth::permission::Role;
    use crate::auth::session::Session;
    use std::sync::Arc;

    #[test]
    fn bus_delivers_to_every_subscriber_in_order() {
        let bus = EventBus::new();
        let first = EventLog::new();
        let second = EventLog::new();
        first.attach(&bus);
        second.attach(&bus);

        bus.publish(&Event::SignedOut {
            email: "admin@gym.com".to_string(),
        });

        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(first.names(), vec!["signed_out"]);
        assert_eq!(second.snapshot().len(), 1);
    }

    #[test]
    fn subscriber_may_publish_on_the_same_bus() {
        let bus = Arc::new(EventBus::new());
        let log = EventLog::new();
        log.attach(&bus);
        let weak = Arc::downgrade(&bus);
        bus.subscribe(move |event| {
            if let (Event::SignedIn { session }, Some(bus)) = (event, weak.upgrade()) {
                bus.publish(&Event::SignedOut {
                    email: session.email.clone(),
                });
            }
        });

        bus.publish(&Event::SignedIn {
            session: Session::new("admin@gym.com", "Admin", Role::Admin),
        });

        assert_eq!(log.names(), vec!["signed_in", "signed_out"]);
    }
}
