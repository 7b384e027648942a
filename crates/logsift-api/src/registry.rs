//! Observer registry: the shared set of live WebSocket connections.
//!
//! Owned exclusively by the event broadcaster side of the system.
//! Sessions register on connect and unregister on disconnect; broadcast
//! iterates the current membership and delivers best-effort, so a dead
//! or slow observer never blocks the others. Membership may change
//! concurrently with a broadcast; each observer is visited at most once.

use actix::prelude::{Message, Recipient};
use dashmap::DashMap;
use logsift_commons::{ConnectionId, EventMessage};

/// Actor message carrying one wire event to a session.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct OutboundEvent(pub EventMessage);

/// Registry of connected observers keyed by connection id.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: DashMap<ConnectionId, Recipient<OutboundEvent>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection_id: ConnectionId, recipient: Recipient<OutboundEvent>) {
        log::info!("Observer connected: {}", connection_id);
        self.observers.insert(connection_id, recipient);
    }

    pub fn unregister(&self, connection_id: &ConnectionId) {
        if self.observers.remove(connection_id).is_some() {
            log::info!("Observer disconnected: {}", connection_id);
        }
    }

    /// Fan one message out to every connected observer. Returns how many
    /// observers were addressed; delivery itself is fire-and-forget.
    pub fn broadcast(&self, message: EventMessage) -> usize {
        let mut sent = 0;
        for entry in self.observers.iter() {
            entry.value().do_send(OutboundEvent(message.clone()));
            sent += 1;
        }
        sent
    }

    pub fn connected(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix::prelude::{Actor, Context, Handler};
    use logsift_commons::JobId;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Collector {
        seen: Arc<Mutex<Vec<EventMessage>>>,
    }

    impl Actor for Collector {
        type Context = Context<Self>;
    }

    impl Handler<OutboundEvent> for Collector {
        type Result = ();

        fn handle(&mut self, msg: OutboundEvent, _ctx: &mut Context<Self>) {
            self.seen.lock().push(msg.0);
        }
    }

    #[actix_rt::test]
    async fn test_broadcast_reaches_every_observer() {
        let registry = ObserverRegistry::new();
        let seen_a: Arc<Mutex<Vec<EventMessage>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_b: Arc<Mutex<Vec<EventMessage>>> = Arc::new(Mutex::new(Vec::new()));

        let addr_a = Collector { seen: seen_a.clone() }.start();
        let addr_b = Collector { seen: seen_b.clone() }.start();
        registry.register(ConnectionId::new("c1"), addr_a.recipient());
        registry.register(ConnectionId::new("c2"), addr_b.recipient());

        let sent = registry.broadcast(EventMessage::Progress {
            job_id: JobId::new("j1"),
            progress: 50,
        });
        assert_eq!(sent, 2);

        // Let the actor mailboxes drain.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(seen_a.lock().len(), 1);
        assert_eq!(seen_b.lock().len(), 1);
    }

    #[actix_rt::test]
    async fn test_unregistered_observer_is_skipped() {
        let registry = ObserverRegistry::new();
        let seen: Arc<Mutex<Vec<EventMessage>>> = Arc::new(Mutex::new(Vec::new()));
        let addr = Collector { seen: seen.clone() }.start();

        registry.register(ConnectionId::new("c1"), addr.recipient());
        registry.unregister(&ConnectionId::new("c1"));
        assert_eq!(registry.connected(), 0);

        let sent = registry.broadcast(EventMessage::Failed {
            job_id: JobId::new("j1"),
            error: "x".to_string(),
        });
        assert_eq!(sent, 0);
    }
}
