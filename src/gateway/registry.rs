//! Subscriber registry and event fan-out for the broadcast variant

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use super::event::GateEvent;

/// Tracks the set of connected broadcast subscribers and delivers events to
/// all of them.
///
/// Cheap to clone; clones share one subscriber set, so the registry can live
/// in the router state and in the shutdown handler at the same time. Each
/// subscriber gets its own unbounded queue, so `broadcast` never blocks on a
/// slow client. Process shutdown is signalled through a cancellation token
/// that every delivery loop observes directly.
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    subscribers: RwLock<HashMap<Uuid, mpsc::UnboundedSender<GateEvent>>>,
    shutdown: CancellationToken,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber with an empty queue.
    #[must_use]
    pub fn subscribe(&self) -> Subscriber {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let total = {
            let mut subscribers = self.inner.subscribers.write();
            subscribers.insert(id, tx);
            subscribers.len()
        };
        info!(subscriber = %id, total, "Subscriber connected");
        Subscriber {
            id,
            rx,
            registry: self.clone(),
        }
    }

    /// Remove a subscriber. Idempotent: removing an id that is already gone
    /// is a no-op and returns false.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        let remaining = {
            let mut subscribers = self.inner.subscribers.write();
            if subscribers.remove(&id).is_none() {
                return false;
            }
            subscribers.len()
        };
        info!(subscriber = %id, remaining, "Subscriber disconnected");
        true
    }

    /// Enqueue `event` onto every currently-registered subscriber's queue.
    /// Returns the number of subscribers reached. Subscribers registering
    /// concurrently may or may not observe the event.
    pub fn broadcast(&self, event: &GateEvent) -> usize {
        let subscribers = self.inner.subscribers.read();
        let mut delivered = 0;
        for tx in subscribers.values() {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of currently-registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Signal process shutdown: every live delivery loop terminates without
    /// waiting for a client-side disconnect.
    pub fn shutdown(&self) {
        info!(
            subscribers = self.subscriber_count(),
            "Shutting down subscriber registry"
        );
        self.inner.shutdown.cancel();
    }
}

/// The receiving half of one subscriber's queue, tied to the lifetime of the
/// client connection that created it.
///
/// Dropping the handle unregisters it, so cleanup runs on every exit path of
/// the delivery loop: client disconnect, shutdown, or panic unwind.
#[derive(Debug)]
pub struct Subscriber {
    id: Uuid,
    rx: mpsc::UnboundedReceiver<GateEvent>,
    registry: SubscriberRegistry,
}

impl Subscriber {
    /// Registry id of this subscriber.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next queued event. Returns `None` once the registry has
    /// dropped this subscriber's sender.
    pub async fn recv(&mut self) -> Option<GateEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.id);
    }
}

/// Per-subscriber delivery loop.
///
/// Waits for shutdown, the next queued event, or `keep_alive` elapsing,
/// whichever comes first. An idle interval yields a synthesized
/// [`GateEvent::Keepalive`]; it is never placed on the queue. The stream ends
/// on shutdown or once the subscriber is unregistered.
pub fn event_stream(
    mut subscriber: Subscriber,
    keep_alive: Duration,
) -> impl Stream<Item = GateEvent> {
    stream! {
        let shutdown = subscriber.registry.inner.shutdown.clone();
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                next = tokio::time::timeout(keep_alive, subscriber.rx.recv()) => match next {
                    Ok(Some(event)) => yield event,
                    // Registry side dropped the sender
                    Ok(None) => break,
                    Err(_) => yield GateEvent::Keepalive,
                },
            }
        }
    }
}
