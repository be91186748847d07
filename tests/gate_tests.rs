//! Cross-component tests for the gate core: fan-out, delivery loops,
//! keepalives, shutdown, and poll-state semantics.

use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;

use gate_server::gateway::{GateEvent, GateState, SubscriberRegistry, event_stream};

const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Every subscriber registered before a broadcast receives it; one
/// registered after does not.
#[tokio::test]
async fn broadcast_reaches_only_prior_subscribers() {
    let registry = SubscriberRegistry::new();
    let mut first = registry.subscribe();
    let mut second = registry.subscribe();

    let opened = GateEvent::Opened {
        name: "Acme Corp".to_string(),
    };
    assert_eq!(registry.broadcast(&opened), 2);

    let mut late = registry.subscribe();
    registry.broadcast(&GateEvent::Closed);

    assert_eq!(first.recv().await, Some(opened.clone()));
    assert_eq!(first.recv().await, Some(GateEvent::Closed));
    assert_eq!(second.recv().await, Some(opened));
    assert_eq!(second.recv().await, Some(GateEvent::Closed));

    // The late subscriber's first event is the close, never the open
    assert_eq!(late.recv().await, Some(GateEvent::Closed));
}

/// An idle delivery loop synthesizes a keepalive after the interval and the
/// stream stays open for real events afterwards.
#[tokio::test(start_paused = true)]
async fn idle_subscriber_receives_keepalive() {
    let registry = SubscriberRegistry::new();
    let subscriber = registry.subscribe();
    let mut stream = Box::pin(event_stream(subscriber, KEEP_ALIVE));

    // No events queued: virtual time advances to the keepalive deadline
    assert_eq!(stream.next().await, Some(GateEvent::Keepalive));
    assert_eq!(stream.next().await, Some(GateEvent::Keepalive));

    registry.broadcast(&GateEvent::Closed);
    assert_eq!(stream.next().await, Some(GateEvent::Closed));
}

/// Queued events preempt the keepalive timer.
#[tokio::test(start_paused = true)]
async fn queued_event_is_delivered_before_keepalive() {
    let registry = SubscriberRegistry::new();
    let subscriber = registry.subscribe();

    registry.broadcast(&GateEvent::Opened {
        name: "Acme Corp".to_string(),
    });

    let mut stream = Box::pin(event_stream(subscriber, KEEP_ALIVE));
    assert_eq!(
        stream.next().await,
        Some(GateEvent::Opened {
            name: "Acme Corp".to_string()
        })
    );
}

/// Shutdown terminates every live delivery loop without client disconnect.
#[tokio::test]
async fn shutdown_terminates_all_delivery_loops() {
    let registry = SubscriberRegistry::new();
    let mut first = Box::pin(event_stream(registry.subscribe(), KEEP_ALIVE));
    let mut second = Box::pin(event_stream(registry.subscribe(), KEEP_ALIVE));
    assert_eq!(registry.subscriber_count(), 2);

    registry.shutdown();

    assert_eq!(first.next().await, None);
    assert_eq!(second.next().await, None);

    // The ended streams dropped their subscribers
    assert_eq!(registry.subscriber_count(), 0);
    assert_eq!(registry.broadcast(&GateEvent::Closed), 0);
}

/// The stream ends when the subscriber is unregistered from the registry
/// side, and the drop-cleanup stays idempotent.
#[tokio::test]
async fn registry_side_removal_ends_the_stream() {
    let registry = SubscriberRegistry::new();
    let subscriber = registry.subscribe();
    let id = subscriber.id();
    let mut stream = Box::pin(event_stream(subscriber, KEEP_ALIVE));

    assert!(registry.unsubscribe(id));
    assert_eq!(stream.next().await, None);

    drop(stream);
    assert!(!registry.unsubscribe(id));
    assert_eq!(registry.subscriber_count(), 0);
}

/// Dropping a stream (client disconnect) removes the subscriber, and later
/// broadcasts no longer count it.
#[tokio::test]
async fn disconnect_removes_subscriber_from_membership() {
    let registry = SubscriberRegistry::new();
    let mut kept = registry.subscribe();
    let dropped = Box::pin(event_stream(registry.subscribe(), KEEP_ALIVE));
    assert_eq!(registry.subscriber_count(), 2);

    drop(dropped);
    assert_eq!(registry.subscriber_count(), 1);

    let event = GateEvent::Opened {
        name: "Acme Corp".to_string(),
    };
    assert_eq!(registry.broadcast(&event), 1);
    assert_eq!(kept.recv().await, Some(event));
}

/// For any sequence of open/close calls, status reflects the most recent.
#[test]
fn status_follows_the_latest_transition() {
    let state = GateState::new();

    let opened = state.open("Acme Corp");
    assert!(opened.is_open);
    assert_eq!(opened.name, "Acme Corp");
    assert!(opened.timestamp > 0);
    assert_eq!(state.status(), opened);

    let closed = state.close();
    assert!(!closed.is_open);
    assert_eq!(closed.name, "");
    assert!(closed.timestamp >= opened.timestamp);
    assert_eq!(state.status(), closed);

    state.open("Second Visitor");
    let current = state.status();
    assert!(current.is_open);
    assert_eq!(current.name, "Second Visitor");
}

/// Concurrent opens never produce a torn snapshot: the name always belongs
/// to the same transition as the flag and timestamp.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transitions_stay_consistent() {
    use std::sync::Arc;

    let state = Arc::new(GateState::new());
    let mut handles = Vec::new();

    for i in 0..8 {
        let state = Arc::clone(&state);
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                if i % 2 == 0 {
                    state.open(&format!("visitor-{i}"));
                } else {
                    state.close();
                }
                let snapshot = state.status();
                if snapshot.is_open {
                    assert!(snapshot.name.starts_with("visitor-"));
                } else {
                    assert_eq!(snapshot.name, "");
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}
