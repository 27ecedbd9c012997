//! Unit tests for the event registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lcdd_client::client::events::{ClientEvent, EventBus, EventKind};

#[test]
fn handlers_only_receive_their_kind_in_registration_order() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second"] {
        let seen = Arc::clone(&seen);
        bus.subscribe(EventKind::KeyPress, move |event| {
            if let ClientEvent::KeyPress(key) = event {
                seen.lock().unwrap().push(format!("{tag}:{key}"));
            }
        });
    }

    bus.emit(&ClientEvent::Listen("Test1".into()));
    bus.emit(&ClientEvent::KeyPress("A".into()));

    assert_eq!(*seen.lock().unwrap(), vec!["first:A", "second:A"]);
}

#[test]
fn unsubscribed_handler_is_not_called() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = bus.subscribe(EventKind::Success, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bus.emit(&ClientEvent::Success);
    assert!(bus.unsubscribe(id));
    assert!(!bus.unsubscribe(id), "second unsubscribe reports false");
    bus.emit(&ClientEvent::Success);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn channel_forwards_events() {
    let bus = EventBus::new();
    let (_id, mut rx) = bus.channel(EventKind::Ignore);

    bus.emit(&ClientEvent::Ignore("Test1".into()));

    assert_eq!(rx.recv().await, Some(ClientEvent::Ignore("Test1".into())));
}
