//! Integration tests for request/acknowledgement correlation.
//!
//! Acknowledgements carry no identifier, so every scenario here checks that
//! `success`/`huh?` resolve the oldest outstanding command, that `noop`
//! replies use their own queue, and that push messages interleaved with
//! replies never consume a pending call.

use tokio::sync::mpsc::UnboundedReceiver;

use lcdd_client::client::events::{ClientEvent, EventKind};
use lcdd_client::client::session::SessionState;
use lcdd_client::client::widgets::Position;
use lcdd_client::client::WidgetOptions;
use lcdd_client::protocol::command::{
    BacklightState, IconName, KeyMode, OutputState, ScreenAttributes, WidgetType,
};
use lcdd_client::protocol::codec::MAX_LINE_BYTES;
use lcdd_client::AppError;

use super::test_helpers::{ready_client, FakeServer, STEP_TIMEOUT};

#[tokio::test]
async fn acknowledgements_resolve_in_request_order() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;
    let (_id, mut keys) = client.events().channel(EventKind::KeyPress);

    let first = client.add_key_named(["A"], "exclusive").await.expect("first");
    let second = client.add_key(["Enter"], KeyMode::Shared).await.expect("second");
    let third = client.add_screen("Test1").await.expect("third");

    peer.expect("client_add_key -exclusively A").await;
    peer.expect("client_add_key -shared Enter").await;
    peer.expect("screen_add Test1").await;

    peer.send("success").await;
    peer.send("key A").await;
    peer.send("huh? Key already reserved").await;
    peer.send("listen Test1").await;
    peer.send("success").await;

    assert_eq!(first.await, Ok(()));
    assert_eq!(
        second.await,
        Err(AppError::ServerRejected("huh? Key already reserved".into()))
    );
    assert_eq!(third.await, Ok(()));
    assert_eq!(keys.recv().await, Some(ClientEvent::KeyPress("A".into())));
}

#[tokio::test]
async fn screen_with_attributes_resolves_after_both_acknowledgements() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    let attrs = ScreenAttributes::new().name("Test Screen").priority("alert");
    let ack = client.add_screen_with("Test1", attrs).await.expect("submit");
    let pending = tokio::spawn(ack);

    peer.expect("screen_add Test1").await;
    peer.send("success").await;
    peer.expect("screen_set Test1 -name {Test Screen} -priority alert")
        .await;
    assert!(
        !pending.is_finished(),
        "ack must wait for the screen_set reply"
    );

    peer.send("success").await;
    let outcome = tokio::time::timeout(STEP_TIMEOUT, pending)
        .await
        .expect("ack timed out")
        .expect("join");
    assert_eq!(outcome, Ok(()));
}

#[tokio::test]
async fn failed_screen_add_skips_attribute_update() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    let ack = client
        .add_screen_with("Test1", ScreenAttributes::new().name("Test Screen"))
        .await
        .expect("submit");
    peer.expect("screen_add Test1").await;
    peer.send("huh? Screen already exists").await;

    assert_eq!(
        ack.await,
        Err(AppError::ServerRejected("huh? Screen already exists".into()))
    );

    let follow_up = client.noop().await.expect("noop");
    peer.expect("noop").await;
    peer.send("noop").await;
    assert_eq!(follow_up.await, Ok(()));
}

#[tokio::test]
async fn widget_with_params_is_created_then_set() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    let ack = client
        .add_icon_widget("Test1", "Widget3", Position::new(1, 4), IconName::PlayReverse)
        .await
        .expect("submit");

    peer.expect("widget_add Test1 Widget3 icon").await;
    peer.send("success").await;
    peer.expect("widget_set Test1 Widget3 1 4 PLAYR").await;
    peer.send("success").await;
    assert_eq!(ack.await, Ok(()));

    let plain = client
        .add_widget("Test1", "Frame1", WidgetType::Frame, WidgetOptions::new())
        .await
        .expect("plain add");
    let nested = client
        .add_widget(
            "Test1",
            "Inner",
            WidgetType::String,
            WidgetOptions::new().in_frame("Frame1"),
        )
        .await
        .expect("nested add");
    peer.expect("widget_add Test1 Frame1 frame").await;
    peer.expect("widget_add Test1 Inner string -in Frame1").await;
    peer.send("success").await;
    peer.send("success").await;
    assert_eq!(plain.await, Ok(()));
    assert_eq!(nested.await, Ok(()));
}

#[tokio::test]
async fn noop_replies_use_their_own_queue() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    let noop = client.noop().await.expect("noop");
    let screen = client.add_screen("Test1").await.expect("screen");
    peer.expect("noop").await;
    peer.expect("screen_add Test1").await;

    // Replies arrive out of request order across the two queues.
    peer.send("huh? Screen already exists").await;
    peer.send("noop").await;

    assert!(matches!(screen.await, Err(AppError::ServerRejected(_))));
    assert_eq!(noop.await, Ok(()));
}

#[tokio::test]
async fn unmatched_replies_become_events() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;
    let (_s, mut successes) = client.events().channel(EventKind::Success);
    let (_e, mut errors) = client.events().channel(EventKind::Error);

    peer.send("success").await;
    peer.send("huh? Unsolicited").await;

    assert_eq!(successes.recv().await, Some(ClientEvent::Success));
    assert_eq!(
        errors.recv().await,
        Some(ClientEvent::Error(AppError::ServerRejected(
            "huh? Unsolicited".into()
        )))
    );
    assert!(client.is_ready(), "unmatched replies are not fatal");
}

#[tokio::test]
async fn repeated_screen_delete_is_forwarded_verbatim() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    let first = client.del_screen("Test1").await.expect("first");
    let second = client.del_screen("Test1").await.expect("second");
    peer.expect("screen_del Test1").await;
    peer.expect("screen_del Test1").await;

    peer.send("success").await;
    peer.send("huh? Unknown screen id").await;

    assert_eq!(first.await, Ok(()));
    assert!(matches!(second.await, Err(AppError::ServerRejected(_))));
}

#[tokio::test]
async fn info_is_written_untracked() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    client.info().await.expect("info");
    let output = client.output(OutputState::On).await.expect("output");
    let backlight = client
        .set_backlight(BacklightState::Blink)
        .await
        .expect("backlight");

    peer.expect("info").await;
    peer.expect("output on").await;
    peer.expect("backlight blink").await;
    peer.send("success").await;
    peer.send("success").await;

    assert_eq!(output.await, Ok(()));
    assert_eq!(backlight.await, Ok(()));
}

#[tokio::test]
async fn invalid_arguments_fail_before_anything_is_sent() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    let err = client
        .add_widget_named("Test1", "W", "graph", WidgetOptions::new())
        .await
        .expect_err("unknown widget type");
    assert!(matches!(err, AppError::InvalidWidgetType(_)));

    let err = client
        .add_num_widget("Test1", "N", 1, 11)
        .await
        .expect_err("digit out of range");
    assert!(matches!(err, AppError::InvalidNumberRange(_)));

    let err = client
        .add_key_named(["A"], "bogus-mode")
        .await
        .expect_err("unknown key mode");
    assert_eq!(err, AppError::InvalidKeyMode("<bogus-mode>".into()));

    let no_keys: [&str; 0] = [];
    let err = client
        .add_key(no_keys, KeyMode::Shared)
        .await
        .expect_err("empty key list");
    assert!(matches!(err, AppError::MissingArgument(_)));
    assert!(matches!(
        client.delete_key(no_keys).await,
        Err(AppError::MissingArgument(_))
    ));
    assert!(matches!(
        client.set_widget("Test1", "W", no_keys).await,
        Err(AppError::MissingArgument(_))
    ));

    // Nothing above reached the wire: the marker is the next line.
    let marker = client.noop().await.expect("noop");
    peer.expect("noop").await;
    peer.send("noop").await;
    assert_eq!(marker.await, Ok(()));
}

#[tokio::test]
async fn push_messages_are_dispatched() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;
    let (_l, mut listens) = client.events().channel(EventKind::Listen);
    let (_i, mut ignores) = client.events().channel(EventKind::Ignore);
    let (_m, mut menus) = client.events().channel(EventKind::MenuEvent);

    peer.send("listen Test1").await;
    peer.send("ignore Test1").await;
    peer.send("menuevent select item1").await;

    assert_eq!(
        next_event(&mut listens).await,
        ClientEvent::Listen("Test1".into())
    );
    assert_eq!(
        next_event(&mut ignores).await,
        ClientEvent::Ignore("Test1".into())
    );
    assert_eq!(
        next_event(&mut menus).await,
        ClientEvent::MenuEvent("menuevent select item1".into())
    );
}

#[tokio::test]
async fn non_utf8_line_does_not_end_the_session() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;
    let (_id, mut keys) = client.events().channel(EventKind::KeyPress);

    let ack = client.add_screen("Test1").await.expect("submit");
    peer.expect("screen_add Test1").await;
    peer.send_bytes(b"key \xe9\nsuccess\n").await;

    assert_eq!(ack.await, Ok(()));
    assert_eq!(
        next_event(&mut keys).await,
        ClientEvent::KeyPress("\u{fffd}".into())
    );
    assert!(matches!(client.state(), SessionState::Ready(_)));
}

#[tokio::test]
async fn oversized_line_is_dropped_and_session_continues() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    let ack = client.add_screen("Test1").await.expect("submit");
    peer.expect("screen_add Test1").await;
    let long = format!("menuevent {}", "x".repeat(MAX_LINE_BYTES + 1000));
    peer.send(&long).await;
    peer.send("success").await;

    assert_eq!(ack.await, Ok(()));
    assert!(client.is_ready());

    let next = client.noop().await.expect("noop");
    peer.expect("noop").await;
    peer.send("noop").await;
    assert_eq!(next.await, Ok(()));
}

async fn next_event(rx: &mut UnboundedReceiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(STEP_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}
