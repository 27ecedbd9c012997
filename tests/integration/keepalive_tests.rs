//! Integration tests for the keep-alive timer.

use std::time::Duration;

use lcdd_client::client::keepalive::KeepAlive;
use lcdd_client::Client;

use super::test_helpers::{ready_client, FakeServer, Peer, CLIENT_NAME, CONNECT_LINE};

#[tokio::test]
async fn timer_sends_noop_once_ready() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    client
        .set_keep_alive(Duration::from_millis(50))
        .expect("start keep-alive");
    assert_eq!(
        client.keep_alive(),
        KeepAlive::Every(Duration::from_millis(50))
    );

    peer.expect("noop").await;
    peer.send("noop").await;
    peer.expect("noop").await;
    peer.send("noop").await;

    client.set_keep_alive(false).expect("stop keep-alive");
    assert_eq!(client.keep_alive(), KeepAlive::Disabled);
}

/// Submit a marker command and read up to it, answering any keep-alive
/// `noop` written before it.
async fn sync_through_marker(client: &Client, peer: &mut Peer, marker: &str) {
    let ack = client.add_screen(marker).await.expect("marker");
    let expected = format!("screen_add {marker}");
    loop {
        let line = peer.recv().await.expect("client line");
        if line == expected {
            break;
        }
        assert_eq!(line, "noop", "only keep-alives may precede the marker");
        peer.send("noop").await;
    }
    peer.send("success").await;
    assert_eq!(ack.await, Ok(()));
}

#[tokio::test]
async fn resetting_interval_replaces_running_timer() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    client
        .set_keep_alive(Duration::from_millis(30))
        .expect("fast timer");
    peer.expect("noop").await;
    peer.send("noop").await;

    client
        .set_keep_alive(Duration::from_millis(500))
        .expect("slow timer");
    sync_through_marker(&client, &mut peer, "marker1").await;

    // The 30 ms timer would have fired several times by now.
    peer.expect_quiet(Duration::from_millis(250)).await;

    // The replacement is the only timer left and still runs.
    peer.expect("noop").await;
    peer.send("noop").await;
}

#[tokio::test]
async fn disabling_stops_the_timer() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;

    client
        .set_keep_alive(Duration::from_millis(40))
        .expect("start timer");
    peer.expect("noop").await;
    peer.send("noop").await;

    client.set_keep_alive(false).expect("stop timer");
    sync_through_marker(&client, &mut peer, "marker2").await;

    peer.expect_quiet(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn timer_stays_quiet_during_handshake() {
    let server = FakeServer::bind().await;
    let client = Client::new(server.config());
    client
        .set_keep_alive(Duration::from_millis(20))
        .expect("store setting");

    client.connect().await.expect("connect");
    let mut peer = server.accept().await;
    peer.expect("hello").await;

    // Several ticks elapse before the server answers.
    tokio::time::sleep(Duration::from_millis(150)).await;
    peer.send(CONNECT_LINE).await;
    peer.expect(&format!("client_set name {CLIENT_NAME}")).await;
    peer.send("success").await;

    client.wait_ready().await.expect("ready");
    peer.expect("noop").await;
}

#[tokio::test]
async fn configured_interval_is_applied_on_connect() {
    let server = FakeServer::bind().await;
    let config = server.config().with_keep_alive(Duration::from_secs(30));
    let client = Client::new(config);

    assert_eq!(
        client.keep_alive(),
        KeepAlive::Every(Duration::from_secs(30))
    );
}
