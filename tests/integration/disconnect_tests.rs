//! Integration tests for connection loss and explicit close.

use lcdd_client::client::events::{ClientEvent, EventKind};
use lcdd_client::client::session::SessionState;
use lcdd_client::protocol::command::KeyMode;
use lcdd_client::{AppError, Client};

use super::test_helpers::{config_for, ready_client, FakeServer};

#[tokio::test]
async fn server_hangup_fails_pending_acks() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;
    let (_id, mut errors) = client.events().channel(EventKind::Error);

    let first = client.add_screen("Test1").await.expect("first");
    let second = client.noop().await.expect("second");
    peer.expect("screen_add Test1").await;
    peer.expect("noop").await;
    drop(peer);

    assert_eq!(first.await, Err(AppError::ConnectionClosed));
    assert_eq!(second.await, Err(AppError::ConnectionClosed));
    assert_eq!(client.state(), SessionState::Closed);
    assert_eq!(
        errors.recv().await,
        Some(ClientEvent::Error(AppError::ConnectionClosed))
    );

    let err = client
        .add_key(["A"], KeyMode::Shared)
        .await
        .expect_err("closed");
    assert_eq!(err, AppError::ConnectionClosed);
}

#[tokio::test]
async fn explicit_close_is_quiet() {
    let server = FakeServer::bind().await;
    let (client, mut peer) = ready_client(&server).await;
    let (_id, mut errors) = client.events().channel(EventKind::Error);

    let pending = client.add_screen("Test1").await.expect("submit");
    peer.expect("screen_add Test1").await;

    client.close().await;

    assert_eq!(pending.await, Err(AppError::ConnectionClosed));
    assert_eq!(client.state(), SessionState::Closed);
    assert!(errors.try_recv().is_err(), "close must not emit an error");
    assert_eq!(peer.recv().await, None, "socket is closed");
}

#[tokio::test]
async fn refused_connection_is_terminal() {
    let port = {
        let server = FakeServer::bind().await;
        server.config().port
    };
    let client = Client::new(config_for(port));
    let (_id, mut errors) = client.events().channel(EventKind::Error);

    let err = client.connect().await.expect_err("nothing listening");
    assert!(matches!(err, AppError::Io(_)), "{err:?}");
    assert_eq!(client.state(), SessionState::Closed);
    assert!(matches!(
        errors.try_recv(),
        Ok(ClientEvent::Error(AppError::Io(_)))
    ));

    assert_eq!(client.connect().await, Err(AppError::AlreadyConnected));
    assert_eq!(client.noop().await.err(), Some(AppError::ConnectionClosed));
}
