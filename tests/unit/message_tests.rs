//! Unit tests for classifying server lines.

use lcdd_client::protocol::message::ServerMessage;

#[test]
fn acknowledgements() {
    assert_eq!(ServerMessage::parse("success"), ServerMessage::Success);
    assert_eq!(ServerMessage::parse("noop"), ServerMessage::Noop);
    assert_eq!(
        ServerMessage::parse("huh? Invalid command \"bogus\""),
        ServerMessage::Huh("huh? Invalid command \"bogus\"".into())
    );
}

#[test]
fn push_messages_carry_their_argument() {
    assert_eq!(
        ServerMessage::parse("key Enter"),
        ServerMessage::Key("Enter".into())
    );
    assert_eq!(
        ServerMessage::parse("listen Test1"),
        ServerMessage::Listen("Test1".into())
    );
    assert_eq!(
        ServerMessage::parse("ignore Test1"),
        ServerMessage::Ignore("Test1".into())
    );
    assert_eq!(
        ServerMessage::parse("menuevent select item1"),
        ServerMessage::MenuEvent("menuevent select item1".into())
    );
}

#[test]
fn unrecognised_lines_are_unknown() {
    assert_eq!(
        ServerMessage::parse("bye"),
        ServerMessage::Unknown("bye".into())
    );
    assert_eq!(
        ServerMessage::parse("Success"),
        ServerMessage::Unknown("Success".into())
    );
}

#[test]
fn connect_without_geometry_yields_zeroes() {
    let ServerMessage::Connect(info) = ServerMessage::parse("connect LCDproc 0.5.9") else {
        panic!("expected connect");
    };
    assert_eq!(info.width, 0);
    assert_eq!(info.height, 0);
    assert_eq!(info.server_version, "0.5.9");
}
