//! Unit tests for the LCDd line codec.
//!
//! Covers single, batched and partial delivery, blank-line skipping,
//! oversized and non-UTF-8 lines, and outbound newline framing.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use lcdd_client::protocol::codec::{LcddCodec, MAX_LINE_BYTES};

#[test]
fn single_line_is_decoded_without_terminator() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from("success\n");

    let line = codec.decode(&mut buf).expect("decode must succeed");

    assert_eq!(line.as_deref(), Some("success"));
    assert!(buf.is_empty(), "buffer must be drained");
}

/// One read may carry several server messages; each is yielded in order.
#[test]
fn batched_lines_are_yielded_in_order() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from("success\nkey A\nlisten Test1\n");

    let mut lines = Vec::new();
    while let Some(line) = codec.decode(&mut buf).expect("decode") {
        lines.push(line);
    }

    assert_eq!(lines, vec!["success", "key A", "listen Test1"]);
}

/// A fragment stays buffered until its newline arrives.
#[test]
fn partial_line_is_buffered_until_newline() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from("succ");

    assert_eq!(codec.decode(&mut buf).expect("first decode"), None);

    buf.extend_from_slice(b"ess\nno");
    assert_eq!(
        codec.decode(&mut buf).expect("second decode").as_deref(),
        Some("success")
    );
    assert_eq!(codec.decode(&mut buf).expect("third decode"), None);

    buf.extend_from_slice(b"op\n");
    assert_eq!(
        codec.decode(&mut buf).expect("fourth decode").as_deref(),
        Some("noop")
    );
}

#[test]
fn carriage_return_is_stripped() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from("huh? Invalid command\r\n");

    assert_eq!(
        codec.decode(&mut buf).expect("decode").as_deref(),
        Some("huh? Invalid command")
    );
}

#[test]
fn blank_lines_are_skipped() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from("\n   \nsuccess\n");

    assert_eq!(
        codec.decode(&mut buf).expect("decode").as_deref(),
        Some("success")
    );
}

#[test]
fn unterminated_tail_is_yielded_at_eof() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from("noop");

    assert_eq!(
        codec.decode_eof(&mut buf).expect("decode_eof").as_deref(),
        Some("noop")
    );
}

/// An oversized line is dropped and decoding resumes at the next line.
#[test]
fn oversized_line_is_skipped() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::new();
    buf.extend_from_slice(b"menuevent ");
    buf.extend_from_slice("x".repeat(MAX_LINE_BYTES + 1).as_bytes());
    buf.extend_from_slice(b"
success
");

    assert_eq!(
        codec.decode(&mut buf).expect("oversized line must not fail").as_deref(),
        Some("success")
    );
    assert!(buf.is_empty());
}

/// The oversized line may still be arriving; its tail is discarded too.
#[test]
fn oversized_line_split_across_reads_is_skipped() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from("x".repeat(MAX_LINE_BYTES + 1).as_str());

    assert_eq!(codec.decode(&mut buf).expect("first read"), None);

    buf.extend_from_slice(b"still the same line
noop
");
    assert_eq!(
        codec.decode(&mut buf).expect("second read").as_deref(),
        Some("noop")
    );
}

#[test]
fn invalid_utf8_is_replaced_not_rejected() {
    let mut codec = LcddCodec::new();
    let mut buf = BytesMut::from(&b"key \xe9\nsuccess\n"[..]);

    assert_eq!(
        codec.decode(&mut buf).expect("lossy decode").as_deref(),
        Some("key \u{fffd}")
    );
    assert_eq!(
        codec.decode(&mut buf).expect("next line").as_deref(),
        Some("success")
    );
}

#[test]
fn encoder_appends_newline() {
    let mut codec = LcddCodec::new();
    let mut dst = BytesMut::new();

    codec
        .encode("screen_add Test1".to_owned(), &mut dst)
        .expect("encode");

    assert_eq!(&dst[..], b"screen_add Test1\n");
}
