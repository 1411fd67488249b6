use http::{Method, Response, Version};

use super::scenario::Scenario;
use crate::{BodyMode, Error, HttpState};

#[test]
fn sized_body_across_feeds() {
    let scenario = Scenario::get(
        Response::builder()
            .header("content-length", "5")
            .body(())
            .unwrap(),
    );
    let mut ctx = scenario.context();

    let n = ctx.feed(scenario.wire());
    assert_eq!(n, scenario.wire().len());
    assert_eq!(ctx.state(), HttpState::ParsingSizedBody);
    assert_eq!(ctx.body_mode(), BodyMode::Sized(5));
    assert!(ctx.has_body());
    assert_eq!(ctx.body_already_read(), 0);
    assert!(!ctx.is_body_complete());
    // Keep-alive is wanted but the body is still outstanding.
    assert!(ctx.want_keep_alive());
    assert!(!ctx.can_reuse_connection());

    assert_eq!(ctx.feed(b"he"), 2);
    assert_eq!(ctx.body_already_read(), 2);
    assert_eq!(ctx.state(), HttpState::ParsingSizedBody);

    // Last piece plus bytes that belong to the next response.
    assert_eq!(ctx.feed(b"lloNEXT"), 3);
    assert_eq!(ctx.body_already_read(), 5);
    assert_eq!(ctx.state(), HttpState::Complete);
    assert!(ctx.is_body_complete());
    assert!(ctx.can_reuse_connection());
}

#[test]
fn sized_body_stops_at_boundary_in_one_feed() {
    let next = b"HTTP/1.1 204 No Content\r\n\r\n";
    let scenario = Scenario::get(
        Response::builder()
            .header("content-length", "5")
            .body(())
            .unwrap(),
    )
    .then(b"hello")
    .then(next);

    let (ctx, n) = scenario.run();

    assert_eq!(n, scenario.wire().len() - next.len());
    assert_eq!(ctx.state(), HttpState::Complete);
    assert_eq!(ctx.body_already_read(), 5);
}

#[test]
fn zero_content_length_completes_at_head() {
    let scenario = Scenario::get(
        Response::builder()
            .header("content-length", "0")
            .body(())
            .unwrap(),
    )
    .then(b"XYZ");

    let (ctx, n) = scenario.run();

    assert_eq!(n, scenario.wire().len() - 3);
    assert_eq!(ctx.state(), HttpState::Complete);
    assert_eq!(ctx.body_mode(), BodyMode::NoBody);
    assert!(!ctx.has_body());
    assert_eq!(ctx.body_already_read(), 0);
    assert!(ctx.is_body_complete());
    assert!(ctx.can_reuse_connection());
}

#[test]
fn chunked_body_in_one_feed() {
    let next = b"HTTP/1.1 204 No Content\r\n\r\n";
    let scenario = Scenario::get(
        Response::builder()
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap(),
    )
    .then(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n")
    .then(next);

    let (ctx, n) = scenario.run();

    assert_eq!(n, scenario.wire().len() - next.len());
    assert_eq!(ctx.state(), HttpState::Complete);
    assert_eq!(ctx.body_mode(), BodyMode::Chunked);
    // Raw framing bytes, not just chunk payloads.
    assert_eq!(ctx.body_already_read(), 24);
    assert!(ctx.is_body_complete());
    assert!(ctx.can_reuse_connection());
}

#[test]
fn chunked_body_across_feeds() {
    let scenario = Scenario::get(
        Response::builder()
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap(),
    );
    let mut ctx = scenario.context();
    ctx.feed(scenario.wire());
    assert_eq!(ctx.state(), HttpState::ParsingChunkedBody);

    assert_eq!(ctx.feed(b"5\r\nhe"), 5);
    assert_eq!(ctx.body_already_read(), 5);
    assert!(!ctx.is_body_complete());

    assert_eq!(ctx.feed(b"llo\r\n0\r\n"), 8);
    assert_eq!(ctx.state(), HttpState::ParsingChunkedBody);

    // Empty trailer section ends the body; the rest is not ours.
    assert_eq!(ctx.feed(b"\r\nXX"), 2);
    assert_eq!(ctx.state(), HttpState::Complete);
    assert_eq!(ctx.body_already_read(), 15);
    assert!(ctx.is_body_complete());
}

#[test]
fn chunked_trailers_are_consumed_and_dropped() {
    let scenario = Scenario::get(
        Response::builder()
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap(),
    )
    .then(b"5\r\nhello\r\n0\r\nexpires: never\r\n\r\n");

    let (ctx, n) = scenario.run();

    assert_eq!(n, scenario.wire().len());
    assert_eq!(ctx.state(), HttpState::Complete);
    assert_eq!(ctx.body_already_read(), 31);
    assert!(!ctx.headers().unwrap().contains("expires"));
}

#[test]
fn chunked_takes_precedence_over_content_length() {
    let scenario = Scenario::get(
        Response::builder()
            .header("content-length", "9999")
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap(),
    )
    .then(b"2\r\nok\r\n0\r\n\r\n");

    let (ctx, n) = scenario.run();

    assert_eq!(n, scenario.wire().len());
    assert_eq!(ctx.body_mode(), BodyMode::Chunked);
    assert_eq!(ctx.state(), HttpState::Complete);
}

#[test]
fn chunked_missing_crlf_after_data_fails() {
    let scenario = Scenario::get(
        Response::builder()
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap(),
    )
    .then(b"5\r\nhelloXY");

    let (ctx, _) = scenario.run();

    assert_eq!(ctx.state(), HttpState::Error);
    assert_eq!(ctx.error(), Some(Error::ChunkExpectedCrLf));
    assert!(!ctx.can_reuse_connection());
}

#[test]
fn chunked_bad_size_digit_fails() {
    let scenario = Scenario::get(
        Response::builder()
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap(),
    )
    .then(b"Z\r\n");

    let (ctx, _) = scenario.run();

    assert_eq!(ctx.state(), HttpState::Error);
    assert_eq!(ctx.error(), Some(Error::InvalidChunkSize));
}

#[test]
fn until_eof_body_swallows_everything() {
    // No length indicator on http/1.0. Even bytes that look like another
    // head are body.
    let scenario = Scenario::get(
        Response::builder()
            .version(Version::HTTP_10)
            .body(())
            .unwrap(),
    )
    .then(b"anything goes here, even HTTP/1.1 200 OK\r\n\r\n");

    let (mut ctx, n) = scenario.run();

    assert_eq!(n, scenario.wire().len());
    assert_eq!(ctx.state(), HttpState::ParsingBodyUntilEof);
    assert_eq!(ctx.body_mode(), BodyMode::CloseDelimited);
    assert_eq!(ctx.body_already_read(), 44);
    assert!(!ctx.is_body_complete());
    assert!(ctx.must_close_connection());
    assert_eq!(ctx.close_reason(), Some("version is http1.0"));
    assert!(!ctx.can_reuse_connection());

    ctx.end_of_stream();

    assert_eq!(ctx.state(), HttpState::Complete);
    assert!(ctx.is_body_complete());
    // Complete, but the stream is gone.
    assert!(!ctx.can_reuse_connection());
}

#[test]
fn until_eof_on_http11_with_connection_close() {
    let scenario = Scenario::get(
        Response::builder()
            .header("connection", "close")
            .body(())
            .unwrap(),
    )
    .then(b"partial");

    let (ctx, _) = scenario.run();

    assert_eq!(ctx.state(), HttpState::ParsingBodyUntilEof);
    assert_eq!(ctx.body_mode(), BodyMode::CloseDelimited);
    assert_eq!(ctx.close_reason(), Some("backend sent connection: close"));
}

#[test]
fn eof_mid_sized_body_fails() {
    let scenario = Scenario::get(
        Response::builder()
            .header("content-length", "10")
            .body(())
            .unwrap(),
    )
    .then(b"abc");
    let (mut ctx, _) = scenario.run();
    assert_eq!(ctx.state(), HttpState::ParsingSizedBody);

    ctx.end_of_stream();

    assert_eq!(ctx.state(), HttpState::Error);
    assert_eq!(ctx.error(), Some(Error::UnexpectedEof));
    assert!(!ctx.can_reuse_connection());
}

#[test]
fn eof_mid_chunked_body_fails() {
    let scenario = Scenario::get(
        Response::builder()
            .header("transfer-encoding", "chunked")
            .body(())
            .unwrap(),
    )
    .then(b"5\r\nhe");
    let (mut ctx, _) = scenario.run();

    ctx.end_of_stream();

    assert_eq!(ctx.state(), HttpState::Error);
    assert_eq!(ctx.error(), Some(Error::UnexpectedEof));
}

#[test]
fn eof_on_complete_response_is_a_noop() {
    let scenario = Scenario::get(
        Response::builder()
            .header("content-length", "0")
            .body(())
            .unwrap(),
    );
    let (mut ctx, _) = scenario.run();
    assert_eq!(ctx.state(), HttpState::Complete);

    ctx.end_of_stream();

    assert_eq!(ctx.state(), HttpState::Complete);
    assert_eq!(ctx.error(), None);
}

#[test]
fn head_request_response_has_no_body() {
    let scenario = Scenario::with_method(
        Method::HEAD,
        Response::builder()
            .header("content-length", "123")
            .body(())
            .unwrap(),
    );

    let (ctx, n) = scenario.run();

    assert_eq!(n, scenario.wire().len());
    assert_eq!(ctx.state(), HttpState::Complete);
    assert_eq!(ctx.body_mode(), BodyMode::NoBody);
    // The length header is advice about the entity, not framing. It is
    // still forwarded.
    assert_eq!(ctx.headers().unwrap().get_str("content-length"), Some("123"));
    assert!(ctx.can_reuse_connection());
}
