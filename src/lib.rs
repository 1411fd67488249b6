//! Sans-IO response framing for the backend side of a reverse proxy.
//!
//! A reverse proxy holds one connection per in-flight request towards a
//! backend process and must make sense of whatever comes back: where the
//! head ends, how the body is delimited, when the response is over, and
//! whether the connection can be reused afterwards. This crate is that
//! interpretation and nothing else. It is Sans-IO: no sockets, no `Read`/
//! `Write` traits, no buffers of its own beyond what partial parses require.
//! The owner reads bytes and hands them to [`ResponseContext::feed`], which
//! reports how many it consumed.
//!
//! The states are:
//!
//! * **ParsingHeaders** - accumulating the status line and header block
//! * **ParsingSizedBody** - counting down a Content-Length delimited body
//! * **ParsingChunkedBody** - tracking chunked transfer framing
//! * **ParsingBodyUntilEof** - body runs until the backend closes the stream
//! * **Upgraded** - the connection switched protocols; no longer http
//! * **OneHundredContinue** - an interim 100 head; the machine re-arms for
//!   the final response once the owner proceeds
//! * **Complete** - the response is fully received
//! * **Error** - a framing violation, with the code kept for inspection
//!
//! ```text
//!                      ┌──────────────────┐
//!   ┌ ─ ─ ─ ─ ─ ─ ─ ─ ▶│  ParsingHeaders  │
//!                      └──────────────────┘
//!   │                            │
//!   │  ┌──────────────────┐      │      ┌──────────────────┐
//!   └ ─│OneHundredContinue│◀─────┼─────▶│     Upgraded     │
//!      └──────────────────┘      │      └──────────────────┘
//!                                ▼
//!        ┌──────────────────────────────────────────────┐
//!        │ ParsingSizedBody / ParsingChunkedBody /      │
//!        │ ParsingBodyUntilEof                          │
//!        └──────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!                      ┌──────────────────┐
//!                      │     Complete     │
//!                      └──────────────────┘
//! ```
//!
//! Responses without a body go from ParsingHeaders straight to Complete,
//! and any state can end in Error. The dashed edge is
//! [`ResponseContext::proceed_after_interim`].
//!
//! # Example
//!
//! ```
//! use backhaul::{ContextPool, HttpState};
//! use backhaul::http::{Method, StatusCode};
//!
//! let mut pool = ContextPool::new();
//! let mut ctx = pool.checkout(Method::GET, false);
//!
//! // Bytes as they arrive from the backend socket. Fragmentation does not
//! // matter; feed() picks up exactly where it left off.
//! let part1: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Le";
//! let part2: &[u8] = b"ngth: 5\r\n\r\nhel";
//! let part3: &[u8] = b"loNEXT";
//!
//! assert_eq!(ctx.feed(part1), part1.len());
//! assert_eq!(ctx.feed(part2), part2.len());
//! assert_eq!(ctx.state(), HttpState::ParsingSizedBody);
//!
//! // Only the two bytes belonging to this response are consumed.
//! assert_eq!(ctx.feed(part3), 2);
//! assert_eq!(ctx.state(), HttpState::Complete);
//!
//! assert_eq!(ctx.status(), Some(StatusCode::OK));
//! assert_eq!(ctx.headers().unwrap().get_str("content-length"), Some("5"));
//! assert!(ctx.is_body_complete());
//! assert!(ctx.can_reuse_connection());
//!
//! pool.checkin(ctx);
//! ```

#[macro_use]
extern crate log;

// Re-export the basis for this library.
pub use http;

mod error;
pub use error::Error;

mod chunk;
mod parser;

mod headers;
pub use headers::Headers;

mod framing;
pub use framing::BodyMode;

mod keepalive;
pub use keepalive::CloseReason;

mod recv;
pub use recv::{ContextPool, HttpState, ResponseContext};
pub use recv::{MAX_HEAD_BYTES, MAX_RESPONSE_HEADERS};

pub mod spawn;
