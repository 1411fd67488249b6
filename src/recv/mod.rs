//! Per-connection interpretation of backend bytes as an http response.

use std::fmt;
use std::mem;

use http::{Method, StatusCode, Version};
use smallvec::SmallVec;

use crate::chunk::ChunkScanner;
use crate::framing::BodyMode;
use crate::headers::Headers;
use crate::keepalive::{self, CloseReason};
use crate::parser::{HeadAdvance, HeadParser};
use crate::Error;

mod pool;
pub use pool::ContextPool;

#[cfg(test)]
mod test;

/// Max number of headers accepted in a response head.
pub const MAX_RESPONSE_HEADERS: usize = 128;

/// Max size of a response head (status line, headers, terminator).
///
/// Backends rarely exceed a few kilobytes of headers; the cap bounds how much
/// of a runaway head gets buffered before giving up.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Observable parsing state of a [`ResponseContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpState {
    /// Status line and headers are still arriving.
    ParsingHeaders,
    /// Reading a body delimited by Content-Length.
    ParsingSizedBody,
    /// Reading a body in chunked transfer encoding.
    ParsingChunkedBody,
    /// Reading a body that ends when the backend closes the stream; see
    /// [`ResponseContext::end_of_stream`].
    ParsingBodyUntilEof,
    /// The connection switched protocols. Subsequent bytes are not http and
    /// are never consumed here.
    Upgraded,
    /// An interim 100 response was parsed. The owner relays it, then calls
    /// [`ResponseContext::proceed_after_interim`].
    OneHundredContinue,
    /// The response is fully received.
    Complete,
    /// Parsing failed. Terminal; the code is kept in
    /// [`ResponseContext::error`].
    Error,
}

/// Internal phase. Live sub-state rides in the variants so there is exactly
/// one place that says what the machine is doing.
enum Phase {
    Head(HeadParser),
    /// Transient marker while a parsed head is being resolved into the next
    /// phase. Never escapes a `feed` call.
    Resolving,
    Sized,
    Chunked(ChunkScanner),
    UntilEof,
    Interim,
    Upgraded,
    Complete,
    Failed(Error),
}

/// State machine interpreting bytes from one backend connection as an http
/// response.
///
/// The context performs no I/O. The owner reads from the backend socket and
/// hands the bytes to [`feed`][ResponseContext::feed], which consumes up to
/// a message boundary and reports how far it got. All framing decisions
/// (body delimitation, completion, connection reuse) are made here; relaying
/// the bytes to the client stays with the owner.
pub struct ResponseContext {
    method: Method,
    upgrade_requested: bool,
    phase: Phase,
    version: Option<Version>,
    status: Option<StatusCode>,
    headers: Headers,
    secure_headers: Headers,
    body_mode: BodyMode,
    body_already_read: u64,
    close_reason: SmallVec<[CloseReason; 4]>,
    one_hundred_continue_sent: bool,
    has_date_header: bool,
}

impl ResponseContext {
    /// A context for the response to a request sent with `method`.
    /// `upgrade_requested` is whether that request asked the backend to
    /// switch protocols; a 101 status only upgrades when it did.
    pub fn new(method: Method, upgrade_requested: bool) -> Self {
        ResponseContext {
            method,
            upgrade_requested,
            phase: Phase::Head(HeadParser::new()),
            version: None,
            status: None,
            headers: Headers::with_capacity(16),
            secure_headers: Headers::with_capacity(0),
            body_mode: BodyMode::NoBody,
            body_already_read: 0,
            close_reason: SmallVec::new(),
            one_hundred_continue_sent: false,
            has_date_header: false,
        }
    }

    /// Restore the context to its initial state for the next response,
    /// keeping allocations where possible. Used by [`ContextPool`] on
    /// checkout and valid on any context regardless of its state.
    pub fn reset(&mut self, method: Method, upgrade_requested: bool) {
        self.method = method;
        self.upgrade_requested = upgrade_requested;
        self.phase = Phase::Head(HeadParser::new());
        self.version = None;
        self.status = None;
        self.headers.clear();
        self.secure_headers.clear();
        self.body_mode = BodyMode::NoBody;
        self.body_already_read = 0;
        self.close_reason.clear();
        self.one_hundred_continue_sent = false;
        self.has_date_header = false;
    }

    // ////////////////////////////////////////////////////////////// FEEDING

    /// Interpret the next bytes from the backend.
    ///
    /// Returns how many bytes were consumed. Everything is consumed unless a
    /// message boundary is reached first: a complete response, an upgrade,
    /// an interim 100 head, or a framing violation. Bytes past a boundary
    /// belong to whatever follows this response and are never consumed.
    ///
    /// The result is independent of how the stream is fragmented across
    /// calls. Violations do not surface as a return value; they move the
    /// context to [`HttpState::Error`] with the code in
    /// [`error`][ResponseContext::error].
    pub fn feed(&mut self, input: &[u8]) -> usize {
        let mut consumed = 0;

        loop {
            let rest = &input[consumed..];

            match &mut self.phase {
                Phase::Head(parser) => match parser.advance(rest) {
                    Ok(HeadAdvance::Incomplete) => return consumed + rest.len(),
                    Ok(HeadAdvance::Complete { input_used }) => {
                        consumed += input_used;
                        self.commit_head();
                        if self.at_boundary() {
                            return consumed;
                        }
                    }
                    Err(e) => {
                        self.fail(e);
                        return consumed;
                    }
                },

                Phase::Resolving => unreachable!("resolving is transient"),

                Phase::Sized => {
                    let total = match self.body_mode {
                        BodyMode::Sized(v) => v,
                        // Phase and mode are set together in commit_head().
                        _ => unreachable!("sized phase without sized mode"),
                    };
                    let left = total - self.body_already_read;
                    let take = u64::min(rest.len() as u64, left) as usize;

                    consumed += take;
                    self.body_already_read += take as u64;

                    if self.body_already_read == total {
                        trace!("sized body complete: {} bytes", total);
                        self.phase = Phase::Complete;
                    }
                    return consumed;
                }

                Phase::Chunked(scanner) => match scanner.scan(rest) {
                    Ok((input_used, ended)) => {
                        consumed += input_used;
                        self.body_already_read += input_used as u64;
                        if ended {
                            trace!("chunked body complete");
                            self.phase = Phase::Complete;
                        }
                        return consumed;
                    }
                    Err(e) => {
                        self.fail(e);
                        return consumed;
                    }
                },

                Phase::UntilEof => {
                    consumed += rest.len();
                    self.body_already_read += rest.len() as u64;
                    return consumed;
                }

                // Message boundaries. Anything further is not ours.
                Phase::Interim | Phase::Upgraded | Phase::Complete | Phase::Failed(_) => {
                    return consumed
                }
            }
        }
    }

    /// The backend closed its end of the stream.
    ///
    /// For an until-EOF body this is the completion signal. In terminal
    /// states it is a no-op. Anywhere else the response was cut short and
    /// the context fails with [`Error::UnexpectedEof`].
    pub fn end_of_stream(&mut self) {
        match self.phase {
            Phase::UntilEof => {
                trace!("close delimited body complete");
                self.phase = Phase::Complete;
            }
            Phase::Upgraded | Phase::Complete | Phase::Failed(_) => {}
            _ => self.fail(Error::UnexpectedEof),
        }
    }

    /// Re-arm after an interim 100 head to parse the final response on the
    /// same stream. The interim status and headers are dropped;
    /// [`one_hundred_continue_sent`][Self::one_hundred_continue_sent]
    /// stays set. Returns `false` (and does nothing) outside
    /// [`HttpState::OneHundredContinue`].
    pub fn proceed_after_interim(&mut self) -> bool {
        if !matches!(self.phase, Phase::Interim) {
            return false;
        }

        self.version = None;
        self.status = None;
        self.headers.clear();
        self.secure_headers.clear();
        self.phase = Phase::Head(HeadParser::new());
        true
    }

    fn commit_head(&mut self) {
        let phase = mem::replace(&mut self.phase, Phase::Resolving);
        let parser = match phase {
            Phase::Head(parser) => parser,
            _ => unreachable!("commit without a head parser"),
        };

        let head = match parser.finish() {
            Ok(v) => v,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        self.version = Some(head.version);
        self.status = Some(head.status);
        self.headers = head.headers;
        self.secure_headers = head.secure_headers;

        if head.status == StatusCode::CONTINUE {
            // Interim head. Visible until the owner proceeds; neither
            // keep-alive nor framing applies to it.
            self.one_hundred_continue_sent = true;
            self.phase = Phase::Interim;
            debug!("interim 100 continue");
            return;
        }

        self.has_date_header = self.headers.contains("date");

        if let Some(reason) = keepalive::expect_keep_alive(head.version, &self.headers) {
            self.close_reason.push(reason);
        }

        // The head stays observable even if framing resolution fails below.
        let mode = match BodyMode::for_response(
            head.version,
            &self.method,
            head.status,
            self.upgrade_requested,
            self.close_reason.is_empty(),
            &self.headers,
        ) {
            Ok(v) => v,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        if mode == BodyMode::CloseDelimited {
            self.close_reason.push(CloseReason::CloseDelimitedBody);
        }

        self.body_mode = mode;

        debug!(
            "head committed: status={} mode={:?} keep_alive={}",
            head.status,
            mode,
            self.close_reason.is_empty()
        );

        self.phase = match mode {
            BodyMode::NoBody => Phase::Complete,
            BodyMode::Upgrade => Phase::Upgraded,
            BodyMode::Sized(_) => Phase::Sized,
            BodyMode::Chunked => Phase::Chunked(ChunkScanner::new()),
            BodyMode::CloseDelimited => Phase::UntilEof,
        };
    }

    fn fail(&mut self, error: Error) {
        debug!("response failed: {}", error);
        self.phase = Phase::Failed(error);
    }

    fn at_boundary(&self) -> bool {
        matches!(
            self.phase,
            Phase::Interim | Phase::Upgraded | Phase::Complete | Phase::Failed(_)
        )
    }

    // ////////////////////////////////////////////////////////////// QUERIES

    pub fn state(&self) -> HttpState {
        match &self.phase {
            Phase::Head(_) => HttpState::ParsingHeaders,
            Phase::Resolving => unreachable!("resolving is transient"),
            Phase::Sized => HttpState::ParsingSizedBody,
            Phase::Chunked(_) => HttpState::ParsingChunkedBody,
            Phase::UntilEof => HttpState::ParsingBodyUntilEof,
            Phase::Interim => HttpState::OneHundredContinue,
            Phase::Upgraded => HttpState::Upgraded,
            Phase::Complete => HttpState::Complete,
            Phase::Failed(_) => HttpState::Error,
        }
    }

    /// The violation that moved the context to [`HttpState::Error`].
    pub fn error(&self) -> Option<Error> {
        match self.phase {
            Phase::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Status of the committed head. `None` while headers are still being
    /// parsed (and after a failure before any head committed).
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Headers of the committed head, minus the secure ones.
    pub fn headers(&self) -> Option<&Headers> {
        self.status.is_some().then_some(&self.headers)
    }

    /// Headers the backend addressed to the proxy itself (`!~` prefixed on
    /// the wire, stored with the marker stripped). Never forwarded verbatim.
    pub fn secure_headers(&self) -> Option<&Headers> {
        self.status.is_some().then_some(&self.secure_headers)
    }

    /// How the body is delimited. [`BodyMode::NoBody`] until the head
    /// commits.
    pub fn body_mode(&self) -> BodyMode {
        self.body_mode
    }

    /// Whether any body bytes are expected after the head.
    pub fn has_body(&self) -> bool {
        self.body_mode.has_body()
    }

    /// Raw body bytes consumed so far, framing included for chunked bodies.
    pub fn body_already_read(&self) -> u64 {
        self.body_already_read
    }

    /// Whether the body has been fully consumed. Upgraded connections never
    /// complete, and an until-EOF body only completes via
    /// [`end_of_stream`][Self::end_of_stream].
    pub fn is_body_complete(&self) -> bool {
        match self.body_mode {
            BodyMode::NoBody => true,
            BodyMode::Upgrade => false,
            BodyMode::Sized(total) => self.body_already_read >= total,
            BodyMode::Chunked | BodyMode::CloseDelimited => {
                matches!(self.phase, Phase::Complete)
            }
        }
    }

    /// Whether the backend wants the connection kept alive after this
    /// response. Meaningful once the head has committed.
    pub fn want_keep_alive(&self) -> bool {
        self.close_reason.is_empty()
    }

    pub fn must_close_connection(&self) -> bool {
        !self.want_keep_alive()
    }

    /// Human readable explanation of the first recorded close reason.
    pub fn close_reason(&self) -> Option<&'static str> {
        self.close_reason.first().map(|r| r.explain())
    }

    /// Whether the connection can go back to the backend's connection pool:
    /// the response is complete and the backend wants keep-alive. False
    /// while anything is still outstanding, and always false for failed or
    /// upgraded exchanges.
    pub fn can_reuse_connection(&self) -> bool {
        matches!(self.phase, Phase::Complete) && self.want_keep_alive()
    }

    /// Whether the backend sent an interim 100 head on this exchange. Stays
    /// set across [`proceed_after_interim`][Self::proceed_after_interim] so
    /// the relaying layer can consult it after moving on.
    pub fn one_hundred_continue_sent(&self) -> bool {
        self.one_hundred_continue_sent
    }

    /// Whether the committed head carried a Date header. The proxy appends
    /// one when the backend did not.
    pub fn has_date_header(&self) -> bool {
        self.has_date_header
    }
}

impl fmt::Debug for ResponseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseContext")
            .field("state", &self.state())
            .field("status", &self.status)
            .field("body_mode", &self.body_mode)
            .field("body_already_read", &self.body_already_read)
            .finish()
    }
}
