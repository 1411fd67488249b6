use http::Version;

use crate::headers::Headers;

/// Why the backend connection cannot be reused after this response.
///
/// Reasons accumulate on the context as they are discovered; the first one
/// recorded is the explanation surfaced by
/// [`crate::ResponseContext::close_reason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// HTTP/1.0 closes after each response unless keep-alive is negotiated.
    Http10,
    /// The backend sent `Connection: close`.
    BackendConnectionClose,
    /// The body extent is only known once the backend closes the stream.
    CloseDelimitedBody,
}

impl CloseReason {
    pub(crate) fn explain(&self) -> &'static str {
        match self {
            CloseReason::Http10 => "version is http1.0",
            CloseReason::BackendConnectionClose => "backend sent connection: close",
            CloseReason::CloseDelimitedBody => "response body is close delimited",
        }
    }
}

/// Keep-alive verdict derivable from the head alone, before body framing.
///
/// An explicit `Connection` directive always wins over the version default,
/// and `close` wins when a backend nonsensically sends both directives.
/// `None` means the connection can be kept alive as far as the head is
/// concerned.
pub(crate) fn expect_keep_alive(version: Version, headers: &Headers) -> Option<CloseReason> {
    if headers.has_comma_token("connection", "close") {
        return Some(CloseReason::BackendConnectionClose);
    }
    if headers.has_comma_token("connection", "keep-alive") {
        return None;
    }
    if version == Version::HTTP_10 {
        return Some(CloseReason::Http10);
    }
    None
}
