use thiserror::Error;

/// Framing violations detected while interpreting a backend response.
///
/// The context never panics on wire input; a violation moves it to the
/// terminal error state where the offending code stays readable via
/// [`crate::ResponseContext::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The status line could not be parsed.
    #[error("status line is malformed")]
    InvalidStatusLine,

    /// The response is not HTTP/1.0 or HTTP/1.1.
    #[error("unsupported http version")]
    UnsupportedVersion,

    /// A header name or value contains invalid bytes.
    #[error("header is malformed")]
    InvalidHeader,

    /// The response head has more headers than we accept.
    #[error("too many headers")]
    TooManyHeaders,

    /// The response head did not terminate within the size cap.
    #[error("response head too large")]
    HeadOverflow,

    /// Content-Length is not an unsigned number.
    #[error("content-length header not a number")]
    InvalidContentLength,

    /// Multiple Content-Length headers that disagree.
    #[error("conflicting content-length headers")]
    ConflictingContentLength,

    /// A chunk size line is not readable as a hex number.
    #[error("chunk size cannot be read as a number")]
    InvalidChunkSize,

    /// Chunked transfer framing is missing a required CRLF.
    #[error("chunk expected crlf")]
    ChunkExpectedCrLf,

    /// The backend closed the stream before the response was complete.
    #[error("stream ended before the response was complete")]
    UnexpectedEof,
}

impl From<httparse::Error> for Error {
    fn from(value: httparse::Error) -> Self {
        match value {
            httparse::Error::Version => Error::UnsupportedVersion,
            httparse::Error::Status | httparse::Error::Token => Error::InvalidStatusLine,
            httparse::Error::TooManyHeaders => Error::TooManyHeaders,
            _ => Error::InvalidHeader,
        }
    }
}
