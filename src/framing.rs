use http::{Method, StatusCode, Version};

use crate::headers::Headers;
use crate::Error;

/// How the response body is delimited.
///
/// Decided once per response when the head commits, in strict priority
/// order; see [`BodyMode::for_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No body follows the head.
    NoBody,
    /// The connection switches protocols after the head; subsequent bytes
    /// are not http.
    Upgrade,
    /// Delimited by content-length. The value is the total body size and is
    /// always greater than zero (a zero length resolves to [`NoBody`]).
    ///
    /// [`NoBody`]: BodyMode::NoBody
    Sized(u64),
    /// Chunked transfer encoding.
    Chunked,
    /// The body runs until the backend closes the stream.
    CloseDelimited,
}

impl BodyMode {
    /// Whether any body bytes are expected after the head.
    pub fn has_body(&self) -> bool {
        matches!(
            self,
            BodyMode::Sized(_) | BodyMode::Chunked | BodyMode::CloseDelimited
        )
    }

    /// Decide the framing for a response head. First match wins.
    ///
    /// `upgrade_requested` is whether the proxied request asked to switch
    /// protocols; `expect_keep_alive` is the verdict derivable from the head
    /// alone (version default + Connection directive), which rule 5 below
    /// depends on.
    pub(crate) fn for_response(
        _version: Version,
        method: &Method,
        status: StatusCode,
        upgrade_requested: bool,
        expect_keep_alive: bool,
        headers: &Headers,
    ) -> Result<BodyMode, Error> {
        // 1. A switch of protocols takes the connection out of http framing
        // entirely, but only counts when the request asked for it.
        if status == StatusCode::SWITCHING_PROTOCOLS && upgrade_requested {
            return Ok(BodyMode::Upgrade);
        }

        let has_no_body =
            // https://datatracker.ietf.org/doc/html/rfc7230#section-3.3.3
            // Any response to a HEAD request ... is always terminated by the
            // first empty line after the header fields, regardless of the
            // header fields present in the message.
            method == Method::HEAD ||
            // Any 2xx (Successful) response to a CONNECT request implies that
            // the connection will become a tunnel immediately after the empty
            // line that concludes the header fields.
            status.is_success() && method == Method::CONNECT ||
            // Any response with a 1xx (Informational), 204 (No Content), or
            // 304 (Not Modified) status code is always terminated by the
            // first empty line after the header fields.
            status.is_informational() ||
            matches!(status.as_u16(), 204 | 304);

        // 2. Statuses that never carry a body, regardless of length headers.
        if has_no_body {
            return Ok(BodyMode::NoBody);
        }

        // 3. Transfer-Encoding chunked is authoritative over Content-Length.
        // The backend speaks whatever framing it wants regardless of its
        // advertised version, so no 1.0 carve-out here.
        if headers.has_comma_token("transfer-encoding", "chunked") {
            return Ok(BodyMode::Chunked);
        }

        // 4. Content-Length, after reconciling repeated values.
        if let Some(len) = content_length(headers)? {
            return Ok(if len == 0 {
                BodyMode::NoBody
            } else {
                BodyMode::Sized(len)
            });
        }

        // 5. No length indicator. If the connection will not be kept alive,
        // the body extent is "until the backend closes the stream".
        if !expect_keep_alive {
            return Ok(BodyMode::CloseDelimited);
        }

        // 6. Keep-alive with no length indicator: nothing follows the head.
        Ok(BodyMode::NoBody)
    }
}

/// Single Content-Length value, if any. Repeats with the same value collapse
/// to one; disagreeing repeats are a violation.
fn content_length(headers: &Headers) -> Result<Option<u64>, Error> {
    let mut content_length: Option<u64> = None;

    for value in headers.get_all("content-length") {
        // 1*DIGIT only; str::parse alone would also accept a leading '+'.
        let v = value
            .to_str()
            .ok()
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or(Error::InvalidContentLength)?;

        if let Some(prev) = content_length {
            if prev != v {
                return Err(Error::ConflictingContentLength);
            }
        }
        content_length = Some(v);
    }

    Ok(content_length)
}
