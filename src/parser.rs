use http::{HeaderName, HeaderValue, StatusCode, Version};

use crate::headers::Headers;
use crate::recv::{MAX_HEAD_BYTES, MAX_RESPONSE_HEADERS};
use crate::Error;

/// Prefix marking headers the backend addresses to the proxy itself. Such
/// headers are routed into the secure collection and must never be forwarded
/// to the client.
const SECURE_PREFIX: &[u8] = b"!~";

/// Accumulates bytes until a complete response head is buffered, then parses
/// it in one go.
///
/// Input can be fragmented arbitrarily; the terminator scan resumes where the
/// previous push left off. Parsing the status line and header block only once
/// the head is complete keeps the byte-level tokenizing in httparse.
pub(crate) struct HeadParser {
    buf: Vec<u8>,
}

#[derive(Debug)]
pub(crate) enum HeadAdvance {
    /// No terminator yet. All fed bytes are buffered.
    Incomplete,
    /// The head is complete. `input_used` bytes of the fed slice belonged to
    /// it; the rest is body or the next message.
    Complete { input_used: usize },
}

/// Everything a complete head tells us.
#[derive(Debug)]
pub(crate) struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    pub headers: Headers,
    pub secure_headers: Headers,
}

impl HeadParser {
    pub fn new() -> Self {
        HeadParser { buf: Vec::new() }
    }

    pub fn advance(&mut self, input: &[u8]) -> Result<HeadAdvance, Error> {
        // The empty line ending the head can straddle the previous push, so
        // rescan the buffered tail that could hold a partial terminator.
        let scan_from = self.buf.len().saturating_sub(3);
        self.buf.extend_from_slice(input);

        if let Some(end) = find_head_end(&self.buf[scan_from..]) {
            let end = scan_from + end;
            // The cap is on the head itself, so a single large push cannot
            // sneak an oversized head past it.
            if end > MAX_HEAD_BYTES {
                return Err(Error::HeadOverflow);
            }
            let overshoot = self.buf.len() - end;
            self.buf.truncate(end);
            return Ok(HeadAdvance::Complete {
                input_used: input.len() - overshoot,
            });
        }

        if self.buf.len() > MAX_HEAD_BYTES {
            return Err(Error::HeadOverflow);
        }

        Ok(HeadAdvance::Incomplete)
    }

    pub fn finish(self) -> Result<ResponseHead, Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_RESPONSE_HEADERS];
        let mut response = httparse::Response::new(&mut headers);

        match response.parse(&self.buf)? {
            httparse::Status::Complete(_) => {}
            // finish() is only called with the terminator buffered. Partial
            // here means the head itself does not parse as one.
            httparse::Status::Partial => return Err(Error::InvalidStatusLine),
        }

        let version = match response.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            _ => return Err(Error::UnsupportedVersion),
        };

        let code = response.code.ok_or(Error::InvalidStatusLine)?;
        let status = StatusCode::from_u16(code).map_err(|_| Error::InvalidStatusLine)?;

        let mut plain = Headers::with_capacity(response.headers.len());
        let mut secure = Headers::with_capacity(0);

        for h in response.headers.iter() {
            let (name_bytes, into) = match h.name.as_bytes().strip_prefix(SECURE_PREFIX) {
                Some(rest) => (rest, &mut secure),
                None => (h.name.as_bytes(), &mut plain),
            };

            let name = HeaderName::from_bytes(name_bytes).map_err(|_| Error::InvalidHeader)?;
            let value = HeaderValue::from_bytes(h.value).map_err(|_| Error::InvalidHeader)?;
            into.push(name, value);
        }

        Ok(ResponseHead {
            version,
            status,
            headers: plain,
            secure_headers: secure,
        })
    }
}

/// Index just past the first empty line, i.e. the length of the head.
///
/// Both CRLF and bare LF line endings count, matching httparse leniency. The
/// anchor is the newline ending a line, followed by `\n` or `\r\n`.
fn find_head_end(buf: &[u8]) -> Option<usize> {
    for (i, b) in buf.iter().enumerate() {
        if *b != b'\n' {
            continue;
        }
        match buf.get(i + 1) {
            Some(b'\n') => return Some(i + 2),
            Some(b'\r') if buf.get(i + 2) == Some(&b'\n') => return Some(i + 3),
            _ => {}
        }
    }
    None
}
