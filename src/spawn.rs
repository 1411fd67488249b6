//! Errors for backend processes that never produced a connection.
//!
//! Framing violations live in [`crate::Error`] and assume a response stream
//! exists. The failures here happen earlier: the process the proxy wanted to
//! talk to could not be obtained at all. They travel through a different
//! channel (the spawning layer), carry operator-facing context, and may
//! include an error page authored by the application itself.

use std::collections::HashMap;

use thiserror::Error;

/// Classification of a failed backend acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnErrorKind {
    /// No more specific classification applies.
    Undefined,
    /// The spawner violated the startup handshake.
    SpawnerProtocol,
    /// The spawner did not produce a process within the allowed time.
    SpawnerTimeout,
    /// The application violated the startup handshake.
    AppProtocol,
    /// The application did not finish starting within the allowed time.
    AppTimeout,
    /// The application reported a startup failure of its own, usually with
    /// an error page attached.
    AppReported,
    /// The request was abandoned before a process was selected.
    Aborted,
}

/// Error page supplied by the application to describe its own failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    content: String,
    html: bool,
}

impl ErrorPage {
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the content is html (as opposed to plain text) and can be
    /// served to a browser as-is.
    pub fn is_html(&self) -> bool {
        self.html
    }
}

/// Failure to obtain a backend process.
///
/// Carries a kind for dispatching, a message for logs, an optional
/// application-authored [`ErrorPage`], and free-form annotations the
/// spawning layer attaches as it unwinds (command line, process output,
/// timings).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SpawnError {
    kind: SpawnErrorKind,
    message: String,
    error_page: Option<ErrorPage>,
    annotations: HashMap<String, String>,
}

impl SpawnError {
    pub fn new(kind: SpawnErrorKind, message: impl Into<String>) -> Self {
        SpawnError {
            kind,
            message: message.into(),
            error_page: None,
            annotations: HashMap::new(),
        }
    }

    pub fn with_error_page(mut self, content: impl Into<String>, html: bool) -> Self {
        self.error_page = Some(ErrorPage {
            content: content.into(),
            html,
        });
        self
    }

    pub fn kind(&self) -> SpawnErrorKind {
        self.kind
    }

    pub fn error_page(&self) -> Option<&ErrorPage> {
        self.error_page.as_ref()
    }

    /// Attach a key/value annotation, replacing any previous value.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(|v| v.as_str())
    }

    pub fn annotations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.annotations
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
