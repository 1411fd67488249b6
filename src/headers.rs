use std::fmt;

use http::{HeaderName, HeaderValue};

/// Response headers in wire order.
///
/// Backends send headers whose order and duplication can matter to the
/// layers forwarding them, so this is a plain insertion-ordered list rather
/// than a map. Lookups are ASCII case-insensitive. Collections are owned by
/// the context that parsed them and are not shared.
#[derive(Clone, Default)]
pub struct Headers {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Headers {
            entries: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Headers {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a header, keeping any previous entries with the same name.
    pub fn push(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
    }

    /// Remove all entries. Keeps the allocation for reuse.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// First value carrying `name`, if any.
    ///
    /// The returned borrow is tied to the collection, not to `name`.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// First value carrying `name`, as a string. `None` also when the value
    /// is not valid utf-8.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value carrying `name`, in wire order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    /// Whether any value of `name`, read as a comma separated list, contains
    /// `token` (ASCII case-insensitive).
    ///
    /// This is how list-typed headers such as `Transfer-Encoding` and
    /// `Connection` are tested without normalizing them.
    pub fn has_comma_token(&self, name: &str, token: &str) -> bool {
        self.get_all(name)
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (n, v) in self.iter() {
            map.entry(&n.as_str(), &String::from_utf8_lossy(v.as_bytes()));
        }
        map.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn name(s: &str) -> HeaderName {
        HeaderName::from_bytes(s.as_bytes()).unwrap()
    }

    fn value(s: &str) -> HeaderValue {
        HeaderValue::from_str(s).unwrap()
    }

    #[test]
    fn wire_order_preserved() {
        let mut h = Headers::new();
        h.push(name("set-cookie"), value("a=1"));
        h.push(name("x-runtime"), value("4"));
        h.push(name("set-cookie"), value("b=2"));

        let names: Vec<_> = h.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["set-cookie", "x-runtime", "set-cookie"]);

        let cookies: Vec<_> = h.get_all("set-cookie").collect();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0], "a=1");
        assert_eq!(cookies[1], "b=2");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut h = Headers::new();
        h.push(name("content-type"), value("text/plain"));

        assert_eq!(h.get_str("Content-Type"), Some("text/plain"));
        assert_eq!(h.get_str("CONTENT-TYPE"), Some("text/plain"));
        assert!(h.contains("content-TYPE"));
        assert!(!h.contains("content-length"));
    }

    #[test]
    fn get_outlives_the_lookup_name() {
        let mut h = Headers::new();
        h.push(name("content-type"), value("text/plain"));

        // The borrow must survive the name it was looked up with.
        let v = {
            let lookup = String::from("Content-Type");
            h.get(&lookup)
        };
        assert_eq!(v.unwrap(), "text/plain");
    }

    #[test]
    fn comma_tokens() {
        let mut h = Headers::new();
        h.push(name("transfer-encoding"), value("gzip, Chunked"));
        h.push(name("connection"), value("keep-alive"));

        assert!(h.has_comma_token("transfer-encoding", "chunked"));
        assert!(h.has_comma_token("transfer-encoding", "gzip"));
        assert!(!h.has_comma_token("transfer-encoding", "identity"));
        assert!(h.has_comma_token("connection", "keep-alive"));
        assert!(!h.has_comma_token("connection", "close"));
    }

    #[test]
    fn tokens_across_duplicate_headers() {
        let mut h = Headers::new();
        h.push(name("connection"), value("foo"));
        h.push(name("connection"), value("bar , close"));

        assert!(h.has_comma_token("connection", "close"));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut h = Headers::with_capacity(4);
        h.push(name("a"), value("1"));
        let cap = h.entries.capacity();
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.entries.capacity(), cap);
    }
}
