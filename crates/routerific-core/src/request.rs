//! Read access to an incoming HTTP request.
//!
//! The router never owns a transport. It reads requests through [`HttpRequest`], which
//! is implemented for [`http::Request`] (any body that can be viewed as bytes) and for
//! the owned [`Request`] defined here, handy in tests and when adapting other servers.
//!
//! Paths are matched percent-decoded. `%2F` decodes to `/` like any other escape, so
//! `/files/a%2Fb` and `/files/a/b` are the same path to a template. Invalid UTF-8 after
//! decoding is replaced with U+FFFD.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

/// What the router needs to know about a request.
pub trait HttpRequest {
    /// Request method, e.g. `GET`.
    fn method(&self) -> &str;

    /// Percent-decoded request path without the query string.
    fn path(&self) -> Cow<'_, str>;

    /// Decoded value of a query parameter. The last occurrence wins when repeated.
    fn query(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Value of a header, looked up case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// Raw request body.
    fn body(&self) -> &[u8];
}

impl<B: AsRef<[u8]>> HttpRequest for http::Request<B> {
    fn method(&self) -> &str {
        self.method().as_str()
    }

    fn path(&self) -> Cow<'_, str> {
        decode_path(self.uri().path())
    }

    fn query(&self, name: &str) -> Option<Cow<'_, str>> {
        let query = self.uri().query()?;
        form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value)
            .last()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)?.to_str().ok()
    }

    fn body(&self) -> &[u8] {
        self.body().as_ref()
    }
}

fn decode_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

// ============================================================================
// Owned request
// ============================================================================

/// A minimal owned request.
///
/// ```rust,ignore
/// let request = Request::get("/search?q=hello")
///     .with_header("X-Token", "abc")
///     .with_body(r#"{"title": "Hi"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
    query: Vec<(String, String)>,
    // names are stored upper-cased
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    /// Creates a request. `target` may carry a `?query` suffix; the path part is
    /// percent-decoded.
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method: method.to_ascii_uppercase(),
            path: decode_path(path).into_owned(),
            query: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new("GET", target)
    }

    pub fn post(target: &str) -> Self {
        Self::new("POST", target)
    }

    pub fn put(target: &str) -> Self {
        Self::new("PUT", target)
    }

    pub fn delete(target: &str) -> Self {
        Self::new("DELETE", target)
    }

    /// Adds a header, replacing any previous value of the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_uppercase();
        self.headers.retain(|(key, _)| *key != name);
        self.headers.push((name, value.into()));
        self
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Number of bytes in the body.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

impl HttpRequest for Request {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.path)
    }

    fn query(&self, name: &str) -> Option<Cow<'_, str>> {
        self.query
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| Cow::Borrowed(value.as_str()))
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}
