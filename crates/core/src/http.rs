//! Request and response model shared by the worker, the storage port and the
//! network port.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// What kind of resource the page asked for.
///
/// Subset of the platform's `RequestDestination` values that the worker
/// branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Image,
    Style,
    Script,
    Font,
    #[default]
    Empty,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Image => "image",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Font => "font",
            Destination::Empty => "",
        }
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(Destination::Document),
            "image" => Ok(Destination::Image),
            "style" => Ok(Destination::Style),
            "script" => Ok(Destination::Script),
            "font" => Ok(Destination::Font),
            "" | "empty" => Ok(Destination::Empty),
            other => Err(Error::InvalidInput(format!("unknown request destination: {other}"))),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain GET with no destination.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, destination: Destination::Empty, headers: Vec::new() }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// The key this request is stored under in a partition.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Identity of a stored entry: method plus fragment-less absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response snapshot.
///
/// The body is reference-counted `Bytes`, so cloning a response yields an
/// independent value that can be stored while the original is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// URL the response was produced for; `None` for synthesized responses.
    pub url: Option<String>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: String::new(), headers: Vec::new(), body: body.into(), url: None }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_key_strips_fragment() {
        let url = Url::parse("https://game.example/news/#latest").unwrap();
        let key = RequestKey::get(&url);
        assert_eq!(key.url, "https://game.example/news/");
        assert_eq!(key.method, "GET");
    }

    #[test]
    fn test_request_key_uppercases_method() {
        let url = Url::parse("https://game.example/api/scores").unwrap();
        let request = Request::get(url).with_method("post");
        assert_eq!(request.key().method, "POST");
        assert!(!request.is_get());
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new(200, "").ok());
        assert!(Response::new(204, "").ok());
        assert!(!Response::new(304, "").ok());
        assert!(!Response::new(404, "").ok());
        assert!(!Response::new(503, "").ok());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let response = Response::new(200, "body").with_header("Content-Type", "text/css");
        assert_eq!(response.content_type(), Some("text/css"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/css"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn test_clone_is_independent_value() {
        let original = Response::new(200, "hello").with_url("https://game.example/");
        let stored = original.clone();
        drop(original);
        assert_eq!(stored.body, Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!("image".parse::<Destination>().unwrap(), Destination::Image);
        assert_eq!("Document".parse::<Destination>().unwrap(), Destination::Document);
        assert_eq!("".parse::<Destination>().unwrap(), Destination::Empty);
        assert!("iframe".parse::<Destination>().is_err());
    }
}
