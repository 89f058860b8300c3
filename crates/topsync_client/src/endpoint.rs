//! Connection endpoint derived from the page location.

use crate::error::{SyncError, SyncResult};
use std::fmt;

/// Which path the WebSocket endpoint uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EndpointPath {
    /// The page's own path (query and fragment dropped).
    #[default]
    SamePath,
    /// A fixed path on the page's host, e.g. `/ws`.
    Fixed(String),
}

/// A WebSocket URL the transport connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    /// Uses a WebSocket URL as-is.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Derives the endpoint from the page's own URL.
    ///
    /// `http` maps to `ws` and `https` to `wss`; `ws`/`wss` pass through.
    ///
    /// ```
    /// use topsync_client::{Endpoint, EndpointPath};
    ///
    /// let ep = Endpoint::from_page("https://app.example.com/form?x=1", EndpointPath::SamePath).unwrap();
    /// assert_eq!(ep.url(), "wss://app.example.com/form");
    /// ```
    pub fn from_page(page_url: &str, path: EndpointPath) -> SyncResult<Self> {
        let (scheme, rest) = page_url
            .split_once("://")
            .ok_or_else(|| SyncError::Config(format!("not an absolute URL: {page_url}")))?;

        let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(SyncError::Config(format!(
                    "unsupported page scheme `{other}`"
                )))
            }
        };

        let (host, page_path) = match rest.find(['/', '?', '#']) {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if host.is_empty() {
            return Err(SyncError::Config(format!("missing host: {page_url}")));
        }

        let path = match path {
            EndpointPath::SamePath => {
                let end = page_path.find(['?', '#']).unwrap_or(page_path.len());
                match &page_path[..end] {
                    "" => "/".to_string(),
                    p => p.to_string(),
                }
            }
            EndpointPath::Fixed(p) if p.starts_with('/') => p,
            EndpointPath::Fixed(p) => format!("/{p}"),
        };

        Ok(Self {
            url: format!("{ws_scheme}://{host}{path}"),
        })
    }

    /// Returns the URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path() {
        let ep = Endpoint::from_page("http://localhost:3000/tasks/1", EndpointPath::SamePath).unwrap();
        assert_eq!(ep.url(), "ws://localhost:3000/tasks/1");
    }

    #[test]
    fn root_path() {
        let ep = Endpoint::from_page("http://localhost:3000", EndpointPath::SamePath).unwrap();
        assert_eq!(ep.url(), "ws://localhost:3000/");

        let ep = Endpoint::from_page("http://localhost:3000?q=1", EndpointPath::SamePath).unwrap();
        assert_eq!(ep.url(), "ws://localhost:3000/");
    }

    #[test]
    fn fixed_path() {
        let ep = Endpoint::from_page(
            "https://example.com/some/page#top",
            EndpointPath::Fixed("/ws".into()),
        )
        .unwrap();
        assert_eq!(ep.url(), "wss://example.com/ws");

        let ep = Endpoint::from_page("http://example.com", EndpointPath::Fixed("ws".into())).unwrap();
        assert_eq!(ep.url(), "ws://example.com/ws");
    }

    #[test]
    fn websocket_urls_pass_through() {
        let ep = Endpoint::from_page("ws://127.0.0.1:9000/live", EndpointPath::SamePath).unwrap();
        assert_eq!(ep.to_string(), "ws://127.0.0.1:9000/live");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(Endpoint::from_page("ftp://example.com", EndpointPath::SamePath).is_err());
        assert!(Endpoint::from_page("example.com/page", EndpointPath::SamePath).is_err());
        assert!(Endpoint::from_page("http:///page", EndpointPath::SamePath).is_err());
    }
}
