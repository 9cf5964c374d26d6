//! The single upstream every request is sent to.
//!
//! # Responsibilities
//! - Parse and validate the configured origin base URL
//! - Build forwarding URIs (origin path joined with the request path)
//! - Build absolute resource URLs for mirroring
//! - Build the origin WebSocket URL (http→ws, https→wss)

use axum::http::Uri;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("invalid origin URL: {0}")]
    Parse(#[from] url::ParseError),
    #[error("unsupported origin scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("origin URL has no host")]
    MissingHost,
}

/// Parsed origin base URL.
#[derive(Debug, Clone)]
pub struct Origin {
    url: Url,
    authority: String,
}

impl Origin {
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let url = Url::parse(raw)?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(OriginError::UnsupportedScheme(other.to_string())),
        }

        let host = url.host_str().ok_or(OriginError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self { url, authority })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `host[:port]`, used as the forwarded `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn is_tls(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Target URI for forwarding an inbound request.
    ///
    /// The origin path and the request path are joined with exactly one slash;
    /// both queries are kept, joined with `&`.
    pub fn forward_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(self.url.path(), uri.path());
        let query = [self.url.query(), uri.query()]
            .into_iter()
            .flatten()
            .filter(|q| !q.is_empty())
            .collect::<Vec<_>>()
            .join("&");

        let path_and_query = if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        };

        Uri::builder()
            .scheme(self.url.scheme())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()
    }

    /// Absolute origin URL of a resource: the request path and query replace
    /// the origin's own path and query.
    pub fn resource_url(&self, uri: &Uri) -> Url {
        let mut url = self.url.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        url
    }

    /// Origin WebSocket URL for an inbound upgrade request. Uses the inbound
    /// path and query, not the origin's path.
    pub fn websocket_url(&self, uri: &Uri) -> String {
        let scheme = if self.is_tls() { "wss" } else { "ws" };
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}://{}{}", scheme, self.authority, path_and_query)
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
