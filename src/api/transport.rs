//! Transport layer for the notes API.
//!
//! `Transport` hides the HTTP stack behind a small request/response
//! contract so the retry and refresh logic in `ApiClient` can be driven
//! against fake transports in tests. `ReqwestTransport` is the production
//! implementation backed by a shared `reqwest::Client`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::config::Config;

use super::ApiError;

/// Future type returned by [`Transport::execute`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RawResponse, ApiError>> + Send + 'a>>;

/// A captured description of an outgoing request.
///
/// Immutable once built: replaying a request after a token refresh clones
/// the description and attaches the new bearer token instead of mutating
/// state shared with other in-flight calls.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl RequestParts {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a bearer credential when one is present; otherwise the
    /// request goes out unmodified. This is the only place a credential
    /// is added to a request.
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Raw response from the transport: status plus unparsed body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Opaque request executor.
///
/// Implementations must be `Send + Sync` so one transport can serve every
/// clone of the client concurrently.
pub trait Transport: Send + Sync {
    fn execute<'a>(&'a self, request: &'a RequestParts) -> TransportFuture<'a>;
}

/// Production transport over reqwest.
///
/// The cookie store carries the session cookie that authorizes the token
/// refresh exchange; resource calls authenticate with the bearer header
/// instead.
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn execute<'a>(&'a self, request: &'a RequestParts) -> TransportFuture<'a> {
        Box::pin(async move {
            let url = format!("{}{}", self.base_url, request.path);
            let mut builder = self.client.request(request.method.clone(), &url);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }
            if let Some(ref token) = request.bearer {
                builder = builder.bearer_auth(token);
            }

            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;

            Ok(RawResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoration_adds_bearer_only_when_present() {
        let request = RequestParts::new(Method::GET, "/notes/");
        assert!(request.bearer.is_none());

        let bare = request.clone().with_bearer(None);
        assert!(bare.bearer.is_none());

        let decorated = request.with_bearer(Some("tok".to_string()));
        assert_eq!(decorated.bearer.as_deref(), Some("tok"));
        // The rest of the request is untouched.
        assert_eq!(decorated.path, "/notes/");
        assert!(decorated.query.is_empty());
        assert!(decorated.body.is_none());
    }

    #[test]
    fn replay_clone_is_independent_of_the_original() {
        let original = RequestParts::new(Method::PUT, "/notes/42")
            .with_body(serde_json::json!({"title": "t"}))
            .with_bearer(Some("stale".to_string()));

        let replay = original.clone().with_bearer(Some("fresh".to_string()));
        assert_eq!(original.bearer.as_deref(), Some("stale"));
        assert_eq!(replay.bearer.as_deref(), Some("fresh"));
        assert_eq!(replay.body, original.body);
    }
}
