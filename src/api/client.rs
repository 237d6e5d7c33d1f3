//! API client for the jotter notes service.
//!
//! `ApiClient` owns the authenticated request pipeline: each call is
//! decorated with the current bearer token, dispatched over the
//! transport, and inspected for authentication failure. A 401 triggers
//! one token refresh over the session cookie and one replay of the
//! original request; the replay's outcome is final. Concurrent 401s
//! coalesce onto a single in-flight refresh.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::config::Config;
use crate::models::User;

use super::transport::{RawResponse, RequestParts, ReqwestTransport, Transport};
use super::ApiError;

/// Outcome shared between every request waiting on one refresh exchange.
/// The error is a plain message so the shared future's output stays
/// `Clone`; it surfaces as `ApiError::SessionExpired`.
type RefreshOutcome = Result<String, String>;
type RefreshFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the notes API.
/// Clone is cheap - the transport and token store are shared handles.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
    refresh_flight: Arc<Mutex<Option<RefreshFlight>>>,
    refresh_timeout: Duration,
}

impl ApiClient {
    /// Create a client backed by a reqwest transport and an in-memory
    /// token store.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(
            Arc::new(transport),
            TokenStore::in_memory(),
            config,
        ))
    }

    /// Create a client over an explicit transport and token store. This
    /// is the injection seam for tests and for callers that want a
    /// persistent token store.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        tokens: TokenStore,
        config: &Config,
    ) -> Self {
        Self {
            transport,
            tokens,
            refresh_flight: Arc::new(Mutex::new(None)),
            refresh_timeout: Duration::from_secs(config.refresh_timeout_secs),
        }
    }

    /// The token store shared with this client.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // ===== Session endpoints =====

    /// Register a new account.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let request = RequestParts::new(Method::POST, "/auth/register").with_body(json!({
            "username": username,
            "email": email,
            "password": password,
        }));
        let response = self.transport.execute(&request).await?;
        Self::parse(response)
    }

    /// Log in and store the issued access token.
    ///
    /// Dispatched directly on the transport: a 401 here means bad
    /// credentials, not a stale token, so the refresh path must not run.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = RequestParts::new(Method::POST, "/auth/login").with_body(json!({
            "username": username,
            "password": password,
        }));
        let response = self.transport.execute(&request).await?;
        let token: TokenResponse = Self::parse(response)?;
        self.tokens.set(token.access_token);
        debug!(username, "Logged in");
        Ok(())
    }

    /// End the session server-side and forget the local token.
    /// The local token is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = RequestParts::new(Method::POST, "/auth/logout")
            .with_bearer(self.tokens.get());
        let result = self.transport.execute(&request).await;
        self.tokens.clear();

        match result {
            Ok(response) if response.status.is_success() => {}
            Ok(response) => warn!(status = %response.status, "Logout request rejected"),
            Err(error) => warn!(%error, "Logout request failed"),
        }
        Ok(())
    }

    /// Look up the account behind the current session.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.request(RequestParts::new(Method::GET, "/auth/me"))
            .await
    }

    // ===== Request pipeline =====

    /// Execute an authenticated request and parse its JSON body,
    /// refreshing the token and replaying once on authentication failure.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        request: RequestParts,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Self::parse(response)
    }

    /// Like [`ApiClient::request`], for endpoints whose response body is
    /// irrelevant (e.g. delete).
    pub(crate) async fn request_empty(&self, request: RequestParts) -> Result<(), ApiError> {
        let response = self.send(request).await?;
        if response.status.is_success() {
            Ok(())
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    async fn send(&self, request: RequestParts) -> Result<RawResponse, ApiError> {
        let issued = self.tokens.get();
        let response = self
            .transport
            .execute(&request.clone().with_bearer(issued.clone()))
            .await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path = %request.path, "Request unauthorized, refreshing access token");
        let fresh = self.fresh_token(issued.as_deref()).await?;

        // The second attempt is final: a repeat 401 is surfaced to the
        // caller, never answered with another refresh.
        self.transport
            .execute(&request.with_bearer(Some(fresh)))
            .await
    }

    fn parse<T: DeserializeOwned>(response: RawResponse) -> Result<T, ApiError> {
        if !response.status.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }
        serde_json::from_str(&response.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response body: {}", e)))
    }

    // ===== Refresh protocol =====

    /// Produce a token newer than `stale`, refreshing if nobody has yet.
    ///
    /// Concurrent callers coalesce onto one in-flight exchange: the first
    /// caller publishes a shared handle and everyone else awaits it. Two
    /// parallel refresh exchanges could each invalidate the other's
    /// token, so a single flight is a correctness requirement here.
    async fn fresh_token(&self, stale: Option<&str>) -> Result<String, ApiError> {
        if let Some(current) = self.tokens.get() {
            if Some(current.as_str()) != stale {
                // Another task already rotated the token.
                return Ok(current);
            }
        }

        let flight = self.join_or_start_refresh();
        let outcome = flight.clone().await;

        // Retire the finished flight so the next failure cycle starts a
        // fresh exchange. Whoever gets here first cleans up; a dropped
        // starter cannot strand the slot.
        {
            let mut slot = self.lock_flight();
            if slot.as_ref().is_some_and(|f| f.ptr_eq(&flight)) {
                *slot = None;
            }
        }

        outcome.map_err(ApiError::SessionExpired)
    }

    fn join_or_start_refresh(&self) -> RefreshFlight {
        let mut slot = self.lock_flight();
        if let Some(flight) = slot.as_ref() {
            return flight.clone();
        }

        let transport = Arc::clone(&self.transport);
        let tokens = self.tokens.clone();
        let timeout = self.refresh_timeout;
        let flight = async move { Self::run_refresh(transport, tokens, timeout).await }
            .boxed()
            .shared();
        *slot = Some(flight.clone());
        flight
    }

    /// The refresh exchange itself. Authorized by the session cookie, not
    /// the expired bearer token, and dispatched directly on the transport
    /// so it can never recurse into the retry logic.
    async fn run_refresh(
        transport: Arc<dyn Transport>,
        tokens: TokenStore,
        timeout: Duration,
    ) -> RefreshOutcome {
        let request = RequestParts::new(Method::POST, "/auth/refresh");
        let result = tokio::time::timeout(timeout, transport.execute(&request)).await;

        let outcome = match result {
            Ok(Ok(response)) if response.status.is_success() => {
                serde_json::from_str::<TokenResponse>(&response.body)
                    .map(|token| token.access_token)
                    .map_err(|e| format!("Malformed refresh response: {}", e))
            }
            Ok(Ok(response)) => Err(format!("Refresh rejected with status {}", response.status)),
            Ok(Err(error)) => Err(format!("Refresh request failed: {}", error)),
            Err(_) => Err("Refresh timed out".to_string()),
        };

        match outcome {
            Ok(token) => {
                debug!("Access token refreshed");
                tokens.set(token.clone());
                Ok(token)
            }
            Err(message) => {
                warn!(%message, "Session refresh failed, clearing access token");
                tokens.clear();
                Err(message)
            }
        }
    }

    // A poisoned lock still holds a valid Option, so recover the guard.
    fn lock_flight(&self) -> MutexGuard<'_, Option<RefreshFlight>> {
        self.refresh_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_parses_login_payload() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token": "jwt-abc", "token_type": "bearer"}"#)
                .expect("Failed to parse token response");
        assert_eq!(parsed.access_token, "jwt-abc");
    }

    #[test]
    fn parse_maps_failure_statuses_before_touching_the_body() {
        let response = RawResponse {
            status: StatusCode::NOT_FOUND,
            body: r#"{"detail": "Note not found"}"#.to_string(),
        };
        let error = ApiClient::parse::<User>(response).expect_err("404 should not parse");
        assert!(matches!(error, ApiError::NotFound(detail) if detail == "Note not found"));
    }

    #[test]
    fn parse_reports_malformed_success_bodies() {
        let response = RawResponse {
            status: StatusCode::OK,
            body: "not json".to_string(),
        };
        let error = ApiClient::parse::<User>(response).expect_err("Garbage should not parse");
        assert!(matches!(error, ApiError::InvalidResponse(_)));
    }
}
