//! REST API client module for the jotter notes service.
//!
//! This module provides the `ApiClient` request pipeline (bearer token
//! decoration, 401 interception, single-flight token refresh) and the
//! `NotesClient` typed facade over the notes endpoints.
//!
//! The API uses short-lived JWT bearer tokens for resource calls and an
//! ambient session cookie for the refresh exchange.

pub mod client;
pub mod error;
pub mod notes;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use notes::NotesClient;
pub use transport::{RawResponse, RequestParts, ReqwestTransport, Transport, TransportFuture};
