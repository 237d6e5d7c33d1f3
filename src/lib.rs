//! Client library for the jotter notes service.
//!
//! The centerpiece is [`ApiClient`], which owns the authenticated request
//! pipeline: every call is decorated with the current bearer token,
//! dispatched over a pluggable [`api::Transport`], and inspected for
//! authentication failure. A 401 triggers one token refresh over the
//! session cookie and one replay of the original request; concurrent
//! failures share a single in-flight refresh. When the refresh itself
//! fails the token store is cleared and callers see
//! [`ApiError::SessionExpired`], the signal to route back to login.
//!
//! [`NotesClient`] layers typed CRUD and search operations for notes on
//! top of that pipeline.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, NotesClient};
pub use auth::TokenStore;
pub use config::Config;
pub use models::{Note, NoteDraft, NoteFilter, User};
