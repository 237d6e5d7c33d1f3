//! Access credential storage.
//!
//! This module provides `TokenStore`, the single owner of the short-lived
//! bearer token. The longer-lived session lives in the HTTP cookie store
//! and is used only to authorize token refresh.

pub mod token;

pub use token::TokenStore;
