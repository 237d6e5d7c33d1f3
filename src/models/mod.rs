//! Data models for jotter entities.
//!
//! This module contains the data structures exchanged with the notes API:
//!
//! - `Note`, `NoteDraft`, `NoteFilter`: notes and their search filters
//! - `User`: the authenticated account

pub mod note;
pub mod user;

pub use note::{Note, NoteDraft, NoteFilter};
pub use user::User;
