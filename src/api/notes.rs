//! Typed CRUD and search operations over the notes resource.

use reqwest::Method;
use serde_json::json;

use crate::models::{Note, NoteDraft, NoteFilter};

use super::transport::RequestParts;
use super::{ApiClient, ApiError};

/// Typed facade over the notes endpoints.
///
/// Every call rides the client's authenticated pipeline, so token refresh
/// and replay never show through here: callers either get their result or
/// a final error from the taxonomy in [`ApiError`].
#[derive(Clone)]
pub struct NotesClient {
    api: ApiClient,
}

impl NotesClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// List notes for the logged-in user, optionally narrowed by a filter.
    pub async fn list(&self, filter: Option<&NoteFilter>) -> Result<Vec<Note>, ApiError> {
        let mut request = RequestParts::new(Method::GET, "/notes/");
        if let Some(filter) = filter {
            request = request.with_query(filter.to_query());
        }
        self.api.request(request).await
    }

    /// Fetch a single note by id.
    pub async fn get(&self, id: i64) -> Result<Note, ApiError> {
        self.api
            .request(RequestParts::new(Method::GET, format!("/notes/{}", id)))
            .await
    }

    /// Create a new note from a draft.
    pub async fn create(&self, draft: &NoteDraft) -> Result<Note, ApiError> {
        let request =
            RequestParts::new(Method::POST, "/notes/").with_body(Self::draft_body(draft));
        self.api.request(request).await
    }

    /// Replace a note's title, content and tags.
    pub async fn update(&self, id: i64, draft: &NoteDraft) -> Result<Note, ApiError> {
        let request = RequestParts::new(Method::PUT, format!("/notes/{}", id))
            .with_body(Self::draft_body(draft));
        self.api.request(request).await
    }

    /// Delete a note.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api
            .request_empty(RequestParts::new(Method::DELETE, format!("/notes/{}", id)))
            .await
    }

    /// Search notes by free text and tag membership. Tag filters are
    /// conjunctive: a note matches only when it carries every listed tag.
    pub async fn search(&self, filter: &NoteFilter) -> Result<Vec<Note>, ApiError> {
        self.list(Some(filter)).await
    }

    fn draft_body(draft: &NoteDraft) -> serde_json::Value {
        json!({
            "title": draft.title,
            "content": draft.content,
            "tags": draft.tags,
        })
    }
}
