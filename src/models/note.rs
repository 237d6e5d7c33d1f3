//! Note domain model and search filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note as returned by the API.
/// The server owns these; the client only holds transient copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Payload for creating or replacing a note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Search filter for note listings.
///
/// `query` is matched against title and content server-side. `tags`
/// narrows to notes carrying every listed tag, not any of them.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub query: Option<String>,
    pub tags: Vec<String>,
}

impl NoteFilter {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.tags.is_empty()
    }

    /// Encode the filter as query parameters. Tags are comma-joined into
    /// a single `tags` parameter, matching what the API expects.
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(ref query) = self.query {
            params.push(("search".to_string(), query.clone()));
        }
        if !self.tags.is_empty() {
            params.push(("tags".to_string(), self.tags.join(",")));
        }
        params
    }
}
