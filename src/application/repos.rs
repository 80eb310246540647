//! Repository contract describing the authoritative post store.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::pagination::{DEFAULT_PAGE_SIZE, PaginatedResult};
use crate::domain::posts::Post;
use crate::domain::types::PostStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("post not found")]
    NotFound,
    #[error("slug `{slug}` is already bound to post `{owner}`")]
    SlugConflict { slug: String, owner: String },
    #[error("post `{id}` already exists")]
    AlreadyExists { id: String },
    #[error("version conflict: expected {expected}, stored {actual}")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl RepoError {
    pub fn from_persistence(err: impl fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrder {
    #[default]
    DateDesc,
    DateAsc,
}

impl PostOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            PostOrder::DateDesc => "date_desc",
            PostOrder::DateAsc => "date_asc",
        }
    }
}

/// Filter, ordering and page window for [`PostRepository::find_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub tag: Option<String>,
    pub status: Option<PostStatus>,
    pub order: PostOrder,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            tag: None,
            status: None,
            order: PostOrder::DateDesc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListOptions {
    /// A single page holding every post, newest first.
    pub fn unbounded() -> Self {
        Self {
            page_size: usize::MAX,
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.status.is_none_or(|status| post.status() == status)
            && self.tag.as_deref().is_none_or(|tag| post.has_tag(tag))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountOptions {
    pub status: Option<PostStatus>,
}

/// Precondition for [`PostRepository::save_expecting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// No post with this id may exist yet.
    Absent,
    /// The stored post must currently be at exactly this version.
    Exactly(u64),
}

/// Authoritative store of post aggregates plus their slug and tag indices.
///
/// Every returned post is an independent copy. `save`, `save_expecting` and
/// `delete` run under exclusive access; reads may overlap each other.
pub trait PostRepository: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Post, RepoError>;

    fn find_by_slug(&self, slug: &str) -> Result<Post, RepoError>;

    fn find_all(&self, options: &ListOptions) -> Result<PaginatedResult<Post>, RepoError>;

    /// All posts carrying `tag`, newest first.
    fn find_by_tag(&self, tag: &str) -> Result<Vec<Post>, RepoError>;

    /// Distinct tag names, sorted ascending.
    fn find_all_tags(&self) -> Result<Vec<String>, RepoError>;

    /// Create or update. Fails with [`RepoError::SlugConflict`] when the slug
    /// belongs to a different post.
    fn save(&self, post: &Post) -> Result<(), RepoError>;

    /// Like [`PostRepository::save`], but the version precondition is checked
    /// inside the same critical section as the write.
    fn save_expecting(&self, post: &Post, expected: ExpectedVersion) -> Result<(), RepoError>;

    fn delete(&self, id: &str) -> Result<(), RepoError>;

    fn exists(&self, slug: &str) -> Result<bool, RepoError>;

    fn count(&self, options: &CountOptions) -> Result<usize, RepoError>;
}
