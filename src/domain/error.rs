use thiserror::Error;

/// Validation and state-machine failures raised by the post aggregate and
/// its value objects. None of these are retried; the caller must supply
/// corrected input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("post title cannot be empty")]
    EmptyTitle,
    #[error("post content cannot be empty")]
    EmptyContent,
    #[error("post is already published")]
    AlreadyPublished,
    #[error("post is not published")]
    NotPublished,
    #[error("invalid slug format: `{0}`")]
    InvalidSlug(String),
    #[error("invalid tag format: `{0}`")]
    InvalidTag(String),
    #[error("tag `{tag}` is too long (max {max} chars)")]
    TagTooLong { tag: String, max: usize },
    #[error("invalid post status: `{0}`")]
    InvalidStatus(String),
    #[error("domain invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Stable identifier for the error kind, used in machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::EmptyTitle => "empty_title",
            DomainError::EmptyContent => "empty_content",
            DomainError::AlreadyPublished => "already_published",
            DomainError::NotPublished => "not_published",
            DomainError::InvalidSlug(_) => "invalid_slug",
            DomainError::InvalidTag(_) => "invalid_tag",
            DomainError::TagTooLong { .. } => "tag_too_long",
            DomainError::InvalidStatus(_) => "invalid_status",
            DomainError::Invariant { .. } => "invariant",
        }
    }
}
