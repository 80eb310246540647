//! Shared domain enumerations aligned with the persisted metadata document.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn is_published(self) -> bool {
        self == PostStatus::Published
    }

    pub fn is_draft(self) -> bool {
        self == PostStatus::Draft
    }

    /// Only drafts may be published.
    pub fn can_publish(self) -> bool {
        self == PostStatus::Draft
    }

    /// Only published posts may be reverted to draft.
    pub fn can_unpublish(self) -> bool {
        self == PostStatus::Published
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    /// An empty string is read as `Draft`, matching how older metadata
    /// documents without a status were written.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" | "" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}
