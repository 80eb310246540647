//! The post aggregate and its draft/published state machine.

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use super::error::DomainError;
use super::excerpt::{DEFAULT_EXCERPT_LENGTH, generate_excerpt};
use super::slug::Slug;
use super::tags::{Tag, normalize_tags};
use super::types::PostStatus;

/// Current UTC time at whole-second precision, matching what the metadata
/// document can represent.
pub fn timestamp_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now - Duration::nanoseconds(i64::from(now.nanosecond()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    id: String,
    title: String,
    slug: Slug,
    content: String,
    excerpt: String,
    tags: Vec<Tag>,
    status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    published_at: Option<OffsetDateTime>,
    version: u64,
    cover: Option<String>,
}

/// Every field of a stored post, used to rehydrate an aggregate from storage.
#[derive(Debug, Clone)]
pub struct PostParts {
    pub id: String,
    pub title: String,
    pub slug: Slug,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<Tag>,
    pub status: PostStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub published_at: Option<OffsetDateTime>,
    pub version: u64,
    pub cover: Option<String>,
}

impl Post {
    /// Create a draft at version 1.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        slug: Slug,
        content: impl Into<String>,
        tags: Vec<Tag>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let content = content.into();
        ensure_title(&title)?;
        ensure_content(&content)?;

        let now = timestamp_now();
        let excerpt = generate_excerpt(&content, DEFAULT_EXCERPT_LENGTH);

        Ok(Self {
            id: id.into(),
            title,
            slug,
            content,
            excerpt,
            tags: normalize_tags(tags),
            status: PostStatus::Draft,
            created_at: now,
            updated_at: now,
            published_at: None,
            version: 1,
            cover: None,
        })
    }

    /// Attach a cover while constructing; unlike [`Post::update_cover`] this is
    /// not a mutation and leaves the version alone.
    pub fn with_cover(mut self, cover: Option<String>) -> Self {
        self.cover = cover.filter(|cover| !cover.is_empty());
        self
    }

    /// Rebuild a post from stored fields, re-checking the aggregate invariants.
    pub fn from_parts(parts: PostParts) -> Result<Self, DomainError> {
        ensure_title(&parts.title)?;
        ensure_content(&parts.content)?;
        if parts.id.is_empty() {
            return Err(DomainError::invariant("post id must not be empty"));
        }
        if parts.version < 1 {
            return Err(DomainError::invariant("post version must be at least 1"));
        }
        if parts.status.is_published() != parts.published_at.is_some() {
            return Err(DomainError::invariant(
                "publishedAt must be set exactly when the post is published",
            ));
        }

        Ok(Self {
            id: parts.id,
            title: parts.title,
            slug: parts.slug,
            content: parts.content,
            excerpt: parts.excerpt,
            tags: normalize_tags(parts.tags),
            status: parts.status,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            published_at: parts.published_at,
            version: parts.version,
            cover: parts.cover.filter(|cover| !cover.is_empty()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn status(&self) -> PostStatus {
        self.status
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }

    pub fn published_at(&self) -> Option<OffsetDateTime> {
        self.published_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cover(&self) -> Option<&str> {
        self.cover.as_deref()
    }

    pub fn is_published(&self) -> bool {
        self.status.is_published()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.as_str().to_string()).collect()
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.as_str() == name)
    }

    pub fn into_parts(self) -> PostParts {
        PostParts {
            id: self.id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            tags: self.tags,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            published_at: self.published_at,
            version: self.version,
            cover: self.cover,
        }
    }

    pub fn publish(&mut self) -> Result<(), DomainError> {
        if !self.status.can_publish() {
            return Err(DomainError::AlreadyPublished);
        }

        let now = timestamp_now();
        self.status = PostStatus::Published;
        self.published_at = Some(now);
        self.touch_at(now);
        Ok(())
    }

    pub fn unpublish(&mut self) -> Result<(), DomainError> {
        if !self.status.can_unpublish() {
            return Err(DomainError::NotPublished);
        }

        self.status = PostStatus::Draft;
        self.published_at = None;
        self.touch();
        Ok(())
    }

    pub fn update_title(&mut self, title: impl Into<String>) -> Result<(), DomainError> {
        let title = title.into();
        ensure_title(&title)?;

        self.title = title;
        self.touch();
        Ok(())
    }

    /// Change the title and slug together as a single mutation.
    pub fn rename(&mut self, title: impl Into<String>, slug: Slug) -> Result<(), DomainError> {
        let title = title.into();
        ensure_title(&title)?;

        self.title = title;
        self.slug = slug;
        self.touch();
        Ok(())
    }

    /// Replace the body and regenerate the excerpt at the default length.
    pub fn update_content(&mut self, content: impl Into<String>) -> Result<(), DomainError> {
        let content = content.into();
        ensure_content(&content)?;

        self.content = content;
        self.generate_excerpt(DEFAULT_EXCERPT_LENGTH);
        self.touch();
        Ok(())
    }

    pub fn update_tags(&mut self, tags: Vec<Tag>) {
        self.tags = normalize_tags(tags);
        self.touch();
    }

    pub fn update_cover(&mut self, cover: Option<String>) {
        self.cover = cover.filter(|cover| !cover.is_empty());
        self.touch();
    }

    /// Recompute the excerpt. Derived data only; the version is unchanged.
    pub fn generate_excerpt(&mut self, max_len: usize) {
        self.excerpt = generate_excerpt(&self.content, max_len);
    }

    fn touch(&mut self) {
        self.touch_at(timestamp_now());
    }

    fn touch_at(&mut self, now: OffsetDateTime) {
        self.updated_at = now;
        self.version += 1;
    }
}

fn ensure_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        Err(DomainError::EmptyTitle)
    } else {
        Ok(())
    }
}

fn ensure_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        Err(DomainError::EmptyContent)
    } else {
        Ok(())
    }
}
