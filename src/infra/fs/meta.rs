//! The `meta.json` document stored beside each post's content file.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::domain::posts::{Post, PostParts};
use crate::domain::slug::Slug;
use crate::domain::tags::Tag;
use crate::domain::types::PostStatus;

pub(crate) const META_FILE: &str = "meta.json";
pub(crate) const CONTENT_FILE: &str = "content.md";

/// Field order and names are the on-disk format; do not reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostMeta {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub published_at: Option<OffsetDateTime>,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl From<&Post> for PostMeta {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id().to_string(),
            title: post.title().to_string(),
            slug: post.slug().to_string(),
            excerpt: post.excerpt().to_string(),
            tags: post.tag_names(),
            status: post.status().as_str().to_string(),
            created_at: post.created_at(),
            updated_at: post.updated_at(),
            published_at: post.published_at(),
            version: post.version(),
            cover: post.cover().map(str::to_string),
        }
    }
}

impl PostMeta {
    /// Rebuild the aggregate, returning a human-readable reason on failure.
    ///
    /// Individual malformed tags are dropped rather than rejecting the post.
    pub(crate) fn into_post(self, content: String) -> Result<Post, String> {
        let slug = Slug::parse(self.slug).map_err(|err| err.to_string())?;
        let status = self
            .status
            .parse::<PostStatus>()
            .map_err(|err| err.to_string())?;

        let mut tags = Vec::with_capacity(self.tags.len());
        for name in self.tags {
            match Tag::parse(name.clone()) {
                Ok(tag) => tags.push(tag),
                Err(err) => warn!(
                    target = "infra::fs::meta",
                    op = "into_post",
                    result = "tag_dropped",
                    post_id = %self.id,
                    tag = %name,
                    error = %err,
                    "Dropping invalid tag from stored post"
                ),
            }
        }

        Post::from_parts(PostParts {
            id: self.id,
            title: self.title,
            slug,
            content,
            excerpt: self.excerpt,
            tags,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            published_at: self.published_at,
            version: self.version,
            cover: self.cover,
        })
        .map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn sample_meta() -> PostMeta {
        PostMeta {
            id: "2024-06-hello-world".to_string(),
            title: "Hello World".to_string(),
            slug: "hello-world".to_string(),
            excerpt: "Hi".to_string(),
            tags: vec!["go".to_string(), "rust".to_string()],
            status: "published".to_string(),
            created_at: datetime!(2024-06-15 08:30:00 UTC),
            updated_at: datetime!(2024-06-16 09:00:00 UTC),
            published_at: Some(datetime!(2024-06-16 09:00:00 UTC)),
            version: 3,
            cover: None,
        }
    }

    #[test]
    fn document_layout_is_stable() {
        let json = serde_json::to_string_pretty(&sample_meta()).expect("serialize");
        insta::assert_snapshot!(json, @r#"
        {
          "id": "2024-06-hello-world",
          "title": "Hello World",
          "slug": "hello-world",
          "excerpt": "Hi",
          "tags": [
            "go",
            "rust"
          ],
          "status": "published",
          "createdAt": "2024-06-15T08:30:00Z",
          "updatedAt": "2024-06-16T09:00:00Z",
          "publishedAt": "2024-06-16T09:00:00Z",
          "version": 3
        }
        "#);
    }

    #[test]
    fn reads_documents_with_offsets_and_missing_optionals() {
        let raw = r#"{
          "id": "2024-01-draft",
          "title": "Draft",
          "slug": "draft",
          "excerpt": "",
          "tags": [],
          "status": "draft",
          "createdAt": "2024-01-02T10:00:00+08:00",
          "updatedAt": "2024-01-02T10:00:00+08:00",
          "version": 1
        }"#;
        let meta: PostMeta = serde_json::from_str(raw).expect("parse");
        let post = meta.into_post("body".to_string()).expect("valid post");

        assert_eq!(post.status(), PostStatus::Draft);
        assert_eq!(post.published_at(), None);
        assert_eq!(post.cover(), None);
        assert_eq!(post.created_at(), datetime!(2024-01-02 02:00:00 UTC));
    }

    #[test]
    fn invalid_tags_are_dropped() {
        let mut meta = sample_meta();
        meta.tags = vec!["rust".to_string(), "Not A Tag".to_string()];

        let post = meta.into_post("body".to_string()).expect("valid post");
        assert_eq!(post.tag_names(), vec!["rust"]);
    }

    #[test]
    fn structural_problems_are_reported() {
        let mut bad_slug = sample_meta();
        bad_slug.slug = "Bad Slug".to_string();
        assert!(bad_slug.into_post("body".to_string()).is_err());

        let mut bad_status = sample_meta();
        bad_status.status = "archived".to_string();
        assert!(bad_status.into_post("body".to_string()).is_err());

        let mut unpublished = sample_meta();
        unpublished.published_at = None;
        assert!(unpublished.into_post("body".to_string()).is_err());

        assert!(sample_meta().into_post(String::new()).is_err());
    }
}
