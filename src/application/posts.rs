//! Post workflows: creation with slug minting, versioned updates, and reads.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::application::error::AppError;
use crate::application::pagination::PaginatedResult;
use crate::application::repos::{CountOptions, ExpectedVersion, ListOptions, PostRepository};
use crate::application::slugs::SlugService;
use crate::domain::error::DomainError;
use crate::domain::excerpt::DEFAULT_EXCERPT_LENGTH;
use crate::domain::posts::{Post, timestamp_now};
use crate::domain::slug::Slug;
use crate::domain::tags::parse_tags;
use crate::domain::types::PostStatus;

const SOURCE: &str = "application::posts";

#[derive(Debug, Clone, Default)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub cover: Option<String>,
}

/// Fields left as `None` are not touched. `cover: Some("")` clears the cover.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostCommand {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostStats {
    pub total: usize,
    pub published: usize,
    pub draft: usize,
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    slugs: SlugService,
    excerpt_length: usize,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, slugs: SlugService) -> Self {
        Self {
            repo,
            slugs,
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
        }
    }

    pub fn with_excerpt_length(mut self, excerpt_length: usize) -> Self {
        self.excerpt_length = excerpt_length;
        self
    }

    /// Create a draft with a freshly minted slug and an id of the form
    /// `{year}-{MM}-{slug}`.
    pub fn create_post(&self, command: CreatePostCommand) -> Result<Post, AppError> {
        let CreatePostCommand {
            title,
            content,
            tags,
            cover,
        } = command;

        if title.trim().is_empty() {
            return Err(DomainError::EmptyTitle.into());
        }
        if content.trim().is_empty() {
            return Err(DomainError::EmptyContent.into());
        }
        let tags = parse_tags(&tags)?;

        let (slug, id) = self.mint_identity(&title, timestamp_now());

        let mut post = Post::new(id, title, slug, content, tags)?.with_cover(cover);
        post.generate_excerpt(self.excerpt_length);

        self.repo.save_expecting(&post, ExpectedVersion::Absent)?;
        info!(
            target = SOURCE,
            op = "create_post",
            result = "ok",
            post_id = post.id(),
            slug = post.slug().as_str(),
            "Created post"
        );
        Ok(post)
    }

    /// Apply `command` if the stored post is still at `expected_version`.
    ///
    /// A stale version fails with [`AppError::VersionConflict`] before any
    /// mutation; the write itself re-checks the version atomically, so of two
    /// racing updates from the same version exactly one lands.
    pub fn update_post(
        &self,
        id: &str,
        command: UpdatePostCommand,
        expected_version: u64,
    ) -> Result<Post, AppError> {
        let mut post = self.repo.find_by_id(id)?;
        if post.version() != expected_version {
            return Err(AppError::VersionConflict {
                expected: expected_version,
                actual: post.version(),
            });
        }

        if let Some(title) = command.title {
            if title == post.title() {
                post.update_title(title)?;
            } else {
                let slug = self.slugs.generate_unique_slug_for(&title, post.id());
                post.rename(title, slug)?;
            }
        }

        if let Some(content) = command.content {
            post.update_content(content)?;
        }

        if let Some(tags) = command.tags {
            post.update_tags(parse_tags(&tags)?);
        }

        if let Some(cover) = command.cover {
            post.update_cover(Some(cover));
        }

        match command.status {
            Some(PostStatus::Published) => post.publish()?,
            Some(PostStatus::Draft) => post.unpublish()?,
            None => {}
        }

        post.generate_excerpt(self.excerpt_length);
        self.repo
            .save_expecting(&post, ExpectedVersion::Exactly(expected_version))?;

        info!(
            target = SOURCE,
            op = "update_post",
            result = "ok",
            post_id = post.id(),
            version = post.version(),
            "Updated post"
        );
        Ok(post)
    }

    pub fn publish_post(&self, id: &str, expected_version: u64) -> Result<Post, AppError> {
        let command = UpdatePostCommand {
            status: Some(PostStatus::Published),
            ..UpdatePostCommand::default()
        };
        self.update_post(id, command, expected_version)
    }

    pub fn unpublish_post(&self, id: &str, expected_version: u64) -> Result<Post, AppError> {
        let command = UpdatePostCommand {
            status: Some(PostStatus::Draft),
            ..UpdatePostCommand::default()
        };
        self.update_post(id, command, expected_version)
    }

    pub fn delete_post(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete(id)?;
        info!(
            target = SOURCE,
            op = "delete_post",
            result = "ok",
            post_id = id,
            "Deleted post"
        );
        Ok(())
    }

    pub fn get_post(&self, id: &str) -> Result<Post, AppError> {
        Ok(self.repo.find_by_id(id)?)
    }

    pub fn get_post_by_slug(&self, slug: &str) -> Result<Post, AppError> {
        Ok(self.repo.find_by_slug(slug)?)
    }

    pub fn list_posts(&self, options: &ListOptions) -> Result<PaginatedResult<Post>, AppError> {
        Ok(self.repo.find_all(options)?)
    }

    pub fn stats(&self) -> Result<PostStats, AppError> {
        let count = |status| self.repo.count(&CountOptions { status });
        Ok(PostStats {
            total: count(None)?,
            published: count(Some(PostStatus::Published))?,
            draft: count(Some(PostStatus::Draft))?,
        })
    }

    pub fn all_tags(&self) -> Result<Vec<String>, AppError> {
        Ok(self.repo.find_all_tags()?)
    }
}

impl PostService {
    /// Pick a slug whose dated id is also unused. A rename keeps the old id,
    /// so a free slug can still map onto an id that is taken.
    fn mint_identity(&self, title: &str, at: OffsetDateTime) -> (Slug, String) {
        let mut reserved = Vec::new();
        loop {
            let slug = self.slugs.generate_unique_slug_avoiding(title, &reserved);
            let id = post_id_for(at, &slug);
            match self.repo.find_by_id(&id) {
                Ok(_) => reserved.push(slug.into_inner()),
                Err(_) => return (slug, id),
            }
        }
    }
}

fn post_id_for(at: OffsetDateTime, slug: &Slug) -> String {
    format!("{}-{:02}-{}", at.year(), u8::from(at.month()), slug)
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::infra::memory::InMemoryPostRepository;

    fn service() -> PostService {
        let repo: Arc<dyn PostRepository> = Arc::new(InMemoryPostRepository::new());
        PostService::new(repo.clone(), SlugService::new(repo))
    }

    fn create(service: &PostService, title: &str, tags: &[&str]) -> Post {
        service
            .create_post(CreatePostCommand {
                title: title.to_string(),
                content: "# Intro\n\nSome **body** text".to_string(),
                tags: tags.iter().map(|tag| tag.to_string()).collect(),
                cover: None,
            })
            .expect("create post")
    }

    #[test]
    fn create_assigns_dated_id_and_unique_slug() {
        let service = service();
        let first = create(&service, "Hello World", &["rust"]);
        let second = create(&service, "Hello World", &[]);

        let created = first.created_at();
        let prefix = format!("{}-{:02}-", created.year(), u8::from(created.month()));
        assert_eq!(first.id(), format!("{prefix}hello-world"));
        assert_eq!(second.slug().as_str(), "hello-world-2");
        assert_eq!(first.version(), 1);
        assert_eq!(first.status(), PostStatus::Draft);
        assert_eq!(first.excerpt(), "Intro\n\nSome body text");
    }

    #[test]
    fn create_validates_input() {
        let service = service();
        let blank_title = service.create_post(CreatePostCommand {
            title: "  ".to_string(),
            content: "body".to_string(),
            ..CreatePostCommand::default()
        });
        assert!(matches!(
            blank_title,
            Err(AppError::Domain(DomainError::EmptyTitle))
        ));

        let blank_content = service.create_post(CreatePostCommand {
            title: "Title".to_string(),
            ..CreatePostCommand::default()
        });
        assert!(matches!(
            blank_content,
            Err(AppError::Domain(DomainError::EmptyContent))
        ));

        let bad_tag = service.create_post(CreatePostCommand {
            title: "Title".to_string(),
            content: "body".to_string(),
            tags: vec!["Bad Tag".to_string()],
            cover: None,
        });
        assert!(matches!(
            bad_tag,
            Err(AppError::Domain(DomainError::InvalidTag(_)))
        ));
        assert_eq!(service.stats().expect("stats").total, 0);
    }

    #[test]
    fn create_skips_empty_tags_and_normalizes() {
        let service = service();
        let post = create(&service, "Tagged", &["zebra", "", "apple", "zebra"]);
        assert_eq!(post.tag_names(), vec!["apple", "zebra"]);
    }

    #[test]
    fn create_keeps_cover_at_version_one() {
        let service = service();
        let post = service
            .create_post(CreatePostCommand {
                title: "Covered".to_string(),
                content: "body".to_string(),
                tags: Vec::new(),
                cover: Some("/covers/a.png".to_string()),
            })
            .expect("create");
        assert_eq!(post.cover(), Some("/covers/a.png"));
        assert_eq!(post.version(), 1);
    }

    #[test]
    fn stale_version_is_rejected_without_changes() {
        let service = service();
        let post = create(&service, "Original", &[]);

        let result = service.update_post(
            post.id(),
            UpdatePostCommand {
                title: Some("Changed".to_string()),
                ..UpdatePostCommand::default()
            },
            7,
        );
        assert!(matches!(
            result,
            Err(AppError::VersionConflict {
                expected: 7,
                actual: 1
            })
        ));
        assert_eq!(service.get_post(post.id()).expect("stored"), post);
    }

    #[test]
    fn title_change_remints_slug_but_keeps_id() {
        let service = service();
        create(&service, "Taken Title", &[]);
        let post = create(&service, "Original", &[]);

        let renamed = service
            .update_post(
                post.id(),
                UpdatePostCommand {
                    title: Some("Taken Title".to_string()),
                    ..UpdatePostCommand::default()
                },
                1,
            )
            .expect("update");
        assert_eq!(renamed.id(), post.id());
        assert_eq!(renamed.slug().as_str(), "taken-title-2");
        assert_eq!(renamed.version(), 2);
        assert!(service.get_post_by_slug("original").is_err());

        let punctuated = service
            .update_post(
                post.id(),
                UpdatePostCommand {
                    title: Some("Taken, Title!".to_string()),
                    ..UpdatePostCommand::default()
                },
                2,
            )
            .expect("update");
        assert_eq!(punctuated.slug().as_str(), "taken-title-2");
    }

    #[test]
    fn create_after_rename_skips_the_retained_id() {
        let service = service();
        let first = create(&service, "Hello World", &[]);
        service
            .update_post(
                first.id(),
                UpdatePostCommand {
                    title: Some("Renamed".to_string()),
                    ..UpdatePostCommand::default()
                },
                1,
            )
            .expect("rename");

        let again = create(&service, "Hello World", &[]);
        assert_eq!(again.slug().as_str(), "hello-world-2");
        assert_ne!(again.id(), first.id());
        assert!(again.id().ends_with("-hello-world-2"));
        assert_eq!(service.stats().expect("stats").total, 2);
    }

    #[test]
    fn status_transitions_follow_the_state_machine() {
        let service = service();
        let post = create(&service, "Stateful", &[]);

        let published = service.publish_post(post.id(), 1).expect("publish");
        assert!(published.is_published());
        assert!(published.published_at().is_some());

        assert!(matches!(
            service.publish_post(post.id(), 2),
            Err(AppError::Domain(DomainError::AlreadyPublished))
        ));

        let draft = service.unpublish_post(post.id(), 2).expect("unpublish");
        assert_eq!(draft.published_at(), None);
        assert_eq!(draft.version(), 3);

        let stats = service.stats().expect("stats");
        assert_eq!(
            stats,
            PostStats {
                total: 1,
                published: 0,
                draft: 1
            }
        );
    }

    #[test]
    fn excerpt_uses_configured_length() {
        let repo: Arc<dyn PostRepository> = Arc::new(InMemoryPostRepository::new());
        let service = PostService::new(repo.clone(), SlugService::new(repo)).with_excerpt_length(5);

        let post = service
            .create_post(CreatePostCommand {
                title: "Short".to_string(),
                content: "abcdefghij".to_string(),
                ..CreatePostCommand::default()
            })
            .expect("create");
        assert_eq!(post.excerpt(), "abcde...");

        let updated = service
            .update_post(
                post.id(),
                UpdatePostCommand {
                    content: Some("0123456789".to_string()),
                    ..UpdatePostCommand::default()
                },
                1,
            )
            .expect("update");
        assert_eq!(updated.excerpt(), "01234...");
    }

    #[test]
    fn delete_twice_reports_not_found() {
        let service = service();
        let post = create(&service, "Doomed", &["rust"]);

        service.delete_post(post.id()).expect("delete");
        assert!(matches!(
            service.delete_post(post.id()),
            Err(AppError::NotFound)
        ));
        assert!(service.all_tags().expect("tags").is_empty());
    }

    #[test]
    fn racing_updates_from_one_version_admit_exactly_one() {
        let service = service();
        let post = create(&service, "Contended", &[]);

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let service = service.clone();
                let id = post.id().to_string();
                thread::spawn(move || {
                    service.update_post(
                        &id,
                        UpdatePostCommand {
                            content: Some(format!("writer {n}")),
                            ..UpdatePostCommand::default()
                        },
                        1,
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();
        let winners = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(
            results
                .iter()
                .filter_map(|result| result.as_ref().err())
                .all(|err| matches!(err, AppError::VersionConflict { .. }))
        );
        assert_eq!(service.get_post(post.id()).expect("stored").version(), 2);
    }
}
