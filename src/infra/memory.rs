//! Volatile repository used by tests and embedders without a durable store.

use std::sync::RwLock;
use std::time::Instant;

use tracing::debug;

use crate::application::pagination::PaginatedResult;
use crate::application::repos::{
    CountOptions, ExpectedVersion, ListOptions, PostRepository, RepoError,
};
use crate::domain::posts::Post;

use super::lock::{rw_read, rw_write};
use super::metrics::{record_conflict, record_delete, record_save};
use super::table::PostTable;

const SOURCE: &str = "infra::memory";
const BACKEND: &str = "memory";

#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    table: RwLock<PostTable>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self, post: &Post, expected: Option<ExpectedVersion>) -> Result<(), RepoError> {
        let started_at = Instant::now();
        let mut table = rw_write(&self.table, SOURCE, "save");

        if let Err(err) = table.check_save(post, expected) {
            record_conflict(BACKEND, conflict_kind(&err));
            return Err(err);
        }

        table.upsert(post.clone());
        record_save(BACKEND, started_at);
        debug!(
            target = SOURCE,
            op = "save",
            result = "ok",
            post_id = post.id(),
            version = post.version(),
            "Stored post in memory"
        );
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        rw_read(&self.table, SOURCE, "is_consistent").is_consistent()
    }
}

impl PostRepository for InMemoryPostRepository {
    fn find_by_id(&self, id: &str) -> Result<Post, RepoError> {
        rw_read(&self.table, SOURCE, "find_by_id")
            .get(id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn find_by_slug(&self, slug: &str) -> Result<Post, RepoError> {
        rw_read(&self.table, SOURCE, "find_by_slug")
            .get_by_slug(slug)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn find_all(&self, options: &ListOptions) -> Result<PaginatedResult<Post>, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "find_all").list(options))
    }

    fn find_by_tag(&self, tag: &str) -> Result<Vec<Post>, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "find_by_tag").by_tag(tag))
    }

    fn find_all_tags(&self) -> Result<Vec<String>, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "find_all_tags").tag_names())
    }

    fn save(&self, post: &Post) -> Result<(), RepoError> {
        self.store(post, None)
    }

    fn save_expecting(&self, post: &Post, expected: ExpectedVersion) -> Result<(), RepoError> {
        self.store(post, Some(expected))
    }

    fn delete(&self, id: &str) -> Result<(), RepoError> {
        let mut table = rw_write(&self.table, SOURCE, "delete");
        table.remove(id).ok_or(RepoError::NotFound)?;
        record_delete(BACKEND);
        Ok(())
    }

    fn exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "exists")
            .slug_owner(slug)
            .is_some())
    }

    fn count(&self, options: &CountOptions) -> Result<usize, RepoError> {
        Ok(rw_read(&self.table, SOURCE, "count").count(options))
    }
}

pub(crate) fn conflict_kind(err: &RepoError) -> &'static str {
    match err {
        RepoError::SlugConflict { .. } => "slug",
        RepoError::VersionConflict { .. } => "version",
        RepoError::AlreadyExists { .. } => "id",
        RepoError::NotFound => "missing",
        RepoError::InvalidInput { .. } | RepoError::Persistence(_) => "other",
    }
}
