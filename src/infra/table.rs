//! In-memory post table with its derived slug and tag indices.
//!
//! Both repository backends keep one of these behind a `RwLock`. The table
//! never performs I/O; the file backend decides when a change may be applied.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::application::pagination::{PaginatedResult, paginate};
use crate::application::repos::{CountOptions, ExpectedVersion, ListOptions, PostOrder, RepoError};
use crate::domain::posts::Post;

#[derive(Debug, Default)]
pub(crate) struct PostTable {
    posts: HashMap<String, Post>,
    slugs: HashMap<String, String>,
    tags: BTreeMap<String, BTreeSet<String>>,
}

impl PostTable {
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.posts.len()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    pub(crate) fn get_by_slug(&self, slug: &str) -> Option<&Post> {
        self.slugs.get(slug).and_then(|id| self.posts.get(id))
    }

    pub(crate) fn slug_owner(&self, slug: &str) -> Option<&str> {
        self.slugs.get(slug).map(String::as_str)
    }

    /// Check whether `post` may be written, without changing anything.
    pub(crate) fn check_save(
        &self,
        post: &Post,
        expected: Option<ExpectedVersion>,
    ) -> Result<(), RepoError> {
        match (expected, self.posts.get(post.id())) {
            (Some(ExpectedVersion::Absent), Some(_)) => {
                return Err(RepoError::AlreadyExists {
                    id: post.id().to_string(),
                });
            }
            (Some(ExpectedVersion::Exactly(_)), None) => return Err(RepoError::NotFound),
            (Some(ExpectedVersion::Exactly(expected)), Some(stored))
                if stored.version() != expected =>
            {
                return Err(RepoError::VersionConflict {
                    expected,
                    actual: stored.version(),
                });
            }
            _ => {}
        }

        match self.slug_owner(post.slug().as_str()) {
            Some(owner) if owner != post.id() => Err(RepoError::SlugConflict {
                slug: post.slug().to_string(),
                owner: owner.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Insert or replace, dropping index entries keyed on the previous state.
    pub(crate) fn upsert(&mut self, post: Post) {
        if let Some(previous) = self.posts.remove(post.id()) {
            self.unindex(&previous);
        }
        self.index(&post);
        self.posts.insert(post.id().to_string(), post);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Post> {
        let post = self.posts.remove(id)?;
        self.unindex(&post);
        Some(post)
    }

    pub(crate) fn list(&self, options: &ListOptions) -> PaginatedResult<Post> {
        let mut filtered: Vec<Post> = self
            .posts
            .values()
            .filter(|post| options.matches(post))
            .cloned()
            .collect();
        sort_by_date(&mut filtered, options.order);
        paginate(filtered, options.page, options.page_size)
    }

    pub(crate) fn by_tag(&self, tag: &str) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .tags
            .get(tag)
            .into_iter()
            .flatten()
            .filter_map(|id| self.posts.get(id))
            .cloned()
            .collect();
        sort_by_date(&mut posts, PostOrder::DateDesc);
        posts
    }

    pub(crate) fn tag_names(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    pub(crate) fn count(&self, options: &CountOptions) -> usize {
        match options.status {
            None => self.posts.len(),
            Some(status) => self
                .posts
                .values()
                .filter(|post| post.status() == status)
                .count(),
        }
    }

    /// True when the indices are exactly what the post set derives.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let mut rebuilt = PostTable::default();
        for post in self.posts.values() {
            rebuilt.index(post);
        }
        rebuilt.slugs == self.slugs && rebuilt.tags == self.tags
    }

    fn index(&mut self, post: &Post) {
        self.slugs
            .insert(post.slug().to_string(), post.id().to_string());
        for tag in post.tags() {
            self.tags
                .entry(tag.to_string())
                .or_default()
                .insert(post.id().to_string());
        }
    }

    fn unindex(&mut self, post: &Post) {
        if self.slugs.get(post.slug().as_str()).map(String::as_str) == Some(post.id()) {
            self.slugs.remove(post.slug().as_str());
        }
        for tag in post.tags() {
            if let Some(ids) = self.tags.get_mut(tag.as_str()) {
                ids.remove(post.id());
                if ids.is_empty() {
                    self.tags.remove(tag.as_str());
                }
            }
        }
    }
}

/// Stable sort by creation time; equal timestamps order by id ascending.
pub(crate) fn sort_by_date(posts: &mut [Post], order: PostOrder) {
    posts.sort_by(|left, right| {
        let by_date = match order {
            PostOrder::DateDesc => right.created_at().cmp(&left.created_at()),
            PostOrder::DateAsc => left.created_at().cmp(&right.created_at()),
        };
        match by_date {
            Ordering::Equal => left.id().cmp(right.id()),
            other => other,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::slug::Slug;
    use crate::domain::tags::Tag;

    fn post(id: &str, slug: &str, tags: &[&str]) -> Post {
        let tags = tags
            .iter()
            .map(|tag| Tag::parse(*tag).expect("valid tag"))
            .collect();
        Post::new(id, "Title", Slug::parse(slug).expect("valid slug"), "body", tags)
            .expect("valid post")
    }

    #[test]
    fn upsert_replaces_stale_index_entries() {
        let mut table = PostTable::default();
        table.upsert(post("1", "first", &["rust", "go"]));

        let mut renamed = table.get("1").cloned().expect("stored");
        renamed
            .rename("Other", Slug::parse("renamed").expect("valid slug"))
            .expect("rename");
        renamed.update_tags(vec![Tag::parse("rust").expect("valid tag")]);
        table.upsert(renamed);

        assert!(table.get_by_slug("first").is_none());
        assert_eq!(table.get_by_slug("renamed").map(Post::id), Some("1"));
        assert_eq!(table.tag_names(), vec!["rust"]);
        assert!(table.is_consistent());
    }

    #[test]
    fn check_save_detects_conflicts() {
        let mut table = PostTable::default();
        table.upsert(post("1", "taken", &[]));

        let clash = post("2", "taken", &[]);
        assert!(matches!(
            table.check_save(&clash, None),
            Err(RepoError::SlugConflict { ref owner, .. }) if owner == "1"
        ));

        let same = table.get("1").cloned().expect("stored");
        assert!(table.check_save(&same, None).is_ok());
        assert!(matches!(
            table.check_save(&same, Some(ExpectedVersion::Absent)),
            Err(RepoError::AlreadyExists { .. })
        ));
        assert!(matches!(
            table.check_save(&same, Some(ExpectedVersion::Exactly(7))),
            Err(RepoError::VersionConflict {
                expected: 7,
                actual: 1
            })
        ));
        assert!(matches!(
            table.check_save(&post("3", "free", &[]), Some(ExpectedVersion::Exactly(1))),
            Err(RepoError::NotFound)
        ));
    }

    #[test]
    fn remove_clears_every_index() {
        let mut table = PostTable::default();
        table.upsert(post("1", "first", &["rust"]));
        table.upsert(post("2", "second", &["rust"]));

        assert!(table.remove("1").is_some());
        assert!(table.remove("1").is_none());
        assert!(table.get_by_slug("first").is_none());
        assert_eq!(table.by_tag("rust").len(), 1);
        assert_eq!(table.len(), 1);
        assert!(table.is_consistent());
    }

    #[test]
    fn equal_timestamps_order_by_id() {
        let first = post("b", "b", &[]);
        let mut parts = first.clone().into_parts();
        parts.id = "a".to_string();
        parts.slug = Slug::parse("a").expect("valid slug");
        let second = Post::from_parts(parts).expect("valid parts");

        let mut posts = vec![first, second];
        sort_by_date(&mut posts, PostOrder::DateDesc);
        let ids: Vec<&str> = posts.iter().map(Post::id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
