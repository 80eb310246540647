//! Disposable browse index built by draining the repository.
//!
//! A [`PostIndex`] is a snapshot: it never follows later writes and is only
//! refreshed by calling [`IndexService::build_index`] again.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::error::AppError;
use crate::application::repos::{ListOptions, PostRepository};
use crate::domain::posts::Post;

const SOURCE: &str = "application::index";

/// Calendar month bucket, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid month `{0}`, expected YYYY-MM")]
pub struct InvalidYearMonth(String);

impl YearMonth {
    pub fn new(year: i32, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(timestamp: OffsetDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: u8::from(timestamp.month()),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = InvalidYearMonth;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidYearMonth(value.to_string());
        let (year, month) = value.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Point-in-time projection of the store for tag and archive browsing.
///
/// Every id list is ordered by position in `post_ids` (newest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostIndex {
    post_ids: Vec<String>,
    positions: HashMap<String, usize>,
    slug_to_id: HashMap<String, String>,
    tag_to_ids: BTreeMap<String, Vec<String>>,
    month_to_ids: BTreeMap<YearMonth, Vec<String>>,
}

impl PostIndex {
    /// Fold posts that are already ordered newest first.
    pub fn from_posts<'a, I>(posts: I) -> Self
    where
        I: IntoIterator<Item = &'a Post>,
    {
        let mut index = Self::default();
        for post in posts {
            index.add(post);
        }
        index
    }

    fn add(&mut self, post: &Post) {
        let id = post.id().to_string();
        self.positions.insert(id.clone(), self.post_ids.len());
        self.slug_to_id.insert(post.slug().to_string(), id.clone());
        for tag in post.tags() {
            self.tag_to_ids
                .entry(tag.to_string())
                .or_default()
                .push(id.clone());
        }
        self.month_to_ids
            .entry(YearMonth::of(post.created_at()))
            .or_default()
            .push(id.clone());
        self.post_ids.push(id);
    }

    pub fn post_ids(&self) -> &[String] {
        &self.post_ids
    }

    pub fn len(&self) -> usize {
        self.post_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.post_ids.is_empty()
    }

    pub fn search_by_tag(&self, tag: &str) -> Vec<String> {
        self.tag_to_ids.get(tag).cloned().unwrap_or_default()
    }

    /// Ids created in any month from `start` to `end`, both inclusive.
    pub fn search_by_date_range(&self, start: YearMonth, end: YearMonth) -> Vec<String> {
        if start > end {
            return Vec::new();
        }

        let mut ids: Vec<String> = self
            .month_to_ids
            .range(start..=end)
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect();
        ids.sort_by_key(|id| self.positions.get(id).copied().unwrap_or(usize::MAX));
        ids
    }

    pub fn slug_id(&self, slug: &str) -> Option<&str> {
        self.slug_to_id.get(slug).map(String::as_str)
    }

    /// Tag names, sorted ascending.
    pub fn all_tags(&self) -> Vec<String> {
        self.tag_to_ids.keys().cloned().collect()
    }

    pub fn tag_count(&self, tag: &str) -> usize {
        self.tag_to_ids.get(tag).map_or(0, Vec::len)
    }

    /// Months that hold at least one post, newest first.
    pub fn archive_months(&self) -> Vec<YearMonth> {
        self.month_to_ids.keys().rev().copied().collect()
    }

    pub fn month_count(&self, month: YearMonth) -> usize {
        self.month_to_ids.get(&month).map_or(0, Vec::len)
    }
}

#[derive(Clone)]
pub struct IndexService {
    repo: Arc<dyn PostRepository>,
}

impl IndexService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Drain the repository in a single unbounded listing and fold it.
    pub fn build_index(&self) -> Result<PostIndex, AppError> {
        let page = self.repo.find_all(&ListOptions::unbounded())?;
        let index = PostIndex::from_posts(&page.items);

        debug!(
            target = SOURCE,
            op = "build_index",
            result = "ok",
            posts = index.len(),
            tags = index.tag_to_ids.len(),
            months = index.month_to_ids.len(),
            "Built post index"
        );
        Ok(index)
    }
}
