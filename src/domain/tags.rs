//! Topical labels attached to posts.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::slug::is_slug_shaped;

pub const MAX_TAG_LEN: usize = 30;

/// A validated tag: slug-shaped and at most [`MAX_TAG_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::InvalidTag(raw));
        }
        if raw.chars().count() > MAX_TAG_LEN {
            return Err(DomainError::TagTooLong {
                tag: raw,
                max: MAX_TAG_LEN,
            });
        }
        if !is_slug_shaped(&raw) {
            return Err(DomainError::InvalidTag(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tag::parse(value)
    }
}

impl From<Tag> for String {
    fn from(value: Tag) -> Self {
        value.0
    }
}

/// Drop duplicates (first occurrence wins) and sort ascending.
pub fn normalize_tags<T, I>(tags: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Clone + Eq + Hash + Ord,
{
    let mut seen = HashSet::new();
    let mut unique: Vec<T> = tags
        .into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect();
    unique.sort();
    unique
}

/// Validate raw tag names, skipping empty entries, then normalize.
pub fn parse_tags<I, S>(names: I) -> Result<Vec<Tag>, DomainError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = Vec::new();
    for name in names {
        let name = name.as_ref();
        if name.is_empty() {
            continue;
        }
        tags.push(Tag::parse(name)?);
    }
    Ok(normalize_tags(tags))
}
