//! URL-safe post identifiers and their deterministic derivation from titles.
//!
//! Titles are transliterated before slugification (`slug` crate), with Chinese
//! characters mapped through `pinyin` so inputs like “你好世界” become
//! `ni-hao-shi-jie`. Collision resolution is pure: callers pass the current
//! slug universe and receive the smallest free `base-n` suffix.

use std::collections::HashSet;
use std::fmt;

use pinyin::{Pinyin, ToPinyin};
use serde::{Deserialize, Serialize};
use slug::slugify;

use super::error::DomainError;

/// Base used when a title has no representable characters at all.
pub const FALLBACK_SLUG_BASE: &str = "post";

/// A validated slug matching `^[a-z0-9]+(-[a-z0-9]+)*$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if is_slug_shaped(&raw) {
            Ok(Self(raw))
        } else {
            Err(DomainError::InvalidSlug(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slug::parse(value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

/// Returns true when `value` is one or more `[a-z0-9]+` runs joined by single hyphens.
pub(crate) fn is_slug_shaped(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit())
        })
}

/// Derive the base slug for a title, falling back to [`FALLBACK_SLUG_BASE`].
pub fn derive_base(title: &str) -> String {
    let transliterated = transliterate_to_ascii(title);
    let candidate = slugify(&transliterated);

    if is_slug_shaped(&candidate) {
        candidate
    } else {
        FALLBACK_SLUG_BASE.to_string()
    }
}

/// Produce a slug for `title` that is absent from `existing`.
///
/// When the base is taken, suffixes `-2`, `-3`, … are probed and the smallest
/// free one wins, so gaps left by deleted posts are reused.
pub fn generate_from_title<S>(title: &str, existing: &[S]) -> Slug
where
    S: AsRef<str>,
{
    let base = derive_base(title);
    let taken: HashSet<&str> = existing.iter().map(AsRef::as_ref).collect();

    if !taken.contains(base.as_str()) {
        return Slug(base);
    }

    let mut suffix: u64 = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken.contains(candidate.as_str()) {
            return Slug(candidate);
        }
        suffix += 1;
    }
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            // slugify transliterates or drops whatever is left.
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
    buffer.push(' ');
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn parse_accepts_canonical_slugs() {
        for raw in ["hello-world", "hello-world-123", "hello", "a1-b2"] {
            assert_eq!(Slug::parse(raw).expect("valid").as_str(), raw);
        }
    }

    #[test]
    fn parse_rejects_malformed_slugs() {
        for raw in [
            "",
            "hello@world",
            "hello world",
            "Hello-World",
            "hello_world",
            "-hello",
            "hello-",
            "hello--world",
            "你好世界",
        ] {
            assert!(
                matches!(Slug::parse(raw), Err(DomainError::InvalidSlug(_))),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn derives_simple_title() {
        assert_eq!(generate_from_title("Hello World", &NONE).as_str(), "hello-world");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(
            generate_from_title("Hello, World! (2024)", &NONE).as_str(),
            "hello-world-2024"
        );
    }

    #[test]
    fn transliterates_chinese() {
        assert_eq!(generate_from_title("你好世界", &NONE).as_str(), "ni-hao-shi-jie");
        assert_eq!(derive_base("Rust 基础教程"), "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn falls_back_when_title_has_no_slug_characters() {
        assert_eq!(generate_from_title("!!! ???", &NONE).as_str(), FALLBACK_SLUG_BASE);
        assert_eq!(generate_from_title("***", &["post"]).as_str(), "post-2");
    }

    #[test]
    fn unrelated_slugs_do_not_conflict() {
        assert_eq!(
            generate_from_title("Hello World", &["other-slug"]).as_str(),
            "hello-world"
        );
    }

    #[test]
    fn appends_counter_on_conflict() {
        assert_eq!(
            generate_from_title("Hello World", &["hello-world"]).as_str(),
            "hello-world-2"
        );
        assert_eq!(
            generate_from_title("Hello World", &["hello-world", "hello-world-2"]).as_str(),
            "hello-world-3"
        );
    }

    #[test]
    fn fills_gaps_before_extending() {
        let existing = ["hello-world", "hello-world-2", "hello-world-4"];
        assert_eq!(
            generate_from_title("Hello World", &existing).as_str(),
            "hello-world-3"
        );
    }

    #[test]
    fn serde_round_trips_through_string() {
        let slug = Slug::parse("hello-world").expect("valid");
        let json = serde_json::to_string(&slug).expect("serialize");
        assert_eq!(json, "\"hello-world\"");
        assert!(serde_json::from_str::<Slug>("\"Bad Slug\"").is_err());
    }
}
