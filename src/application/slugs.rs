//! Advisory slug minting on top of the repository's slug universe.
//!
//! Suggestions are not reservations: two callers may be handed the same slug,
//! and the repository's save-time conflict check decides which one wins.

use std::sync::Arc;

use tracing::warn;

use crate::application::repos::{ListOptions, PostRepository, RepoError};
use crate::domain::error::DomainError;
use crate::domain::slug::{Slug, generate_from_title};

const SOURCE: &str = "application::slugs";

#[derive(Clone)]
pub struct SlugService {
    repo: Arc<dyn PostRepository>,
}

impl SlugService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Mint a slug for `title` that no stored post currently uses.
    pub fn generate_unique_slug(&self, title: &str) -> Slug {
        let existing = self.slug_universe(None);
        generate_from_title(title, &existing)
    }

    /// Like [`SlugService::generate_unique_slug`], additionally avoiding every
    /// slug in `reserved`.
    pub fn generate_unique_slug_avoiding(&self, title: &str, reserved: &[String]) -> Slug {
        let mut existing = self.slug_universe(None);
        existing.extend(reserved.iter().cloned());
        generate_from_title(title, &existing)
    }

    /// Like [`SlugService::generate_unique_slug`], but the slug currently held
    /// by `own_id` counts as free so a rename can keep it.
    pub fn generate_unique_slug_for(&self, title: &str, own_id: &str) -> Slug {
        let existing = self.slug_universe(Some(own_id));
        generate_from_title(title, &existing)
    }

    /// True when `slug` is bound to a post other than `exclude_id`.
    pub fn check_conflict(&self, slug: &str, exclude_id: Option<&str>) -> Result<bool, RepoError> {
        if !self.repo.exists(slug)? {
            return Ok(false);
        }

        let Some(exclude_id) = exclude_id.filter(|id| !id.is_empty()) else {
            return Ok(true);
        };

        match self.repo.find_by_slug(slug) {
            Ok(owner) => Ok(owner.id() != exclude_id),
            // The index claims the slug but the post is gone; treat as taken.
            Err(RepoError::NotFound) => Ok(true),
            Err(err) => Err(err),
        }
    }

    pub fn validate_slug(&self, slug: &str) -> Result<(), DomainError> {
        Slug::parse(slug).map(|_| ())
    }

    /// Every stored slug, minus the one owned by `exclude_id`. A failed
    /// listing degrades to an empty universe.
    fn slug_universe(&self, exclude_id: Option<&str>) -> Vec<String> {
        match self.repo.find_all(&ListOptions::unbounded()) {
            Ok(page) => page
                .items
                .into_iter()
                .filter(|post| Some(post.id()) != exclude_id)
                .map(|post| post.slug().to_string())
                .collect(),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "slug_universe",
                    result = "degraded",
                    error = %err,
                    "Could not list stored slugs; generating without a collision check"
                );
                Vec::new()
            }
        }
    }
}
