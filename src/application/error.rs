use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("resource not found")]
    NotFound,
    #[error("version conflict: expected {expected}, stored {actual}")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Stable machine-readable category, used by the CLI error output.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Domain(err) => err.kind(),
            AppError::Repo(RepoError::SlugConflict { .. }) => "slug_conflict",
            AppError::Repo(RepoError::AlreadyExists { .. }) => "already_exists",
            AppError::Repo(RepoError::InvalidInput { .. }) | AppError::Validation(_) => {
                "validation"
            }
            AppError::Repo(RepoError::Persistence(_)) => "persistence",
            AppError::Repo(RepoError::NotFound) | AppError::NotFound => "not_found",
            AppError::Repo(RepoError::VersionConflict { .. }) | AppError::VersionConflict { .. } => {
                "version_conflict"
            }
            AppError::Infra(_) => "infrastructure",
            AppError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound,
            RepoError::VersionConflict { expected, actual } => {
                AppError::VersionConflict { expected, actual }
            }
            other => AppError::Repo(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_service_errors() {
        assert!(matches!(AppError::from(RepoError::NotFound), AppError::NotFound));
        assert!(matches!(
            AppError::from(RepoError::VersionConflict {
                expected: 1,
                actual: 2
            }),
            AppError::VersionConflict {
                expected: 1,
                actual: 2
            }
        ));

        let conflict = AppError::from(RepoError::SlugConflict {
            slug: "taken".to_string(),
            owner: "1".to_string(),
        });
        assert_eq!(conflict.kind(), "slug_conflict");
    }

    #[test]
    fn domain_errors_keep_their_kind() {
        let err = AppError::from(DomainError::EmptyTitle);
        assert_eq!(err.kind(), DomainError::EmptyTitle.kind());
    }
}
