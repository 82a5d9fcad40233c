//! Errors surfaced by the content engine.

use crate::domain::model::{ContentViolation, GrainType, PageType};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error(
        "Restricted grain type: position {position} of a {page_type} page must be {expected}, not {attempted}"
    )]
    RestrictedGrainType {
        page_type: PageType,
        position: u32,
        expected: GrainType,
        attempted: GrainType,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Structure already created for course {0}")]
    StructureAlreadyCreated(Uuid),
    #[error("A structure build is already running for course {0}")]
    BuildInProgress(Uuid),
    #[error("Structure build cancelled before completion")]
    Cancelled,
    #[error("Persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl ContentError {
    pub fn validation(message: impl Into<String>) -> Self {
        ContentError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        ContentError::NotFound { entity, id }
    }

    /// Folds save-time content violations into one readable message.
    pub fn invalid_content(violations: &[ContentViolation]) -> Self {
        let listed: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        ContentError::Validation(format!("grain content rejected: {}", listed.join("; ")))
    }
}
