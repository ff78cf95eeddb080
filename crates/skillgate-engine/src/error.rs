//! Error types for skill loading and context planning

use skillgate_types::SkillId;
use thiserror::Error;

/// Skill engine errors
#[derive(Debug, Error)]
pub enum SkillError {
    /// Descriptor could not be parsed or failed validation
    #[error("Invalid skill descriptor '{origin}': {reason}")]
    InvalidDescriptor {
        /// Where the descriptor came from (directory or inline label)
        origin: String,
        /// Failure reason
        reason: String,
    },

    /// Two descriptors share the same name and version
    #[error("Duplicate skill '{0}'")]
    DuplicateSkill(SkillId),

    /// A module points at content the source does not provide
    #[error("Skill '{skill}' references missing module content '{reference}'")]
    UnresolvedModule {
        /// Skill name
        skill: String,
        /// Module content reference
        reference: String,
    },

    /// A single core module is larger than the whole budget
    #[error("Core module '{module}' of skill '{skill}' needs {required} units but the budget is {budget}")]
    BudgetTooSmall {
        /// Skill owning the core module
        skill: SkillId,
        /// Core module id
        module: String,
        /// Size of the core module
        required: usize,
        /// Budget supplied by the caller
        budget: usize,
    },

    /// Lookup of an unknown skill id
    #[error("Skill '{0}' not found")]
    NotFound(String),

    /// Generic I/O error while reading skill sources
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkillError {
    /// Configuration errors abort registry loading and are never per-artifact
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SkillError::InvalidDescriptor { .. }
                | SkillError::DuplicateSkill(_)
                | SkillError::UnresolvedModule { .. }
        )
    }

    pub(crate) fn invalid(origin: &str, reason: impl Into<String>) -> Self {
        SkillError::InvalidDescriptor {
            origin: origin.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SkillError>;
