//! SkillGate Types - Core types shared by the SkillGate engine and CLI
//!
//! This module defines the data model passed through one review pass:
//! the artifact under review, the size budget, skill identity and the
//! audit manifest that accompanies every composed context.

pub mod artifact;
pub mod manifest;

pub use artifact::{infer_language, Artifact};
pub use manifest::{
    BudgetSkip, ComposedContext, DuplicateSkip, IncludedModule, Manifest, ModuleKind, SkillSkip,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default maximum size of one assembled context
pub const DEFAULT_BUDGET: usize = 16_000;

// ============================================================================
// Skill Identity
// ============================================================================

/// Unique skill identity: `name@version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkillId {
    pub name: String,
    pub version: String,
}

impl SkillId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Error returned when a string is not of the form `name@version`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid skill id '{0}', expected name@version")]
pub struct ParseSkillIdError(pub String);

impl FromStr for SkillId {
    type Err = ParseSkillIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            _ => Err(ParseSkillIdError(s.to_string())),
        }
    }
}

impl Serialize for SkillId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SkillId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// Category of a trigger rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    /// Glob pattern over the artifact path
    Path,
    /// Literal or regex token over the artifact content
    Lexical,
    /// Structural marker token (decorators, annotations) over the content
    Annotation,
}

impl fmt::Display for TriggerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerCategory::Path => "path",
            TriggerCategory::Lexical => "lexical",
            TriggerCategory::Annotation => "annotation",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Budget
// ============================================================================

/// Maximum total size allowed for one assembled context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub max_size: usize,
}

impl Budget {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}

/// Unit in which module sizes are measured when not declared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Unicode scalar values
    #[default]
    Chars,
    /// Approximate tokens (1 token ≈ 4 chars)
    Tokens,
}

impl SizeUnit {
    /// Measure content in this unit
    pub fn measure(&self, content: &str) -> usize {
        let chars = content.chars().count();
        match self {
            SizeUnit::Chars => chars,
            SizeUnit::Tokens => chars.div_ceil(4),
        }
    }
}

impl FromStr for SizeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chars" | "characters" => Ok(SizeUnit::Chars),
            "tokens" => Ok(SizeUnit::Tokens),
            other => Err(format!("unknown size unit '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_id_roundtrip_display() {
        let id = SkillId::new("spring-review", "1.2.0");
        assert_eq!(id.to_string(), "spring-review@1.2.0");
        assert_eq!("spring-review@1.2.0".parse::<SkillId>().unwrap(), id);
    }

    #[test]
    fn test_skill_id_rejects_missing_version() {
        assert!("spring-review".parse::<SkillId>().is_err());
        assert!("spring-review@".parse::<SkillId>().is_err());
    }

    #[test]
    fn test_skill_id_serializes_as_string() {
        let id = SkillId::new("a", "1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a@1\"");
    }

    #[test]
    fn test_size_unit_measure() {
        assert_eq!(SizeUnit::Chars.measure("héllo"), 5);
        assert_eq!(SizeUnit::Tokens.measure("abcde"), 2);
        assert_eq!(SizeUnit::Tokens.measure(""), 0);
    }

    #[test]
    fn test_size_unit_from_str() {
        assert_eq!("Tokens".parse::<SizeUnit>().unwrap(), SizeUnit::Tokens);
        assert!("bytes".parse::<SizeUnit>().is_err());
    }
}
