//! SkillGate Engine
//!
//! Trigger-driven skill selection with progressive loading of detail modules
//! into a single size-bounded context.
//!
//! ## Features
//!
//! - Skill descriptors as `SKILL.md` files with YAML frontmatter
//! - Path glob, lexical and annotation triggers with relevance scoring
//! - Core modules always loaded, detail modules loaded on their own triggers
//! - Greedy budget packing with an auditable manifest
//! - Cross-skill deduplication by concern tag
//! - Shared descriptor and module-cost cache for parallel batches
//!
//! ## Architecture
//!
//! Phase 1 (Registry): Load and validate all descriptors once at startup
//! Phase 2 (Matching): Score every skill against the artifact
//! Phase 3 (Planning): Include cores, then triggered detail modules within budget
//! Phase 4 (Composition): Deduplicate by concern and assemble text plus manifest

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod cache;
pub mod composer;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod source;
pub mod trigger;

pub use cache::{Cache, CacheStats};
pub use composer::compose;
pub use descriptor::{ModuleDescriptor, SkillDescriptor};
pub use engine::Engine;
pub use error::{Result, SkillError};
pub use loader::{LoadPlan, Loader, PlanEntry};
pub use matcher::{match_skills, FiredTrigger, MatchResult};
pub use registry::Registry;
pub use source::{SkillDirectories, SkillSource};
pub use trigger::TokenSpec;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Engine, Registry, SkillDirectories, SkillError, SkillSource};
    pub use skillgate_types::{Artifact, Budget, ComposedContext, SizeUnit};
}
