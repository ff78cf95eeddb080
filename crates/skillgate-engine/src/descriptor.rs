//! Skill descriptor definition and parsing
//!
//! Each skill is a `SKILL.md` document whose YAML frontmatter declares the
//! skill identity, its triggers, its core module and its detail modules.
//! The document body is the core module content unless `core.path` says
//! otherwise.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use skillgate_types::SkillId;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use tracing::warn;

use crate::error::{Result, SkillError};
use crate::source::{is_safe_reference, SkillSource};
use crate::trigger::{PathTrigger, Token, TokenSpec, TriggerSet};

/// Maximum recommended name length
const MAX_NAME_LENGTH: usize = 64;
/// Maximum recommended description length
const MAX_DESCRIPTION_LENGTH: usize = 1024;
/// Version assumed when the frontmatter has none
const DEFAULT_VERSION: &str = "0.0.0";

// ============================================================================
// Frontmatter
// ============================================================================

/// Skill frontmatter as written in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct SkillFrontmatter {
    /// Skill name (lowercase letters, numbers and hyphens)
    pub name: String,
    /// Skill version
    #[serde(default = "default_version", deserialize_with = "version_string")]
    pub version: String,
    /// What the skill covers and when it applies
    pub description: String,
    /// Skill-level triggers
    #[serde(default)]
    pub triggers: TriggerSpec,
    /// Core module settings
    #[serde(default)]
    pub core: CoreSpec,
    /// Detail modules in registration order
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Accept `version: 1` and `version: 1.2` as well as quoted strings
fn version_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "version must be a string or number, got {:?}",
            other
        ))),
    }
}

/// Skill-level trigger rules as written in YAML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerSpec {
    /// Glob patterns over the artifact path
    #[serde(default)]
    pub paths: Vec<String>,
    /// Lexical tokens
    #[serde(default)]
    pub lexical: Vec<TokenSpec>,
    /// Annotation tokens
    #[serde(default)]
    pub annotations: Vec<TokenSpec>,
    /// Case-insensitive matching for every trigger of the skill
    #[serde(default)]
    pub ignore_case: bool,
}

/// Core module settings as written in YAML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreSpec {
    /// Module id, defaults to `<name>-core`
    pub id: Option<String>,
    /// Content file, defaults to the document body
    pub path: Option<String>,
    /// Declared size, measured when absent
    pub size: Option<usize>,
}

/// Detail module as written in YAML
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSpec {
    /// Module id, unique within the skill
    pub id: String,
    /// Content file, defaults to `<id>.md`
    pub path: Option<String>,
    /// Tokens that pull this module in
    #[serde(default)]
    pub triggers: Vec<TokenSpec>,
    /// Declared size, measured when absent
    pub size: Option<usize>,
    /// Concern tags used for cross-skill deduplication
    #[serde(default)]
    pub concerns: Vec<String>,
}

impl ModuleSpec {
    fn reference(&self) -> String {
        self.path.clone().unwrap_or_else(|| format!("{}.md", self.id))
    }
}

impl SkillFrontmatter {
    /// Every module file this document refers to
    pub fn references(&self) -> Vec<String> {
        let mut refs: Vec<String> = self.core.path.iter().cloned().collect();
        refs.extend(self.modules.iter().map(ModuleSpec::reference));
        refs
    }
}

/// Split a skill document into frontmatter and body
pub fn parse_skill_document(content: &str) -> std::result::Result<(SkillFrontmatter, String), String> {
    static FRONTMATTER: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    let frontmatter_re = FRONTMATTER
        .get_or_init(|| Regex::new(r"^---[ \t]*\r?\n([\s\S]*?)\r?\n---[ \t]*(?:\r?\n([\s\S]*))?$"))
        .as_ref()
        .map_err(|e| format!("Failed to compile regex: {}", e))?;

    let captures = frontmatter_re
        .captures(content)
        .ok_or_else(|| "No valid YAML frontmatter found".to_string())?;

    let yaml_str = captures
        .get(1)
        .ok_or_else(|| "Failed to extract frontmatter".to_string())?
        .as_str();

    let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");

    let frontmatter: SkillFrontmatter = serde_yaml::from_str(yaml_str)
        .map_err(|e| format!("Failed to parse YAML frontmatter: {}", e))?;

    Ok((frontmatter, body.to_string()))
}

// ============================================================================
// Compiled descriptors
// ============================================================================

/// A loaded module with its content
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Module id, unique within the skill
    pub id: String,
    /// Tokens that pull this module in (empty for core modules)
    pub triggers: Vec<Token>,
    /// Declared size, if any
    pub declared_size: Option<usize>,
    /// Concern tags
    pub concerns: Vec<String>,
    /// Module body
    pub content: Arc<str>,
    /// Hash of the body, part of the cost cache key
    pub content_hash: u64,
}

impl ModuleDescriptor {
    fn new(
        id: String,
        triggers: Vec<Token>,
        declared_size: Option<usize>,
        concerns: Vec<String>,
        content: &str,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self {
            id,
            triggers,
            declared_size,
            concerns,
            content: Arc::from(content),
            content_hash: hasher.finish(),
        }
    }

    /// Trigger tokens as written
    pub fn token_specs(&self) -> Vec<TokenSpec> {
        self.triggers.iter().map(|t| t.spec().clone()).collect()
    }
}

/// A validated skill descriptor, read-only after load
#[derive(Debug, Clone)]
pub struct SkillDescriptor {
    /// Identity: name and version
    pub id: SkillId,
    /// Human-readable description
    pub description: String,
    /// Source the descriptor was loaded from
    pub origin: String,
    /// Skill-level triggers
    pub triggers: TriggerSet,
    /// Always included on match
    pub core: ModuleDescriptor,
    /// Optional detail modules in registration order
    pub modules: Vec<ModuleDescriptor>,
}

impl SkillDescriptor {
    /// Parse and validate a descriptor from its source
    pub fn from_source(source: &SkillSource) -> Result<Self> {
        let origin = source.origin();
        let (frontmatter, body) =
            parse_skill_document(source.document()).map_err(|e| SkillError::invalid(origin, e))?;

        validate_metadata(&frontmatter).map_err(|e| SkillError::invalid(origin, e))?;

        let ignore_case = frontmatter.triggers.ignore_case;
        let triggers = compile_triggers(&frontmatter.triggers).map_err(|e| SkillError::invalid(origin, e))?;
        if triggers.is_empty() {
            return Err(SkillError::invalid(
                origin,
                format!("skill '{}' declares no triggers", frontmatter.name),
            ));
        }

        let core_id = frontmatter
            .core
            .id
            .clone()
            .unwrap_or_else(|| format!("{}-core", frontmatter.name));
        let core_content = match &frontmatter.core.path {
            Some(reference) => resolve_body(source, &frontmatter.name, reference)?,
            None => body.trim().to_string(),
        };
        if core_content.trim().is_empty() {
            return Err(SkillError::invalid(
                origin,
                format!("core module '{}' has no content", core_id),
            ));
        }
        let core = ModuleDescriptor::new(
            core_id.clone(),
            Vec::new(),
            frontmatter.core.size,
            Vec::new(),
            &core_content,
        );

        let mut seen: HashSet<&str> = HashSet::from([core_id.as_str()]);
        let mut modules = Vec::with_capacity(frontmatter.modules.len());
        for spec in &frontmatter.modules {
            if spec.id.trim().is_empty() {
                return Err(SkillError::invalid(origin, "module id cannot be empty"));
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(SkillError::invalid(
                    origin,
                    format!("duplicate module id '{}'", spec.id),
                ));
            }
            if spec.triggers.is_empty() {
                return Err(SkillError::invalid(
                    origin,
                    format!("module '{}' declares no triggers", spec.id),
                ));
            }

            let tokens = compile_tokens(&spec.triggers, ignore_case)
                .map_err(|e| SkillError::invalid(origin, format!("module '{}': {}", spec.id, e)))?;
            let content = resolve_body(source, &frontmatter.name, &spec.reference())?;

            modules.push(ModuleDescriptor::new(
                spec.id.clone(),
                tokens,
                spec.size,
                spec.concerns.clone(),
                &content,
            ));
        }

        Ok(Self {
            id: SkillId::new(frontmatter.name, frontmatter.version),
            description: frontmatter.description,
            origin: origin.to_string(),
            triggers,
            core,
            modules,
        })
    }

    /// Look up a detail module by id
    pub fn module(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Concise summary line: "- {name}@{version}: {description}"
    pub fn to_summary(&self) -> String {
        format!("- {}: {}", self.id, self.description)
    }
}

fn resolve_body(source: &SkillSource, skill: &str, reference: &str) -> Result<String> {
    if !is_safe_reference(reference) {
        return Err(SkillError::invalid(
            source.origin(),
            format!("module reference '{}' escapes the skill directory", reference),
        ));
    }

    source
        .body(reference)
        .map(|body| body.trim().to_string())
        .ok_or_else(|| SkillError::UnresolvedModule {
            skill: skill.to_string(),
            reference: reference.to_string(),
        })
}

fn compile_triggers(spec: &TriggerSpec) -> std::result::Result<TriggerSet, String> {
    let paths = spec
        .paths
        .iter()
        .map(|p| PathTrigger::compile(p, spec.ignore_case))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(TriggerSet {
        paths,
        lexical: compile_tokens(&spec.lexical, spec.ignore_case)?,
        annotations: compile_tokens(&spec.annotations, spec.ignore_case)?,
    })
}

fn compile_tokens(specs: &[TokenSpec], ignore_case: bool) -> std::result::Result<Vec<Token>, String> {
    specs
        .iter()
        .map(|s| Token::compile(s.clone(), ignore_case))
        .collect()
}

/// Validate skill identity fields
fn validate_metadata(metadata: &SkillFrontmatter) -> std::result::Result<(), String> {
    if metadata.name.is_empty() {
        return Err("Skill name cannot be empty".to_string());
    }

    if metadata.name.len() > MAX_NAME_LENGTH {
        warn!(
            "Skill name '{}' exceeds {} characters (was {})",
            metadata.name,
            MAX_NAME_LENGTH,
            metadata.name.len()
        );
    }

    // Name should be lowercase letters, numbers, and hyphens only
    let valid_name = metadata
        .name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_name {
        return Err(format!(
            "Skill name '{}' must contain only lowercase letters, numbers, and hyphens",
            metadata.name
        ));
    }

    if metadata.version.trim().is_empty() || metadata.version.contains(char::is_whitespace) {
        return Err(format!("Skill '{}' has an invalid version", metadata.name));
    }

    if metadata.description.trim().is_empty() {
        return Err("Skill description cannot be empty".to_string());
    }

    if metadata.description.len() > MAX_DESCRIPTION_LENGTH {
        warn!(
            "Skill '{}' description exceeds {} characters (was {})",
            metadata.name,
            MAX_DESCRIPTION_LENGTH,
            metadata.description.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPRING: &str = r#"---
name: spring-review
version: 1.2.0
description: Reviews Spring services. Use for Java service classes.
triggers:
  paths: ["**/*Service.java"]
  lexical: ["@Transactional", { regex: "synchronized\\s*\\(" }]
  annotations: ["@Service"]
core:
  id: spring-core
modules:
  - id: transactions
    path: modules/transactions.md
    triggers: ["@Transactional"]
    size: 800
    concerns: [transactions]
  - id: locking
    triggers: [synchronized, ReentrantLock]
---

# Spring Review

Check bean scopes.
"#;

    fn spring_source() -> SkillSource {
        SkillSource::inline("spring", SPRING)
            .with_body("modules/transactions.md", "Transaction guidance")
            .with_body("locking.md", "Locking guidance")
    }

    #[test]
    fn test_parse_skill_document() {
        let (frontmatter, body) = parse_skill_document(SPRING).unwrap();
        assert_eq!(frontmatter.name, "spring-review");
        assert_eq!(frontmatter.version, "1.2.0");
        assert_eq!(frontmatter.triggers.lexical.len(), 2);
        assert_eq!(frontmatter.modules[1].reference(), "locking.md");
        assert!(body.contains("# Spring Review"));
    }

    #[test]
    fn test_parse_without_body() {
        let doc = "---\nname: a\ndescription: b\n---";
        let (frontmatter, body) = parse_skill_document(doc).unwrap();
        assert_eq!(frontmatter.version, "0.0.0");
        assert!(body.is_empty());
    }

    #[test]
    fn test_from_source_builds_descriptor() {
        let descriptor = SkillDescriptor::from_source(&spring_source()).unwrap();
        assert_eq!(descriptor.id.to_string(), "spring-review@1.2.0");
        assert_eq!(descriptor.core.id, "spring-core");
        assert!(descriptor.core.content.starts_with("# Spring Review"));
        assert_eq!(descriptor.modules.len(), 2);
        assert_eq!(descriptor.modules[0].declared_size, Some(800));
        assert_eq!(descriptor.modules[0].concerns, vec!["transactions"]);
        assert_eq!(&*descriptor.module("locking").unwrap().content, "Locking guidance");
    }

    #[test]
    fn test_module_bodies_trimmed_at_load() {
        let source = SkillSource::inline("spring", SPRING)
            .with_body("modules/transactions.md", "\nTransaction guidance\n\n  ")
            .with_body("locking.md", "Locking guidance\n");
        let descriptor = SkillDescriptor::from_source(&source).unwrap();

        assert_eq!(&*descriptor.modules[0].content, "Transaction guidance");
        assert_eq!(&*descriptor.module("locking").unwrap().content, "Locking guidance");
    }

    #[test]
    fn test_missing_body_is_unresolved() {
        let source = SkillSource::inline("spring", SPRING).with_body("locking.md", "x");
        let err = SkillDescriptor::from_source(&source).unwrap_err();
        assert!(matches!(err, SkillError::UnresolvedModule { ref reference, .. } if reference == "modules/transactions.md"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_no_triggers_rejected() {
        let doc = "---\nname: empty\ndescription: nothing\n---\nbody\n";
        let err = SkillDescriptor::from_source(&SkillSource::inline("empty", doc)).unwrap_err();
        assert!(err.to_string().contains("declares no triggers"));
    }

    #[test]
    fn test_duplicate_module_id_rejected() {
        let doc = "---
name: dup
description: d
triggers: { lexical: [x] }
modules:
  - { id: a, triggers: [y] }
  - { id: a, triggers: [z] }
---
body
";
        let source = SkillSource::inline("dup", doc).with_body("a.md", "a");
        let err = SkillDescriptor::from_source(&source).unwrap_err();
        assert!(err.to_string().contains("duplicate module id 'a'"));
    }

    #[test]
    fn test_module_id_clashing_with_core_rejected() {
        let doc = "---
name: clash
description: d
triggers: { lexical: [x] }
modules:
  - { id: clash-core, triggers: [y] }
---
body
";
        let source = SkillSource::inline("clash", doc).with_body("clash-core.md", "a");
        assert!(SkillDescriptor::from_source(&source).is_err());
    }

    #[test]
    fn test_bad_regex_rejected() {
        let doc = "---\nname: bad\ndescription: d\ntriggers:\n  lexical: [{ regex: '(' }]\n---\nbody\n";
        let err = SkillDescriptor::from_source(&SkillSource::inline("bad", doc)).unwrap_err();
        assert!(matches!(err, SkillError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_unsafe_reference_rejected() {
        let doc = "---
name: escape
description: d
triggers: { lexical: [x] }
core: { path: ../secret.md }
---
";
        let source = SkillSource::inline("escape", doc).with_body("../secret.md", "s");
        let err = SkillDescriptor::from_source(&source).unwrap_err();
        assert!(err.to_string().contains("escapes the skill directory"));
    }

    #[test]
    fn test_numeric_version_accepted() {
        let doc = "---\nname: a\nversion: 2\ndescription: d\n---\n";
        let (frontmatter, _) = parse_skill_document(doc).unwrap();
        assert_eq!(frontmatter.version, "2");
    }

    #[test]
    fn test_validate_metadata() {
        let (mut frontmatter, _) = parse_skill_document(SPRING).unwrap();
        assert!(validate_metadata(&frontmatter).is_ok());

        frontmatter.name = "Invalid_Name".to_string();
        assert!(validate_metadata(&frontmatter).is_err());
    }
}
