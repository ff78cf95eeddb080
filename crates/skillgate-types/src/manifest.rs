use crate::SkillId;
use serde::{Deserialize, Serialize};

/// Whether a module is a skill's core or one of its detail modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Core,
    Detail,
}

/// A module that made it into the composed context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedModule {
    pub skill: SkillId,
    pub module: String,
    pub kind: ModuleKind,
    pub size: usize,
}

/// A detail module rejected because it would overflow the budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSkip {
    pub skill: SkillId,
    pub module: String,
    pub size: usize,
    /// Budget left when the module was considered
    pub remaining: usize,
}

/// A detail module dropped because a higher-priority module covers the same concern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSkip {
    pub skill: SkillId,
    pub module: String,
    pub concern: String,
    pub retained_skill: SkillId,
    pub retained_module: String,
}

/// A matched skill whose core no longer fit after higher-relevance cores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSkip {
    pub skill: SkillId,
    pub core: String,
    pub size: usize,
    pub remaining: usize,
}

/// Audit record of what a composed context contains and what was left out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub included: Vec<IncludedModule>,
    pub skipped_for_budget: Vec<BudgetSkip>,
    pub skipped_duplicate: Vec<DuplicateSkip>,
    pub skipped_skills: Vec<SkillSkip>,
    pub total_size: usize,
    pub budget: usize,
}

impl Manifest {
    /// True when no skill contributed anything
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    /// Distinct skills with at least one included module, in output order
    pub fn included_skills(&self) -> Vec<&SkillId> {
        let mut skills: Vec<&SkillId> = Vec::new();
        for entry in &self.included {
            if !skills.contains(&&entry.skill) {
                skills.push(&entry.skill);
            }
        }
        skills
    }

    /// Ids of included modules, in output order
    pub fn included_modules(&self) -> Vec<&str> {
        self.included.iter().map(|m| m.module.as_str()).collect()
    }
}

/// Final output of one review pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedContext {
    pub text: String,
    pub manifest: Manifest,
}

impl ComposedContext {
    /// Pretty JSON rendering of text and manifest
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
