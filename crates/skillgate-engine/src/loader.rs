//! Progressive loader
//!
//! Turns match results into a load plan: every matched skill's core first,
//! then detail modules whose own tokens fire, greedily by priority while
//! the budget allows.

use skillgate_types::{Artifact, Budget, BudgetSkip, ModuleKind, SizeUnit, SkillId, SkillSkip};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

use crate::cache::{Cache, CostKey};
use crate::descriptor::{ModuleDescriptor, SkillDescriptor};
use crate::error::{Result, SkillError};
use crate::matcher::{count_token_hits, MatchResult};
use crate::registry::Registry;
use crate::trigger::TokenSpec;

/// One module chosen for inclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Owning skill
    pub skill: SkillId,
    /// Module id
    pub module: String,
    /// Core or detail
    pub kind: ModuleKind,
    /// Module body
    pub content: Arc<str>,
    /// Size charged against the budget
    pub size: usize,
    /// Concern tags (detail modules only)
    pub concerns: Vec<String>,
    /// Module trigger tokens (detail modules only)
    pub tokens: Vec<TokenSpec>,
}

/// Ordered modules to include plus what the budget forced out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPlan {
    /// Entries in inclusion order
    pub entries: Vec<PlanEntry>,
    /// Sum of entry sizes
    pub total_size: usize,
    /// Budget ceiling
    pub budget: usize,
    /// Detail modules rejected for budget
    pub skipped_for_budget: Vec<BudgetSkip>,
    /// Matched skills whose core no longer fit
    pub skipped_skills: Vec<SkillSkip>,
}

impl LoadPlan {
    /// Budget still available
    pub fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.total_size)
    }

    fn push(&mut self, entry: PlanEntry) {
        self.total_size += entry.size;
        self.entries.push(entry);
    }
}

/// A detail module whose tokens fired, with its ordering keys
struct Candidate<'a> {
    skill: &'a SkillDescriptor,
    module: &'a ModuleDescriptor,
    score: u32,
    hits: usize,
    skill_index: usize,
    module_index: usize,
}

/// Builds load plans against one registry
pub struct Loader<'a> {
    registry: &'a Registry,
    cache: &'a Cache,
    unit: SizeUnit,
}

impl<'a> Loader<'a> {
    /// Create a loader measuring undeclared sizes in `unit`
    pub fn new(registry: &'a Registry, cache: &'a Cache, unit: SizeUnit) -> Self {
        Self {
            registry,
            cache,
            unit,
        }
    }

    /// Plan which modules to include for `artifact`.
    ///
    /// `matches` is expected in matcher order (score descending, stable).
    /// Fails with [`SkillError::BudgetTooSmall`] when one core alone exceeds
    /// the budget; no plan is produced in that case.
    pub fn plan(&self, artifact: &Artifact, matches: &[MatchResult], budget: Budget) -> Result<LoadPlan> {
        let max = budget.max_size();
        let mut plan = LoadPlan {
            budget: max,
            ..LoadPlan::default()
        };

        let mut accepted: Vec<(&MatchResult, &SkillDescriptor)> = Vec::with_capacity(matches.len());
        for matched in matches {
            let skill = self.registry.lookup(&matched.skill)?;
            let size = self.module_size(skill, &skill.core);

            if size > max {
                return Err(SkillError::BudgetTooSmall {
                    skill: skill.id.clone(),
                    module: skill.core.id.clone(),
                    required: size,
                    budget: max,
                });
            }

            if size > plan.remaining() {
                debug!(
                    "Skipping skill {}: core needs {} with {} remaining",
                    skill.id,
                    size,
                    plan.remaining()
                );
                plan.skipped_skills.push(SkillSkip {
                    skill: skill.id.clone(),
                    core: skill.core.id.clone(),
                    size,
                    remaining: plan.remaining(),
                });
                continue;
            }

            plan.push(PlanEntry {
                skill: skill.id.clone(),
                module: skill.core.id.clone(),
                kind: ModuleKind::Core,
                content: Arc::clone(&skill.core.content),
                size,
                concerns: Vec::new(),
                tokens: Vec::new(),
            });
            accepted.push((matched, skill));
        }

        let mut candidates: Vec<Candidate<'_>> = Vec::new();
        for &(matched, skill) in &accepted {
            for (module_index, module) in skill.modules.iter().enumerate() {
                let hits = count_token_hits(&module.triggers, artifact.content());
                if hits > 0 {
                    candidates.push(Candidate {
                        skill,
                        module,
                        score: matched.score,
                        hits,
                        skill_index: matched.index,
                        module_index,
                    });
                }
            }
        }
        candidates.sort_by_key(|c| (Reverse(c.score), Reverse(c.hits), c.skill_index, c.module_index));

        for candidate in candidates {
            let size = self.module_size(candidate.skill, candidate.module);
            if size > plan.remaining() {
                debug!(
                    "Skipping module {}/{}: needs {} with {} remaining",
                    candidate.skill.id,
                    candidate.module.id,
                    size,
                    plan.remaining()
                );
                plan.skipped_for_budget.push(BudgetSkip {
                    skill: candidate.skill.id.clone(),
                    module: candidate.module.id.clone(),
                    size,
                    remaining: plan.remaining(),
                });
                continue;
            }

            plan.push(PlanEntry {
                skill: candidate.skill.id.clone(),
                module: candidate.module.id.clone(),
                kind: ModuleKind::Detail,
                content: Arc::clone(&candidate.module.content),
                size,
                concerns: candidate.module.concerns.clone(),
                tokens: candidate.module.token_specs(),
            });
        }

        debug!(
            "Planned {} module(s) for {}: {}/{} used",
            plan.entries.len(),
            artifact.path(),
            plan.total_size,
            max
        );
        Ok(plan)
    }

    /// Declared size, else the measured size memoized in the cache
    pub fn module_size(&self, skill: &SkillDescriptor, module: &ModuleDescriptor) -> usize {
        if let Some(size) = module.declared_size {
            return size;
        }

        let key = CostKey {
            skill: skill.id.clone(),
            module: module.id.clone(),
            content_hash: module.content_hash,
            unit: self.unit,
        };
        self.cache
            .module_cost(key, || self.unit.measure(&module.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::match_skills;
    use crate::source::SkillSource;

    const SKILL_A: &str = "---
name: skill-a
description: special files
triggers:
  paths: ['**/*.special']
core: { id: A-core, size: 100 }
modules:
  - { id: A-detail, triggers: [lock], size: 50 }
  - { id: A-small, triggers: [here], size: 10 }
  - { id: A-unused, triggers: [absent], size: 1 }
---
Core A
";

    fn registry() -> Registry {
        Registry::load(vec![SkillSource::inline("a", SKILL_A)
            .with_body("A-detail.md", "detail")
            .with_body("A-small.md", "small")
            .with_body("A-unused.md", "unused")])
        .unwrap()
    }

    fn plan(registry: &Registry, artifact: &Artifact, budget: usize) -> Result<LoadPlan> {
        let cache = Cache::new();
        let matches = match_skills(artifact, registry.all());
        Loader::new(registry, &cache, SizeUnit::Chars).plan(artifact, &matches, Budget::new(budget))
    }

    fn modules(plan: &LoadPlan) -> Vec<&str> {
        plan.entries.iter().map(|e| e.module.as_str()).collect()
    }

    #[test]
    fn test_core_first_then_fitting_details() {
        let registry = registry();
        let artifact = Artifact::new("x/y.special", "uses lock here");

        let plan = plan(&registry, &artifact, 1000).unwrap();
        assert_eq!(modules(&plan), vec!["A-core", "A-detail", "A-small"]);
        assert_eq!(plan.total_size, 160);
        assert_eq!(plan.entries[0].kind, ModuleKind::Core);
    }

    #[test]
    fn test_overflowing_module_skipped_smaller_still_fits() {
        let registry = registry();
        let artifact = Artifact::new("x/y.special", "uses lock here");

        let plan = plan(&registry, &artifact, 120).unwrap();
        assert_eq!(modules(&plan), vec!["A-core", "A-small"]);
        assert_eq!(plan.total_size, 110);
        assert_eq!(plan.skipped_for_budget.len(), 1);
        assert_eq!(plan.skipped_for_budget[0].module, "A-detail");
        assert_eq!(plan.skipped_for_budget[0].remaining, 20);
    }

    #[test]
    fn test_core_larger_than_budget_fails() {
        let registry = registry();
        let artifact = Artifact::new("x/y.special", "");

        let err = plan(&registry, &artifact, 99).unwrap_err();
        assert!(matches!(err, SkillError::BudgetTooSmall { required: 100, budget: 99, .. }));
    }

    #[test]
    fn test_huge_declared_size_skipped_without_overflow() {
        let doc = "---
name: huge
description: oversized module
triggers: { lexical: [x] }
core: { size: 10 }
modules:
  - { id: big, triggers: [x], size: 18446744073709551615 }
  - { id: small, triggers: [x], size: 5 }
---
Core
";
        let registry = Registry::load(vec![SkillSource::inline("huge", doc)
            .with_body("big.md", "big")
            .with_body("small.md", "small")])
        .unwrap();
        let artifact = Artifact::new("a.txt", "x");

        let plan = plan(&registry, &artifact, 100).unwrap();
        assert_eq!(modules(&plan), vec!["huge-core", "small"]);
        assert_eq!(plan.total_size, 15);
        assert_eq!(plan.skipped_for_budget.len(), 1);
        assert_eq!(plan.skipped_for_budget[0].module, "big");
        assert_eq!(plan.skipped_for_budget[0].size, usize::MAX);
        assert_eq!(plan.skipped_for_budget[0].remaining, 90);
    }

    #[test]
    fn test_measured_size_uses_unit() {
        let doc = "---\nname: m\ndescription: d\ntriggers: { lexical: [x] }\n---\n12345678\n";
        let registry = Registry::load(vec![SkillSource::inline("m", doc)]).unwrap();
        let skill = registry.lookup_str("m@0.0.0").unwrap();
        let cache = Cache::new();

        assert_eq!(Loader::new(&registry, &cache, SizeUnit::Chars).module_size(skill, &skill.core), 8);
        assert_eq!(Loader::new(&registry, &cache, SizeUnit::Tokens).module_size(skill, &skill.core), 2);
        assert_eq!(cache.stats().costs, 2);
    }
}
