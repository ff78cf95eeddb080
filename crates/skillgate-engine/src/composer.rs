//! Context composer
//!
//! Concatenates a load plan into the final context and produces the manifest.
//! Detail modules from different skills that cover the same concern with
//! mostly the same triggers are collapsed onto the higher-priority one.

use skillgate_types::{ComposedContext, DuplicateSkip, IncludedModule, Manifest, ModuleKind};
use std::collections::HashSet;
use tracing::debug;

use crate::loader::{LoadPlan, PlanEntry};
use crate::trigger::TokenSpec;

/// Overlap above which two same-concern modules count as duplicates
pub const DUPLICATE_OVERLAP: f64 = 0.5;

/// Compose a plan into text plus manifest. Plan order is priority order.
pub fn compose(plan: LoadPlan) -> ComposedContext {
    let mut retained: Vec<&PlanEntry> = Vec::with_capacity(plan.entries.len());
    let mut skipped_duplicate = Vec::new();

    for entry in &plan.entries {
        if entry.kind == ModuleKind::Detail {
            if let Some((kept, concern)) = find_duplicate(entry, &retained) {
                debug!(
                    "Module {}/{} duplicates {}/{} on concern '{}'",
                    entry.skill, entry.module, kept.skill, kept.module, concern
                );
                skipped_duplicate.push(DuplicateSkip {
                    skill: entry.skill.clone(),
                    module: entry.module.clone(),
                    concern: concern.to_string(),
                    retained_skill: kept.skill.clone(),
                    retained_module: kept.module.clone(),
                });
                continue;
            }
        }
        retained.push(entry);
    }

    let mut text = String::with_capacity(retained.iter().map(|e| e.content.len() + 64).sum());
    for (i, entry) in retained.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(&format!("<!-- skill: {} module: {} -->\n", entry.skill, entry.module));
        text.push_str(entry.content.trim_end());
        text.push('\n');
    }

    let included: Vec<IncludedModule> = retained
        .iter()
        .map(|e| IncludedModule {
            skill: e.skill.clone(),
            module: e.module.clone(),
            kind: e.kind,
            size: e.size,
        })
        .collect();
    let total_size = included.iter().map(|m| m.size).sum();

    ComposedContext {
        text,
        manifest: Manifest {
            included,
            skipped_for_budget: plan.skipped_for_budget,
            skipped_duplicate,
            skipped_skills: plan.skipped_skills,
            total_size,
            budget: plan.budget,
        },
    }
}

/// First retained detail module of another skill sharing a concern and most triggers
fn find_duplicate<'a, 'e>(
    entry: &'e PlanEntry,
    retained: &[&'a PlanEntry],
) -> Option<(&'a PlanEntry, &'e str)> {
    retained
        .iter()
        .filter(|kept| kept.kind == ModuleKind::Detail && kept.skill != entry.skill)
        .find_map(|kept| {
            let concern = entry
                .concerns
                .iter()
                .find(|c| kept.concerns.contains(*c))?;
            (token_overlap(&entry.tokens, &kept.tokens) > DUPLICATE_OVERLAP)
                .then_some((*kept, concern.as_str()))
        })
}

/// |A ∩ B| / min(|A|, |B|); zero when either set is empty
pub fn token_overlap(a: &[TokenSpec], b: &[TokenSpec]) -> f64 {
    let a: HashSet<&TokenSpec> = a.iter().collect();
    let b: HashSet<&TokenSpec> = b.iter().collect();
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / smaller as f64
}
