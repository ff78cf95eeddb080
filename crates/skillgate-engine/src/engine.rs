//! Review pipeline: match → plan → compose

use rayon::prelude::*;
use skillgate_types::{Artifact, Budget, ComposedContext, SizeUnit};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::composer::compose;
use crate::error::Result;
use crate::loader::{LoadPlan, Loader};
use crate::matcher::{match_skills, MatchResult};
use crate::registry::Registry;
use crate::source::SkillSource;

/// Shared, read-only review engine. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    cache: Arc<Cache>,
    unit: SizeUnit,
}

impl Engine {
    /// Create an engine over a loaded registry with a fresh cache
    pub fn new(registry: Registry) -> Self {
        Self::with_cache(registry, Arc::new(Cache::new()))
    }

    /// Create an engine sharing an existing cache
    pub fn with_cache(registry: Registry, cache: Arc<Cache>) -> Self {
        Self {
            registry: Arc::new(registry),
            cache,
            unit: SizeUnit::default(),
        }
    }

    /// Load sources into a new registry and wrap it
    pub fn from_sources<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = SkillSource>,
    {
        let cache = Arc::new(Cache::new());
        let registry = Registry::load_with_cache(sources, &cache)?;
        Ok(Self::with_cache(registry, cache))
    }

    /// Measure undeclared module sizes in `unit`
    pub fn with_size_unit(mut self, unit: SizeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Explicit re-init: a new engine over freshly loaded sources, same cache and unit
    pub fn reload<I>(&self, sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = SkillSource>,
    {
        let registry = Registry::load_with_cache(sources, &self.cache)?;
        info!("Reloaded registry with {} skills", registry.len());
        Ok(Self {
            registry: Arc::new(registry),
            cache: Arc::clone(&self.cache),
            unit: self.unit,
        })
    }

    /// The loaded registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The shared cache
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Unit used for undeclared module sizes
    pub fn size_unit(&self) -> SizeUnit {
        self.unit
    }

    /// Match an artifact against every registered skill
    pub fn match_artifact(&self, artifact: &Artifact) -> Vec<MatchResult> {
        match_skills(artifact, self.registry.all())
    }

    /// Plan module inclusion for already computed matches
    pub fn plan(&self, artifact: &Artifact, matches: &[MatchResult], budget: Budget) -> Result<LoadPlan> {
        Loader::new(&self.registry, &self.cache, self.unit).plan(artifact, matches, budget)
    }

    /// Run the full pipeline for one artifact
    pub fn review(&self, artifact: &Artifact, budget: Budget) -> Result<ComposedContext> {
        let matches = self.match_artifact(artifact);
        let plan = self.plan(artifact, &matches, budget)?;
        let composed = compose(plan);

        debug!(
            "Reviewed {} ({}): {} module(s), {}/{} used, {} skipped for budget, {} duplicate",
            artifact.path(),
            artifact.language(),
            composed.manifest.included.len(),
            composed.manifest.total_size,
            composed.manifest.budget,
            composed.manifest.skipped_for_budget.len(),
            composed.manifest.skipped_duplicate.len()
        );
        Ok(composed)
    }

    /// Run independent pipelines in parallel; results are in input order
    pub fn review_batch(&self, artifacts: &[Artifact], budget: Budget) -> Vec<Result<ComposedContext>> {
        info!("Reviewing batch of {} artifact(s)", artifacts.len());
        artifacts
            .par_iter()
            .map(|artifact| self.review(artifact, budget))
            .collect()
    }
}
