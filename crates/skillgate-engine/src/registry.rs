//! Skills registry
//!
//! Descriptors live in an arena in registration order with an id index on
//! the side. The registry is immutable once loaded; reloading builds a new one.

use skillgate_types::SkillId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::descriptor::SkillDescriptor;
use crate::error::{Result, SkillError};
use crate::source::SkillSource;

/// Registry of validated skill descriptors
#[derive(Debug, Default)]
pub struct Registry {
    /// Descriptors in registration order
    skills: Vec<Arc<SkillDescriptor>>,
    /// Id → arena index
    index: HashMap<SkillId, usize>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse, validate and register every source. Any invalid source aborts the load.
    pub fn load<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = SkillSource>,
    {
        Self::load_with_cache(sources, &Cache::new())
    }

    /// Like [`Registry::load`], reusing descriptors already parsed into `cache`
    pub fn load_with_cache<I>(sources: I, cache: &Cache) -> Result<Self>
    where
        I: IntoIterator<Item = SkillSource>,
    {
        let mut registry = Self::new();
        for source in sources {
            let descriptor = cache.descriptor(source.origin(), source.fingerprint(), || {
                SkillDescriptor::from_source(&source)
            })?;
            registry.register(descriptor)?;
        }

        info!("Loaded {} skills", registry.len());
        Ok(registry)
    }

    /// Register already-built descriptors
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = SkillDescriptor>,
    {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(Arc::new(descriptor))?;
        }
        Ok(registry)
    }

    fn register(&mut self, descriptor: Arc<SkillDescriptor>) -> Result<()> {
        if self.index.contains_key(&descriptor.id) {
            return Err(SkillError::DuplicateSkill(descriptor.id.clone()));
        }

        debug!(
            "Registered skill {} from {} ({} modules)",
            descriptor.id,
            descriptor.origin,
            descriptor.modules.len()
        );
        self.index.insert(descriptor.id.clone(), self.skills.len());
        self.skills.push(descriptor);
        Ok(())
    }

    /// Get a skill by id
    pub fn lookup(&self, id: &SkillId) -> Result<&SkillDescriptor> {
        self.index
            .get(id)
            .map(|&i| self.skills[i].as_ref())
            .ok_or_else(|| SkillError::NotFound(id.to_string()))
    }

    /// Get a skill by its `name@version` string
    pub fn lookup_str(&self, id: &str) -> Result<&SkillDescriptor> {
        let id: SkillId = id.parse().map_err(|_| SkillError::NotFound(id.to_string()))?;
        self.lookup(&id)
    }

    /// All descriptors in registration order
    pub fn all(&self) -> impl Iterator<Item = &SkillDescriptor> + Clone + '_ {
        self.skills.iter().map(|s| s.as_ref())
    }

    /// Get number of skills
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// One line per skill in registration order:
    /// - name@version: Description of what this skill covers
    pub fn summary(&self) -> String {
        if self.skills.is_empty() {
            return "No skills available".to_string();
        }

        self.all()
            .map(SkillDescriptor::to_summary)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
