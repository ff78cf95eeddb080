//! Descriptor and module-cost cache
//!
//! Read-through, write-once-per-key maps shared by concurrent pipelines.
//! Values are deterministic functions of their keys, so two writers racing
//! on a first population store the same value.

use dashmap::DashMap;
use skillgate_types::{SizeUnit, SkillId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::descriptor::SkillDescriptor;
use crate::error::Result;

/// Key of a memoized module cost
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CostKey {
    /// Owning skill
    pub skill: SkillId,
    /// Module id
    pub module: String,
    /// Hash of the module body
    pub content_hash: u64,
    /// Unit the cost is measured in
    pub unit: SizeUnit,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Parsed descriptors held
    pub descriptors: usize,
    /// Module costs held
    pub costs: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compute
    pub misses: u64,
}

/// Shared cache of parsed descriptors and module costs
#[derive(Debug, Default)]
pub struct Cache {
    descriptors: DashMap<(String, u64), Arc<SkillDescriptor>>,
    costs: DashMap<CostKey, usize>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Cache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed descriptor for `(origin, fingerprint)`, built on first use.
    ///
    /// Build failures are not cached.
    pub fn descriptor<F>(&self, origin: &str, fingerprint: u64, build: F) -> Result<Arc<SkillDescriptor>>
    where
        F: FnOnce() -> Result<SkillDescriptor>,
    {
        let key = (origin.to_string(), fingerprint);
        if let Some(cached) = self.descriptors.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(cached.value()));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let built = Arc::new(build()?);
        let stored = self.descriptors.entry(key).or_insert(built);
        Ok(Arc::clone(stored.value()))
    }

    /// Memoized module cost, computed on first use
    pub fn module_cost<F>(&self, key: CostKey, compute: F) -> usize
    where
        F: FnOnce() -> usize,
    {
        if let Some(cost) = self.costs.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *cost;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        *self.costs.entry(key).or_insert_with(compute)
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            descriptors: self.descriptors.len(),
            costs: self.costs.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.descriptors.clear();
        self.costs.clear();
    }
}
