//! Drives many fragments against many targets.
//!
//! Every fragment is prepared before any target is touched. Distinct
//! targets are then processed in parallel; fragments sharing a target are
//! applied one after another in priority order, each seeing the renames
//! committed by the ones before it.

use crate::config::WeaveOptions;
use crate::error::{Result, WeftError};
use crate::fragment::Fragment;
use crate::plan::MergePlan;
use crate::preprocess::PreProcessor;
use crate::registry::ClassRegistry;
use crate::remap::Remapper;
use crate::rename::TargetClass;
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A fragment that failed to prepare; none of its targets were attempted.
#[derive(Debug)]
pub struct PrepareFailure {
    /// Fragment internal name.
    pub fragment: String,
    /// Why.
    pub error: WeftError,
}

/// Outcome for one target.
#[derive(Debug)]
pub struct TargetOutcome {
    /// Target internal name.
    pub target: String,
    /// One plan per fragment in application order, or the first failure.
    pub result: Result<Vec<MergePlan>>,
}

/// Outcome of a full weave.
#[derive(Debug, Default)]
pub struct WeaveReport {
    /// Fragments rejected during prepare.
    pub prepare_failures: Vec<PrepareFailure>,
    /// Per-target outcomes, sorted by target name.
    pub targets: Vec<TargetOutcome>,
}

impl WeaveReport {
    /// True if every fragment prepared and every target succeeded.
    pub fn is_success(&self) -> bool {
        self.prepare_failures.is_empty() && self.targets.iter().all(|t| t.result.is_ok())
    }

    /// Number of failed targets.
    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|t| t.result.is_err()).count()
    }

    /// All successful plans.
    pub fn plans(&self) -> impl Iterator<Item = &MergePlan> {
        self.targets
            .iter()
            .filter_map(|t| t.result.as_ref().ok())
            .flatten()
    }
}

/// Owns the registry, remapper and target state for one run.
pub struct Weaver {
    registry: Arc<ClassRegistry>,
    remapper: Arc<dyn Remapper>,
    options: WeaveOptions,
    targets: DashMap<String, Arc<TargetClass>>,
}

impl std::fmt::Debug for Weaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Weaver")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("targets", &self.targets.len())
            .finish_non_exhaustive()
    }
}

impl Weaver {
    /// Creates a weaver.
    pub fn new(registry: Arc<ClassRegistry>, remapper: Arc<dyn Remapper>, options: WeaveOptions) -> Self {
        Self {
            registry,
            remapper,
            options,
            targets: DashMap::new(),
        }
    }

    /// The shared registry.
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// The resolved options.
    pub fn options(&self) -> &WeaveOptions {
        &self.options
    }

    fn processor(&self) -> PreProcessor<'_> {
        PreProcessor::new(&self.registry, self.remapper.as_ref(), &self.options)
    }

    /// The target state for `name`, resolving it on first use.
    pub fn target(&self, name: &str) -> Result<Arc<TargetClass>> {
        if let Some(target) = self.targets.get(name) {
            return Ok(Arc::clone(target.value()));
        }
        let info = self.registry.resolve(name)?;
        let target = self
            .targets
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(TargetClass::new(info)));
        Ok(Arc::clone(target.value()))
    }

    /// Prepares one fragment.
    pub fn prepare(&self, fragment: &mut Fragment) -> Result<()> {
        self.processor().prepare(fragment)
    }

    /// Applies a prepared fragment to one target.
    pub fn apply(&self, fragment: &Fragment, target: &str) -> Result<MergePlan> {
        let target = self.target(target)?;
        self.processor().create_context_for(fragment, &target)
    }

    /// Prepares every fragment, then applies each to its targets.
    ///
    /// A fragment that fails to prepare is reported and skipped. A failure
    /// while attaching aborts that target only.
    pub fn weave(&self, fragments: &mut [Fragment]) -> WeaveReport {
        let mut report = WeaveReport::default();
        let mut prepared = vec![true; fragments.len()];
        for (fragment, ok) in fragments.iter_mut().zip(prepared.iter_mut()) {
            if let Err(error) = self.prepare(fragment) {
                warn!(fragment = %fragment.name, "prepare failed: {error}");
                *ok = false;
                report.prepare_failures.push(PrepareFailure {
                    fragment: fragment.name.clone(),
                    error,
                });
            }
        }

        let mut by_target: BTreeMap<&str, Vec<&Fragment>> = BTreeMap::new();
        for (fragment, ok) in fragments.iter().zip(&prepared) {
            if !ok {
                continue;
            }
            for target in &fragment.targets {
                by_target.entry(target.as_str()).or_default().push(fragment);
            }
        }
        for group in by_target.values_mut() {
            group.sort_by_key(|f| f.priority);
        }

        debug!(targets = by_target.len(), "weaving");
        report.targets = by_target
            .into_par_iter()
            .map(|(target, group)| TargetOutcome {
                target: target.to_owned(),
                result: group.iter().map(|f| self.apply(f, target)).collect(),
            })
            .collect();
        for outcome in &report.targets {
            if let Err(error) = &outcome.result {
                warn!(target = %outcome.target, "target failed: {error}");
            }
        }
        report
    }
}
