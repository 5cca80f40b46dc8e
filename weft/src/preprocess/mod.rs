//! The fragment pre-processor.
//!
//! Each fragment moves through four phases:
//!
//! 1. **prepare** (once, target-independent): structural validation, then
//!    shadow-prefix stripping and soft-interface renames published through
//!    the registry.
//! 2. **conform** (per target): injector target references are resolved
//!    against the target.
//! 3. **attach** (per target, once per working copy): every member is
//!    classified against the target and renamed, recorded or dropped.
//! 4. **transform** (end of attach): member references inside retained
//!    method bodies are rewritten to their final names.
//!
//! [`PreProcessor::create_context_for`] runs 2-4 on a fresh working copy of
//! a prepared fragment, so one fragment can be applied to many targets.

mod attach;
mod conform;
mod prepare;
mod transform;

use crate::config::WeaveOptions;
use crate::context::TargetContext;
use crate::error::{Result, Site, WeftError};
use crate::fragment::{Fragment, Phase};
use crate::plan::MergePlan;
use crate::registry::ClassRegistry;
use crate::remap::Remapper;
use crate::rename::TargetClass;
use tracing::debug;

/// Runs the fragment phases against a shared registry.
pub struct PreProcessor<'a> {
    registry: &'a ClassRegistry,
    remapper: &'a dyn Remapper,
    options: &'a WeaveOptions,
}

impl std::fmt::Debug for PreProcessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreProcessor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> PreProcessor<'a> {
    /// Creates a pre-processor.
    pub fn new(
        registry: &'a ClassRegistry,
        remapper: &'a dyn Remapper,
        options: &'a WeaveOptions,
    ) -> Self {
        Self {
            registry,
            remapper,
            options,
        }
    }

    /// Merges a prepared fragment into `target`, producing the plan.
    ///
    /// Works on a private copy of the fragment; on failure nothing is
    /// committed to the target.
    pub fn create_context_for(&self, fragment: &Fragment, target: &TargetClass) -> Result<MergePlan> {
        let mut working = fragment.instantiate()?;
        debug!(fragment = %fragment.name, target = %target.name(), "attaching");
        self.conform(&mut working, target)?;
        let mut ctx = TargetContext::new(self.registry, self.remapper, &fragment.name, target);
        self.attach(&mut working, &mut ctx)?;
        ctx.finish(working)
    }

    fn require_prepared(fragment: &Fragment, action: &str) -> Result<()> {
        match fragment.phase {
            Phase::Prepared => Ok(()),
            Phase::Unprepared => Err(WeftError::IllegalState {
                fragment: fragment.name.clone(),
                message: format!("cannot {action} an unprepared fragment"),
            }),
            Phase::Attached => Err(WeftError::IllegalState {
                fragment: fragment.name.clone(),
                message: format!("cannot {action} a fragment that is already attached"),
            }),
        }
    }
}

fn member_site(ctx: &TargetContext<'_>, name: &str, desc: &str) -> Site {
    Site::fragment(ctx.fragment_name())
        .member(name, desc)
        .target(ctx.target_name())
}
