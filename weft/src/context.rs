//! Working state of one fragment being attached to one target.

use crate::accessor::AccessorSpec;
use crate::constants::UNIQUE_SEPARATOR;
use crate::error::Result;
use crate::fragment::{Fragment, FragmentField, FragmentMethod, Marker};
use crate::ir::simple_name;
use crate::plan::{
    AccessorRecord, DiscardedMember, InjectorRecord, MergePlan, OverwriteRecord, RenameEntry,
    Rewrite, ShadowRecord,
};
use crate::registry::{ClassRegistry, MemberHandle, MemberKey, MemberKind};
use crate::remap::Remapper;
use crate::rename::TargetClass;
use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Accumulates everything one attach decides.
///
/// Renames are staged here and only reach the target's rename table in
/// [`TargetContext::finish`].
pub struct TargetContext<'a> {
    registry: &'a ClassRegistry,
    remapper: &'a dyn Remapper,
    target: &'a TargetClass,
    fragment: CompactString,
    shadow_methods: Vec<ShadowRecord>,
    shadow_fields: Vec<ShadowRecord>,
    overwrites: Vec<OverwriteRecord>,
    accessors: Vec<AccessorRecord>,
    discarded: Vec<DiscardedMember>,
    pending: FxHashMap<MemberKey, CompactString>,
    renames: Vec<RenameEntry>,
    rewrites: Vec<Rewrite>,
}

impl std::fmt::Debug for TargetContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetContext")
            .field("fragment", &self.fragment)
            .field("target", &self.target.name())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl<'a> TargetContext<'a> {
    /// Opens a context for `fragment` against `target`.
    pub fn new(
        registry: &'a ClassRegistry,
        remapper: &'a dyn Remapper,
        fragment: &str,
        target: &'a TargetClass,
    ) -> Self {
        Self {
            registry,
            remapper,
            target,
            fragment: fragment.into(),
            shadow_methods: Vec::new(),
            shadow_fields: Vec::new(),
            overwrites: Vec::new(),
            accessors: Vec::new(),
            discarded: Vec::new(),
            pending: FxHashMap::default(),
            renames: Vec::new(),
            rewrites: Vec::new(),
        }
    }

    /// Target internal name.
    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    /// Fragment internal name.
    pub fn fragment_name(&self) -> &str {
        &self.fragment
    }

    /// Looks up a target method by `name`, then each alias, with `desc`.
    pub fn find_method(&self, name: &str, desc: &str, aliases: &[String]) -> Option<MemberHandle> {
        std::iter::once(name)
            .chain(aliases.iter().map(String::as_str))
            .find_map(|candidate| {
                self.registry
                    .find_declared(&self.target.info, MemberKind::Method, candidate, desc)
            })
    }

    /// Looks up a target field by `name`, then each alias, ignoring the
    /// descriptor.
    pub fn find_field(&self, name: &str, aliases: &[String]) -> Option<MemberHandle> {
        std::iter::once(name)
            .chain(aliases.iter().map(String::as_str))
            .find_map(|candidate| self.field_named(candidate))
    }

    fn field_named(&self, name: &str) -> Option<MemberHandle> {
        let info = &self.target.info;
        info.fields.iter().find_map(|f| {
            self.registry
                .find_declared(info, MemberKind::Field, name, &f.desc)
                .filter(|h| h.info.name == f.name)
        })
    }

    /// First remapped name for `name desc` that exists in the target.
    pub fn find_remapped_method(&self, name: &str, desc: &str) -> Option<MemberHandle> {
        self.remapper
            .remap_method(self.target_name(), name, desc)
            .iter()
            .find_map(|mapped| {
                self.registry
                    .find_declared(&self.target.info, MemberKind::Method, mapped, desc)
            })
    }

    /// First remapped name for field `name` that exists in the target with
    /// descriptor `desc`.
    pub fn find_remapped_field(&self, name: &str, desc: &str) -> Option<MemberHandle> {
        self.remapper
            .remap_field(self.target_name(), name, desc)
            .iter()
            .find_map(|mapped| {
                self.registry
                    .find_declared(&self.target.info, MemberKind::Field, mapped, desc)
            })
    }

    /// Deterministic collision-free name for a unique member:
    /// `<FragmentSimpleName>$<member>$<hash>`.
    pub fn unique_name(&self, name: &str, desc: &str) -> String {
        let mut hasher = FxHasher::default();
        self.fragment.hash(&mut hasher);
        name.hash(&mut hasher);
        desc.hash(&mut hasher);
        let hash = hasher.finish() & 0xffff_ffff;
        format!(
            "{}{sep}{name}{sep}{hash:08x}",
            simple_name(&self.fragment),
            sep = UNIQUE_SEPARATOR
        )
    }

    /// Stages a per-target rename of the member identified by `key`.
    pub fn stage_rename(&mut self, key: &MemberKey, from: &str, to: &str) {
        if from == to {
            return;
        }
        debug!(fragment = %self.fragment, target = %self.target_name(), "{} {from} -> {to}", key.kind);
        self.pending.insert(key.clone(), to.into());
        self.renames.push(RenameEntry {
            kind: key.kind,
            from: from.to_owned(),
            to: to.to_owned(),
            desc: key.desc.to_string(),
        });
    }

    /// Name `key` has in this target: staged renames first, then the
    /// target's committed table.
    pub fn renamed(&self, key: &MemberKey) -> Option<CompactString> {
        self.pending
            .get(key)
            .cloned()
            .or_else(|| self.target.renames.get(key))
    }

    /// Records a shadow method bound to `target`.
    pub fn add_shadow_method(&mut self, method: &FragmentMethod, target: &MemberHandle) {
        self.shadow_methods.push(ShadowRecord {
            declared: method.declared_name().to_owned(),
            name: target.name().to_owned(),
            desc: method.node.desc.clone(),
        });
    }

    /// Records a shadow field bound to `target`.
    pub fn add_shadow_field(&mut self, field: &FragmentField, target: &MemberHandle) {
        self.shadow_fields.push(ShadowRecord {
            declared: field.declared_name().to_owned(),
            name: target.name().to_owned(),
            desc: field.node.desc.clone(),
        });
    }

    /// Records an accessor or invoker generation request.
    pub fn add_accessor_method(
        &mut self,
        method: &FragmentMethod,
        spec: &AccessorSpec,
        target: &MemberHandle,
    ) {
        self.accessors.push(AccessorRecord {
            method: method.node.name.clone(),
            desc: method.node.desc.clone(),
            kind: spec.kind,
            target_name: target.name().to_owned(),
            target_desc: target.info.desc.to_string(),
        });
    }

    /// Records a method overwriting `target`.
    pub fn add_overwrite_method(&mut self, method: &FragmentMethod, target: &MemberHandle) {
        self.overwrites.push(OverwriteRecord {
            declared: method.declared_name().to_owned(),
            name: target.name().to_owned(),
            desc: method.node.desc.clone(),
        });
    }

    /// Records a dropped member.
    pub fn discard(&mut self, kind: MemberKind, name: &str, desc: &str, reason: impl Into<String>) {
        self.discarded.push(DiscardedMember {
            kind,
            name: name.to_owned(),
            desc: desc.to_owned(),
            reason: reason.into(),
        });
    }

    /// Records an applied instruction rewrite.
    pub fn add_rewrite(&mut self, rewrite: Rewrite) {
        self.rewrites.push(rewrite);
    }

    /// Commits staged renames to the target and produces the plan.
    ///
    /// Conflicts are checked before anything is written, so a failure here
    /// leaves the target's rename table untouched.
    pub fn finish(self, fragment: Fragment) -> Result<MergePlan> {
        let table = &self.target.renames;
        for (key, name) in &self.pending {
            if let Some(existing) = table.get(key) {
                if existing != *name {
                    return Err(crate::error::WeftError::ReferenceConflict {
                        key: format!("{}:{key}", self.target_name()),
                        existing: existing.to_string(),
                        new: name.to_string(),
                    });
                }
            }
        }
        for (key, name) in self.pending {
            table.insert(key, &name)?;
        }

        let injectors = fragment
            .methods
            .iter()
            .filter(|m| matches!(m.marker, Marker::Injector { .. }))
            .map(|m| InjectorRecord {
                method: m.node.name.clone(),
                desc: m.node.desc.clone(),
                target: m.injection.clone(),
            })
            .collect();

        Ok(MergePlan {
            fragment: fragment.name,
            target: self.target.name().to_owned(),
            methods: fragment.methods.into_iter().map(|m| m.node).collect(),
            fields: fragment.fields.into_iter().map(|f| f.node).collect(),
            shadow_methods: self.shadow_methods,
            shadow_fields: self.shadow_fields,
            overwrites: self.overwrites,
            accessors: self.accessors,
            injectors,
            discarded: self.discarded,
            renames: self.renames,
            rewrites: self.rewrites,
        })
    }
}
