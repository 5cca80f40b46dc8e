//! Class metadata registry.
//!
//! Resolves class descriptors by internal name through a [`ClassSource`],
//! caching them for the registry's lifetime. Concurrent resolutions of the
//! same name are serialized on a per-name slot; distinct names never contend
//! on a global lock.
//!
//! The registry also owns the global rename ledger: renames published during
//! a fragment's prepare phase are recorded here and are visible to every
//! later lookup, from any thread.

mod info;
mod source;

pub use info::{ClassInfo, MemberInfo, MemberKey, MemberKind};
pub use source::{ClassSource, MemorySource};

use crate::error::{Result, WeftError};
use crate::ir::ClassNode;
use compact_str::CompactString;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Rename bookkeeping for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    /// Current name.
    pub current: CompactString,
    /// Every previous name, oldest first (starts with the declared name).
    pub history: SmallVec<[CompactString; 2]>,
}

/// A member found by a registry lookup, with its current name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHandle {
    /// The declared member.
    pub info: MemberInfo,
    /// Name after every published rename.
    pub current_name: CompactString,
    /// True if the member has been renamed at least once.
    pub renamed: bool,
}

impl MemberHandle {
    /// Current name.
    pub fn name(&self) -> &str {
        &self.current_name
    }

    /// Declaring class.
    pub fn owner(&self) -> &str {
        &self.info.owner
    }
}

/// Thread-safe, memoizing class registry.
pub struct ClassRegistry {
    source: Box<dyn ClassSource>,
    classes: DashMap<String, Arc<ClassInfo>>,
    /// One slot per name being resolved; holding the slot lock is the
    /// per-name critical section.
    slots: DashMap<String, Arc<Mutex<()>>>,
    renames: DashMap<MemberKey, RenameRecord>,
    loads: AtomicUsize,
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.classes.len())
            .field("renames", &self.renames.len())
            .finish_non_exhaustive()
    }
}

impl ClassRegistry {
    /// Creates a registry backed by the given source.
    pub fn new(source: impl ClassSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            classes: DashMap::new(),
            slots: DashMap::new(),
            renames: DashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Resolves a class by internal name.
    pub fn resolve(&self, name: &str) -> Result<Arc<ClassInfo>> {
        if let Some(info) = self.classes.get(name) {
            return Ok(Arc::clone(info.value()));
        }

        let slot = Arc::clone(self.slots.entry(name.to_owned()).or_default().value());
        let _guard = slot.lock();

        // Another thread may have finished while we waited on the slot
        if let Some(info) = self.classes.get(name) {
            return Ok(Arc::clone(info.value()));
        }

        let node = self
            .source
            .load(name)
            .ok_or_else(|| WeftError::ClassNotFound(name.to_owned()))?;
        let info = Arc::new(ClassInfo::from_node(&node, false));
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.classes.insert(name.to_owned(), Arc::clone(&info));
        trace!(class = name, "resolved class");
        Ok(info)
    }

    /// Resolves a class, mapping "not found" to `None`.
    pub fn try_resolve(&self, name: &str) -> Option<Arc<ClassInfo>> {
        self.resolve(name).ok()
    }

    /// Registers a descriptor built by the caller (fragments, host-defined
    /// classes). An existing entry for the same name wins.
    pub fn define(&self, info: ClassInfo) -> Arc<ClassInfo> {
        let name = info.name.to_string();
        Arc::clone(
            self.classes
                .entry(name)
                .or_insert_with(|| Arc::new(info))
                .value(),
        )
    }

    /// Registers a host-supplied node.
    pub fn define_node(&self, node: &ClassNode, is_mixin: bool) -> Arc<ClassInfo> {
        self.define(ClassInfo::from_node(node, is_mixin))
    }

    /// Number of classes loaded through the source (not counting `define`).
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Renames a member and returns the new name. Renaming to the current
    /// name is a no-op; renames are never reverted.
    pub fn rename(&self, member: &MemberInfo, new_name: &str) -> CompactString {
        match self.renames.entry(member.key()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if record.current != new_name {
                    debug!(member = %member.key(), from = %record.current, to = new_name, "renaming member");
                    let previous = std::mem::replace(&mut record.current, new_name.into());
                    record.history.push(previous);
                }
            }
            Entry::Vacant(entry) => {
                if member.name != new_name {
                    debug!(member = %member.key(), to = new_name, "renaming member");
                    let mut history = SmallVec::new();
                    history.push(member.name.clone());
                    entry.insert(RenameRecord {
                        current: new_name.into(),
                        history,
                    });
                }
            }
        }
        new_name.into()
    }

    /// Current name of a member.
    pub fn current_name(&self, member: &MemberInfo) -> CompactString {
        self.renames
            .get(&member.key())
            .map_or_else(|| member.name.clone(), |r| r.current.clone())
    }

    /// Rename record of a member, if it was ever renamed.
    pub fn rename_record(&self, key: &MemberKey) -> Option<RenameRecord> {
        self.renames.get(key).map(|r| r.value().clone())
    }

    fn handle(&self, info: &MemberInfo) -> MemberHandle {
        let record = self.renames.get(&info.key());
        MemberHandle {
            info: info.clone(),
            current_name: record
                .as_ref()
                .map_or_else(|| info.name.clone(), |r| r.current.clone()),
            renamed: record.is_some(),
        }
    }

    fn matches(&self, member: &MemberInfo, name: &str, desc: &str) -> bool {
        member.desc == desc && (member.name == name || self.current_name(member) == name)
    }

    /// Looks up a member declared directly on `class`, by declared or
    /// current name.
    pub fn find_declared(
        &self,
        class: &ClassInfo,
        kind: MemberKind,
        name: &str,
        desc: &str,
    ) -> Option<MemberHandle> {
        class
            .members(kind)
            .iter()
            .find(|m| self.matches(m, name, desc))
            .map(|m| self.handle(m))
    }

    /// Walks `owner`, then its super classes, then interfaces, returning the
    /// first member matching `name` + `desc`.
    ///
    /// Private members are only visible on `owner` itself unless
    /// `include_private` is set. Fails if `owner` cannot be resolved;
    /// unresolvable ancestors end that branch of the walk.
    pub fn find_member(
        &self,
        owner: &str,
        kind: MemberKind,
        name: &str,
        desc: &str,
        include_private: bool,
    ) -> Result<Option<MemberHandle>> {
        let root = self.resolve(owner)?;
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([root]);

        while let Some(class) = queue.pop_front() {
            if !visited.insert(class.name.clone()) {
                continue;
            }
            let exact = class.name == owner;
            let found = class
                .members(kind)
                .iter()
                .find(|m| (exact || include_private || !m.is_private()) && self.matches(m, name, desc));
            if let Some(member) = found {
                return Ok(Some(self.handle(member)));
            }

            if let Some(super_name) = &class.super_name {
                if let Some(parent) = self.try_resolve(super_name) {
                    queue.push_back(parent);
                }
            }
            for interface in &class.interfaces {
                if let Some(parent) = self.try_resolve(interface) {
                    queue.push_back(parent);
                }
            }
        }

        Ok(None)
    }

    /// Like [`ClassRegistry::find_member`] but skips `owner` itself.
    pub fn find_in_hierarchy(
        &self,
        owner: &str,
        kind: MemberKind,
        name: &str,
        desc: &str,
    ) -> Option<MemberHandle> {
        let root = self.try_resolve(owner)?;
        let mut candidates: Vec<&str> = root.super_name.iter().map(CompactString::as_str).collect();
        candidates.extend(root.interfaces.iter().map(CompactString::as_str));
        candidates
            .into_iter()
            .find_map(|parent| self.find_member(parent, kind, name, desc, false).ok().flatten())
    }
}
