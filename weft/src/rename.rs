//! Per-target rename table.
//!
//! Every fragment merged into a target records the names its members take
//! in that target here, so later fragments (and the transform pass) can
//! follow them. Entries are write-once.

use crate::error::{Result, WeftError};
use crate::registry::{ClassInfo, MemberKey};
use compact_str::CompactString;
use dashmap::DashMap;
use std::sync::Arc;

/// Write-once map from a member's identity to its name in one target.
#[derive(Debug, Default)]
pub struct RenameTable {
    entries: DashMap<MemberKey, CompactString>,
}

impl RenameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key -> name`.
    ///
    /// Re-recording the same name is a no-op; a different name for an
    /// existing key is a [`WeftError::ReferenceConflict`].
    pub fn insert(&self, key: MemberKey, name: &str) -> Result<()> {
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                if entry.get() == name {
                    Ok(())
                } else {
                    Err(WeftError::ReferenceConflict {
                        key: entry.key().to_string(),
                        existing: entry.get().to_string(),
                        new: name.to_owned(),
                    })
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(name.into());
                Ok(())
            }
        }
    }

    /// Name recorded for `key`.
    pub fn get(&self, key: &MemberKey) -> Option<CompactString> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all entries, sorted by key for stable output.
    pub fn entries(&self) -> Vec<(MemberKey, CompactString)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.to_string().cmp(&b.0.to_string()));
        entries
    }
}

/// A target class as seen by the pre-processor: its descriptor plus the
/// renames every fragment merged so far has committed.
#[derive(Debug)]
pub struct TargetClass {
    /// Registry descriptor.
    pub info: Arc<ClassInfo>,
    /// Committed renames.
    pub renames: RenameTable,
}

impl TargetClass {
    /// Wraps a resolved class.
    pub fn new(info: Arc<ClassInfo>) -> Self {
        Self {
            info,
            renames: RenameTable::new(),
        }
    }

    /// Internal name.
    pub fn name(&self) -> &str {
        &self.info.name
    }
}
