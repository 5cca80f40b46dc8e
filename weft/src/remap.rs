//! Name remapping between environments.
//!
//! A fragment is written against one set of names (for example
//! deobfuscated development names) while the target may carry another. A
//! [`Remapper`] proposes candidate names; the pre-processor checks each one
//! against the target before accepting it.

use crate::error::{Result, WeftError};
use crate::registry::{MemberKey, MemberKind};
use anyhow::Context;
use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Source of candidate names for a member in other environments.
pub trait Remapper: Send + Sync {
    /// Candidate names for method `owner.name desc`, most preferred first.
    fn remap_method(&self, owner: &str, name: &str, desc: &str) -> Vec<String>;

    /// Candidate names for field `owner.name:desc`, most preferred first.
    fn remap_field(&self, owner: &str, name: &str, desc: &str) -> Vec<String>;
}

/// A remapper that never proposes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemap;

impl Remapper for NoRemap {
    fn remap_method(&self, _owner: &str, _name: &str, _desc: &str) -> Vec<String> {
        Vec::new()
    }

    fn remap_field(&self, _owner: &str, _name: &str, _desc: &str) -> Vec<String> {
        Vec::new()
    }
}

/// One mapping line in a mapping document.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingEntry {
    /// Owning class.
    pub owner: String,
    /// Name in the fragment's environment.
    pub name: String,
    /// Descriptor. Optional for fields.
    #[serde(default)]
    pub desc: String,
    /// Name in the mapped environment.
    pub mapped: String,
}

/// Methods and fields of one environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentDocument {
    /// Method mappings.
    #[serde(default)]
    pub methods: Vec<MappingEntry>,
    /// Field mappings.
    #[serde(default)]
    pub fields: Vec<MappingEntry>,
}

/// On-disk mapping format (JSON or TOML).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingDocument {
    /// Environments by name.
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentDocument>,
}

#[derive(Debug, Default)]
struct Environment {
    mappings: FxHashMap<MemberKey, CompactString>,
}

/// Mapping tables for any number of environments.
///
/// Fields are keyed by owner and name only, so field lookups match
/// regardless of descriptor.
#[derive(Debug, Default)]
pub struct MappingTable {
    environments: BTreeMap<String, Environment>,
}

impl MappingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(kind: MemberKind, owner: &str, name: &str, desc: &str) -> MemberKey {
        match kind {
            MemberKind::Method => MemberKey::new(owner, kind, name, desc),
            MemberKind::Field => MemberKey::new(owner, kind, name, ""),
        }
    }

    fn insert(
        &mut self,
        environment: &str,
        kind: MemberKind,
        owner: &str,
        name: &str,
        desc: &str,
        mapped: &str,
    ) -> Result<()> {
        let env = self.environments.entry(environment.to_owned()).or_default();
        let key = Self::key(kind, owner, name, desc);
        if let Some(existing) = env.mappings.get(&key) {
            if existing != mapped {
                return Err(WeftError::ReferenceConflict {
                    key: format!("{environment}:{key}"),
                    existing: existing.to_string(),
                    new: mapped.to_owned(),
                });
            }
            return Ok(());
        }
        env.mappings.insert(key, mapped.into());
        Ok(())
    }

    /// Adds a method mapping to `environment`.
    pub fn add_method(
        &mut self,
        environment: &str,
        owner: &str,
        name: &str,
        desc: &str,
        mapped: &str,
    ) -> Result<()> {
        self.insert(environment, MemberKind::Method, owner, name, desc, mapped)
    }

    /// Adds a field mapping to `environment`.
    pub fn add_field(&mut self, environment: &str, owner: &str, name: &str, mapped: &str) -> Result<()> {
        self.insert(environment, MemberKind::Field, owner, name, "", mapped)
    }

    /// Builds a table from a parsed document.
    pub fn from_document(document: MappingDocument) -> Result<Self> {
        let mut table = Self::new();
        for (environment, doc) in &document.environments {
            table.environments.entry(environment.clone()).or_default();
            for entry in &doc.methods {
                table.add_method(environment, &entry.owner, &entry.name, &entry.desc, &entry.mapped)?;
            }
            for entry in &doc.fields {
                table.add_field(environment, &entry.owner, &entry.name, &entry.mapped)?;
            }
        }
        Ok(table)
    }

    /// Loads a mapping file. `.toml` files are read as TOML, anything else
    /// as JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mappings from {}", path.display()))?;
        let document: MappingDocument = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };
        let table = Self::from_document(document)?;
        tracing::debug!(
            path = %path.display(),
            environments = table.environments.len(),
            "loaded mappings"
        );
        Ok(table)
    }

    /// Environment names, sorted.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    fn lookup(&self, kind: MemberKind, owner: &str, name: &str, desc: &str) -> Vec<String> {
        let key = Self::key(kind, owner, name, desc);
        let mut candidates: Vec<String> = Vec::new();
        for env in self.environments.values() {
            if let Some(mapped) = env.mappings.get(&key) {
                if !candidates.iter().any(|c| c.as_str() == mapped.as_str()) {
                    candidates.push(mapped.to_string());
                }
            }
        }
        candidates
    }
}

impl Remapper for MappingTable {
    fn remap_method(&self, owner: &str, name: &str, desc: &str) -> Vec<String> {
        self.lookup(MemberKind::Method, owner, name, desc)
    }

    fn remap_field(&self, owner: &str, name: &str, desc: &str) -> Vec<String> {
        self.lookup(MemberKind::Field, owner, name, desc)
    }
}
