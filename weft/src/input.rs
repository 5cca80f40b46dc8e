//! The JSON document the CLI consumes: parsed classes plus fragments.

use crate::fragment::Fragment;
use crate::ir::ClassNode;
use crate::registry::MemorySource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Classes visible to the registry and fragments to apply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeaveInput {
    /// Target classes and their hierarchy.
    #[serde(default)]
    pub classes: Vec<ClassNode>,
    /// Fragments, in declaration order.
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

impl WeaveInput {
    /// Reads and parses an input document.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let input: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(
            classes = input.classes.len(),
            fragments = input.fragments.len(),
            "loaded input"
        );
        Ok(input)
    }

    /// A class source over the document's classes.
    pub fn source(&self) -> MemorySource {
        self.classes.iter().cloned().collect()
    }
}
