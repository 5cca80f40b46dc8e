use crate::ir::ClassNode;
use rustc_hash::FxHashMap;

/// Host class-loading collaborator: supplies parsed classes by internal name.
pub trait ClassSource: Send + Sync {
    /// Returns the class, or `None` if the loader cannot locate it.
    fn load(&self, name: &str) -> Option<ClassNode>;
}

/// In-memory class source, used by the CLI and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    classes: FxHashMap<String, ClassNode>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a class.
    pub fn add(&mut self, node: ClassNode) {
        self.classes.insert(node.name.clone(), node);
    }

    /// Builder-style [`MemorySource::add`].
    pub fn with(mut self, node: ClassNode) -> Self {
        self.add(node);
        self
    }

    /// Number of classes held.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True if no classes are held.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassNode> for MemorySource {
    fn from_iter<I: IntoIterator<Item = ClassNode>>(iter: I) -> Self {
        let mut source = Self::new();
        for node in iter {
            source.add(node);
        }
        source
    }
}

impl ClassSource for MemorySource {
    fn load(&self, name: &str) -> Option<ClassNode> {
        self.classes.get(name).cloned()
    }
}
