use std::path::{Path, PathBuf};

use crate::fs::node::NodeRef;

/// A copied node, captured by kind and path rather than by reference so it
/// outlives rescans of the tree it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl RegistryEntry {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            is_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<NodeRef<'_>> for RegistryEntry {
    fn from(node: NodeRef<'_>) -> Self {
        Self::new(node.path(), node.is_dir())
    }
}

/// Copy buffer for paste. Holds a single generation of entries: every `set`
/// replaces what was there.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of the registry.
    pub fn set(&mut self, entries: Vec<RegistryEntry>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of items in the registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_is_empty() {
        let reg = Registry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn set_stores_entries_in_order() {
        let mut reg = Registry::new();
        reg.set(vec![
            RegistryEntry::new("/tmp/a.txt", false),
            RegistryEntry::new("/tmp/dir", true),
        ]);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.entries()[0].path(), Path::new("/tmp/a.txt"));
        assert!(reg.entries()[1].is_dir);
    }

    #[test]
    fn set_overwrites_previous() {
        let mut reg = Registry::new();
        reg.set(vec![RegistryEntry::new("/tmp/old.txt", false)]);
        reg.set(vec![RegistryEntry::new("/tmp/new.txt", false)]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.entries()[0].path(), Path::new("/tmp/new.txt"));
    }

    #[test]
    fn clear_empties_registry() {
        let mut reg = Registry::new();
        reg.set(vec![RegistryEntry::new("/tmp/a.txt", false)]);
        reg.clear();
        assert!(reg.is_empty());
    }

    #[test]
    fn entry_from_node_captures_kind_and_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = crate::fs::node::Directory::new(tmp.path()).unwrap();
        let entry = RegistryEntry::from(NodeRef::Directory(&dir));
        assert!(entry.is_dir);
        assert_eq!(entry.path(), dir.path());
    }
}
