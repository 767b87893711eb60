use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::fs::{operations, scan};

/// State shared by both node kinds.
///
/// The path is never stored: it is always derived from the owning directory's
/// path (`dirname`) and the raw entry name, so re-parenting cannot leave it
/// stale. The lossy UTF-8 form of the name is kept for display only.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    file_name: OsString,
    display_name: String,
    dirname: PathBuf,
    selected: bool,
}

impl NodeMeta {
    fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| path.as_os_str().to_os_string());
        let dirname = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.to_path_buf());
        Self::child(&dirname, file_name)
    }

    fn child(dirname: &Path, file_name: OsString) -> Self {
        Self {
            display_name: file_name.to_string_lossy().to_string(),
            file_name,
            dirname: dirname.to_path_buf(),
            selected: false,
        }
    }

    /// Name for display. Invalid UTF-8 is replaced; never build paths from it.
    pub fn name(&self) -> &str {
        &self.display_name
    }

    /// The entry name exactly as the filesystem reported it.
    pub fn file_name(&self) -> &OsStr {
        &self.file_name
    }

    /// Path of the directory that owns this node.
    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    pub fn path(&self) -> PathBuf {
        self.dirname.join(&self.file_name)
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn select(&mut self) {
        self.selected = true;
    }

    pub fn unselect(&mut self) {
        self.selected = false;
    }

    pub fn toggle_selected(&mut self) {
        self.selected = !self.selected;
    }

    pub(crate) fn set_dirname(&mut self, dirname: &Path) {
        if self.dirname != dirname {
            self.dirname = dirname.to_path_buf();
        }
    }
}

/// A directory node. Children are only held in memory while it is opened.
#[derive(Debug, Clone)]
pub struct Directory {
    meta: NodeMeta,
    opened: bool,
    children: Vec<Node>,
}

/// A file node (anything that is not a directory, including symlinks).
#[derive(Debug, Clone)]
pub struct File {
    meta: NodeMeta,
}

/// A node in the in-memory tree.
#[derive(Debug, Clone)]
pub enum Node {
    Directory(Directory),
    File(File),
}

/// Borrowed view of a node, usable for the root directory and children alike.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Directory(&'a Directory),
    File(&'a File),
}

/// Mutable view of a node.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Directory(&'a mut Directory),
    File(&'a mut File),
}

impl Directory {
    /// Create a closed directory node for an existing directory path.
    pub fn new(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_dir() {
            return Err(TreeError::NotADirectory(path.to_path_buf()));
        }
        Ok(Self::with_meta(NodeMeta::from_path(path)))
    }

    pub(crate) fn child(dirname: &Path, name: OsString) -> Self {
        Self::with_meta(NodeMeta::child(dirname, name))
    }

    fn with_meta(meta: NodeMeta) -> Self {
        Self {
            meta,
            opened: false,
            children: Vec::new(),
        }
    }

    pub fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn path(&self) -> PathBuf {
        self.meta.path()
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    /// Re-read the listing of an opened directory. No-op while closed.
    pub fn scan(&mut self) -> Result<()> {
        scan::scan(self)
    }

    pub fn open(&mut self) -> Result<()> {
        let was_opened = self.opened;
        self.opened = true;
        let scanned = scan::scan(self);
        if scanned.is_err() && !was_opened {
            self.opened = false;
        }
        scanned
    }

    /// Close the directory, discarding its in-memory children.
    pub fn close(&mut self) {
        self.opened = false;
        self.children.clear();
    }

    pub fn toggle(&mut self) -> Result<()> {
        if self.opened {
            self.close();
            return Ok(());
        }
        self.open()
    }

    /// Open this directory and every directory below it.
    pub fn open_rec(&mut self) -> Result<()> {
        self.open()?;
        for child in self.children.iter_mut() {
            if let Node::Directory(dir) = child {
                dir.open_rec()?;
            }
        }
        Ok(())
    }

    /// Close when opened, otherwise open recursively.
    pub fn toggle_rec(&mut self) -> Result<()> {
        if self.opened {
            self.close();
            return Ok(());
        }
        self.open_rec()
    }

    /// Create directories (with missing parents) below this directory.
    pub fn create_dirs(&mut self, names: &[String]) -> Result<()> {
        let base = self.path();
        for name in names {
            operations::create_dir(&base.join(name))?;
        }
        self.scan()
    }

    /// Create empty files below this directory. Existing files are kept intact.
    pub fn create_files(&mut self, names: &[String]) -> Result<()> {
        let base = self.path();
        for name in names {
            operations::create_file(&base.join(name))?;
        }
        self.scan()
    }

    /// Resolve an address (child indices from this directory) to a node.
    /// The empty address is this directory itself.
    pub fn node_at(&self, address: &[usize]) -> Option<NodeRef<'_>> {
        let Some((last, prefix)) = address.split_last() else {
            return Some(NodeRef::Directory(self));
        };
        let parent = self.dir_at(prefix)?;
        parent.children.get(*last).map(Node::view)
    }

    pub fn node_at_mut(&mut self, address: &[usize]) -> Option<NodeMut<'_>> {
        let Some((last, prefix)) = address.split_last() else {
            return Some(NodeMut::Directory(self));
        };
        let parent = self.dir_at_mut(prefix)?;
        parent.children.get_mut(*last).map(Node::view_mut)
    }

    pub fn dir_at(&self, address: &[usize]) -> Option<&Directory> {
        let mut dir = self;
        for &index in address {
            dir = match dir.children.get(index)? {
                Node::Directory(child) => child,
                Node::File(_) => return None,
            };
        }
        Some(dir)
    }

    pub fn dir_at_mut(&mut self, address: &[usize]) -> Option<&mut Directory> {
        let mut dir = self;
        for &index in address {
            dir = match dir.children.get_mut(index)? {
                Node::Directory(child) => child,
                Node::File(_) => return None,
            };
        }
        Some(dir)
    }

    /// Replace the child directory that has the same path as `child`,
    /// keeping `child`'s open and selection state. Returns whether a match
    /// was found.
    pub fn adopt(&mut self, mut child: Directory) -> bool {
        let path = child.path();
        let dirname = self.path();
        for slot in self.children.iter_mut() {
            if matches!(slot, Node::Directory(existing) if existing.path() == path) {
                child.meta.set_dirname(&dirname);
                debug!(path = %path.display(), "re-attached subtree");
                *slot = Node::Directory(child);
                return true;
            }
        }
        false
    }

    /// Move the subdirectory at `address` out of the tree. The empty
    /// address, a file, or a missing node gives `None` and changes nothing.
    pub fn detach(&mut self, address: &[usize]) -> Option<Directory> {
        let (last, prefix) = address.split_last()?;
        let parent = self.dir_at_mut(prefix)?;
        if !matches!(parent.children.get(*last), Some(Node::Directory(_))) {
            return None;
        }
        match parent.children.remove(*last) {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }
}

impl File {
    /// Create a file node for an existing non-directory path.
    pub fn new(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        if metadata.is_dir() {
            return Err(TreeError::NotAFile(path.to_path_buf()));
        }
        Ok(Self {
            meta: NodeMeta::from_path(path),
        })
    }

    pub(crate) fn child(dirname: &Path, name: OsString) -> Self {
        Self {
            meta: NodeMeta::child(dirname, name),
        }
    }

    pub fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn path(&self) -> PathBuf {
        self.meta.path()
    }
}

impl Node {
    pub fn view(&self) -> NodeRef<'_> {
        match self {
            Node::Directory(dir) => NodeRef::Directory(dir),
            Node::File(file) => NodeRef::File(file),
        }
    }

    pub fn view_mut(&mut self) -> NodeMut<'_> {
        match self {
            Node::Directory(dir) => NodeMut::Directory(dir),
            Node::File(file) => NodeMut::File(file),
        }
    }

    pub fn meta(&self) -> &NodeMeta {
        self.view().meta()
    }

    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            Node::Directory(dir) => &mut dir.meta,
            Node::File(file) => &mut file.meta,
        }
    }

    pub fn name(&self) -> &str {
        self.meta().name()
    }

    pub fn file_name(&self) -> &OsStr {
        self.meta().file_name()
    }

    pub fn path(&self) -> PathBuf {
        self.meta().path()
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn selected(&self) -> bool {
        self.meta().selected()
    }
}

/// Nodes are equal when they have the same kind and path. Rescans rebuild
/// objects, so identity is never used.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl<'a> NodeRef<'a> {
    pub fn meta(self) -> &'a NodeMeta {
        match self {
            NodeRef::Directory(dir) => &dir.meta,
            NodeRef::File(file) => &file.meta,
        }
    }

    pub fn name(self) -> &'a str {
        self.meta().name()
    }

    pub fn file_name(self) -> &'a OsStr {
        self.meta().file_name()
    }

    pub fn dirname(self) -> &'a Path {
        self.meta().dirname()
    }

    pub fn path(self) -> PathBuf {
        self.meta().path()
    }

    pub fn is_dir(self) -> bool {
        matches!(self, NodeRef::Directory(_))
    }

    pub fn selected(self) -> bool {
        self.meta().selected()
    }

    /// Path of this node if it is a directory, otherwise of its parent.
    pub fn nearest_dir_path(self) -> PathBuf {
        match self {
            NodeRef::Directory(dir) => dir.path(),
            NodeRef::File(file) => file.meta.dirname.clone(),
        }
    }

    /// Rename within the same parent directory. Returns the new path.
    pub fn rename(self, new_name: &str) -> Result<PathBuf> {
        operations::rename_in_place(&self.path(), new_name)
    }

    /// Move into `dest_dir`, keeping the name. Returns the new path.
    pub fn move_to(self, dest_dir: &Path) -> Result<PathBuf> {
        operations::move_into(&self.path(), dest_dir)
    }

    /// Delete from disk, recursively for directories.
    pub fn remove_permanently(self) -> Result<()> {
        operations::delete(&self.path())
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.is_dir() == other.is_dir() && self.path() == other.path()
    }
}

impl NodeMut<'_> {
    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            NodeMut::Directory(dir) => &mut dir.meta,
            NodeMut::File(file) => &mut file.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File as FsFile};
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("foo").join("bar").join("baz").join("qux")).unwrap();
        FsFile::create(dir.path().join("foo").join("a.txt")).unwrap();
        FsFile::create(dir.path().join("foo").join("b.txt")).unwrap();
        FsFile::create(dir.path().join("foo").join("c.txt")).unwrap();
        dir
    }

    fn names(dir: &Directory) -> Vec<&str> {
        dir.children().iter().map(Node::name).collect()
    }

    #[test]
    fn new_directory_is_closed() {
        let tmp = setup_test_dir();
        let dir = Directory::new(&tmp.path().join("foo")).unwrap();
        assert_eq!(dir.name(), "foo");
        assert!(!dir.is_opened());
        assert_eq!(dir.num_children(), 0);
    }

    #[test]
    fn directory_from_file_path_fails() {
        let tmp = setup_test_dir();
        let err = Directory::new(&tmp.path().join("foo").join("a.txt")).unwrap_err();
        assert!(matches!(err, TreeError::NotADirectory(_)));
    }

    #[test]
    fn directory_from_missing_path_fails() {
        let tmp = setup_test_dir();
        let err = Directory::new(&tmp.path().join("wrong").join("path")).unwrap_err();
        assert!(matches!(err, TreeError::Io(_)));
    }

    #[test]
    fn file_from_directory_path_fails() {
        let tmp = setup_test_dir();
        let err = File::new(&tmp.path().join("foo")).unwrap_err();
        assert!(matches!(err, TreeError::NotAFile(_)));
    }

    #[test]
    fn path_is_derived_from_dirname_and_name() {
        let tmp = setup_test_dir();
        let file = File::new(&tmp.path().join("foo").join("a.txt")).unwrap();
        assert_eq!(file.meta().dirname(), tmp.path().join("foo"));
        assert_eq!(file.path(), tmp.path().join("foo").join("a.txt"));
    }

    #[test]
    fn filesystem_root_keeps_its_path() {
        let root = Directory::new(Path::new("/")).unwrap();
        assert_eq!(root.path(), PathBuf::from("/"));
    }

    #[test]
    fn open_lists_children_sorted() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.open().unwrap();
        assert!(dir.is_opened());
        assert_eq!(names(&dir), vec!["bar", "a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn close_discards_children() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.open().unwrap();
        dir.close();
        assert!(!dir.is_opened());
        assert_eq!(dir.num_children(), 0);
        // The filesystem is untouched
        assert!(tmp.path().join("foo").join("a.txt").exists());
    }

    #[test]
    fn toggle_opens_then_closes() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.toggle().unwrap();
        assert!(dir.is_opened());
        assert_eq!(dir.num_children(), 4);
        dir.toggle().unwrap();
        assert!(!dir.is_opened());
        assert_eq!(dir.num_children(), 0);
    }

    #[test]
    fn open_rec_opens_every_level() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.open_rec().unwrap();
        let bar = dir.dir_at(&[0]).unwrap();
        assert!(bar.is_opened());
        let baz = dir.dir_at(&[0, 0]).unwrap();
        assert!(baz.is_opened());
        let qux = dir.dir_at(&[0, 0, 0]).unwrap();
        assert!(qux.is_opened());
        assert_eq!(qux.num_children(), 0);
    }

    #[test]
    fn toggle_rec_on_open_directory_closes_shallowly() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.open().unwrap();
        dir.toggle_rec().unwrap();
        assert!(!dir.is_opened());
        dir.toggle_rec().unwrap();
        assert!(dir.dir_at(&[0, 0]).unwrap().is_opened());
    }

    #[test]
    fn open_failure_leaves_directory_closed() {
        let tmp = setup_test_dir();
        let path = tmp.path().join("foo").join("bar").join("baz").join("qux");
        let mut dir = Directory::new(&path).unwrap();
        fs::remove_dir(&path).unwrap();
        assert!(dir.open().is_err());
        assert!(!dir.is_opened());
    }

    #[test]
    fn node_at_resolves_addresses() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.open_rec().unwrap();
        assert_eq!(dir.node_at(&[]).unwrap().name(), "foo");
        assert_eq!(dir.node_at(&[0, 0]).unwrap().name(), "baz");
        assert_eq!(dir.node_at(&[3]).unwrap().name(), "c.txt");
        assert!(dir.node_at(&[4]).is_none());
        // A file has no children
        assert!(dir.node_at(&[1, 0]).is_none());
    }

    #[test]
    fn node_equality_is_kind_and_path() {
        let tmp = setup_test_dir();
        let a = Node::File(File::new(&tmp.path().join("foo").join("a.txt")).unwrap());
        let mut again = File::new(&tmp.path().join("foo").join("a.txt")).unwrap();
        again.meta_mut().select();
        let b = Node::File(again);
        assert!(a == b);

        let dir = Node::Directory(Directory::new(&tmp.path().join("foo")).unwrap());
        let other = Node::Directory(Directory::new(&tmp.path().join("foo").join("bar")).unwrap());
        assert!(dir != other);
    }

    #[test]
    fn selection_flags() {
        let tmp = setup_test_dir();
        let mut file = File::new(&tmp.path().join("foo").join("a.txt")).unwrap();
        assert!(!file.meta().selected());
        file.meta_mut().toggle_selected();
        assert!(file.meta().selected());
        file.meta_mut().unselect();
        assert!(!file.meta().selected());
        file.meta_mut().select();
        assert!(file.meta().selected());
    }

    #[test]
    fn create_dirs_and_files_rescan() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.open().unwrap();
        dir.create_dirs(&["new_dir".to_string(), "deep/er".to_string()])
            .unwrap();
        dir.create_files(&["d.txt".to_string()]).unwrap();
        assert!(tmp.path().join("foo").join("deep").join("er").is_dir());
        assert_eq!(
            names(&dir),
            vec!["bar", "deep", "new_dir", "a.txt", "b.txt", "c.txt", "d.txt"]
        );
    }

    #[test]
    fn create_files_does_not_truncate() {
        let tmp = setup_test_dir();
        let path = tmp.path().join("foo").join("a.txt");
        fs::write(&path, "keep me").unwrap();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.create_files(&["a.txt".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn adopt_replaces_matching_child() {
        let tmp = setup_test_dir();
        let mut bar = Directory::new(&tmp.path().join("foo").join("bar")).unwrap();
        bar.open().unwrap();
        bar.meta_mut().select();

        let mut foo = Directory::new(&tmp.path().join("foo")).unwrap();
        foo.open().unwrap();
        assert!(foo.adopt(bar));
        let adopted = foo.dir_at(&[0]).unwrap();
        assert!(adopted.is_opened());
        assert!(adopted.meta().selected());
        assert_eq!(adopted.num_children(), 1);
    }

    #[test]
    fn nearest_dir_path_of_file_is_parent() {
        let tmp = setup_test_dir();
        let mut dir = Directory::new(&tmp.path().join("foo")).unwrap();
        dir.open().unwrap();
        let file = dir.node_at(&[1]).unwrap();
        assert_eq!(file.nearest_dir_path(), tmp.path().join("foo"));
        let bar = dir.node_at(&[0]).unwrap();
        assert_eq!(bar.nearest_dir_path(), tmp.path().join("foo").join("bar"));
    }

    #[test]
    fn detach_moves_subdirectory_out() {
        let tmp = setup_test_dir();
        let mut foo = Directory::new(&tmp.path().join("foo")).unwrap();
        foo.open().unwrap();
        foo.dir_at_mut(&[0]).unwrap().open().unwrap();

        assert!(foo.detach(&[]).is_none());
        assert!(foo.detach(&[1]).is_none());
        assert_eq!(foo.num_children(), 3);

        let bar = foo.detach(&[0]).unwrap();
        assert_eq!(bar.path(), tmp.path().join("foo").join("bar"));
        assert!(bar.is_opened());
        assert_eq!(bar.num_children(), 1);
        assert_eq!(foo.num_children(), 2);
    }
}
