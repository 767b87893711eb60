use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info};

use crate::config::TreeSettings;
use crate::error::{Result, TreeError};
use crate::fs::index;
use crate::fs::node::{Directory, NodeMut, NodeRef};
use crate::fs::operations;
use crate::fs::registry::{Registry, RegistryEntry};
use crate::fs::trash::Trash;
use crate::host::Host;

/// True when `target` is `base` or lies below it, compared by path component.
pub fn under_or_equals(base: &Path, target: &Path) -> bool {
    target.starts_with(base)
}

/// Walk up from `start` and return the first directory that has an
/// immediate child whose name matches `pattern`. Falls back to the
/// filesystem root.
pub fn project_dir(start: &Path, pattern: &Regex) -> Result<PathBuf> {
    let mut last = start;
    for dir in start.ancestors() {
        last = dir;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if pattern.is_match(&entry.file_name().to_string_lossy()) {
                return Ok(dir.to_path_buf());
            }
        }
    }
    Ok(last.to_path_buf())
}

/// Drop targets that live inside another targeted directory; acting on the
/// outer directory already covers them.
fn outermost(targets: Vec<NodeRef<'_>>) -> Vec<NodeRef<'_>> {
    let dirs: Vec<PathBuf> = targets
        .iter()
        .filter(|t| t.is_dir())
        .map(|t| t.path())
        .collect();
    targets
        .into_iter()
        .filter(|t| {
            let path = t.path();
            !dirs.iter().any(|d| *d != path && path.starts_with(d))
        })
        .collect()
}

/// Treat a blank answer like a cancelled prompt.
fn non_blank(answer: Option<String>) -> Option<String> {
    answer.filter(|s| !s.trim().is_empty())
}

fn open_dir(path: &Path) -> Result<Directory> {
    let path = fs::canonicalize(path)?;
    let mut dir = Directory::new(&path)?;
    dir.open()?;
    Ok(dir)
}

/// The navigable tree: one opened root directory, the copy registry and the
/// trash, driven through a [`Host`].
#[derive(Debug)]
pub struct Tree {
    root: Directory,
    registry: Registry,
    settings: TreeSettings,
    trash: Trash,
}

impl Tree {
    /// Open `path` as the root. The trash directory is created if missing.
    pub fn new(path: &Path, settings: TreeSettings) -> Result<Self> {
        let trash = Trash::ensure(&settings.trash_dir)?;
        let root = open_dir(path)?;
        debug!(root = %root.path().display(), trash = %trash.dir().display(), "tree ready");
        Ok(Self {
            root,
            registry: Registry::new(),
            settings,
            trash,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn root_path(&self) -> PathBuf {
        self.root.path()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub fn trash_dir(&self) -> &Path {
        self.trash.dir()
    }

    /// Replace the root with a freshly opened directory at `path`.
    pub fn set_root_path(&mut self, path: &Path) -> Result<()> {
        self.root = open_dir(path)?;
        debug!(root = %self.root.path().display(), "re-rooted");
        Ok(())
    }

    pub fn index_of(&self, position: usize) -> Option<NodeRef<'_>> {
        index::index_of(&self.root, position)
    }

    pub fn visible_count(&self) -> usize {
        index::visible_count(&self.root)
    }

    pub fn lines(&self) -> Vec<String> {
        index::lines(&self.root, &self.settings, &self.trash)
    }

    pub fn has_selected(&self) -> bool {
        index::has_selected(&self.root)
    }

    pub fn selected(&self) -> Vec<NodeRef<'_>> {
        index::selected(&self.root)
            .into_iter()
            .map(|(_, node)| node)
            .collect()
    }

    /// The selection when there is one, otherwise the node under the cursor.
    pub fn targets<H: Host>(&self, host: &H) -> Result<Vec<NodeRef<'_>>> {
        let selected = self.selected();
        if !selected.is_empty() {
            return Ok(selected);
        }
        Ok(vec![self.cursor_node(host)?])
    }

    fn cursor_address<H: Host>(&self, host: &H) -> Result<Vec<usize>> {
        let position = host.cursor()?;
        index::address_of(&self.root, position)
            .ok_or_else(|| TreeError::NotFound(format!("no node at position {position}")))
    }

    fn cursor_node<H: Host>(&self, host: &H) -> Result<NodeRef<'_>> {
        let position = host.cursor()?;
        self.index_of(position)
            .ok_or_else(|| TreeError::NotFound(format!("no node at position {position}")))
    }

    /// Address of the nearest opened directory: an opened directory is its
    /// own answer, anything else answers with its parent.
    fn nearest_opened_address(&self, address: &[usize]) -> Vec<usize> {
        match self.root.node_at(address) {
            Some(NodeRef::Directory(dir)) if dir.is_opened() => address.to_vec(),
            _ => address[..address.len().saturating_sub(1)].to_vec(),
        }
    }

    /// Address of the directory itself, or of the parent for a file.
    fn nearest_dir_address(&self, address: &[usize]) -> Vec<usize> {
        match self.root.node_at(address) {
            Some(NodeRef::Directory(_)) => address.to_vec(),
            _ => address[..address.len().saturating_sub(1)].to_vec(),
        }
    }

    fn reject_root(&self, targets: &[NodeRef<'_>], action: &str) -> Result<()> {
        if targets.iter().any(|t| *t == NodeRef::Directory(&self.root)) {
            return Err(TreeError::InvalidOperator(format!(
                "cannot {action} the current root {}",
                self.root.path().display()
            )));
        }
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────────────

    pub fn render<H: Host>(&self, host: &mut H) -> Result<()> {
        host.render(self.lines())
    }

    /// Rescan the whole root, keep the host cursor in range and render. The
    /// render happens even when the scan fails.
    pub fn scan_and_render<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let scanned = self.root.scan();
        let last = self.visible_count().saturating_sub(1);
        if matches!(host.cursor(), Ok(position) if position > last) {
            host.set_cursor(last)?;
        }
        let rendered = self.render(host);
        scanned.and(rendered)
    }

    /// Render, then report `result` ahead of any render failure.
    fn finish<H: Host>(&self, host: &mut H, result: Result<()>) -> Result<()> {
        let rendered = self.render(host);
        result.and(rendered)
    }

    /// Run a mutation, then clear the selection when asked, rescan and
    /// render. The mutation's own error wins over a refresh error.
    fn mutate<H, F>(&mut self, host: &mut H, clears_selection: bool, op: F) -> Result<()>
    where
        H: Host,
        F: FnOnce(&mut Self, &mut H) -> Result<()>,
    {
        let result = op(self, host);
        if clears_selection {
            self.clear_selection();
        }
        let refreshed = self.scan_and_render(host);
        result.and(refreshed)
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    /// Re-open (rescan) the root.
    pub fn open<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = self.root.open();
        self.finish(host, result)
    }

    pub fn refresh<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.scan_and_render(host)
    }

    /// Re-root to a prompted path, relative to the current root.
    pub fn cd<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = match non_blank(host.text("cd", &[])?) {
            Some(path) => {
                let target = self.root.path().join(path.trim());
                self.set_root_path(&target)
            }
            None => Ok(()),
        };
        self.finish(host, result)
    }

    /// Re-root to the root of the current filesystem.
    pub fn fs_root<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let path = self.root.path();
        let top = path.ancestors().last().unwrap_or(path.as_path()).to_path_buf();
        let result = self.set_root_path(&top);
        self.finish(host, result)
    }

    pub fn home<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = dirs::home_dir()
            .ok_or_else(|| TreeError::Config("cannot resolve home directory".to_string()))
            .and_then(|home| self.set_root_path(&home));
        self.finish(host, result)
    }

    pub fn trash<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let dir = self.trash.dir().to_path_buf();
        let result = self.set_root_path(&dir);
        self.finish(host, result)
    }

    /// Re-root to the nearest ancestor that looks like a project root.
    pub fn project<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = project_dir(&self.root.path(), &self.settings.project_pattern)
            .and_then(|dir| self.set_root_path(&dir));
        self.finish(host, result)
    }

    /// Close the nearest opened directory, or re-root to the parent when the
    /// ascent would leave the current root.
    pub fn up<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = self.ascend(host);
        self.finish(host, result)
    }

    fn ascend<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let address = self.cursor_address(&*host)?;
        let nearest = self.nearest_opened_address(&address);
        let current = self
            .root
            .dir_at(&nearest)
            .ok_or_else(|| TreeError::NotFound("no opened directory at cursor".to_string()))?
            .path();
        let next = current
            .parent()
            .ok_or_else(|| TreeError::NotFound(format!("{} has no parent", current.display())))?
            .to_path_buf();

        if under_or_equals(&self.root.path(), &next) {
            if let Some(dir) = self.root.dir_at_mut(&nearest) {
                dir.close();
            }
            debug!(dir = %current.display(), "closed on ascent");
            return Ok(());
        }

        let mut parent = Directory::new(&next)?;
        parent.open()?;
        let old = mem::replace(&mut self.root, parent);
        let old_path = old.path();
        if !self.root.adopt(old) {
            debug!(path = %old_path.display(), "previous root not found under new root");
        }
        debug!(root = %next.display(), "ascended");
        if let Some(position) = index::position_of(&self.root, true, &old_path) {
            host.set_cursor(position)?;
        }
        Ok(())
    }

    /// Make the directory under the cursor the root, or open the file under
    /// the cursor through the host.
    pub fn down<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = self.descend(host);
        self.finish(host, result)
    }

    fn descend<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let address = self.cursor_address(&*host)?;
        match self.root.node_at_mut(&address) {
            Some(NodeMut::Directory(dir)) => dir.open()?,
            Some(NodeMut::File(file)) => return host.open_file(file),
            None => return Err(TreeError::NotFound("no node at cursor".to_string())),
        }
        // the opened subtree moves out of the old root, which is dropped
        if let Some(dir) = self.root.detach(&address) {
            self.root = dir;
        }
        debug!(root = %self.root.path().display(), "descended");
        host.set_cursor(0)
    }

    // ── Open / close ────────────────────────────────────────────────────────

    pub fn toggle<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = self.with_cursor_dir(&*host, "toggle", Directory::toggle);
        self.finish(host, result)
    }

    pub fn toggle_rec<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = self.with_cursor_dir(&*host, "toggle", Directory::toggle_rec);
        self.finish(host, result)
    }

    fn with_cursor_dir<H: Host>(
        &mut self,
        host: &H,
        action: &str,
        f: impl FnOnce(&mut Directory) -> Result<()>,
    ) -> Result<()> {
        let address = self.cursor_address(host)?;
        match self.root.node_at_mut(&address) {
            Some(NodeMut::Directory(dir)) => f(dir),
            Some(NodeMut::File(file)) => Err(TreeError::InvalidOperator(format!(
                "cannot {action} file {}",
                file.path().display()
            ))),
            None => Err(TreeError::NotFound("no node at cursor".to_string())),
        }
    }

    // ── Selection ───────────────────────────────────────────────────────────

    /// Toggle the node under the cursor and step the cursor down when it
    /// became selected.
    pub fn select<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let result = self.toggle_cursor_selection(host);
        self.finish(host, result)
    }

    fn toggle_cursor_selection<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let position = host.cursor()?;
        let address = self.cursor_address(&*host)?;
        let selected = {
            let mut node = self
                .root
                .node_at_mut(&address)
                .ok_or_else(|| TreeError::NotFound("no node at cursor".to_string()))?;
            let meta = node.meta_mut();
            meta.toggle_selected();
            meta.selected()
        };
        if selected && position + 1 < self.visible_count() {
            host.set_cursor(position + 1)?;
        }
        Ok(())
    }

    /// Clear the selection if there is one, otherwise select every visible
    /// node below the root.
    pub fn toggle_select_all<H: Host>(&mut self, host: &mut H) -> Result<()> {
        if self.has_selected() {
            self.clear_selection();
        } else {
            index::for_each_descendant_mut(&mut self.root, &mut |meta| meta.select());
        }
        self.render(host)
    }

    /// Flip the selection of every visible node below the root.
    pub fn reverse_selected<H: Host>(&mut self, host: &mut H) -> Result<()> {
        index::for_each_descendant_mut(&mut self.root, &mut |meta| meta.toggle_selected());
        self.render(host)
    }

    pub fn unselect_all<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.clear_selection();
        self.render(host)
    }

    fn clear_selection(&mut self) {
        self.root.meta_mut().unselect();
        index::for_each_descendant_mut(&mut self.root, &mut |meta| meta.unselect());
    }

    // ── Mutations ───────────────────────────────────────────────────────────

    /// Create directories under the cursor directory (the parent directory
    /// when the cursor is on a file).
    pub fn create_dir<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, false, |tree, host| {
            tree.create_under_cursor(host, "New directory", Directory::create_dirs)
        })
    }

    /// Create empty files under the cursor directory (the parent directory
    /// when the cursor is on a file).
    pub fn create_file<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, false, |tree, host| {
            tree.create_under_cursor(host, "New file", Directory::create_files)
        })
    }

    fn create_under_cursor<H: Host>(
        &mut self,
        host: &mut H,
        request: &str,
        create: impl FnOnce(&mut Directory, &[String]) -> Result<()>,
    ) -> Result<()> {
        let address = self.cursor_address(&*host)?;
        let dir_address = self.nearest_dir_address(&address);
        let names = {
            let target = self
                .root
                .node_at(&dir_address)
                .ok_or_else(|| TreeError::NotFound("no directory at cursor".to_string()))?;
            host.texts(request, &[target])?
        };
        let names: Vec<String> = names
            .unwrap_or_default()
            .into_iter()
            .filter(|n| !n.trim().is_empty())
            .collect();
        if names.is_empty() {
            return Ok(());
        }
        let dir = self
            .root
            .dir_at_mut(&dir_address)
            .ok_or_else(|| TreeError::NotFound("no directory at cursor".to_string()))?;
        create(dir, &names)
    }

    /// Rename the selection (one prompted name per node) or the cursor node.
    pub fn rename<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, true, |tree, host| {
            let from_selection = tree.has_selected();
            let targets = tree.targets(&*host)?;
            tree.reject_root(&targets, "rename")?;

            let names = if from_selection {
                match host.texts("Rename", &targets)? {
                    Some(names) => names,
                    None => return Ok(()),
                }
            } else {
                match non_blank(host.text("Rename", &targets)?) {
                    Some(name) => vec![name],
                    None => return Ok(()),
                }
            };
            if names.len() != targets.len() {
                return Err(TreeError::CountMismatch {
                    expected: targets.len(),
                    actual: names.len(),
                });
            }
            for name in &names {
                operations::validate_name(name)?;
            }

            if let [target] = targets.as_slice() {
                target.rename(&names[0])?;
                return Ok(());
            }

            // Earlier renames can move later targets (a renamed directory
            // and something inside it), so later paths are rebased.
            let mut paths: Vec<PathBuf> = targets.iter().map(|t| t.path()).collect();
            for i in 0..paths.len() {
                let old = paths[i].clone();
                let new = operations::rename_in_place(&old, &names[i])?;
                for later in paths.iter_mut().skip(i + 1) {
                    if let Ok(rest) = later.strip_prefix(&old) {
                        *later = if rest.as_os_str().is_empty() {
                            new.clone()
                        } else {
                            new.join(rest)
                        };
                    }
                }
            }
            Ok(())
        })
    }

    /// Move the targets into a prompted directory, relative to the root.
    pub fn move_to<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, true, |tree, host| {
            let targets = outermost(tree.targets(&*host)?);
            tree.reject_root(&targets, "move")?;
            let Some(dest) = non_blank(host.text("Move to", &targets)?) else {
                return Ok(());
            };
            let dest_dir = tree.root.path().join(dest.trim());
            for target in &targets {
                target.move_to(&dest_dir)?;
            }
            Ok(())
        })
    }

    /// Soft delete: move the targets into the trash.
    pub fn remove<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, true, |tree, host| {
            let targets = outermost(tree.targets(&*host)?);
            tree.reject_root(&targets, "remove")?;
            if !host.confirm("Move to trash?", &targets)? {
                return Ok(());
            }
            for target in &targets {
                tree.trash.remove(*target)?;
            }
            Ok(())
        })
    }

    pub fn remove_permanently<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, true, |tree, host| {
            let targets = outermost(tree.targets(&*host)?);
            tree.reject_root(&targets, "delete")?;
            if !host.confirm("Delete permanently?", &targets)? {
                return Ok(());
            }
            for target in &targets {
                target.remove_permanently()?;
            }
            Ok(())
        })
    }

    /// Move trash entries back to where they came from.
    pub fn restore<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, true, |tree, host| {
            let targets = outermost(tree.targets(&*host)?);
            tree.reject_root(&targets, "restore")?;
            if !host.confirm("Restore?", &targets)? {
                return Ok(());
            }
            for target in &targets {
                tree.trash.restore(*target)?;
            }
            Ok(())
        })
    }

    pub fn open_externally<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, true, |tree, host| {
            for target in tree.targets(&*host)? {
                host.open_externally(&target.path())?;
            }
            Ok(())
        })
    }

    /// Open the directory of each target (the target itself for directories).
    pub fn open_dir_externally<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, true, |tree, host| {
            for target in tree.targets(&*host)? {
                host.open_externally(&target.nearest_dir_path())?;
            }
            Ok(())
        })
    }

    // ── Registry ────────────────────────────────────────────────────────────

    /// Capture the targets into the registry, replacing what was there.
    pub fn copy<H: Host>(&mut self, host: &mut H) -> Result<()> {
        let from_selection = self.has_selected();
        let entries: Vec<RegistryEntry> = outermost(self.targets(&*host)?)
            .into_iter()
            .map(RegistryEntry::from)
            .collect();
        info!(count = entries.len(), "copied to registry");
        self.registry.set(entries);
        if from_selection {
            self.clear_selection();
        }
        self.render(host)
    }

    /// Copy every registry entry into the nearest opened directory of the
    /// cursor.
    pub fn paste<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.mutate(host, false, |tree, host| {
            if tree.registry.is_empty() {
                return Ok(());
            }
            let address = tree.cursor_address(&*host)?;
            let dest = tree
                .root
                .dir_at(&tree.nearest_opened_address(&address))
                .ok_or_else(|| TreeError::NotFound("no directory at cursor".to_string()))?
                .path();
            for entry in tree.registry.entries() {
                operations::copy_into(entry.path(), &dest)?;
            }
            Ok(())
        })
    }

    /// Put the cursor node's path on the host clipboard.
    pub fn yank<H: Host>(&self, host: &mut H) -> Result<()> {
        let path = self.cursor_node(&*host)?.path();
        host.set_clipboard(&path.to_string_lossy())
    }
}
