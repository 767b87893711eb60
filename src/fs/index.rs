//! Flattened, preorder view over the visible part of a tree.
//!
//! Position 0 is the root; a closed directory occupies one position and
//! hides its (absent) children. Nothing is cached: every query walks the
//! current shape.

use std::ops::ControlFlow;
use std::path::Path;

use crate::config::TreeSettings;
use crate::fs::node::{Directory, Node, NodeMeta, NodeRef};
use crate::fs::trash::Trash;

/// A node reached during a walk.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a, 's> {
    pub position: usize,
    /// Number of ancestors between the node and the root.
    pub depth: usize,
    /// Child indices from the root.
    pub address: &'s [usize],
    pub node: NodeRef<'a>,
}

/// Visit every visible node in preorder until `f` breaks.
pub fn walk<'a, B>(
    root: &'a Directory,
    mut f: impl FnMut(Visit<'a, '_>) -> ControlFlow<B>,
) -> Option<B> {
    let mut position = 0;
    let mut address = Vec::new();
    match visit(NodeRef::Directory(root), &mut address, &mut position, &mut f) {
        ControlFlow::Break(value) => Some(value),
        ControlFlow::Continue(()) => None,
    }
}

fn visit<'a, B, F>(
    node: NodeRef<'a>,
    address: &mut Vec<usize>,
    position: &mut usize,
    f: &mut F,
) -> ControlFlow<B>
where
    F: FnMut(Visit<'a, '_>) -> ControlFlow<B>,
{
    f(Visit {
        position: *position,
        depth: address.len(),
        address: address.as_slice(),
        node,
    })?;
    *position += 1;

    if let NodeRef::Directory(dir) = node {
        for (index, child) in dir.children().iter().enumerate() {
            address.push(index);
            visit(child.view(), address, position, f)?;
            address.pop();
        }
    }
    ControlFlow::Continue(())
}

/// Node at flattened position `i`.
pub fn index_of(root: &Directory, i: usize) -> Option<NodeRef<'_>> {
    walk(root, |v| {
        if v.position == i {
            ControlFlow::Break(v.node)
        } else {
            ControlFlow::Continue(())
        }
    })
}

/// Child-index path of the node at flattened position `i`.
pub fn address_of(root: &Directory, i: usize) -> Option<Vec<usize>> {
    walk(root, |v| {
        if v.position == i {
            ControlFlow::Break(v.address.to_vec())
        } else {
            ControlFlow::Continue(())
        }
    })
}

/// Flattened position of the visible node with this kind and path.
pub fn position_of(root: &Directory, is_dir: bool, path: &Path) -> Option<usize> {
    walk(root, |v| {
        if v.node.is_dir() == is_dir && v.node.path() == path {
            ControlFlow::Break(v.position)
        } else {
            ControlFlow::Continue(())
        }
    })
}

/// Every visible node with a position in `start..=end`.
pub fn range_of(root: &Directory, start: usize, end: usize) -> Vec<NodeRef<'_>> {
    let mut nodes = Vec::new();
    walk(root, |v| {
        if v.position > end {
            return ControlFlow::Break(());
        }
        if v.position >= start {
            nodes.push(v.node);
        }
        ControlFlow::Continue(())
    });
    nodes
}

pub fn visible_count(root: &Directory) -> usize {
    let mut count = 0;
    walk::<()>(root, |_| {
        count += 1;
        ControlFlow::Continue(())
    });
    count
}

/// Every visible node, root included, in display order.
pub fn all(root: &Directory) -> Vec<NodeRef<'_>> {
    range_of(root, 0, usize::MAX)
}

/// Selected nodes with their addresses, in display order.
pub fn selected(root: &Directory) -> Vec<(Vec<usize>, NodeRef<'_>)> {
    let mut found = Vec::new();
    walk::<()>(root, |v| {
        if v.node.selected() {
            found.push((v.address.to_vec(), v.node));
        }
        ControlFlow::Continue(())
    });
    found
}

pub fn has_selected(root: &Directory) -> bool {
    walk(root, |v| {
        if v.node.selected() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .is_some()
}

/// Apply `f` to every visible node below `dir` (not `dir` itself).
pub fn for_each_descendant_mut(dir: &mut Directory, f: &mut impl FnMut(&mut NodeMeta)) {
    for child in dir.children_mut() {
        f(child.meta_mut());
        if let Node::Directory(sub) = child {
            for_each_descendant_mut(sub, f);
        }
    }
}

/// Render payload: one line per visible node.
pub fn lines(root: &Directory, settings: &TreeSettings, trash: &Trash) -> Vec<String> {
    let mut out = Vec::new();
    walk::<()>(root, |v| {
        out.push(line(v.node, v.depth, settings, trash));
        ControlFlow::Continue(())
    });
    out
}

fn line(node: NodeRef<'_>, depth: usize, settings: &TreeSettings, trash: &Trash) -> String {
    let marker = match node {
        _ if node.selected() => &settings.selected_marker,
        NodeRef::Directory(dir) if dir.is_opened() => &settings.opened_marker,
        NodeRef::Directory(_) => &settings.closed_marker,
        NodeRef::File(_) => &settings.file_marker,
    };
    let suffix = if node.is_dir() {
        settings.dir_suffix.as_str()
    } else {
        ""
    };
    format!(
        "{}{} {}{}",
        settings.indent.repeat(depth),
        marker,
        trash.original_path_of(node),
        suffix
    )
}
