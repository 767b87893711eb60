use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::fs::node::{Directory, File, Node};
use crate::fs::order;

/// A single entry read from a directory listing.
struct Listed {
    name: OsString,
    is_dir: bool,
}

/// Replace the children of an opened directory with its current listing.
///
/// Children that still exist are kept as-is (same `opened`/`selected` state),
/// and opened subdirectories among them are rescanned recursively. The listing
/// is read completely before anything is committed, so a failed read leaves
/// the directory untouched. Closed directories are not scanned.
pub fn scan(dir: &mut Directory) -> Result<()> {
    if !dir.is_opened() {
        return Ok(());
    }

    let dirname = dir.path();
    let listing = read_listing(&dirname)?;

    let mut previous: HashMap<(bool, PathBuf), Node> = dir
        .take_children()
        .into_iter()
        .map(|node| ((node.is_dir(), node.path()), node))
        .collect();

    let mut children = Vec::with_capacity(listing.len());
    for entry in listing {
        let key = (entry.is_dir, dirname.join(&entry.name));
        let node = match previous.remove(&key) {
            Some(Node::Directory(mut prior)) => {
                if let Err(err) = scan(&mut prior) {
                    warn!(path = %key.1.display(), error = %err, "rescan failed, closing directory");
                    prior.close();
                }
                Node::Directory(prior)
            }
            Some(prior) => prior,
            None if entry.is_dir => Node::Directory(Directory::child(&dirname, entry.name)),
            None => Node::File(File::child(&dirname, entry.name)),
        };
        children.push(node);
    }

    children.sort_by(order::compare_nodes);
    for child in children.iter_mut() {
        child.meta_mut().set_dirname(&dirname);
    }

    debug!(
        path = %dirname.display(),
        children = children.len(),
        dropped = previous.len(),
        "scanned directory"
    );
    dir.set_children(children);
    Ok(())
}

/// Read every entry of `dirname`. Symlinks are listed as files and never
/// followed, which keeps recursive opening free of link cycles.
fn read_listing(dirname: &Path) -> Result<Vec<Listed>> {
    let mut listing = Vec::new();
    for entry in fs::read_dir(dirname)? {
        let entry = entry?;
        let is_dir = entry.file_type()?.is_dir();
        listing.push(Listed {
            name: entry.file_name(),
            is_dir,
        });
    }
    Ok(listing)
}
