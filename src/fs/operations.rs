use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, TreeError};

/// Create an empty file if nothing exists at `path`. Existing files keep
/// their contents; missing parent directories are created.
pub fn create_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new().create(true).append(true).open(path)?;
    info!(path = %path.display(), "created file");
    Ok(())
}

/// Create a directory together with any missing parents.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    info!(path = %path.display(), "created directory");
    Ok(())
}

/// Check that `name` is a single path component usable as a new entry name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(TreeError::InvalidPath(format!("invalid name {name:?}")));
    }
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        return Err(TreeError::InvalidPath(format!(
            "name must not contain a path separator: {name:?}"
        )));
    }
    Ok(())
}

/// Rename an entry within its parent directory. Returns the new path.
pub fn rename_in_place(path: &Path, new_name: &str) -> Result<PathBuf> {
    validate_name(new_name)?;
    let parent = path
        .parent()
        .ok_or_else(|| TreeError::InvalidPath(format!("cannot rename {}", path.display())))?;
    let dest = parent.join(new_name);
    if dest == path {
        return Ok(dest);
    }
    move_to_path(path, &dest)?;
    info!(from = %path.display(), to = %dest.display(), "renamed");
    Ok(dest)
}

/// Delete a file or directory. Directories are removed recursively;
/// symlinks are removed, never followed.
pub fn delete(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    info!(path = %path.display(), "deleted permanently");
    Ok(())
}

/// Resolve a name collision by appending `_copy`, `_copy2`, etc.
///
/// Returns a path that does not exist yet in the destination directory.
pub fn resolve_collision(dest: &Path) -> PathBuf {
    if !dest.exists() {
        return dest.to_path_buf();
    }

    let parent = dest.parent().unwrap_or(Path::new("."));
    let stem = dest.file_stem().unwrap_or_default();
    let ext = dest.extension();

    for i in 1..=1000 {
        let mut new_name = stem.to_os_string();
        if i == 1 {
            new_name.push("_copy");
        } else {
            new_name.push(format!("_copy{}", i));
        }
        if let Some(e) = ext {
            new_name.push(".");
            new_name.push(e);
        }
        let candidate = parent.join(&new_name);
        if !candidate.exists() {
            return candidate;
        }
    }

    dest.to_path_buf()
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| TreeError::InvalidPath(format!("no file name in {}", path.display())))
}

fn into_own_subtree(src: &Path, dest: &Path) -> TreeError {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!(
            "cannot place {} inside itself ({})",
            src.display(),
            dest.display()
        ),
    )
    .into()
}

/// Copy `src` into `dest_dir`, keeping its name.
///
/// Files overwrite an existing destination file; directories merge into an
/// existing destination directory. Copying an entry onto itself picks a
/// `_copy` name instead. Returns the final path.
pub fn copy_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let mut dest = dest_dir.join(file_name(src)?);
    if dest == src {
        dest = resolve_collision(&dest);
    }

    if fs::symlink_metadata(src)?.is_dir() {
        if dest.starts_with(src) {
            return Err(into_own_subtree(src, &dest));
        }
        copy_dir_recursive(src, &dest)?;
    } else {
        fs::copy(src, &dest)?;
    }
    info!(from = %src.display(), to = %dest.display(), "copied");
    Ok(dest)
}

/// Internal recursive directory copy.
fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

/// Move `src` to exactly `dest`. Fails when `dest` already exists.
///
/// Uses `fs::rename` first (fast, same-device). Falls back to copy+delete
/// if rename fails (cross-device).
pub fn move_to_path(src: &Path, dest: &Path) -> Result<()> {
    if fs::symlink_metadata(dest).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        )
        .into());
    }
    let is_dir = fs::symlink_metadata(src)?.is_dir();
    if is_dir && dest.starts_with(src) {
        return Err(into_own_subtree(src, dest));
    }

    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    if is_dir {
        copy_dir_recursive(src, dest)?;
        fs::remove_dir_all(src)?;
    } else {
        fs::copy(src, dest)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

/// Move `src` into `dest_dir`, keeping its name. Returns the new path.
pub fn move_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !dest_dir.is_dir() {
        return Err(TreeError::NotADirectory(dest_dir.to_path_buf()));
    }
    let dest = dest_dir.join(file_name(src)?);
    if dest == src {
        return Ok(dest);
    }
    move_to_path(src, &dest)?;
    info!(from = %src.display(), to = %dest.display(), "moved");
    Ok(dest)
}
