//! File system utilities for bundle assembly.
//!
//! Provides safe file operations with automatic directory creation,
//! symlink preservation, and path-carrying error context.

use std::fs;
use std::path::{Path, PathBuf};

use crate::bail;
use crate::bundler::error::{Context, ErrorExt, Result};

/// Outcome of an idempotent copy into a destination directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CopyOutcome {
    /// The file was copied to this destination path.
    Copied(PathBuf),
    /// A file of the same basename already existed; nothing was written.
    AlreadyPresent(PathBuf),
}

/// Removes the directory and its contents if it exists.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).fs_context("removing directory", path)?;
    }
    Ok(())
}

/// Copies a regular file, creating any parent directories of the
/// destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("{} does not exist", from.display());
    }
    if !from.is_file() {
        bail!("{} is not a file", from.display());
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir).fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).fs_context("copying file", to)?;
    Ok(())
}

/// Copies `from` into `dest_dir` keyed by basename; no-op when a file of
/// that name is already present.
///
/// This makes overlapping dependency sets from multiple executables safe:
/// each library lands exactly once and is never clobbered. Mode is carried
/// by the copy itself; the modification time is restored afterwards so
/// identity checks by basename stay meaningful.
pub fn copy_file_if_absent(from: &Path, dest_dir: &Path) -> Result<CopyOutcome> {
    let name = from.file_name().context("source path has no file name")?;
    let dest = dest_dir.join(name);
    if dest.exists() {
        return Ok(CopyOutcome::AlreadyPresent(dest));
    }

    fs::copy(from, &dest).fs_context("copying library", from)?;

    let modified = fs::metadata(from)
        .fs_context("reading metadata", from)?
        .modified()
        .fs_context("reading modification time", from)?;
    let dest_file = fs::OpenOptions::new()
        .write(true)
        .open(&dest)
        .fs_context("opening copied file", &dest)?;
    dest_file
        .set_modified(modified)
        .fs_context("restoring modification time", &dest)?;

    Ok(CopyOutcome::Copied(dest))
}

/// Makes a file executable (chmod 755).
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .fs_context("reading metadata", path)?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).fs_context("setting permissions", path)?;
    Ok(())
}

/// Recursively copies a directory, creating any parent directories of the
/// destination path as necessary.
///
/// Symlinks are recreated as symlinks, not followed. Entries are visited in
/// name order so repeated runs produce identical trees.
pub fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("{} does not exist", from.display());
    }
    if !from.is_dir() {
        bail!("{} is not a directory", from.display());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).fs_context("creating directory", parent)?;
    }

    for entry in walkdir::WalkDir::new(from).sort_by_file_name() {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
            std::os::unix::fs::symlink(&target, &dest_path)
                .fs_context("creating symlink", &dest_path)?;
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
        } else {
            fs::copy(entry.path(), &dest_path).fs_context("copying file", &dest_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_if_absent_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("libx.so.1");
        let dest_dir = temp.path().join("lib");
        fs::write(&src, b"first").unwrap();
        fs::create_dir_all(&dest_dir).unwrap();

        let first = copy_file_if_absent(&src, &dest_dir).unwrap();
        assert!(matches!(first, CopyOutcome::Copied(_)));

        fs::write(&src, b"second").unwrap();
        let second = copy_file_if_absent(&src, &dest_dir).unwrap();
        assert!(matches!(second, CopyOutcome::AlreadyPresent(_)));
        // the already-present file is never clobbered
        assert_eq!(fs::read(dest_dir.join("libx.so.1")).unwrap(), b"first");
    }

    #[test]
    fn copy_if_absent_preserves_mtime() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("liby.so");
        let dest_dir = temp.path().join("lib");
        fs::write(&src, b"lib").unwrap();
        fs::create_dir_all(&dest_dir).unwrap();

        let src_mtime = fs::metadata(&src).unwrap().modified().unwrap();
        copy_file_if_absent(&src, &dest_dir).unwrap();
        let dest_mtime = fs::metadata(dest_dir.join("liby.so"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(src_mtime, dest_mtime);
    }

    #[test]
    fn copy_dir_preserves_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("plugins");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("libplug.so"), b"plugin").unwrap();
        std::os::unix::fs::symlink("libplug.so", src.join("libplug.so.0")).unwrap();

        let dest = temp.path().join("out/plugins");
        copy_dir(&src, &dest).unwrap();

        assert!(dest.join("libplug.so").is_file());
        assert!(dest.join("nested").is_dir());
        assert!(dest.join("libplug.so.0").is_symlink());
        assert_eq!(
            fs::read_link(dest.join("libplug.so.0")).unwrap(),
            PathBuf::from("libplug.so")
        );
    }

    #[test]
    fn copy_dir_rejects_missing_source() {
        let temp = TempDir::new().unwrap();
        assert!(copy_dir(&temp.path().join("ghost"), &temp.path().join("out")).is_err());
    }
}
