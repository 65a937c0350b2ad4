//! Directory cache transfer
//!
//! Recursive directory copy used to stage a persisted build cache into the
//! local build directory. The copy never merges into or overwrites an
//! existing destination, and symbolic links are skipped.

use crate::error::{BuildError, Result};
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Copy the directory tree at `src` to `dst`.
///
/// Fails if `src` is missing or not a directory, or if `dst` already exists.
/// Regular files keep their content, permission bits and timestamps.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    let src = clean(src);
    let dst = clean(dst);

    let src_meta = fs::metadata(&src)?;
    if !src_meta.is_dir() {
        return Err(BuildError::NotADirectory(src));
    }

    match fs::symlink_metadata(&dst) {
        Ok(_) => return Err(BuildError::DestinationExists(dst)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    fs::create_dir_all(&dst)?;

    for entry in fs::read_dir(&src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_symlink() {
            tracing::trace!("Skipping symlink: {}", src_path.display());
        } else if file_type.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            copy_file(&src_path, &dst_path)?;
        } else {
            tracing::debug!("Skipping special file: {}", src_path.display());
        }
    }

    // applied last so a read-only source directory can still be filled
    fs::set_permissions(&dst, src_meta.permissions())?;

    Ok(())
}

/// Copy one regular file, flushing it to disk and carrying over
/// permission bits and access/modification times.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let src_meta = fs::metadata(src)?;
    let times = FileTimes::new()
        .set_accessed(src_meta.accessed()?)
        .set_modified(src_meta.modified()?);

    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;

    io::copy(&mut input, &mut output)?;
    output.sync_all()?;
    output.set_times(times)?;
    drop(output);

    fs::set_permissions(dst, src_meta.permissions())?;

    Ok(())
}

/// Lexically normalize a path: drop `.` segments and resolve `..` where possible.
pub(crate) fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(cleaned.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    cleaned.pop();
                } else if !cleaned.has_root() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }

    cleaned
}
