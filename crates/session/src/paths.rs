//! Path utilities
//!
//! Failures are values: every fallible helper returns a `PathError` naming the
//! offending path and the system error. Callers decide whether to abort.

use std::fs::{self, DirBuilder, File};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use crate::error::PathError;

/// True iff `path` is a regular file that can be opened for reading
pub fn file_exists(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file()) && File::open(path).is_ok()
}

/// Create `path` as a zero-length file, truncating any existing content
pub fn create_empty_file(path: &Path) -> Result<(), PathError> {
    File::create(path)
        .map(drop)
        .map_err(|e| PathError::io(path, e))?;
    trace!(path = %path.display(), "created empty file");
    Ok(())
}

fn dir_builder() -> DirBuilder {
    #[allow(unused_mut)]
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }
    builder
}

/// Create exactly `path` as a directory
///
/// Succeeds if the directory was created or already existed. Fails when the
/// parent is missing, on any other system error, or when a non-directory
/// occupies `path`.
pub fn create_directory(path: &Path) -> Result<(), PathError> {
    match dir_builder().create(path) {
        Ok(()) => {
            debug!(path = %path.display(), "created directory");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if path.is_dir() {
                Ok(())
            } else {
                Err(PathError::NotADirectory {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(e) => Err(PathError::io(path, e)),
    }
}

/// Create `path` and every missing ancestor, left to right
///
/// Each prefix is created in order and "already exists as a directory" is
/// tolerated at every step, so the call is idempotent. Stops at the first
/// prefix that cannot be created; ancestors created before it are kept.
pub fn create_directory_with_parents(path: &Path) -> Result<(), PathError> {
    let mut prefix = PathBuf::new();
    for component in path.components() {
        prefix.push(component);
        match component {
            // root, drive prefix and "." always exist
            Component::Prefix(_) | Component::RootDir | Component::CurDir => continue,
            Component::ParentDir | Component::Normal(_) => create_directory(&prefix)?,
        }
    }
    Ok(())
}
