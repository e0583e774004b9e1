use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use rustc_hash::FxHashSet;

/// A directory could not be read for a reason other than missing permissions.
#[derive(Debug, thiserror::Error)]
#[error("failed to read directory '{}': {source}", path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A directory found while listing or walking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: OsString,
    /// Distance from the starting directory; direct children are at depth 1
    pub depth: usize,
    pub symlink: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Treat symlinks that resolve to directories as directories
    pub follow_symlinks: bool,
    /// Optional: max depth to descend during a walk (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            max_depth: None,
        }
    }
}

/// Permission problems and directories that vanish mid-walk are skipped
/// instead of aborting the whole scan.
fn is_skippable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
    )
}

fn read_dirs(dir: &Path, depth: usize, config: &ScanConfig) -> Result<Vec<DirEntry>, ScanError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if is_skippable(&e) => {
            debug!("Skipping '{}': {}", dir.display(), e);
            return Ok(Vec::new());
        },
        Err(e) => {
            return Err(ScanError {
                path: dir.to_path_buf(),
                source: e,
            });
        },
    };

    let mut dirs = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_skippable(&e) => continue,
            Err(e) => {
                return Err(ScanError {
                    path: dir.to_path_buf(),
                    source: e,
                });
            },
        };

        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        let symlink = file_type.is_symlink();
        let is_dir = if symlink {
            config.follow_symlinks
                && fs::metadata(entry.path()).is_ok_and(|meta| meta.is_dir())
        } else {
            file_type.is_dir()
        };

        if is_dir {
            dirs.push(DirEntry {
                path: entry.path(),
                name: entry.file_name(),
                depth,
                symlink,
            });
        }
    }

    Ok(dirs)
}

/// Lists the direct child directories of `dir`, sorted ascending by name.
///
/// An unreadable `dir` yields an empty listing rather than an error when the
/// cause is a permission problem.
pub fn list_dirs(dir: &Path, config: &ScanConfig) -> Result<Vec<DirEntry>, ScanError> {
    let mut dirs = read_dirs(dir, 1, config)?;
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(dirs)
}

/// Walks every directory below `base` (not `base` itself) and hands each one
/// to `visit`. Entries of one directory are visited in name order; callers
/// sort what they keep.
///
/// Each real directory is descended into at most once per walk, keyed by its
/// canonical path, so symlink cycles terminate. When a directory is reachable
/// under several names, the one met first in a depth-first walk over
/// name-sorted entries claims it; other aliases are visited but not descended
/// into. A `prune` directory is likewise visited but never descended into.
pub fn walk<F>(
    base: &Path,
    config: &ScanConfig,
    prune: Option<&Path>,
    mut visit: F,
) -> Result<(), ScanError>
where
    F: FnMut(&DirEntry),
{
    let mut visited = FxHashSet::default();

    for seen in std::iter::once(base).chain(prune) {
        if let Ok(real) = fs::canonicalize(seen) {
            visited.insert(real);
        }
    }

    let mut stack = vec![(base.to_path_buf(), 0, false)];

    while let Some((dir, depth, symlink)) = stack.pop() {
        if depth > 0 {
            match fs::canonicalize(&dir) {
                Ok(real) => {
                    if !visited.insert(real) {
                        if symlink {
                            debug!(
                                "Symlink '{}' points into an already walked directory",
                                dir.display()
                            );
                        }
                        continue;
                    }
                },
                Err(e) => {
                    debug!("Not descending into '{}': {}", dir.display(), e);
                    continue;
                },
            }
        }

        let mut entries = read_dirs(&dir, depth + 1, config)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        for entry in &entries {
            visit(entry);
        }

        // reversed so the first name is popped, and claims its directory, first
        for entry in entries.into_iter().rev() {
            let under_limit = config
                .max_depth
                .is_none_or(|max| entry.depth < max);
            if under_limit {
                stack.push((entry.path, entry.depth, entry.symlink));
            }
        }
    }

    Ok(())
}
