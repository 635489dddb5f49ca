//! Path resolution and destination directory preparation.

use std::path::{Component, Path, PathBuf};

use cf_core::{Error, Result};

/// Resolves job paths to absolute form against a fixed base directory.
#[derive(Debug, Clone)]
pub struct ArtifactPathResolver {
    base: PathBuf,
}

impl ArtifactPathResolver {
    /// Resolver anchored at `base`, which is itself made absolute lexically.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: normalize(&base.into()),
        }
    }

    /// Resolver anchored at the process working directory.
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| Error::filesystem(".", e))?;
        Ok(Self::new(cwd))
    }

    /// The anchor directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve `path` against the base directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve(&self.base, path)
    }
}

/// Join `relative` onto `base` (absolute paths are kept as-is) and return
/// the canonical absolute form.
///
/// Symlinks are resolved for the longest existing prefix, so a file that
/// does not exist yet still resolves to the same form as its siblings.
pub fn resolve(base: &Path, relative: &Path) -> PathBuf {
    let joined = if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        base.join(relative)
    };
    canonicalize_existing_prefix(&normalize(&joined))
}

/// Create every missing directory above `path`.
///
/// Succeeds silently when the directory already exists.
///
/// # Errors
///
/// Returns [`Error::Filesystem`] for any other failure (permission denied,
/// a path component that is a file, disk full).
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => ensure_dir(dir),
        _ => Ok(()),
    }
}

/// Create `dir` and all of its missing ancestors.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    tracing::info!("Creating directory: {}", dir.display());
    std::fs::create_dir_all(dir).map_err(|e| Error::filesystem(dir, e))
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            canonicalize_existing_prefix(parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}
