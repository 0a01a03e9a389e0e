//! Filesystem status boundary contract.

use crate::BoxFuture;
use embed_preflight_shared::{RequestContext, Result};
use std::path::PathBuf;

/// Kind of a filesystem entry as reported by a status call.
///
/// Symbolic links are reported as such and not followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Directory.
    Directory,
    /// Regular file.
    File,
    /// Symbolic link.
    Symlink,
    /// Other / unknown.
    Other,
}

impl PathKind {
    /// Whether the entry is a real directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Lowercase name for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }
}

/// Boundary contract for filesystem status queries.
pub trait PathProbePort: Send + Sync {
    /// Return the kind of the entry at `path` without following symlinks.
    ///
    /// A missing or inaccessible path is an error (`core:not_found`,
    /// `core:permission_denied`, or `core:io`).
    fn stat(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<PathKind>>;
}
