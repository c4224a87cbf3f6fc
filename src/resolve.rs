//! The shell-resolution seam.
//!
//! Resolution turns a path into a full item record (shell identity included);
//! stat re-reads metadata only. Both are synchronous and may briefly block on
//! filesystem access. Both fail softly: change notifications are inherently
//! racy with filesystem state, so a miss here is an expected condition the
//! reconciler recovers from, never an error.

use std::path::Path;

use crate::types::{FileMetadata, ItemRecord};

/// Resolves names against the live filesystem / shell namespace.
pub trait NameResolver {
    /// Resolves a path to a full item record, or `None` if the item cannot
    /// currently be resolved (already renamed, deleted, or inaccessible).
    fn resolve(&self, path: &Path) -> Option<ItemRecord>;

    /// Re-reads metadata for a path, or `None` if the file vanished.
    fn stat(&self, path: &Path) -> Option<FileMetadata>;
}
