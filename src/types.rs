//! Value types shared across the view-synchronization core.
//!
//! These are plain owned types: cloning a `ShellIdentity` is a deep copy and
//! dropping one releases it, so containers can hold them by value without any
//! manual ownership protocol.

use std::cmp::Ordering;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable internal identifier for an item in a directory view.
///
/// Assigned by [`crate::index::ItemIndex`] on insertion and never reused for
/// a different item within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub(crate) u64);

impl ItemId {
    /// Returns the raw identifier value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque, filesystem-assigned identity token for an item or location.
///
/// The shell layer produces these when resolving a name; the core only
/// stores, clones and compares them. Each container slot owns its token
/// exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShellIdentity(Vec<u8>);

impl ShellIdentity {
    /// Wraps a raw identity token.
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Derives an identity token from a path.
    ///
    /// Convenience for resolver implementations and tests; real shell
    /// backends assign their own token format.
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned().into_bytes())
    }

    /// Returns the raw token bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

bitflags::bitflags! {
    /// File attribute bitset carried on every item record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FileAttributes: u32 {
        const READ_ONLY  = 0x0001;
        const HIDDEN     = 0x0002;
        const SYSTEM     = 0x0004;
        const DIRECTORY  = 0x0010;
        const ARCHIVE    = 0x0020;
        const TEMPORARY  = 0x0100;
        const COMPRESSED = 0x0800;
        const ENCRYPTED  = 0x4000;
    }
}

/// Stat-derived metadata for a single item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub attributes: FileAttributes,
    /// Size in bytes. Zero for directories.
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
}

impl FileMetadata {
    /// Returns true if the directory attribute is set.
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }
}

/// A fully resolved item as stored in the index.
///
/// `display_name` is what the view shows; `file_name` is the on-disk name
/// used to match change notifications. The two can differ (hidden
/// extensions, localized names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub display_name: String,
    pub file_name: String,
    pub identity: ShellIdentity,
    pub metadata: FileMetadata,
}

impl ItemRecord {
    /// Returns true if this record is a directory.
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.metadata.is_directory()
    }

    /// Returns the item size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.metadata.size
    }

    /// Returns the filename extension in lowercase, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

/// Raw filesystem change notification kind.
///
/// Names are relative to the monitored directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A file or directory was created.
    Created { name: String },
    /// A file or directory was deleted.
    Deleted { name: String },
    /// A file or directory was renamed within the directory.
    Renamed { old: String, new: String },
    /// Attributes or contents changed.
    Modified { name: String },
}

/// A single change notification as delivered by the monitoring backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Assigned by the notification source. Informational only; events are
    /// applied strictly in arrival order.
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, timestamp: DateTime<Utc>) -> Self {
        Self { kind, timestamp }
    }
}

/// Active sort key for sorted-insert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    Name,
    Size,
    Modified,
    FileType,
}

impl SortMode {
    /// Compares two records under this sort key.
    ///
    /// Directories always order before files; ties fall back to a
    /// case-insensitive name comparison so the order is total.
    pub fn compare(self, a: &ItemRecord, b: &ItemRecord) -> Ordering {
        match (a.is_directory(), b.is_directory()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        let by_key = match self {
            SortMode::Name => Ordering::Equal,
            SortMode::Size => a.size().cmp(&b.size()),
            SortMode::Modified => a.metadata.modified.cmp(&b.metadata.modified),
            SortMode::FileType => a.extension().cmp(&b.extension()),
        };

        by_key.then_with(|| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        })
    }
}
