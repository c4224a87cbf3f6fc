//! Directory-view synchronization core for a shell file manager.
//!
//! This crate provides the non-visual state of a directory browsing view:
//! - An item index with display order and aggregate size bookkeeping
//! - Incremental reconciliation of filesystem change notifications
//! - Back/forward navigation history with popup-menu windowing
//! - A closed-tab stack with restore-by-position and restore-by-id
//!
//! Presentation (list control rendering, icon loading) and the platform
//! change-notification backend stay behind the `ItemView`, `NameResolver`
//! and `ChangeSource` traits.

pub mod error;
pub mod history;
pub mod index;
pub mod monitor;
pub mod reconciler;
pub mod resolve;
pub mod tabs;
pub mod types;
pub mod view;

// Re-export main types
pub use error::{Result, ShellViewError};
pub use history::{NavigationHistory, MENU_WINDOW};
pub use index::ItemIndex;
pub use monitor::{event_channel, ChangeSource, DirectoryMonitor, SubscriptionId};
pub use reconciler::{ChangeReconciler, ColumnKind, ColumnTask, FilterPredicate};
pub use resolve::NameResolver;
pub use tabs::{ClosedTabs, PreservedTab, TabOwner};
pub use types::{
    ChangeEvent, ChangeKind, FileAttributes, FileMetadata, ItemId, ItemRecord, ShellIdentity,
    SortMode,
};
pub use view::{ItemView, RecordingView, ViewInstruction};
