//! Incremental reconciliation of filesystem change notifications.
//!
//! `ChangeReconciler` consumes raw change events for one monitored
//! directory, resolves them against the live filesystem through the
//! [`NameResolver`] seam, mutates the owned [`ItemIndex`], and issues ordered
//! instructions to the [`ItemView`]. Events must be applied in arrival
//! order: a rename can only match the pending entry its preceding create
//! left behind.
//!
//! Lookup failures are never fatal here. Notifications race with the
//! filesystem (a file can be renamed or deleted before its create is
//! processed), so every miss degrades to a no-op or to a deferred pending
//! entry.

use std::cmp::Ordering;
use std::path::PathBuf;

use crossbeam_channel::Receiver;
use fnv::FnvHashSet;

use crate::index::ItemIndex;
use crate::resolve::NameResolver;
use crate::types::{ChangeEvent, ChangeKind, ItemId, ItemRecord, SortMode};
use crate::view::ItemView;

/// A detail column of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Name,
    Size,
    Modified,
    Created,
    Accessed,
    Attributes,
    FileType,
}

impl ColumnKind {
    /// Returns true if the column's value is derived from stat data and must
    /// be recomputed when the file changes.
    pub fn stat_derived(self) -> bool {
        matches!(
            self,
            Self::Size | Self::Modified | Self::Created | Self::Accessed | Self::Attributes
        )
    }
}

/// A queued request to recompute one column cell for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTask {
    pub item: ItemId,
    pub column: ColumnKind,
}

/// A filename observed as created but not yet resolvable to a record.
///
/// Created when a create notification arrives for a file that has already
/// been renamed (or is otherwise not yet resolvable); consumed when a later
/// rename or modification for the same filename materializes it, dropped
/// when a delete arrives first.
#[derive(Debug, Clone)]
struct PendingAdd {
    file_name: String,
}

/// Predicate deciding whether a record is filtered out of the view.
pub type FilterPredicate = Box<dyn Fn(&ItemRecord) -> bool>;

/// Keeps an [`ItemIndex`] and an [`ItemView`] synchronized with a stream of
/// change notifications for a single directory.
pub struct ChangeReconciler<R: NameResolver, V: ItemView> {
    directory: PathBuf,
    resolver: R,
    view: V,
    index: ItemIndex,
    pending: Vec<PendingAdd>,
    /// Filenames dropped into the view by a drag operation; these are
    /// appended rather than sorted-inserted when their create arrives.
    dropped: Vec<String>,
    insert_sorted: bool,
    sort_mode: SortMode,
    filter: Option<FilterPredicate>,
    hidden: FnvHashSet<ItemId>,
    active_columns: Vec<ColumnKind>,
    column_tasks: Vec<ColumnTask>,
}

impl<R: NameResolver, V: ItemView> ChangeReconciler<R, V> {
    /// Creates a reconciler for `directory` in append-insert mode with no
    /// filter and no active columns.
    pub fn new(directory: impl Into<PathBuf>, resolver: R, view: V) -> Self {
        Self {
            directory: directory.into(),
            resolver,
            view,
            index: ItemIndex::new(),
            pending: Vec::new(),
            dropped: Vec::new(),
            insert_sorted: false,
            sort_mode: SortMode::default(),
            filter: None,
            hidden: FnvHashSet::default(),
            active_columns: Vec::new(),
            column_tasks: Vec::new(),
        }
    }

    /// Enables or disables sorted-insert mode with the given sort key.
    pub fn set_sorted_insert(&mut self, enabled: bool, sort_mode: SortMode) {
        self.insert_sorted = enabled;
        self.sort_mode = sort_mode;
    }

    /// Installs the active filter predicate (true = filtered out).
    pub fn set_filter(&mut self, filter: FilterPredicate) {
        self.filter = Some(filter);
    }

    /// Removes the active filter predicate.
    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Sets the active detail columns.
    pub fn set_active_columns(&mut self, columns: Vec<ColumnKind>) {
        self.active_columns = columns;
    }

    /// Records a filename dropped into the view, so its upcoming create is
    /// appended instead of sorted-inserted.
    pub fn note_dropped_file(&mut self, file_name: impl Into<String>) {
        self.dropped.push(file_name.into());
    }

    /// The owned item index.
    #[inline]
    pub fn index(&self) -> &ItemIndex {
        &self.index
    }

    /// The driven view.
    #[inline]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the driven view.
    #[inline]
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Forwards a selection change to the index so `selected_size` stays
    /// exact.
    pub fn set_selected(&mut self, id: ItemId, selected: bool) {
        self.index.set_selected(id, selected);
    }

    /// Drains and returns the queued column recompute tasks.
    pub fn take_column_tasks(&mut self) -> Vec<ColumnTask> {
        std::mem::take(&mut self.column_tasks)
    }

    /// Number of unresolved pending additions.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of items currently hidden by the filter.
    #[inline]
    pub fn hidden_len(&self) -> usize {
        self.hidden.len()
    }

    /// Applies every event queued on `events`, in arrival order.
    pub fn drain(&mut self, events: &Receiver<ChangeEvent>) {
        while let Ok(event) = events.try_recv() {
            self.apply(event);
        }
    }

    /// Applies a single change event.
    pub fn apply(&mut self, event: ChangeEvent) {
        log::trace!("change event at {}: {:?}", event.timestamp, event.kind);
        match event.kind {
            ChangeKind::Created { name } => self.on_created(&name),
            ChangeKind::Deleted { name } => self.on_deleted(&name),
            ChangeKind::Renamed { old, new } => self.on_renamed(&old, &new),
            ChangeKind::Modified { name } => self.on_modified(&name),
        }
    }

    fn on_created(&mut self, name: &str) {
        let path = self.directory.join(name);
        match self.resolver.resolve(&path) {
            Some(record) => self.insert_resolved(record),
            None => {
                // The file may already have been renamed by the time the
                // create is processed. Keep the filename so a later rename
                // or modification can materialize it.
                log::debug!("create for {name} not resolvable yet, deferring");
                self.pending.push(PendingAdd {
                    file_name: name.to_string(),
                });
            }
        }
    }

    fn on_deleted(&mut self, name: &str) {
        if let Some(id) = self.index.find_by_name(name) {
            self.hidden.remove(&id);
            if let Some(position) = self.index.remove(id) {
                self.view.remove(position);
            }
        } else if let Some(slot) = self.pending_position(name) {
            // The item never materialized; nothing reached the view.
            self.pending.remove(slot);
        }
    }

    fn on_renamed(&mut self, old: &str, new: &str) {
        if let Some(slot) = self.pending_position(old) {
            // Create followed by an immediate rename: promote the pending
            // entry as a fresh item under its new name.
            self.pending.remove(slot);
            self.on_created(new);
            return;
        }

        let Some(id) = self.index.find_by_name(old) else {
            return;
        };

        let path = self.directory.join(new);
        match self.resolver.resolve(&path) {
            Some(resolved) => {
                self.index
                    .rename(id, resolved.display_name, resolved.file_name, resolved.identity);

                if let Some(position) = self.index.position_of(id) {
                    if let Some(record) = self.index.get(id) {
                        // The item's type may have changed with its name, so
                        // the icon and overlay are re-derived as well.
                        self.view.update_text(position, &record.display_name);
                        self.view.update_icon(position, &record.identity);
                        self.view.update_overlay(position, &record.identity);
                    }

                    let filtered = match (&self.filter, self.index.get(id)) {
                        (Some(filter), Some(record)) => filter(record),
                        _ => false,
                    };
                    if filtered {
                        if let Some(position) = self.index.hide(id) {
                            self.view.remove(position);
                        }
                        self.hidden.insert(id);
                    }
                }
            }
            None => {
                // Re-resolution failed; keep the item under its new name so
                // later notifications can still match it.
                self.index.rename_name_only(id, new);
            }
        }
    }

    fn on_modified(&mut self, name: &str) {
        let path = self.directory.join(name);

        if let Some(id) = self.index.find_by_name(name) {
            let stat = self.resolver.stat(&path);
            let resolved = stat.is_some();
            // On a failed stat the cached size is zeroed inside the index,
            // so a later delete cannot corrupt the directory total.
            self.index.update(id, stat);

            if resolved {
                if let Some(position) = self.index.position_of(id) {
                    if let Some(record) = self.index.get(id) {
                        self.view.update_overlay(position, &record.identity);
                    }
                }
                for column in &self.active_columns {
                    if column.stat_derived() {
                        self.column_tasks.push(ColumnTask {
                            item: id,
                            column: *column,
                        });
                    }
                }
            }
            return;
        }

        if let Some(slot) = self.pending_position(name) {
            // A modification can race ahead of the insertion of a freshly
            // created nonzero-size file. If the file resolves now, the
            // pending entry has materialized.
            if let Some(record) = self.resolver.resolve(&path) {
                self.pending.remove(slot);
                self.insert_resolved(record);
            }
        }
    }

    fn insert_resolved(&mut self, record: ItemRecord) {
        let dropped = self
            .dropped
            .iter()
            .position(|name| *name == record.file_name);
        if let Some(slot) = dropped {
            self.dropped.remove(slot);
        }

        // Dropped items keep their drop position at the end of the list even
        // in sorted-insert mode.
        let position = if self.insert_sorted && dropped.is_none() {
            Some(self.sorted_position(&record))
        } else {
            None
        };

        let (id, position) = self.index.insert(record, position);
        if let Some(record) = self.index.get(id) {
            self.view.insert(position, record);
        }
    }

    /// Computes the display position a record sorts to under the active key.
    fn sorted_position(&self, record: &ItemRecord) -> usize {
        self.index
            .iter_visible()
            .position(|(_, existing)| self.sort_mode.compare(record, existing) == Ordering::Less)
            .unwrap_or(self.index.visible_len())
    }

    fn pending_position(&self, name: &str) -> Option<usize> {
        self.pending
            .iter()
            .position(|pending| pending.file_name == name)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use chrono::Utc;

    use super::*;
    use crate::types::{FileAttributes, FileMetadata, ShellIdentity};
    use crate::view::{RecordingView, ViewInstruction};

    type Files = Rc<RefCell<HashMap<PathBuf, ItemRecord>>>;

    struct FakeResolver {
        files: Files,
    }

    impl NameResolver for FakeResolver {
        fn resolve(&self, path: &Path) -> Option<ItemRecord> {
            self.files.borrow().get(path).cloned()
        }

        fn stat(&self, path: &Path) -> Option<FileMetadata> {
            self.files.borrow().get(path).map(|r| r.metadata.clone())
        }
    }

    fn record(name: &str, size: u64, directory: bool) -> ItemRecord {
        let mut attributes = FileAttributes::empty();
        if directory {
            attributes |= FileAttributes::DIRECTORY;
        }
        ItemRecord {
            display_name: name.to_string(),
            file_name: name.to_string(),
            identity: ShellIdentity::new(name.as_bytes()),
            metadata: FileMetadata {
                attributes,
                size,
                ..FileMetadata::default()
            },
        }
    }

    fn reconciler() -> (ChangeReconciler<FakeResolver, RecordingView>, Files) {
        let files: Files = Rc::new(RefCell::new(HashMap::new()));
        let resolver = FakeResolver {
            files: files.clone(),
        };
        let reconciler = ChangeReconciler::new("/watched", resolver, RecordingView::new());
        (reconciler, files)
    }

    fn add_file(files: &Files, name: &str, size: u64) {
        files
            .borrow_mut()
            .insert(PathBuf::from("/watched").join(name), record(name, size, false));
    }

    fn created(name: &str) -> ChangeEvent {
        ChangeEvent::new(
            ChangeKind::Created {
                name: name.to_string(),
            },
            Utc::now(),
        )
    }

    fn deleted(name: &str) -> ChangeEvent {
        ChangeEvent::new(
            ChangeKind::Deleted {
                name: name.to_string(),
            },
            Utc::now(),
        )
    }

    fn renamed(old: &str, new: &str) -> ChangeEvent {
        ChangeEvent::new(
            ChangeKind::Renamed {
                old: old.to_string(),
                new: new.to_string(),
            },
            Utc::now(),
        )
    }

    fn modified(name: &str) -> ChangeEvent {
        ChangeEvent::new(
            ChangeKind::Modified {
                name: name.to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn resolvable_create_inserts_and_emits() {
        let (mut r, files) = reconciler();
        add_file(&files, "a.txt", 100);

        r.apply(created("a.txt"));

        assert_eq!(r.index().len(), 1);
        assert_eq!(r.index().total_size(), 100);
        assert_eq!(
            r.view_mut().take(),
            vec![ViewInstruction::Insert {
                position: 0,
                file_name: "a.txt".to_string()
            }]
        );
    }

    #[test]
    fn unresolvable_create_defers() {
        let (mut r, _files) = reconciler();

        r.apply(created("a.txt"));

        assert_eq!(r.index().len(), 0);
        assert_eq!(r.pending_len(), 1);
        assert!(r.view_mut().take().is_empty());
    }

    #[test]
    fn create_then_rename_before_resolution_yields_one_item() {
        let (mut r, files) = reconciler();

        // "a.txt" is renamed before the create can be resolved; only the
        // post-rename name exists on disk.
        r.apply(created("a.txt"));
        add_file(&files, "b.txt", 100);
        r.apply(renamed("a.txt", "b.txt"));

        assert_eq!(r.index().len(), 1);
        assert_eq!(r.pending_len(), 0);
        let id = r.index().find_by_name("b.txt").unwrap();
        assert_eq!(r.index().get(id).unwrap().size(), 100);
        assert_eq!(r.index().find_by_name("a.txt"), None);
        assert_eq!(
            r.view_mut().take(),
            vec![ViewInstruction::Insert {
                position: 0,
                file_name: "b.txt".to_string()
            }]
        );
    }

    #[test]
    fn delete_drops_unmatched_pending_create() {
        let (mut r, _files) = reconciler();

        r.apply(created("ghost.txt"));
        r.apply(deleted("ghost.txt"));

        assert_eq!(r.pending_len(), 0);
        assert_eq!(r.index().len(), 0);
        assert!(r.view_mut().take().is_empty());
    }

    #[test]
    fn delete_removes_item_and_emits() {
        let (mut r, files) = reconciler();
        add_file(&files, "a.txt", 10);
        add_file(&files, "b.txt", 20);
        r.apply(created("a.txt"));
        r.apply(created("b.txt"));
        r.view_mut().take();

        r.apply(deleted("a.txt"));

        assert_eq!(r.index().len(), 1);
        assert_eq!(r.index().total_size(), 20);
        assert_eq!(
            r.view_mut().take(),
            vec![ViewInstruction::Remove { position: 0 }]
        );
    }

    #[test]
    fn delete_of_unknown_name_is_noop() {
        let (mut r, _files) = reconciler();
        r.apply(deleted("missing.txt"));
        assert_eq!(r.index().len(), 0);
        assert!(r.view_mut().take().is_empty());
    }

    #[test]
    fn rename_updates_names_identity_and_view() {
        let (mut r, files) = reconciler();
        add_file(&files, "old.txt", 30);
        r.apply(created("old.txt"));
        r.view_mut().take();

        files.borrow_mut().remove(&PathBuf::from("/watched/old.txt"));
        add_file(&files, "new.txt", 30);
        r.apply(renamed("old.txt", "new.txt"));

        let id = r.index().find_by_name("new.txt").unwrap();
        let rec = r.index().get(id).unwrap();
        assert_eq!(rec.display_name, "new.txt");
        assert_eq!(rec.identity, ShellIdentity::new("new.txt".as_bytes()));
        assert_eq!(
            r.view_mut().take(),
            vec![
                ViewInstruction::UpdateText {
                    position: 0,
                    text: "new.txt".to_string()
                },
                ViewInstruction::UpdateIcon { position: 0 },
                ViewInstruction::UpdateOverlay { position: 0 },
            ]
        );
    }

    #[test]
    fn rename_without_resolution_keeps_item_under_new_name() {
        let (mut r, files) = reconciler();
        add_file(&files, "old.txt", 30);
        r.apply(created("old.txt"));
        r.view_mut().take();

        // The new name is not resolvable (renamed again already).
        files.borrow_mut().clear();
        r.apply(renamed("old.txt", "new.txt"));

        let id = r.index().find_by_name("new.txt").unwrap();
        let rec = r.index().get(id).unwrap();
        assert_eq!(rec.display_name, "new.txt");
        // Identity is kept until re-resolution succeeds.
        assert_eq!(rec.identity, ShellIdentity::new("old.txt".as_bytes()));
        assert!(r.view_mut().take().is_empty());
    }

    #[test]
    fn rename_of_unknown_name_is_noop() {
        let (mut r, files) = reconciler();
        add_file(&files, "b.txt", 5);
        r.apply(renamed("a.txt", "b.txt"));
        assert_eq!(r.index().len(), 0);
        assert!(r.view_mut().take().is_empty());
    }

    #[test]
    fn rename_into_active_filter_hides_item() {
        let (mut r, files) = reconciler();
        r.set_filter(Box::new(|record| record.file_name.ends_with(".tmp")));
        add_file(&files, "data.txt", 50);
        r.apply(created("data.txt"));
        r.view_mut().take();

        add_file(&files, "data.tmp", 50);
        r.apply(renamed("data.txt", "data.tmp"));

        let instructions = r.view_mut().take();
        assert_eq!(
            instructions.last(),
            Some(&ViewInstruction::Remove { position: 0 })
        );
        let id = r.index().find_by_name("data.tmp").unwrap();
        assert_eq!(r.index().position_of(id), None);
        assert_eq!(r.hidden_len(), 1);
        // The file still exists in the directory, so the total keeps it.
        assert_eq!(r.index().total_size(), 50);
    }

    #[test]
    fn modify_updates_aggregates_and_queues_stat_columns() {
        let (mut r, files) = reconciler();
        r.set_active_columns(vec![ColumnKind::Name, ColumnKind::Size, ColumnKind::Modified]);
        add_file(&files, "a.txt", 100);
        r.apply(created("a.txt"));
        let id = r.index().find_by_name("a.txt").unwrap();
        r.set_selected(id, true);
        r.view_mut().take();

        add_file(&files, "a.txt", 250);
        r.apply(modified("a.txt"));

        assert_eq!(r.index().total_size(), 250);
        assert_eq!(r.index().selected_size(), 250);
        assert_eq!(
            r.view_mut().take(),
            vec![ViewInstruction::UpdateOverlay { position: 0 }]
        );
        let tasks = r.take_column_tasks();
        assert_eq!(
            tasks,
            vec![
                ColumnTask {
                    item: id,
                    column: ColumnKind::Size
                },
                ColumnTask {
                    item: id,
                    column: ColumnKind::Modified
                },
            ]
        );
        assert!(r.take_column_tasks().is_empty());
    }

    #[test]
    fn modify_with_failed_stat_zeroes_size() {
        let (mut r, files) = reconciler();
        add_file(&files, "a.txt", 100);
        r.apply(created("a.txt"));
        r.view_mut().take();

        // Rapid create/delete: the file is gone by the time the
        // modification is processed.
        files.borrow_mut().clear();
        r.apply(modified("a.txt"));

        assert_eq!(r.index().total_size(), 0);
        let id = r.index().find_by_name("a.txt").unwrap();
        assert_eq!(r.index().get(id).unwrap().size(), 0);
        assert!(r.view_mut().take().is_empty());
        assert!(r.take_column_tasks().is_empty());
    }

    #[test]
    fn modify_promotes_resolvable_pending_create() {
        let (mut r, files) = reconciler();

        r.apply(created("fresh.bin"));
        assert_eq!(r.pending_len(), 1);

        add_file(&files, "fresh.bin", 4096);
        r.apply(modified("fresh.bin"));

        assert_eq!(r.pending_len(), 0);
        assert_eq!(r.index().len(), 1);
        assert_eq!(r.index().total_size(), 4096);
        assert_eq!(
            r.view_mut().take(),
            vec![ViewInstruction::Insert {
                position: 0,
                file_name: "fresh.bin".to_string()
            }]
        );
    }

    #[test]
    fn sorted_insert_places_items_by_active_key() {
        let (mut r, files) = reconciler();
        r.set_sorted_insert(true, SortMode::Name);

        add_file(&files, "banana.txt", 1);
        r.apply(created("banana.txt"));
        add_file(&files, "apple.txt", 1);
        r.apply(created("apple.txt"));
        files.borrow_mut().insert(
            PathBuf::from("/watched/subdir"),
            record("subdir", 0, true),
        );
        r.apply(created("subdir"));

        // Directories first, then files by name.
        let sub = r.index().find_by_name("subdir").unwrap();
        let apple = r.index().find_by_name("apple.txt").unwrap();
        let banana = r.index().find_by_name("banana.txt").unwrap();
        assert_eq!(r.index().position_of(sub), Some(0));
        assert_eq!(r.index().position_of(apple), Some(1));
        assert_eq!(r.index().position_of(banana), Some(2));
    }

    #[test]
    fn dropped_file_appends_despite_sorted_insert() {
        let (mut r, files) = reconciler();
        r.set_sorted_insert(true, SortMode::Name);
        add_file(&files, "m.txt", 1);
        r.apply(created("m.txt"));

        r.note_dropped_file("a.txt");
        add_file(&files, "a.txt", 1);
        r.apply(created("a.txt"));

        let a = r.index().find_by_name("a.txt").unwrap();
        assert_eq!(r.index().position_of(a), Some(1));

        // A later create that was not dropped sorts normally again.
        add_file(&files, "a2.txt", 1);
        r.apply(created("a2.txt"));
        let a2 = r.index().find_by_name("a2.txt").unwrap();
        assert_eq!(r.index().position_of(a2), Some(0));
    }

    #[test]
    fn drain_applies_queued_events_in_order() {
        let (mut r, files) = reconciler();
        let (tx, rx) = crate::monitor::event_channel();

        tx.send(created("a.txt")).unwrap();
        add_file(&files, "b.txt", 70);
        tx.send(renamed("a.txt", "b.txt")).unwrap();

        r.drain(&rx);

        assert_eq!(r.index().len(), 1);
        assert!(r.index().find_by_name("b.txt").is_some());
        assert_eq!(r.pending_len(), 0);
    }
}
