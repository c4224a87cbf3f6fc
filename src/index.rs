//! Authoritative item storage for a directory view.
//!
//! `ItemIndex` owns the id → record mapping, the visible display order, the
//! selection set, and the two aggregate sums (`total_size`,
//! `selected_size`). It is the only writer of the aggregates: every mutation
//! path pairs a subtract with a matching add inside the same operation, so
//! the sums never drift from the actual membership.
//!
//! Directories are excluded from both aggregates. The display order doubles
//! as the view position space: slot `i` in the order is row `i` in the list
//! control.

use fnv::{FnvHashMap, FnvHashSet};

use crate::types::{FileMetadata, ItemId, ItemRecord, ShellIdentity};

/// Id → record mapping with display order and aggregate size bookkeeping.
#[derive(Debug, Default)]
pub struct ItemIndex {
    items: FnvHashMap<ItemId, ItemRecord>,
    /// Visible display order. Hidden items have a record but no order slot.
    order: Vec<ItemId>,
    selected: FnvHashSet<ItemId>,
    total_size: u64,
    selected_size: u64,
    next_id: u64,
}

impl ItemIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record at the given display position (or appended when
    /// `position` is `None`), assigning a fresh identifier.
    ///
    /// Returns the identifier and the actual display position used.
    pub fn insert(&mut self, record: ItemRecord, position: Option<usize>) -> (ItemId, usize) {
        let id = ItemId(self.next_id);
        self.next_id += 1;

        if !record.is_directory() {
            self.total_size += record.size();
        }

        let position = position.unwrap_or(self.order.len()).min(self.order.len());
        self.order.insert(position, id);
        self.items.insert(id, record);

        (id, position)
    }

    /// Removes an item. Unknown ids are a no-op.
    ///
    /// Returns the vacated display position, or `None` when the id was
    /// unknown or the item was hidden.
    pub fn remove(&mut self, id: ItemId) -> Option<usize> {
        let record = self.items.remove(&id)?;

        if !record.is_directory() {
            self.total_size -= record.size();
            if self.selected.contains(&id) {
                self.selected_size -= record.size();
            }
        }
        self.selected.remove(&id);

        let position = self.order.iter().position(|&other| other == id);
        if let Some(position) = position {
            self.order.remove(position);
        }
        position
    }

    /// Re-synchronizes an item's metadata against a fresh stat result.
    ///
    /// The old size contribution is subtracted first; with `Some(metadata)`
    /// the new contribution is added and the metadata replaced, with `None`
    /// (the file vanished between notification and stat) the cached size is
    /// zeroed so the aggregates cannot be corrupted by a later removal.
    /// Unknown ids are a no-op.
    pub fn update(&mut self, id: ItemId, metadata: Option<FileMetadata>) {
        let Some(record) = self.items.get_mut(&id) else {
            return;
        };

        let selected = self.selected.contains(&id);
        if !record.is_directory() {
            self.total_size -= record.size();
            if selected {
                self.selected_size -= record.size();
            }
        }

        match metadata {
            Some(metadata) => {
                record.metadata = metadata;
                if !record.is_directory() {
                    self.total_size += record.size();
                    if selected {
                        self.selected_size += record.size();
                    }
                }
            }
            None => {
                record.metadata.size = 0;
            }
        }
    }

    /// Returns the record for an id.
    #[inline]
    pub fn get(&self, id: ItemId) -> Option<&ItemRecord> {
        self.items.get(&id)
    }

    /// Locates an item by its on-disk filename.
    ///
    /// Filenames are unique within a directory, so the first match wins.
    pub fn find_by_name(&self, file_name: &str) -> Option<ItemId> {
        self.items
            .iter()
            .find(|(_, record)| record.file_name == file_name)
            .map(|(&id, _)| id)
    }

    /// Returns the display position of a visible item.
    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Iterates visible records in display order.
    pub fn iter_visible(&self) -> impl Iterator<Item = (ItemId, &ItemRecord)> {
        self.order.iter().filter_map(|&id| {
            self.items.get(&id).map(|record| (id, record))
        })
    }

    /// Updates an item's names and identity after a rename. Sizes are
    /// untouched. Unknown ids are a no-op.
    pub fn rename(
        &mut self,
        id: ItemId,
        display_name: String,
        file_name: String,
        identity: ShellIdentity,
    ) {
        if let Some(record) = self.items.get_mut(&id) {
            record.display_name = display_name;
            record.file_name = file_name;
            record.identity = identity;
        }
    }

    /// Updates only the stored names, keeping the old identity.
    ///
    /// Used when a renamed item cannot currently be re-resolved.
    pub fn rename_name_only(&mut self, id: ItemId, name: &str) {
        if let Some(record) = self.items.get_mut(&id) {
            record.display_name = name.to_string();
            record.file_name = name.to_string();
        }
    }

    /// Marks an item selected or deselected, maintaining `selected_size`.
    pub fn set_selected(&mut self, id: ItemId, selected: bool) {
        let Some(record) = self.items.get(&id) else {
            return;
        };
        let changed = if selected {
            self.selected.insert(id)
        } else {
            self.selected.remove(&id)
        };
        if changed && !record.is_directory() {
            if selected {
                self.selected_size += record.size();
            } else {
                self.selected_size -= record.size();
            }
        }
    }

    /// Returns true if the item is currently selected.
    #[inline]
    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    /// Removes an item's display slot without removing the record.
    ///
    /// The record keeps contributing to `total_size` (the file still exists
    /// in the directory); the selection contribution is cleared since a
    /// hidden row cannot stay selected. Returns the vacated position.
    pub fn hide(&mut self, id: ItemId) -> Option<usize> {
        let position = self.order.iter().position(|&other| other == id)?;
        self.order.remove(position);
        self.set_selected(id, false);
        Some(position)
    }

    /// Number of items present, visible or hidden.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items are present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of visible items.
    #[inline]
    pub fn visible_len(&self) -> usize {
        self.order.len()
    }

    /// Sum of sizes of all present non-directory items.
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Sum of sizes of all selected non-directory items.
    #[inline]
    pub fn selected_size(&self) -> u64 {
        self.selected_size
    }
}
