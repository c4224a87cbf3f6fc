//! Back/forward navigation history for a browsing view.
//!
//! Entries are deep-cloned location tokens stored in a growable sequence.
//! A cursor partitions the sequence into back entries (before the current
//! one) and forward entries (after it). Appending after navigating back
//! discards the forward entries, as a browser would.
//!
//! Storage is unbounded; only the popup-menu views (`back_history`,
//! `forward_history`) are capped, at [`MENU_WINDOW`] entries per direction.

use serde::{Deserialize, Serialize};

use crate::types::ShellIdentity;

/// Maximum number of entries shown per direction in a history popup menu.
pub const MENU_WINDOW: usize = 10;

/// A truncating back/forward stack of visited locations.
///
/// `current` counts entries up to and including the current one: the
/// current entry sits at index `current - 1`, entries before it are the
/// back history, entries from `current` on are the forward history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationHistory {
    entries: Vec<ShellIdentity>,
    current: usize,
}

impl NavigationHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly visited location.
    ///
    /// Clones the location, discards any forward entries, appends, and
    /// makes the new entry current.
    pub fn add_entry(&mut self, location: &ShellIdentity) {
        self.entries.truncate(self.current);
        self.entries.push(location.clone());
        self.current = self.entries.len();
    }

    /// Navigates by `offset` entries (negative = back, positive = forward)
    /// and returns a clone of the now-current location.
    ///
    /// Returns `None` without moving when the target falls outside the
    /// stored history. This call commits the navigation.
    pub fn navigate(&mut self, offset: i64) -> Option<ShellIdentity> {
        let target = self.target(offset)?;
        self.current = target;
        Some(self.entries[self.current - 1].clone())
    }

    /// Returns a clone of the entry `offset` steps from the current one
    /// without moving the cursor. Used for previews and popup menus.
    pub fn peek(&self, offset: i64) -> Option<ShellIdentity> {
        let target = self.target(offset)?;
        Some(self.entries[target - 1].clone())
    }

    /// Number of entries behind the current one.
    pub fn back_len(&self) -> usize {
        self.current.saturating_sub(1)
    }

    /// Number of entries ahead of the current one.
    pub fn forward_len(&self) -> usize {
        self.entries.len() - self.current
    }

    /// Returns true if a back navigation is possible.
    #[inline]
    pub fn can_go_back(&self) -> bool {
        self.back_len() > 0
    }

    /// Returns true if a forward navigation is possible.
    #[inline]
    pub fn can_go_forward(&self) -> bool {
        self.forward_len() > 0
    }

    /// Up to [`MENU_WINDOW`] back entries, nearest first.
    pub fn back_history(&self) -> Vec<ShellIdentity> {
        self.entries[..self.back_len()]
            .iter()
            .rev()
            .take(MENU_WINDOW)
            .cloned()
            .collect()
    }

    /// Up to [`MENU_WINDOW`] forward entries, nearest first.
    pub fn forward_history(&self) -> Vec<ShellIdentity> {
        self.entries[self.current..]
            .iter()
            .take(MENU_WINDOW)
            .cloned()
            .collect()
    }

    /// Total number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates an offset and returns the cursor value it would commit.
    ///
    /// A target of 0 would point before the first entry, so the valid range
    /// is `1..=len`.
    fn target(&self, offset: i64) -> Option<usize> {
        let target = self.current as i64 + offset;
        if target < 1 || target > self.entries.len() as i64 {
            return None;
        }
        Some(target as usize)
    }
}
