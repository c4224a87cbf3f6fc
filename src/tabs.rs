//! Closed-tab preservation and restoration.
//!
//! When a tab is removed its state is captured as an immutable snapshot and
//! pushed onto a most-recently-closed-first stack. Snapshots can be restored
//! in LIFO order or by identifier from anywhere in the stack; restoring
//! removes the snapshot permanently.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::history::NavigationHistory;

/// Process-lifetime counter backing snapshot identifiers. Ids are
/// monotonically increasing and never reused.
static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable snapshot of a closed tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreservedTab {
    id: u64,
    history: NavigationHistory,
    /// The tab's position in the tab bar at the time it was closed.
    position: usize,
}

impl PreservedTab {
    /// Captures a snapshot of a tab's navigation state.
    pub fn new(history: &NavigationHistory, position: usize) -> Self {
        Self {
            id: NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed),
            history: history.clone(),
            position,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The preserved navigation history, cursor included.
    #[inline]
    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Materializes restored tabs.
pub trait TabOwner {
    /// Creates a new tab from a preserved snapshot.
    fn create_tab(&mut self, tab: &PreservedTab);
}

/// Stack of closed-tab snapshots, most recently closed first.
///
/// No capacity bound is enforced here; a menu layer may cap how many
/// entries it shows.
#[derive(Debug, Default)]
pub struct ClosedTabs {
    tabs: Vec<PreservedTab>,
}

impl ClosedTabs {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preserves a closing tab's state and returns the snapshot id.
    pub fn preserve(&mut self, history: &NavigationHistory, position: usize) -> u64 {
        let tab = PreservedTab::new(history, position);
        let id = tab.id;
        self.tabs.insert(0, tab);
        id
    }

    /// The preserved snapshots, most recently closed first.
    #[inline]
    pub fn tabs(&self) -> &[PreservedTab] {
        &self.tabs
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Restores the most recently closed tab. No-op when the stack is
    /// empty. Returns the restored snapshot id.
    pub fn restore_last(&mut self, owner: &mut dyn TabOwner) -> Option<u64> {
        if self.tabs.is_empty() {
            return None;
        }
        let tab = self.tabs.remove(0);
        owner.create_tab(&tab);
        Some(tab.id)
    }

    /// Restores the snapshot with the given id, wherever it sits in the
    /// stack. Unknown ids are a no-op with the stack unchanged.
    pub fn restore_by_id(&mut self, owner: &mut dyn TabOwner, id: u64) -> bool {
        let Some(slot) = self.tabs.iter().position(|tab| tab.id == id) else {
            return false;
        };
        let tab = self.tabs.remove(slot);
        owner.create_tab(&tab);
        true
    }
}
