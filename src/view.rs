//! The ordered-view seam.
//!
//! The reconciler drives a list control exclusively through this trait:
//! positional inserts, removals, and per-row refreshes. Positions always
//! refer to the current visible order at the time the instruction is issued.

use crate::types::{ItemRecord, ShellIdentity};

/// An ordered visual list receiving synchronization instructions.
pub trait ItemView {
    /// Inserts a row for `record` at `position`, shifting later rows down.
    fn insert(&mut self, position: usize, record: &ItemRecord);

    /// Removes the row at `position`.
    fn remove(&mut self, position: usize);

    /// Replaces the displayed text of the row at `position`.
    fn update_text(&mut self, position: usize, text: &str);

    /// Re-derives the icon for the row at `position` from its identity.
    fn update_icon(&mut self, position: usize, identity: &ShellIdentity);

    /// Re-derives the overlay state for the row at `position`.
    fn update_overlay(&mut self, position: usize, identity: &ShellIdentity);
}

/// A single recorded view instruction.
///
/// Mirrors the `ItemView` methods; used by [`RecordingView`] and by tests
/// that assert on the exact instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewInstruction {
    Insert { position: usize, file_name: String },
    Remove { position: usize },
    UpdateText { position: usize, text: String },
    UpdateIcon { position: usize },
    UpdateOverlay { position: usize },
}

/// An `ItemView` that records every instruction it receives.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub instructions: Vec<ViewInstruction>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns the recorded instructions.
    pub fn take(&mut self) -> Vec<ViewInstruction> {
        std::mem::take(&mut self.instructions)
    }
}

impl ItemView for RecordingView {
    fn insert(&mut self, position: usize, record: &ItemRecord) {
        self.instructions.push(ViewInstruction::Insert {
            position,
            file_name: record.file_name.clone(),
        });
    }

    fn remove(&mut self, position: usize) {
        self.instructions.push(ViewInstruction::Remove { position });
    }

    fn update_text(&mut self, position: usize, text: &str) {
        self.instructions.push(ViewInstruction::UpdateText {
            position,
            text: text.to_string(),
        });
    }

    fn update_icon(&mut self, position: usize, _identity: &ShellIdentity) {
        self.instructions
            .push(ViewInstruction::UpdateIcon { position });
    }

    fn update_overlay(&mut self, position: usize, _identity: &ShellIdentity) {
        self.instructions
            .push(ViewInstruction::UpdateOverlay { position });
    }
}
