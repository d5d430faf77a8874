use super::document::{Node, SavedVersion};

/// Most-recent-N bound for both undo stacks.
pub const UNDO_DEPTH: usize = 20;

/// What a single undo step restores.
#[derive(Clone, Debug, PartialEq)]
pub enum UndoStep {
    Nodes(Vec<Node>),
    Version(SavedVersion),
}

/// Bounded undo state: full node-array snapshots for structural edits, plus
/// a separate stack of deleted versions. Deleted versions are restored
/// before node snapshots, so undoing a version deletion always wins over
/// undoing a graph edit.
#[derive(Clone, Debug, Default)]
pub struct History {
    snapshots: Vec<Vec<Node>>,
    deleted_versions: Vec<SavedVersion>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a deep snapshot of the node set. Called immediately before a
    /// structural mutation, never mid-drag.
    pub fn checkpoint(&mut self, nodes: &[Node]) {
        self.snapshots.push(nodes.to_vec());
        if self.snapshots.len() > UNDO_DEPTH {
            let excess = self.snapshots.len() - UNDO_DEPTH;
            self.snapshots.drain(..excess);
        }
    }

    pub fn remember_deleted_version(&mut self, version: SavedVersion) {
        self.deleted_versions.push(version);
        if self.deleted_versions.len() > UNDO_DEPTH {
            let excess = self.deleted_versions.len() - UNDO_DEPTH;
            self.deleted_versions.drain(..excess);
        }
    }

    pub fn pop_undo(&mut self) -> Option<UndoStep> {
        if let Some(version) = self.deleted_versions.pop() {
            return Some(UndoStep::Version(version));
        }
        self.snapshots.pop().map(UndoStep::Nodes)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty() && self.deleted_versions.is_empty()
    }
}
