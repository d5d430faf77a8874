use super::actions::{self, Action, ActionError};
use super::document::GraphDocument;
use super::history::{History, UndoStep};

/// Single owner of the mutable document. All edits flow through
/// [`EditorStore::dispatch`], which checkpoints structural actions to the
/// undo history before they take effect.
#[derive(Clone, Debug, Default)]
pub struct EditorStore {
    pub document: GraphDocument,
    pub history: History,
}

impl EditorStore {
    pub fn new(document: GraphDocument) -> Self {
        Self {
            document,
            history: History::new(),
        }
    }

    /// Apply an action. On rejection the document and history are left
    /// untouched; callers surface the error as a transient notice.
    pub fn dispatch(&mut self, action: Action) -> Result<(), ActionError> {
        let next = actions::apply(&self.document, &action)?;
        if action.checkpoints() {
            self.history.checkpoint(&self.document.nodes);
        }
        if let Action::DeleteVersion { id } = &action
            && let Some(version) = self.document.version(id)
        {
            self.history.remember_deleted_version(version.clone());
        }
        self.document = next;
        Ok(())
    }

    /// Undo the most recent step. Restoring a deleted version takes
    /// priority over restoring a node snapshot. Returns false when there is
    /// nothing left to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_undo() {
            Some(UndoStep::Version(version)) => {
                self.document.saved_versions.push(version);
                true
            }
            Some(UndoStep::Nodes(nodes)) => {
                self.document.nodes = nodes;
                true
            }
            None => false,
        }
    }
}
