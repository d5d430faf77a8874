use std::fmt;

use super::document::{Category, GraphDocument, Node, NodeId, SavedVersion};

/// The closed set of document mutations. Every edit the editor can make
/// goes through one of these, applied purely by [`apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    AddNode {
        id: NodeId,
        label: String,
        x: f32,
        y: f32,
        color: String,
        description: String,
    },
    DeleteNode {
        id: NodeId,
    },
    MoveNode {
        id: NodeId,
        x: f32,
        y: f32,
    },
    /// Create the dependency edge from -> to ("to depends on from").
    Connect {
        from: NodeId,
        to: NodeId,
    },
    Disconnect {
        from: NodeId,
        to: NodeId,
    },
    /// Detach the arrowhead of from -> old_to and drop it on `target`.
    /// `None` (or an invalid target) leaves the edge removed.
    ReassignEdge {
        from: NodeId,
        old_to: NodeId,
        target: Option<NodeId>,
    },
    /// Commit label, color and description together from the node editor.
    EditNode {
        id: NodeId,
        label: String,
        color: String,
        description: String,
    },
    SetNodeColor {
        id: NodeId,
        color: String,
    },
    SaveVersion {
        id: String,
        name: String,
        created_at: i64,
    },
    RenameVersion {
        id: String,
        name: String,
    },
    DeleteVersion {
        id: String,
    },
    LoadVersion {
        id: String,
    },
    /// Replace the live node set wholesale (layout realign).
    ReplaceNodes {
        nodes: Vec<Node>,
    },
    /// Replace the whole document (import).
    ReplaceDocument {
        document: GraphDocument,
    },
    /// `index: None` appends a new category, `Some(i)` edits in place.
    UpsertCategory {
        index: Option<usize>,
        name: String,
        color: String,
    },
    DeleteCategory {
        index: usize,
    },
}

impl Action {
    /// Structural edits are checkpointed to the undo stack immediately
    /// before they apply. Drag moves and version/category bookkeeping are
    /// not.
    pub fn checkpoints(&self) -> bool {
        matches!(
            self,
            Action::AddNode { .. }
                | Action::DeleteNode { .. }
                | Action::Connect { .. }
                | Action::Disconnect { .. }
                | Action::ReassignEdge { .. }
                | Action::EditNode { .. }
                | Action::SetNodeColor { .. }
                | Action::LoadVersion { .. }
                | Action::ReplaceNodes { .. }
                | Action::ReplaceDocument { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionError {
    DuplicateEdge,
    CycleEdge,
    DuplicateNode(NodeId),
    UnknownNode(NodeId),
    UnknownEdge,
    UnknownVersion(String),
    EmptyLabel,
    EmptyName,
    BadCategoryIndex(usize),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::DuplicateEdge => write!(f, "Connection already exists"),
            ActionError::CycleEdge => write!(f, "Cannot create circular dependency"),
            ActionError::DuplicateNode(id) => write!(f, "A node with id {} already exists", id),
            ActionError::UnknownNode(id) => write!(f, "Unknown node: {}", id),
            ActionError::UnknownEdge => write!(f, "Connection does not exist"),
            ActionError::UnknownVersion(id) => write!(f, "Unknown version: {}", id),
            ActionError::EmptyLabel => write!(f, "Node name cannot be empty"),
            ActionError::EmptyName => write!(f, "Name cannot be empty"),
            ActionError::BadCategoryIndex(i) => write!(f, "No category at index {}", i),
        }
    }
}

impl std::error::Error for ActionError {}

/// Apply `action` to `doc`, producing the next document. The input is never
/// modified; rejected actions leave no trace.
pub fn apply(doc: &GraphDocument, action: &Action) -> Result<GraphDocument, ActionError> {
    let mut next = doc.clone();
    match action {
        Action::AddNode {
            id,
            label,
            x,
            y,
            color,
            description,
        } => {
            if next.contains_node(id) {
                return Err(ActionError::DuplicateNode(id.clone()));
            }
            next.nodes.push(Node {
                id: id.clone(),
                label: label.clone(),
                x: *x,
                y: *y,
                color: color.clone(),
                dependencies: Vec::new(),
                description: description.clone(),
            });
        }
        Action::DeleteNode { id } => {
            if !next.contains_node(id) {
                return Err(ActionError::UnknownNode(id.clone()));
            }
            next.nodes.retain(|n| &n.id != id);
            // No dangling references: strip the id from every dependency list
            for node in &mut next.nodes {
                node.dependencies.retain(|d| d != id);
            }
        }
        Action::MoveNode { id, x, y } => {
            let node = next
                .node_mut(id)
                .ok_or_else(|| ActionError::UnknownNode(id.clone()))?;
            node.x = *x;
            node.y = *y;
        }
        Action::Connect { from, to } => {
            if !next.contains_node(from) {
                return Err(ActionError::UnknownNode(from.clone()));
            }
            if !next.contains_node(to) {
                return Err(ActionError::UnknownNode(to.clone()));
            }
            if next.has_edge(from, to) {
                return Err(ActionError::DuplicateEdge);
            }
            if next.would_create_cycle(from, to) {
                return Err(ActionError::CycleEdge);
            }
            if let Some(node) = next.node_mut(to) {
                node.dependencies.push(from.clone());
            }
        }
        Action::Disconnect { from, to } => {
            if !next.has_edge(from, to) {
                return Err(ActionError::UnknownEdge);
            }
            if let Some(node) = next.node_mut(to) {
                node.dependencies.retain(|d| d != from);
            }
        }
        Action::ReassignEdge {
            from,
            old_to,
            target,
        } => {
            if !next.has_edge(from, old_to) {
                return Err(ActionError::UnknownEdge);
            }
            // Validity of the new target is judged before the old edge is
            // detached; an invalid or missing target degrades to plain
            // removal (dropping the arrowhead nowhere deletes the edge).
            let accept = match target {
                Some(t) => {
                    t != from
                        && next.contains_node(t)
                        && !next.has_edge(from, t)
                        && !next.would_create_cycle(from, t)
                }
                None => false,
            };
            if let Some(node) = next.node_mut(old_to) {
                node.dependencies.retain(|d| d != from);
            }
            if accept
                && let Some(t) = target
                && let Some(node) = next.node_mut(t)
            {
                node.dependencies.push(from.clone());
            }
        }
        Action::EditNode {
            id,
            label,
            color,
            description,
        } => {
            let trimmed = label.trim();
            if trimmed.is_empty() {
                return Err(ActionError::EmptyLabel);
            }
            let node = next
                .node_mut(id)
                .ok_or_else(|| ActionError::UnknownNode(id.clone()))?;
            node.label = trimmed.to_string();
            node.color = color.clone();
            node.description = description.clone();
        }
        Action::SetNodeColor { id, color } => {
            let node = next
                .node_mut(id)
                .ok_or_else(|| ActionError::UnknownNode(id.clone()))?;
            node.color = color.clone();
        }
        Action::SaveVersion {
            id,
            name,
            created_at,
        } => {
            next.saved_versions.push(SavedVersion {
                id: id.clone(),
                name: name.clone(),
                nodes: doc.nodes.clone(),
                created_at: *created_at,
            });
        }
        Action::RenameVersion { id, name } => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ActionError::EmptyName);
            }
            let version = next
                .saved_versions
                .iter_mut()
                .find(|v| &v.id == id)
                .ok_or_else(|| ActionError::UnknownVersion(id.clone()))?;
            version.name = trimmed.to_string();
        }
        Action::DeleteVersion { id } => {
            if next.version(id).is_none() {
                return Err(ActionError::UnknownVersion(id.clone()));
            }
            next.saved_versions.retain(|v| &v.id != id);
        }
        Action::LoadVersion { id } => {
            let version = next
                .version(id)
                .ok_or_else(|| ActionError::UnknownVersion(id.clone()))?;
            next.nodes = version.nodes.clone();
        }
        Action::ReplaceNodes { nodes } => {
            next.nodes = nodes.clone();
        }
        Action::ReplaceDocument { document } => {
            next = document.clone();
        }
        Action::UpsertCategory { index, name, color } => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ActionError::EmptyName);
            }
            match index {
                Some(i) => {
                    let slot = next
                        .categories
                        .get_mut(*i)
                        .ok_or(ActionError::BadCategoryIndex(*i))?;
                    slot.name = trimmed.to_string();
                    slot.color = color.clone();
                }
                None => next.categories.push(Category {
                    name: trimmed.to_string(),
                    color: color.clone(),
                }),
            }
        }
        Action::DeleteCategory { index } => {
            if *index >= next.categories.len() {
                return Err(ActionError::BadCategoryIndex(*index));
            }
            next.categories.remove(*index);
        }
    }
    Ok(next)
}
