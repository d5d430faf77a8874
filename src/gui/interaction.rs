use crate::graph_utils::document::NodeId;

/// Movement (in screen pixels) past which a right-press on a node becomes a
/// drag-to-connect instead of a context-menu request.
pub const RIGHT_DRAG_THRESHOLD: f32 = 5.0;

/// Canvas interaction states. One value of this enum fully describes what
/// the pointer is currently doing; the frontend feeds [`Event`]s in and
/// executes the returned [`Command`]s.
#[derive(Clone, Debug, PartialEq)]
pub enum Interaction {
    Idle,
    DraggingNode { id: NodeId },
    Panning,
    /// Connection mode, waiting for the source node.
    PickingSource,
    /// Connection mode, source chosen, waiting for the target.
    PickingTarget { source: NodeId },
    /// Right button held on a node, not yet past the drag threshold.
    RightPressed { id: NodeId, origin: (f32, f32) },
    /// Right-dragging a new connection out of a node.
    DrawingEdge { from: NodeId },
    /// Dragging the arrowhead of an existing edge.
    DraggingArrowhead { from: NodeId, to: NodeId },
    EditingNode { id: NodeId },
    EditingVersionName { id: String },
    EditingCategory { index: Option<usize> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    PrimaryPressNode { id: NodeId },
    PrimaryPressCanvas,
    SecondaryPressNode { id: NodeId, screen: (f32, f32) },
    PointerMove {
        world: (f32, f32),
        screen: (f32, f32),
        screen_delta: (f32, f32),
    },
    /// Pointer button released; `over` is the node under the pointer, if any.
    PointerRelease { over: Option<NodeId> },
    /// A resolved click on a node while connection mode is active.
    ClickNode { id: NodeId },
    DoubleClickNode { id: NodeId },
    ArrowheadPress { from: NodeId, to: NodeId },
    ToggleConnectMode,
    BeginVersionRename { id: String },
    BeginCategoryEdit { index: Option<usize> },
    /// The open modal or inline editor finished (saved or cancelled).
    FinishEdit,
    Escape,
}

/// Side effects the frontend performs in response to a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SelectNode { id: NodeId },
    ClearSelection,
    CloseContextMenu,
    /// Live position update while a node drag is in progress.
    MoveNode { id: NodeId, x: f32, y: f32 },
    PanBy { dx: f32, dy: f32 },
    /// Ask the store to create the edge from -> to; rejections become
    /// transient notices.
    RequestConnect { from: NodeId, to: NodeId },
    /// Ask the store to reattach (or, with no valid target, remove) an edge.
    RequestReassign {
        from: NodeId,
        old_to: NodeId,
        target: Option<NodeId>,
    },
    OpenNodeMenu { id: NodeId, screen: (f32, f32) },
    OpenNodeEditor { id: NodeId },
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::Idle
    }
}

impl Interaction {
    /// Whether connection mode (click source, click target) is active.
    pub fn connect_mode(&self) -> bool {
        matches!(
            self,
            Interaction::PickingSource | Interaction::PickingTarget { .. }
        )
    }

    /// Advance the machine by one event, returning the next state and the
    /// commands the frontend should carry out.
    pub fn on_event(self, event: Event) -> (Interaction, Vec<Command>) {
        use Interaction::*;
        match (self, event) {
            // --- idle -----------------------------------------------------
            (Idle, Event::PrimaryPressNode { id }) => (
                DraggingNode { id: id.clone() },
                vec![Command::SelectNode { id }, Command::CloseContextMenu],
            ),
            (Idle, Event::PrimaryPressCanvas) => (
                Panning,
                vec![Command::ClearSelection, Command::CloseContextMenu],
            ),
            (Idle, Event::SecondaryPressNode { id, screen }) => (
                RightPressed { id, origin: screen },
                vec![Command::CloseContextMenu],
            ),
            (Idle, Event::DoubleClickNode { id }) => (
                EditingNode { id: id.clone() },
                vec![Command::OpenNodeEditor { id }],
            ),
            (Idle, Event::ArrowheadPress { from, to }) => (DraggingArrowhead { from, to }, vec![]),
            (Idle, Event::ToggleConnectMode) => (PickingSource, vec![]),
            (Idle, Event::BeginVersionRename { id }) => (EditingVersionName { id }, vec![]),
            (Idle, Event::BeginCategoryEdit { index }) => (EditingCategory { index }, vec![]),

            // --- dragging a node ------------------------------------------
            (DraggingNode { id }, Event::PointerMove { world, .. }) => {
                let cmd = Command::MoveNode {
                    id: id.clone(),
                    x: world.0,
                    y: world.1,
                };
                (DraggingNode { id }, vec![cmd])
            }
            (DraggingNode { .. }, Event::PointerRelease { .. }) => (Idle, vec![]),
            (DraggingNode { .. }, Event::Escape) => (Idle, vec![]),

            // --- panning --------------------------------------------------
            (Panning, Event::PointerMove { screen_delta, .. }) => (
                Panning,
                vec![Command::PanBy {
                    dx: screen_delta.0,
                    dy: screen_delta.1,
                }],
            ),
            (Panning, Event::PointerRelease { .. }) => (Idle, vec![]),
            (Panning, Event::Escape) => (Idle, vec![]),

            // --- connection mode ------------------------------------------
            (PickingSource, Event::ClickNode { id }) => (PickingTarget { source: id }, vec![]),
            (PickingSource, Event::ToggleConnectMode) => (Idle, vec![]),
            (PickingSource, Event::Escape) => (Idle, vec![]),
            (PickingTarget { source }, Event::ClickNode { id }) => {
                if source == id {
                    // Clicking the source again cancels the selection
                    (PickingSource, vec![])
                } else {
                    (
                        PickingSource,
                        vec![Command::RequestConnect {
                            from: source,
                            to: id,
                        }],
                    )
                }
            }
            (PickingTarget { .. }, Event::ToggleConnectMode) => (Idle, vec![]),
            (PickingTarget { .. }, Event::Escape) => (PickingSource, vec![]),

            // --- right press: menu vs. drag-to-connect --------------------
            (RightPressed { id, origin }, Event::PointerMove { screen, .. }) => {
                let dx = screen.0 - origin.0;
                let dy = screen.1 - origin.1;
                if (dx * dx + dy * dy).sqrt() >= RIGHT_DRAG_THRESHOLD {
                    (DrawingEdge { from: id }, vec![])
                } else {
                    (RightPressed { id, origin }, vec![])
                }
            }
            (RightPressed { id, origin }, Event::PointerRelease { .. }) => {
                (Idle, vec![Command::OpenNodeMenu { id, screen: origin }])
            }
            (RightPressed { .. }, Event::Escape) => (Idle, vec![]),

            // --- drawing a new connection by right drag -------------------
            (DrawingEdge { from }, Event::PointerMove { .. }) => (DrawingEdge { from }, vec![]),
            (DrawingEdge { from }, Event::PointerRelease { over }) => match over {
                Some(target) if target != from => (
                    Idle,
                    vec![Command::RequestConnect {
                        from,
                        to: target,
                    }],
                ),
                _ => (Idle, vec![]),
            },
            (DrawingEdge { .. }, Event::Escape) => (Idle, vec![]),

            // --- dragging an existing arrowhead ---------------------------
            (DraggingArrowhead { from, to }, Event::PointerMove { .. }) => {
                (DraggingArrowhead { from, to }, vec![])
            }
            (DraggingArrowhead { from, to }, Event::PointerRelease { over }) => {
                if over.as_deref() == Some(to.as_str()) {
                    // Dropped back on the current dependent: nothing changes
                    (Idle, vec![])
                } else {
                    (
                        Idle,
                        vec![Command::RequestReassign {
                            from,
                            old_to: to,
                            target: over,
                        }],
                    )
                }
            }
            (DraggingArrowhead { .. }, Event::Escape) => (Idle, vec![]),

            // --- modal / inline editors -----------------------------------
            (EditingNode { .. }, Event::FinishEdit) => (Idle, vec![]),
            (EditingNode { .. }, Event::Escape) => (Idle, vec![]),
            (EditingVersionName { .. }, Event::FinishEdit) => (Idle, vec![]),
            (EditingVersionName { .. }, Event::Escape) => (Idle, vec![]),
            (EditingCategory { .. }, Event::FinishEdit) => (Idle, vec![]),
            (EditingCategory { .. }, Event::Escape) => (Idle, vec![]),

            // Anything else leaves the state untouched
            (state, _) => (state, vec![]),
        }
    }
}
