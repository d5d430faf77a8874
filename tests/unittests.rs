use depsketch::graph_utils::actions::{Action, ActionError, apply};
use depsketch::graph_utils::document::{Category, GraphDocument, Node};
use depsketch::graph_utils::layout::{assign_layers, layered_layout};
use depsketch::graph_utils::routing::{EdgePath, edge_endpoints, route_edge};
use depsketch::graph_utils::store::EditorStore;
use depsketch::gui::interaction::{Command, Event, Interaction};
use depsketch::persistence::persist::{self, StoredDocument};
use depsketch::persistence::settings::AppSettings;

fn node(id: &str, deps: &[&str]) -> Node {
    Node {
        id: id.to_string(),
        label: id.to_string(),
        x: 0.0,
        y: 0.0,
        color: "#3b82f6".to_string(),
        dependencies: deps.iter().map(|d| d.to_string()).collect(),
        description: String::new(),
    }
}

fn doc_with(nodes: Vec<Node>) -> GraphDocument {
    GraphDocument {
        nodes,
        saved_versions: Vec::new(),
        categories: vec![Category {
            name: "Default".to_string(),
            color: "#3b82f6".to_string(),
        }],
    }
}

fn deps_of<'a>(doc: &'a GraphDocument, id: &str) -> &'a [String] {
    &doc.node(id).expect("node should exist").dependencies
}

#[test]
fn connect_rejects_cycle_and_leaves_graph_unchanged() {
    // c depends on b depends on a
    let doc = doc_with(vec![
        node("a", &[]),
        node("b", &["a"]),
        node("c", &["b"]),
    ]);
    let mut store = EditorStore::new(doc.clone());

    // a would come to depend on c, closing the loop
    let err = store
        .dispatch(Action::Connect {
            from: "c".to_string(),
            to: "a".to_string(),
        })
        .expect_err("cycle edge must be rejected");
    assert_eq!(err, ActionError::CycleEdge);
    assert_eq!(store.document, doc);
    // Rejections are not checkpointed either
    assert!(store.history.is_empty());
}

#[test]
fn connect_rejects_duplicate_edge() {
    let doc = doc_with(vec![node("a", &[]), node("b", &["a"])]);
    let err = apply(
        &doc,
        &Action::Connect {
            from: "a".to_string(),
            to: "b".to_string(),
        },
    )
    .expect_err("duplicate edge must be rejected");
    assert_eq!(err, ActionError::DuplicateEdge);
}

#[test]
fn delete_node_strips_every_dependency_list() {
    let doc = doc_with(vec![
        node("a", &[]),
        node("b", &["a"]),
        node("c", &["a", "b"]),
    ]);
    let next = apply(
        &doc,
        &Action::DeleteNode {
            id: "a".to_string(),
        },
    )
    .expect("delete ok");

    assert!(next.node("a").is_none());
    for n in &next.nodes {
        assert!(
            !n.dependencies.iter().any(|d| d == "a"),
            "node {} still references the deleted id",
            n.id
        );
    }
    assert_eq!(deps_of(&next, "c"), &["b".to_string()]);
}

#[test]
fn abc_scenario_connect_reject_reject_delete() {
    let mut store = EditorStore::new(doc_with(vec![
        node("a", &[]),
        node("b", &[]),
        node("c", &[]),
    ]));

    // b comes to depend on a
    store
        .dispatch(Action::Connect {
            from: "a".to_string(),
            to: "b".to_string(),
        })
        .expect("first connect ok");

    // Reverse edge closes a cycle
    let err = store
        .dispatch(Action::Connect {
            from: "b".to_string(),
            to: "a".to_string(),
        })
        .expect_err("reverse edge must be rejected");
    assert_eq!(err.to_string(), "Cannot create circular dependency");

    // Same edge again is a duplicate
    let err = store
        .dispatch(Action::Connect {
            from: "a".to_string(),
            to: "b".to_string(),
        })
        .expect_err("repeat edge must be rejected");
    assert_eq!(err.to_string(), "Connection already exists");

    store
        .dispatch(Action::DeleteNode {
            id: "a".to_string(),
        })
        .expect("delete ok");
    assert!(deps_of(&store.document, "b").is_empty());
}

#[test]
fn edit_node_requires_nonempty_trimmed_label() {
    let doc = doc_with(vec![node("a", &[])]);
    let err = apply(
        &doc,
        &Action::EditNode {
            id: "a".to_string(),
            label: "   ".to_string(),
            color: "#3b82f6".to_string(),
            description: String::new(),
        },
    )
    .expect_err("blank label must be rejected");
    assert_eq!(err, ActionError::EmptyLabel);

    let next = apply(
        &doc,
        &Action::EditNode {
            id: "a".to_string(),
            label: "  Renamed  ".to_string(),
            color: "#ef4444".to_string(),
            description: "new text".to_string(),
        },
    )
    .expect("edit ok");
    let n = next.node("a").unwrap();
    assert_eq!(n.label, "Renamed");
    assert_eq!(n.color, "#ef4444");
    assert_eq!(n.description, "new text");
}

#[test]
fn undo_restores_pre_edit_state_within_bound() {
    let initial = doc_with(vec![node("seed", &[])]);
    let mut store = EditorStore::new(initial.clone());

    for i in 0..5 {
        store
            .dispatch(Action::AddNode {
                id: format!("n{:02}", i),
                label: format!("n{:02}", i),
                x: 0.0,
                y: 0.0,
                color: "#3b82f6".to_string(),
                description: String::new(),
            })
            .expect("add ok");
    }
    assert_eq!(store.document.nodes.len(), 6);

    for _ in 0..5 {
        assert!(store.undo());
    }
    assert_eq!(store.document.nodes, initial.nodes);
    assert!(!store.undo(), "history should be exhausted");
}

#[test]
fn undo_history_is_bounded_at_twenty_snapshots() {
    let mut store = EditorStore::new(doc_with(vec![node("seed", &[])]));

    for i in 0..25 {
        store
            .dispatch(Action::AddNode {
                id: format!("n{:02}", i),
                label: format!("n{:02}", i),
                x: 0.0,
                y: 0.0,
                color: "#3b82f6".to_string(),
                description: String::new(),
            })
            .expect("add ok");
    }

    let mut undos = 0;
    while store.undo() {
        undos += 1;
    }
    assert_eq!(undos, 20);

    // Oldest retained snapshot is the state after the first five edits,
    // not the true initial state
    assert_eq!(store.document.nodes.len(), 6);
    assert!(store.document.contains_node("seed"));
    assert!(store.document.contains_node("n04"));
    assert!(!store.document.contains_node("n05"));
}

#[test]
fn drag_moves_are_not_checkpointed() {
    let mut store = EditorStore::new(doc_with(vec![node("a", &[])]));
    store
        .dispatch(Action::MoveNode {
            id: "a".to_string(),
            x: 400.0,
            y: 250.0,
        })
        .expect("move ok");
    assert!(!store.undo(), "a bare move must leave nothing to undo");
    let n = store.document.node("a").unwrap();
    assert_eq!((n.x, n.y), (400.0, 250.0));
}

#[test]
fn version_deletion_undo_takes_priority_over_graph_undo() {
    let mut store = EditorStore::new(doc_with(vec![node("a", &[])]));
    store
        .dispatch(Action::SaveVersion {
            id: "v-1".to_string(),
            name: "Version 1".to_string(),
            created_at: 1_700_000_000_000,
        })
        .expect("save version ok");
    store
        .dispatch(Action::AddNode {
            id: "b".to_string(),
            label: "b".to_string(),
            x: 0.0,
            y: 0.0,
            color: "#3b82f6".to_string(),
            description: String::new(),
        })
        .expect("add ok");
    store
        .dispatch(Action::DeleteVersion {
            id: "v-1".to_string(),
        })
        .expect("delete version ok");
    assert!(store.document.saved_versions.is_empty());

    // First undo restores the deleted version, leaving nodes alone
    assert!(store.undo());
    assert_eq!(store.document.saved_versions.len(), 1);
    assert_eq!(store.document.saved_versions[0].name, "Version 1");
    assert!(store.document.contains_node("b"));

    // Second undo falls back to the node snapshot
    assert!(store.undo());
    assert!(!store.document.contains_node("b"));
}

#[test]
fn version_snapshot_is_independent_of_live_nodes() {
    let mut store = EditorStore::new(doc_with(vec![node("a", &[])]));
    store
        .dispatch(Action::SaveVersion {
            id: "v-1".to_string(),
            name: "Version 1".to_string(),
            created_at: 1_700_000_000_000,
        })
        .expect("save version ok");
    store
        .dispatch(Action::MoveNode {
            id: "a".to_string(),
            x: 999.0,
            y: 999.0,
        })
        .expect("move ok");

    let snap = &store.document.saved_versions[0].nodes;
    assert_eq!((snap[0].x, snap[0].y), (0.0, 0.0));
}

#[test]
fn load_version_replaces_nodes_and_is_undoable() {
    let mut store = EditorStore::new(doc_with(vec![node("a", &[])]));
    store
        .dispatch(Action::SaveVersion {
            id: "v-1".to_string(),
            name: "Version 1".to_string(),
            created_at: 1_700_000_000_000,
        })
        .expect("save version ok");
    store
        .dispatch(Action::AddNode {
            id: "b".to_string(),
            label: "b".to_string(),
            x: 0.0,
            y: 0.0,
            color: "#3b82f6".to_string(),
            description: String::new(),
        })
        .expect("add ok");

    store
        .dispatch(Action::LoadVersion {
            id: "v-1".to_string(),
        })
        .expect("load ok");
    assert!(!store.document.contains_node("b"));

    // Loading checkpointed the pre-load state
    assert!(store.undo());
    assert!(store.document.contains_node("b"));
}

#[test]
fn rename_version_rejects_blank_and_trims() {
    let mut store = EditorStore::new(doc_with(vec![node("a", &[])]));
    store
        .dispatch(Action::SaveVersion {
            id: "v-1".to_string(),
            name: "Version 1".to_string(),
            created_at: 1_700_000_000_000,
        })
        .expect("save version ok");

    let err = store
        .dispatch(Action::RenameVersion {
            id: "v-1".to_string(),
            name: "  ".to_string(),
        })
        .expect_err("blank name must be rejected");
    assert_eq!(err, ActionError::EmptyName);

    store
        .dispatch(Action::RenameVersion {
            id: "v-1".to_string(),
            name: "  Release  ".to_string(),
        })
        .expect("rename ok");
    assert_eq!(store.document.saved_versions[0].name, "Release");
}

#[test]
fn reassign_edge_moves_arrowhead_to_valid_target() {
    let doc = doc_with(vec![
        node("a", &[]),
        node("b", &["a"]),
        node("c", &[]),
    ]);
    let next = apply(
        &doc,
        &Action::ReassignEdge {
            from: "a".to_string(),
            old_to: "b".to_string(),
            target: Some("c".to_string()),
        },
    )
    .expect("reassign ok");
    assert!(deps_of(&next, "b").is_empty());
    assert_eq!(deps_of(&next, "c"), &["a".to_string()]);
}

#[test]
fn reassign_edge_dropped_nowhere_removes_the_edge() {
    let doc = doc_with(vec![node("a", &[]), node("b", &["a"])]);
    let next = apply(
        &doc,
        &Action::ReassignEdge {
            from: "a".to_string(),
            old_to: "b".to_string(),
            target: None,
        },
    )
    .expect("reassign ok");
    assert!(deps_of(&next, "b").is_empty());
}

#[test]
fn reassign_edge_to_cycle_forming_target_degrades_to_removal() {
    // a depends on c; re-aiming the a->b arrowhead at c would make c depend
    // on a as well, closing a loop, so the edge is simply dropped
    let doc = doc_with(vec![
        node("a", &["c"]),
        node("b", &["a"]),
        node("c", &[]),
    ]);
    let next = apply(
        &doc,
        &Action::ReassignEdge {
            from: "a".to_string(),
            old_to: "b".to_string(),
            target: Some("c".to_string()),
        },
    )
    .expect("reassign ok");
    assert!(deps_of(&next, "b").is_empty());
    assert_eq!(deps_of(&next, "c"), &[] as &[String]);
}

#[test]
fn demo_layering_roots_at_zero_and_strictly_increasing() {
    let doc = GraphDocument::demo();
    let layers = assign_layers(&doc.nodes);

    assert_eq!(layers.get("ankle-knee"), Some(&0));
    for n in &doc.nodes {
        let layer = *layers.get(&n.id).expect("every node gets a layer");
        for dep in &n.dependencies {
            let dep_layer = *layers.get(dep).expect("dependency layered");
            assert!(
                layer > dep_layer,
                "{} (layer {}) must sit strictly above its dependency {} (layer {})",
                n.id,
                layer,
                dep,
                dep_layer
            );
        }
    }
}

#[test]
fn layered_layout_places_dependencies_left_of_dependents() {
    let doc = GraphDocument::demo();
    let positioned = layered_layout(&doc.nodes);
    for n in &doc.nodes {
        let (x, _) = positioned[&n.id];
        for dep in &n.dependencies {
            let (dep_x, _) = positioned[dep];
            assert!(dep_x < x, "{} should render left of {}", dep, n.id);
        }
    }
}

#[test]
fn layered_layout_diamond_takes_maximum_layer() {
    // d is reachable from the root via both a short and a long path
    let nodes = vec![
        node("root", &[]),
        node("mid", &["root"]),
        node("d", &["root", "mid"]),
    ];
    let layers = assign_layers(&nodes);
    assert_eq!(layers.get("root"), Some(&0));
    assert_eq!(layers.get("mid"), Some(&1));
    assert_eq!(layers.get("d"), Some(&2));
}

#[test]
fn layer_ordering_prefers_larger_downstream_then_id() {
    // b and c share layer 1; b carries the larger downstream subtree
    let nodes = vec![
        node("a", &[]),
        node("b", &["a"]),
        node("c", &["a"]),
        node("d", &["b"]),
        node("e", &["b"]),
    ];
    let positioned = layered_layout(&nodes);
    assert!(positioned["b"].1 < positioned["c"].1, "b sorts above c");

    // With equal downstream counts the id decides
    let tied = vec![node("a", &[]), node("y", &["a"]), node("x", &["a"])];
    let positioned = layered_layout(&tied);
    assert!(positioned["x"].1 < positioned["y"].1);
}

#[test]
fn edge_endpoints_sit_on_box_boundaries() {
    // Horizontal pair leaves through the vertical faces
    let (start, end) = edge_endpoints((0.0, 0.0), (300.0, 0.0));
    assert_eq!(start, (75.0, 0.0));
    assert_eq!(end, (225.0, 0.0));

    // Vertical pair leaves through the horizontal faces
    let (start, end) = edge_endpoints((0.0, 0.0), (0.0, 300.0));
    assert_eq!(start, (0.0, 30.0));
    assert_eq!(end, (0.0, 270.0));
}

#[test]
fn clear_segment_routes_as_a_straight_line() {
    let nodes = vec![node("a", &[]), node("b", &["a"])];
    let path = route_edge((75.0, 0.0), (425.0, 0.0), "a", "b", &nodes);
    assert_eq!(path, EdgePath::Line);
}

#[test]
fn obstructed_segment_bulges_away_from_the_obstacle() {
    let mut a = node("a", &[]);
    let mut b = node("b", &["a"]);
    let mut obstacle = node("x", &[]);
    a.x = 0.0;
    a.y = 0.0;
    b.x = 500.0;
    b.y = 0.0;
    obstacle.x = 250.0;
    obstacle.y = 30.0;
    let nodes = vec![a, b, obstacle];

    let (start, end) = edge_endpoints((0.0, 0.0), (500.0, 0.0));
    match route_edge(start, end, "a", "b", &nodes) {
        EdgePath::Quad { control } => {
            // Obstacle sits below the segment midpoint, so the curve lifts up
            assert_eq!(control.0, 250.0);
            assert!(control.1 < 0.0);
        }
        EdgePath::Line => panic!("expected a detour around the obstacle"),
    }
}

#[test]
fn export_import_round_trips_the_document() {
    let mut doc = doc_with(vec![node("a", &[]), node("b", &["a"])]);
    doc.saved_versions
        .push(depsketch::graph_utils::document::SavedVersion {
            id: "v-1".to_string(),
            name: "Version 1".to_string(),
            nodes: doc.nodes.clone(),
            created_at: 1_700_000_000_000,
        });

    let json = persist::export_json(&doc).expect("export ok");
    let imported = persist::parse_import(&json).expect("import ok");
    let restored = imported.into_document(&GraphDocument::default());

    assert_eq!(restored.nodes, doc.nodes);
    assert_eq!(restored.saved_versions, doc.saved_versions);
    assert_eq!(restored.categories, doc.categories);
}

#[test]
fn import_accepts_the_wrapped_storage_shape() {
    let doc = doc_with(vec![node("a", &[])]);
    let stored = StoredDocument::from_document(&doc);
    let json = serde_json::to_string(&stored).expect("serialize ok");

    let imported = persist::parse_import(&json).expect("wrapped shape accepted");
    let restored = imported.into_document(&GraphDocument::default());
    assert_eq!(restored.nodes, doc.nodes);
    assert_eq!(restored.categories, doc.categories);
}

#[test]
fn import_fails_closed_on_malformed_shapes() {
    assert!(persist::parse_import("{}").is_err());
    assert!(persist::parse_import(r#"{"currentState": 5}"#).is_err());
    assert!(persist::parse_import(r#"{"currentState": {"wrong": true}}"#).is_err());
    assert!(persist::parse_import("not json at all").is_err());
    // A malformed node inside the array is also rejected
    assert!(persist::parse_import(r#"{"currentState": [{"id": "a"}]}"#).is_err());
}

#[test]
fn import_keeps_live_versions_and_categories_when_file_omits_them() {
    let live = doc_with(vec![node("keep", &[])]);
    let imported = persist::parse_import(r#"{"currentState": []}"#).expect("bare shape accepted");
    let restored = imported.into_document(&live);
    assert!(restored.nodes.is_empty());
    assert_eq!(restored.categories, live.categories);
}

#[test]
fn storage_slot_uses_camel_case_wrapped_shape() {
    let doc = doc_with(vec![node("a", &[])]);
    let stored = StoredDocument::from_document(&doc);
    let value = serde_json::to_value(&stored).expect("serialize ok");

    assert!(value["currentState"]["nodes"].is_array());
    assert!(value["currentState"]["lastModified"].is_i64());
    assert!(value["savedVersions"].is_array());
    assert!(value["categories"].is_array());

    // The export shape keeps currentState as a bare array instead
    let export = persist::export_json(&doc).expect("export ok");
    let value: serde_json::Value = serde_json::from_str(&export).expect("parse ok");
    assert!(value["currentState"].is_array());
    assert!(value["exportedAt"].is_string());
}

#[test]
fn export_file_name_is_dated() {
    let name = persist::export_file_name();
    assert!(name.starts_with("dependency-graph-"));
    assert!(name.ends_with(".json"));
}

#[test]
fn autosave_slot_save_load_round_trip() {
    let dir = std::env::temp_dir().join(format!("depsketch-test-{}", std::process::id()));
    persist::set_settings_override(AppSettings {
        autosave_override: Some(dir.clone()),
        export_override: Some(dir.clone()),
    });

    let doc = doc_with(vec![node("a", &[]), node("b", &["a"])]);
    let path = persist::save_active(&doc).expect("save ok");
    assert!(path.ends_with("dependency-graph.json"));

    let loaded = persist::load_active()
        .expect("load ok")
        .expect("slot should exist");
    assert_eq!(loaded, doc);

    let export_path = persist::export_to_dir(&doc, &dir).expect("export ok");
    let imported = persist::import_from_path(&export_path).expect("import ok");
    assert_eq!(
        imported.into_document(&GraphDocument::default()).nodes,
        doc.nodes
    );

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn right_press_below_threshold_is_a_context_menu_request() {
    let state = Interaction::Idle;
    let (state, _) = state.on_event(Event::SecondaryPressNode {
        id: "a".to_string(),
        screen: (100.0, 100.0),
    });
    let (state, cmds) = state.on_event(Event::PointerMove {
        world: (0.0, 0.0),
        screen: (102.0, 101.0),
        screen_delta: (2.0, 1.0),
    });
    assert!(matches!(state, Interaction::RightPressed { .. }));
    assert!(cmds.is_empty());

    let (state, cmds) = state.on_event(Event::PointerRelease { over: None });
    assert_eq!(state, Interaction::Idle);
    assert_eq!(
        cmds,
        vec![Command::OpenNodeMenu {
            id: "a".to_string(),
            screen: (100.0, 100.0),
        }]
    );
}

#[test]
fn right_drag_past_threshold_draws_a_connection() {
    let state = Interaction::Idle;
    let (state, _) = state.on_event(Event::SecondaryPressNode {
        id: "a".to_string(),
        screen: (100.0, 100.0),
    });
    let (state, _) = state.on_event(Event::PointerMove {
        world: (0.0, 0.0),
        screen: (110.0, 100.0),
        screen_delta: (10.0, 0.0),
    });
    assert_eq!(
        state,
        Interaction::DrawingEdge {
            from: "a".to_string()
        }
    );

    let (state, cmds) = state.on_event(Event::PointerRelease {
        over: Some("b".to_string()),
    });
    assert_eq!(state, Interaction::Idle);
    assert_eq!(
        cmds,
        vec![Command::RequestConnect {
            from: "a".to_string(),
            to: "b".to_string(),
        }]
    );
}

#[test]
fn right_drag_released_over_empty_space_cancels() {
    let state = Interaction::DrawingEdge {
        from: "a".to_string(),
    };
    let (state, cmds) = state.on_event(Event::PointerRelease { over: None });
    assert_eq!(state, Interaction::Idle);
    assert!(cmds.is_empty());
}

#[test]
fn connect_mode_click_flow() {
    let state = Interaction::Idle;
    let (state, _) = state.on_event(Event::ToggleConnectMode);
    assert_eq!(state, Interaction::PickingSource);

    let (state, _) = state.on_event(Event::ClickNode {
        id: "a".to_string(),
    });
    assert_eq!(
        state,
        Interaction::PickingTarget {
            source: "a".to_string()
        }
    );

    // Clicking the source again cancels the selection
    let (state, cmds) = state.clone().on_event(Event::ClickNode {
        id: "a".to_string(),
    });
    assert_eq!(state, Interaction::PickingSource);
    assert!(cmds.is_empty());

    let state = Interaction::PickingTarget {
        source: "a".to_string(),
    };
    let (state, cmds) = state.on_event(Event::ClickNode {
        id: "b".to_string(),
    });
    assert_eq!(state, Interaction::PickingSource);
    assert_eq!(
        cmds,
        vec![Command::RequestConnect {
            from: "a".to_string(),
            to: "b".to_string(),
        }]
    );
}

#[test]
fn arrowhead_drop_requests_reassignment_or_removal() {
    let state = Interaction::Idle;
    let (state, _) = state.on_event(Event::ArrowheadPress {
        from: "a".to_string(),
        to: "b".to_string(),
    });
    assert!(matches!(state, Interaction::DraggingArrowhead { .. }));

    // Dropping on a third node asks for reassignment
    let (_, cmds) = state.clone().on_event(Event::PointerRelease {
        over: Some("c".to_string()),
    });
    assert_eq!(
        cmds,
        vec![Command::RequestReassign {
            from: "a".to_string(),
            old_to: "b".to_string(),
            target: Some("c".to_string()),
        }]
    );

    // Dropping on empty space asks for removal
    let (_, cmds) = state.clone().on_event(Event::PointerRelease { over: None });
    assert_eq!(
        cmds,
        vec![Command::RequestReassign {
            from: "a".to_string(),
            old_to: "b".to_string(),
            target: None,
        }]
    );

    // Dropping back on the current dependent changes nothing
    let (state, cmds) = state.on_event(Event::PointerRelease {
        over: Some("b".to_string()),
    });
    assert_eq!(state, Interaction::Idle);
    assert!(cmds.is_empty());
}

#[test]
fn escape_abandons_in_progress_states() {
    let drawing = Interaction::DrawingEdge {
        from: "a".to_string(),
    };
    let (state, cmds) = drawing.on_event(Event::Escape);
    assert_eq!(state, Interaction::Idle);
    assert!(cmds.is_empty());

    let picking = Interaction::PickingTarget {
        source: "a".to_string(),
    };
    let (state, _) = picking.on_event(Event::Escape);
    assert_eq!(state, Interaction::PickingSource);

    let editing = Interaction::EditingNode {
        id: "a".to_string(),
    };
    let (state, _) = editing.on_event(Event::Escape);
    assert_eq!(state, Interaction::Idle);
}

#[test]
fn canvas_press_pans_and_clears_selection() {
    let state = Interaction::Idle;
    let (state, cmds) = state.on_event(Event::PrimaryPressCanvas);
    assert_eq!(state, Interaction::Panning);
    assert_eq!(cmds, vec![Command::ClearSelection, Command::CloseContextMenu]);

    let (state, cmds) = state.on_event(Event::PointerMove {
        world: (0.0, 0.0),
        screen: (5.0, 7.0),
        screen_delta: (5.0, 7.0),
    });
    assert_eq!(state, Interaction::Panning);
    assert_eq!(cmds, vec![Command::PanBy { dx: 5.0, dy: 7.0 }]);
}

#[test]
fn node_drag_emits_live_moves_without_checkpoints() {
    let state = Interaction::Idle;
    let (state, cmds) = state.on_event(Event::PrimaryPressNode {
        id: "a".to_string(),
    });
    assert_eq!(
        cmds,
        vec![
            Command::SelectNode {
                id: "a".to_string()
            },
            Command::CloseContextMenu,
        ]
    );

    let (state, cmds) = state.on_event(Event::PointerMove {
        world: (42.0, 17.0),
        screen: (0.0, 0.0),
        screen_delta: (0.0, 0.0),
    });
    assert!(matches!(state, Interaction::DraggingNode { .. }));
    assert_eq!(
        cmds,
        vec![Command::MoveNode {
            id: "a".to_string(),
            x: 42.0,
            y: 17.0,
        }]
    );

    let (state, cmds) = state.on_event(Event::PointerRelease { over: None });
    assert_eq!(state, Interaction::Idle);
    assert!(cmds.is_empty());
}

#[test]
fn category_join_falls_back_to_no_category() {
    let doc = doc_with(vec![node("a", &[])]);
    assert_eq!(doc.display_color("#3b82f6"), "#3b82f6");
    assert_eq!(
        doc.display_color("#123456"),
        depsketch::graph_utils::document::NO_CATEGORY_COLOR
    );
    assert_eq!(doc.category_name("#3b82f6"), "Default");
    assert_eq!(doc.category_name("#123456"), "No Category");
}

#[test]
fn upstream_downstream_closures() {
    let doc = doc_with(vec![
        node("a", &[]),
        node("b", &["a"]),
        node("c", &["b"]),
        node("d", &[]),
    ]);
    let down = doc.downstream_of("a");
    assert!(down.contains("b") && down.contains("c"));
    assert!(!down.contains("d"));

    let up = doc.upstream_of("c");
    assert!(up.contains("a") && up.contains("b"));
    assert!(!up.contains("d"));
}
