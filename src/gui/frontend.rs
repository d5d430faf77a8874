#![allow(clippy::collapsible_if)]
#![allow(clippy::too_many_lines)]
use std::collections::HashSet;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke, Vec2};

use super::interaction::{Command, Event, Interaction};
use crate::graph_utils::actions::Action;
use crate::graph_utils::document::{self, GraphDocument, Node, NodeId};
use crate::graph_utils::layout;
use crate::graph_utils::routing::{self, EdgePath, NODE_HALF_H, NODE_HALF_W};
use crate::graph_utils::store::EditorStore;
use crate::persistence::persist;
use crate::persistence::settings::AppSettings;

// Style for toast notifications
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NoticeStyle {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
enum ContextMenu {
    Node { id: NodeId, screen: Pos2 },
    Canvas { screen: Pos2, world: Pos2 },
}

// Buffers for the node-edit modal; committed atomically on Save
#[derive(Clone, Debug, Default)]
struct NodeEditor {
    id: NodeId,
    label: String,
    color: String,
    description: String,
}

pub struct EditorApp {
    store: EditorStore,
    interaction: Interaction,
    selected: Option<NodeId>,
    hover_node: Option<NodeId>,
    hover_edge: Option<(NodeId, NodeId)>,
    pan: Vec2,
    zoom: f32,
    // Canvas overlays
    context_menu: Option<ContextMenu>,
    node_editor: Option<NodeEditor>,
    // Versions window state
    show_versions_window: bool,
    version_name_edit: String,
    // Category legend editing buffers
    category_name_edit: String,
    category_color_edit: Color32,
    // Import window state
    show_import_window: bool,
    import_path: String,
    // Ctrl+S baseline; realign recomputes the layout over this snapshot
    baseline: Vec<Node>,
    // Transient bottom-right notice
    notice: Option<String>,
    notice_time: Option<Instant>,
    notice_style: NoticeStyle,
    // App settings and Preferences UI state
    app_settings: AppSettings,
    show_prefs_window: bool,
    prefs_autosave_override_str: String,
    prefs_export_override_str: String,
    prefs_status: Option<String>,
}

impl EditorApp {
    pub fn new(document: GraphDocument) -> Self {
        let settings = AppSettings::load().unwrap_or_default();
        let baseline = document.nodes.clone();
        Self {
            store: EditorStore::new(document),
            interaction: Interaction::Idle,
            selected: None,
            hover_node: None,
            hover_edge: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            context_menu: None,
            node_editor: None,
            show_versions_window: false,
            version_name_edit: String::new(),
            category_name_edit: String::new(),
            category_color_edit: Color32::from_rgb(0x6b, 0x72, 0x80),
            show_import_window: false,
            import_path: String::new(),
            baseline,
            notice: None,
            notice_time: None,
            notice_style: NoticeStyle::Info,
            app_settings: settings,
            show_prefs_window: false,
            prefs_autosave_override_str: String::new(),
            prefs_export_override_str: String::new(),
            prefs_status: None,
        }
    }

    fn notice(&mut self, msg: impl Into<String>, style: NoticeStyle) {
        self.notice = Some(msg.into());
        self.notice_time = Some(Instant::now());
        self.notice_style = style;
    }

    // Persistence is best-effort: a failed write is logged and forgotten,
    // never surfaced and never retried.
    fn persist_now(&mut self) {
        if let Err(e) = persist::save_active(&self.store.document) {
            log::warn!("autosave failed: {e:#}");
        }
        self.baseline = self.store.document.nodes.clone();
    }

    /// Dispatch an action; rejections become a transient error notice and
    /// successful commits are persisted immediately.
    fn dispatch(&mut self, action: Action) -> bool {
        match self.store.dispatch(action) {
            Ok(()) => {
                self.persist_now();
                true
            }
            Err(e) => {
                self.notice(e.to_string(), NoticeStyle::Error);
                false
            }
        }
    }

    // Drag moves skip the persist-per-frame; the release commits
    fn move_node_live(&mut self, id: NodeId, x: f32, y: f32) {
        let _ = self.store.dispatch(Action::MoveNode { id, x, y });
    }

    fn undo_now(&mut self) {
        if self.store.undo() {
            self.selected = None;
            self.persist_now();
        }
    }

    fn apply_event(&mut self, event: Event) {
        let was_dragging = matches!(
            self.interaction,
            Interaction::DraggingNode { .. } | Interaction::DraggingArrowhead { .. }
        );
        let state = std::mem::replace(&mut self.interaction, Interaction::Idle);
        let (next, commands) = state.on_event(event);
        self.interaction = next;
        for command in commands {
            self.run_command(command);
        }
        // A finished node or arrowhead drag is a committed change
        if was_dragging && matches!(self.interaction, Interaction::Idle) {
            self.persist_now();
        }
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::SelectNode { id } => self.selected = Some(id),
            Command::ClearSelection => self.selected = None,
            Command::CloseContextMenu => self.context_menu = None,
            Command::MoveNode { id, x, y } => self.move_node_live(id, x, y),
            Command::PanBy { dx, dy } => self.pan += Vec2::new(dx, dy),
            Command::RequestConnect { from, to } => {
                self.dispatch(Action::Connect { from, to });
            }
            Command::RequestReassign {
                from,
                old_to,
                target,
            } => {
                self.dispatch(Action::ReassignEdge {
                    from,
                    old_to,
                    target,
                });
            }
            Command::OpenNodeMenu { id, screen } => {
                self.context_menu = Some(ContextMenu::Node {
                    id,
                    screen: Pos2::new(screen.0, screen.1),
                });
            }
            Command::OpenNodeEditor { id } => {
                if let Some(node) = self.store.document.node(&id) {
                    self.node_editor = Some(NodeEditor {
                        id: node.id.clone(),
                        label: node.label.clone(),
                        color: node.color.clone(),
                        description: node.description.clone(),
                    });
                }
            }
        }
    }

    // Ctrl+S: write the slot now and make the current node set the
    // baseline that Realign Layout works from
    fn save_baseline(&mut self) {
        self.persist_now();
        self.notice("State saved (Ctrl+S)", NoticeStyle::Info);
    }

    fn save_version_now(&mut self) {
        let name = format!("Version {}", self.store.document.saved_versions.len() + 1);
        if self.dispatch(Action::SaveVersion {
            id: document::fresh_version_id(),
            name: name.clone(),
            created_at: persist::epoch_ms(),
        }) {
            self.notice(format!("Saved {}", name), NoticeStyle::Info);
        }
    }

    fn realign_layout(&mut self) {
        let mut nodes = self.baseline.clone();
        let positioned = layout::layered_layout(&nodes);
        for node in &mut nodes {
            if let Some(&(x, y)) = positioned.get(&node.id) {
                node.x = x;
                node.y = y;
            }
        }
        self.dispatch(Action::ReplaceNodes { nodes });
    }

    fn export_now(&mut self) {
        let dir = self.app_settings.export_dir();
        match persist::export_to_dir(&self.store.document, &dir) {
            Ok(path) => self.notice(format!("Exported to {}", path.display()), NoticeStyle::Info),
            Err(e) => self.notice(format!("Export failed: {}", e), NoticeStyle::Error),
        }
    }

    fn import_now(&mut self) {
        let path = std::path::PathBuf::from(self.import_path.trim());
        match persist::import_from_path(&path) {
            Ok(imported) => {
                let document = imported.into_document(&self.store.document);
                if self.dispatch(Action::ReplaceDocument { document }) {
                    self.selected = None;
                    self.show_import_window = false;
                    self.notice("Import successful!", NoticeStyle::Info);
                }
            }
            Err(_) => self.notice("Invalid file format", NoticeStyle::Error),
        }
    }

    fn menu_open_prefs(&mut self) {
        self.prefs_autosave_override_str = match &self.app_settings.autosave_override {
            Some(p) => p.display().to_string(),
            None => String::new(),
        };
        self.prefs_export_override_str = match &self.app_settings.export_override {
            Some(p) => p.display().to_string(),
            None => String::new(),
        };
        self.prefs_status = None;
        self.show_prefs_window = true;
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Global shortcuts: undo and save-baseline
        if ctx.input_mut(|i| {
            i.consume_shortcut(&egui::KeyboardShortcut::new(
                egui::Modifiers::COMMAND,
                egui::Key::Z,
            ))
        }) {
            self.undo_now();
        }
        if ctx.input_mut(|i| {
            i.consume_shortcut(&egui::KeyboardShortcut::new(
                egui::Modifiers::COMMAND,
                egui::Key::S,
            ))
        }) {
            self.save_baseline();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.apply_event(Event::Escape);
            self.context_menu = None;
            self.node_editor = None;
        }

        self.top_bar(ctx);
        self.canvas(ctx);
        self.details_panel(ctx);
        self.node_editor_window(ctx);
        self.versions_window(ctx);
        self.import_window(ctx);
        self.prefs_window(ctx);
        self.context_menu_overlay(ctx);
        self.toast(ctx);
    }
}

impl EditorApp {
    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Dep-Sketch");

                ui.menu_button("File", |ui| {
                    if ui
                        .add(egui::Button::new("Save Baseline").shortcut_text(ctx.format_shortcut(
                            &egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S),
                        )))
                        .clicked()
                    {
                        self.save_baseline();
                        ui.close();
                    }
                    if ui.button("Export…").clicked() {
                        self.export_now();
                        ui.close();
                    }
                    if ui.button("Import…").clicked() {
                        self.show_import_window = true;
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui
                        .add(egui::Button::new("Undo").shortcut_text(ctx.format_shortcut(
                            &egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Z),
                        )))
                        .clicked()
                    {
                        self.undo_now();
                        ui.close();
                    }
                    if ui.button("Realign Layout").clicked() {
                        self.realign_layout();
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Reset View").clicked() {
                        self.pan = Vec2::ZERO;
                        self.zoom = 1.0;
                        ui.close();
                    }
                    ui.separator();
                    ui.label("Zoom");
                    ui.add(
                        egui::Slider::new(&mut self.zoom, 0.3..=3.0)
                            .clamping(egui::SliderClamping::Always),
                    );
                });

                ui.menu_button("Settings", |ui| {
                    if ui.button("Preferences…").clicked() {
                        self.menu_open_prefs();
                        ui.close();
                    }
                });

                ui.separator();

                let connect_on = self.interaction.connect_mode();
                if ui
                    .selectable_label(connect_on, "Connect")
                    .on_hover_text("Click a source node, then a target node")
                    .clicked()
                {
                    self.apply_event(Event::ToggleConnectMode);
                }
                if ui.button("Save Version").clicked() {
                    self.save_version_now();
                }
                let versions_label =
                    format!("Versions ({})", self.store.document.saved_versions.len());
                if ui
                    .selectable_label(self.show_versions_window, versions_label)
                    .clicked()
                {
                    self.show_versions_window = !self.show_versions_window;
                }

                // Zoom readout with nudge buttons
                if ui.small_button("−").clicked() {
                    self.zoom = (self.zoom - 0.2).max(0.3);
                }
                if ui.small_button("+").clicked() {
                    self.zoom = (self.zoom + 0.2).min(3.0);
                }
                ui.small(format!("{:.0}%", self.zoom * 100.0));

                ui.small(format!("N:{}", self.store.document.nodes.len()));
            });

            // Category legend: click a chip to edit it in place
            ui.horizontal_wrapped(|ui| {
                let categories = self.store.document.categories.clone();
                let editing_index = match &self.interaction {
                    Interaction::EditingCategory { index } => Some(*index),
                    _ => None,
                };
                for (i, cat) in categories.iter().enumerate() {
                    if editing_index == Some(Some(i)) {
                        self.category_chip_editor(ui, Some(i));
                        continue;
                    }
                    let chip = format!("⬤ {}", cat.name);
                    let color = parse_hex_color(&cat.color).unwrap_or(Color32::GRAY);
                    if ui
                        .add(egui::Button::new(egui::RichText::new(chip).color(color)).small())
                        .on_hover_text("Click to edit category")
                        .clicked()
                    {
                        self.category_name_edit = cat.name.clone();
                        self.category_color_edit = color;
                        self.apply_event(Event::BeginCategoryEdit { index: Some(i) });
                    }
                }
                if editing_index == Some(None) {
                    self.category_chip_editor(ui, None);
                } else if ui.small_button("+ Add").clicked() {
                    self.category_name_edit.clear();
                    self.category_color_edit = Color32::from_rgb(0x6b, 0x72, 0x80);
                    self.apply_event(Event::BeginCategoryEdit { index: None });
                }
            });
        });
    }

    // Inline editor for one category chip (existing when index is Some)
    fn category_chip_editor(&mut self, ui: &mut egui::Ui, index: Option<usize>) {
        let mut commit = false;
        let mut remove = false;
        let mut cancel = false;
        ui.color_edit_button_srgba(&mut self.category_color_edit);
        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.category_name_edit)
                .hint_text("Category name")
                .desired_width(110.0),
        );
        if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            commit = true;
        }
        if ui.small_button("✓").clicked() {
            commit = true;
        }
        if index.is_some() && ui.small_button("🗑").clicked() {
            remove = true;
        }
        if ui.small_button("×").clicked() {
            cancel = true;
        }

        if commit {
            let name = self.category_name_edit.trim().to_string();
            let color = color_to_hex(self.category_color_edit);
            if self.dispatch(Action::UpsertCategory { index, name, color }) {
                self.apply_event(Event::FinishEdit);
            }
        } else if remove {
            if let Some(i) = index {
                self.dispatch(Action::DeleteCategory { index: i });
            }
            self.apply_event(Event::FinishEdit);
        } else if cancel {
            self.apply_event(Event::FinishEdit);
        }
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_rect_before_wrap();

            // Background gets what the nodes leave over: panning, canvas
            // clicks, canvas context menu.
            let bg_resp = ui.allocate_rect(available, Sense::click_and_drag());

            // Helpers to transform between world and screen space
            let center = available.center();
            let zoom = self.zoom;
            let pan = self.pan;
            let to_screen = move |p: Pos2| -> Pos2 {
                Pos2::new(
                    (p.x - center.x) * zoom + center.x + pan.x,
                    (p.y - center.y) * zoom + center.y + pan.y,
                )
            };
            let from_screen = move |p: Pos2| -> Pos2 {
                Pos2::new(
                    ((p.x - pan.x) - center.x) / zoom + center.x,
                    ((p.y - pan.y) - center.y) / zoom + center.y,
                )
            };

            // Zoom with scroll only when the pointer is over the canvas
            if bg_resp.hovered() {
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    self.zoom = (self.zoom + scroll * 0.001).clamp(0.3, 3.0);
                }
            }

            // Render from a snapshot; events collected during the pass are
            // applied afterwards.
            let doc = self.store.document.clone();
            let mut events: Vec<Event> = Vec::new();
            let mut deferred: Vec<Action> = Vec::new();

            let pointer_screen = ui.input(|i| i.pointer.latest_pos());
            let pointer_world = pointer_screen.map(from_screen);
            let node_at = |world: Pos2| -> Option<NodeId> {
                doc.nodes
                    .iter()
                    .find(|n| {
                        (n.x - world.x).abs() < NODE_HALF_W && (n.y - world.y).abs() < NODE_HALF_H
                    })
                    .map(|n| n.id.clone())
            };

            self.hover_node = pointer_world.and_then(node_at);

            let highlighted = self.selected.clone().or_else(|| self.hover_node.clone());
            let downstream: HashSet<NodeId> = highlighted
                .as_ref()
                .map(|id| doc.downstream_of(id))
                .unwrap_or_default();
            let upstream: HashSet<NodeId> = highlighted
                .as_ref()
                .map(|id| doc.upstream_of(id))
                .unwrap_or_default();

            let painter = ui.painter_at(available);

            // --- edges ----------------------------------------------------
            let mut best_edge: Option<((NodeId, NodeId), f32)> = None;
            for node in &doc.nodes {
                for dep_id in &node.dependencies {
                    let Some(dep) = doc.node(dep_id) else { continue };

                    let dragging_this = matches!(
                        &self.interaction,
                        Interaction::DraggingArrowhead { from, to }
                            if from == dep_id && to == &node.id
                    );

                    let (start_w, end_w) =
                        routing::edge_endpoints((dep.x, dep.y), (node.x, node.y));
                    let end_w = if dragging_this {
                        match pointer_world {
                            Some(p) => (p.x, p.y),
                            None => end_w,
                        }
                    } else {
                        end_w
                    };

                    let start = to_screen(Pos2::new(start_w.0, start_w.1));
                    let end = to_screen(Pos2::new(end_w.0, end_w.1));

                    let key = (dep_id.clone(), node.id.clone());
                    let is_highlighted = self.hover_edge.as_ref() == Some(&key)
                        || highlighted.as_deref().is_some_and(|h| {
                            (h == node.id && upstream.contains(dep_id))
                                || (h == *dep_id && downstream.contains(&node.id))
                        });

                    let (color, width) = if dragging_this {
                        (Color32::from_rgb(0xf5, 0x9e, 0x0b), 3.0)
                    } else if is_highlighted {
                        (Color32::from_rgb(0x3b, 0x82, 0xf6), 3.0)
                    } else {
                        (
                            Color32::from_rgb(0xcb, 0xd5, 0xe1).gamma_multiply(0.4),
                            2.0,
                        )
                    };
                    let stroke = Stroke::new(width, color);

                    // Straight edge while dragging; otherwise detour around
                    // any node the segment would cross.
                    let path = if dragging_this {
                        EdgePath::Line
                    } else {
                        routing::route_edge(start_w, end_w, dep_id, &node.id, &doc.nodes)
                    };
                    let control = match path {
                        EdgePath::Line => start.lerp(end, 0.5),
                        EdgePath::Quad { control } => {
                            let c = to_screen(Pos2::new(control.0, control.1));
                            painter.add(egui::epaint::QuadraticBezierShape::from_points_stroke(
                                [start, c, end],
                                false,
                                Color32::TRANSPARENT,
                                stroke,
                            ));
                            c
                        }
                    };
                    if matches!(path, EdgePath::Line) {
                        painter.line_segment([start, end], stroke);
                    }

                    // Arrowhead at the dependent's boundary
                    let dir = end - start;
                    let len = dir.length();
                    if len > f32::EPSILON {
                        let unit = dir / len;
                        let perp = Vec2::new(-unit.y, unit.x);
                        let size = (10.0 * self.zoom).clamp(6.0, 16.0);
                        let back = end - unit * size;
                        painter.add(egui::Shape::convex_polygon(
                            vec![end, back + perp * size * 0.5, back - perp * size * 0.5],
                            color,
                            Stroke::NONE,
                        ));
                    }

                    // Hit area on the arrowhead: left-drag detaches the edge
                    let tip_rect =
                        Rect::from_center_size(end, Vec2::splat((18.0 * self.zoom).max(12.0)));
                    let tip_resp = ui.allocate_rect(tip_rect, Sense::click_and_drag());
                    if !dragging_this && tip_resp.drag_started_by(egui::PointerButton::Primary) {
                        events.push(Event::ArrowheadPress {
                            from: dep_id.clone(),
                            to: node.id.clone(),
                        });
                    }
                    if tip_resp.secondary_clicked() {
                        deferred.push(Action::Disconnect {
                            from: dep_id.clone(),
                            to: node.id.clone(),
                        });
                    }

                    // Track the nearest edge under the pointer for hover
                    // highlighting and right-click deletion.
                    if let Some(p) = pointer_screen {
                        let d = point_segment_distance(p, start, control)
                            .min(point_segment_distance(p, control, end));
                        if d <= 8.0 && best_edge.as_ref().map(|(_, bd)| d < *bd).unwrap_or(true) {
                            best_edge = Some((key, d));
                        }
                    }
                }
            }
            self.hover_edge = best_edge.map(|(key, _)| key);

            // --- nodes ----------------------------------------------------
            let connect_source = match &self.interaction {
                Interaction::PickingTarget { source } => Some(source.clone()),
                _ => None,
            };
            let secondary_pressed = ui.input(|i| i.pointer.secondary_pressed());
            for node in &doc.nodes {
                let pos_screen = to_screen(Pos2::new(node.x, node.y));
                let rect = Rect::from_center_size(
                    pos_screen,
                    Vec2::new(NODE_HALF_W * 2.0 * self.zoom, NODE_HALF_H * 2.0 * self.zoom),
                );
                let resp = ui.allocate_rect(rect, Sense::click_and_drag());

                let is_selected = self.selected.as_deref() == Some(node.id.as_str());
                let is_hovered = self.hover_node.as_deref() == Some(node.id.as_str());
                let is_upstream = upstream.contains(&node.id);
                let is_downstream = downstream.contains(&node.id);
                let is_connect_source = connect_source.as_deref() == Some(node.id.as_str());
                let lit = is_selected || is_hovered || is_upstream || is_downstream;

                let fill = parse_hex_color(doc.display_color(&node.color))
                    .unwrap_or(Color32::GRAY);
                let fill = if lit || is_connect_source {
                    fill
                } else {
                    fill.gamma_multiply(0.7)
                };
                let stroke = if is_connect_source {
                    Stroke::new(4.0, Color32::from_rgb(0xfb, 0xbf, 0x24))
                } else if is_selected {
                    Stroke::new(3.0, Color32::from_rgb(0x1e, 0x40, 0xaf))
                } else if is_hovered {
                    Stroke::new(3.0, Color32::from_rgb(0x3b, 0x82, 0xf6))
                } else {
                    Stroke::new(2.0, Color32::WHITE)
                };
                let rounding = 8.0 * self.zoom;
                painter.rect_filled(rect, rounding, fill);
                painter.rect_stroke(rect, rounding, stroke, egui::StrokeKind::Inside);

                // Up to two label lines, centered in the box
                let font = egui::FontId::proportional((13.0 * self.zoom).clamp(8.0, 26.0));
                for (i, line) in node.label.split('\n').take(2).enumerate() {
                    let dy = (-8.0 + i as f32 * 16.0) * self.zoom;
                    painter.text(
                        pos_screen + Vec2::new(0.0, dy),
                        egui::Align2::CENTER_CENTER,
                        line,
                        font.clone(),
                        Color32::WHITE,
                    );
                }
                if is_connect_source {
                    painter.circle_filled(
                        pos_screen,
                        8.0 * self.zoom,
                        Color32::from_rgb(0xfb, 0xbf, 0x24),
                    );
                }

                if !node.description.is_empty() {
                    resp.clone().on_hover_ui(|ui| {
                        ui.set_max_width(250.0);
                        ui.label(node.description.clone());
                    });
                }

                if resp.double_clicked() {
                    events.push(Event::DoubleClickNode {
                        id: node.id.clone(),
                    });
                } else if resp.clicked() {
                    if self.interaction.connect_mode() {
                        events.push(Event::ClickNode {
                            id: node.id.clone(),
                        });
                    } else {
                        self.selected = Some(node.id.clone());
                        self.context_menu = None;
                    }
                }
                if !self.interaction.connect_mode()
                    && resp.drag_started_by(egui::PointerButton::Primary)
                {
                    events.push(Event::PrimaryPressNode {
                        id: node.id.clone(),
                    });
                }
                if secondary_pressed
                    && resp.hovered()
                    && matches!(self.interaction, Interaction::Idle)
                {
                    if let Some(p) = pointer_screen {
                        events.push(Event::SecondaryPressNode {
                            id: node.id.clone(),
                            screen: (p.x, p.y),
                        });
                    }
                }
            }

            // Rubber band while right-dragging a new connection
            if let Interaction::DrawingEdge { from } = &self.interaction {
                if let (Some(node), Some(p)) = (doc.node(from), pointer_screen) {
                    let a = to_screen(Pos2::new(node.x, node.y));
                    let stroke = Stroke::new(3.0, Color32::from_rgb(0xf5, 0x9e, 0x0b));
                    painter.extend(egui::Shape::dashed_line(&[a, p], stroke, 8.0, 4.0));
                }
            }

            // --- background interactions ---------------------------------
            if matches!(self.interaction, Interaction::Idle)
                && bg_resp.drag_started_by(egui::PointerButton::Primary)
            {
                events.push(Event::PrimaryPressCanvas);
            }
            if bg_resp.clicked() {
                self.selected = None;
                self.context_menu = None;
            }
            if bg_resp.secondary_clicked() {
                if let Some((from, to)) = self.hover_edge.clone() {
                    // Right-click on an edge removes the connection
                    deferred.push(Action::Disconnect { from, to });
                } else if let Some(p) = pointer_screen {
                    self.context_menu = Some(ContextMenu::Canvas {
                        screen: p,
                        world: from_screen(p),
                    });
                }
            }

            // Pointer motion and release feed the active drag states
            let over = pointer_world.and_then(node_at);
            let (primary_down, secondary_down, pointer_delta) = ui.input(|i| {
                (
                    i.pointer.primary_down(),
                    i.pointer.secondary_down(),
                    i.pointer.delta(),
                )
            });
            match &self.interaction {
                Interaction::DraggingNode { .. }
                | Interaction::Panning
                | Interaction::DraggingArrowhead { .. } => {
                    if let Some(p) = pointer_screen {
                        let w = from_screen(p);
                        events.push(Event::PointerMove {
                            world: (w.x, w.y),
                            screen: (p.x, p.y),
                            screen_delta: (pointer_delta.x, pointer_delta.y),
                        });
                    }
                    if !primary_down {
                        events.push(Event::PointerRelease { over: over.clone() });
                    }
                }
                Interaction::RightPressed { .. } | Interaction::DrawingEdge { .. } => {
                    if let Some(p) = pointer_screen {
                        let w = from_screen(p);
                        events.push(Event::PointerMove {
                            world: (w.x, w.y),
                            screen: (p.x, p.y),
                            screen_delta: (pointer_delta.x, pointer_delta.y),
                        });
                    }
                    if !secondary_down {
                        events.push(Event::PointerRelease { over: over.clone() });
                    }
                }
                _ => {}
            }

            for event in events {
                self.apply_event(event);
            }
            for action in deferred {
                self.dispatch(action);
            }
        });
    }

    fn details_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("details_panel")
            .exact_height(92.0)
            .show(ctx, |ui| {
                let doc = &self.store.document;
                let Some(node) = self.selected.as_ref().and_then(|id| doc.node(id)) else {
                    ui.centered_and_justified(|ui| {
                        ui.weak("Click on a node to see its details");
                    });
                    return;
                };
                let first_line = |id: &str| -> String {
                    doc.node(id)
                        .map(|n| n.label.split('\n').next().unwrap_or("").to_string())
                        .unwrap_or_else(|| id.to_string())
                };
                ui.strong(node.label.replace('\n', " "));
                let upstream = doc.upstream_of(&node.id);
                let downstream = doc.downstream_of(&node.id);
                let depends_on = if upstream.is_empty() {
                    "None (independent)".to_string()
                } else {
                    let mut names: Vec<String> = upstream.iter().map(|id| first_line(id)).collect();
                    names.sort();
                    names.join(", ")
                };
                let required_by = if downstream.is_empty() {
                    "None (terminal node)".to_string()
                } else {
                    let mut names: Vec<String> =
                        downstream.iter().map(|id| first_line(id)).collect();
                    names.sort();
                    names.join(", ")
                };
                ui.label(format!("Depends on: {}", depends_on));
                ui.label(format!("Required by: {}", required_by));
                ui.small("Right-click arrow to delete | Double-click node to edit");
            });
    }

    fn node_editor_window(&mut self, ctx: &egui::Context) {
        let Some(mut editor) = self.node_editor.take() else {
            return;
        };
        let mut save = false;
        let mut cancel = false;
        let categories = self.store.document.categories.clone();
        let category_label = self.store.document.category_name(&editor.color).to_string();

        let mut open = true;
        egui::Window::new("Edit Node")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Node Name");
                ui.small("Use Enter for a second line (displayed in node)");
                ui.add(
                    egui::TextEdit::multiline(&mut editor.label)
                        .desired_rows(2)
                        .hint_text("Enter node name..."),
                );

                ui.add_space(6.0);
                ui.label(format!("Category: {}", category_label));
                ui.horizontal_wrapped(|ui| {
                    for cat in &categories {
                        let color = parse_hex_color(&cat.color).unwrap_or(Color32::GRAY);
                        let chosen = editor.color == cat.color;
                        if ui
                            .add(egui::Button::new(
                                egui::RichText::new(format!("⬤ {}", cat.name)).color(color),
                            )
                            .selected(chosen))
                            .clicked()
                        {
                            editor.color = cat.color.clone();
                        }
                    }
                });

                ui.add_space(6.0);
                ui.label("Description");
                ui.add(
                    egui::TextEdit::multiline(&mut editor.description)
                        .desired_rows(6)
                        .hint_text("Describe what this node does, its inputs and outputs..."),
                );

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    let can_save = !editor.label.trim().is_empty();
                    if ui
                        .add_enabled(can_save, egui::Button::new("Save Changes"))
                        .clicked()
                    {
                        save = true;
                    }
                });
            });

        if save {
            if self.dispatch(Action::EditNode {
                id: editor.id.clone(),
                label: editor.label.clone(),
                color: editor.color.clone(),
                description: editor.description.clone(),
            }) {
                self.apply_event(Event::FinishEdit);
                return;
            }
        } else if cancel || !open {
            self.apply_event(Event::FinishEdit);
            return;
        }
        self.node_editor = Some(editor);
    }

    fn versions_window(&mut self, ctx: &egui::Context) {
        if !self.show_versions_window {
            return;
        }
        let mut open = true;
        let versions = self.store.document.saved_versions.clone();
        let renaming = match &self.interaction {
            Interaction::EditingVersionName { id } => Some(id.clone()),
            _ => None,
        };

        enum VersionOp {
            Load(String),
            Delete(String),
            BeginRename(String, String),
            CommitRename(String),
            CancelRename,
        }
        let mut op: Option<VersionOp> = None;

        egui::Window::new("Saved Versions")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .show(ctx, |ui| {
                if versions.is_empty() {
                    ui.label("No saved versions yet. Click \"Save Version\" to create one.");
                }
                for version in &versions {
                    ui.horizontal(|ui| {
                        if renaming.as_deref() == Some(version.id.as_str()) {
                            let resp = ui.text_edit_singleline(&mut self.version_name_edit);
                            if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                                op = Some(VersionOp::CommitRename(version.id.clone()));
                            }
                            if ui.small_button("✓").clicked() {
                                op = Some(VersionOp::CommitRename(version.id.clone()));
                            }
                            if ui.small_button("×").clicked() {
                                op = Some(VersionOp::CancelRename);
                            }
                        } else {
                            if ui
                                .button(&version.name)
                                .on_hover_text("Load this version")
                                .clicked()
                            {
                                op = Some(VersionOp::Load(version.id.clone()));
                            }
                            ui.small(format_timestamp(version.created_at));
                            if ui.small_button("Rename").clicked() {
                                op = Some(VersionOp::BeginRename(
                                    version.id.clone(),
                                    version.name.clone(),
                                ));
                            }
                            if ui
                                .small_button(egui::RichText::new("Delete").color(Color32::RED))
                                .clicked()
                            {
                                op = Some(VersionOp::Delete(version.id.clone()));
                            }
                        }
                    });
                }
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save Version").clicked() {
                        op = None;
                        // handled below through the toolbar path
                        self.save_version_now();
                    }
                    if ui.button("Export").clicked() {
                        self.export_now();
                    }
                    if ui.button("Import…").clicked() {
                        self.show_import_window = true;
                    }
                });
            });

        match op {
            Some(VersionOp::Load(id)) => {
                if self.dispatch(Action::LoadVersion { id }) {
                    self.selected = None;
                }
            }
            Some(VersionOp::Delete(id)) => {
                self.dispatch(Action::DeleteVersion { id });
            }
            Some(VersionOp::BeginRename(id, name)) => {
                self.version_name_edit = name;
                self.apply_event(Event::BeginVersionRename { id });
            }
            Some(VersionOp::CommitRename(id)) => {
                let name = self.version_name_edit.trim().to_string();
                if self.dispatch(Action::RenameVersion { id, name }) {
                    self.apply_event(Event::FinishEdit);
                }
            }
            Some(VersionOp::CancelRename) => {
                self.apply_event(Event::FinishEdit);
            }
            None => {}
        }
        self.show_versions_window = open;
    }

    fn import_window(&mut self, ctx: &egui::Context) {
        if !self.show_import_window {
            return;
        }
        let mut open = true;
        let mut do_import = false;
        let mut cancel = false;
        egui::Window::new("Import")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Path to a previously exported JSON file:");
                ui.text_edit_singleline(&mut self.import_path);
                ui.horizontal(|ui| {
                    if ui.button("Import").clicked() {
                        do_import = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });
        if cancel {
            open = false;
        }
        if do_import {
            self.import_now();
        } else {
            self.show_import_window = open;
        }
    }

    fn prefs_window(&mut self, ctx: &egui::Context) {
        if !self.show_prefs_window {
            return;
        }
        let mut open = true;
        let mut do_save = false;
        egui::Window::new("Preferences")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Autosave directory (leave empty for OS default):");
                ui.text_edit_singleline(&mut self.prefs_autosave_override_str);
                ui.add_space(6.0);
                ui.label("Export directory (leave empty for OS temp):");
                ui.text_edit_singleline(&mut self.prefs_export_override_str);
                ui.add_space(6.0);
                ui.label("Settings save directory:");
                ui.monospace(AppSettings::settings_dir().display().to_string());
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        do_save = true;
                    }
                });
                if let Some(status) = &self.prefs_status {
                    ui.small(status.clone());
                }
            });
        if do_save {
            let trimmed = self.prefs_autosave_override_str.trim();
            self.app_settings.autosave_override = if trimmed.is_empty() {
                None
            } else {
                Some(std::path::PathBuf::from(trimmed))
            };
            let trimmed = self.prefs_export_override_str.trim();
            self.app_settings.export_override = if trimmed.is_empty() {
                None
            } else {
                Some(std::path::PathBuf::from(trimmed))
            };
            self.prefs_status = Some(match self.app_settings.save() {
                Ok(()) => "Saved".to_string(),
                Err(e) => format!("Save failed: {}", e),
            });
        }
        self.show_prefs_window = open;
    }

    fn context_menu_overlay(&mut self, ctx: &egui::Context) {
        let Some(menu) = self.context_menu.clone() else {
            return;
        };
        let mut close = false;
        match menu {
            ContextMenu::Canvas { screen, world } => {
                egui::Area::new("canvas_context_menu".into())
                    .fixed_pos(screen)
                    .show(ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.small("Canvas");
                            if ui.button("Add Node Here").clicked() {
                                self.dispatch(Action::AddNode {
                                    id: document::fresh_node_id(),
                                    label: "New Node".to_string(),
                                    x: world.x,
                                    y: world.y,
                                    color: "#3b82f6".to_string(),
                                    description: String::new(),
                                });
                                close = true;
                            }
                        });
                    });
            }
            ContextMenu::Node { id, screen } => {
                let Some(node) = self.store.document.node(&id).cloned() else {
                    self.context_menu = None;
                    return;
                };
                let categories = self.store.document.categories.clone();
                egui::Area::new("node_context_menu".into())
                    .fixed_pos(screen)
                    .show(ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.strong(node.label.replace('\n', " "));
                            ui.separator();
                            if ui.button("Edit Node").clicked() {
                                self.apply_event(Event::DoubleClickNode { id: id.clone() });
                                close = true;
                            }
                            ui.small("Category");
                            ui.horizontal(|ui| {
                                for cat in &categories {
                                    let color =
                                        parse_hex_color(&cat.color).unwrap_or(Color32::GRAY);
                                    if ui
                                        .add(
                                            egui::Button::new(
                                                egui::RichText::new("⬤").color(color),
                                            )
                                            .small(),
                                        )
                                        .on_hover_text(cat.name.clone())
                                        .clicked()
                                    {
                                        self.dispatch(Action::SetNodeColor {
                                            id: id.clone(),
                                            color: cat.color.clone(),
                                        });
                                        close = true;
                                    }
                                }
                            });
                            ui.separator();
                            if ui
                                .button(egui::RichText::new("Delete Node").color(Color32::RED))
                                .clicked()
                            {
                                if self.dispatch(Action::DeleteNode { id: id.clone() }) {
                                    if self.selected.as_deref() == Some(id.as_str()) {
                                        self.selected = None;
                                    }
                                }
                                close = true;
                            }
                        });
                    });
            }
        }
        if close {
            self.context_menu = None;
        }
    }

    // Bottom-right transient notice toast (visible for 3 seconds)
    fn toast(&mut self, ctx: &egui::Context) {
        let (Some(msg), Some(when)) = (&self.notice, self.notice_time) else {
            return;
        };
        if Instant::now().duration_since(when) > Duration::from_secs(3) {
            self.notice = None;
            self.notice_time = None;
            return;
        }
        let msg = msg.clone();
        let margin = egui::vec2(12.0, 12.0);
        egui::Area::new("bottom_right_toast".into())
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-margin.x, -margin.y))
            .interactable(false)
            .show(ctx, |ui| {
                let (fill, stroke_col, text_col) = match self.notice_style {
                    NoticeStyle::Info => (
                        Color32::from_rgba_premultiplied(30, 30, 30, 230),
                        Color32::from_gray(100),
                        Color32::LIGHT_GREEN,
                    ),
                    NoticeStyle::Error => (
                        Color32::from_rgba_premultiplied(40, 20, 20, 230),
                        Color32::from_rgb(120, 60, 60),
                        Color32::LIGHT_RED,
                    ),
                };
                egui::Frame::popup(ui.style())
                    .corner_radius(egui::CornerRadius::same(8))
                    .stroke(Stroke {
                        width: 1.5,
                        color: stroke_col,
                    })
                    .fill(fill)
                    .inner_margin(egui::Margin::symmetric(12, 8))
                    .show(ui, |ui| {
                        ui.colored_label(text_col, msg);
                    });
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

// Geometry helper: distance from point P to segment AB in screen space
fn point_segment_distance(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ap = Vec2::new(p.x - a.x, p.y - a.y);
    let ab = Vec2::new(b.x - a.x, b.y - a.y);
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    let proj = Pos2::new(a.x + ab.x * t, a.y + ab.y * t);
    ((p.x - proj.x).powi(2) + (p.y - proj.y).powi(2)).sqrt()
}

// "#rrggbb" -> Color32; tolerates the leading '#' being absent
fn parse_hex_color(hex: &str) -> Option<Color32> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

fn color_to_hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

fn format_timestamp(epoch_ms: i64) -> String {
    use time::OffsetDateTime;
    use time::macros::format_description;
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::from_unix_timestamp(epoch_ms / 1000)
        .ok()
        .and_then(|t| t.format(fmt).ok())
        .unwrap_or_else(|| "unknown".to_string())
}
