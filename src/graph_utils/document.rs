use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Node identifiers are caller-visible strings ("ankle-knee", "node-<uuid>", ...)
pub type NodeId = String;

/// Display color used for nodes whose color matches no category.
pub const NO_CATEGORY_COLOR: &str = "#d1d5db";
pub const NO_CATEGORY_NAME: &str = "No Category";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    // May contain a single '\n' for two-line wrapping on the canvas
    pub label: String,
    pub x: f32,
    pub y: f32,
    // Hex color; doubles as the join key into the category list
    pub color: String,
    // Edges point from dependency to dependent: each entry here is an id
    // this node depends on.
    pub dependencies: Vec<NodeId>,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVersion {
    pub id: String,
    pub name: String,
    pub nodes: Vec<Node>,
    // epoch milliseconds
    pub created_at: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    pub saved_versions: Vec<SavedVersion>,
    pub categories: Vec<Category>,
}

impl GraphDocument {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    // An edge from -> to exists iff `to` lists `from` as a dependency
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.node(to)
            .map(|n| n.dependencies.iter().any(|d| d == from))
            .unwrap_or(false)
    }

    /// Would adding the edge from -> to ("to depends on from") close a cycle?
    ///
    /// BFS from `from` following existing dependency edges; reaching `to`
    /// means `from` already transitively depends on `to`.
    pub fn would_create_cycle(&self, from: &str, to: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(from);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.node(current) {
                for dep in &node.dependencies {
                    queue.push_back(dep);
                }
            }
        }
        false
    }

    /// Ids of every node transitively depending on `id` ("required by").
    pub fn downstream_of(&self, id: &str) -> HashSet<NodeId> {
        let mut downstream: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(id);
        while let Some(current) = queue.pop_front() {
            for node in &self.nodes {
                if node.dependencies.iter().any(|d| d == current)
                    && downstream.insert(node.id.clone())
                {
                    queue.push_back(&node.id);
                }
            }
        }
        downstream
    }

    /// Ids of every node `id` transitively depends on ("depends on").
    pub fn upstream_of(&self, id: &str) -> HashSet<NodeId> {
        let mut upstream: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = match self.node(id) {
            Some(n) => n.dependencies.iter().cloned().collect(),
            None => return upstream,
        };
        while let Some(current) = queue.pop_front() {
            if upstream.contains(&current) {
                continue;
            }
            if let Some(node) = self.node(&current) {
                for dep in &node.dependencies {
                    queue.push_back(dep.clone());
                }
            }
            upstream.insert(current);
        }
        upstream
    }

    // Category join: a node color that matches no category falls back to
    // the "No Category" display color.
    pub fn display_color<'a>(&'a self, node_color: &'a str) -> &'a str {
        if self.categories.iter().any(|c| c.color == node_color) {
            node_color
        } else {
            NO_CATEGORY_COLOR
        }
    }

    pub fn category_name(&self, color: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.color == color)
            .map(|c| c.name.as_str())
            .unwrap_or(NO_CATEGORY_NAME)
    }

    pub fn version(&self, id: &str) -> Option<&SavedVersion> {
        self.saved_versions.iter().find(|v| v.id == id)
    }

    /// The seeded demo document: the biomechanical analysis chain rooted at
    /// ankle-knee, laid out with the layered algorithm.
    pub fn demo() -> Self {
        let mut doc = Self {
            nodes: demo_nodes(),
            saved_versions: Vec::new(),
            categories: demo_categories(),
        };
        let positioned = crate::graph_utils::layout::layered_layout(&doc.nodes);
        for node in &mut doc.nodes {
            if let Some(&(x, y)) = positioned.get(&node.id) {
                node.x = x;
                node.y = y;
            }
        }
        doc
    }
}

// Ids for interactively created nodes and versions
pub fn fresh_node_id() -> NodeId {
    format!("node-{}", Uuid::now_v7())
}

pub fn fresh_version_id() -> String {
    format!("v-{}", Uuid::now_v7())
}

fn demo_node(id: &str, label: &str, color: &str, deps: &[&str], description: &str) -> Node {
    Node {
        id: id.to_string(),
        label: label.to_string(),
        x: 0.0,
        y: 0.0,
        color: color.to_string(),
        dependencies: deps.iter().map(|d| d.to_string()).collect(),
        description: description.to_string(),
    }
}

fn demo_nodes() -> Vec<Node> {
    vec![
        demo_node(
            "ankle-knee",
            "Ankle-Knee\nAnalysis",
            "#3b82f6",
            &[],
            "Analyzes tibia inclination and knee position relative to gravity line. \
             Identifies dorsiflexion stance (tibia forward) vs. hyperextension patterns. \
             Foundation for all superior compensations.",
        ),
        demo_node(
            "knee-hip",
            "Knee-Hip\nRelationship",
            "#3b82f6",
            &["ankle-knee"],
            "Examines femur positioning and hip-knee coordination. Determines if knee \
             deviations propagate upward or get compensated. Critical for understanding \
             lower chain mechanics.",
        ),
        demo_node(
            "pelvis",
            "Pelvis\n(Tilt & Translation)",
            "#8b5cf6",
            &["knee-hip", "ankle-knee"],
            "Assesses pelvic anterior/posterior tilt and forward/backward shift. Links \
             lower body mechanics to spinal behavior. Key junction point determining \
             lumbar curve and thorax positioning.",
        ),
        demo_node(
            "lumbar",
            "Lumbar Spine\n(Lordosis/Kyphosis)",
            "#ec4899",
            &["pelvis"],
            "Evaluates lumbar curve in response to pelvic position. Identifies \
             hyperextension, loss of lordosis, or kinetic breaks. Determines lumbosacral \
             compression zones and spinal compensation strategies.",
        ),
        demo_node(
            "thorax",
            "Thorax\n(Kyphosis)",
            "#ef4444",
            &["lumbar"],
            "Analyzes thoracic kyphosis, sternum position, and upper-lower thorax \
             relationship. Determines if thorax compensates for lumbar patterns or \
             creates independent deviations affecting breathing and shoulder mechanics.",
        ),
        demo_node(
            "trunk-pressure",
            "Trunk Pressure\nDistribution",
            "#f59e0b",
            &["pelvis", "lumbar"],
            "Identifies compression and shear zones in trunk. Analyzes ventral vs. \
             dorsal tension patterns (EEC/CCC). Maps pressure distribution from pelvis \
             through lumbar region.",
        ),
        demo_node(
            "cervical",
            "Cervical-Head\n(Neck & Jaw)",
            "#dc2626",
            &["thorax"],
            "Examines forward head posture, cervical extension, and craniocervical \
             junction. Determines if head position compensates for thorax or creates \
             independent anterior shift. Includes jaw and occiput tension patterns.",
        ),
        demo_node(
            "shoulder",
            "Shoulder-Arm\nRotation",
            "#f97316",
            &["thorax"],
            "Assesses shoulder elevation asymmetry and arm rotation patterns in response \
             to thorax positioning. Secondary analysis complementing primary sagittal \
             chain.",
        ),
        demo_node(
            "kinetic-breaks",
            "Kinetic Breaks\nDetection",
            "#14b8a6",
            &["lumbar", "thorax"],
            "Identifies discontinuities in kinetic chain where force transmission breaks \
             down. Detects segments moving in opposite directions or rigid areas \
             preventing natural compensatory flow.",
        ),
        demo_node(
            "integration",
            "Integration\n(Spannungsdreieck)",
            "#6366f1",
            &[
                "pelvis",
                "lumbar",
                "thorax",
                "cervical",
                "trunk-pressure",
                "kinetic-breaks",
                "shoulder",
            ],
            "Synthesizes all node outputs into holistic pattern analysis. Identifies \
             primary causative deviation, top-3 structural issues, and dominant \
             compensation strategy. Determines correction priority: sternum -> pelvis -> \
             head.",
        ),
    ]
}

fn demo_categories() -> Vec<Category> {
    [
        ("Lower Body", "#3b82f6"),
        ("Pelvis", "#8b5cf6"),
        ("Spine", "#ec4899"),
        ("Upper Body", "#ef4444"),
        ("Pressure", "#f59e0b"),
        ("Integration", "#6366f1"),
        ("Detection", "#14b8a6"),
    ]
    .iter()
    .map(|(name, color)| Category {
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}
