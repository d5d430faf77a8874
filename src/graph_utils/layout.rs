use std::collections::{HashMap, HashSet, VecDeque};

use super::document::{Node, NodeId};

// Canvas geometry for the layered layout
pub const LAYER_SPACING: f32 = 250.0;
pub const NODE_SPACING: f32 = 150.0;
pub const START_X: f32 = 120.0;
pub const CENTER_Y: f32 = 300.0;

/// Assign each node an integer layer: zero-dependency roots sit at layer 0,
/// every other node at 1 + the maximum layer of its dependencies.
///
/// Nodes reachable via multiple paths take the maximum, so a dependency is
/// always strictly left of its dependents. Computed in topological order;
/// nodes caught in a (malformed) cycle never become ready and are left
/// without a layer.
pub fn assign_layers(nodes: &[Node]) -> HashMap<NodeId, usize> {
    let mut remaining_deps: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    for node in nodes {
        // Ignore dangling dependency ids rather than stalling the queue
        let live_deps = node
            .dependencies
            .iter()
            .filter(|d| ids.contains(d.as_str()))
            .count();
        remaining_deps.insert(&node.id, live_deps);
        for dep in &node.dependencies {
            if ids.contains(dep.as_str()) {
                dependents.entry(dep).or_default().push(&node.id);
            }
        }
    }

    let mut layers: HashMap<NodeId, usize> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    // Deterministic seeding order for stable output
    let mut roots: Vec<&str> = nodes
        .iter()
        .filter(|n| remaining_deps.get(n.id.as_str()) == Some(&0))
        .map(|n| n.id.as_str())
        .collect();
    roots.sort_unstable();
    for root in roots {
        layers.insert(root.to_string(), 0);
        queue.push_back(root);
    }

    while let Some(current) = queue.pop_front() {
        let current_layer = layers.get(current).copied().unwrap_or(0);
        for &dependent in dependents.get(current).map(Vec::as_slice).unwrap_or(&[]) {
            let entry = layers.entry(dependent.to_string()).or_insert(0);
            if *entry < current_layer + 1 {
                *entry = current_layer + 1;
            }
            let rem = remaining_deps.entry(dependent).or_insert(1);
            *rem = rem.saturating_sub(1);
            if *rem == 0 {
                queue.push_back(dependent);
            }
        }
    }
    layers
}

/// Number of distinct nodes transitively depending on `id`, used to sort the
/// busiest subtrees toward the top of each layer.
fn downstream_count(
    id: &str,
    dependents: &HashMap<&str, Vec<&str>>,
    memo: &mut HashMap<NodeId, usize>,
) -> usize {
    if let Some(&n) = memo.get(id) {
        return n;
    }
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(id);
    while let Some(current) = queue.pop_front() {
        for &dependent in dependents.get(current).map(Vec::as_slice).unwrap_or(&[]) {
            if seen.insert(dependent) {
                queue.push_back(dependent);
            }
        }
    }
    let n = seen.len();
    memo.insert(id.to_string(), n);
    n
}

/// Deterministic (x, y) per node: fixed horizontal spacing between layers,
/// fixed vertical spacing between siblings, each layer vertically centered.
pub fn layered_layout(nodes: &[Node]) -> HashMap<NodeId, (f32, f32)> {
    let layers = assign_layers(nodes);

    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in nodes {
        for dep in &node.dependencies {
            dependents.entry(dep).or_default().push(&node.id);
        }
    }
    let mut memo: HashMap<NodeId, usize> = HashMap::new();

    let mut by_layer: HashMap<usize, Vec<&str>> = HashMap::new();
    for (id, layer) in &layers {
        by_layer.entry(*layer).or_default().push(id);
    }

    let mut positioned: HashMap<NodeId, (f32, f32)> = HashMap::new();
    for (layer, ids) in by_layer.iter_mut() {
        ids.sort_by(|a, b| {
            let ca = downstream_count(a, &dependents, &mut memo);
            let cb = downstream_count(b, &dependents, &mut memo);
            cb.cmp(&ca).then_with(|| a.cmp(b))
        });
        let layer_x = START_X + *layer as f32 * LAYER_SPACING;
        let total_height = ids.len().saturating_sub(1) as f32 * NODE_SPACING;
        let layer_start_y = CENTER_Y - total_height / 2.0;
        for (index, id) in ids.iter().enumerate() {
            positioned.insert(
                id.to_string(),
                (layer_x, layer_start_y + index as f32 * NODE_SPACING),
            );
        }
    }
    positioned
}
