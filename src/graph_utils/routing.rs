use super::document::Node;

// Node boxes are 150x60 in world units, drawn centered on (x, y)
pub const NODE_HALF_W: f32 = 75.0;
pub const NODE_HALF_H: f32 = 30.0;

// Obstacle boxes are padded a little so edges keep clear of label text
const OBSTACLE_PADDING: f32 = 10.0;
// Vertical offset of the quadratic control point when detouring
const DETOUR_OFFSET: f32 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgePath {
    Line,
    Quad { control: (f32, f32) },
}

/// Intersect the line between two node centers with each node's rectangular
/// boundary so arrows start and end exactly at the box edges.
///
/// The line's slope decides whether it leaves through a vertical or a
/// horizontal face. Coincident centers fall back to the raw points.
pub fn edge_endpoints(from: (f32, f32), to: (f32, f32)) -> ((f32, f32), (f32, f32)) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if dx == 0.0 && dy == 0.0 {
        return (from, to);
    }

    let edge_slope = NODE_HALF_H / NODE_HALF_W;
    let through_vertical_face = dx != 0.0 && (dy / dx).abs() < edge_slope;

    let start = if through_vertical_face {
        let sx = if dx > 0.0 {
            from.0 + NODE_HALF_W
        } else {
            from.0 - NODE_HALF_W
        };
        (sx, from.1 + (dy / dx) * (sx - from.0))
    } else {
        let sy = if dy > 0.0 {
            from.1 + NODE_HALF_H
        } else {
            from.1 - NODE_HALF_H
        };
        (from.0 + (dx / dy) * (sy - from.1), sy)
    };

    let end = if through_vertical_face {
        let ex = if dx > 0.0 {
            to.0 - NODE_HALF_W
        } else {
            to.0 + NODE_HALF_W
        };
        (ex, from.1 + (dy / dx) * (ex - from.0))
    } else {
        let ey = if dy > 0.0 {
            to.1 - NODE_HALF_H
        } else {
            to.1 + NODE_HALF_H
        };
        (from.0 + (dx / dy) * (ey - from.1), ey)
    };

    (start, end)
}

/// Does the segment p1-p2 cross the padded bounding box of a node centered
/// at `center`?
pub fn segment_intersects_node(
    p1: (f32, f32),
    p2: (f32, f32),
    center: (f32, f32),
    padding: f32,
) -> bool {
    let half_w = NODE_HALF_W + padding;
    let half_h = NODE_HALF_H + padding;
    let left = center.0 - half_w;
    let right = center.0 + half_w;
    let top = center.1 - half_h;
    let bottom = center.1 + half_h;

    // Bounding-box reject before the per-face tests
    if p1.0.max(p2.0) < left
        || p1.0.min(p2.0) > right
        || p1.1.max(p2.1) < top
        || p1.1.min(p2.1) > bottom
    {
        return false;
    }

    let dx = p2.0 - p1.0;
    let dy = p2.1 - p1.1;
    let crosses = |e1: (f32, f32), e2: (f32, f32)| -> bool {
        let d1 = (e2.0 - e1.0) * (p1.1 - e1.1) - (e2.1 - e1.1) * (p1.0 - e1.0);
        let d2 = (e2.0 - e1.0) * (p2.1 - e1.1) - (e2.1 - e1.1) * (p2.0 - e1.0);
        let d3 = dx * (e1.1 - p1.1) - dy * (e1.0 - p1.0);
        let d4 = dx * (e2.1 - p1.1) - dy * (e2.0 - p1.0);
        d1 * d2 < 0.0 && d3 * d4 < 0.0
    };

    crosses((left, top), (right, top))
        || crosses((right, top), (right, bottom))
        || crosses((right, bottom), (left, bottom))
        || crosses((left, bottom), (left, top))
}

/// Route an edge from `start` to `end` (both already on node boundaries).
///
/// A straight segment is kept unless it passes through the box of a third
/// node; then the edge becomes a quadratic curve whose control point bulges
/// away from the obstacles' average vertical position.
pub fn route_edge(
    start: (f32, f32),
    end: (f32, f32),
    source_id: &str,
    target_id: &str,
    nodes: &[Node],
) -> EdgePath {
    let obstacles: Vec<&Node> = nodes
        .iter()
        .filter(|n| n.id != source_id && n.id != target_id)
        .filter(|n| segment_intersects_node(start, end, (n.x, n.y), OBSTACLE_PADDING))
        .collect();

    if obstacles.is_empty() {
        return EdgePath::Line;
    }

    let avg_obstacle_y = obstacles.iter().map(|n| n.y).sum::<f32>() / obstacles.len() as f32;
    let mid_y = (start.1 + end.1) / 2.0;
    let offset = if avg_obstacle_y > mid_y {
        -DETOUR_OFFSET
    } else {
        DETOUR_OFFSET
    };
    let mid_x = (start.0 + end.0) / 2.0;

    EdgePath::Quad {
        control: (mid_x, mid_y + offset),
    }
}
