use eframe::egui::{Vec2, vec2};

use super::super::model::ResolvedEdge;
use super::quadtree::QuadNode;

const MIN_DISTANCE_SQ: f32 = 1.0;

/// Direction used when two points coincide, so they still separate deterministically.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) struct LinkParams {
    pub(super) distance: f32,
    pub(super) strength: f32,
    pub(super) alpha: f32,
}

/// Spring toward `distance`, using each endpoint's position plus velocity. The correction is
/// split evenly between the endpoints.
pub(super) fn apply_links(
    edges: &[ResolvedEdge],
    degree: &[usize],
    positions: &[Vec2],
    velocities: &[Vec2],
    params: LinkParams,
    delta_v: &mut [Vec2],
) {
    for edge in edges {
        let (source, target) = (edge.source, edge.target);
        if source == target {
            continue;
        }

        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        let mut distance = delta.length();
        if distance <= 1e-6 {
            delta = jiggle(source, target) * 1e-3;
            distance = 1e-3;
        }

        let min_degree = degree[source].min(degree[target]).max(1) as f32;
        let strength = params.strength / min_degree;
        let stretch = (distance - params.distance) / distance;
        let correction = delta * (stretch * params.alpha * strength);

        delta_v[target] -= correction * 0.5;
        delta_v[source] += correction * 0.5;
    }
}

fn pair_repulsion(delta: Vec2, from: usize, to: usize, scaled_strength: f32) -> Vec2 {
    let distance_sq = delta.length_sq();
    if distance_sq <= 1e-12 {
        return jiggle(from, to) * (scaled_strength / MIN_DISTANCE_SQ.sqrt());
    }
    delta * (scaled_strength / distance_sq.max(MIN_DISTANCE_SQ))
}

/// Exact O(n²) many-body force. `strength` follows the usual sign convention: negative values
/// repel.
pub(super) fn apply_repulsion_exact(
    positions: &[Vec2],
    strength: f32,
    alpha: f32,
    delta_v: &mut [Vec2],
) {
    let scaled = -strength * alpha;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let push = pair_repulsion(positions[i] - positions[j], i, j, scaled);
            delta_v[i] += push;
            delta_v[j] -= push;
        }
    }
}

pub(super) fn apply_repulsion_barnes_hut(
    tree: &QuadNode,
    positions: &[Vec2],
    strength: f32,
    alpha: f32,
    theta: f32,
    delta_v: &mut [Vec2],
) {
    let scaled = -strength * alpha;
    for (index, force) in delta_v.iter_mut().enumerate() {
        accumulate_repulsion_for_node(tree, index, positions, scaled, theta, force);
    }
}

fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    scaled_strength: f32,
    theta: f32,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *force += pair_repulsion(point - positions[other], index, other, scaled_strength);
            }
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let can_approximate =
        !node.bounds.contains(point) && (node.bounds.side_length() / distance_sq.sqrt()) < theta;

    if can_approximate {
        *force += delta * (scaled_strength * node.mass / distance_sq);
        return;
    }

    for child in node.children() {
        accumulate_repulsion_for_node(child, index, positions, scaled_strength, theta, force);
    }
}

/// Moves the centroid of the free nodes toward `center`. Every free node gets the same shift.
pub(super) fn apply_center(
    positions: &[Vec2],
    pinned: &[bool],
    center: Vec2,
    strength: f32,
    delta_v: &mut [Vec2],
) {
    let mut centroid = Vec2::ZERO;
    let mut free = 0usize;
    for (position, &is_pinned) in positions.iter().zip(pinned) {
        if !is_pinned {
            centroid += *position;
            free += 1;
        }
    }
    if free == 0 {
        return;
    }

    let shift = (center - centroid / free as f32) * strength;
    for (force, &is_pinned) in delta_v.iter_mut().zip(pinned) {
        if !is_pinned {
            *force += shift;
        }
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) min_distance: f32,
    pub(super) strength: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    params: CollisionParams,
    delta_v: &mut [Vec2],
) {
    let delta = predicted[from] - predicted[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= params.min_distance * params.min_distance {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > 1e-6 {
        delta / distance
    } else {
        jiggle(from, to)
    };
    let push = direction * ((params.min_distance - distance) * params.strength * 0.5);
    delta_v[from] += push;
    delta_v[to] -= push;
}

/// Exact pairwise separation on predicted positions.
pub(super) fn apply_collision_exact(
    predicted: &[Vec2],
    params: CollisionParams,
    delta_v: &mut [Vec2],
) {
    for from in 0..predicted.len() {
        for to in (from + 1)..predicted.len() {
            resolve_overlap(from, to, predicted, params, delta_v);
        }
    }
}

/// Dual-tree traversal that only visits cell pairs closer than the separation distance.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    predicted: &[Vec2],
    params: CollisionParams,
    delta_v: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.min_distance * params.min_distance {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (i, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[(i + 1)..] {
                    resolve_overlap(from, to, predicted, params, delta_v);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, predicted, params, delta_v);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (first, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, predicted, params, delta_v);
            for child_b in &children[(first + 1)..] {
                accumulate_collision_pairs(child_a, child_b, false, predicted, params, delta_v);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, predicted, params, delta_v);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, predicted, params, delta_v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros(count: usize) -> Vec<Vec2> {
        vec![Vec2::ZERO; count]
    }

    #[test]
    fn stretched_link_pulls_endpoints_together_symmetrically() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let mut delta_v = zeros(2);
        apply_links(
            &[ResolvedEdge {
                source: 0,
                target: 1,
                edge: 0,
            }],
            &[1, 1],
            &positions,
            &zeros(2),
            LinkParams {
                distance: 60.0,
                strength: 1.0,
                alpha: 1.0,
            },
            &mut delta_v,
        );

        assert!((delta_v[0].x - 20.0).abs() < 1e-4);
        assert!((delta_v[1].x + 20.0).abs() < 1e-4);
        assert_eq!(delta_v[0] + delta_v[1], Vec2::ZERO);
    }

    #[test]
    fn compressed_link_pushes_endpoints_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(30.0, 0.0)];
        let mut delta_v = zeros(2);
        apply_links(
            &[ResolvedEdge {
                source: 0,
                target: 1,
                edge: 0,
            }],
            &[1, 1],
            &positions,
            &zeros(2),
            LinkParams {
                distance: 60.0,
                strength: 1.0,
                alpha: 0.5,
            },
            &mut delta_v,
        );

        assert!(delta_v[0].x < 0.0);
        assert!(delta_v[1].x > 0.0);
    }

    #[test]
    fn repulsion_magnitude_falls_off_with_distance() {
        let near = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let far = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let mut near_v = zeros(2);
        let mut far_v = zeros(2);
        apply_repulsion_exact(&near, -300.0, 1.0, &mut near_v);
        apply_repulsion_exact(&far, -300.0, 1.0, &mut far_v);

        assert!(near_v[0].x < 0.0 && near_v[1].x > 0.0);
        assert!((near_v[0].x + 30.0).abs() < 1e-3);
        assert!((far_v[0].x + 3.0).abs() < 1e-3);
    }

    #[test]
    fn coincident_nodes_still_separate() {
        let positions = vec![vec2(5.0, 5.0), vec2(5.0, 5.0)];
        let mut delta_v = zeros(2);
        apply_repulsion_exact(&positions, -300.0, 1.0, &mut delta_v);
        assert!(delta_v[0].length() > 0.0);
        assert!((delta_v[0] + delta_v[1]).length() < 1e-4);
    }

    #[test]
    fn barnes_hut_tracks_exact_repulsion() {
        let positions = (0..600)
            .map(|i| {
                let angle = i as f32 * 0.37;
                vec2(960.0, 540.0) + vec2(angle.cos(), angle.sin()) * (20.0 + i as f32 * 0.8)
            })
            .collect::<Vec<_>>();
        let mut exact = zeros(positions.len());
        let mut approx = zeros(positions.len());
        apply_repulsion_exact(&positions, -300.0, 0.5, &mut exact);
        let tree = QuadNode::build(&positions).unwrap();
        apply_repulsion_barnes_hut(&tree, &positions, -300.0, 0.5, 0.5, &mut approx);

        let mut error = 0.0;
        let mut magnitude = 0.0;
        for (a, b) in exact.iter().zip(&approx) {
            error += (*a - *b).length();
            magnitude += a.length();
        }
        assert!(error / magnitude < 0.1, "relative error {}", error / magnitude);
    }

    #[test]
    fn center_shifts_free_nodes_uniformly() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0), vec2(500.0, 500.0)];
        let pinned = vec![false, false, true];
        let mut delta_v = zeros(3);
        apply_center(&positions, &pinned, vec2(150.0, 100.0), 0.1, &mut delta_v);

        assert_eq!(delta_v[0], vec2(10.0, 10.0));
        assert_eq!(delta_v[1], vec2(10.0, 10.0));
        assert_eq!(delta_v[2], Vec2::ZERO);
    }

    #[test]
    fn collision_only_touches_overlapping_pairs() {
        let predicted = vec![vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(200.0, 0.0)];
        let mut delta_v = zeros(3);
        let params = CollisionParams {
            min_distance: 30.0,
            strength: 1.0,
        };
        apply_collision_exact(&predicted, params, &mut delta_v);

        assert_eq!(delta_v[0], vec2(-10.0, 0.0));
        assert_eq!(delta_v[1], vec2(10.0, 0.0));
        assert_eq!(delta_v[2], Vec2::ZERO);
    }

    #[test]
    fn tree_collision_matches_exact() {
        let predicted = (0..400)
            .map(|i| vec2((i % 20) as f32 * 22.0, (i / 20) as f32 * 22.0))
            .collect::<Vec<_>>();
        let params = CollisionParams {
            min_distance: 30.0,
            strength: 1.0,
        };
        let mut exact = zeros(predicted.len());
        let mut tree_v = zeros(predicted.len());
        apply_collision_exact(&predicted, params, &mut exact);
        let tree = QuadNode::build(&predicted).unwrap();
        accumulate_collision_pairs(&tree, &tree, true, &predicted, params, &mut tree_v);

        for (a, b) in exact.iter().zip(&tree_v) {
            assert!((*a - *b).length() < 1e-3);
        }
    }
}
