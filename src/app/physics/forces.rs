use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

/// Distances below this are treated as this, so coincident nodes never divide by zero.
pub(super) const MIN_DISTANCE: f32 = 1.0;

/// Unit vector from `b` to `a`, or a deterministic fallback when they coincide.
fn separation(a: Vec2, b: Vec2, seed: (usize, usize)) -> (Vec2, f32) {
    let delta = a - b;
    let distance = delta.length();
    if distance > 0.0001 {
        return (delta / distance, distance.max(MIN_DISTANCE));
    }

    let angle = ((seed.0 as f32) * 0.618_034 + (seed.1 as f32) * 0.414_214) * std::f32::consts::TAU;
    (vec2(angle.cos(), angle.sin()), MIN_DISTANCE)
}

/// Inverse-square push on `a` away from `b`.
pub(super) fn repulsion_between(a: Vec2, b: Vec2, strength: f32, seed: (usize, usize)) -> Vec2 {
    let (direction, distance) = separation(a, b, seed);
    direction * (strength / (distance * distance))
}

/// Hooke spring acting on the source end; the target receives the negation.
pub(super) fn spring_between(
    source: Vec2,
    target: Vec2,
    rest_length: f32,
    strength: f32,
    seed: (usize, usize),
) -> Vec2 {
    let (direction, distance) = separation(target, source, seed);
    direction * ((distance - rest_length) * strength)
}

pub(super) fn centering(position: Vec2, strength: f32) -> Vec2 {
    -position * strength
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += repulsion_between(
                point,
                positions[other_index],
                strength,
                (index, other_index),
            );
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE * MIN_DISTANCE);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < theta)
        && node.mass > 1.0;

    if can_approximate {
        let direction = delta / distance;
        *force += direction * ((strength * node.mass) / distance_sq);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, strength, theta, force);
    }
}
