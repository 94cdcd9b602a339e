mod clock;
mod forces;
mod quadtree;

use eframe::egui::Vec2;

use super::graph::GraphModel;
use crate::config::PhysicsConfig;
use forces::{accumulate_repulsion_for_node, centering, repulsion_between, spring_between};
use quadtree::QuadNode;

pub use clock::TickClock;

const SLEEP_SPEED: f32 = 0.005;
const SLEEP_FORCE: f32 = 0.005;

#[derive(Default)]
struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
}

/// Live layout state owned by one graph view. Tick and render borrow it; nothing global.
#[derive(Default)]
pub struct SimulationContext {
    model: GraphModel,
    scratch: PhysicsScratch,
    ticks: u64,
}

impl SimulationContext {
    pub fn new(model: GraphModel) -> Self {
        Self {
            model,
            scratch: PhysicsScratch::default(),
            ticks: 0,
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut GraphModel {
        &mut self.model
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Swaps in a rebuilt model, optionally carrying over positions of surviving events.
    pub fn replace_model(&mut self, mut model: GraphModel, keep_positions: bool) {
        if keep_positions {
            model.adopt_positions(&self.model);
        }
        self.model = model;
        self.ticks = 0;
    }

    /// Fixes a node at `world`. The node keeps no momentum while pinned.
    pub fn pin(&mut self, index: usize, world: Vec2) {
        if let Some(node) = self.model.nodes.get_mut(index) {
            node.pin = Some(world);
            node.position = world;
            node.velocity = Vec2::ZERO;
        }
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(node) = self.model.nodes.get_mut(index) {
            node.pin = None;
            node.velocity = Vec2::ZERO;
        }
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.model
            .nodes
            .iter()
            .map(|node| node.velocity.length_sq())
            .sum()
    }

    /// Advances one tick. Returns whether any node moved.
    pub fn step(&mut self, config: &PhysicsConfig) -> bool {
        self.ticks += 1;
        step_physics(&mut self.model, &mut self.scratch, config)
    }
}

fn step_physics(model: &mut GraphModel, scratch: &mut PhysicsScratch, config: &PhysicsConfig) -> bool {
    let node_count = model.nodes.len();
    if node_count == 0 {
        return false;
    }

    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.positions.clear();
    scratch
        .positions
        .extend(model.nodes.iter().map(|node| node.position));

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;

    if node_count > config.barnes_hut_threshold {
        if let Some(tree) = QuadNode::build(positions) {
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_repulsion_for_node(
                    &tree,
                    index,
                    positions,
                    config.repulsion,
                    config.barnes_hut_theta,
                    force,
                );
            }
        }
    } else {
        for i in 0..node_count {
            for j in (i + 1)..node_count {
                let push = repulsion_between(positions[i], positions[j], config.repulsion, (i, j));
                forces[i] += push;
                forces[j] -= push;
            }
        }
    }

    for edge in &model.edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let pull = spring_between(
            positions[from],
            positions[to],
            config.spring_length,
            config.spring_strength,
            (from, to),
        );
        forces[from] += pull;
        forces[to] -= pull;
    }

    for (force, position) in forces.iter_mut().zip(positions) {
        *force += centering(*position, config.center_strength);
    }

    let max_speed_sq = config.max_speed * config.max_speed;
    let mut any_motion = false;
    for (node, force) in model.nodes.iter_mut().zip(forces.iter()) {
        if let Some(pin) = node.pin {
            node.position = pin;
            node.velocity = Vec2::ZERO;
            continue;
        }

        let mut velocity = node.velocity + *force;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= config.max_speed / speed_sq.sqrt();
        }

        node.position += velocity;
        velocity *= config.damping;

        if velocity.length_sq() < SLEEP_SPEED * SLEEP_SPEED
            && force.length_sq() < SLEEP_FORCE * SLEEP_FORCE
        {
            velocity = Vec2::ZERO;
        }

        node.velocity = velocity;
        if velocity != Vec2::ZERO {
            any_motion = true;
        }
    }

    any_motion
}
