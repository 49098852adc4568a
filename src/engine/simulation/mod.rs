mod forces;
mod quadtree;

use eframe::egui::Vec2;
use tracing::{debug, info};

use crate::config::{CanvasConfig, SimulationConfig};

use super::model::GraphModel;
use forces::{
    CollisionParams, LinkParams, accumulate_collision_pairs, apply_center, apply_collision_exact,
    apply_links, apply_repulsion_barnes_hut, apply_repulsion_exact,
};
use quadtree::QuadNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    Seeding,
    Running,
    Cooling,
    Settled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub ticked: bool,
    pub settled: bool,
    pub max_displacement: f32,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pinned: Vec<bool>,
    delta_v: Vec<Vec2>,
    predicted: Vec<Vec2>,
}

pub struct SimulationState {
    config: SimulationConfig,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    tick_count: u64,
    phase: SimulationPhase,
    scratch: Scratch,
}

impl SimulationState {
    pub fn new(config: SimulationConfig, canvas: &CanvasConfig) -> Self {
        Self {
            config,
            center: canvas.center(),
            alpha: config.alpha_start,
            alpha_target: 0.0,
            tick_count: 0,
            phase: SimulationPhase::Seeding,
            scratch: Scratch::default(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_active(&self) -> bool {
        self.phase != SimulationPhase::Settled
    }

    /// Grab reheat: alpha jumps to the hot value and is held there until `release`.
    pub fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.alpha_hot);
        self.alpha_target = self.config.alpha_hot;
        self.set_phase(SimulationPhase::Running);
    }

    /// Drops the alpha target back to zero without touching alpha itself.
    pub fn release(&mut self) {
        self.alpha_target = 0.0;
    }

    /// Swaps force parameters and restarts the layout from the hot value.
    pub fn set_config(&mut self, config: SimulationConfig) {
        self.config = config;
        self.alpha = self.alpha.max(config.alpha_hot);
        self.set_phase(SimulationPhase::Running);
    }

    fn set_phase(&mut self, phase: SimulationPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, alpha = self.alpha, "simulation phase");
            self.phase = phase;
        }
    }

    pub fn tick(&mut self, model: &mut GraphModel) -> TickReport {
        if self.phase == SimulationPhase::Settled {
            return TickReport::default();
        }

        self.alpha = self.alpha_target + (self.alpha - self.alpha_target) * self.config.alpha_decay;
        self.tick_count += 1;

        let node_count = model.node_count();
        self.load_scratch(model);

        let config = self.config;
        let alpha = self.alpha;
        let use_tree = node_count > config.barnes_hut_threshold;
        let scratch = &mut self.scratch;

        apply_links(
            model.edges(),
            model.degree(),
            &scratch.positions,
            &scratch.velocities,
            LinkParams {
                distance: config.link_distance,
                strength: config.link_strength,
                alpha,
            },
            &mut scratch.delta_v,
        );

        let position_tree = if use_tree {
            QuadNode::build(&scratch.positions)
        } else {
            None
        };
        match &position_tree {
            Some(tree) => apply_repulsion_barnes_hut(
                tree,
                &scratch.positions,
                config.charge_strength,
                alpha,
                config.theta,
                &mut scratch.delta_v,
            ),
            None => apply_repulsion_exact(
                &scratch.positions,
                config.charge_strength,
                alpha,
                &mut scratch.delta_v,
            ),
        }

        apply_center(
            &scratch.positions,
            &scratch.pinned,
            self.center,
            config.center_strength,
            &mut scratch.delta_v,
        );

        scratch.predicted.clear();
        for index in 0..node_count {
            scratch.predicted.push(if scratch.pinned[index] {
                scratch.positions[index]
            } else {
                scratch.positions[index] + scratch.velocities[index] + scratch.delta_v[index]
            });
        }

        let collision = CollisionParams {
            min_distance: config.collision_radius * 2.0,
            strength: config.collision_strength,
        };
        if collision.min_distance > 0.0 {
            let predicted_tree = if use_tree {
                QuadNode::build(&scratch.predicted)
            } else {
                None
            };
            match &predicted_tree {
                Some(tree) => accumulate_collision_pairs(
                    tree,
                    tree,
                    true,
                    &scratch.predicted,
                    collision,
                    &mut scratch.delta_v,
                ),
                None => apply_collision_exact(&scratch.predicted, collision, &mut scratch.delta_v),
            }
        }

        let max_displacement = self.commit(model);

        let settled = if self.alpha <= config.alpha_min && self.alpha_target <= config.alpha_min {
            self.set_phase(SimulationPhase::Settled);
            info!(
                ticks = self.tick_count,
                max_displacement,
                "layout settled"
            );
            true
        } else if self.alpha < config.cooling_alpha {
            self.set_phase(SimulationPhase::Cooling);
            false
        } else {
            self.set_phase(SimulationPhase::Running);
            false
        };

        TickReport {
            ticked: true,
            settled,
            max_displacement,
        }
    }

    fn load_scratch(&mut self, model: &GraphModel) {
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.pinned.clear();
        for state in model.states() {
            scratch.positions.push(state.pinned.unwrap_or(state.position));
            scratch.velocities.push(state.velocity);
            scratch.pinned.push(state.is_pinned());
        }
        scratch.delta_v.clear();
        scratch.delta_v.resize(model.node_count(), Vec2::ZERO);
    }

    /// Semi-implicit Euler over the scratch buffers; nothing in the model is written before
    /// every force has been evaluated.
    fn commit(&mut self, model: &mut GraphModel) -> f32 {
        let retain = 1.0 - self.config.velocity_decay;
        let scratch = &self.scratch;
        let mut max_displacement = 0.0_f32;

        for (index, state) in model.states_mut().iter_mut().enumerate() {
            if let Some(pin) = state.pinned {
                state.position = pin;
                state.velocity = Vec2::ZERO;
                continue;
            }

            let velocity = (scratch.velocities[index] + scratch.delta_v[index]) * retain;
            let position = scratch.positions[index] + velocity;
            if !velocity.is_finite() || !position.is_finite() {
                state.velocity = Vec2::ZERO;
                continue;
            }

            max_displacement = max_displacement.max(velocity.length());
            state.velocity = velocity;
            state.position = position;
        }

        max_displacement
    }
}
