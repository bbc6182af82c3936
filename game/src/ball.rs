//! Ball simulation: steering forces, hole detection and the floor catch.
//!
//! The ball never stores an "over a hole" flag. A contact that looks like the
//! ball resting on the board triggers [`is_over_hole`] on the last position the
//! engine reported; a hit forces the ball downward through the surface. Once the
//! ball drops below the fall threshold it is put back at the spawn point and the
//! fall is handed to the caller.

use marble_maze_shared::config::MazeConfig;
use marble_maze_shared::layout::{Hole, MazeLayout};
use marble_maze_shared::vec3::{planar_distance, Vec3};

use crate::engine::{BodyHandle, PhysicsEngine, SphereDesc};
use crate::input::InputState;

/// Planar steering force for the held directions.
/// Opposing flags cancel component-wise.
pub fn planar_force(input: &InputState, magnitude: f64) -> Vec3 {
    let mut force = Vec3::ZERO;
    if input.up {
        force.z -= magnitude;
    }
    if input.down {
        force.z += magnitude;
    }
    if input.left {
        force.x -= magnitude;
    }
    if input.right {
        force.x += magnitude;
    }
    force
}

/// First hole (in layout order) whose centre is closer than `capture_radius`
/// to `position` in the board plane.
pub fn is_over_hole(position: Vec3, holes: &[Hole], capture_radius: f64) -> Option<Hole> {
    holes
        .iter()
        .copied()
        .find(|hole| planar_distance(position, hole.x, hole.z) < capture_radius)
}

/// Raised when the floor catch resets the ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallFell {
    /// Position reported by the engine below the threshold
    pub caught_at: Vec3,
}

pub struct BallSimulation {
    body: BodyHandle,
    spawn: Vec3,
    holes: Vec<Hole>,
    config: MazeConfig,
    last_position: Option<Vec3>,
}

impl BallSimulation {
    /// Register the ball at the layout's spawn point and subscribe to its position.
    pub fn spawn(engine: &mut impl PhysicsEngine, layout: &MazeLayout, config: MazeConfig) -> Self {
        let body = engine.add_sphere(SphereDesc {
            radius: config.ball_radius,
            mass: config.ball_mass,
            position: layout.spawn,
            report_contacts: true,
        });
        engine.subscribe_position(body);

        Self {
            body,
            spawn: layout.spawn,
            holes: layout.holes.clone(),
            config,
            last_position: None,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn spawn_position(&self) -> Vec3 {
        self.spawn
    }

    /// Last position reported by the engine, if any.
    pub fn last_position(&self) -> Option<Vec3> {
        self.last_position
    }

    /// Force tick. Applies the steering force at the body origin when a
    /// direction is held and returns it.
    pub fn apply_input(&self, input: &InputState, engine: &mut impl PhysicsEngine) -> Option<Vec3> {
        if !input.any() {
            return None;
        }
        let force = planar_force(input, self.config.force_magnitude);
        engine.apply_force(self.body, force, Vec3::ZERO);
        tracing::trace!("Applied force ({:.1}, {:.1})", force.x, force.z);
        Some(force)
    }

    /// Hole under the cached position, if any.
    pub fn hole_below(&self) -> Option<Hole> {
        let position = self.last_position?;
        is_over_hole(position, &self.holes, self.config.hole_capture_radius())
    }

    /// Collision callback. On a near-vertical contact over a hole, issues the
    /// drop impulse and returns the hole.
    pub fn on_contact(&mut self, normal: Vec3, engine: &mut impl PhysicsEngine) -> Option<Hole> {
        if normal.y.abs() <= self.config.contact_normal_threshold {
            return None;
        }
        let hole = self.hole_below()?;
        engine.set_velocity(self.body, Vec3::new(0.0, -self.config.drop_speed, 0.0));
        tracing::debug!("Ball over hole ({}, {}), dropping", hole.x, hole.z);
        Some(hole)
    }

    /// Position callback. Caches the position and runs the floor catch.
    pub fn on_position(
        &mut self,
        position: Vec3,
        engine: &mut impl PhysicsEngine,
    ) -> Option<BallFell> {
        if position.y >= self.config.fall_threshold {
            self.last_position = Some(position);
            return None;
        }

        engine.set_position(self.body, self.spawn);
        engine.set_velocity(self.body, Vec3::ZERO);
        self.last_position = Some(self.spawn);
        tracing::info!(
            "Ball fell through the board at ({:.2}, {:.2}), back to spawn",
            position.x,
            position.z
        );
        Some(BallFell {
            caught_at: position,
        })
    }
}
