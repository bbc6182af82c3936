//! Capability interface to the rigid-body engine.
//!
//! The simulation core never talks to a concrete physics library. Whatever
//! backs the renderer implements [`PhysicsEngine`]; the crate ships
//! [`crate::headless::HeadlessEngine`] for the binary and tests.

use marble_maze_shared::layout::MazeLayout;
use marble_maze_shared::vec3::Vec3;

/// Opaque id of a body registered with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Dynamic sphere registration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereDesc {
    pub radius: f64,
    pub mass: f64,
    pub position: Vec3,
    /// Deliver [`EngineEvent::Contact`] for this body
    pub report_contacts: bool,
}

/// Callbacks produced by a physics step, in the order the engine raised them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    Position { body: BodyHandle, position: Vec3 },
    /// `normal` points from the touched surface towards the body.
    Contact { body: BodyHandle, normal: Vec3 },
}

pub trait PhysicsEngine {
    /// Static infinite plane with its top surface at `height`, facing +Y.
    fn add_plane(&mut self, height: f64) -> BodyHandle;

    /// Static axis-aligned box
    fn add_box(&mut self, center: Vec3, half_extents: Vec3) -> BodyHandle;

    fn add_sphere(&mut self, desc: SphereDesc) -> BodyHandle;

    /// Report the body's position after every step.
    fn subscribe_position(&mut self, body: BodyHandle);

    /// Apply `force` at `point` (relative to the body origin) for the next step.
    fn apply_force(&mut self, body: BodyHandle, force: Vec3, point: Vec3);

    fn set_position(&mut self, body: BodyHandle, position: Vec3);

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Advance by `dt` seconds, appending raised callbacks to `events`.
    fn step(&mut self, dt: f64, events: &mut Vec<EngineEvent>);
}

/// Static bodies making up the board
#[derive(Debug, Clone)]
pub struct BoardBodies {
    pub plane: BodyHandle,
    pub walls: Vec<BodyHandle>,
}

/// Register the board plane and every wall of `layout`.
pub fn register_board(engine: &mut impl PhysicsEngine, layout: &MazeLayout) -> BoardBodies {
    let plane = engine.add_plane(layout.plane_height);
    let walls = layout
        .walls
        .iter()
        .map(|wall| engine.add_box(wall.center, wall.half_extents))
        .collect();
    BoardBodies { plane, walls }
}
