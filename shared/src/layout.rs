use std::sync::OnceLock;

use crate::vec3::{vec3, Vec3};

pub const BOARD_SIZE: f64 = 10.0;
pub const WALL_HEIGHT: f64 = 0.5;
pub const WALL_THICKNESS: f64 = 0.2;
/// Height of the board's top surface
pub const PLANE_HEIGHT: f64 = -0.1;
pub const SPAWN_POSITION: Vec3 = vec3(4.0, 0.3, 4.0);

/// Axis-aligned wall box
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WallSegment {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl WallSegment {
    /// Wall standing on the board, centred at (x, z), with full footprint width x depth.
    pub fn on_board(x: f64, z: f64, width: f64, depth: f64) -> Self {
        Self {
            center: vec3(x, WALL_HEIGHT / 2.0, z),
            half_extents: vec3(width / 2.0, WALL_HEIGHT / 2.0, depth / 2.0),
        }
    }

    pub fn min(&self) -> Vec3 {
        crate::vec3::sub(self.center, self.half_extents)
    }

    pub fn max(&self) -> Vec3 {
        crate::vec3::add(self.center, self.half_extents)
    }
}

/// Hole centre in board-plane coordinates
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct Hole {
    pub x: f64,
    pub z: f64,
}

impl Hole {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

fn standard_walls() -> Vec<WallSegment> {
    vec![
        // Outer walls
        WallSegment::on_board(-BOARD_SIZE / 2.0, 0.0, WALL_THICKNESS, BOARD_SIZE),
        WallSegment::on_board(BOARD_SIZE / 2.0, 0.0, WALL_THICKNESS, BOARD_SIZE),
        WallSegment::on_board(0.0, -BOARD_SIZE / 2.0, BOARD_SIZE, WALL_THICKNESS),
        WallSegment::on_board(0.0, BOARD_SIZE / 2.0, BOARD_SIZE, WALL_THICKNESS),
        // Inner maze
        WallSegment::on_board(-2.0, -2.0, 4.0, WALL_THICKNESS),
        WallSegment::on_board(2.0, -1.0, 4.0, WALL_THICKNESS),
        WallSegment::on_board(-2.0, 0.0, WALL_THICKNESS, 4.0),
        WallSegment::on_board(0.0, 2.0, 4.0, WALL_THICKNESS),
        WallSegment::on_board(3.0, -3.0, WALL_THICKNESS, 4.0),
        WallSegment::on_board(-3.0, 3.0, WALL_THICKNESS, 4.0),
    ]
}

const STANDARD_HOLES: [Hole; 4] = [
    Hole::new(-3.0, -3.0),
    Hole::new(3.0, 0.0),
    Hole::new(0.0, 3.0),
    Hole::new(4.0, -4.0),
];

/// Static board description: walls, holes, board plane and ball spawn.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MazeLayout {
    pub board_size: f64,
    pub plane_height: f64,
    pub spawn: Vec3,
    pub walls: Vec<WallSegment>,
    pub holes: Vec<Hole>,
}

impl MazeLayout {
    pub fn standard() -> Self {
        Self {
            board_size: BOARD_SIZE,
            plane_height: PLANE_HEIGHT,
            spawn: SPAWN_POSITION,
            walls: standard_walls(),
            holes: STANDARD_HOLES.to_vec(),
        }
    }
}

/// The built-in maze, initialised once per process.
pub fn standard_layout() -> &'static MazeLayout {
    static LAYOUT: OnceLock<MazeLayout> = OnceLock::new();
    LAYOUT.get_or_init(MazeLayout::standard)
}
