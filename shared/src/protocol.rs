use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::MazeConfig;
use crate::layout::{Hole, MazeLayout, WallSegment};
use crate::vec3::Vec3;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Round lifecycle as seen by the presentation ("Game Over" banner while Fallen).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    #[default]
    Playing,
    Fallen,
}

impl RoundState {
    pub fn is_over(self) -> bool {
        self == RoundState::Fallen
    }
}

// === Simulation -> Presentation ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "type")]
pub enum PresentationMsg {
    #[serde(rename = "board")]
    Board(BoardMsg),
    #[serde(rename = "frame")]
    Frame(FrameMsg),
}

/// Everything needed to place the static meshes. Sent once.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct BoardMsg {
    pub protocol_version: u32,
    pub board_size: f64,
    pub plane_height: f64,
    pub ball_radius: f64,
    pub hole_radius: f64,
    pub spawn: [f64; 3],
    pub walls: Vec<WallWire>,
    pub holes: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WallWire {
    pub center: [f64; 3],
    pub size: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct FrameMsg {
    pub round: RoundState,
    pub ball_pos: Option<[f64; 3]>,
    #[serde(default)]
    pub falls: u32,
}

// === Conversion helpers ===

/// Round to 4 decimal places
#[inline]
fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}

pub fn wire_vec3(v: Vec3) -> [f64; 3] {
    v.to_array().map(round4)
}

impl WallWire {
    pub fn from_wall(wall: &WallSegment) -> Self {
        let h = wall.half_extents;
        Self {
            center: wire_vec3(wall.center),
            // Meshes want full box dimensions
            size: wire_vec3(Vec3::new(h.x * 2.0, h.y * 2.0, h.z * 2.0)),
        }
    }
}

impl BoardMsg {
    pub fn from_layout(layout: &MazeLayout, config: &MazeConfig) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            board_size: layout.board_size,
            plane_height: layout.plane_height,
            ball_radius: config.ball_radius,
            hole_radius: config.hole_radius,
            spawn: wire_vec3(layout.spawn),
            walls: layout.walls.iter().map(WallWire::from_wall).collect(),
            holes: layout
                .holes
                .iter()
                .map(|&Hole { x, z }| [round4(x), round4(z)])
                .collect(),
        }
    }
}
