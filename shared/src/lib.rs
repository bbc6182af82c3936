//! Types shared between the maze simulation and the browser presentation.
//!
//! Everything here is plain data: the static board, gameplay constants and
//! the messages the presentation consumes. TypeScript bindings are exported
//! with ts-rs.

pub mod config;
pub mod layout;
pub mod protocol;
pub mod vec3;
