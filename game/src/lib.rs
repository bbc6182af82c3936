//! Marble maze game core.
//!
//! Steering, hole detection and the round lifecycle, driven against an
//! injected [`engine::PhysicsEngine`]. Exposed as a library for tests and
//! the headless binary.

pub mod autopilot;
pub mod ball;
pub mod config;
pub mod engine;
pub mod game_loop;
pub mod headless;
pub mod input;
pub mod session;
