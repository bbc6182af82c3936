use std::time::Duration;

/// Upper bound for the millisecond timers (one hour)
pub const MAX_TIMER_MS: u64 = 3_600_000;

/// Gameplay constants shared by the simulation and the presentation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase", default)]
pub struct MazeConfig {
    pub ball_radius: f64,
    pub ball_mass: f64,
    pub hole_radius: f64,
    /// Magnitude of the per-axis steering force
    pub force_magnitude: f64,
    /// Interval between force applications while a direction is held (ms)
    pub force_interval_ms: u64,
    /// Downward speed forced onto a ball that sits over a hole (m/s)
    pub drop_speed: f64,
    /// Minimum |normal.y| for a contact to count as resting on the board
    pub contact_normal_threshold: f64,
    /// Height below which the ball has fallen off the board
    pub fall_threshold: f64,
    /// Time the round stays over before play resumes (ms)
    pub reset_delay_ms: u64,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            ball_radius: 0.3,
            ball_mass: 1.0,
            hole_radius: 0.4,
            force_magnitude: 3.0,
            force_interval_ms: 16, // ~60 Hz
            drop_speed: 5.0,
            contact_normal_threshold: 0.9,
            fall_threshold: -2.0,
            reset_delay_ms: 2000,
        }
    }
}

impl MazeConfig {
    /// Planar distance under which the ball centre counts as over a hole.
    pub fn hole_capture_radius(&self) -> f64 {
        self.hole_radius - self.ball_radius / 2.0
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.ball_radius.is_finite() || self.ball_radius <= 0.0 {
            return Err("ball_radius must be finite and > 0".to_string());
        }
        if !self.ball_mass.is_finite() || self.ball_mass <= 0.0 {
            return Err("ball_mass must be finite and > 0".to_string());
        }
        if !self.hole_radius.is_finite() || self.hole_capture_radius() <= 0.0 {
            return Err("hole_radius must be finite and > ball_radius / 2".to_string());
        }
        if !self.force_magnitude.is_finite() || self.force_magnitude < 0.0 {
            return Err("force_magnitude must be finite and >= 0".to_string());
        }
        if !(1..=MAX_TIMER_MS).contains(&self.force_interval_ms) {
            return Err(format!("force_interval_ms must be within 1..={}", MAX_TIMER_MS));
        }
        if !self.drop_speed.is_finite() || self.drop_speed <= 0.0 {
            return Err("drop_speed must be finite and > 0".to_string());
        }
        // A unit normal never has |y| > 1
        if !(0.0..1.0).contains(&self.contact_normal_threshold) {
            return Err("contact_normal_threshold must be within 0..1".to_string());
        }
        if !self.fall_threshold.is_finite() {
            return Err("fall_threshold must be finite".to_string());
        }
        if !(1..=MAX_TIMER_MS).contains(&self.reset_delay_ms) {
            return Err(format!("reset_delay_ms must be within 1..={}", MAX_TIMER_MS));
        }
        Ok(())
    }
}
