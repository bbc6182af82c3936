//! Scripted player for headless runs.
//!
//! The autopilot is a small state machine: it holds a random set of arrow keys
//! for a random time, then switches to another set, emitting the key
//! transitions a keyboard would.

use rand::Rng;

use crate::input::{Direction, KeyEvent};

/// Hold time range (min, max) in seconds
const HOLD_RANGE: (f64, f64) = (0.2, 1.5);
/// Chance that the next hold presses nothing
const IDLE_CHANCE: f64 = 0.2;
/// Chance that a second, perpendicular direction joins the first
const DIAGONAL_CHANCE: f64 = 0.3;

#[derive(Debug)]
pub struct Autopilot {
    held: Vec<Direction>,
    time_left: f64,
}

impl Autopilot {
    pub fn new() -> Self {
        Self {
            held: Vec::new(),
            time_left: 0.0,
        }
    }

    pub fn held(&self) -> &[Direction] {
        &self.held
    }

    /// Advance by `dt` seconds. Returns the key transitions to deliver.
    pub fn tick(&mut self, dt: f64, rng: &mut impl Rng) -> Vec<KeyEvent> {
        self.time_left -= dt;
        if self.time_left > 0.0 {
            return Vec::new();
        }

        let next = pick_directions(rng);
        self.time_left = HOLD_RANGE.0 + rng.gen::<f64>() * (HOLD_RANGE.1 - HOLD_RANGE.0);

        let mut events: Vec<KeyEvent> = self
            .held
            .iter()
            .filter(|d| !next.contains(*d))
            .map(|d| KeyEvent::up(d.key()))
            .collect();
        events.extend(
            next.iter()
                .filter(|d| !self.held.contains(*d))
                .map(|d| KeyEvent::down(d.key())),
        );

        tracing::trace!("Autopilot now holding {:?}", next);
        self.held = next;
        events
    }

    /// Release everything currently held.
    pub fn release_all(&mut self) -> Vec<KeyEvent> {
        self.time_left = 0.0;
        self.held.drain(..).map(|d| KeyEvent::up(d.key())).collect()
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_directions(rng: &mut impl Rng) -> Vec<Direction> {
    if rng.gen::<f64>() < IDLE_CHANCE {
        return Vec::new();
    }
    let first = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
    let mut held = vec![first];
    if rng.gen::<f64>() < DIAGONAL_CHANCE {
        let side = match first {
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
        };
        held.push(side[rng.gen_range(0..2)]);
    }
    held
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputController;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn first_tick_picks_a_hold() {
        let mut rng = test_rng();
        let mut pilot = Autopilot::new();
        let events = pilot.tick(0.016, &mut rng);
        assert_eq!(events.len(), pilot.held().len());
        assert!(events.iter().all(|e| e.pressed));
    }

    #[test]
    fn holds_keys_for_at_least_min_time() {
        let mut rng = test_rng();
        let mut pilot = Autopilot::new();
        pilot.tick(0.0, &mut rng);
        assert!(pilot.tick(HOLD_RANGE.0 * 0.9, &mut rng).is_empty());
    }

    #[test]
    fn events_keep_controller_in_sync_with_held_set() {
        let mut rng = test_rng();
        let mut pilot = Autopilot::new();
        let mut input = InputController::new();

        for _ in 0..2000 {
            for event in pilot.tick(0.05, &mut rng) {
                input.handle(event);
            }
            for direction in Direction::ALL {
                assert_eq!(
                    input.state().is_held(direction),
                    pilot.held().contains(&direction)
                );
            }
        }
    }

    #[test]
    fn never_holds_opposing_directions() {
        let mut rng = test_rng();
        let mut pilot = Autopilot::new();
        for _ in 0..2000 {
            pilot.tick(0.1, &mut rng);
            let held = pilot.held();
            assert!(!(held.contains(&Direction::Up) && held.contains(&Direction::Down)));
            assert!(!(held.contains(&Direction::Left) && held.contains(&Direction::Right)));
        }
    }

    #[test]
    fn same_seed_same_script() {
        let mut a = Autopilot::new();
        let mut b = Autopilot::new();
        let mut rng_a = test_rng();
        let mut rng_b = test_rng();
        for _ in 0..500 {
            assert_eq!(a.tick(0.05, &mut rng_a), b.tick(0.05, &mut rng_b));
        }
    }

    #[test]
    fn release_all_emits_key_ups() {
        let mut rng = test_rng();
        let mut pilot = Autopilot::new();
        // Tick until something is held
        let mut guard = 0;
        while pilot.held().is_empty() && guard < 100 {
            pilot.tick(2.0, &mut rng);
            guard += 1;
        }
        let held = pilot.held().len();
        assert!(held > 0);

        let events = pilot.release_all();
        assert_eq!(events.len(), held);
        assert!(events.iter().all(|e| !e.pressed));
        assert!(pilot.held().is_empty());
    }
}
