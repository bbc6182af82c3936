//! Round lifecycle: Playing -> Fallen -> (reset delay) -> Playing.
//!
//! Every fall schedules a new reset timer. Earlier timers are left running,
//! but each carries the generation it was scheduled under and only the newest
//! generation may end the Fallen state.

use std::time::Duration;

use marble_maze_shared::protocol::RoundState;

/// A reset timer the owner must schedule. Hand `generation` back to
/// [`GameSession::on_reset_timer`] once `delay` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetTimer {
    pub generation: u64,
    pub delay: Duration,
}

#[derive(Debug)]
pub struct GameSession {
    round: RoundState,
    reset_delay: Duration,
    generation: u64,
    falls: u32,
    rounds_completed: u32,
    closed: bool,
}

impl GameSession {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            round: RoundState::Playing,
            reset_delay,
            generation: 0,
            falls: 0,
            rounds_completed: 0,
            closed: false,
        }
    }

    pub fn round_state(&self) -> RoundState {
        self.round
    }

    /// Total falls reported since the session started
    pub fn falls(&self) -> u32 {
        self.falls
    }

    /// Rounds that went Fallen -> Playing
    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Fall notification. Enters Fallen (again) and returns the timer to schedule.
    pub fn on_fall(&mut self) -> ResetTimer {
        if self.round == RoundState::Fallen {
            tracing::debug!("Fall while round already over, restarting reset timer");
        }
        self.round = RoundState::Fallen;
        self.generation += 1;
        self.falls += 1;
        tracing::info!("Round over (fall #{})", self.falls);

        ResetTimer {
            generation: self.generation,
            delay: self.reset_delay,
        }
    }

    /// Timer expiry. Returns true if this expiry put the round back into Playing.
    /// Stale generations and expiries after [`close`](Self::close) are no-ops.
    pub fn on_reset_timer(&mut self, generation: u64) -> bool {
        if self.closed || generation != self.generation || self.round != RoundState::Fallen {
            tracing::trace!("Ignoring reset timer {}", generation);
            return false;
        }
        self.round = RoundState::Playing;
        self.rounds_completed += 1;
        tracing::info!("Round reset, playing again");
        true
    }

    /// Teardown. Outstanding timers become no-ops.
    pub fn close(&mut self) {
        self.closed = true;
    }
}
