use std::future;
use std::time::Duration;

use marble_maze_shared::config::MazeConfig;
use marble_maze_shared::layout::MazeLayout;
use marble_maze_shared::protocol::{wire_vec3, BoardMsg, FrameMsg, RoundState};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::ball::BallSimulation;
use crate::config::GameConfig;
use crate::engine::{register_board, BoardBodies, EngineEvent, PhysicsEngine};
use crate::input::{InputController, InputState, KeyEvent};
use crate::session::{GameSession, ResetTimer};

/// Commands from the presentation to the game loop
#[derive(Debug, Clone)]
pub enum GameCommand {
    Key(KeyEvent),
    Shutdown,
}

/// Broadcasts from the game loop to the presentation
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    RoundChanged(RoundState),
    Frame(FrameMsg),
}

/// Final counters returned when the loop ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub falls: u32,
    pub rounds_completed: u32,
    pub final_round: RoundState,
}

/// Everything one running game owns: engine, board, ball, input and round state.
pub struct Game<E: PhysicsEngine> {
    engine: E,
    board: BoardBodies,
    input: InputController,
    ball: BallSimulation,
    session: GameSession,
    maze: MazeConfig,
    events: Vec<EngineEvent>,
}

impl<E: PhysicsEngine> Game<E> {
    /// Register the board and the ball with `engine`.
    pub fn new(mut engine: E, layout: &MazeLayout, maze: MazeConfig) -> Self {
        let board = register_board(&mut engine, layout);
        let ball = BallSimulation::spawn(&mut engine, layout, maze);
        let session = GameSession::new(maze.reset_delay());

        Self {
            engine,
            board,
            input: InputController::new(),
            ball,
            session,
            maze,
            events: Vec::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn board(&self) -> &BoardBodies {
        &self.board
    }

    pub fn ball(&self) -> &BallSimulation {
        &self.ball
    }

    pub fn input(&self) -> InputState {
        self.input.state()
    }

    pub fn round_state(&self) -> RoundState {
        self.session.round_state()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Key transition. Returns true if the input flags changed.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        self.input.handle(event)
    }

    /// Force tick
    pub fn apply_input_force(&mut self) {
        self.ball.apply_input(&self.input.state(), &mut self.engine);
    }

    /// Advance the engine and dispatch its callbacks in the order raised.
    /// Returns the reset timers that falls during this step scheduled.
    pub fn step_physics(&mut self, dt: f64) -> Vec<ResetTimer> {
        let mut events = std::mem::take(&mut self.events);
        events.clear();
        self.engine.step(dt, &mut events);

        let mut timers = Vec::new();
        for event in events.drain(..) {
            match event {
                EngineEvent::Position { body, position } if body == self.ball.body() => {
                    if self.ball.on_position(position, &mut self.engine).is_some() {
                        timers.push(self.session.on_fall());
                    }
                }
                EngineEvent::Contact { body, normal } if body == self.ball.body() => {
                    self.ball.on_contact(normal, &mut self.engine);
                }
                _ => {}
            }
        }
        self.events = events;
        timers
    }

    /// Reset timer expiry. Returns true if the round went back to Playing.
    pub fn on_reset_timer(&mut self, generation: u64) -> bool {
        self.session.on_reset_timer(generation)
    }

    pub fn frame(&self) -> FrameMsg {
        FrameMsg {
            round: self.session.round_state(),
            ball_pos: self.ball.last_position().map(wire_vec3),
            falls: self.session.falls(),
        }
    }

    pub fn board_msg(&self, layout: &MazeLayout) -> BoardMsg {
        BoardMsg::from_layout(layout, &self.maze)
    }

    /// Teardown: drop held keys and disarm outstanding reset timers.
    pub fn close(&mut self) -> GameSummary {
        self.input.release_all();
        self.session.close();
        GameSummary {
            falls: self.session.falls(),
            rounds_completed: self.session.rounds_completed(),
            final_round: self.session.round_state(),
        }
    }
}

fn force_interval(period: Duration) -> Interval {
    // First application one period after the key goes down
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_force_tick(force: &mut Option<Interval>) {
    match force {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

fn schedule_reset(timer: ResetTimer, expired_tx: &mpsc::UnboundedSender<u64>) {
    let tx = expired_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(timer.delay).await;
        // Receiver gone means the loop has ended
        let _ = tx.send(timer.generation);
    });
}

/// Run the game loop. Owns all game state until shutdown.
pub async fn run_game_loop<E: PhysicsEngine>(
    mut game: Game<E>,
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    config: GameConfig,
) -> GameSummary {
    let dt = config.physics_dt().as_secs_f64();
    let frame_every_n = config.frame_every_n_steps() as u64;
    let mut step_count: u64 = 0;

    let mut physics_interval = tokio::time::interval(config.physics_dt());
    physics_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Exists only while a direction is held
    let mut force: Option<Interval> = None;

    let (expired_tx, mut expired_rx) = mpsc::unbounded_channel::<u64>();

    tracing::info!(
        "Game loop started ({} Hz physics, {} ms force ticks)",
        config.physics_rate_hz,
        config.maze.force_interval_ms
    );

    loop {
        tokio::select! {
            _ = physics_interval.tick() => {
                for timer in game.step_physics(dt) {
                    schedule_reset(timer, &expired_tx);
                    let _ = broadcast_tx.send(GameBroadcast::RoundChanged(RoundState::Fallen));
                }

                step_count += 1;
                if step_count % frame_every_n == 0 {
                    let frame = game.frame();
                    tracing::trace!("Frame {:?}", frame);
                    let _ = broadcast_tx.send(GameBroadcast::Frame(frame));
                }
            }

            _ = next_force_tick(&mut force) => {
                game.apply_input_force();
            }

            Some(generation) = expired_rx.recv() => {
                if game.on_reset_timer(generation) {
                    let _ = broadcast_tx.send(GameBroadcast::RoundChanged(RoundState::Playing));
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(GameCommand::Key(event)) => {
                        if game.handle_key(event) {
                            let held = game.input().any();
                            if held && force.is_none() {
                                tracing::debug!("Direction held, force ticks on");
                                force = Some(force_interval(config.force_interval()));
                            } else if !held && force.is_some() {
                                tracing::debug!("All directions released, force ticks off");
                                force = None;
                            }
                        }
                    }
                    Some(GameCommand::Shutdown) | None => break,
                }
            }
        }
    }

    drop(force);
    let summary = game.close();
    tracing::info!(
        "Game loop ended after {} falls ({} rounds completed)",
        summary.falls,
        summary.rounds_completed
    );
    summary
}
