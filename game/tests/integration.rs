//! Integration tests for the marble maze game loop.
//!
//! The loop runs on a paused tokio clock so timer behaviour (force ticks,
//! reset delays) can be checked to the millisecond. A scripted engine stands in
//! for the physics backend; the last test rolls a real ball into a hole with
//! the headless engine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use marble_maze::config::GameConfig;
use marble_maze::engine::{BodyHandle, EngineEvent, PhysicsEngine, SphereDesc};
use marble_maze::game_loop::{run_game_loop, Game, GameBroadcast, GameCommand, GameSummary};
use marble_maze::headless::{HeadlessConfig, HeadlessEngine};
use marble_maze::input::{Key, KeyEvent};
use marble_maze_shared::config::MazeConfig;
use marble_maze_shared::layout::{standard_layout, Hole, MazeLayout};
use marble_maze_shared::protocol::RoundState;
use marble_maze_shared::vec3::{vec3, Vec3};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What the scripted engine has seen and will report next.
#[derive(Debug, Default)]
struct Script {
    ball: Option<BodyHandle>,
    /// Reported position when nothing is queued
    current: Vec3,
    queued_positions: VecDeque<Vec3>,
    queued_contacts: VecDeque<Vec3>,
    forces: Vec<Vec3>,
    velocities: Vec<Vec3>,
    resets: Vec<Vec3>,
}

/// Engine double whose script can be edited while the loop owns the engine.
#[derive(Default)]
struct ScriptedEngine {
    next_id: u32,
    script: Arc<Mutex<Script>>,
}

impl ScriptedEngine {
    fn next_handle(&mut self) -> BodyHandle {
        self.next_id += 1;
        BodyHandle(self.next_id)
    }
}

impl PhysicsEngine for ScriptedEngine {
    fn add_plane(&mut self, _height: f64) -> BodyHandle {
        self.next_handle()
    }

    fn add_box(&mut self, _center: Vec3, _half_extents: Vec3) -> BodyHandle {
        self.next_handle()
    }

    fn add_sphere(&mut self, desc: SphereDesc) -> BodyHandle {
        let handle = self.next_handle();
        let mut script = self.script.lock().unwrap();
        script.ball = Some(handle);
        script.current = desc.position;
        handle
    }

    fn subscribe_position(&mut self, _body: BodyHandle) {}

    fn apply_force(&mut self, _body: BodyHandle, force: Vec3, _point: Vec3) {
        self.script.lock().unwrap().forces.push(force);
    }

    fn set_position(&mut self, _body: BodyHandle, position: Vec3) {
        let mut script = self.script.lock().unwrap();
        script.current = position;
        script.resets.push(position);
    }

    fn set_velocity(&mut self, _body: BodyHandle, velocity: Vec3) {
        self.script.lock().unwrap().velocities.push(velocity);
    }

    fn step(&mut self, _dt: f64, events: &mut Vec<EngineEvent>) {
        let mut script = self.script.lock().unwrap();
        let Some(body) = script.ball else {
            return;
        };
        let position = match script.queued_positions.pop_front() {
            Some(p) => p,
            None => script.current,
        };
        events.push(EngineEvent::Position { body, position });
        if let Some(normal) = script.queued_contacts.pop_front() {
            events.push(EngineEvent::Contact { body, normal });
        }
    }
}

struct Harness {
    script: Arc<Mutex<Script>>,
    cmd_tx: mpsc::Sender<GameCommand>,
    rounds: Arc<Mutex<Vec<(Duration, RoundState)>>>,
    handle: JoinHandle<GameSummary>,
}

impl Harness {
    fn start() -> Self {
        let engine = ScriptedEngine::default();
        let script = engine.script.clone();
        let config = GameConfig::default();
        let game = Game::new(engine, standard_layout(), config.maze);

        let (cmd_tx, cmd_rx) = mpsc::channel::<GameCommand>(64);
        let (broadcast_tx, mut broadcast_rx) = broadcast::channel::<GameBroadcast>(1024);

        let started = Instant::now();
        let rounds = Arc::new(Mutex::new(Vec::new()));
        let collected = rounds.clone();
        tokio::spawn(async move {
            while let Ok(msg) = broadcast_rx.recv().await {
                if let GameBroadcast::RoundChanged(round) = msg {
                    collected.lock().unwrap().push((started.elapsed(), round));
                }
            }
        });

        let handle = tokio::spawn(run_game_loop(game, cmd_rx, broadcast_tx, config));

        Self {
            script,
            cmd_tx,
            rounds,
            handle,
        }
    }

    fn drop_ball_below_board(&self) {
        self.script
            .lock()
            .unwrap()
            .queued_positions
            .push_back(vec3(-3.0, -2.5, -3.0));
    }

    async fn key(&self, event: KeyEvent) {
        self.cmd_tx.send(GameCommand::Key(event)).await.unwrap();
    }

    fn rounds(&self) -> Vec<(Duration, RoundState)> {
        self.rounds.lock().unwrap().clone()
    }

    fn forces(&self) -> usize {
        self.script.lock().unwrap().forces.len()
    }

    async fn shutdown(self) -> GameSummary {
        self.cmd_tx.send(GameCommand::Shutdown).await.unwrap();
        self.handle.await.unwrap()
    }
}

fn ms(d: Duration) -> u128 {
    d.as_millis()
}

#[tokio::test(start_paused = true)]
async fn fall_ends_round_for_two_seconds() {
    let harness = Harness::start();
    tokio::time::sleep(Duration::from_millis(100)).await;

    harness.drop_ball_below_board();
    tokio::time::sleep(Duration::from_millis(1900)).await;
    let rounds = harness.rounds();
    assert_eq!(rounds.len(), 1, "rounds: {:?}", rounds);
    assert_eq!(rounds[0].1, RoundState::Fallen);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let rounds = harness.rounds();
    assert_eq!(rounds.len(), 2, "rounds: {:?}", rounds);
    assert_eq!(rounds[1].1, RoundState::Playing);
    let round_length = rounds[1].0 - rounds[0].0;
    assert!((2000..=2001).contains(&ms(round_length)), "{:?}", round_length);

    let summary = harness.shutdown().await;
    assert_eq!(summary.falls, 1);
    assert_eq!(summary.rounds_completed, 1);
    assert_eq!(summary.final_round, RoundState::Playing);
}

#[tokio::test(start_paused = true)]
async fn floor_catch_resets_ball_to_spawn_once() {
    let harness = Harness::start();
    harness.drop_ball_below_board();
    tokio::time::sleep(Duration::from_millis(500)).await;

    {
        let script = harness.script.lock().unwrap();
        assert_eq!(script.resets, vec![standard_layout().spawn]);
        assert_eq!(script.velocities, vec![Vec3::ZERO]);
    }
    let summary = harness.shutdown().await;
    assert_eq!(summary.falls, 1);
}

#[tokio::test(start_paused = true)]
async fn overlapping_falls_wait_for_latest_timer() {
    let harness = Harness::start();
    tokio::time::sleep(Duration::from_millis(100)).await;

    harness.drop_ball_below_board();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    harness.drop_ball_below_board();

    // First timer has expired by now, but the round stays over
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let rounds = harness.rounds();
    assert!(rounds.iter().all(|(_, r)| *r == RoundState::Fallen), "{:?}", rounds);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let rounds = harness.rounds();
    let states: Vec<RoundState> = rounds.iter().map(|(_, r)| *r).collect();
    assert_eq!(
        states,
        vec![RoundState::Fallen, RoundState::Fallen, RoundState::Playing]
    );
    // Counted from the second fall, not the sum of both delays
    let second_round = rounds[2].0 - rounds[1].0;
    assert!((2000..=2001).contains(&ms(second_round)), "{:?}", second_round);

    let summary = harness.shutdown().await;
    assert_eq!(summary.falls, 2);
    assert_eq!(summary.rounds_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn force_ticks_only_while_direction_held() {
    let harness = Harness::start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.forces(), 0);

    harness.key(KeyEvent::down(Key::ArrowRight)).await;
    tokio::time::sleep(Duration::from_millis(160)).await;
    let held_ticks = harness.forces();
    assert!((9..=10).contains(&held_ticks), "ticks: {}", held_ticks);

    harness.key(KeyEvent::up(Key::ArrowRight)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let after_release = harness.forces();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(harness.forces(), after_release);

    let forces = harness.script.lock().unwrap().forces.clone();
    assert!(forces.iter().all(|f| *f == vec3(3.0, 0.0, 0.0)));
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn opposing_keys_apply_zero_force() {
    let harness = Harness::start();
    harness.key(KeyEvent::down(Key::ArrowUp)).await;
    harness.key(KeyEvent::down(Key::ArrowDown)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let forces = harness.script.lock().unwrap().forces.clone();
    assert!(!forces.is_empty());
    assert!(forces.iter().all(|f| f.x == 0.0 && f.z == 0.0));
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unmapped_keys_do_not_start_force_ticks() {
    let harness = Harness::start();
    harness.key(KeyEvent::down(Key::from_dom_key("Space"))).await;
    harness.key(KeyEvent::down(Key::Unmapped)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.forces(), 0);
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn drop_impulse_follows_contact_over_hole() {
    let harness = Harness::start();
    {
        let mut script = harness.script.lock().unwrap();
        script.current = vec3(0.0, 0.2, 3.0);
        // Wall hit, then resting contact
        script.queued_contacts.push_back(vec3(1.0, 0.0, 0.0));
        script.queued_contacts.push_back(vec3(0.0, 1.0, 0.0));
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let velocities = harness.script.lock().unwrap().velocities.clone();
    assert_eq!(velocities, vec![vec3(0.0, -5.0, 0.0)]);
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn reset_timer_after_shutdown_is_ignored() {
    let harness = Harness::start();
    harness.drop_ball_below_board();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let rounds = harness.rounds.clone();
    let summary = harness.shutdown().await;
    assert_eq!(summary.final_round, RoundState::Fallen);

    // The spawned reset timer still fires; nothing listens any more
    tokio::time::sleep(Duration::from_millis(3000)).await;
    let states: Vec<RoundState> = rounds.lock().unwrap().iter().map(|(_, r)| *r).collect();
    assert_eq!(states, vec![RoundState::Fallen]);
}

/// Board with a single hole just ahead of the spawn point.
fn hole_ahead_layout() -> MazeLayout {
    MazeLayout {
        spawn: vec3(0.0, 0.3, 1.0),
        walls: Vec::new(),
        holes: vec![Hole::new(0.0, 0.0)],
        ..MazeLayout::standard()
    }
}

#[test]
fn headless_ball_rolls_into_hole_and_respawns() {
    let layout = hole_ahead_layout();
    let maze = MazeConfig::default();
    let mut game = Game::new(HeadlessEngine::new(HeadlessConfig::default()), &layout, maze);
    let dt = 1.0 / 60.0;

    game.handle_key(KeyEvent::down(Key::ArrowUp));

    let mut dropped_at = None;
    let mut timers = Vec::new();
    for step in 0..600 {
        game.apply_input_force();
        timers.extend(game.step_physics(dt));
        let velocity = game.engine().velocity(game.ball().body()).unwrap();
        if dropped_at.is_none() && velocity.y < -maze.drop_speed + 1.0 {
            dropped_at = Some(step);
        }
        if !timers.is_empty() {
            break;
        }
    }

    assert!(dropped_at.is_some(), "ball never got the drop impulse");
    assert_eq!(timers.len(), 1, "ball never fell through");
    assert_eq!(game.round_state(), RoundState::Fallen);
    assert_eq!(game.ball().last_position(), Some(layout.spawn));
    assert_eq!(
        game.engine().position(game.ball().body()),
        Some(layout.spawn)
    );
    assert_eq!(
        game.engine().velocity(game.ball().body()),
        Some(Vec3::ZERO)
    );

    assert!(game.on_reset_timer(timers[0].generation));
    assert_eq!(game.round_state(), RoundState::Playing);
}

#[test]
fn headless_ball_without_input_stays_at_spawn() {
    let layout = standard_layout();
    let mut game = Game::new(
        HeadlessEngine::new(HeadlessConfig::default()),
        layout,
        MazeConfig::default(),
    );
    for _ in 0..300 {
        game.apply_input_force();
        assert!(game.step_physics(1.0 / 60.0).is_empty());
    }
    let pos = game.ball().last_position().unwrap();
    assert!((pos.x - 4.0).abs() < 1e-9 && (pos.z - 4.0).abs() < 1e-9);
    assert!((pos.y - 0.2).abs() < 0.01);
    assert_eq!(game.round_state(), RoundState::Playing);
}
