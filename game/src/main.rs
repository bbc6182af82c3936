use std::time::Duration;

use marble_maze::autopilot::Autopilot;
use marble_maze::config::GameConfig;
use marble_maze::game_loop::{run_game_loop, Game, GameBroadcast, GameCommand};
use marble_maze::headless::HeadlessEngine;
use marble_maze_shared::layout::standard_layout;
use marble_maze_shared::protocol::PresentationMsg;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing_subscriber::EnvFilter;

/// Cadence of the autopilot's key decisions
const AUTOPILOT_TICK: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match GameConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid game configuration: {}", e);
            std::process::exit(1);
        }
    };

    let layout = standard_layout();
    let engine = HeadlessEngine::new(config.engine);
    let game = Game::new(engine, layout, config.maze);

    match serde_json::to_string(&PresentationMsg::Board(game.board_msg(layout))) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Could not encode board: {}", e),
    }

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);
    let (broadcast_tx, mut broadcast_rx) = broadcast::channel::<GameBroadcast>(64);

    let loop_config = config.clone();
    let game_handle = tokio::spawn(run_game_loop(game, game_rx, broadcast_tx, loop_config));

    // Presentation stand-in: log round changes, frames at debug
    tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(GameBroadcast::RoundChanged(round)) => {
                    if round.is_over() {
                        tracing::info!("Game over, ball fell");
                    } else {
                        tracing::info!("Round started");
                    }
                }
                Ok(GameBroadcast::Frame(frame)) => {
                    if let Ok(json) = serde_json::to_string(&PresentationMsg::Frame(frame)) {
                        tracing::debug!("{}", json);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Presentation lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let autopilot = if config.autopilot {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let pilot_tx = game_tx.clone();
        let seed = config.rng_seed;
        let handle = tokio::spawn(async move {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut pilot = Autopilot::new();
            let mut ticker = tokio::time::interval(AUTOPILOT_TICK);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for event in pilot.tick(AUTOPILOT_TICK.as_secs_f64(), &mut rng) {
                            if pilot_tx.send(GameCommand::Key(event)).await.is_err() {
                                return;
                            }
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }
            // Let go of the keys before the game closes
            for event in pilot.release_all() {
                let _ = pilot_tx.send(GameCommand::Key(event)).await;
            }
        });
        Some((stop_tx, handle))
    } else {
        None
    };

    tracing::info!("Running headless maze for {:.1}s", config.run_seconds);
    tokio::time::sleep(config.run_duration()).await;

    if let Some((stop_tx, handle)) = autopilot {
        let _ = stop_tx.send(());
        if let Err(e) = handle.await {
            tracing::warn!("Autopilot task failed: {}", e);
        }
    }
    let _ = game_tx.send(GameCommand::Shutdown).await;

    match game_handle.await {
        Ok(summary) => println!(
            "Falls: {}, rounds completed: {}, final state: {:?}",
            summary.falls, summary.rounds_completed, summary.final_round
        ),
        Err(e) => {
            eprintln!("Game loop failed: {}", e);
            std::process::exit(1);
        }
    }
}
