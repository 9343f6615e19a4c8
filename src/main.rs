//! Void entry point
//!
//! Runs a headless round with a scripted pilot at the fixed timestep.
//!
//! ```text
//! void-game [--settings PATH] [--seed N] [--seconds S] [--dump]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use void_game::Settings;
use void_game::sim::{Game, RoundStatus, TickInput, tick};

/// Headless Void round with a scripted pilot
#[derive(Debug, Parser)]
#[command(name = "void-game", version, about)]
struct Args {
    /// JSON settings file; defaults are used when missing or invalid
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Seed for the round's RNG
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,

    /// Print the final frame as JSON
    #[arg(long)]
    dump: bool,
}

/// Demo pilot: sweeps the laser, pulses thrust, and toggles the towline now and then
fn pilot(frame: u64, game: &Game) -> TickInput {
    let second = frame / 60;
    // Coast once the lifeline is getting long
    let coasting = game.lifeline_fraction() > 0.6;
    TickInput {
        thrust: if coasting {
            0.0
        } else if second % 4 == 0 {
            0.5
        } else {
            0.0
        },
        turn: if second % 3 == 0 { 0.5 } else { -0.25 },
        firing: second % 2 == 1,
        toggle_towline: frame % 300 == 150,
    }
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if let Err(e) = settings.validate() {
        log::error!("Invalid settings: {}", e);
        return ExitCode::FAILURE;
    }

    let dt = settings.sim.dt;
    let frames = (args.seconds / dt).ceil() as u64;
    let mut game = match Game::new(args.seed, settings) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Could not start round: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut destroyed = 0usize;
    let mut spawned = 0usize;
    for frame in 0..frames {
        let input = pilot(frame, &game);
        let report = tick(&mut game, &input, dt);
        destroyed += report.destroyed.len();
        spawned += report.spawned.len();
        if report.status.is_over() {
            break;
        }
    }

    match game.status() {
        RoundStatus::Playing => log::info!(
            "Survived {:.1}s: {} entities, {} spawned, {} destroyed",
            game.time(),
            game.lifecycle().len(),
            spawned,
            destroyed
        ),
        RoundStatus::Over(end) => log::info!("Round ended at {:.1}s: {:?}", game.time(), end),
    }

    if args.dump {
        match serde_json::to_string_pretty(&game.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log::error!("Could not serialize frame: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
