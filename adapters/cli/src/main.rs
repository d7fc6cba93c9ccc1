#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Code Defence session.

mod placement;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use code_defence_core::{Event, GameConfig, PlayState, UnitId, MAX_UNIT_LEVEL};
use code_defence_simulation::Simulation;
use code_defence_world::query;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::placement::Placement;

/// Runs a headless Code Defence session and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "code-defence", version, about)]
struct CliArgs {
    /// TOML file overriding the default game configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for enemy spawns and reveal rolls.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 3_600)]
    frames: u64,
    /// Simulated milliseconds between frames.
    #[arg(long = "frame-ms", default_value_t = 16)]
    frame_ms: u64,
    /// Units to place before the first frame, written as `<tool>@<row>,<col>`.
    #[arg(long = "place", value_name = "TOOL@ROW,COL")]
    placements: Vec<Placement>,
    /// Upgrades every placed unit once per this many frames.
    #[arg(long = "upgrade-every", value_name = "FRAMES")]
    upgrade_every: Option<u64>,
    /// Continues into the next level after each victory.
    #[arg(long = "advance-levels")]
    advance_levels: bool,
}

/// Outcome of a headless session, printed as TOML.
#[derive(Debug, Default, Serialize)]
struct Summary {
    seed: String,
    frames: u64,
    state: String,
    level: u32,
    wave: u32,
    max_waves: u32,
    base_health: u32,
    score: u64,
    currency: u32,
    cpu: u32,
    memory: u32,
    units: usize,
    waves_started: usize,
    enemies_spawned: usize,
    enemies_killed: usize,
    enemies_breached: usize,
    upgrades: usize,
    rejected_actions: usize,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WaveStarted { .. } => self.waves_started += 1,
                Event::EnemySpawned { .. } => self.enemies_spawned += 1,
                Event::EnemyKilled { .. } => self.enemies_killed += 1,
                Event::EnemyBreached { .. } => self.enemies_breached += 1,
                Event::UnitUpgraded { .. } => self.upgrades += 1,
                Event::ActionRejected { reason } => {
                    info!(%reason, "action rejected");
                    self.rejected_actions += 1;
                }
                _ => {}
            }
        }
    }

    fn finish(&mut self, simulation: &Simulation) {
        let world = simulation.world();
        let progress = query::progress(world);
        let resources = query::resources(world);
        self.seed = query::config(world).seed.to_string();
        self.state = format!("{:?}", query::play_state(world));
        self.level = progress.level;
        self.wave = progress.wave;
        self.max_waves = progress.max_waves;
        self.base_health = progress.base_health;
        self.score = progress.score;
        self.currency = resources.currency;
        self.cpu = resources.cpu;
        self.memory = resources.memory;
        self.units = query::unit_view(world).len();
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    let summary = run(&args, config);
    let rendered = toml::to_string(&summary).context("failed to render session summary")?;
    print!("{rendered}");
    Ok(())
}

fn load_config(args: &CliArgs) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config toml at {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn run(args: &CliArgs, config: GameConfig) -> Summary {
    let mut simulation = Simulation::new(config);
    let mut summary = Summary::default();
    let mut events = Vec::new();

    println!("{}", query::welcome_banner(simulation.world()));
    simulation.start_game(&mut events);
    for placement in &args.placements {
        simulation.select_tool(placement.tool, &mut events);
        simulation.place_unit(placement.cell, &mut events);
    }
    summary.record(&events);

    let frame = Duration::from_millis(args.frame_ms);
    let mut timestamp = Duration::ZERO;
    for index in 0..args.frames {
        events.clear();
        simulation.frame(timestamp, &mut events);
        timestamp = timestamp.saturating_add(frame);
        summary.frames = index + 1;

        if args
            .upgrade_every
            .is_some_and(|every| every > 0 && (index + 1) % every == 0)
        {
            upgrade_all(&mut simulation, &mut events);
        }

        match query::play_state(simulation.world()) {
            PlayState::Victory if args.advance_levels => {
                simulation.advance_level(&mut events);
            }
            PlayState::Victory | PlayState::GameOver => {
                summary.record(&events);
                break;
            }
            _ => {}
        }
        summary.record(&events);
    }

    summary.finish(&simulation);
    summary
}

fn upgrade_all(simulation: &mut Simulation, events: &mut Vec<Event>) {
    let upgradable: Vec<UnitId> = query::unit_view(simulation.world())
        .iter()
        .filter(|unit| unit.level < MAX_UNIT_LEVEL)
        .map(|unit| unit.id)
        .collect();
    for unit in upgradable {
        simulation.upgrade_unit(unit, events);
    }
}
