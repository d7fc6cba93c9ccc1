#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that owns the Code Defence world and its systems.
//!
//! Every frame runs in a fixed order: the clock advances, the wave director
//! reacts to the elapsed time, the combat resolver reads unit and enemy views,
//! and finally the world resolves movement, projectiles and end conditions.
//! Every event produced along the way is appended to the caller's buffer.

use std::time::Duration;

use code_defence_core::{
    CellCoord, Command, Event, GameConfig, GameStateSnapshot, PlayState, ToolKind, UnitId,
};
use code_defence_system_combat::Combat;
use code_defence_system_wave_director::WaveDirector;
use code_defence_world::{self as world, query, World};
use tracing::{debug, info};

const COMBAT_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Owns the authoritative world plus the systems that drive it.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    combat: Combat,
    director: WaveDirector,
    last_frame: Option<Duration>,
    commands: Vec<Command>,
}

impl Simulation {
    /// Creates a simulation sitting in the menu.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        info!(seed = config.seed, "simulation created");
        Self {
            combat: Combat::new(config.seed ^ COMBAT_STREAM),
            director: WaveDirector::new(config.seed),
            world: World::with_config(config),
            last_frame: None,
            commands: Vec::new(),
        }
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the wave director.
    #[must_use]
    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    /// Captures the complete session state.
    #[must_use]
    pub fn game_state(&self) -> GameStateSnapshot {
        query::game_state(&self.world)
    }

    /// Starts a session from the menu.
    pub fn start_game(&mut self, out: &mut Vec<Event>) {
        self.last_frame = None;
        self.execute(Command::StartGame, out);
    }

    /// Arms a tool for the next placement.
    pub fn select_tool(&mut self, tool: ToolKind, out: &mut Vec<Event>) {
        self.execute(Command::SelectTool { tool }, out);
    }

    /// Places the selected tool on a grid cell.
    pub fn place_unit(&mut self, cell: CellCoord, out: &mut Vec<Event>) {
        self.execute(Command::PlaceUnit { cell }, out);
    }

    /// Raises a unit by one level.
    pub fn upgrade_unit(&mut self, unit: UnitId, out: &mut Vec<Event>) {
        self.execute(Command::UpgradeUnit { unit }, out);
    }

    /// Freezes a running session.
    pub fn pause(&mut self, out: &mut Vec<Event>) {
        self.execute(Command::Pause, out);
    }

    /// Continues a paused session. The next frame advances by zero.
    pub fn resume(&mut self, out: &mut Vec<Event>) {
        self.last_frame = None;
        self.execute(Command::Resume, out);
    }

    /// Discards the session and returns to the menu.
    ///
    /// Random streams restart from the configured seed, so a session played
    /// after a reset replays one played from a fresh simulation.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        self.execute(Command::Reset, out);
        let seed = query::config(&self.world).seed;
        self.combat = Combat::new(seed ^ COMBAT_STREAM);
        self.director = WaveDirector::new(seed);
        self.last_frame = None;
    }

    /// Leaves a victory for the next, longer level.
    pub fn advance_level(&mut self, out: &mut Vec<Event>) {
        self.last_frame = None;
        self.execute(Command::AdvanceLevel, out);
    }

    /// Advances the simulation to the host's monotonic `timestamp`.
    ///
    /// The first frame after a start or resume advances by zero; later
    /// frames advance by the time since the previous frame, clamped to the
    /// configured maximum.
    pub fn frame(&mut self, timestamp: Duration, out: &mut Vec<Event>) {
        if query::play_state(&self.world) != PlayState::Playing {
            self.last_frame = None;
            return;
        }

        let limit = query::config(&self.world).max_frame_delta();
        let dt = match self.last_frame {
            Some(previous) => {
                let elapsed = timestamp.saturating_sub(previous);
                if elapsed > limit {
                    debug!(?elapsed, ?limit, "frame delta clamped");
                }
                elapsed.min(limit)
            }
            None => Duration::ZERO,
        };
        self.last_frame = Some(timestamp);
        self.step(dt, out);
    }

    /// Advances the simulation by exactly `dt`.
    pub fn step(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if query::play_state(&self.world) != PlayState::Playing {
            return;
        }

        self.execute(Command::AdvanceClock { dt }, out);

        let mut commands = std::mem::take(&mut self.commands);
        commands.clear();
        self.combat.handle(
            query::play_state(&self.world),
            query::clock(&self.world),
            &query::unit_view(&self.world),
            &query::enemy_view(&self.world),
            query::config(&self.world),
            &mut commands,
        );
        for command in commands.drain(..) {
            self.execute(command, out);
        }
        self.commands = commands;

        self.execute(Command::Tick { dt }, out);
    }

    /// Applies a command and lets the wave director react to its events.
    fn execute(&mut self, command: Command, out: &mut Vec<Event>) {
        let start = out.len();
        world::apply(&mut self.world, command, out);

        let mut follow_up = Vec::new();
        self.director.handle(
            &out[start..],
            query::play_state(&self.world),
            query::progress(&self.world),
            query::config(&self.world),
            &mut follow_up,
        );
        for command in follow_up {
            world::apply(&mut self.world, command, out);
        }
    }
}
