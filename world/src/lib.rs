#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Code Defence.

mod economy;
mod enemies;
mod grid;
mod projectiles;
mod units;

use std::time::Duration;

use code_defence_core::{
    CellCoord, Command, EnemyFate, EnemyId, EnemyKind, EnemySpecial, Event, GameConfig, PlayState,
    Progress, RejectionReason, ToolKind, UnitId, WorldPoint, WELCOME_BANNER,
};
use tracing::{debug, info};

pub use economy::{Economy, EconomyError};
pub use grid::{Cell, Grid, GridError};

use enemies::EnemyRoster;
use projectiles::{FlightOutcome, ProjectileRoster};
use units::UnitRegistry;

/// Represents the authoritative Code Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    play_state: PlayState,
    progress: Progress,
    economy: Economy,
    grid: Grid,
    units: UnitRegistry,
    enemies: EnemyRoster,
    projectiles: ProjectileRoster,
    selected_tool: Option<ToolKind>,
    clock: Duration,
}

impl World {
    /// Creates a new Code Defence world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    /// Creates a new world sitting in the menu with the provided configuration.
    #[must_use]
    pub fn with_config(config: GameConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            play_state: PlayState::Menu,
            progress: Progress {
                level: 1,
                wave: 1,
                max_waves: config.max_waves,
                base_health: config.base_health,
                score: 0,
            },
            economy: Economy::new(config.initial_resources, config.max_cpu, config.max_memory),
            grid: Grid::new(config.columns, config.rows),
            units: UnitRegistry::new(),
            enemies: EnemyRoster::new(),
            projectiles: ProjectileRoster::new(),
            selected_tool: None,
            clock: Duration::ZERO,
            config,
        }
    }

    fn require_state(&self, expected: PlayState) -> Result<(), RejectionReason> {
        if self.play_state == expected {
            Ok(())
        } else {
            Err(RejectionReason::InvalidState {
                expected,
                actual: self.play_state,
            })
        }
    }

    fn transition(&mut self, to: PlayState, out_events: &mut Vec<Event>) {
        let from = self.play_state;
        self.play_state = to;
        info!(?from, ?to, "play state changed");
        out_events.push(Event::PlayStateChanged { from, to });
    }

    fn start_game(&mut self, out_events: &mut Vec<Event>) -> Result<(), RejectionReason> {
        self.require_state(PlayState::Menu)?;
        self.transition(PlayState::Playing, out_events);
        out_events.push(Event::LevelStarted {
            level: self.progress.level,
            max_waves: self.progress.max_waves,
        });
        out_events.push(Event::ResourcesChanged {
            resources: self.economy.resources(),
        });
        Ok(())
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        let from = self.play_state;
        *self = Self::with_config(self.config.clone());
        info!(?from, "session reset");
        out_events.push(Event::PlayStateChanged {
            from,
            to: PlayState::Menu,
        });
        out_events.push(Event::ResourcesChanged {
            resources: self.economy.resources(),
        });
    }

    fn advance_level(&mut self, out_events: &mut Vec<Event>) -> Result<(), RejectionReason> {
        self.require_state(PlayState::Victory)?;
        // Kills landed on the winning tick are still waiting for their payout.
        self.remove_departed_enemies(out_events);
        let progress = &mut self.progress;
        progress.level = progress.level.saturating_add(1);
        progress.wave = 1;
        progress.max_waves = progress
            .max_waves
            .saturating_add(self.config.level_wave_growth);
        progress.base_health = progress
            .base_health
            .saturating_add(self.config.level_health_restore)
            .min(self.config.base_health);
        self.enemies.clear();
        self.projectiles.clear();
        self.selected_tool = None;

        info!(
            level = self.progress.level,
            max_waves = self.progress.max_waves,
            "level started"
        );
        self.transition(PlayState::Playing, out_events);
        out_events.push(Event::LevelStarted {
            level: self.progress.level,
            max_waves: self.progress.max_waves,
        });
        Ok(())
    }

    fn select_tool(
        &mut self,
        tool: ToolKind,
        out_events: &mut Vec<Event>,
    ) -> Result<(), RejectionReason> {
        self.require_state(PlayState::Playing)?;
        if !self.economy.can_afford(tool.definition().cost()) {
            return Err(RejectionReason::InsufficientResources);
        }
        self.selected_tool = Some(tool);
        out_events.push(Event::ToolSelected { tool });
        Ok(())
    }

    fn place_unit(
        &mut self,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), RejectionReason> {
        self.require_state(PlayState::Playing)?;
        let tool = self.selected_tool.ok_or(RejectionReason::NoToolSelected)?;
        self.grid.ensure_vacant(cell)?;
        let resources = self.economy.spend(tool.definition().cost())?;

        let unit = self.units.insert(tool, cell);
        self.grid.place(cell, unit)?;
        self.selected_tool = None;

        debug!(unit = unit.get(), tool = tool.definition().name(), ?cell, "unit placed");
        out_events.push(Event::UnitPlaced { unit, tool, cell });
        out_events.push(Event::ResourcesChanged { resources });
        Ok(())
    }

    fn upgrade_unit(
        &mut self,
        unit: UnitId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), RejectionReason> {
        self.require_state(PlayState::Playing)?;
        let entry = self
            .units
            .get_mut(unit)
            .ok_or(RejectionReason::UnknownUnit)?;
        if !entry.can_upgrade() {
            return Err(RejectionReason::MaxLevelReached);
        }
        let cost = entry.tool.definition().upgrade_cost(entry.level);
        let resources = self.economy.spend_currency(cost)?;
        let Some(level) = entry.upgrade() else {
            return Err(RejectionReason::MaxLevelReached);
        };

        debug!(unit = unit.get(), level, cost, "unit upgraded");
        out_events.push(Event::UnitUpgraded { unit, level, cost });
        out_events.push(Event::ResourcesChanged { resources });
        Ok(())
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        for unit in self.units.iter_mut() {
            unit.set_buff(1.0);
        }
        out_events.push(Event::TimeAdvanced { dt });
    }

    fn begin_wave(&mut self, out_events: &mut Vec<Event>) {
        let wave = self.progress.wave;
        let size = self.config.wave_size(wave);
        self.progress.wave = wave.saturating_add(1);
        info!(wave, size, "wave started");
        out_events.push(Event::WaveStarted { wave, size });
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, row: u32, out_events: &mut Vec<Event>) {
        let (_, rows) = self.grid.dimensions();
        if row >= rows {
            debug!(row, "spawn row outside the grid ignored");
            return;
        }
        let length = self.config.cell_length;
        let position = WorldPoint::new(self.config.field_width(), (row as f32 + 0.5) * length);
        let enemy = self.enemies.spawn(kind, row, position);
        debug!(enemy = enemy.get(), %kind, row, "enemy spawned");
        out_events.push(Event::EnemySpawned { enemy, kind, row });
    }

    fn fire_projectile(
        &mut self,
        unit: UnitId,
        target: EnemyId,
        damage: u32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(source) = self.units.get(unit).filter(|unit| unit.is_operational()) else {
            return;
        };
        let Some(enemy) = self.enemies.get(target).filter(|enemy| enemy.is_alive()) else {
            return;
        };
        let origin = source.cell.center(self.config.cell_length);
        let projectile = self
            .projectiles
            .launch(unit, target, origin, enemy.position, damage);
        out_events.push(Event::ProjectileFired {
            projectile,
            unit,
            target,
        });
    }

    fn resolve_tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let scale = self.config.frame_scale(dt);
        self.update_enemies(dt, scale, out_events);
        self.remove_departed_enemies(out_events);
        self.update_projectiles(scale, out_events);
        self.projectiles.remove_completed();
        self.check_end_conditions(out_events);
    }

    fn update_enemies(&mut self, dt: Duration, scale: f32, out_events: &mut Vec<Event>) {
        let shield_factor = self.units.shield_factor();
        let breach_damage = (self.config.breach_damage as f32 * shield_factor).round() as u32;
        let corruption = self.config.area_damage_per_second * dt.as_secs_f32();
        let recovery = self.config.slow_recovery;
        let length = self.config.cell_length;

        let Self {
            enemies,
            units,
            grid,
            progress,
            ..
        } = self;

        for enemy in enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
            if enemy.advance(scale, recovery) {
                enemy.breach();
                progress.base_health = progress.base_health.saturating_sub(breach_damage);
                debug!(enemy = enemy.id.get(), breach_damage, "enemy breached");
                out_events.push(Event::EnemyBreached { enemy: enemy.id });
                out_events.push(Event::BaseHealthLost {
                    amount: breach_damage,
                    remaining: progress.base_health,
                });
                continue;
            }

            if enemy.special() != Some(EnemySpecial::AreaDamage) || corruption <= 0.0 {
                continue;
            }
            let Some(cell) = grid.cell_at(enemy.position, length) else {
                continue;
            };
            for neighbor in grid.neighborhood(cell) {
                if let Some(unit) = grid.occupant(neighbor).and_then(|id| units.get_mut(id)) {
                    unit.corrupt(corruption);
                }
            }
        }
    }

    fn remove_departed_enemies(&mut self, out_events: &mut Vec<Event>) {
        let mut rewarded = false;
        for enemy in self.enemies.take_departed() {
            if enemy.fate != EnemyFate::Killed {
                continue;
            }
            let reward = enemy.kind.definition().reward();
            let _ = self.economy.apply_reward(reward);
            self.progress.score = self
                .progress
                .score
                .saturating_add(u64::from(reward.currency));
            rewarded = true;
            debug!(enemy = enemy.id.get(), kind = %enemy.kind, "enemy killed");
            out_events.push(Event::EnemyKilled {
                enemy: enemy.id,
                kind: enemy.kind,
                reward,
            });
        }
        if rewarded {
            out_events.push(Event::ResourcesChanged {
                resources: self.economy.resources(),
            });
        }
    }

    fn update_projectiles(&mut self, scale: f32, out_events: &mut Vec<Event>) {
        let step = self.config.projectile_speed * scale;
        let hit_radius = self.config.hit_radius;
        let Self {
            projectiles,
            enemies,
            ..
        } = self;

        for projectile in projectiles.iter_mut() {
            let target = enemies
                .get(projectile.target)
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| enemy.position);
            match projectile.advance(target, step, hit_radius) {
                FlightOutcome::InFlight => {}
                FlightOutcome::Expired => out_events.push(Event::ProjectileExpired {
                    projectile: projectile.id,
                }),
                FlightOutcome::Hit => {
                    let Some(enemy) = enemies.get_mut(projectile.target) else {
                        continue;
                    };
                    let remaining = enemy.take_damage(projectile.damage);
                    out_events.push(Event::EnemyDamaged {
                        enemy: enemy.id,
                        amount: projectile.damage,
                        remaining,
                    });
                    out_events.push(Event::ProjectileHit {
                        projectile: projectile.id,
                        target: enemy.id,
                        position: projectile.position,
                    });
                }
            }
        }
    }

    fn check_end_conditions(&mut self, out_events: &mut Vec<Event>) {
        if self.progress.base_health == 0 {
            info!(score = self.progress.score, wave = self.progress.wave, "game over");
            out_events.push(Event::GameOver {
                score: self.progress.score,
                wave: self.progress.wave,
            });
            self.transition(PlayState::GameOver, out_events);
        } else if self.progress.wave > self.progress.max_waves {
            info!(
                level = self.progress.level,
                score = self.progress.score,
                "level completed"
            );
            out_events.push(Event::LevelCompleted {
                level: self.progress.level,
            });
            out_events.push(Event::Victory {
                score: self.progress.score,
            });
            self.transition(PlayState::Victory, out_events);
        }
    }
}

fn reject_on_error(result: Result<(), RejectionReason>, out_events: &mut Vec<Event>) {
    if let Err(reason) = result {
        debug!(%reason, "command rejected");
        out_events.push(Event::ActionRejected { reason });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Player commands that cannot be honoured leave the world untouched and
/// emit [`Event::ActionRejected`]. Commands produced by systems are ignored
/// unless the session is playing, and when they reference entities that no
/// longer exist.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame => {
            let result = world.start_game(out_events);
            reject_on_error(result, out_events);
        }
        Command::Pause => {
            let result = world.require_state(PlayState::Playing);
            if result.is_ok() {
                world.transition(PlayState::Paused, out_events);
            }
            reject_on_error(result, out_events);
        }
        Command::Resume => {
            let result = world.require_state(PlayState::Paused);
            if result.is_ok() {
                world.transition(PlayState::Playing, out_events);
            }
            reject_on_error(result, out_events);
        }
        Command::Reset => world.reset(out_events),
        Command::AdvanceLevel => {
            let result = world.advance_level(out_events);
            reject_on_error(result, out_events);
        }
        Command::SelectTool { tool } => {
            let result = world.select_tool(tool, out_events);
            reject_on_error(result, out_events);
        }
        Command::PlaceUnit { cell } => {
            let result = world.place_unit(cell, out_events);
            reject_on_error(result, out_events);
        }
        Command::UpgradeUnit { unit } => {
            let result = world.upgrade_unit(unit, out_events);
            reject_on_error(result, out_events);
        }
        command if world.play_state != PlayState::Playing => {
            debug!(?command, state = ?world.play_state, "command ignored outside play");
        }
        Command::AdvanceClock { dt } => world.advance_clock(dt, out_events),
        Command::Tick { dt } => world.resolve_tick(dt, out_events),
        Command::BeginWave => world.begin_wave(out_events),
        Command::SpawnEnemy { kind, row } => world.spawn_enemy(kind, row, out_events),
        Command::FireProjectile {
            unit,
            target,
            damage,
        } => world.fire_projectile(unit, target, damage, out_events),
        Command::ResetCooldown { unit } => {
            let now = world.clock;
            if let Some(entry) = world.units.get_mut(unit) {
                entry.reset_cooldown(now);
            }
        }
        Command::HealUnit {
            source,
            target,
            amount,
        } => {
            let healer_ready = world
                .units
                .get(source)
                .is_some_and(|unit| unit.is_operational());
            if let Some(entry) = world.units.get_mut(target).filter(|_| healer_ready) {
                if entry.heal(amount) {
                    out_events.push(Event::UnitHealed { source, target });
                }
            }
        }
        Command::ApplySlow { enemy, factor } => {
            if let Some(entry) = world.enemies.get_mut(enemy).filter(|enemy| enemy.is_alive()) {
                entry.apply_slow(factor);
            }
        }
        Command::ApplyBuff { unit, multiplier } => {
            if let Some(entry) = world.units.get_mut(unit) {
                entry.set_buff(multiplier);
            }
        }
        Command::RevealEnemy { enemy } => {
            if let Some(entry) = world.enemies.get_mut(enemy).filter(|enemy| enemy.is_alive()) {
                if entry.reveal() {
                    out_events.push(Event::EnemyRevealed { enemy });
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Economy, Grid, World};
    use code_defence_core::{
        CellCoord, EnemyView, GameConfig, GameStateSnapshot, PlayState, Progress,
        ProjectileSnapshot, Resources, ToolKind, UnitId, UnitSnapshot, UnitView,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Reports the lifecycle state of the session.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Reports level, wave, base health and score.
    #[must_use]
    pub fn progress(world: &World) -> Progress {
        world.progress
    }

    /// Reports the current resource balance.
    #[must_use]
    pub fn resources(world: &World) -> Resources {
        world.economy.resources()
    }

    /// Provides read-only access to the economy.
    #[must_use]
    pub fn economy(world: &World) -> &Economy {
        &world.economy
    }

    /// Provides read-only access to the placement grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Tool armed for the next placement, if any.
    #[must_use]
    pub fn selected_tool(world: &World) -> Option<ToolKind> {
        world.selected_tool
    }

    /// Reads the simulation clock.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Captures a read-only view of the units on the grid.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let length = world.config.cell_length;
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot(length)).collect())
    }

    /// Captures a read-only view of the enemies on the field.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures the projectiles in flight in identifier order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Looks up the unit standing in a cell.
    #[must_use]
    pub fn unit_at(world: &World, cell: CellCoord) -> Option<UnitSnapshot> {
        let unit = world.grid.occupant(cell)?;
        unit_snapshot(world, unit)
    }

    /// Looks up the snapshot of a single unit.
    #[must_use]
    pub fn unit_snapshot(world: &World, unit: UnitId) -> Option<UnitSnapshot> {
        world
            .units
            .get(unit)
            .map(|unit| unit.snapshot(world.config.cell_length))
    }

    /// Breach damage multiplier granted by the strongest operational shield.
    #[must_use]
    pub fn shield_factor(world: &World) -> f32 {
        world.units.shield_factor()
    }

    /// Captures the complete session state.
    #[must_use]
    pub fn game_state(world: &World) -> GameStateSnapshot {
        GameStateSnapshot {
            play_state: world.play_state,
            progress: world.progress,
            resources: world.economy.resources(),
            selected_tool: world.selected_tool,
            clock: world.clock,
            units: unit_view(world).into_vec(),
            enemies: enemy_view(world).into_vec(),
            projectiles: projectiles(world),
            occupied_cells: world.grid.occupied_cells().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_defence_core::{Cost, Resources, MAX_UNIT_HEALTH};

    fn playing_world(config: GameConfig) -> World {
        let mut world = World::with_config(config);
        let mut events = Vec::new();
        apply(&mut world, Command::StartGame, &mut events);
        world
    }

    fn place(world: &mut World, tool: ToolKind, cell: CellCoord) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::SelectTool { tool }, &mut events);
        apply(world, Command::PlaceUnit { cell }, &mut events);
        events
    }

    fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::AdvanceClock { dt }, &mut events);
        apply(world, Command::Tick { dt }, &mut events);
        events
    }

    #[test]
    fn start_game_leaves_menu() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::StartGame, &mut events);

        assert_eq!(query::play_state(&world), PlayState::Playing);
        assert_eq!(
            events.first(),
            Some(&Event::PlayStateChanged {
                from: PlayState::Menu,
                to: PlayState::Playing,
            })
        );
        assert!(events.contains(&Event::LevelStarted {
            level: 1,
            max_waves: 10,
        }));
    }

    #[test]
    fn placement_outside_play_is_rejected() {
        let mut world = World::new();
        let events = place(&mut world, ToolKind::Debugger, CellCoord::new(0, 0));

        assert_eq!(
            events,
            vec![
                Event::ActionRejected {
                    reason: RejectionReason::InvalidState {
                        expected: PlayState::Playing,
                        actual: PlayState::Menu,
                    },
                },
                Event::ActionRejected {
                    reason: RejectionReason::InvalidState {
                        expected: PlayState::Playing,
                        actual: PlayState::Menu,
                    },
                },
            ]
        );
        assert!(query::unit_view(&world).is_empty());
    }

    #[test]
    fn placement_spends_resources_and_clears_selection() {
        let mut world = playing_world(GameConfig::default());
        let events = place(&mut world, ToolKind::Debugger, CellCoord::new(2, 1));

        assert_eq!(query::resources(&world), Resources::new(900, 10, 5));
        assert_eq!(query::selected_tool(&world), None);
        assert!(events.contains(&Event::UnitPlaced {
            unit: UnitId::new(0),
            tool: ToolKind::Debugger,
            cell: CellCoord::new(2, 1),
        }));
        assert_eq!(
            query::unit_at(&world, CellCoord::new(2, 1)).map(|unit| unit.id),
            Some(UnitId::new(0))
        );
    }

    #[test]
    fn placement_without_selection_is_rejected() {
        let mut world = playing_world(GameConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceUnit {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ActionRejected {
                reason: RejectionReason::NoToolSelected,
            }]
        );
    }

    #[test]
    fn occupied_cell_rejects_without_spending() {
        let mut world = playing_world(GameConfig::default());
        let _ = place(&mut world, ToolKind::Debugger, CellCoord::new(0, 0));
        let before = query::resources(&world);

        let events = place(&mut world, ToolKind::Debugger, CellCoord::new(0, 0));

        assert_eq!(
            events.last(),
            Some(&Event::ActionRejected {
                reason: RejectionReason::OccupiedCell,
            })
        );
        assert_eq!(query::resources(&world), before);
        assert_eq!(query::unit_view(&world).len(), 1);
    }

    #[test]
    fn upgrade_spends_currency_only() {
        let mut world = playing_world(GameConfig::default());
        let _ = place(&mut world, ToolKind::Debugger, CellCoord::new(0, 0));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::UpgradeUnit {
                unit: UnitId::new(0),
            },
            &mut events,
        );

        assert_eq!(query::resources(&world), Resources::new(750, 10, 5));
        assert_eq!(
            events.first(),
            Some(&Event::UnitUpgraded {
                unit: UnitId::new(0),
                level: 2,
                cost: 150,
            })
        );
    }

    #[test]
    fn upgrade_of_unknown_unit_is_rejected() {
        let mut world = playing_world(GameConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::UpgradeUnit {
                unit: UnitId::new(42),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ActionRejected {
                reason: RejectionReason::UnknownUnit,
            }]
        );
    }

    #[test]
    fn select_tool_requires_affordability() {
        let config = GameConfig {
            initial_resources: Resources::new(120, 0, 0),
            ..GameConfig::default()
        };
        let mut world = playing_world(config);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SelectTool {
                tool: ToolKind::Terminal,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::ActionRejected {
                reason: RejectionReason::InsufficientResources,
            }]
        );
        assert!(query::economy(&world).can_afford(Cost::new(120, 12, 6)));
    }

    #[test]
    fn begin_wave_reports_size_before_incrementing() {
        let mut world = playing_world(GameConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::BeginWave, &mut events);

        assert_eq!(events, vec![Event::WaveStarted { wave: 1, size: 7 }]);
        assert_eq!(query::progress(&world).wave, 2);
    }

    #[test]
    fn spawned_enemy_starts_at_right_edge_of_row() {
        let mut world = playing_world(GameConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::SyntaxError,
                row: 3,
            },
            &mut events,
        );

        let view = query::enemy_view(&world);
        let enemy = view.iter().next().expect("enemy");
        assert_eq!(enemy.position, WorldPoint::new(900.0, 350.0));
        assert_eq!(enemy.row, 3);
        assert_eq!(
            events,
            vec![Event::EnemySpawned {
                enemy: EnemyId::new(0),
                kind: EnemyKind::SyntaxError,
                row: 3,
            }]
        );
    }

    #[test]
    fn spawn_outside_the_grid_rows_is_ignored() {
        let mut world = playing_world(GameConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::SyntaxError,
                row: 5,
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert!(query::enemy_view(&world).is_empty());
    }

    #[test]
    fn system_commands_are_ignored_while_paused() {
        let mut world = playing_world(GameConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::Pause, &mut events);
        events.clear();

        apply(&mut world, Command::BeginWave, &mut events);
        apply(
            &mut world,
            Command::AdvanceClock {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::progress(&world).wave, 1);
        assert_eq!(query::clock(&world), Duration::ZERO);
    }

    #[test]
    fn breach_costs_base_health_without_reward() {
        let config = GameConfig {
            columns: 1,
            ..GameConfig::default()
        };
        let mut world = playing_world(config);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::RuntimeError,
                row: 0,
            },
            &mut events,
        );

        let mut breached = Vec::new();
        for _ in 0..100 {
            breached.extend(tick(&mut world, Duration::from_millis(16)));
            if query::enemy_view(&world).is_empty() {
                break;
            }
        }

        assert!(breached.contains(&Event::EnemyBreached {
            enemy: EnemyId::new(0),
        }));
        assert!(breached.contains(&Event::BaseHealthLost {
            amount: 10,
            remaining: 90,
        }));
        assert!(!breached
            .iter()
            .any(|event| matches!(event, Event::EnemyKilled { .. })));
        assert_eq!(query::progress(&world).score, 0);
        assert_eq!(query::resources(&world), Resources::new(1000, 0, 0));
    }

    #[test]
    fn area_damage_enemy_corrupts_neighbouring_units() {
        let mut world = playing_world(GameConfig::default());
        let _ = place(&mut world, ToolKind::Debugger, CellCoord::new(7, 1));
        let _ = place(&mut world, ToolKind::Debugger, CellCoord::new(0, 1));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::DependencyConflict,
                row: 1,
            },
            &mut events,
        );

        for _ in 0..20 {
            let _ = tick(&mut world, Duration::from_millis(100));
        }

        let near = query::unit_at(&world, CellCoord::new(7, 1)).expect("unit");
        let far = query::unit_at(&world, CellCoord::new(0, 1)).expect("unit");
        assert!(near.health < MAX_UNIT_HEALTH);
        assert_eq!(far.health, MAX_UNIT_HEALTH);
    }
}
