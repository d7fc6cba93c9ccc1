#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Code Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to. Systems consume event streams, query
//! immutable views, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
mod config;

pub use catalog::{
    AttackType, EnemyKind, EnemySpecial, EnemyTypeDefinition, ToolDefinition, ToolKind,
    UnitStats, MAX_UNIT_LEVEL,
};
pub use config::GameConfig;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Code Defence.";

/// Health every defense unit starts with and can be healed back to.
pub const MAX_UNIT_HEALTH: f32 = 100.0;

/// Lifecycle state of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    /// No session is running.
    Menu,
    /// The simulation advances every frame.
    Playing,
    /// The simulation is frozen until resumed.
    Paused,
    /// Base health was depleted. Terminal until reset.
    GameOver,
    /// Every wave of the level was issued. Terminal until reset or advance.
    Victory,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts a session from the menu.
    StartGame,
    /// Freezes a running session.
    Pause,
    /// Continues a paused session.
    Resume,
    /// Discards the session and returns to the menu.
    Reset,
    /// Leaves a victory screen for the next, longer level.
    AdvanceLevel,
    /// Arms a tool for the next placement.
    SelectTool {
        /// Tool the player intends to place.
        tool: ToolKind,
    },
    /// Places the selected tool on a grid cell.
    PlaceUnit {
        /// Cell that should host the new unit.
        cell: CellCoord,
    },
    /// Raises a unit by one level.
    UpgradeUnit {
        /// Unit to upgrade.
        unit: UnitId,
    },
    /// Advances the simulation clock and clears transient unit status.
    AdvanceClock {
        /// Simulated time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Resolves enemy movement, projectile flight, removals and end
    /// conditions for the current frame.
    Tick {
        /// Simulated time that elapsed since the previous frame.
        dt: Duration,
    },
    /// Issues the next wave, incrementing the wave counter.
    BeginWave,
    /// Creates a new enemy at the right edge of a row.
    SpawnEnemy {
        /// Type of enemy to create.
        kind: EnemyKind,
        /// Row the enemy travels along.
        row: u32,
    },
    /// Launches a projectile from a unit toward an enemy.
    FireProjectile {
        /// Unit that fires.
        unit: UnitId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
        /// Damage applied on impact.
        damage: u32,
    },
    /// Restarts a unit's cooldown at the current clock.
    ResetCooldown {
        /// Unit whose cooldown restarts.
        unit: UnitId,
    },
    /// Restores health to a unit.
    HealUnit {
        /// Unit that provides the heal.
        source: UnitId,
        /// Unit that receives the heal.
        target: UnitId,
        /// Health restored before clamping.
        amount: f32,
    },
    /// Slows an enemy, keeping the strongest slow applied so far.
    ApplySlow {
        /// Enemy to slow.
        enemy: EnemyId,
        /// Movement multiplier in `0.0..=1.0`.
        factor: f32,
    },
    /// Sets a unit's damage multiplier for the current frame.
    ApplyBuff {
        /// Unit receiving the buff.
        unit: UnitId,
        /// Damage multiplier.
        multiplier: f32,
    },
    /// Makes an invisible enemy targetable.
    RevealEnemy {
        /// Enemy to reveal.
        enemy: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the frame.
        dt: Duration,
    },
    /// Announces a lifecycle transition.
    PlayStateChanged {
        /// State before the transition.
        from: PlayState,
        /// State after the transition.
        to: PlayState,
    },
    /// Confirms that a tool is armed for placement.
    ToolSelected {
        /// Tool that was selected.
        tool: ToolKind,
    },
    /// Confirms that a unit was placed on the grid.
    UnitPlaced {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Tool the unit was built from.
        tool: ToolKind,
        /// Cell the unit occupies.
        cell: CellCoord,
    },
    /// Confirms that a unit gained a level.
    UnitUpgraded {
        /// Upgraded unit.
        unit: UnitId,
        /// Level after the upgrade.
        level: u8,
        /// Currency spent on the upgrade.
        cost: u32,
    },
    /// Reports that a unit restored health to a neighbour.
    UnitHealed {
        /// Unit that provided the heal.
        source: UnitId,
        /// Unit that received the heal.
        target: UnitId,
    },
    /// Confirms that an enemy entered the field.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Row the enemy travels along.
        row: u32,
    },
    /// Reports that a projectile damaged an enemy.
    EnemyDamaged {
        /// Enemy that took damage.
        enemy: EnemyId,
        /// Damage applied.
        amount: u32,
        /// Health left after the hit.
        remaining: u32,
    },
    /// Reports that an enemy was destroyed by damage and paid out its reward.
    EnemyKilled {
        /// Destroyed enemy.
        enemy: EnemyId,
        /// Type of the destroyed enemy.
        kind: EnemyKind,
        /// Reward that was granted.
        reward: Reward,
    },
    /// Reports that an invisible enemy became targetable.
    EnemyRevealed {
        /// Revealed enemy.
        enemy: EnemyId,
    },
    /// Reports that an enemy reached the base.
    EnemyBreached {
        /// Enemy that reached the base.
        enemy: EnemyId,
    },
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Unit that fired.
        unit: UnitId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
    },
    /// Reports a projectile impact, where presentation shows an explosion.
    ProjectileHit {
        /// Projectile that hit.
        projectile: ProjectileId,
        /// Enemy that was hit.
        target: EnemyId,
        /// Impact location.
        position: WorldPoint,
    },
    /// Reports that a projectile lost its target and was discarded.
    ProjectileExpired {
        /// Discarded projectile.
        projectile: ProjectileId,
    },
    /// Reports damage to the base.
    BaseHealthLost {
        /// Health lost.
        amount: u32,
        /// Health left.
        remaining: u32,
    },
    /// Announces that a wave was issued.
    WaveStarted {
        /// Number of the wave that started.
        wave: u32,
        /// Enemies scheduled for the wave.
        size: u32,
    },
    /// Announces that every wave of a level was issued.
    LevelCompleted {
        /// Completed level.
        level: u32,
    },
    /// Announces that a new level began.
    LevelStarted {
        /// Level that began.
        level: u32,
        /// Waves the level consists of.
        max_waves: u32,
    },
    /// Announces a lost session.
    GameOver {
        /// Final score.
        score: u64,
        /// Wave counter at the time of the loss.
        wave: u32,
    },
    /// Announces a won level.
    Victory {
        /// Final score.
        score: u64,
    },
    /// Publishes the resource balance after it changed.
    ResourcesChanged {
        /// Current balance.
        resources: Resources,
    },
    /// Reports that a player command was refused without side effects.
    ActionRejected {
        /// Why the command was refused.
        reason: RejectionReason,
    },
}

/// Reasons a player command can be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RejectionReason {
    /// The session is not in a state that accepts the command.
    #[error("command requires {expected:?} but the game is {actual:?}")]
    InvalidState {
        /// State the command requires.
        expected: PlayState,
        /// State the session is in.
        actual: PlayState,
    },
    /// A placement was requested without a selected tool.
    #[error("no tool selected")]
    NoToolSelected,
    /// The balance does not cover the cost.
    #[error("insufficient resources")]
    InsufficientResources,
    /// The target cell already hosts a unit.
    #[error("cell is occupied")]
    OccupiedCell,
    /// The target cell lies outside the grid.
    #[error("cell is outside the grid")]
    OutOfBounds,
    /// The unit is already at the highest level.
    #[error("unit is at the maximum level")]
    MaxLevelReached,
    /// No unit with the identifier exists.
    #[error("unknown unit")]
    UnknownUnit,
}

/// Unique identifier assigned to a defense unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy. Identifiers grow in creation
/// order, which makes them a deterministic tie-break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Centre of the cell in world units.
    #[must_use]
    pub fn center(self, cell_length: f32) -> WorldPoint {
        WorldPoint::new(
            (self.column as f32 + 0.5) * cell_length,
            (self.row as f32 + 0.5) * cell_length,
        )
    }
}

/// Continuous position on the playfield measured in world units.
///
/// Equality compares the raw bit patterns so points can travel inside
/// [`Event`] values.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate; the base sits at zero.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl PartialEq for WorldPoint {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for WorldPoint {}

/// Price of placing a tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    /// Currency consumed.
    pub currency: u32,
    /// Cpu load added.
    pub cpu: u32,
    /// Memory load added.
    pub memory: u32,
}

impl Cost {
    /// Creates a new cost.
    #[must_use]
    pub const fn new(currency: u32, cpu: u32, memory: u32) -> Self {
        Self {
            currency,
            cpu,
            memory,
        }
    }
}

/// Payout for destroying an enemy. Load deltas are non-positive and relieve
/// cpu and memory pressure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reward {
    /// Currency granted; also added to the score.
    pub currency: u32,
    /// Change applied to cpu usage.
    pub cpu: i32,
    /// Change applied to memory usage.
    pub memory: i32,
}

impl Reward {
    /// Creates a new reward.
    #[must_use]
    pub const fn new(currency: u32, cpu: i32, memory: i32) -> Self {
        Self {
            currency,
            cpu,
            memory,
        }
    }
}

/// Resource balance of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resources {
    /// Spendable currency.
    pub currency: u32,
    /// Current cpu usage.
    pub cpu: u32,
    /// Current memory usage.
    pub memory: u32,
}

impl Resources {
    /// Creates a new balance.
    #[must_use]
    pub const fn new(currency: u32, cpu: u32, memory: u32) -> Self {
        Self {
            currency,
            cpu,
            memory,
        }
    }
}

/// How an enemy left, or has yet to leave, the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyFate {
    /// Still moving.
    Alive,
    /// Destroyed by damage; pays out its reward on removal.
    Killed,
    /// Reached the base; removed without a reward.
    Breached,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier allocated to the unit by the world.
    pub id: UnitId,
    /// Tool the unit was built from.
    pub tool: ToolKind,
    /// Cell the unit occupies.
    pub cell: CellCoord,
    /// Centre of the unit in world units.
    pub center: WorldPoint,
    /// Current level.
    pub level: u8,
    /// Damage, range and fire interval at the current level.
    pub stats: UnitStats,
    /// Clock reading of the last cooldown-gated action, if any.
    pub last_fired: Option<Duration>,
    /// Current health; zero disables the unit.
    pub health: f32,
    /// Damage multiplier active this frame.
    pub buff: f32,
}

impl UnitSnapshot {
    /// Reports whether the cooldown elapsed at the provided clock reading.
    #[must_use]
    pub fn ready_at(&self, now: Duration) -> bool {
        match self.last_fired {
            Some(last) => now.saturating_sub(last) >= self.stats.fire_interval,
            None => true,
        }
    }

    /// Reports whether the unit may act.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.health > 0.0
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier allocated to the enemy by the world.
    pub id: EnemyId,
    /// Type of the enemy.
    pub kind: EnemyKind,
    /// Row the enemy travels along.
    pub row: u32,
    /// Current position in world units.
    pub position: WorldPoint,
    /// Remaining health.
    pub health: u32,
    /// Health the enemy spawned with.
    pub max_health: u32,
    /// Movement multiplier from slow effects.
    pub slow_factor: f32,
    /// Whether units may target the enemy.
    pub visible: bool,
    /// Whether the enemy is still on its way.
    pub fate: EnemyFate,
}

impl EnemySnapshot {
    /// Reports whether the enemy is still moving.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.fate == EnemyFate::Alive
    }
}

/// Immutable representation of a single projectile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile by the world.
    pub id: ProjectileId,
    /// Unit that fired the projectile.
    pub source: UnitId,
    /// Enemy the projectile homes in on.
    pub target: EnemyId,
    /// Current position in world units.
    pub position: WorldPoint,
    /// Damage applied on impact.
    pub damage: u32,
}

/// Read-only snapshot describing all units on the grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of units captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Read-only snapshot describing all enemies on the field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Wave and level progress of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Progress {
    /// Current level, starting at one.
    pub level: u32,
    /// Number of the next wave to issue.
    pub wave: u32,
    /// Waves in the current level.
    pub max_waves: u32,
    /// Remaining base health.
    pub base_health: u32,
    /// Accumulated score.
    pub score: u64,
}

/// Complete read-only picture of a session, suitable for rendering or for
/// comparing two sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct GameStateSnapshot {
    /// Lifecycle state.
    pub play_state: PlayState,
    /// Wave and level progress.
    pub progress: Progress,
    /// Resource balance.
    pub resources: Resources,
    /// Tool armed for placement.
    pub selected_tool: Option<ToolKind>,
    /// Simulation clock.
    pub clock: Duration,
    /// Units on the grid.
    pub units: Vec<UnitSnapshot>,
    /// Enemies on the field.
    pub enemies: Vec<EnemySnapshot>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Cells that host a unit, in row-major order.
    pub occupied_cells: Vec<CellCoord>,
}
